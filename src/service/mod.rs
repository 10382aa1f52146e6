//! The hosting process: keeps playback alive and drives the status surface.

mod audio_service;
mod idle_timer;
mod notification;
mod session;

pub use audio_service::AudioService;
pub use idle_timer::IdleStopTimer;
pub use notification::{
    NotificationAction, NotificationIntent, NotificationManager, NowPlayingNotification,
    StatusSurface,
};
pub use session::MediaSession;

use crate::metadata::StreamInfo;
use crate::player::PlaybackSnapshot;

const SERVICE_LOG_TARGET: &str = "hope_radio::service";

/// Lifecycle callbacks the player issues from its event loop.
///
/// Calls arrive in transition order and may repeat (e.g. `on_playback_paused`
/// from both a pause command and the resulting `PAUSED` snapshot), so
/// implementations must be idempotent. None of them may block.
pub trait LifecycleSink: Send + Sync {
    /// Issued before the engine starts buffering.
    fn on_playback_start(&self);
    fn on_playback_stop(&self);
    fn on_playback_paused(&self);
    fn on_notification_required(&self);
    fn on_playback_state_updated(&self, snapshot: &PlaybackSnapshot);
    fn on_metadata_changed(&self, _info: &StreamInfo) {}
}
