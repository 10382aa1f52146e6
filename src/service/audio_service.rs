// src/service/audio_service.rs
use super::{
    IdleStopTimer, LifecycleSink, MediaSession, NotificationIntent, NotificationManager,
    StatusSurface, SERVICE_LOG_TARGET,
};
use crate::config::Settings;
use crate::metadata::{MetadataPoller, MetadataSource, StreamInfo};
use crate::player::{PlaybackSnapshot, PlaybackState, PlayerCommand, PlayerHandle};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

struct ServiceInner {
    session: MediaSession,
    notifications: NotificationManager,
    poller: MetadataPoller,
    idle_timer: IdleStopTimer,
    keep_alive: bool,
}

/// Host of the player: owns the media session, the notification, the
/// metadata poller and the idle-stop timer, and reacts to lifecycle callbacks.
///
/// Shutdown is requested through [`AudioService::stop_requested`] once the
/// idle timer fires while nothing is playing or paused.
pub struct AudioService {
    inner: Mutex<ServiceInner>,
    player: PlayerHandle,
    state_tx: watch::Sender<PlaybackState>,
    state_rx: watch::Receiver<PlaybackState>,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl AudioService {
    pub fn new(
        player: PlayerHandle,
        surface: Arc<dyn StatusSurface>,
        metadata_source: Arc<dyn MetadataSource>,
        settings: &Settings,
    ) -> Self {
        let session = MediaSession::new();
        let mut notifications = NotificationManager::new(surface);
        notifications.update_session_token(session.token());
        let poller = MetadataPoller::new(
            metadata_source,
            player.clone(),
            settings.metadata_poll_interval(),
        );
        let (state_tx, state_rx) = watch::channel(PlaybackState::None);
        let (stop_tx, stop_rx) = watch::channel(false);

        info!(target: SERVICE_LOG_TARGET, session = %session.token(), "Audio service created.");
        AudioService {
            inner: Mutex::new(ServiceInner {
                session,
                notifications,
                poller,
                idle_timer: IdleStopTimer::new(settings.idle_stop_delay()),
                keep_alive: false,
            }),
            player,
            state_tx,
            state_rx,
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        }
    }

    /// Flips to `true` when the host should exit.
    pub fn stop_requested(&self) -> watch::Receiver<bool> {
        self.stop_rx.clone()
    }

    pub fn is_keep_alive(&self) -> bool {
        self.inner.lock().keep_alive
    }

    pub fn is_session_active(&self) -> bool {
        self.inner.lock().session.is_active()
    }

    pub fn session_token(&self) -> Uuid {
        self.inner.lock().session.token()
    }

    pub fn session_metadata(&self) -> StreamInfo {
        self.inner.lock().session.metadata().clone()
    }

    pub fn is_polling_metadata(&self) -> bool {
        self.inner.lock().poller.is_running()
    }

    pub fn is_idle_timer_armed(&self) -> bool {
        self.inner.lock().idle_timer.is_armed()
    }

    pub fn is_notification_posted(&self) -> bool {
        self.inner.lock().notifications.is_posted()
    }

    pub fn notification_token(&self) -> Option<Uuid> {
        self.inner.lock().notifications.session_token()
    }

    pub fn last_state(&self) -> PlaybackState {
        *self.state_rx.borrow()
    }

    /// Routes a status-surface intent into the player's command path.
    pub fn notification_intent(&self, intent: NotificationIntent) {
        debug!(target: SERVICE_LOG_TARGET, "Notification intent: {:?}", intent);
        let command = match intent {
            NotificationIntent::Play => PlayerCommand::Play,
            NotificationIntent::Pause => PlayerCommand::Pause,
            NotificationIntent::Stop => PlayerCommand::Stop,
        };
        if let Err(e) = self.player.try_command(command) {
            warn!(target: SERVICE_LOG_TARGET, "Failed to forward {:?}: {}", intent, e);
        }
    }

    /// Replaces the media session; the notification follows the new token.
    #[instrument(skip(self))]
    pub fn recreate_session(&self) -> Uuid {
        let mut inner = self.inner.lock();
        let token = inner.session.recreate();
        if inner.keep_alive {
            inner.session.set_active(true);
        }
        inner.notifications.update_session_token(token);
        token
    }

    /// Releases everything the service holds.
    pub fn destroy(&self) {
        info!(target: SERVICE_LOG_TARGET, "Destroying audio service.");
        let mut inner = self.inner.lock();
        inner.poller.stop();
        inner.idle_timer.cancel();
        inner.notifications.stop();
        inner.session.set_active(false);
        inner.keep_alive = false;
    }

    fn arm_idle_stop(&self, inner: &mut ServiceInner) {
        let state_rx = self.state_rx.clone();
        let stop_tx = self.stop_tx.clone();
        inner.idle_timer.arm(move || {
            let state = *state_rx.borrow();
            if matches!(state, PlaybackState::Playing | PlaybackState::Paused) {
                debug!(target: SERVICE_LOG_TARGET, "Ignoring delayed stop since the player is in use.");
                return;
            }
            info!(target: SERVICE_LOG_TARGET, "Idle for too long, requesting shutdown.");
            stop_tx.send_replace(true);
        });
    }
}

impl LifecycleSink for AudioService {
    fn on_playback_start(&self) {
        let mut inner = self.inner.lock();
        inner.session.set_active(true);
        inner.idle_timer.cancel();
        inner.keep_alive = true;
        inner.notifications.start();
        inner.poller.start();
    }

    fn on_playback_stop(&self) {
        let mut inner = self.inner.lock();
        inner.session.set_active(false);
        self.arm_idle_stop(&mut inner);
        inner.poller.stop();
        inner.keep_alive = false;
        inner.notifications.stop();
    }

    fn on_playback_paused(&self) {
        let mut inner = self.inner.lock();
        inner.poller.stop();
        inner.session.set_active(false);
        inner.keep_alive = false;
        inner.notifications.pause();
        self.arm_idle_stop(&mut inner);
    }

    fn on_notification_required(&self) {
        let mut inner = self.inner.lock();
        inner.notifications.require();
        if self.last_state() != PlaybackState::Playing || inner.keep_alive {
            return;
        }
        // Playing again without a start, e.g. focus regained after a transient loss.
        debug!(target: SERVICE_LOG_TARGET, "Playback resumed, restoring keep-alive.");
        inner.keep_alive = true;
        inner.session.set_active(true);
        inner.idle_timer.cancel();
        if !inner.poller.is_running() {
            inner.poller.start();
        }
    }

    fn on_playback_state_updated(&self, snapshot: &PlaybackSnapshot) {
        self.state_tx.send_replace(snapshot.state());
        let mut inner = self.inner.lock();
        inner.session.set_playback_state(snapshot.clone());
        inner.notifications.on_state_changed(snapshot);
    }

    fn on_metadata_changed(&self, info: &StreamInfo) {
        let mut inner = self.inner.lock();
        inner.session.set_metadata(info.clone());
        inner.notifications.on_metadata_changed(info);
    }
}
