// src/service/notification.rs
use super::SERVICE_LOG_TARGET;
use crate::metadata::StreamInfo;
use crate::player::{PlaybackSnapshot, PlaybackState};
use std::sync::Arc;
use tracing::{debug, info, trace};
use uuid::Uuid;

/// The one transport button the notification offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Play,
    Pause,
}

/// User intents sent back by the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationIntent {
    Play,
    Pause,
    /// Notification dismissed or explicit stop button
    Stop,
}

/// Rendered content of the persistent status surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlayingNotification {
    /// Artist
    pub title: String,
    /// Song title
    pub text: String,
    pub state: PlaybackState,
    /// Not dismissable while true
    pub ongoing: bool,
    pub action: NotificationAction,
}

impl NowPlayingNotification {
    pub fn build(snapshot: &PlaybackSnapshot, metadata: &StreamInfo) -> Self {
        let playing = snapshot.state() == PlaybackState::Playing;
        NowPlayingNotification {
            title: metadata.artist.clone(),
            text: metadata.title.clone(),
            state: snapshot.state(),
            ongoing: playing,
            action: if playing {
                NotificationAction::Pause
            } else {
                NotificationAction::Play
            },
        }
    }
}

/// Whatever renders the notification (system tray, console line, ...).
pub trait StatusSurface: Send + Sync {
    /// Posts or replaces the notification. `foreground` asks the host to
    /// keep the process alive for as long as it stays posted that way.
    fn post(&self, notification: &NowPlayingNotification, foreground: bool);
    fn cancel(&self);
}

/// Keeps the status surface in sync with the session.
pub struct NotificationManager {
    surface: Arc<dyn StatusSurface>,
    session_token: Option<Uuid>,
    posted: bool,
    foreground: bool,
    snapshot: PlaybackSnapshot,
    metadata: StreamInfo,
}

impl NotificationManager {
    pub fn new(surface: Arc<dyn StatusSurface>) -> Self {
        // Clear anything a previous run left behind.
        surface.cancel();
        Self {
            surface,
            session_token: None,
            posted: false,
            foreground: false,
            snapshot: PlaybackSnapshot::initial(),
            metadata: StreamInfo::default(),
        }
    }

    pub fn is_posted(&self) -> bool {
        self.posted
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground
    }

    pub fn session_token(&self) -> Option<Uuid> {
        self.session_token
    }

    /// Follows the session to a new token. Posting state is kept.
    pub fn update_session_token(&mut self, token: Uuid) {
        if self.session_token == Some(token) {
            return;
        }
        if let Some(old) = self.session_token {
            info!(target: SERVICE_LOG_TARGET, "Session token changed {} -> {}.", old, token);
        }
        self.session_token = Some(token);
    }

    /// Posts in the foreground. No-op if already posted that way.
    pub fn start(&mut self) {
        if self.posted && self.foreground {
            return;
        }
        debug!(target: SERVICE_LOG_TARGET, "Starting notification.");
        self.posted = true;
        self.foreground = true;
        self.render();
    }

    /// Posts if nothing is posted yet. Only a `PLAYING` snapshot is posted in
    /// the foreground; a paused notification is promoted back once playing.
    pub fn require(&mut self) {
        let playing = self.snapshot.state() == PlaybackState::Playing;
        if self.posted && (self.foreground || !playing) {
            return;
        }
        self.posted = true;
        self.foreground = playing;
        self.render();
    }

    /// Leaves the notification up but lets it be dismissed.
    pub fn pause(&mut self) {
        if !self.posted || !self.foreground {
            return;
        }
        debug!(target: SERVICE_LOG_TARGET, "Pausing notification.");
        self.foreground = false;
        self.render();
    }

    pub fn stop(&mut self) {
        if !self.posted {
            return;
        }
        debug!(target: SERVICE_LOG_TARGET, "Removing notification.");
        self.posted = false;
        self.foreground = false;
        self.surface.cancel();
    }

    pub fn on_state_changed(&mut self, snapshot: &PlaybackSnapshot) {
        self.snapshot = snapshot.clone();
        if !self.posted {
            return;
        }
        match snapshot.state() {
            PlaybackState::Stopped | PlaybackState::None => self.stop(),
            _ => self.render(),
        }
    }

    pub fn on_metadata_changed(&mut self, metadata: &StreamInfo) {
        self.metadata = metadata.clone();
        if self.posted {
            self.render();
        }
    }

    /// Nothing is drawn until the player has published a real state.
    fn render(&self) {
        if self.snapshot.state() == PlaybackState::None {
            trace!(target: SERVICE_LOG_TARGET, "No playback state yet, deferring post.");
            return;
        }
        let notification = NowPlayingNotification::build(&self.snapshot, &self.metadata);
        trace!(target: SERVICE_LOG_TARGET, foreground = self.foreground, "Posting {:?}", notification);
        self.surface.post(&notification, self.foreground);
    }
}
