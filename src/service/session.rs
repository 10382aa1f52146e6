use crate::metadata::StreamInfo;
use crate::player::PlaybackSnapshot;
use uuid::Uuid;

/// What the host advertises to external controllers: whether we are the
/// active media source, the current snapshot and the current song.
#[derive(Debug, Clone)]
pub struct MediaSession {
    token: Uuid,
    active: bool,
    snapshot: PlaybackSnapshot,
    metadata: StreamInfo,
}

impl MediaSession {
    pub fn new() -> Self {
        Self {
            token: Uuid::new_v4(),
            active: false,
            snapshot: PlaybackSnapshot::initial(),
            metadata: StreamInfo::default(),
        }
    }

    /// Identity controllers use to address this session.
    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn snapshot(&self) -> &PlaybackSnapshot {
        &self.snapshot
    }

    pub fn set_playback_state(&mut self, snapshot: PlaybackSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn metadata(&self) -> &StreamInfo {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: StreamInfo) {
        self.metadata = metadata;
    }

    /// Replaces the session with a fresh one under a new token. Snapshot and
    /// metadata carry over; the new session starts inactive.
    pub fn recreate(&mut self) -> Uuid {
        self.token = Uuid::new_v4();
        self.active = false;
        self.token
    }
}

impl Default for MediaSession {
    fn default() -> Self {
        Self::new()
    }
}
