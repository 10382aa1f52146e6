use crate::audio::{BackendEvent, BackendStatus, EngineStatus, FocusChange, TrackId, TrackSelection};
use crate::metadata::StreamInfo;
use std::fmt;
use tokio::sync::oneshot;

/// Position reported when no backend can tell us one.
pub const POSITION_UNKNOWN: i64 = -1;

/// Externally visible playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    None,
    Stopped,
    Paused,
    Buffering,
    Playing,
    Error,
}

impl PlaybackState {
    /// Maps the engine's low-level state.
    pub fn from_engine(status: EngineStatus) -> PlaybackState {
        match status {
            EngineStatus::NoBackend { released: false } => PlaybackState::None,
            EngineStatus::NoBackend { released: true } => PlaybackState::Stopped,
            EngineStatus::Active { status, play_when_ready } => match status {
                BackendStatus::Idle | BackendStatus::Ended => PlaybackState::Paused,
                BackendStatus::Buffering => PlaybackState::Buffering,
                BackendStatus::Ready if play_when_ready => PlaybackState::Playing,
                BackendStatus::Ready => PlaybackState::Paused,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::None => "NONE",
            PlaybackState::Stopped => "STOPPED",
            PlaybackState::Paused => "PAUSED",
            PlaybackState::Buffering => "BUFFERING",
            PlaybackState::Playing => "PLAYING",
            PlaybackState::Error => "ERROR",
        }
    }

    /// The transport action a controller should offer in this state.
    pub fn available_actions(&self) -> Vec<PlaybackAction> {
        match self {
            PlaybackState::Playing | PlaybackState::Buffering => vec![PlaybackAction::Pause],
            _ => vec![PlaybackAction::Play],
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackAction {
    Play,
    Pause,
}

/// Immutable view of the player at one transition.
///
/// `error_message` is present exactly when `state` is `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    state: PlaybackState,
    position_millis: i64,
    error_message: Option<String>,
    actions: Vec<PlaybackAction>,
}

impl PlaybackSnapshot {
    /// An error message forces `Error`; an `Error` state without a message
    /// is reported as `Stopped`.
    pub fn new(state: PlaybackState, position_millis: i64, error_message: Option<String>) -> Self {
        let state = match (&error_message, state) {
            (Some(_), _) => PlaybackState::Error,
            (None, PlaybackState::Error) => PlaybackState::Stopped,
            (None, other) => other,
        };
        PlaybackSnapshot {
            state,
            position_millis,
            error_message,
            actions: state.available_actions(),
        }
    }

    /// Like [`PlaybackSnapshot::new`], but the offered action follows whether
    /// the engine intends to play: `Pause` while it does, `Play` otherwise.
    pub fn with_intent(
        state: PlaybackState,
        playing: bool,
        position_millis: i64,
        error_message: Option<String>,
    ) -> Self {
        let mut snapshot = Self::new(state, position_millis, error_message);
        snapshot.actions = if playing {
            vec![PlaybackAction::Pause]
        } else {
            vec![PlaybackAction::Play]
        };
        snapshot
    }

    /// Same snapshot, position replaced.
    pub fn at_position(mut self, position_millis: i64) -> Self {
        self.position_millis = position_millis;
        self
    }

    pub fn initial() -> Self {
        Self::new(PlaybackState::None, POSITION_UNKNOWN, None)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position_millis(&self) -> i64 {
        self.position_millis
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn actions(&self) -> &[PlaybackAction] {
        &self.actions
    }

    pub fn allows(&self, action: PlaybackAction) -> bool {
        self.actions.contains(&action)
    }
}

/// Commands that can be sent to the Player task.
#[derive(Debug)]
pub enum PlayerCommand {
    Play,
    Pause,
    Stop,
    SelectTrack(TrackId),
    GetSnapshot(oneshot::Sender<PlaybackSnapshot>),
    GetTracks(oneshot::Sender<TrackSelection>),
    Shutdown,
}

/// Everything the player loop consumes, in arrival order.
#[derive(Debug)]
pub enum PlayerEvent {
    UserCommand(PlayerCommand),
    Backend(BackendEvent),
    Focus(FocusChange),
    /// Output route is about to become audible to bystanders
    Noisy,
    /// Raw "artist - title" text from the metadata poller
    Metadata(String),
}

impl From<PlayerCommand> for PlayerEvent {
    fn from(command: PlayerCommand) -> Self {
        PlayerEvent::UserCommand(command)
    }
}

/// Updates broadcast by the Player task to rendering surfaces.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerUpdate {
    State(PlaybackSnapshot),
    Metadata(StreamInfo),
    Tracks(TrackSelection),
}
