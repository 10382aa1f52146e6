// src/audio/backend.rs
use crate::audio::error::BackendError;
use crate::player::{PlayerEvent, PlayerHandle};
use std::fmt;
use tracing::{error, trace};

const LOG_TARGET: &str = "hope_radio::audio::backend";

/// Identity of one backend instance. Callbacks carry the generation of the
/// instance that produced them so the engine can drop stale ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Low-level playback state reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Idle,
    Buffering,
    Ready,
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendEventKind {
    StatusChanged(BackendStatus),
    /// Bitrates (bits per second) of the renditions, indexed as the backend indexes them
    TracksChanged(Vec<u32>),
    Error(BackendError),
}

/// A callback from a backend instance, tagged with its generation.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendEvent {
    pub generation: Generation,
    pub kind: BackendEventKind,
}

/// Handed to each backend instance at creation; routes its callbacks into the
/// player's event queue.
#[derive(Clone)]
pub struct BackendEventSender {
    handle: PlayerHandle,
    generation: Generation,
}

impl BackendEventSender {
    pub fn new(handle: PlayerHandle, generation: Generation) -> Self {
        Self { handle, generation }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn status(&self, status: BackendStatus) {
        self.send(BackendEventKind::StatusChanged(status));
    }

    pub fn tracks(&self, bitrates: Vec<u32>) {
        self.send(BackendEventKind::TracksChanged(bitrates));
    }

    pub fn error(&self, error: BackendError) {
        self.send(BackendEventKind::Error(error));
    }

    fn send(&self, kind: BackendEventKind) {
        trace!(target: LOG_TARGET, generation = %self.generation, "Backend event: {:?}", kind);
        let event = PlayerEvent::Backend(BackendEvent {
            generation: self.generation,
            kind,
        });
        if let Err(e) = self.handle.push_event(event) {
            error!(target: LOG_TARGET, generation = %self.generation, "Failed to deliver backend event: {}", e);
        }
    }
}

/// Narrow contract of a playback backend. Every call must return without
/// blocking; results arrive later through the instance's `BackendEventSender`.
pub trait MediaBackend: Send {
    /// Starts loading the stream. Readiness is reported asynchronously.
    fn prepare(&mut self, url: &str);

    /// Whether the backend should produce audio as soon as it is ready.
    fn set_play_when_ready(&mut self, play_when_ready: bool);

    fn set_volume(&mut self, volume: f32);

    /// Pins one rendition (`Some(index)`) or lets the backend adapt (`None`).
    fn set_rendition_override(&mut self, rendition: Option<usize>);

    /// Current position in milliseconds since the stream started.
    fn position_millis(&self) -> i64;

    /// Frees the instance. No callbacks are expected afterwards, and any that
    /// still arrive are discarded by generation.
    fn release(&mut self);
}

/// Builds backend instances on demand.
pub trait BackendFactory: Send + Sync {
    fn create(&self, events: BackendEventSender) -> Box<dyn MediaBackend>;
}
