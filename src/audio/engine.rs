// src/audio/engine.rs
use crate::audio::{
    backend::{BackendEvent, BackendEventKind, BackendEventSender, BackendFactory, BackendStatus, Generation, MediaBackend},
    error::BackendError,
    focus::{AudioFocusProvider, FocusChange, FocusLevel, FocusRequest},
    route::AudioRouteMonitor,
    tracks::{TrackId, TrackSelection},
};
use crate::config::Settings;
use crate::player::{PlayerHandle, POSITION_UNKNOWN};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

const LOG_TARGET: &str = "hope_radio::audio::engine";

/// Output gain while we hold full focus.
const VOLUME_NORMAL: f32 = 1.0;

/// Engine parameters fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub stream_url: String,
    pub duck_volume: f32,
    /// `None` restarts on every source error without limit
    pub max_source_retries: Option<u32>,
}

impl From<&Settings> for EngineConfig {
    fn from(settings: &Settings) -> Self {
        EngineConfig {
            stream_url: settings.stream_url.clone(),
            duck_volume: settings.duck_volume,
            max_source_retries: settings.max_source_retries,
        }
    }
}

/// External services the engine drives.
#[derive(Clone)]
pub struct EngineCollaborators {
    pub backend_factory: Arc<dyn BackendFactory>,
    pub focus_provider: Arc<dyn AudioFocusProvider>,
    pub route_monitor: Arc<dyn AudioRouteMonitor>,
}

/// Low-level state the orchestrator maps to a `PlaybackState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// No live backend. `released` is true once an instance has been torn down.
    NoBackend { released: bool },
    Active {
        status: BackendStatus,
        play_when_ready: bool,
    },
}

/// What the engine reports upward after handling a backend callback.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineNotice {
    StatusChanged,
    Completion,
    Error(String),
    TracksChanged(TrackSelection),
}

struct BackendSlot {
    backend: Box<dyn MediaBackend>,
    generation: Generation,
    status: BackendStatus,
    play_when_ready: bool,
}

impl BackendSlot {
    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.play_when_ready = play_when_ready;
        self.backend.set_play_when_ready(play_when_ready);
    }
}

/// Holds the one live backend instance and turns user intent plus focus
/// changes into backend calls.
///
/// All methods run on the player's event loop; nothing here blocks.
pub struct PlaybackEngine {
    config: EngineConfig,
    collaborators: EngineCollaborators,
    handle: PlayerHandle,
    slot: Option<BackendSlot>,
    last_generation: Generation,
    focus: FocusLevel,
    play_on_focus_gain: bool,
    noisy_subscribed: bool,
    released_once: bool,
    tracks: TrackSelection,
    consecutive_source_errors: u32,
}

impl PlaybackEngine {
    pub fn new(config: EngineConfig, collaborators: EngineCollaborators, handle: PlayerHandle) -> Self {
        info!(target: LOG_TARGET, "Creating playback engine for stream: {}", config.stream_url);
        PlaybackEngine {
            config,
            collaborators,
            handle,
            slot: None,
            last_generation: Generation::default(),
            focus: FocusLevel::NoFocus,
            play_on_focus_gain: false,
            noisy_subscribed: false,
            released_once: false,
            tracks: TrackSelection::new(),
            consecutive_source_errors: 0,
        }
    }

    pub fn status(&self) -> EngineStatus {
        match &self.slot {
            Some(slot) => EngineStatus::Active {
                status: slot.status,
                play_when_ready: slot.play_when_ready,
            },
            None => EngineStatus::NoBackend {
                released: self.released_once,
            },
        }
    }

    /// True while audio is wanted: either auto-play is on or a resume is pending focus.
    pub fn is_playing(&self) -> bool {
        self.play_on_focus_gain || self.slot.as_ref().map_or(false, |s| s.play_when_ready)
    }

    pub fn focus_level(&self) -> FocusLevel {
        self.focus
    }

    pub fn has_backend(&self) -> bool {
        self.slot.is_some()
    }

    pub fn generation(&self) -> Option<Generation> {
        self.slot.as_ref().map(|s| s.generation)
    }

    pub fn is_noisy_subscribed(&self) -> bool {
        self.noisy_subscribed
    }

    pub fn position_millis(&self) -> i64 {
        self.slot
            .as_ref()
            .map_or(POSITION_UNKNOWN, |s| s.backend.position_millis())
    }

    pub fn tracks(&self) -> &TrackSelection {
        &self.tracks
    }

    #[instrument(skip(self))]
    pub fn play(&mut self) {
        self.play_on_focus_gain = true;
        self.try_to_get_focus();
        self.subscribe_noisy();

        if self.slot.is_none() {
            self.create_backend();
        }

        self.reconcile_focus();
    }

    /// User pause. Keeps the backend warm for a quick resume.
    #[instrument(skip(self))]
    pub fn pause(&mut self) {
        // A pause the user asked for must not be undone by a later focus gain.
        self.play_on_focus_gain = false;
        self.pause_output();
    }

    #[instrument(skip(self))]
    pub fn stop(&mut self, release_backend: bool) {
        self.give_up_focus();
        self.unsubscribe_noisy();

        if release_backend {
            if let Some(mut slot) = self.slot.take() {
                info!(target: LOG_TARGET, generation = %slot.generation, "Releasing backend.");
                slot.backend.release();
                self.released_once = true;
            }
            self.play_on_focus_gain = false;
        }
    }

    /// Applies the current focus level to the backend. Idempotent.
    pub fn reconcile_focus(&mut self) {
        if self.slot.is_none() {
            trace!(target: LOG_TARGET, "No backend, nothing to reconcile.");
            return;
        }
        debug!(target: LOG_TARGET, focus = ?self.focus, resume = self.play_on_focus_gain, "Reconciling focus.");

        if self.focus == FocusLevel::NoFocus {
            self.pause_output();
            return;
        }

        self.subscribe_noisy();
        let volume = if self.focus == FocusLevel::Ducked {
            self.config.duck_volume
        } else {
            VOLUME_NORMAL
        };
        let resume = std::mem::take(&mut self.play_on_focus_gain);

        if let Some(slot) = self.slot.as_mut() {
            slot.backend.set_volume(volume);
            if resume {
                slot.set_play_when_ready(true);
            }
        }
    }

    #[instrument(skip(self))]
    pub fn on_focus_change(&mut self, change: FocusChange) {
        self.focus = FocusLevel::after(change);
        match change {
            FocusChange::LossTransient => {
                // Remember whether to resume once the other source is done.
                self.play_on_focus_gain = self.is_playing();
            }
            FocusChange::Loss => {
                self.play_on_focus_gain = false;
            }
            FocusChange::Gain | FocusChange::LossTransientCanDuck => {}
        }

        if self.slot.is_some() {
            self.reconcile_focus();
        }
    }

    /// Returns true when the signal should stop playback.
    pub fn on_becoming_noisy(&self) -> bool {
        if !self.noisy_subscribed {
            trace!(target: LOG_TARGET, "Noisy signal while unsubscribed, ignoring.");
            return false;
        }
        self.is_playing()
    }

    /// Returns false when `id` names a rendition the backend never reported.
    #[instrument(skip(self))]
    pub fn select_track(&mut self, id: TrackId) -> bool {
        if !self.tracks.select(id) {
            warn!(target: LOG_TARGET, "Ignoring selection of unknown rendition {}.", id);
            return false;
        }
        if let Some(slot) = self.slot.as_mut() {
            slot.backend.set_rendition_override(self.tracks.override_index());
        }
        true
    }

    /// Handles a backend callback. Callbacks from discarded instances are dropped.
    pub fn handle_backend_event(&mut self, event: BackendEvent) -> Option<EngineNotice> {
        let slot = match self.slot.as_mut() {
            Some(slot) if slot.generation == event.generation => slot,
            _ => {
                trace!(target: LOG_TARGET, generation = %event.generation, "Dropping stale backend event: {:?}", event.kind);
                return None;
            }
        };

        match event.kind {
            BackendEventKind::StatusChanged(status) => {
                slot.status = status;
                match status {
                    BackendStatus::Ended => Some(EngineNotice::Completion),
                    BackendStatus::Ready => {
                        self.consecutive_source_errors = 0;
                        Some(EngineNotice::StatusChanged)
                    }
                    BackendStatus::Idle | BackendStatus::Buffering => Some(EngineNotice::StatusChanged),
                }
            }
            BackendEventKind::TracksChanged(bitrates) => {
                self.tracks.set_available(&bitrates);
                if let Some(slot) = self.slot.as_mut() {
                    slot.backend.set_rendition_override(self.tracks.override_index());
                }
                Some(EngineNotice::TracksChanged(self.tracks.clone()))
            }
            BackendEventKind::Error(err) if err.is_source() => self.restart_after_source_error(err),
            BackendEventKind::Error(err) => {
                error!(target: LOG_TARGET, "Backend error: {}", err);
                Some(EngineNotice::Error(format!("Playback error: {}", err)))
            }
        }
    }

    fn restart_after_source_error(&mut self, err: BackendError) -> Option<EngineNotice> {
        self.consecutive_source_errors += 1;
        if let Some(max) = self.config.max_source_retries {
            if self.consecutive_source_errors > max {
                error!(target: LOG_TARGET, "Backend error: {}. Giving up after {} restarts.", err, max);
                self.consecutive_source_errors = 0;
                return Some(EngineNotice::Error(format!(
                    "Playback error: {} (gave up after {} restarts)",
                    err, max
                )));
            }
        }

        warn!(target: LOG_TARGET, attempt = self.consecutive_source_errors, "Backend error: {}. Retrying.", err);
        self.stop(true);
        self.play();
        Some(EngineNotice::StatusChanged)
    }

    fn create_backend(&mut self) {
        let generation = self.last_generation.next();
        self.last_generation = generation;
        info!(target: LOG_TARGET, generation = %generation, "Creating backend.");

        let events = BackendEventSender::new(self.handle.clone(), generation);
        let mut backend = self.collaborators.backend_factory.create(events);
        self.tracks.reset();
        backend.prepare(&self.config.stream_url);

        self.slot = Some(BackendSlot {
            backend,
            generation,
            // Preparation starts by buffering.
            status: BackendStatus::Buffering,
            play_when_ready: false,
        });
    }

    /// Silences the backend without tearing it down.
    fn pause_output(&mut self) {
        if let Some(slot) = self.slot.as_mut() {
            slot.set_play_when_ready(false);
        }
        self.unsubscribe_noisy();
    }

    fn try_to_get_focus(&mut self) {
        self.focus = match self.collaborators.focus_provider.request_focus() {
            FocusRequest::Granted => FocusLevel::Focused,
            FocusRequest::Denied => {
                debug!(target: LOG_TARGET, "Audio focus request denied.");
                FocusLevel::NoFocus
            }
        };
    }

    fn give_up_focus(&mut self) {
        if self.collaborators.focus_provider.abandon_focus() == FocusRequest::Granted {
            self.focus = FocusLevel::NoFocus;
        }
    }

    fn subscribe_noisy(&mut self) {
        if !self.noisy_subscribed {
            self.collaborators.route_monitor.subscribe();
            self.noisy_subscribed = true;
        }
    }

    fn unsubscribe_noisy(&mut self) {
        if self.noisy_subscribed {
            self.collaborators.route_monitor.unsubscribe();
            self.noisy_subscribed = false;
        }
    }
}
