//! Recording fakes for the engine's collaborators and a player harness that
//! processes queued events synchronously.

use crate::audio::{
    AudioFocusProvider, AudioRouteMonitor, BackendError, BackendEventSender, BackendFactory,
    BackendStatus, EngineCollaborators, EngineConfig, FocusChange, FocusRequest, Generation,
    MediaBackend,
};
use crate::metadata::StreamInfo;
use crate::player::{
    self, PlaybackSnapshot, PlaybackState, Player, PlayerCommand, PlayerEvent, PlayerHandle,
    PlayerUpdate,
};
use crate::service::LifecycleSink;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

pub const TEST_STREAM_URL: &str = "https://stream.example.com/live/playlist.m3u8";

pub fn test_config() -> EngineConfig {
    EngineConfig {
        stream_url: TEST_STREAM_URL.to_string(),
        duck_volume: 0.2,
        max_source_retries: Some(3),
    }
}

// --- Media backend ---

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Prepare(String),
    PlayWhenReady(bool),
    Volume(f32),
    Rendition(Option<usize>),
    Release,
}

#[derive(Default)]
struct BackendLog {
    calls: Vec<(Generation, BackendCall)>,
    senders: Vec<BackendEventSender>,
}

/// Creates backends that only record what they are told.
#[derive(Default)]
pub struct RecordingBackendFactory {
    log: Arc<Mutex<BackendLog>>,
}

impl RecordingBackendFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.log.lock().senders.len()
    }

    /// Event sender of the most recently created backend.
    pub fn last_sender(&self) -> Option<BackendEventSender> {
        self.log.lock().senders.last().cloned()
    }

    pub fn sender(&self, index: usize) -> Option<BackendEventSender> {
        self.log.lock().senders.get(index).cloned()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.log.lock().calls.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn calls_for(&self, generation: Generation) -> Vec<BackendCall> {
        self.log
            .lock()
            .calls
            .iter()
            .filter(|(g, _)| *g == generation)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn prepares(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::Prepare(_)))
            .count()
    }

    pub fn count(&self, call: &BackendCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn last_play_when_ready(&self) -> Option<bool> {
        self.calls().iter().rev().find_map(|c| match c {
            BackendCall::PlayWhenReady(p) => Some(*p),
            _ => None,
        })
    }

    pub fn last_volume(&self) -> Option<f32> {
        self.calls().iter().rev().find_map(|c| match c {
            BackendCall::Volume(v) => Some(*v),
            _ => None,
        })
    }

    pub fn last_rendition(&self) -> Option<Option<usize>> {
        self.calls().iter().rev().find_map(|c| match c {
            BackendCall::Rendition(r) => Some(*r),
            _ => None,
        })
    }

    pub fn clear_calls(&self) {
        self.log.lock().calls.clear();
    }
}

impl BackendFactory for RecordingBackendFactory {
    fn create(&self, events: BackendEventSender) -> Box<dyn MediaBackend> {
        let generation = events.generation();
        self.log.lock().senders.push(events);
        Box::new(RecordingBackend {
            generation,
            log: self.log.clone(),
        })
    }
}

struct RecordingBackend {
    generation: Generation,
    log: Arc<Mutex<BackendLog>>,
}

impl RecordingBackend {
    fn record(&self, call: BackendCall) {
        self.log.lock().calls.push((self.generation, call));
    }
}

impl MediaBackend for RecordingBackend {
    fn prepare(&mut self, url: &str) {
        self.record(BackendCall::Prepare(url.to_string()));
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.record(BackendCall::PlayWhenReady(play_when_ready));
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(BackendCall::Volume(volume));
    }

    fn set_rendition_override(&mut self, rendition: Option<usize>) {
        self.record(BackendCall::Rendition(rendition));
    }

    fn position_millis(&self) -> i64 {
        1_000
    }

    fn release(&mut self) {
        self.record(BackendCall::Release);
    }
}

// --- Focus and route ---

pub struct ScriptedFocusProvider {
    grant: AtomicBool,
    requests: AtomicUsize,
    abandons: AtomicUsize,
}

impl ScriptedFocusProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            grant: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
            abandons: AtomicUsize::new(0),
        })
    }

    pub fn set_grant(&self, grant: bool) {
        self.grant.store(grant, Ordering::SeqCst);
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn abandons(&self) -> usize {
        self.abandons.load(Ordering::SeqCst)
    }
}

impl AudioFocusProvider for ScriptedFocusProvider {
    fn request_focus(&self) -> FocusRequest {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.grant.load(Ordering::SeqCst) {
            FocusRequest::Granted
        } else {
            FocusRequest::Denied
        }
    }

    fn abandon_focus(&self) -> FocusRequest {
        self.abandons.fetch_add(1, Ordering::SeqCst);
        FocusRequest::Granted
    }
}

#[derive(Default)]
pub struct RecordingRouteMonitor {
    subscribed: AtomicBool,
    subscribes: AtomicUsize,
}

impl RecordingRouteMonitor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }
}

impl AudioRouteMonitor for RecordingRouteMonitor {
    fn subscribe(&self) {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        self.subscribed.store(true, Ordering::SeqCst);
    }

    fn unsubscribe(&self) {
        self.subscribed.store(false, Ordering::SeqCst);
    }
}

// --- Lifecycle sink ---

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Start,
    Stop,
    Paused,
    NotificationRequired,
    StateUpdated(PlaybackSnapshot),
    Metadata(StreamInfo),
}

#[derive(Default)]
pub struct RecordingLifecycleSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingLifecycleSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }

    /// Returns and forgets everything recorded so far.
    pub fn take(&self) -> Vec<SinkCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn snapshots(&self) -> Vec<PlaybackSnapshot> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::StateUpdated(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn states(&self) -> Vec<PlaybackState> {
        self.snapshots().iter().map(|s| s.state()).collect()
    }

    pub fn count(&self, call: &SinkCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: SinkCall) {
        self.calls.lock().push(call);
    }
}

impl LifecycleSink for RecordingLifecycleSink {
    fn on_playback_start(&self) {
        self.record(SinkCall::Start);
    }

    fn on_playback_stop(&self) {
        self.record(SinkCall::Stop);
    }

    fn on_playback_paused(&self) {
        self.record(SinkCall::Paused);
    }

    fn on_notification_required(&self) {
        self.record(SinkCall::NotificationRequired);
    }

    fn on_playback_state_updated(&self, snapshot: &PlaybackSnapshot) {
        self.record(SinkCall::StateUpdated(snapshot.clone()));
    }

    fn on_metadata_changed(&self, info: &StreamInfo) {
        self.record(SinkCall::Metadata(info.clone()));
    }
}

// --- Player harness ---

/// A player wired to recording fakes. Every helper enqueues one event and
/// then runs the queue dry, so assertions see the settled state.
pub struct Harness {
    pub player: Player,
    pub handle: PlayerHandle,
    pub backends: Arc<RecordingBackendFactory>,
    pub focus: Arc<ScriptedFocusProvider>,
    pub route: Arc<RecordingRouteMonitor>,
    pub sink: Arc<RecordingLifecycleSink>,
    pub updates: broadcast::Receiver<PlayerUpdate>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let backends = RecordingBackendFactory::new();
        let focus = ScriptedFocusProvider::new();
        let route = RecordingRouteMonitor::new();
        let sink = RecordingLifecycleSink::new();
        let (handle, events) = player::channel(64);
        let collaborators = EngineCollaborators {
            backend_factory: backends.clone(),
            focus_provider: focus.clone(),
            route_monitor: route.clone(),
        };
        let player = Player::new(config, collaborators, sink.clone(), handle.clone(), events, 256);
        let updates = player.subscribe_updates();
        Harness {
            player,
            handle,
            backends,
            focus,
            route,
            sink,
            updates,
        }
    }

    pub fn command(&mut self, command: PlayerCommand) {
        self.handle.try_command(command).expect("queue has room");
        self.player.process_pending();
    }

    pub fn play(&mut self) {
        self.command(PlayerCommand::Play);
    }

    pub fn pause(&mut self) {
        self.command(PlayerCommand::Pause);
    }

    pub fn stop(&mut self) {
        self.command(PlayerCommand::Stop);
    }

    /// Reports `status` from the most recently created backend.
    pub fn backend_status(&mut self, status: BackendStatus) {
        self.last_sender().status(status);
        self.player.process_pending();
    }

    pub fn backend_error(&mut self, error: BackendError) {
        self.last_sender().error(error);
        self.player.process_pending();
    }

    pub fn backend_tracks(&mut self, bitrates: Vec<u32>) {
        self.last_sender().tracks(bitrates);
        self.player.process_pending();
    }

    pub fn focus_change(&mut self, change: FocusChange) {
        self.push(PlayerEvent::Focus(change));
    }

    pub fn noisy(&mut self) {
        self.push(PlayerEvent::Noisy);
    }

    pub fn metadata(&mut self, raw: &str) {
        self.push(PlayerEvent::Metadata(raw.to_string()));
    }

    pub fn push(&mut self, event: PlayerEvent) {
        self.handle.push_event(event).expect("queue has room");
        self.player.process_pending();
    }

    pub fn state(&self) -> PlaybackState {
        self.player.snapshot().state()
    }

    pub fn last_sender(&self) -> BackendEventSender {
        self.backends.last_sender().expect("a backend was created")
    }

    pub fn drain_updates(&mut self) -> Vec<PlayerUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.updates.try_recv() {
            updates.push(update);
        }
        updates
    }
}
