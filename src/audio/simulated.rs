// src/audio/simulated.rs
use crate::audio::backend::{BackendEventSender, BackendFactory, BackendStatus, MediaBackend};
use crate::audio::error::BackendError;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

const LOG_TARGET: &str = "hope_radio::audio::simulated";

const DEFAULT_BUFFERING_DELAY: Duration = Duration::from_millis(1500);
const DEFAULT_BITRATES: [u32; 3] = [64_000, 128_000, 256_000];

/// Backend that never touches the network: it "buffers" for a fixed delay,
/// reports a fixed rendition ladder and then becomes ready. Used by the
/// console host and the end-to-end tests.
#[derive(Debug, Clone)]
pub struct SimulatedBackendFactory {
    buffering_delay: Duration,
    bitrates: Vec<u32>,
}

impl SimulatedBackendFactory {
    pub fn new(buffering_delay: Duration, bitrates: Vec<u32>) -> Self {
        Self {
            buffering_delay,
            bitrates,
        }
    }
}

impl Default for SimulatedBackendFactory {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFERING_DELAY, DEFAULT_BITRATES.to_vec())
    }
}

impl BackendFactory for SimulatedBackendFactory {
    fn create(&self, events: BackendEventSender) -> Box<dyn MediaBackend> {
        Box::new(SimulatedBackend {
            events,
            buffering_delay: self.buffering_delay,
            bitrates: self.bitrates.clone(),
            prepare_task: None,
            started_at: None,
            play_when_ready: false,
            volume: 1.0,
            rendition: None,
        })
    }
}

struct SimulatedBackend {
    events: BackendEventSender,
    buffering_delay: Duration,
    bitrates: Vec<u32>,
    prepare_task: Option<JoinHandle<()>>,
    started_at: Option<Instant>,
    play_when_ready: bool,
    volume: f32,
    rendition: Option<usize>,
}

impl SimulatedBackend {
    fn abort_prepare(&mut self) {
        if let Some(task) = self.prepare_task.take() {
            task.abort();
        }
    }
}

impl MediaBackend for SimulatedBackend {
    fn prepare(&mut self, url: &str) {
        self.abort_prepare();
        if let Err(e) = url::Url::parse(url) {
            self.events.error(BackendError::Source(format!("Invalid stream URL {}: {}", url, e)));
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                self.events.error(BackendError::Unexpected(format!("No async runtime: {}", e)));
                return;
            }
        };

        info!(target: LOG_TARGET, generation = %self.events.generation(), "Preparing stream: {}", url);
        self.started_at = Some(Instant::now());
        let events = self.events.clone();
        let delay = self.buffering_delay;
        let bitrates = self.bitrates.clone();
        self.prepare_task = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            events.tracks(bitrates);
            events.status(BackendStatus::Ready);
        }));
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        trace!(target: LOG_TARGET, "play_when_ready = {}", play_when_ready);
        self.play_when_ready = play_when_ready;
    }

    fn set_volume(&mut self, volume: f32) {
        if (self.volume - volume).abs() > f32::EPSILON {
            debug!(target: LOG_TARGET, "Volume {} -> {}", self.volume, volume);
        }
        self.volume = volume;
    }

    fn set_rendition_override(&mut self, rendition: Option<usize>) {
        match rendition {
            Some(index) if index >= self.bitrates.len() => {
                warn!(target: LOG_TARGET, "Rendition {} out of range, staying adaptive.", index);
                self.rendition = None;
            }
            _ => self.rendition = rendition,
        }
    }

    fn position_millis(&self) -> i64 {
        self.started_at
            .map_or(crate::player::POSITION_UNKNOWN, |t| t.elapsed().as_millis() as i64)
    }

    fn release(&mut self) {
        debug!(target: LOG_TARGET, generation = %self.events.generation(), "Released.");
        self.abort_prepare();
        self.started_at = None;
        self.play_when_ready = false;
    }
}

impl Drop for SimulatedBackend {
    fn drop(&mut self) {
        self.abort_prepare();
    }
}
