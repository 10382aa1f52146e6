// src/metadata/poller.rs
use super::MetadataError;
use crate::player::{PlayerError, PlayerEvent, PlayerHandle};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

const LOG_TARGET: &str = "hope_radio::metadata";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Somewhere to read the raw "artist - title" line from.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self) -> Result<String, MetadataError>;
}

/// Reads the line from a plain-text HTTP endpoint.
#[derive(Clone)]
pub struct HttpMetadataSource {
    client: Client,
    url: String,
}

impl HttpMetadataSource {
    pub fn new(url: impl Into<String>) -> Result<Self, MetadataError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MetadataSource for HttpMetadataSource {
    async fn fetch(&self) -> Result<String, MetadataError> {
        trace!(target: LOG_TARGET, "GET {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(MetadataError::Empty);
        }
        Ok(body)
    }
}

struct PollTask {
    task_handle: JoinHandle<()>,
    shutdown_tx: broadcast::Sender<()>,
}

/// Fetches metadata on a fixed interval while started and pushes the raw text
/// into the player queue. The first fetch happens immediately on `start`.
pub struct MetadataPoller {
    source: Arc<dyn MetadataSource>,
    listener: PlayerHandle,
    period: Duration,
    task: Option<PollTask>,
}

impl MetadataPoller {
    pub fn new(source: Arc<dyn MetadataSource>, listener: PlayerHandle, period: Duration) -> Self {
        Self {
            source,
            listener,
            period,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.task_handle.is_finished())
    }

    /// (Re)starts polling. Calling it while running restarts the schedule.
    pub fn start(&mut self) {
        self.stop();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(target: LOG_TARGET, "Cannot start metadata poller: {}", e);
                return;
            }
        };

        info!(target: LOG_TARGET, "Starting metadata poller every {:?}.", self.period);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task_handle = runtime.spawn(poll_loop(
            self.source.clone(),
            self.listener.clone(),
            self.period,
            shutdown_rx,
        ));
        self.task = Some(PollTask {
            task_handle,
            shutdown_tx,
        });
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!(target: LOG_TARGET, "Stopping metadata poller.");
            if task.shutdown_tx.send(()).is_err() {
                trace!(target: LOG_TARGET, "Poll task already gone.");
            }
            // Do not wait for an in-flight request.
            task.task_handle.abort();
        }
    }
}

impl Drop for MetadataPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    source: Arc<dyn MetadataSource>,
    listener: PlayerHandle,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {}
        }

        match source.fetch().await {
            Ok(text) => match listener.push_event(PlayerEvent::Metadata(text)) {
                Ok(()) => {}
                Err(PlayerError::ChannelClosed) => {
                    debug!(target: LOG_TARGET, "Player gone, metadata poller exiting.");
                    break;
                }
                Err(e) => warn!(target: LOG_TARGET, "Dropping metadata update: {}", e),
            },
            Err(e) => debug!(target: LOG_TARGET, "Metadata fetch failed: {}", e),
        }
    }
    trace!(target: LOG_TARGET, "Poll loop finished.");
}
