// src/service/idle_timer.rs
use super::SERVICE_LOG_TARGET;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// One-shot delayed action. Arming replaces any pending timer; dropping or
/// cancelling aborts it.
#[derive(Debug)]
pub struct IdleStopTimer {
    delay: Duration,
    task: Option<JoinHandle<()>>,
}

impl IdleStopTimer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, task: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn arm<F>(&mut self, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(target: SERVICE_LOG_TARGET, "Cannot arm idle timer: {}", e);
                return;
            }
        };

        debug!(target: SERVICE_LOG_TARGET, "Idle stop timer armed for {:?}.", self.delay);
        let delay = self.delay;
        self.task = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            trace!(target: SERVICE_LOG_TARGET, "Idle stop timer cancelled.");
            task.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }
}

impl Drop for IdleStopTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
