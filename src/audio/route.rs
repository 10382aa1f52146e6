use crate::player::{PlayerEvent, PlayerHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

const LOG_TARGET: &str = "hope_radio::audio::route";

/// Source of the "audio becoming noisy" signal (e.g. headphones unplugged).
/// While subscribed, the monitor pushes `PlayerEvent::Noisy` into the player queue.
pub trait AudioRouteMonitor: Send + Sync {
    fn subscribe(&self);
    fn unsubscribe(&self);
}

/// In-process route monitor; `unplug` stands in for the system broadcast.
pub struct LocalRouteMonitor {
    listener: PlayerHandle,
    subscribed: AtomicBool,
}

impl LocalRouteMonitor {
    pub fn new(listener: PlayerHandle) -> Self {
        Self {
            listener,
            subscribed: AtomicBool::new(false),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    /// Returns whether the signal was delivered.
    pub fn unplug(&self) -> bool {
        if !self.is_subscribed() {
            debug!(target: LOG_TARGET, "Output route changed, nobody subscribed.");
            return false;
        }
        debug!(target: LOG_TARGET, "Headphones disconnected.");
        match self.listener.push_event(PlayerEvent::Noisy) {
            Ok(()) => true,
            Err(e) => {
                warn!(target: LOG_TARGET, "Failed to deliver noisy signal: {}", e);
                false
            }
        }
    }
}

impl AudioRouteMonitor for LocalRouteMonitor {
    fn subscribe(&self) {
        self.subscribed.store(true, Ordering::SeqCst);
    }

    fn unsubscribe(&self) {
        self.subscribed.store(false, Ordering::SeqCst);
    }
}
