//! Audio focus arbitration types and an in-process provider.

use crate::player::{PlayerEvent, PlayerHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

const LOG_TARGET: &str = "hope_radio::audio::focus";

/// How much of the output the engine currently owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusLevel {
    NoFocus,
    Ducked,
    Focused,
}

impl FocusLevel {
    /// Level the engine holds after the provider reports `change`.
    pub fn after(change: FocusChange) -> FocusLevel {
        match change {
            FocusChange::Gain => FocusLevel::Focused,
            FocusChange::LossTransientCanDuck => FocusLevel::Ducked,
            FocusChange::LossTransient | FocusChange::Loss => FocusLevel::NoFocus,
        }
    }
}

/// Focus change delivered asynchronously by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Gain,
    /// Another source plays briefly; we may keep playing quietly
    LossTransientCanDuck,
    /// Another source plays briefly; we must be silent until it is done
    LossTransient,
    /// Focus is gone for good
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRequest {
    Granted,
    Denied,
}

/// System service arbitrating the single focus grant per process.
///
/// Focus changes are not returned here: the provider pushes them into the
/// player queue as `PlayerEvent::Focus`.
pub trait AudioFocusProvider: Send + Sync {
    fn request_focus(&self) -> FocusRequest;
    fn abandon_focus(&self) -> FocusRequest;
}

/// Process-local focus provider for hosts without a system arbiter.
/// Other "sources" are simulated by calling [`LocalFocusArbiter::simulate`].
pub struct LocalFocusArbiter {
    listener: PlayerHandle,
    held: AtomicBool,
    deny_requests: AtomicBool,
}

impl LocalFocusArbiter {
    pub fn new(listener: PlayerHandle) -> Self {
        Self {
            listener,
            held: AtomicBool::new(false),
            deny_requests: AtomicBool::new(false),
        }
    }

    pub fn set_deny_requests(&self, deny: bool) {
        self.deny_requests.store(deny, Ordering::SeqCst);
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    /// Delivers a focus change to the current holder. Returns false when
    /// nobody holds focus and the change was dropped.
    pub fn simulate(&self, change: FocusChange) -> bool {
        if !self.is_held() {
            debug!(target: LOG_TARGET, "Focus change {:?} dropped: no holder.", change);
            return false;
        }
        if let Err(e) = self.listener.push_event(PlayerEvent::Focus(change)) {
            warn!(target: LOG_TARGET, "Failed to deliver focus change {:?}: {}", change, e);
            return false;
        }
        true
    }
}

impl AudioFocusProvider for LocalFocusArbiter {
    fn request_focus(&self) -> FocusRequest {
        if self.deny_requests.load(Ordering::SeqCst) {
            debug!(target: LOG_TARGET, "Focus request denied.");
            return FocusRequest::Denied;
        }
        self.held.store(true, Ordering::SeqCst);
        FocusRequest::Granted
    }

    fn abandon_focus(&self) -> FocusRequest {
        self.held.store(false, Ordering::SeqCst);
        FocusRequest::Granted
    }
}
