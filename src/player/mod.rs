use crate::audio::{EngineCollaborators, EngineConfig, PlaybackEngine};
use crate::metadata::StreamInfo;
use crate::service::LifecycleSink;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

mod command_handler;
mod error;
mod event_handler;
mod handle;
mod run_loop;
mod state;


pub use error::PlayerError;
pub use handle::{channel, PlayerEvents, PlayerHandle};
pub use state::{
    PlaybackAction, PlaybackSnapshot, PlaybackState, PlayerCommand, PlayerEvent, PlayerUpdate,
    POSITION_UNKNOWN,
};

pub(crate) const PLAYER_LOG_TARGET: &str = "hope_radio::player";

/// Owns the authoritative playback state and the engine. Every command and
/// callback is consumed from one queue by [`Player::run`], so handlers never
/// run concurrently.
pub struct Player {
    engine: PlaybackEngine,
    lifecycle: Arc<dyn LifecycleSink>,

    events: PlayerEvents,
    handle: PlayerHandle,
    update_tx: broadcast::Sender<PlayerUpdate>,

    metadata: Option<StreamInfo>,
    last_snapshot: PlaybackSnapshot,
}

impl Player {
    /// `handle` and `events` must come from the same [`channel`] call; the
    /// focus provider and route monitor in `collaborators` should push into it too.
    pub fn new(
        config: EngineConfig,
        collaborators: EngineCollaborators,
        lifecycle: Arc<dyn LifecycleSink>,
        handle: PlayerHandle,
        events: PlayerEvents,
        state_update_capacity: usize,
    ) -> Self {
        let (update_tx, _) = broadcast::channel(state_update_capacity);
        let engine = PlaybackEngine::new(config, collaborators, handle.clone());

        Player {
            engine,
            lifecycle,
            events,
            handle,
            update_tx,
            metadata: None,
            last_snapshot: PlaybackSnapshot::initial(),
        }
    }

    pub fn handle(&self) -> PlayerHandle {
        self.handle.clone()
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<PlayerUpdate> {
        self.update_tx.subscribe()
    }

    /// Last published snapshot.
    pub fn snapshot(&self) -> &PlaybackSnapshot {
        &self.last_snapshot
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn metadata(&self) -> Option<&StreamInfo> {
        self.metadata.as_ref()
    }

    /// State derived from the engine right now, ignoring any one-shot error.
    fn current_state(&self) -> PlaybackState {
        PlaybackState::from_engine(self.engine.status())
    }

    fn broadcast_update(&self, update: PlayerUpdate) {
        trace!(target: PLAYER_LOG_TARGET, "Broadcasting update: {:?}", update);
        if self.update_tx.send(update).is_err() {
            debug!(target: PLAYER_LOG_TARGET, "No active listeners for player update.");
        }
    }

    /// Runs until a `Shutdown` command. Spawn this as a Tokio task.
    pub async fn run(&mut self) {
        run_loop::run_player_loop(self).await;
    }

    /// Handles every event already queued, without waiting. Returns how many were handled.
    #[cfg(test)]
    pub(crate) fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            handled += 1;
            if let event_handler::LoopControl::Exit = event_handler::dispatch(self, event) {
                break;
            }
        }
        handled
    }
}
