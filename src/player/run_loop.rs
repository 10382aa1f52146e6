// src/player/run_loop.rs
use super::event_handler::{self, LoopControl};
use super::{command_handler, Player, PLAYER_LOG_TARGET};
use tracing::info;

/// Runs the player's event processing loop.
pub async fn run_player_loop(player: &mut Player) {
    info!(target: PLAYER_LOG_TARGET, "Player run loop started.");
    command_handler::recompute_and_publish(player, None);

    while let Some(event) = player.events.recv().await {
        if let LoopControl::Exit = event_handler::dispatch(player, event) {
            break;
        }
    }

    info!(target: PLAYER_LOG_TARGET, "Player run loop finished. Performing final cleanup.");
    if player.engine.has_backend() {
        player.engine.stop(true);
    }
    info!(target: PLAYER_LOG_TARGET, "Player task cleanup complete.");
}
