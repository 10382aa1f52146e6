// src/player/event_handler.rs
use super::{command_handler, Player, PlayerCommand, PlayerEvent, PlayerUpdate, PLAYER_LOG_TARGET};
use crate::audio::{BackendEvent, EngineNotice, FocusChange};
use tracing::{debug, info, trace, warn};

pub(super) enum LoopControl {
    Continue,
    Exit,
}

/// Routes one queued event to its handler.
pub(super) fn dispatch(player: &mut Player, event: PlayerEvent) -> LoopControl {
    trace!(target: PLAYER_LOG_TARGET, "Received event: {:?}", event);
    match event {
        PlayerEvent::UserCommand(command) => return handle_command(player, command),
        PlayerEvent::Backend(event) => handle_backend_event(player, event),
        PlayerEvent::Focus(change) => handle_focus_change(player, change),
        PlayerEvent::Noisy => handle_becoming_noisy(player),
        PlayerEvent::Metadata(raw) => command_handler::handle_metadata(player, &raw),
    }
    LoopControl::Continue
}

fn handle_command(player: &mut Player, command: PlayerCommand) -> LoopControl {
    match command {
        PlayerCommand::Play => command_handler::handle_play(player),
        PlayerCommand::Pause => command_handler::handle_pause(player),
        PlayerCommand::Stop => command_handler::handle_stop(player, None),
        PlayerCommand::SelectTrack(id) => command_handler::handle_select_track(player, id),
        PlayerCommand::GetSnapshot(responder) => {
            // Ignore error if receiver dropped
            let _ = responder.send(command_handler::answer_snapshot(player));
        }
        PlayerCommand::GetTracks(responder) => {
            let _ = responder.send(player.engine.tracks().clone());
        }
        PlayerCommand::Shutdown => {
            info!(target: PLAYER_LOG_TARGET, "Shutdown command received. Exiting run loop.");
            command_handler::handle_stop(player, None);
            return LoopControl::Exit;
        }
    }
    LoopControl::Continue
}

fn handle_backend_event(player: &mut Player, event: BackendEvent) {
    match player.engine.handle_backend_event(event) {
        None => {}
        Some(EngineNotice::StatusChanged) => command_handler::recompute_and_publish(player, None),
        Some(EngineNotice::Completion) => {
            info!(target: PLAYER_LOG_TARGET, "Stream ended.");
            command_handler::handle_stop(player, None);
        }
        Some(EngineNotice::Error(message)) => {
            warn!(target: PLAYER_LOG_TARGET, "Playback failed: {}", message);
            command_handler::handle_stop(player, Some(message));
        }
        Some(EngineNotice::TracksChanged(selection)) => {
            player.broadcast_update(PlayerUpdate::Tracks(selection));
        }
    }
}

fn handle_focus_change(player: &mut Player, change: FocusChange) {
    debug!(target: PLAYER_LOG_TARGET, "Audio focus changed: {:?}", change);
    player.engine.on_focus_change(change);
    command_handler::recompute_and_publish(player, None);
}

fn handle_becoming_noisy(player: &mut Player) {
    if !player.engine.on_becoming_noisy() {
        return;
    }
    info!(target: PLAYER_LOG_TARGET, "Audio output became noisy, stopping playback.");
    // Goes back through the queue like any other Stop.
    if let Err(e) = player.handle.try_command(PlayerCommand::Stop) {
        warn!(target: PLAYER_LOG_TARGET, "Failed to enqueue Stop ({}), stopping directly.", e);
        command_handler::handle_stop(player, None);
    }
}
