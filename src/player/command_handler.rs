use super::{PlaybackSnapshot, PlaybackState, Player, PlayerUpdate, PLAYER_LOG_TARGET};
use crate::audio::TrackId;
use crate::metadata::StreamInfo;
use tracing::{debug, info, instrument, trace};

#[instrument(skip(player))]
pub(super) fn handle_play(player: &mut Player) {
    if player.current_state() == PlaybackState::Playing {
        debug!(target: PLAYER_LOG_TARGET, "Play requested while already playing.");
        return;
    }
    info!(target: PLAYER_LOG_TARGET, "Handling Play command.");

    // Keep-alive must be in place before the engine starts buffering.
    player.lifecycle.on_playback_start();
    player.engine.play();
    recompute_and_publish(player, None);
}

#[instrument(skip(player))]
pub(super) fn handle_pause(player: &mut Player) {
    if !player.engine.is_playing() {
        debug!(target: PLAYER_LOG_TARGET, "Pause requested while not playing.");
        return;
    }
    info!(target: PLAYER_LOG_TARGET, "Handling Pause command.");

    player.engine.pause();
    player.lifecycle.on_playback_paused();
    recompute_and_publish(player, None);
}

#[instrument(skip(player))]
pub(super) fn handle_stop(player: &mut Player, error: Option<String>) {
    info!(target: PLAYER_LOG_TARGET, "Handling Stop (error: {:?}).", error);

    player.engine.stop(true);
    player.lifecycle.on_playback_stop();
    clear_metadata(player);
    recompute_and_publish(player, error);
}

/// Builds a snapshot from the engine, attaches `error`, and publishes it to
/// the lifecycle sink and then to update subscribers.
pub(super) fn recompute_and_publish(player: &mut Player, error: Option<String>) {
    let snapshot = PlaybackSnapshot::with_intent(
        player.current_state(),
        player.engine.is_playing(),
        player.engine.position_millis(),
        error,
    );
    debug!(target: PLAYER_LOG_TARGET, state = %snapshot.state(), "Publishing snapshot.");

    player.lifecycle.on_playback_state_updated(&snapshot);
    match snapshot.state() {
        PlaybackState::Paused => {
            player.lifecycle.on_playback_paused();
            player.lifecycle.on_notification_required();
        }
        PlaybackState::Playing => player.lifecycle.on_notification_required(),
        _ => {}
    }

    player.last_snapshot = snapshot.clone();
    player.broadcast_update(PlayerUpdate::State(snapshot));
}

#[instrument(skip(player))]
pub(super) fn handle_select_track(player: &mut Player, id: TrackId) {
    if player.engine.select_track(id) {
        player.broadcast_update(PlayerUpdate::Tracks(player.engine.tracks().clone()));
    }
}

pub(super) fn handle_metadata(player: &mut Player, raw: &str) {
    if !player.engine.has_backend() {
        trace!(target: PLAYER_LOG_TARGET, "Dropping metadata while stopped.");
        return;
    }
    let Some(info) = StreamInfo::parse(raw) else {
        debug!(target: PLAYER_LOG_TARGET, "Dropping malformed metadata: {:?}", raw);
        return;
    };
    if player.metadata.as_ref() == Some(&info) {
        return;
    }

    info!(target: PLAYER_LOG_TARGET, "Now playing: {}", info);
    player.lifecycle.on_metadata_changed(&info);
    player.metadata = Some(info.clone());
    player.broadcast_update(PlayerUpdate::Metadata(info));
}

fn clear_metadata(player: &mut Player) {
    if player.metadata.take().is_none() {
        return;
    }
    let empty = StreamInfo::default();
    player.lifecycle.on_metadata_changed(&empty);
    player.broadcast_update(PlayerUpdate::Metadata(empty));
}

/// Last published snapshot with a fresh position.
pub(super) fn answer_snapshot(player: &Player) -> PlaybackSnapshot {
    player
        .last_snapshot
        .clone()
        .at_position(player.engine.position_millis())
}
