use super::error::PlayerError;
use super::state::{PlaybackSnapshot, PlayerCommand, PlayerEvent};
use crate::audio::{TrackId, TrackSelection};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::oneshot;
use tracing::trace;

const LOG_TARGET: &str = "hope_radio::player::handle";

/// Cloneable entry point into the player's serialized event queue.
///
/// User commands go through a bounded queue: the async methods wait for
/// capacity and `try_command` fails with `ChannelFull`. Callbacks pushed with
/// `push_event` (backend, focus, route, metadata) use an unbounded queue and
/// are never dropped while the player is alive.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    callbacks: mpsc::UnboundedSender<PlayerEvent>,
}

/// Receiving side of both queues, owned by the player.
#[derive(Debug)]
pub struct PlayerEvents {
    commands: mpsc::Receiver<PlayerCommand>,
    callbacks: mpsc::UnboundedReceiver<PlayerEvent>,
}

/// Creates the queues shared by the player and all of its event sources.
/// `capacity` bounds pending user commands only.
pub fn channel(capacity: usize) -> (PlayerHandle, PlayerEvents) {
    let (commands_tx, commands_rx) = mpsc::channel(capacity);
    let (callbacks_tx, callbacks_rx) = mpsc::unbounded_channel();
    (
        PlayerHandle {
            commands: commands_tx,
            callbacks: callbacks_tx,
        },
        PlayerEvents {
            commands: commands_rx,
            callbacks: callbacks_rx,
        },
    )
}

impl PlayerEvents {
    /// Next event, callbacks first. `None` once every handle is gone.
    pub async fn recv(&mut self) -> Option<PlayerEvent> {
        tokio::select! {
            biased;
            Some(event) = self.callbacks.recv() => Some(event),
            Some(command) = self.commands.recv() => Some(PlayerEvent::UserCommand(command)),
            else => None,
        }
    }

    pub fn try_recv(&mut self) -> Result<PlayerEvent, TryRecvError> {
        match self.callbacks.try_recv() {
            Ok(event) => Ok(event),
            Err(_) => self.commands.try_recv().map(PlayerEvent::UserCommand),
        }
    }
}

impl PlayerHandle {
    pub async fn play(&self) -> Result<(), PlayerError> {
        self.command(PlayerCommand::Play).await
    }

    pub async fn pause(&self) -> Result<(), PlayerError> {
        self.command(PlayerCommand::Pause).await
    }

    pub async fn stop(&self) -> Result<(), PlayerError> {
        self.command(PlayerCommand::Stop).await
    }

    pub async fn select_track(&self, id: TrackId) -> Result<(), PlayerError> {
        self.command(PlayerCommand::SelectTrack(id)).await
    }

    pub async fn shutdown(&self) -> Result<(), PlayerError> {
        self.command(PlayerCommand::Shutdown).await
    }

    /// Snapshot as of the moment the player processes the query.
    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, PlayerError> {
        let (tx, rx) = oneshot::channel();
        self.command(PlayerCommand::GetSnapshot(tx)).await?;
        rx.await.map_err(|_| PlayerError::ResponseDropped)
    }

    pub async fn tracks(&self) -> Result<TrackSelection, PlayerError> {
        let (tx, rx) = oneshot::channel();
        self.command(PlayerCommand::GetTracks(tx)).await?;
        rx.await.map_err(|_| PlayerError::ResponseDropped)
    }

    pub async fn command(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        trace!(target: LOG_TARGET, "Sending command: {:?}", command);
        self.commands
            .send(command)
            .await
            .map_err(|_| PlayerError::ChannelClosed)
    }

    pub fn try_command(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        self.commands.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PlayerError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => PlayerError::ChannelClosed,
        })
    }

    /// Queues a callback. Only fails once the player has gone away.
    pub fn push_event(&self, event: PlayerEvent) -> Result<(), PlayerError> {
        self.callbacks.send(event).map_err(|_| PlayerError::ChannelClosed)
    }
}
