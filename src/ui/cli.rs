//! Command-line interface implementation

use clap::Parser;
use std::error::Error;

use crate::audio::{FocusChange, TrackId, TrackSelection};
use crate::metadata::StreamInfo;
use crate::player::{PlaybackAction, PlaybackSnapshot, PlayerUpdate};
use crate::service::{NotificationAction, NowPlayingNotification, StatusSurface};

/// Command-line arguments for hope-radio
#[derive(Parser, Debug)]
#[command(author, version, about = "Console client for the Hope radio live stream", long_about = None)]
pub struct Args {
    /// Config file path
    #[arg(short, long, env = "HOPE_RADIO_CONFIG")]
    pub config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "HOPE_RADIO_LOG_JSON")]
    pub log_json: bool,

    /// Start playing right away
    #[arg(short, long)]
    pub autoplay: bool,
}

/// A line typed into the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Play,
    Pause,
    Stop,
    Track(TrackId),
    Tracks,
    Status,
    /// Pretend another application took or returned audio focus
    Focus(FocusChange),
    /// Pretend the headphones were unplugged
    Unplug,
    Help,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<ConsoleCommand, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("Empty command".to_string());
        };
        let command = match verb.to_lowercase().as_str() {
            "play" | "p" => ConsoleCommand::Play,
            "pause" => ConsoleCommand::Pause,
            "stop" | "s" => ConsoleCommand::Stop,
            "track" | "t" => {
                let id = words.next().ok_or("Usage: track <n|auto>")?;
                ConsoleCommand::Track(id.parse()?)
            }
            "tracks" => ConsoleCommand::Tracks,
            "status" => ConsoleCommand::Status,
            "gain" => ConsoleCommand::Focus(FocusChange::Gain),
            "duck" => ConsoleCommand::Focus(FocusChange::LossTransientCanDuck),
            "transient" => ConsoleCommand::Focus(FocusChange::LossTransient),
            "loss" => ConsoleCommand::Focus(FocusChange::Loss),
            "unplug" => ConsoleCommand::Unplug,
            "help" | "h" | "?" => ConsoleCommand::Help,
            "quit" | "q" | "exit" => ConsoleCommand::Quit,
            other => return Err(format!("Unknown command: {}", other)),
        };
        if words.next().is_some() {
            return Err(format!("Too many arguments for '{}'", verb));
        }
        Ok(command)
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  play | pause | stop      transport controls
  track <n|auto>           pin a bitrate or let the stream adapt
  tracks                   list available bitrates
  status                   show the current state
  gain | duck | transient | loss
                           simulate audio focus changes
  unplug                   simulate headphones being unplugged
  quit";

pub fn format_snapshot(snapshot: &PlaybackSnapshot) -> String {
    let mut line = format!("[{}]", snapshot.state());
    if snapshot.position_millis() >= 0 {
        let secs = snapshot.position_millis() / 1000;
        line.push_str(&format!(" {:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60));
    }
    if let Some(message) = snapshot.error_message() {
        line.push_str(&format!(" {}", message));
    }
    let actions: Vec<&str> = snapshot
        .actions()
        .iter()
        .map(|a| match a {
            PlaybackAction::Play => "play",
            PlaybackAction::Pause => "pause",
        })
        .collect();
    line.push_str(&format!(" (available: {})", actions.join(", ")));
    line
}

pub fn format_metadata(info: &StreamInfo) -> String {
    if info.is_empty() {
        "Now playing: -".to_string()
    } else {
        format!("Now playing: {}", info)
    }
}

/// One line per menu entry, the selected one marked with `*`.
pub fn format_track_menu(tracks: &TrackSelection) -> String {
    tracks
        .menu_entries()
        .iter()
        .map(|entry| {
            let marker = if entry.selected { '*' } else { ' ' };
            format!("{} {:<6} {}", marker, entry.id.to_string(), entry.label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_update(update: &PlayerUpdate) -> String {
    match update {
        PlayerUpdate::State(snapshot) => format_snapshot(snapshot),
        PlayerUpdate::Metadata(info) => format_metadata(info),
        PlayerUpdate::Tracks(tracks) => format!("Tracks:\n{}", format_track_menu(tracks)),
    }
}

pub fn format_notification(notification: &NowPlayingNotification, foreground: bool) -> String {
    let action = match notification.action {
        NotificationAction::Play => "play",
        NotificationAction::Pause => "pause",
    };
    format!(
        "[notification{}] {} | {} ({}, button: {})",
        if foreground { ", ongoing" } else { "" },
        notification.title,
        notification.text,
        notification.state,
        action,
    )
}

/// CLI user interface for interacting with the application
pub struct Cli {
    pub args: Args,
}

impl Cli {
    /// Create a new CLI instance
    pub fn new() -> Self {
        Cli { args: Args::parse() }
    }

    pub fn display_help(&self) {
        println!("{}", HELP_TEXT);
    }

    /// Display error messages
    pub fn display_error(&self, error: &dyn Error) {
        eprintln!("Error: {}", error);
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the status surface as console lines.
#[derive(Debug, Default)]
pub struct ConsoleStatusSurface;

impl StatusSurface for ConsoleStatusSurface {
    fn post(&self, notification: &NowPlayingNotification, foreground: bool) {
        println!("{}", format_notification(notification, foreground));
    }

    fn cancel(&self) {
        println!("[notification removed]");
    }
}
