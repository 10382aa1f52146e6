//! Bitrate rendition selection.

use std::fmt;
use std::str::FromStr;

/// Raw id that controllers send for "let the backend choose".
pub const ADAPTIVE_TRACK_ID: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackId {
    #[default]
    Adaptive,
    /// Backend index of one rendition
    Index(usize),
}

impl TrackId {
    /// Maps a controller's integer id. Negative ids are rejected.
    pub fn from_raw(id: i32) -> Option<TrackId> {
        match id {
            ADAPTIVE_TRACK_ID => Some(TrackId::Adaptive),
            n if n >= 0 => Some(TrackId::Index(n as usize)),
            _ => None,
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            TrackId::Adaptive => ADAPTIVE_TRACK_ID,
            TrackId::Index(i) => i as i32,
        }
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackId::Adaptive => write!(f, "auto"),
            TrackId::Index(i) => write!(f, "{}", i),
        }
    }
}

impl FromStr for TrackId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") || s.eq_ignore_ascii_case("adaptive") {
            return Ok(TrackId::Adaptive);
        }
        let raw: i32 = s.parse().map_err(|_| format!("Invalid track id: {}", s))?;
        TrackId::from_raw(raw).ok_or_else(|| format!("Invalid track id: {}", s))
    }
}

/// One encoded variant of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendition {
    pub index: usize,
    pub bitrate: u32,
}

impl Rendition {
    pub fn kbps(&self) -> u32 {
        self.bitrate / 1000
    }
}

/// Entry of the track picker menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMenuEntry {
    pub id: TrackId,
    pub label: String,
    pub selected: bool,
}

/// Renditions known for the current stream plus the user's choice.
/// Reset every time the stream is prepared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackSelection {
    renditions: Vec<Rendition>,
    selected: TrackId,
}

impl TrackSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renditions in ascending bitrate order.
    pub fn renditions(&self) -> &[Rendition] {
        &self.renditions
    }

    pub fn available_bitrates(&self) -> Vec<u32> {
        self.renditions.iter().map(|r| r.bitrate).collect()
    }

    pub fn selected(&self) -> TrackId {
        self.selected
    }

    /// The pinned rendition, if any.
    pub fn override_index(&self) -> Option<usize> {
        match self.selected {
            TrackId::Adaptive => None,
            TrackId::Index(i) => Some(i),
        }
    }

    pub fn reset(&mut self) {
        self.renditions.clear();
        self.selected = TrackId::Adaptive;
    }

    /// Replaces the known renditions. `bitrates[i]` belongs to backend index `i`.
    /// A pinned rendition that no longer exists falls back to adaptive.
    pub fn set_available(&mut self, bitrates: &[u32]) {
        let mut renditions: Vec<Rendition> = bitrates
            .iter()
            .enumerate()
            .map(|(index, &bitrate)| Rendition { index, bitrate })
            .collect();
        renditions.sort_by_key(|r| (r.bitrate, r.index));
        self.renditions = renditions;
        if let TrackId::Index(i) = self.selected {
            if !self.contains(i) {
                self.selected = TrackId::Adaptive;
            }
        }
    }

    /// Applies a selection. Returns false (and changes nothing) for an index
    /// the backend did not report.
    pub fn select(&mut self, id: TrackId) -> bool {
        if let TrackId::Index(i) = id {
            if !self.contains(i) {
                return false;
            }
        }
        self.selected = id;
        true
    }

    fn contains(&self, index: usize) -> bool {
        self.renditions.iter().any(|r| r.index == index)
    }

    /// "Auto" first, then one entry per rendition labelled with its kilobit rate.
    pub fn menu_entries(&self) -> Vec<TrackMenuEntry> {
        let mut entries = Vec::with_capacity(self.renditions.len() + 1);
        entries.push(TrackMenuEntry {
            id: TrackId::Adaptive,
            label: "Auto".to_string(),
            selected: self.selected == TrackId::Adaptive,
        });
        for rendition in &self.renditions {
            let id = TrackId::Index(rendition.index);
            entries.push(TrackMenuEntry {
                id,
                label: format!("{} kbps", rendition.kbps()),
                selected: self.selected == id,
            });
        }
        entries
    }
}
