//! "Now playing" metadata: parsing and periodic fetching.

mod poller;

pub use poller::{HttpMetadataSource, MetadataPoller, MetadataSource};

use std::fmt;

/// Artist and title of the song currently on air.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamInfo {
    pub artist: String,
    pub title: String,
}

impl StreamInfo {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// Parses `"artist - title"`. Anything that does not split into exactly
    /// two fields on `" - "` is rejected.
    pub fn parse(raw: &str) -> Option<StreamInfo> {
        let raw = raw.trim_end_matches(['\r', '\n']);
        let mut fields = raw.split(" - ");
        let (artist, title) = (fields.next()?, fields.next()?);
        if fields.next().is_some() {
            return None;
        }
        Some(StreamInfo::new(artist.trim(), title.trim()))
    }

    pub fn is_empty(&self) -> bool {
        self.artist.is_empty() && self.title.is_empty()
    }
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

#[derive(Debug)]
pub enum MetadataError {
    Network(reqwest::Error),
    /// Non-success HTTP status
    Status(u16),
    /// Endpoint answered with an empty body
    Empty,
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::Network(e) => write!(f, "Network error: {}", e),
            MetadataError::Status(code) => write!(f, "Server returned status {}", code),
            MetadataError::Empty => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for MetadataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetadataError::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MetadataError {
    fn from(err: reqwest::Error) -> Self {
        MetadataError::Network(err)
    }
}
