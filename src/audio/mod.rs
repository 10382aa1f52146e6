//! Playback engine: one live media backend plus the audio focus policy.

mod backend;
mod engine;
mod error;
mod focus;
mod route;
mod simulated;
mod tracks;

pub use backend::*;
pub use engine::*;
pub use error::BackendError;
pub use focus::*;
pub use route::*;
pub use simulated::SimulatedBackendFactory;
pub use tracks::*;
