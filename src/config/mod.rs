//! Configuration for the radio client

mod settings;

pub use settings::*;
