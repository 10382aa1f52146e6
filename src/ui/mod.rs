//! Console front end: arguments, command parsing and rendering.

mod cli;

pub use cli::*;
