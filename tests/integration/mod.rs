//! Integration tests module
//!
//! This module organizes all integration tests for the hope-radio application.

pub mod config_test;
pub mod playback_flow_test;
