//! Main integration test entry point for hope-radio
//!
//! This file serves as the entry point for all integration tests.

mod integration;
