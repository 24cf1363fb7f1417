//! weatherbot: LINE chat bot answering with CWA weather forecasts.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod weather;
pub mod line;
pub mod bot;
pub mod server;
