//! Shared infrastructure for the workspace crates.

pub mod log_setup;
pub mod parallel;

pub use log_setup::{LogConfig, setup_logging, setup_logging_with};
