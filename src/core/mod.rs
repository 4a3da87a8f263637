//! Core application functionality
//!
//! This module contains the application shell around the library:
//! - Command line parsing and validation
//! - The user settings file
//! - The runner that dispatches subcommands

pub mod cli;
pub mod config_file;
pub mod platform;
pub mod runner;

// Re-export commonly used items
pub use cli::{CliArgs, Command};
pub use config_file::{ConfigFile, SavedParameters};
pub use runner::run_app;
