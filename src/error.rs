//! # Error Handling
//!
//! This module defines the error type shared by every step of the bootstrap.
//! It uses `thiserror` to describe each failure mode with enough context
//! (config path, rules path, exact command line) for an operator to fix the
//! cause and re-run.
//!
//! Every step of the bootstrap is idempotent, so none of these errors is
//! recovered from internally. They are propagated to the binary, which prints
//! them and exits with a non-zero status.

use thiserror::Error;

/// Main error type for init-repo operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration document could not be read or parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A required setting was still empty after flags and config were merged.
    #[error("Configuration error: {message}")]
    MissingConfig { message: String },

    /// The rules document could not be loaded.
    #[error("Failed to load rules from {path}: {message}")]
    RulesLoad { path: String, message: String },

    /// A subprocess could not be started at all.
    #[error("Command \"{command}\" could not be started: {message}")]
    CommandLaunch { command: String, message: String },

    /// A subprocess ran but exited unsuccessfully.
    #[error("Command \"{command}\" failed: {status}")]
    CommandFailed { command: String, status: String },

    /// A toolchain version could not be installed.
    #[error("Toolchain {version} install error: {message}")]
    Toolchain { version: String, message: String },

    /// A filesystem operation on the bootstrap layout failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
