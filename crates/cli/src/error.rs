//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success (event loop ended normally)
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: fatal startup error (shader build or GPU setup in the first initialize)
//! - 11: I/O error (config file)
//! - 12: input error (bad config values, bad flags)
//! - 13: window or GL context error

use shader_harness_core::{HarnessError, RenderError};
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
#[derive(Debug)]
pub enum CliError {
    /// The render state could not be initialized before the first frame.
    FatalStartup(RenderError),
    /// An I/O error (config file read).
    Io(String),
    /// A user input error (invalid config or flag values).
    Input(String),
    /// The window, display or GL context could not be created or driven.
    Window(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::FatalStartup(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Window(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::FatalStartup(e) => write!(f, "fatal startup error: {e}"),
            CliError::Io(msg) => write!(f, "{msg}"),
            CliError::Input(msg) => write!(f, "{msg}"),
            CliError::Window(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<RenderError> for CliError {
    fn from(e: RenderError) -> Self {
        CliError::FatalStartup(e)
    }
}

impl From<HarnessError> for CliError {
    fn from(e: HarnessError) -> Self {
        match e {
            HarnessError::Io(msg) => CliError::Io(msg),
            other => CliError::Input(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Input(e.to_string())
    }
}
