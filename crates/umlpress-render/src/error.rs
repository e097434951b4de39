//! Error types for render tasks

use thiserror::Error;

/// Errors that settle a render task
///
/// A task rejects with exactly one of these. Configuration errors are raised
/// before any process is launched; page errors stop the drain at the failed
/// page.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Engine executable or bundle is missing
    #[error("{message}")]
    Configuration { message: String },

    /// One page's engine invocation failed
    #[error("{message}")]
    Page {
        /// Zero-based page index
        page: u32,
        /// Localized, title-qualified message
        message: String,
        /// Whatever the engine wrote before failing
        partial_output: Vec<u8>,
    },

    /// The drain task did not run to completion, or no runtime was there to run it
    #[error("{message}")]
    Aborted { message: String },
}

impl RenderError {
    /// Human-readable message
    pub fn message(&self) -> &str {
        match self {
            Self::Configuration { message }
            | Self::Page { message, .. }
            | Self::Aborted { message } => message,
        }
    }

    /// Output captured before the failure (empty unless a page failed)
    pub fn partial_output(&self) -> &[u8] {
        match self {
            Self::Page { partial_output, .. } => partial_output,
            _ => &[],
        }
    }

    /// Check if this is a configuration failure
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Failure reported by the process-output adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct OutputError {
    /// What went wrong (engine stderr, exit status or I/O error)
    pub message: String,
    /// Bytes read from the engine's output before it failed
    pub partial_output: Vec<u8>,
}

impl OutputError {
    pub fn new(message: impl Into<String>, partial_output: Vec<u8>) -> Self {
        Self {
            message: message.into(),
            partial_output,
        }
    }
}

impl From<std::io::Error> for OutputError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string(), Vec::new())
    }
}

/// Output format name not in the catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported output format: {0}")]
pub struct UnsupportedFormat(pub String);

/// Errors loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid TOML for [`crate::config::Settings`]
    #[error("Invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for render tasks
pub type Result<T> = std::result::Result<T, RenderError>;
