use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur when loading the engine configuration
#[derive(Debug, Error, Diagnostic, Clone)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Error reading engine configuration {path}: {reason}")]
    #[diagnostic(
        code("CONFIG-001"),
        help("Check that the file exists and has proper permissions")
    )]
    ReadError { path: PathBuf, reason: String },

    /// The configuration file is not valid TOML or has wrongly typed keys
    #[error("Invalid engine configuration: {0}")]
    #[diagnostic(
        code("CONFIG-002"),
        help("Check the [compile], [heap] and [link] sections for typos and value types")
    )]
    ParseError(String),

    /// The heap limits contradict each other
    #[error("Invalid heap limits: gc_threshold ({gc_threshold}) exceeds max_bytes ({max_bytes})")]
    #[diagnostic(
        code("CONFIG-003"),
        help("Lower [heap] gc_threshold or raise [heap] max_bytes")
    )]
    InvalidHeapLimits { gc_threshold: usize, max_bytes: usize },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
