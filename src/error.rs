//! Error types for a publishing run.
//!
//! Every variant is fatal: the binary reports it and exits non-zero.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Supplied too many arguments (expected at most one input file, got {0})")]
    TooManyArguments(usize),

    #[error("Missing configuration file {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration file {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("Cannot initialize highlighter: {0}")]
    HighlighterInit(String),

    #[error("Cannot read input {}: {source}", .path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write output {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
