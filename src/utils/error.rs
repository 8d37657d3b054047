//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors surfaced by the enter/exit notification path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Unbalanced exit from '{method}' on thread {thread_id}: no pending enter")]
    UnbalancedExit { thread_id: u64, method: String },

    #[error("Exit from '{method}' on thread {thread_id} names a method that was never entered")]
    UnknownMethod { thread_id: u64, method: String },

    #[error("Recording session already finalized")]
    SessionFinalized,
}

/// Errors that can occur while writing a trace artifact
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Trace artifact already finalized")]
    AlreadyFinalized,
}

/// Errors that can occur while reading a trace artifact back
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Malformed {section} line {line}: {reason}")]
    Malformed {
        section: &'static str,
        line: usize,
        reason: String,
    },

    #[error("Missing section: {0}")]
    MissingSection(&'static str),
}

/// Errors that can occur while resolving recorder configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown trace format '{0}' (expected 'text' or 'container')")]
    UnknownFormat(String),

    #[error("Output path is empty")]
    EmptyPath,
}
