//! Trace artifact writers.
//!
//! Two serialization variants share one contract:
//! - events are appended one line at a time as calls complete
//! - the method table and header are written once, at finalization
//!
//! `TextTraceWriter` keeps everything in one pipe-delimited stream;
//! `ContainerTraceWriter` splits it into `data`, `methods` and `header`
//! archive entries.

pub mod container;
pub mod text;

pub use container::ContainerTraceWriter;
pub use text::TextTraceWriter;

use crate::recorder::event::{CallEvent, SessionSummary};
use crate::utils::config::{RecorderConfig, TraceFormat};
use crate::utils::error::WriterError;
use log::debug;
use std::path::Path;

/// Sink for completed call events
pub trait TraceWriter: Send {
    /// Append one event line
    fn write_event(&mut self, event: &CallEvent) -> Result<(), WriterError>;

    /// Push buffered event lines to the underlying file
    fn flush(&mut self) -> Result<(), WriterError>;

    /// Write the method table and header, then close the artifact.
    ///
    /// A second call returns `WriterError::AlreadyFinalized`.
    fn finalize(&mut self, summary: &SessionSummary) -> Result<(), WriterError>;

    /// Location of the artifact
    fn path(&self) -> &Path;
}

/// Open the writer variant selected by `config`
///
/// **Public** - used by `RecordingSession::new`
pub fn open_writer(config: &RecorderConfig) -> Result<Box<dyn TraceWriter>, WriterError> {
    let writer: Box<dyn TraceWriter> = match config.format {
        TraceFormat::Text => Box::new(TextTraceWriter::create(
            &config.output_path,
            config.buffer_capacity,
        )?),
        TraceFormat::Container => Box::new(ContainerTraceWriter::create(
            &config.output_path,
            config.buffer_capacity,
        )?),
    };
    Ok(writer)
}

/// Validate an artifact path and create its parent directories
///
/// **Private** - shared by both writer variants
pub(crate) fn prepare_output_path(path: &Path) -> Result<(), WriterError> {
    if path.as_os_str().is_empty() {
        return Err(WriterError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(WriterError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                WriterError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}
