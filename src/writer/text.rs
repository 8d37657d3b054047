//! Plain delimited-text trace writer.
//!
//! Layout of the finished file:
//!
//! ```text
//! 1|0|5400|0|1          <- threadId|startOffset|elapsed|methodId|depth
//! ...
//! methods:
//! 0|app::main
//! threads:
//! 1|2
//! duration:
//! 5400
//! ```

use super::{prepare_output_path, TraceWriter};
use crate::recorder::event::{CallEvent, SessionSummary};
use crate::utils::config::{DURATION_MARKER, METHODS_MARKER, THREADS_MARKER};
use crate::utils::error::WriterError;
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Single-stream text artifact
pub struct TextTraceWriter {
    path: PathBuf,
    /// `None` once finalized
    writer: Option<BufWriter<File>>,
}

impl TextTraceWriter {
    /// Create (truncate) the artifact at `path`
    pub fn create(path: impl AsRef<Path>, buffer_capacity: usize) -> Result<Self, WriterError> {
        let path = path.as_ref();
        prepare_output_path(path)?;

        let file = File::create(path)?;
        debug!("Opened text trace at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::with_capacity(buffer_capacity, file)),
        })
    }

    fn writer_mut(&mut self) -> Result<&mut BufWriter<File>, WriterError> {
        self.writer.as_mut().ok_or(WriterError::AlreadyFinalized)
    }
}

impl TraceWriter for TextTraceWriter {
    fn write_event(&mut self, event: &CallEvent) -> Result<(), WriterError> {
        let writer = self.writer_mut()?;
        writeln!(writer, "{}", event)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), WriterError> {
        self.writer_mut()?.flush()?;
        Ok(())
    }

    fn finalize(&mut self, summary: &SessionSummary) -> Result<(), WriterError> {
        let mut writer = self.writer.take().ok_or(WriterError::AlreadyFinalized)?;

        writeln!(writer, "{}", METHODS_MARKER)?;
        for method in &summary.methods {
            writeln!(writer, "{}|{}", method.id, method.name)?;
        }

        writeln!(writer, "{}", THREADS_MARKER)?;
        let threads: Vec<String> = summary.thread_ids.iter().map(u64::to_string).collect();
        writeln!(writer, "{}", threads.join("|"))?;

        writeln!(writer, "{}", DURATION_MARKER)?;
        writeln!(writer, "{}", summary.duration_nanos)?;

        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
