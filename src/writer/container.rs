//! Zip container trace writer.
//!
//! The archive holds three entries, written and closed in order:
//! `data` (event lines), `methods` (`id|name` lines) and `header`
//! (`;`-joined thread ids, newline, duration).

use super::{prepare_output_path, TraceWriter};
use crate::recorder::event::{CallEvent, SessionSummary};
use crate::utils::config::{DATA_ENTRY, HEADER_ENTRY, METHODS_ENTRY};
use crate::utils::error::WriterError;
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

type Archive = ZipWriter<BufWriter<File>>;

/// Multi-entry archive artifact
pub struct ContainerTraceWriter {
    path: PathBuf,
    /// `None` once finalized; while `Some`, the `data` entry is open
    archive: Option<Archive>,
    options: SimpleFileOptions,
}

impl ContainerTraceWriter {
    /// Create (truncate) the archive at `path` and open its `data` entry
    pub fn create(path: impl AsRef<Path>, buffer_capacity: usize) -> Result<Self, WriterError> {
        let path = path.as_ref();
        prepare_output_path(path)?;

        let file = File::create(path)?;
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut archive = ZipWriter::new(BufWriter::with_capacity(buffer_capacity, file));
        // The event stream is unbounded; zip64 lets it pass 4 GiB
        archive.start_file(DATA_ENTRY, options.large_file(true))?;
        debug!("Opened container trace at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            archive: Some(archive),
            options,
        })
    }

    fn archive_mut(&mut self) -> Result<&mut Archive, WriterError> {
        self.archive.as_mut().ok_or(WriterError::AlreadyFinalized)
    }

    /// Open `name`, run `body` against it, then leave it to be closed by
    /// the next `start_file` or `finish`
    fn append_entry<F>(&self, archive: &mut Archive, name: &str, body: F) -> Result<(), WriterError>
    where
        F: FnOnce(&mut Archive) -> std::io::Result<()>,
    {
        archive.start_file(name, self.options)?;
        body(archive)?;
        archive.flush()?;
        Ok(())
    }
}

impl TraceWriter for ContainerTraceWriter {
    fn write_event(&mut self, event: &CallEvent) -> Result<(), WriterError> {
        let archive = self.archive_mut()?;
        writeln!(archive, "{}", event)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), WriterError> {
        self.archive_mut()?.flush()?;
        Ok(())
    }

    fn finalize(&mut self, summary: &SessionSummary) -> Result<(), WriterError> {
        let mut archive = self.archive.take().ok_or(WriterError::AlreadyFinalized)?;
        archive.flush()?;

        // Starting `methods` closes `data`
        self.append_entry(&mut archive, METHODS_ENTRY, |w| {
            for method in &summary.methods {
                writeln!(w, "{}|{}", method.id, method.name)?;
            }
            Ok(())
        })?;

        self.append_entry(&mut archive, HEADER_ENTRY, |w| {
            let threads: Vec<String> = summary.thread_ids.iter().map(u64::to_string).collect();
            write!(w, "{}\n{}", threads.join(";"), summary.duration_nanos)
        })?;

        let mut inner = archive.finish()?;
        inner.flush()?;
        inner.get_ref().sync_all()?;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
