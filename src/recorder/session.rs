//! The recording session: entry point for enter/exit notifications.
//!
//! A `RecordingSession` ties together the session clock, the method
//! interner, the per-thread call stacks and the trace writer. It is built
//! once at startup and shared by reference (or `Arc`) with every call site.
//!
//! Lifecycle:
//! 1. `new` opens the artifact and reports its path
//! 2. `on_enter` / `on_exit` (or the RAII `enter` guard) record calls
//! 3. `shutdown` (or `Drop`) writes the method table and header exactly once

use super::call_stack::{self, current_thread_id};
use super::clock::SessionClock;
use super::event::{CallEvent, SessionSummary};
use super::interner::MethodInterner;
use crate::utils::config::RecorderConfig;
use crate::utils::error::{RecordError, WriterError};
use crate::writer::{open_writer, TraceWriter};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// One profiling run
pub struct RecordingSession {
    id: u64,
    path: PathBuf,
    clock: SessionClock,
    interner: MethodInterner,
    /// `None` once finalized
    writer: Mutex<Option<Box<dyn TraceWriter>>>,
    finalized: AtomicBool,
    /// Set after the first write failure; later events are dropped
    write_failed: AtomicBool,
    dropped_events: AtomicU64,
}

impl RecordingSession {
    /// Open the artifact described by `config` and start a session
    ///
    /// **Public** - main constructor
    ///
    /// # Errors
    /// * `WriterError::InvalidPath` - path empty, a directory, or parent not creatable
    /// * `WriterError::Io` / `WriterError::Archive` - artifact could not be opened
    pub fn new(config: &RecorderConfig) -> Result<Self, WriterError> {
        let writer = open_writer(config)?;
        Ok(Self::with_writer(writer))
    }

    /// Start a session on top of an already opened writer
    pub fn with_writer(writer: Box<dyn TraceWriter>) -> Self {
        let path = writer.path().to_path_buf();
        info!("Writing performance data to: {}", path.display());

        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        call_stack::register_session(id);

        Self {
            id,
            path,
            clock: SessionClock::new(),
            interner: MethodInterner::new(),
            writer: Mutex::new(Some(writer)),
            finalized: AtomicBool::new(false),
            write_failed: AtomicBool::new(false),
            dropped_events: AtomicU64::new(0),
        }
    }

    /// Record entry into `method` on the calling thread.
    ///
    /// Never blocks on I/O. Ignored after finalization.
    pub fn on_enter(&self, method: &str) {
        if self.is_finalized() {
            return;
        }

        // Fixing the zero point before sampling keeps every offset >= 0
        self.clock.mark_start();
        let start = self.clock.now();

        if call_stack::with_stack(self.id, |stack| stack.push(start)).is_none() {
            // Thread is exiting; its TLS is gone
            return;
        }

        self.interner.intern(method);
    }

    /// Record exit from `method` on the calling thread and emit its event.
    ///
    /// # Errors
    /// * `RecordError::UnbalancedExit` - no pending enter on this thread
    /// * `RecordError::UnknownMethod` - `method` was never entered
    /// * `RecordError::SessionFinalized` - the session is already closed
    ///
    /// Write failures are never returned here; they are logged once and
    /// counted in `dropped_events`.
    pub fn on_exit(&self, method: &str) -> Result<(), RecordError> {
        if self.is_finalized() {
            return Err(RecordError::SessionFinalized);
        }

        let thread_id = current_thread_id();
        self.clock.observe_thread(thread_id);

        // Depth is read before the pop so the root call has depth 1
        let popped = call_stack::with_existing_stack(self.id, |stack| match stack {
            Some(stack) if !stack.is_empty() => {
                let depth = stack.depth();
                stack.pop().map(|start| (start, depth))
            }
            _ => None,
        })
        .flatten();

        let (start, depth) = popped.ok_or_else(|| {
            warn!("Unbalanced exit from '{}' on thread {}", method, thread_id);
            RecordError::UnbalancedExit {
                thread_id,
                method: method.to_string(),
            }
        })?;

        let end = self.clock.now();
        let elapsed_nanos = end.saturating_sub(start);

        let method_id = self.interner.get(method).ok_or_else(|| {
            warn!("Exit from never-entered method '{}' on thread {}", method, thread_id);
            RecordError::UnknownMethod {
                thread_id,
                method: method.to_string(),
            }
        })?;

        self.clock.observe_exit(end);

        self.emit(&CallEvent {
            thread_id,
            start_offset: self.clock.offset(start),
            elapsed_nanos,
            method_id,
            depth,
        });

        Ok(())
    }

    /// Record entry into `method` and return a guard that records the exit
    /// when dropped, on every exit path including unwinding.
    #[must_use = "dropping the guard immediately records the exit"]
    pub fn enter<'a>(&'a self, method: &'a str) -> CallGuard<'a> {
        self.on_enter(method);
        CallGuard {
            session: self,
            method,
        }
    }

    fn emit(&self, event: &CallEvent) {
        if self.write_failed.load(Ordering::Relaxed) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut slot = self.lock_writer();
        let Some(writer) = slot.as_mut() else {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
            return;
        };

        if let Err(e) = writer.write_event(event) {
            if !self.write_failed.swap(true, Ordering::Relaxed) {
                error!(
                    "Failed to write trace event to {}: {}; further events are dropped",
                    self.path.display(),
                    e
                );
            }
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, Option<Box<dyn TraceWriter>>> {
        // A panic while holding the lock leaves the writer usable
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Flush buffered events, write the method table and header, close the
    /// artifact.
    ///
    /// **Public** - explicit shutdown API; `Drop` calls it too
    ///
    /// # Returns
    /// `Some(path)` the first time, `None` on every later call
    ///
    /// # Errors
    /// * `WriterError` - finalization section could not be written
    pub fn shutdown(&self) -> Result<Option<PathBuf>, WriterError> {
        if self.finalized.swap(true, Ordering::AcqRel) {
            debug!("Session {} already finalized", self.id);
            return Ok(None);
        }
        call_stack::retire_session(self.id);

        let Some(mut writer) = self.lock_writer().take() else {
            return Ok(None);
        };

        if let Err(e) = writer.flush() {
            warn!("Failed to flush buffered trace events: {}", e);
        }

        let summary = self.summary();
        debug!(
            "Finalizing trace: {} methods, {} threads, duration {} ns",
            summary.methods.len(),
            summary.thread_ids.len(),
            summary.duration_nanos
        );
        writer.finalize(&summary)?;

        let dropped = self.dropped_events();
        if dropped > 0 {
            warn!("{} trace events were dropped", dropped);
        }
        info!("Performance data written to: {}", self.path.display());

        Ok(Some(self.path.clone()))
    }

    /// Snapshot of what finalization writes
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            methods: self.interner.records(),
            thread_ids: self.clock.thread_ids(),
            duration_nanos: self.clock.duration(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }

    /// Clock reading of the first enter, if any
    pub fn abs_start_time(&self) -> Option<u64> {
        self.clock.abs_start()
    }

    pub fn duration_nanos(&self) -> u64 {
        self.clock.duration()
    }

    pub fn observed_thread_ids(&self) -> Vec<u64> {
        self.clock.thread_ids()
    }

    pub fn method_id(&self, method: &str) -> Option<u32> {
        self.interner.get(method)
    }

    pub fn method_count(&self) -> usize {
        self.interner.len()
    }

    /// Events lost to write failures or late exits
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Failed to finalize trace {}: {}", self.path.display(), e);
        }
    }
}

impl std::fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSession")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("finalized", &self.is_finalized())
            .field("methods", &self.interner.len())
            .finish()
    }
}

/// Pending call; records the exit on drop
pub struct CallGuard<'a> {
    session: &'a RecordingSession,
    method: &'a str,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        match self.session.on_exit(self.method) {
            Ok(()) => {}
            Err(RecordError::SessionFinalized) => {
                debug!("Exit from '{}' after finalization ignored", self.method)
            }
            Err(e) => warn!("{}", e),
        }
    }
}
