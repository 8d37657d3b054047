//! Calltrace Recorder
//!
//! Times every call to every instrumented method and writes a durable,
//! self-describing trace for post-hoc performance analysis.
//!
//! ## Getting Started
//!
//! ```no_run
//! use calltrace_recorder::{RecorderConfig, RecordingSession};
//!
//! let config = RecorderConfig::from_env()?;
//! let session = RecordingSession::new(&config)?;
//!
//! {
//!     let _call = session.enter("app::main");
//!     // ... instrumented work ...
//! }
//!
//! session.shutdown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Instrumentation layers that cannot hold a guard call
//! `RecordingSession::on_enter` / `RecordingSession::on_exit` directly,
//! with the same method name and on the same thread.

pub mod commands;
pub mod reader;
pub mod recorder;
pub mod utils;
pub mod writer;

pub use reader::{read_trace, validate_artifact, TraceArtifact, ValidationReport};
pub use recorder::{CallEvent, CallGuard, MethodRecord, RecordingSession, SessionSummary};
pub use utils::config::{RecorderConfig, TraceFormat};
pub use utils::error::{ConfigError, ReadError, RecordError, WriterError};
pub use writer::{ContainerTraceWriter, TextTraceWriter, TraceWriter};
