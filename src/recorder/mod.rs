//! Call recording engine.
//!
//! Receives enter/exit notifications from instrumented code on any number
//! of threads, reconstructs per-thread call nesting, and streams completed
//! call events to a trace writer.

pub mod call_stack;
pub mod clock;
pub mod event;
pub mod interner;
pub mod session;

// Re-export main types
pub use call_stack::{current_thread_id, ThreadCallStack};
pub use clock::SessionClock;
pub use event::{CallEvent, MethodRecord, SessionSummary};
pub use interner::MethodInterner;
pub use session::{CallGuard, RecordingSession};
