//! Records produced by the recorder and consumed by trace writers.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// One interned method name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    /// Dense, zero-based id in first-seen order
    pub id: u32,

    /// Method-identifying string as passed by the call site
    pub name: String,
}

/// One completed call, emitted at exit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    pub thread_id: u64,

    /// Nanoseconds between session start and the call's enter
    pub start_offset: i64,

    pub elapsed_nanos: u64,

    pub method_id: u32,

    /// Pending calls on the thread at exit, including this one (root = 1)
    pub depth: u32,
}

/// Pipe-delimited event line, without the trailing newline
impl fmt::Display for CallEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}",
            self.thread_id, self.start_offset, self.elapsed_nanos, self.method_id, self.depth
        )
    }
}

/// Everything written once, at finalization
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSummary {
    /// Method table in id order
    pub methods: Vec<MethodRecord>,

    /// Every thread that completed at least one call, ascending
    pub thread_ids: Vec<u64>,

    /// Largest exit offset seen, in nanoseconds
    pub duration_nanos: u64,
}

/// Method names end up on a single line of the artifact, so line breaks
/// become spaces before a name is interned
pub(crate) fn sanitize_name(name: &str) -> Cow<'_, str> {
    if name.contains(['\n', '\r']) {
        Cow::Owned(name.replace(['\n', '\r'], " "))
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_line_layout() {
        let event = CallEvent {
            thread_id: 7,
            start_offset: 1_500,
            elapsed_nanos: 320,
            method_id: 3,
            depth: 2,
        };
        assert_eq!(event.to_string(), "7|1500|320|3|2");
    }

    #[test]
    fn test_sanitize_name_strips_line_breaks() {
        assert_eq!(sanitize_name("a\nb\r\nc"), "a b  c");
        assert!(matches!(
            sanitize_name("pkg.Type.run(int, String)"),
            Cow::Borrowed("pkg.Type.run(int, String)")
        ));
    }
}
