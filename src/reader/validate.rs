//! Integrity checks for a loaded trace artifact.

use super::TraceArtifact;
use serde::Serialize;
use std::collections::HashSet;

/// Outcome of validating an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub event_count: usize,
    pub method_count: usize,
    pub thread_count: usize,
    pub duration_nanos: u64,
    pub max_depth: u32,

    /// Human-readable descriptions of every violated property
    pub problems: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check the properties every finalized artifact must satisfy:
/// - method ids are dense, zero-based and unique
/// - every event's method id is in the method table
/// - every event's thread id is in the header
/// - `0 <= start_offset` and `start_offset + elapsed <= duration`
/// - depth is at least 1
pub fn validate_artifact(artifact: &TraceArtifact) -> ValidationReport {
    let mut problems = Vec::new();

    let mut method_ids: Vec<u32> = artifact.methods.iter().map(|m| m.id).collect();
    method_ids.sort_unstable();
    let dense = method_ids
        .iter()
        .enumerate()
        .all(|(index, id)| *id as usize == index);
    if !dense {
        problems.push(format!(
            "method ids are not dense and unique from 0: {:?}",
            method_ids
        ));
    }

    let known_methods: HashSet<u32> = method_ids.into_iter().collect();
    let known_threads: HashSet<u64> = artifact.thread_ids.iter().copied().collect();
    let duration = artifact.duration_nanos as i128;

    for (index, event) in artifact.events.iter().enumerate() {
        let line = index + 1;

        if !known_methods.contains(&event.method_id) {
            problems.push(format!(
                "event {}: method id {} missing from method table",
                line, event.method_id
            ));
        }
        if !known_threads.contains(&event.thread_id) {
            problems.push(format!(
                "event {}: thread id {} missing from header",
                line, event.thread_id
            ));
        }
        if event.start_offset < 0 {
            problems.push(format!(
                "event {}: negative start offset {}",
                line, event.start_offset
            ));
        }
        let end = event.start_offset as i128 + event.elapsed_nanos as i128;
        if end > duration {
            problems.push(format!(
                "event {}: ends at {} past session duration {}",
                line, end, duration
            ));
        }
        if event.depth == 0 {
            problems.push(format!("event {}: depth 0", line));
        }
    }

    ValidationReport {
        event_count: artifact.events.len(),
        method_count: artifact.methods.len(),
        thread_count: artifact.thread_ids.len(),
        duration_nanos: artifact.duration_nanos,
        max_depth: artifact.events.iter().map(|e| e.depth).max().unwrap_or(0),
        problems,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::event::{CallEvent, MethodRecord};
    use crate::utils::config::TraceFormat;

    fn artifact(events: Vec<CallEvent>) -> TraceArtifact {
        TraceArtifact {
            format: TraceFormat::Text,
            events,
            methods: vec![
                MethodRecord { id: 1, name: "b".to_string() },
                MethodRecord { id: 0, name: "a".to_string() },
            ],
            thread_ids: vec![1],
            duration_nanos: 100,
        }
    }

    fn event(thread_id: u64, start_offset: i64, elapsed_nanos: u64, method_id: u32, depth: u32) -> CallEvent {
        CallEvent {
            thread_id,
            start_offset,
            elapsed_nanos,
            method_id,
            depth,
        }
    }

    #[test]
    fn test_valid_artifact() {
        let report = validate_artifact(&artifact(vec![event(1, 10, 20, 1, 2), event(1, 0, 100, 0, 1)]));
        assert!(report.is_valid(), "{:?}", report.problems);
        assert_eq!(report.event_count, 2);
        assert_eq!(report.max_depth, 2);
    }

    #[test]
    fn test_unknown_method_and_thread() {
        let report = validate_artifact(&artifact(vec![event(9, 0, 1, 7, 1)]));
        assert_eq!(report.problems.len(), 2);
    }

    #[test]
    fn test_event_past_duration() {
        let report = validate_artifact(&artifact(vec![event(1, 90, 20, 0, 1)]));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_sparse_method_ids() {
        let mut bad = artifact(Vec::new());
        bad.methods[0].id = 5;
        assert!(!validate_artifact(&bad).is_valid());
    }

    #[test]
    fn test_zero_depth_and_negative_offset() {
        let report = validate_artifact(&artifact(vec![event(1, -1, 0, 0, 0)]));
        assert_eq!(report.problems.len(), 2);
    }
}
