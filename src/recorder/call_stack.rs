//! Per-thread stacks of pending call start times.
//!
//! Stacks live in thread-local storage, so the hot path never touches a
//! shared map. A thread may record into several sessions over its life
//! (tests do this all the time), so each thread keeps one stack per
//! session id.
//!
//! Sessions register themselves while live. A thread only learns that a
//! session ended the next time it creates a stack, at which point stacks
//! of retired sessions are pruned.

use dashmap::DashSet;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

static LIVE_SESSIONS: OnceLock<DashSet<u64>> = OnceLock::new();

fn live_sessions() -> &'static DashSet<u64> {
    LIVE_SESSIONS.get_or_init(DashSet::new)
}

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
    static STACKS: RefCell<HashMap<u64, ThreadCallStack>> = RefCell::new(HashMap::new());
}

/// LIFO of pending start timestamps for one thread
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ThreadCallStack {
    starts: Vec<u64>,
}

impl ThreadCallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, start_nanos: u64) {
        self.starts.push(start_nanos);
    }

    pub fn pop(&mut self) -> Option<u64> {
        self.starts.pop()
    }

    /// Number of pending calls, including the innermost one
    pub fn depth(&self) -> u32 {
        self.starts.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

/// Small process-unique id of the calling thread, assigned on first use
pub fn current_thread_id() -> u64 {
    // During TLS teardown the id is gone; 0 is never handed out
    THREAD_ID.try_with(|id| *id).unwrap_or(0)
}

/// Mark `session_id` as live
pub(crate) fn register_session(session_id: u64) {
    live_sessions().insert(session_id);
}

/// Mark `session_id` as finished and drop the calling thread's stack for it.
///
/// Other threads drop theirs lazily, in `with_stack`.
pub(crate) fn retire_session(session_id: u64) {
    live_sessions().remove(&session_id);
    release(session_id);
}

/// Run `f` on this thread's stack for `session_id`, creating it if absent.
///
/// Creating a stack also prunes this thread's stacks of retired sessions.
/// Returns `None` only when thread-local storage is already torn down.
pub(crate) fn with_stack<R>(session_id: u64, f: impl FnOnce(&mut ThreadCallStack) -> R) -> Option<R> {
    STACKS
        .try_with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            if !stacks.contains_key(&session_id) {
                let live = live_sessions();
                stacks.retain(|id, _| live.contains(id));
            }
            f(stacks.entry(session_id).or_default())
        })
        .ok()
}

/// Run `f` on this thread's stack for `session_id` without creating one
pub(crate) fn with_existing_stack<R>(
    session_id: u64,
    f: impl FnOnce(Option<&mut ThreadCallStack>) -> R,
) -> Option<R> {
    STACKS
        .try_with(|stacks| f(stacks.borrow_mut().get_mut(&session_id)))
        .ok()
}

/// Drop this thread's stack for `session_id`
pub(crate) fn release(session_id: u64) {
    let _ = STACKS.try_with(|stacks| stacks.borrow_mut().remove(&session_id));
}

/// Number of session stacks held by the calling thread
#[cfg(test)]
pub(crate) fn stack_count() -> usize {
    STACKS.try_with(|stacks| stacks.borrow().len()).unwrap_or(0)
}
