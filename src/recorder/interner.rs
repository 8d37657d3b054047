//! Method name interning.
//!
//! Maps method-identifying strings to dense `u32` ids in first-seen order.
//! The map is sharded (`DashMap`), and a new id is only drawn while the
//! entry's shard is write-locked, so concurrent first sightings of the same
//! name from many threads still produce exactly one id.
//!
//! Names are keyed by their single-line form, so names differing only in
//! line breaks versus spaces share one id.

use super::event::{sanitize_name, MethodRecord};
use dashmap::DashMap;
use log::debug;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe name -> id table
#[derive(Debug, Default)]
pub struct MethodInterner {
    ids: DashMap<String, u32>,
    next_id: AtomicU32,
}

impl MethodInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, allocating the next one on first sight
    ///
    /// **Public** - called on every enter notification
    pub fn intern(&self, name: &str) -> u32 {
        let name = sanitize_name(name);

        // Fast path: read lock only
        if let Some(id) = self.ids.get(name.as_ref()) {
            return *id;
        }

        *self
            .ids
            .entry(name.to_string())
            .or_insert_with(|| {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                debug!("Interned method #{}: {}", id, name);
                id
            })
            .value()
    }

    /// Id of an already interned name
    pub fn get(&self, name: &str) -> Option<u32> {
        self.ids.get(sanitize_name(name).as_ref()).map(|id| *id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Snapshot of the method table, ordered by id
    pub fn records(&self) -> Vec<MethodRecord> {
        let mut records: Vec<MethodRecord> = self
            .ids
            .iter()
            .map(|entry| MethodRecord {
                id: *entry.value(),
                name: entry.key().clone(),
            })
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_ids_follow_first_seen_order() {
        let interner = MethodInterner::new();
        assert_eq!(interner.intern("main"), 0);
        assert_eq!(interner.intern("parse"), 1);
        assert_eq!(interner.intern("main"), 0);
        assert_eq!(interner.intern("emit"), 2);
        assert_eq!(interner.len(), 3);
    }

    #[test]
    fn test_get_does_not_allocate() {
        let interner = MethodInterner::new();
        assert_eq!(interner.get("missing"), None);
        assert!(interner.is_empty());
        interner.intern("present");
        assert_eq!(interner.get("present"), Some(0));
    }

    #[test]
    fn test_line_breaks_fold_into_one_name() {
        let interner = MethodInterner::new();
        let broken = interner.intern("a\nb");
        let spaced = interner.intern("a b");

        assert_eq!(broken, spaced);
        assert_eq!(interner.get("a\r\nb"), None);
        assert_eq!(interner.get("a\nb"), Some(broken));
        assert_eq!(
            interner.records(),
            vec![MethodRecord {
                id: broken,
                name: "a b".to_string()
            }]
        );
    }

    #[test]
    fn test_records_sorted_by_id() {
        let interner = MethodInterner::new();
        for name in ["c", "a", "b"] {
            interner.intern(name);
        }
        let names: Vec<String> = interner.records().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_concurrent_first_sight_yields_one_id() {
        let interner = Arc::new(MethodInterner::new());
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let interner = Arc::clone(&interner);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let shared = interner.intern("shared");
                    let own = interner.intern(&format!("own-{}", i));
                    (shared, own)
                })
            })
            .collect();

        let results: Vec<(u32, u32)> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let shared_id = results[0].0;
        assert!(results.iter().all(|(shared, _)| *shared == shared_id));

        // 17 distinct names, ids dense in 0..17
        let mut ids: Vec<u32> = interner.records().iter().map(|r| r.id).collect();
        ids.dedup();
        assert_eq!(ids, (0..17).collect::<Vec<u32>>());
    }
}
