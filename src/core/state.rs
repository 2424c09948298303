//! # Key state table + time-ordered pending index.
//!
//! [`ScheduleTable`] is the engine's authoritative view of outstanding
//! timers. It pairs two structures that must stay in lockstep:
//!
//! ```text
//! records:  HashMap<key, PendingEvent>          (key → its one pending record)
//! index:    BTreeMap<deadline_ms, Vec<key>>     (deadline → keys due then)
//! ```
//!
//! ## Rules
//! - At most one record per key; it is always indexed under its current
//!   deadline.
//! - A key appears in at most one deadline bucket; moving a deadline
//!   (the `delay` policy re-arming) removes it from the old bucket
//!   eagerly.
//! - `pop_due` drains whole buckets in deadline-ascending order, so
//!   firing order across keys is non-decreasing by deadline; order
//!   within a tied bucket is unspecified.
//!
//! Only the engine's control loop touches this structure, so it needs
//! no internal locking.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::policies::PendingEvent;

/// Ordered registry of pending records.
pub(crate) struct ScheduleTable {
    records: HashMap<Arc<str>, PendingEvent>,
    index: BTreeMap<u64, Vec<Arc<str>>>,
}

impl ScheduleTable {
    pub(crate) fn new() -> Self {
        Self {
            records: HashMap::new(),
            index: BTreeMap::new(),
        }
    }

    /// Removes and returns the key's record, unindexing it.
    pub(crate) fn take(&mut self, key: &Arc<str>) -> Option<PendingEvent> {
        let rec = self.records.remove(key)?;
        self.unindex(rec.deadline_ms, key);
        Some(rec)
    }

    /// Inserts (or replaces) the key's record, reindexing if the
    /// deadline moved.
    pub(crate) fn insert(&mut self, key: Arc<str>, record: PendingEvent) {
        let deadline = record.deadline_ms;
        let old = self.records.insert(key.clone(), record);
        match old {
            Some(prev) if prev.deadline_ms == deadline => {
                // Same bucket; the key is already indexed there.
            }
            Some(prev) => {
                self.unindex(prev.deadline_ms, &key);
                self.index.entry(deadline).or_default().push(key);
            }
            None => {
                self.index.entry(deadline).or_default().push(key);
            }
        }
    }

    /// Pops every record with `deadline ≤ now_ms`, in deadline-ascending
    /// order. Each key is returned exactly once per bucket.
    pub(crate) fn pop_due(&mut self, now_ms: u64) -> Vec<(Arc<str>, PendingEvent)> {
        let mut due = Vec::new();
        while let Some((&deadline, _)) = self.index.first_key_value() {
            if deadline > now_ms {
                break;
            }
            let keys = self.index.remove(&deadline).unwrap_or_default();
            for key in keys {
                if let Some(rec) = self.records.remove(&key) {
                    due.push((key, rec));
                }
            }
        }
        due
    }

    /// Sorted list of keys with an outstanding timer.
    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.records.keys().map(|k| k.to_string()).collect();
        keys.sort_unstable();
        keys
    }

    fn unindex(&mut self, deadline: u64, key: &Arc<str>) {
        if let Some(bucket) = self.index.get_mut(&deadline) {
            bucket.retain(|k| k != key);
            if bucket.is_empty() {
                self.index.remove(&deadline);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionFn, ActionRef};
    use std::time::Duration;

    fn noop() -> ActionRef {
        ActionFn::arc(|| async { Ok(()) })
    }

    fn rec(deadline_ms: u64) -> PendingEvent {
        PendingEvent {
            deadline_ms,
            action: Some(noop()),
            repeat: Some(Duration::from_millis(100)),
        }
    }

    fn key(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[test]
    fn test_pop_due_is_deadline_ascending() {
        let mut t = ScheduleTable::new();
        t.insert(key("c"), rec(300));
        t.insert(key("a"), rec(100));
        t.insert(key("b"), rec(200));

        let due = t.pop_due(250);
        let deadlines: Vec<u64> = due.iter().map(|(_, r)| r.deadline_ms).collect();
        assert_eq!(deadlines, vec![100, 200]);
        assert_eq!(t.keys(), vec!["c".to_string()]);
    }

    #[test]
    fn test_pop_due_drains_multiple_overdue_buckets() {
        let mut t = ScheduleTable::new();
        t.insert(key("a"), rec(100));
        t.insert(key("b"), rec(200));
        assert_eq!(t.pop_due(1000).len(), 2);
        assert!(t.keys().is_empty());
    }

    #[test]
    fn test_shared_bucket_fires_each_key_once() {
        let mut t = ScheduleTable::new();
        t.insert(key("a"), rec(100));
        t.insert(key("b"), rec(100));
        let due = t.pop_due(100);
        assert_eq!(due.len(), 2);
        assert!(t.pop_due(100).is_empty());
    }

    #[test]
    fn test_moving_deadline_leaves_one_bucket_entry() {
        let mut t = ScheduleTable::new();
        t.insert(key("k"), rec(100));
        // Re-arm further out, as the delay policy does.
        t.insert(key("k"), rec(500));

        // Nothing due at the old deadline.
        assert!(t.pop_due(100).is_empty());

        let due = t.pop_due(500);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1.deadline_ms, 500);
    }

    #[test]
    fn test_replace_same_deadline_keeps_single_entry() {
        let mut t = ScheduleTable::new();
        t.insert(key("k"), rec(100));
        t.insert(key("k"), rec(100));
        assert_eq!(t.pop_due(100).len(), 1);
    }

    #[test]
    fn test_take_unindexes() {
        let mut t = ScheduleTable::new();
        t.insert(key("k"), rec(100));
        assert!(t.take(&key("k")).is_some());
        assert!(t.take(&key("k")).is_none());
        assert!(t.pop_due(1000).is_empty());
    }
}
