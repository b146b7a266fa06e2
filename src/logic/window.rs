//! Window Store - Per-Source Sliding Windows
//!
//! Keeps the recent flow history for each source address. Entries expire
//! once their age exceeds the window length; sources that go quiet are
//! evicted wholesale so address churn cannot grow the map without bound.

use std::collections::{HashMap, VecDeque};

use crate::logic::events::FlowEvent;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One buffered observation inside a source's window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowEntry {
    pub timestamp: f64,
    pub destination_port: u16,
    pub length: u64,
    pub is_syn: bool,
}

impl From<&FlowEvent> for WindowEntry {
    fn from(event: &FlowEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            destination_port: event.destination_port,
            length: event.length,
            is_syn: event.is_syn,
        }
    }
}

/// Window history for one source address
struct SourceWindow {
    entries: VecDeque<WindowEntry>,
    last_seen: f64,
}

// ============================================================================
// WINDOW STORE
// ============================================================================

/// Per-source sliding windows, mutated only by the ingestion owner
pub struct WindowStore {
    sources: HashMap<String, SourceWindow>,
    window_seconds: f64,
    max_entries_per_source: usize,
    idle_timeout_seconds: f64,
}

impl WindowStore {
    pub fn new(window_seconds: f64, max_entries_per_source: usize, idle_timeout_seconds: f64) -> Self {
        Self {
            sources: HashMap::new(),
            window_seconds,
            max_entries_per_source,
            idle_timeout_seconds,
        }
    }

    /// Append an entry to a source's window, in arrival order
    pub fn record(&mut self, source: &str, entry: WindowEntry) {
        let window = self
            .sources
            .entry(source.to_string())
            .or_insert_with(|| SourceWindow {
                entries: VecDeque::new(),
                last_seen: entry.timestamp,
            });

        window.entries.push_back(entry);
        window.last_seen = entry.timestamp;

        // Per-source hard cap, oldest entries dropped first
        while window.entries.len() > self.max_entries_per_source {
            window.entries.pop_front();
        }
    }

    /// Prune expired entries for a source and return the live view.
    /// Eviction rule: `now - ts > window` (an entry exactly window-old survives).
    pub fn view(&mut self, source: &str, now: f64) -> &VecDeque<WindowEntry> {
        let window = self
            .sources
            .entry(source.to_string())
            .or_insert_with(|| SourceWindow {
                entries: VecDeque::new(),
                last_seen: now,
            });

        while let Some(front) = window.entries.front() {
            if now - front.timestamp > self.window_seconds {
                window.entries.pop_front();
            } else {
                break;
            }
        }

        &window.entries
    }

    /// Drop sources that have been idle longer than the timeout.
    /// Returns the number of evicted sources.
    pub fn evict_idle(&mut self, now: f64) -> usize {
        let before = self.sources.len();
        let cutoff = self.idle_timeout_seconds;
        self.sources.retain(|_, w| now - w.last_seen <= cutoff);
        before - self.sources.len()
    }

    /// Number of source addresses currently tracked
    pub fn tracked_sources(&self) -> usize {
        self.sources.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ts: f64, port: u16) -> WindowEntry {
        WindowEntry {
            timestamp: ts,
            destination_port: port,
            length: 100,
            is_syn: false,
        }
    }

    #[test]
    fn test_record_and_view() {
        let mut store = WindowStore::new(10.0, 100, 300.0);
        store.record("10.0.0.1", entry(1.0, 80));
        store.record("10.0.0.1", entry(2.0, 443));

        let view = store.view("10.0.0.1", 3.0);
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_stale_entries_are_pruned() {
        let mut store = WindowStore::new(10.0, 100, 300.0);
        store.record("10.0.0.1", entry(1.0, 80));
        store.record("10.0.0.1", entry(5.0, 443));
        store.record("10.0.0.1", entry(14.0, 22));

        // At t=14: the t=1 entry is 13s old (expired), t=5 is 9s old (live)
        let view = store.view("10.0.0.1", 14.0);
        assert_eq!(view.len(), 2);
        assert_eq!(view.front().unwrap().destination_port, 443);
    }

    #[test]
    fn test_just_over_window_is_excluded() {
        let mut store = WindowStore::new(10.0, 100, 300.0);
        store.record("10.0.0.1", entry(0.0, 80));

        let view = store.view("10.0.0.1", 10.5);
        assert!(view.is_empty());
    }

    #[test]
    fn test_sources_are_independent() {
        let mut store = WindowStore::new(10.0, 100, 300.0);
        store.record("10.0.0.1", entry(1.0, 80));
        store.record("10.0.0.2", entry(1.0, 443));
        store.record("10.0.0.2", entry(2.0, 8080));

        assert_eq!(store.view("10.0.0.1", 3.0).len(), 1);
        assert_eq!(store.view("10.0.0.2", 3.0).len(), 2);
        assert_eq!(store.tracked_sources(), 2);
    }

    #[test]
    fn test_per_source_cap() {
        let mut store = WindowStore::new(10.0, 5, 300.0);
        for i in 0..20 {
            store.record("10.0.0.1", entry(1.0 + i as f64 * 0.01, 80));
        }

        let view = store.view("10.0.0.1", 1.5);
        assert_eq!(view.len(), 5);
        // Oldest were dropped
        assert!(view.front().unwrap().timestamp > 1.1);
    }

    #[test]
    fn test_idle_source_eviction() {
        let mut store = WindowStore::new(10.0, 100, 60.0);
        store.record("10.0.0.1", entry(0.0, 80));
        store.record("10.0.0.2", entry(50.0, 443));

        let evicted = store.evict_idle(100.0);
        assert_eq!(evicted, 1);
        assert_eq!(store.tracked_sources(), 1);

        // The surviving source is the recently active one
        assert_eq!(store.view("10.0.0.2", 55.0).len(), 1);
    }
}
