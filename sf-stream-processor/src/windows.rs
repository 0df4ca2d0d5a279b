//! Named sliding time windows. Per spec.md §3/§5: a window's membership
//! is every event with `timestamp > now - size`; eviction happens on
//! access, and buffer mutation only ever happens from the processor's own
//! loop. Readers (rule predicates) see a consistent snapshot because the
//! count is computed, and the lock released, before the predicate ever
//! runs — the "copy on read or lock per window" discipline spec.md §5
//! calls out, applied the way the teacher's repos take a lock, mutate,
//! compute, and unlock around a single row.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sf_domain::{Event, WindowSpec};

struct Window {
    size: chrono::Duration,
    buffer: Mutex<VecDeque<(DateTime<Utc>, ())>>,
}

impl Window {
    fn new(size_secs: i64) -> Self {
        Self {
            size: chrono::Duration::seconds(size_secs),
            buffer: Mutex::new(VecDeque::new()),
        }
    }

    fn push(&self, timestamp: DateTime<Utc>) {
        self.buffer.lock().push_back((timestamp, ()));
    }

    /// Evict entries at or older than `now - size`, then return the
    /// remaining count. A window observed at `now` never includes an event
    /// whose `timestamp <= now - size` once this returns — the boundary is
    /// exclusive, matching §8's "observing `W` at `τ >= t + W.size` does
    /// not include the event" with `τ = now` and `t = ts`.
    fn count(&self, now: DateTime<Utc>) -> usize {
        let mut buf = self.buffer.lock();
        let cutoff = now - self.size;
        while matches!(buf.front(), Some((ts, _)) if *ts <= cutoff) {
            buf.pop_front();
        }
        buf.len()
    }
}

pub struct WindowRegistry {
    windows: HashMap<String, Window>,
}

impl WindowRegistry {
    /// A window whose `size < slide` is rejected at registration
    /// (spec.md §8 boundary behavior) — callers should validate each
    /// `WindowSpec` with [`WindowSpec::validate`] before passing it here.
    pub fn new(specs: Vec<WindowSpec>) -> Self {
        let windows = specs
            .into_iter()
            .map(|spec| (spec.name.clone(), Window::new(spec.size_secs)))
            .collect();
        Self { windows }
    }

    /// Append `event` to every registered window — step 1 of the
    /// per-event pipeline, strictly preceding rule evaluation.
    pub fn append(&self, event: &Event) {
        for window in self.windows.values() {
            window.push(event.timestamp);
        }
    }

    pub fn count(&self, name: &str, now: DateTime<Utc>) -> Option<usize> {
        self.windows.get(name).map(|w| w.count(now))
    }

    /// A snapshot of every window's current count, for building a rule
    /// context and for the `window_<name>_count` gauge emission.
    pub fn snapshot_counts(&self, now: DateTime<Utc>) -> HashMap<String, usize> {
        self.windows
            .iter()
            .map(|(name, w)| (name.clone(), w.count(now)))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.windows.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sf_domain::{EventCategory, EventSeverity, EventType};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn event_at(ts: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            event_type: EventType::new(EventCategory::Error, None),
            source: "svc".into(),
            timestamp: ts,
            severity: EventSeverity::High,
            data: serde_json::json!({}),
            correlation_id: None,
            session_id: None,
            user_id: None,
            tags: HashSet::new(),
        }
    }

    #[test]
    fn evicts_events_older_than_window_size() {
        let registry = WindowRegistry::new(vec![WindowSpec::new("1min", 60)]);
        let now = Utc::now();
        registry.append(&event_at(now - Duration::seconds(120)));
        registry.append(&event_at(now - Duration::seconds(10)));
        assert_eq!(registry.count("1min", now), Some(1));
    }

    #[test]
    fn unknown_window_returns_none() {
        let registry = WindowRegistry::new(vec![WindowSpec::new("1min", 60)]);
        assert_eq!(registry.count("5min", Utc::now()), None);
    }

    #[test]
    fn observation_at_exact_boundary_excludes_event() {
        let registry = WindowRegistry::new(vec![WindowSpec::new("1min", 60)]);
        let now = Utc::now();
        let t = now - Duration::seconds(60);
        registry.append(&event_at(t));
        assert_eq!(registry.count("1min", now), Some(0));
    }
}
