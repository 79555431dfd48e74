// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A chronological, capacity-bounded event log.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use filewise_core::InteractionEvent;

/// Events kept oldest-first. Exceeding the capacity drops the oldest tenth
/// in one batch.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<InteractionEvent>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends an event, returning how many old events were evicted.
    ///
    /// Late events are inserted at their chronological position so the
    /// windowed scan in [`EventLog::recent`] can stop early.
    pub fn push(&mut self, event: InteractionEvent) -> usize {
        let at = self
            .events
            .partition_point(|e| e.timestamp <= event.timestamp);
        if at == self.events.len() {
            self.events.push_back(event);
        } else {
            self.events.insert(at, event);
        }
        self.truncate()
    }

    fn truncate(&mut self) -> usize {
        let len = self.events.len();
        if len <= self.capacity {
            return 0;
        }
        let batch = (self.capacity / 10).max(len - self.capacity).min(len);
        self.events.drain(..batch);
        batch
    }

    /// Events in `[now - window, now]`, newest first.
    pub fn recent(
        &self,
        window: Duration,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &InteractionEvent> {
        let cutoff = TimeDelta::from_std(window)
            .ok()
            .and_then(|w| now.checked_sub_signed(w))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.events
            .iter()
            .rev()
            .skip_while(move |e| e.timestamp > now)
            .take_while(move |e| e.timestamp >= cutoff)
    }

    /// Oldest-first iterator over every retained event.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &InteractionEvent> {
        self.events.iter()
    }

    pub fn latest(&self) -> Option<&InteractionEvent> {
        self.events.back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<InteractionEvent> {
        self.events.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filewise_core::EventKind;

    fn event_at(path: &str, at: DateTime<Utc>) -> InteractionEvent {
        InteractionEvent::new("u1", path, EventKind::Open).at(at)
    }

    #[test]
    fn evicts_oldest_tenth_in_one_batch() {
        let mut log = EventLog::new(20);
        let base = Utc::now();
        for i in 0..20 {
            assert_eq!(log.push(event_at(&format!("f{i}"), base + TimeDelta::seconds(i))), 0);
        }
        let evicted = log.push(event_at("f20", base + TimeDelta::seconds(20)));
        assert_eq!(evicted, 2);
        assert_eq!(log.len(), 19);
        assert_eq!(log.iter().next().map(|e| e.path.as_str()), Some("f2"));
    }

    #[test]
    fn small_capacity_still_bounded() {
        let mut log = EventLog::new(3);
        let base = Utc::now();
        for i in 0..10 {
            log.push(event_at("a", base + TimeDelta::seconds(i)));
            assert!(log.len() <= 3);
        }
    }

    #[test]
    fn late_events_are_placed_chronologically() {
        let mut log = EventLog::new(10);
        let base = Utc::now();
        log.push(event_at("a", base));
        log.push(event_at("c", base + TimeDelta::seconds(20)));
        log.push(event_at("b", base + TimeDelta::seconds(10)));
        let order: Vec<_> = log.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn recent_stops_at_window_edge() {
        let mut log = EventLog::new(10);
        let now = Utc::now();
        log.push(event_at("old", now - TimeDelta::hours(3)));
        log.push(event_at("mid", now - TimeDelta::minutes(30)));
        log.push(event_at("new", now - TimeDelta::minutes(1)));
        let paths: Vec<_> = log
            .recent(Duration::from_secs(3600), now)
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(paths, ["new", "mid"]);
    }

    #[test]
    fn recent_skips_future_events() {
        let mut log = EventLog::new(10);
        let now = Utc::now();
        log.push(event_at("past", now - TimeDelta::seconds(5)));
        log.push(event_at("future", now + TimeDelta::hours(1)));
        let paths: Vec<_> = log
            .recent(Duration::from_secs(60), now)
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(paths, ["past"]);
    }
}
