// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, TimeDelta, Utc};
use filewise_core::{EventKind, InteractionEvent};

/// Fluent builder for [`InteractionEvent`]s.
///
/// Defaults to subject `u1`, kind `Open`, timestamp now.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event: InteractionEvent,
}

impl EventBuilder {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            event: InteractionEvent::new("u1", path, EventKind::Open),
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.event.subject = subject.into();
        self
    }

    pub fn kind(mut self, kind: EventKind) -> Self {
        self.event.kind = kind;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.event.timestamp = timestamp;
        self
    }

    pub fn minutes_ago(self, minutes: i64) -> Self {
        let at = Utc::now() - TimeDelta::minutes(minutes);
        self.at(at)
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.event.context.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> InteractionEvent {
        self.event
    }

    /// One `Open` per path, a minute apart, ending now.
    pub fn sequence(subject: &str, paths: &[&str]) -> Vec<InteractionEvent> {
        let count = paths.len() as i64;
        paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                EventBuilder::new(*path)
                    .subject(subject)
                    .minutes_ago(count - 1 - i as i64)
                    .build()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_oldest_first() {
        let events = EventBuilder::sequence("u2", &["a", "b", "c"]);
        assert_eq!(events.len(), 3);
        assert!(events.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(events.iter().all(|e| e.subject == "u2"));
    }

    #[test]
    fn builder_sets_fields() {
        let event = EventBuilder::new("src/lib.rs")
            .kind(EventKind::Edit)
            .context("project", "filewise")
            .build();
        assert_eq!(event.kind, EventKind::Edit);
        assert_eq!(event.context["project"], "filewise");
    }
}
