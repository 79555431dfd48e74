// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-subject and global interaction history behind one reader/writer lock.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use filewise_config::model::HistoryConfig;
use filewise_core::{InteractionEvent, Result, GLOBAL_SUBJECT};
use tokio::sync::RwLock;
use tracing::debug;

use crate::log::EventLog;

#[derive(Debug)]
struct Logs {
    global: EventLog,
    subjects: HashMap<String, EventLog>,
}

/// Append-only history. Each subject gets its own log and every event also
/// lands in the global log; all logs share the configured capacity.
#[derive(Debug)]
pub struct HistoryStore {
    logs: RwLock<Logs>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(config: &HistoryConfig) -> Self {
        Self::with_capacity(config.capacity)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            logs: RwLock::new(Logs {
                global: EventLog::new(capacity),
                subjects: HashMap::new(),
            }),
            capacity,
        }
    }

    /// Validates and appends an event. Once this returns, any later read for
    /// the same subject observes it.
    pub async fn append(&self, event: InteractionEvent) -> Result<()> {
        event.validate()?;
        let mut logs = self.logs.write().await;
        let capacity = self.capacity;
        let evicted = logs
            .subjects
            .entry(event.subject.clone())
            .or_insert_with(|| EventLog::new(capacity))
            .push(event.clone());
        let evicted_global = logs.global.push(event);
        if evicted + evicted_global > 0 {
            debug!(evicted, evicted_global, "history truncated");
        }
        Ok(())
    }

    /// Events for `subject` (or [`GLOBAL_SUBJECT`]) within the window,
    /// newest first.
    pub async fn recent(
        &self,
        subject: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Vec<InteractionEvent> {
        let logs = self.logs.read().await;
        let log = if subject == GLOBAL_SUBJECT {
            Some(&logs.global)
        } else {
            logs.subjects.get(subject)
        };
        log.map(|log| log.recent(window, now).cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of one subject's history, oldest first.
    pub async fn subject_events(&self, subject: &str) -> Vec<InteractionEvent> {
        let logs = self.logs.read().await;
        logs.subjects
            .get(subject)
            .map(EventLog::to_vec)
            .unwrap_or_default()
    }

    /// Snapshot of the global history, oldest first.
    pub async fn global_events(&self) -> Vec<InteractionEvent> {
        self.logs.read().await.global.to_vec()
    }

    /// Snapshot of every subject log, used by retraining.
    pub async fn snapshot(&self) -> HashMap<String, Vec<InteractionEvent>> {
        let logs = self.logs.read().await;
        logs.subjects
            .iter()
            .map(|(subject, log)| (subject.clone(), log.to_vec()))
            .collect()
    }

    /// Number of events in the global log.
    pub async fn len(&self) -> usize {
        self.logs.read().await.global.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.logs.read().await.global.is_empty()
    }

    pub async fn subject_len(&self, subject: &str) -> usize {
        let logs = self.logs.read().await;
        logs.subjects.get(subject).map_or(0, EventLog::len)
    }

    pub async fn subject_count(&self) -> usize {
        self.logs.read().await.subjects.len()
    }

    /// Paths the subject has accessed (search and reject events excluded).
    pub async fn touched_paths(&self, subject: &str) -> HashSet<String> {
        let logs = self.logs.read().await;
        logs.subjects
            .get(subject)
            .map(|log| {
                log.iter()
                    .filter(|e| e.kind.is_access())
                    .map(|e| e.path.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every path still present in some subject log.
    pub async fn live_paths(&self) -> HashSet<String> {
        let logs = self.logs.read().await;
        logs.subjects
            .values()
            .flat_map(|log| log.iter().map(|e| e.path.clone()))
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
