// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access-pattern mining.
//!
//! A subject's access sequence is the chronological list of paths it
//! opened, edited, saved, closed, or accepted, with consecutive repeats
//! collapsed. Every contiguous window of each configured length becomes an
//! [`AccessPattern`] keyed by its ordered paths.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use filewise_config::model::LearningConfig;
use filewise_core::InteractionEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::decay::pattern_confidence;

/// A recurring ordered sequence of file accesses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPattern {
    pub sequence: Vec<String>,
    pub frequency: u64,
    pub last_seen: DateTime<Utc>,
    /// Confidence as of the last mining pass.
    pub confidence: f64,
}

impl AccessPattern {
    /// Confidence re-evaluated at `now`; decays while the pattern is unseen.
    pub fn confidence_at(&self, now: DateTime<Utc>) -> f64 {
        pattern_confidence(self.frequency, self.last_seen, now)
    }

    /// Everything but the final path.
    pub fn prefix(&self) -> &[String] {
        &self.sequence[..self.sequence.len().saturating_sub(1)]
    }

    pub fn next_path(&self) -> Option<&str> {
        self.sequence.last().map(String::as_str)
    }
}

/// A pattern whose prefix matches the tail of a subject's recent accesses.
#[derive(Debug, Clone, PartialEq)]
pub struct Continuation {
    pub next: String,
    pub confidence: f64,
    pub pattern: AccessPattern,
}

/// Chronological access sequence with consecutive duplicates collapsed.
pub fn access_sequence<'a>(
    events: impl IntoIterator<Item = &'a InteractionEvent>,
) -> Vec<(&'a str, DateTime<Utc>)> {
    let mut sequence: Vec<(&'a str, DateTime<Utc>)> = Vec::new();
    for event in events.into_iter().filter(|e| e.kind.is_access()) {
        match sequence.last_mut() {
            Some((path, at)) if *path == event.path => *at = event.timestamp,
            _ => sequence.push((event.path.as_str(), event.timestamp)),
        }
    }
    sequence
}

/// Mines every contiguous window of `min_len..=max_len` accesses.
///
/// Patterns are returned in first-discovery order, shorter lengths first.
pub fn mine_patterns<'a>(
    events: impl IntoIterator<Item = &'a InteractionEvent>,
    min_len: usize,
    max_len: usize,
    now: DateTime<Utc>,
) -> Vec<AccessPattern> {
    let sequence = access_sequence(events);
    let mut index: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut patterns: Vec<AccessPattern> = Vec::new();

    for len in min_len.max(2)..=max_len {
        for window in sequence.windows(len) {
            let key: Vec<&str> = window.iter().map(|(path, _)| *path).collect();
            let seen = window[len - 1].1;
            match index.get(&key) {
                Some(&i) => {
                    let pattern = &mut patterns[i];
                    pattern.frequency += 1;
                    pattern.last_seen = pattern.last_seen.max(seen);
                }
                None => {
                    index.insert(key.clone(), patterns.len());
                    patterns.push(AccessPattern {
                        sequence: key.iter().map(|p| p.to_string()).collect(),
                        frequency: 1,
                        last_seen: seen,
                        confidence: 0.0,
                    });
                }
            }
        }
    }

    for pattern in &mut patterns {
        pattern.confidence = pattern.confidence_at(now);
    }
    patterns
}

/// Patterns whose prefix equals the tail of `recent` (oldest first), with
/// confidence evaluated at `now`, strongest first.
pub fn find_continuations(
    patterns: &[AccessPattern],
    recent: &[String],
    now: DateTime<Utc>,
) -> Vec<Continuation> {
    let mut found: Vec<Continuation> = patterns
        .iter()
        .filter(|p| {
            let prefix = p.prefix();
            !prefix.is_empty() && recent.ends_with(prefix)
        })
        .filter_map(|p| {
            Some(Continuation {
                next: p.next_path()?.to_string(),
                confidence: p.confidence_at(now),
                pattern: p.clone(),
            })
        })
        .collect();
    found.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    found
}

/// Per-subject pattern tables, rebuilt from history on each learning pass.
#[derive(Debug)]
pub struct PatternLearner {
    tables: RwLock<HashMap<String, Arc<Vec<AccessPattern>>>>,
    min_len: usize,
    max_len: usize,
}

impl PatternLearner {
    pub fn new(config: &LearningConfig) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            min_len: config.min_sequence_len,
            max_len: config.max_sequence_len,
        }
    }

    /// Replaces the subject's table with one mined from `events`.
    /// Returns the number of distinct patterns.
    pub async fn learn(&self, subject: &str, events: &[InteractionEvent], now: DateTime<Utc>) -> usize {
        let mined = mine_patterns(events, self.min_len, self.max_len, now);
        let count = mined.len();
        self.tables
            .write()
            .await
            .insert(subject.to_string(), Arc::new(mined));
        debug!(subject, patterns = count, "patterns mined");
        count
    }

    /// The subject's patterns as of the last learning pass.
    pub async fn patterns(&self, subject: &str) -> Arc<Vec<AccessPattern>> {
        self.tables
            .read()
            .await
            .get(subject)
            .cloned()
            .unwrap_or_default()
    }

    /// Continuations of `recent` (oldest first) from the subject's table.
    pub async fn continuations(
        &self,
        subject: &str,
        recent: &[String],
        now: DateTime<Utc>,
    ) -> Vec<Continuation> {
        find_continuations(&self.patterns(subject).await, recent, now)
    }

    /// Sequence lengths mined, as `(min, max)`.
    pub fn lengths(&self) -> (usize, usize) {
        (self.min_len, self.max_len)
    }

    pub async fn subject_count(&self) -> usize {
        self.tables.read().await.len()
    }
}
