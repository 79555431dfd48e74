// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replays history to measure how often a model would have been right.
//!
//! Each trial hides one access, asks the model to rank paths from
//! everything before it, and counts a hit when the hidden path is in the
//! top [`TOP_K`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use filewise_core::InteractionEvent;

use crate::model::ModelStats;

/// Most recent trials replayed per training pass.
pub const MAX_TRIALS: usize = 50;
/// Trials needed before an accuracy is reported.
pub const MIN_TRIALS: usize = 5;
/// Ranked paths that count as a hit.
pub const TOP_K: usize = 3;

/// Which accesses become trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Any access to a path other than the subject's previous one.
    NextAccess,
    /// A subject's first access to a path, once it has some history.
    FirstAccess,
}

/// The state of the world just before a hidden access.
#[derive(Debug, Clone, Copy)]
pub struct Trial<'a> {
    pub subject: &'a str,
    /// Global history before the hidden access, oldest first.
    pub prefix: &'a [InteractionEvent],
    pub at: DateTime<Utc>,
}

impl<'a> Trial<'a> {
    /// The subject's own events within the prefix, oldest first.
    pub fn subject_events(&self) -> Vec<&'a InteractionEvent> {
        self.prefix
            .iter()
            .filter(|e| e.subject == self.subject)
            .collect()
    }
}

/// Replays up to [`MAX_TRIALS`] of the latest trials in `history`.
pub fn backtest<F>(
    history: &[InteractionEvent],
    target: Target,
    now: DateTime<Utc>,
    mut rank: F,
) -> ModelStats
where
    F: FnMut(&Trial<'_>) -> Vec<String>,
{
    let mut last: HashMap<&str, &str> = HashMap::new();
    let mut touched: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut trials = Vec::new();

    for (i, event) in history.iter().enumerate() {
        if !event.kind.is_access() {
            continue;
        }
        let subject = event.subject.as_str();
        let path = event.path.as_str();
        let is_trial = match target {
            Target::NextAccess => last.get(subject).is_some_and(|prev| *prev != path),
            Target::FirstAccess => touched
                .get(subject)
                .is_some_and(|seen| !seen.contains(path)),
        };
        if is_trial {
            trials.push(i);
        }
        last.insert(subject, path);
        touched.entry(subject).or_default().insert(path);
    }

    let replay = &trials[trials.len().saturating_sub(MAX_TRIALS)..];
    let hits = replay
        .iter()
        .filter(|&&i| {
            let hidden = &history[i];
            let trial = Trial {
                subject: &hidden.subject,
                prefix: &history[..i],
                at: hidden.timestamp,
            };
            rank(&trial)
                .iter()
                .take(TOP_K)
                .any(|path| *path == hidden.path)
        })
        .count();

    let count = replay.len();
    ModelStats {
        accuracy: (count >= MIN_TRIALS).then(|| hits as f64 / count as f64),
        trials: count,
        trained_at: Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use filewise_core::EventKind;

    fn history(paths: &[&str]) -> Vec<InteractionEvent> {
        let start = Utc::now() - TimeDelta::hours(1);
        paths
            .iter()
            .enumerate()
            .map(|(i, p)| {
                InteractionEvent::new("u1", *p, EventKind::Open)
                    .at(start + TimeDelta::seconds(i as i64))
            })
            .collect()
    }

    #[test]
    fn perfect_oracle_scores_one() {
        let events = history(&["a", "b", "a", "b", "a", "b", "a", "b"]);
        let stats = backtest(&events, Target::NextAccess, Utc::now(), |trial| {
            let prev = trial.subject_events().last().map(|e| e.path.clone());
            vec![if prev.as_deref() == Some("a") { "b" } else { "a" }.to_string()]
        });
        assert_eq!(stats.trials, 7);
        assert_eq!(stats.accuracy, Some(1.0));
    }

    #[test]
    fn too_few_trials_report_nothing() {
        let events = history(&["a", "b", "c"]);
        let stats = backtest(&events, Target::NextAccess, Utc::now(), |_| Vec::new());
        assert_eq!(stats.trials, 2);
        assert_eq!(stats.accuracy, None);
    }

    #[test]
    fn first_access_trials_skip_revisits() {
        let events = history(&["a", "b", "a", "c", "b", "d", "e", "f", "g"]);
        let stats = backtest(&events, Target::FirstAccess, Utc::now(), |_| Vec::new());
        // b, c, d, e, f, g are first visits after the opening access.
        assert_eq!(stats.trials, 6);
        assert_eq!(stats.accuracy, Some(0.0));
    }

    #[test]
    fn prefix_never_contains_the_hidden_access() {
        let events = history(&["a", "b", "c", "d", "e", "f"]);
        backtest(&events, Target::NextAccess, Utc::now(), |trial| {
            assert!(trial.prefix.iter().all(|e| e.timestamp < trial.at));
            Vec::new()
        });
    }
}
