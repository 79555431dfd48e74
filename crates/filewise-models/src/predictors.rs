// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in next-access predictors.
//!
//! Each model pairs a pure ranking function over a subject's events with
//! an atomically published [`ModelStats`]. Training replays history through
//! the same ranking function to measure accuracy.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Timelike, Utc};
use filewise_config::model::{ContextConfig, ModelsConfig};
use filewise_context::{compute_context, ContextFeatures, WorkMode};
use filewise_core::{Candidate, EventKind, FilewiseError, InteractionEvent};
use filewise_history::{access_sequence, find_continuations, mine_patterns, AccessPattern, PatternLearner};
use tracing::debug;

use crate::backtest::{backtest, Target, TOP_K};
use crate::model::{ModelStats, ScoringContext, ScoringModel};

fn paths(candidates: Vec<Candidate>) -> Vec<String> {
    candidates.into_iter().map(|c| c.path).collect()
}

fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(window)
        .ok()
        .and_then(|w| now.checked_sub_signed(w))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Sorts by confidence, then most recent access, then path.
fn rank(mut scored: Vec<(Candidate, DateTime<Utc>)>, limit: usize) -> Vec<Candidate> {
    scored.sort_by(|(a, a_at), (b, b_at)| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b_at.cmp(a_at))
            .then_with(|| a.path.cmp(&b.path))
    });
    scored.into_iter().take(limit).map(|(c, _)| c).collect()
}

pub(crate) fn publish(stats: &ArcSwap<ModelStats>, name: &str, fresh: ModelStats) {
    debug!(model = name, accuracy = ?fresh.accuracy, trials = fresh.trials, "model trained");
    stats.store(Arc::new(fresh));
}

// --- frequency ---------------------------------------------------------

/// Paths the subject accesses most, relative to the most-used one.
pub fn frequency_rank(events: &[&InteractionEvent], limit: usize) -> Vec<Candidate> {
    let mut counts: HashMap<&str, (u64, DateTime<Utc>)> = HashMap::new();
    for event in events.iter().filter(|e| e.kind.is_access()) {
        let entry = counts
            .entry(event.path.as_str())
            .or_insert((0, event.timestamp));
        entry.0 += 1;
        entry.1 = entry.1.max(event.timestamp);
    }
    let max = counts.values().map(|(n, _)| *n).max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }
    let scored = counts
        .into_iter()
        .map(|(path, (n, last))| {
            let candidate = Candidate::new(
                path,
                n as f64 / max as f64,
                FrequencyModel::NAME,
                format!("accessed {n} times"),
            );
            (candidate, last)
        })
        .collect();
    rank(scored, limit)
}

pub struct FrequencyModel {
    stats: ArcSwap<ModelStats>,
}

impl FrequencyModel {
    pub const NAME: &'static str = "frequency";

    pub fn new() -> Self {
        Self {
            stats: ArcSwap::from_pointee(ModelStats::default()),
        }
    }
}

impl Default for FrequencyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoringModel for FrequencyModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, ctx: &ScoringContext) -> Result<Vec<Candidate>, FilewiseError> {
        let events: Vec<&InteractionEvent> = ctx.history.iter().collect();
        Ok(frequency_rank(&events, ctx.limit))
    }

    async fn train(&self, history: &[InteractionEvent]) -> Result<(), FilewiseError> {
        let stats = backtest(history, Target::NextAccess, Utc::now(), |trial| {
            paths(frequency_rank(&trial.subject_events(), TOP_K))
        });
        publish(&self.stats, Self::NAME, stats);
        Ok(())
    }

    fn accuracy(&self) -> Option<f64> {
        self.stats.load().accuracy
    }
}

// --- pattern -----------------------------------------------------------

/// Continuations of the subject's latest accesses, one per next path.
pub fn pattern_rank(
    patterns: &[AccessPattern],
    events: &[&InteractionEvent],
    tail_len: usize,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<Candidate> {
    let sequence = access_sequence(events.iter().copied());
    let tail: Vec<String> = sequence
        .iter()
        .skip(sequence.len().saturating_sub(tail_len))
        .map(|(path, _)| path.to_string())
        .collect();
    if tail.is_empty() {
        return Vec::new();
    }

    let mut seen = std::collections::HashSet::new();
    find_continuations(patterns, &tail, now)
        .into_iter()
        .filter(|c| seen.insert(c.next.clone()))
        .take(limit)
        .map(|c| {
            Candidate::new(
                c.next,
                c.confidence,
                PatternModel::NAME,
                format!(
                    "usually follows {} (seen {} times)",
                    c.pattern.prefix().join(" -> "),
                    c.pattern.frequency
                ),
            )
        })
        .collect()
}

pub struct PatternModel {
    learner: Arc<PatternLearner>,
    stats: ArcSwap<ModelStats>,
}

impl PatternModel {
    pub const NAME: &'static str = "pattern";

    pub fn new(learner: Arc<PatternLearner>) -> Self {
        Self {
            learner,
            stats: ArcSwap::from_pointee(ModelStats::default()),
        }
    }

    fn tail_len(&self) -> usize {
        self.learner.lengths().1.saturating_sub(1).max(1)
    }
}

#[async_trait]
impl ScoringModel for PatternModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, ctx: &ScoringContext) -> Result<Vec<Candidate>, FilewiseError> {
        let patterns = self.learner.patterns(&ctx.subject).await;
        let events: Vec<&InteractionEvent> = ctx.history.iter().collect();
        Ok(pattern_rank(&patterns, &events, self.tail_len(), ctx.now, ctx.limit))
    }

    async fn train(&self, history: &[InteractionEvent]) -> Result<(), FilewiseError> {
        let (min_len, max_len) = self.learner.lengths();
        let tail_len = self.tail_len();
        let stats = backtest(history, Target::NextAccess, Utc::now(), |trial| {
            let events = trial.subject_events();
            let patterns = mine_patterns(events.iter().copied(), min_len, max_len, trial.at);
            paths(pattern_rank(&patterns, &events, tail_len, trial.at, TOP_K))
        });
        publish(&self.stats, Self::NAME, stats);
        Ok(())
    }

    fn accuracy(&self) -> Option<f64> {
        self.stats.load().accuracy
    }
}

// --- temporal ----------------------------------------------------------

/// Share of a temporal score that comes from recency; the rest is
/// hour-of-day affinity.
const RECENCY_SHARE: f64 = 0.7;

/// Files used within `window`, favouring the freshest and those usually
/// opened at this hour.
pub fn temporal_rank(
    events: &[&InteractionEvent],
    now: DateTime<Utc>,
    window: Duration,
    limit: usize,
) -> Vec<Candidate> {
    let start = window_start(now, window);
    let window_secs = window.as_secs_f64().max(1.0);
    let hour = now.hour();

    // path -> (latest access in window, accesses at this hour, all accesses)
    let mut stats: HashMap<&str, (Option<DateTime<Utc>>, u64, u64)> = HashMap::new();
    for event in events
        .iter()
        .filter(|e| e.kind.is_access() && e.timestamp <= now)
    {
        let entry = stats.entry(event.path.as_str()).or_insert((None, 0, 0));
        if event.timestamp >= start {
            entry.0 = entry.0.max(Some(event.timestamp));
        }
        if event.timestamp.hour() == hour {
            entry.1 += 1;
        }
        entry.2 += 1;
    }

    let scored = stats
        .into_iter()
        .filter_map(|(path, (latest, at_hour, total))| {
            let latest = latest?;
            let age = (now - latest).num_milliseconds() as f64 / 1000.0;
            let recency = (1.0 - age / window_secs).clamp(0.0, 1.0);
            let affinity = at_hour as f64 / total.max(1) as f64;
            let score = RECENCY_SHARE * recency + (1.0 - RECENCY_SHARE) * affinity;
            let minutes = (age / 60.0).round() as i64;
            let candidate = Candidate::new(
                path,
                score,
                TemporalModel::NAME,
                format!("used {minutes} min ago"),
            );
            Some((candidate, latest))
        })
        .collect();
    rank(scored, limit)
}

pub struct TemporalModel {
    window: Duration,
    stats: ArcSwap<ModelStats>,
}

impl TemporalModel {
    pub const NAME: &'static str = "temporal";

    pub fn new(config: &ModelsConfig) -> Self {
        Self {
            window: config.temporal_window(),
            stats: ArcSwap::from_pointee(ModelStats::default()),
        }
    }
}

#[async_trait]
impl ScoringModel for TemporalModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, ctx: &ScoringContext) -> Result<Vec<Candidate>, FilewiseError> {
        let events: Vec<&InteractionEvent> = ctx.history.iter().collect();
        Ok(temporal_rank(&events, ctx.now, self.window, ctx.limit))
    }

    async fn train(&self, history: &[InteractionEvent]) -> Result<(), FilewiseError> {
        let window = self.window;
        let stats = backtest(history, Target::NextAccess, Utc::now(), |trial| {
            paths(temporal_rank(&trial.subject_events(), trial.at, window, TOP_K))
        });
        publish(&self.stats, Self::NAME, stats);
        Ok(())
    }

    fn accuracy(&self) -> Option<f64> {
        self.stats.load().accuracy
    }
}

// --- context-aware -----------------------------------------------------

#[derive(Default)]
struct PathActivity {
    accesses: u64,
    edits: u64,
    in_project: bool,
    latest: Option<DateTime<Utc>>,
}

/// Files from the recent window, scored for the current work mode.
///
/// Focused subjects get the files they are already on; exploratory ones
/// get project files they have not touched lately; collaborative ones get
/// the files being edited.
pub fn context_rank(
    events: &[&InteractionEvent],
    features: &ContextFeatures,
    now: DateTime<Utc>,
    window: Duration,
    limit: usize,
) -> Vec<Candidate> {
    let start = window_start(now, window);
    let project = features.active_project.as_deref();

    let mut activity: HashMap<&str, PathActivity> = HashMap::new();
    for event in events.iter().filter(|e| {
        e.kind.is_access() && e.timestamp >= start && e.timestamp <= now
    }) {
        let entry = activity.entry(event.path.as_str()).or_default();
        entry.accesses += 1;
        if matches!(event.kind, EventKind::Edit | EventKind::Save) {
            entry.edits += 1;
        }
        entry.in_project |= project.is_some_and(|p| {
            event.path.starts_with(p)
                || event.context.get("project").map(String::as_str) == Some(p)
                || event.context.get("cwd").map(String::as_str) == Some(p)
        });
        entry.latest = entry.latest.max(Some(event.timestamp));
    }

    let scored = activity
        .into_iter()
        .filter_map(|(path, a)| {
            let recent = features.recent_files.iter().any(|f| f == path);
            let project_score = if a.in_project { 0.4 } else { 0.0 };
            let (score, reason) = match features.work_mode {
                WorkMode::Focused => (
                    0.6 * f64::from(u8::from(recent)) + project_score,
                    "part of your current focus",
                ),
                WorkMode::Exploratory => (
                    0.6 * f64::from(u8::from(!recent)) + project_score,
                    "nearby file you have not revisited",
                ),
                WorkMode::Collaborative => (
                    0.6 * a.edits as f64 / a.accesses.max(1) as f64 + project_score,
                    "actively edited",
                ),
            };
            (score > 0.0).then(|| {
                let candidate = Candidate::new(
                    path,
                    score,
                    ContextAwareModel::NAME,
                    format!("{reason} ({} mode)", features.work_mode),
                );
                (candidate, a.latest.unwrap_or(now))
            })
        })
        .collect();
    rank(scored, limit)
}

pub struct ContextAwareModel {
    context: ContextConfig,
    window: Duration,
    stats: ArcSwap<ModelStats>,
}

impl ContextAwareModel {
    pub const NAME: &'static str = "context";

    /// `window` bounds how far back candidate files are drawn from.
    pub fn new(context: &ContextConfig, window: Duration) -> Self {
        Self {
            context: context.clone(),
            window,
            stats: ArcSwap::from_pointee(ModelStats::default()),
        }
    }
}

#[async_trait]
impl ScoringModel for ContextAwareModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, ctx: &ScoringContext) -> Result<Vec<Candidate>, FilewiseError> {
        let events: Vec<&InteractionEvent> = ctx.history.iter().collect();
        Ok(context_rank(&events, &ctx.features, ctx.now, self.window, ctx.limit))
    }

    async fn train(&self, history: &[InteractionEvent]) -> Result<(), FilewiseError> {
        let window = self.window;
        let config = &self.context;
        let stats = backtest(history, Target::NextAccess, Utc::now(), |trial| {
            let events = trial.subject_events();
            let features = compute_context(trial.at, &events, config);
            paths(context_rank(&events, &features, trial.at, window, TOP_K))
        });
        publish(&self.stats, Self::NAME, stats);
        Ok(())
    }

    fn accuracy(&self) -> Option<f64> {
        self.stats.load().accuracy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filewise_config::model::LearningConfig;

    fn open(path: &str, minutes_ago: i64, now: DateTime<Utc>) -> InteractionEvent {
        InteractionEvent::new("u1", path, EventKind::Open).at(now - TimeDelta::minutes(minutes_ago))
    }

    #[test]
    fn frequency_normalizes_to_the_top_path() {
        let now = Utc::now();
        let events = [open("a", 5, now), open("b", 4, now), open("a", 3, now)];
        let refs: Vec<_> = events.iter().collect();
        let ranked = frequency_rank(&refs, 5);
        assert_eq!(ranked[0].path, "a");
        assert_eq!(ranked[0].confidence, 1.0);
        assert_eq!(ranked[1].confidence, 0.5);
        assert_eq!(ranked[0].source, "frequency");
    }

    #[test]
    fn frequency_ignores_search_events() {
        let now = Utc::now();
        let events = [InteractionEvent::new("u1", "query", EventKind::Search).at(now)];
        let refs: Vec<_> = events.iter().collect();
        assert!(frequency_rank(&refs, 5).is_empty());
    }

    #[test]
    fn temporal_prefers_fresh_files_within_window() {
        let now = Utc::now();
        let events = [
            open("old", 60 * 30, now),
            open("earlier", 120, now),
            open("fresh", 1, now),
        ];
        let refs: Vec<_> = events.iter().collect();
        let ranked = temporal_rank(&refs, now, Duration::from_secs(24 * 3600), 5);
        let paths: Vec<_> = ranked.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["fresh", "earlier"]);
        assert!(ranked.iter().all(|c| (0.0..=1.0).contains(&c.confidence)));
    }

    #[test]
    fn pattern_rank_predicts_the_continuation() {
        let now = Utc::now();
        let events = [
            open("a", 10, now),
            open("b", 9, now),
            open("c", 8, now),
            open("a", 3, now),
            open("b", 2, now),
        ];
        let refs: Vec<_> = events.iter().collect();
        let patterns = mine_patterns(refs.iter().copied(), 2, 4, now);
        let ranked = pattern_rank(&patterns, &refs, 3, now, 5);
        assert_eq!(ranked[0].path, "c");
        assert!(ranked[0].reasoning.contains("usually follows"));
        let unique: std::collections::HashSet<_> = ranked.iter().map(|c| &c.path).collect();
        assert_eq!(unique.len(), ranked.len());
    }

    #[test]
    fn context_rank_follows_work_mode() {
        let now = Utc::now();
        let events = [
            open("proj/a.rs", 30, now),
            InteractionEvent::new("u1", "proj/b.rs", EventKind::Edit).at(now - TimeDelta::minutes(20)),
            open("proj/c.rs", 10, now),
        ];
        let refs: Vec<_> = events.iter().collect();
        let mut features = compute_context(now, &refs, &ContextConfig::default());
        features.recent_files = vec!["proj/c.rs".into()];

        features.work_mode = WorkMode::Focused;
        let focused = context_rank(&refs, &features, now, Duration::from_secs(86_400), 5);
        assert_eq!(focused[0].path, "proj/c.rs");

        features.work_mode = WorkMode::Exploratory;
        let exploring = context_rank(&refs, &features, now, Duration::from_secs(86_400), 5);
        assert_ne!(exploring[0].path, "proj/c.rs");

        features.work_mode = WorkMode::Collaborative;
        let collaborating = context_rank(&refs, &features, now, Duration::from_secs(86_400), 5);
        assert_eq!(collaborating[0].path, "proj/b.rs");
    }

    #[tokio::test]
    async fn training_publishes_accuracy() {
        let now = Utc::now();
        let history: Vec<_> = (0..30)
            .map(|i| open(if i % 2 == 0 { "a" } else { "b" }, 60 - i, now))
            .collect();
        let model = FrequencyModel::new();
        assert_eq!(model.accuracy(), None);
        model.train(&history).await.unwrap();
        // Only the very first trial, with one file seen, can miss.
        let accuracy = model.accuracy().expect("enough trials");
        assert!(accuracy > 0.9 && accuracy < 1.0);

        let learner = Arc::new(PatternLearner::new(&LearningConfig::default()));
        let pattern = PatternModel::new(learner);
        pattern.train(&history).await.unwrap();
        let accuracy = pattern.accuracy().expect("enough trials");
        assert!(accuracy > 0.5);
    }
}
