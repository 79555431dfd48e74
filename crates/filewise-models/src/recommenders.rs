// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in recommenders: files the subject has not touched yet.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use filewise_core::{Candidate, FilewiseError, InteractionEvent, GLOBAL_SUBJECT};
use filewise_history::{FileGraph, HistoryStore};
use filewise_search::VectorStore;

use crate::backtest::{backtest, Target, TOP_K};
use crate::model::{ModelStats, ScoringContext, ScoringModel};
use crate::predictors::publish;

/// Most-accessed paths across everyone, skipping `exclude`.
pub fn popularity_rank(
    events: &[&InteractionEvent],
    exclude: &HashSet<&str>,
    limit: usize,
) -> Vec<Candidate> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for event in events.iter().filter(|e| e.kind.is_access()) {
        let path = event.path.as_str();
        if exclude.contains(path) {
            continue;
        }
        let count = counts.entry(path).or_insert(0);
        if *count == 0 {
            order.push(path);
        }
        *count += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }
    let mut ranked: Vec<Candidate> = order
        .into_iter()
        .map(|path| {
            let n = counts[path];
            Candidate::new(
                path,
                n as f64 / max as f64,
                PopularityModel::NAME,
                format!("opened {n} times across users"),
            )
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

pub struct PopularityModel {
    history: Arc<HistoryStore>,
    window: Duration,
    stats: ArcSwap<ModelStats>,
}

impl PopularityModel {
    pub const NAME: &'static str = "popularity";

    pub fn new(history: Arc<HistoryStore>, window: Duration) -> Self {
        Self {
            history,
            window,
            stats: ArcSwap::from_pointee(ModelStats::default()),
        }
    }
}

#[async_trait]
impl ScoringModel for PopularityModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, ctx: &ScoringContext) -> Result<Vec<Candidate>, FilewiseError> {
        let global = self
            .history
            .recent(GLOBAL_SUBJECT, self.window, ctx.now)
            .await;
        let events: Vec<&InteractionEvent> = global.iter().collect();
        Ok(popularity_rank(&events, &ctx.touched(), ctx.limit))
    }

    async fn train(&self, history: &[InteractionEvent]) -> Result<(), FilewiseError> {
        let window = TimeDelta::from_std(self.window).unwrap_or(TimeDelta::MAX);
        let stats = backtest(history, Target::FirstAccess, Utc::now(), |trial| {
            let start = trial.at.checked_sub_signed(window);
            let touched: HashSet<&str> = trial
                .subject_events()
                .into_iter()
                .filter(|e| e.kind.is_access())
                .map(|e| e.path.as_str())
                .collect();
            let recent: Vec<&InteractionEvent> = trial
                .prefix
                .iter()
                .filter(|e| start.is_none_or(|s| e.timestamp >= s))
                .collect();
            popularity_rank(&recent, &touched, TOP_K)
                .into_iter()
                .map(|c| c.path)
                .collect()
        });
        publish(&self.stats, Self::NAME, stats);
        Ok(())
    }

    fn accuracy(&self) -> Option<f64> {
        self.stats.load().accuracy
    }
}

/// Indexed files close to the subject's personal embedding.
pub struct SimilarContentModel {
    store: Arc<VectorStore>,
    min_similarity: f64,
}

impl SimilarContentModel {
    pub const NAME: &'static str = "similar_content";

    pub fn new(store: Arc<VectorStore>, min_similarity: f64) -> Self {
        Self {
            store,
            min_similarity,
        }
    }
}

#[async_trait]
impl ScoringModel for SimilarContentModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, ctx: &ScoringContext) -> Result<Vec<Candidate>, FilewiseError> {
        let Some(embedding) = ctx
            .profile
            .as_ref()
            .and_then(|p| p.personal_embedding.as_deref())
        else {
            return Ok(Vec::new());
        };
        let touched = ctx.touched();
        let hits = self.store.search(embedding, self.min_similarity).await?;
        Ok(hits
            .into_iter()
            .filter(|c| !touched.contains(c.path.as_str()))
            .take(ctx.limit)
            .map(|mut c| {
                let similarity = c.similarity.unwrap_or(c.confidence);
                c.source = Self::NAME.to_string();
                c.reasoning = format!("similar to files you use ({similarity:.2})");
                c
            })
            .collect())
    }

    /// Reads the live index; nothing to train.
    async fn train(&self, _history: &[InteractionEvent]) -> Result<(), FilewiseError> {
        Ok(())
    }

    fn accuracy(&self) -> Option<f64> {
        None
    }
}

/// Graph neighbours of the subject's recent files.
pub struct CoAccessModel {
    graph: Arc<FileGraph>,
}

impl CoAccessModel {
    pub const NAME: &'static str = "co_access";

    pub fn new(graph: Arc<FileGraph>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl ScoringModel for CoAccessModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, ctx: &ScoringContext) -> Result<Vec<Candidate>, FilewiseError> {
        let touched = ctx.touched();
        let mut best: Vec<Candidate> = Vec::new();
        for (rank, recent) in ctx.features.recent_files.iter().enumerate() {
            // Newer recent files count more.
            let decay = 1.0 / (rank as f64 + 1.0);
            for neighbor in self.graph.neighbors(recent).await {
                if touched.contains(neighbor.path.as_str()) {
                    continue;
                }
                let score = neighbor.weight * decay;
                match best.iter_mut().find(|c| c.path == neighbor.path) {
                    Some(existing) if existing.confidence >= score => {}
                    Some(existing) => {
                        existing.confidence = score;
                        existing.reasoning = format!("{} with {recent}", neighbor.kind);
                    }
                    None => best.push(Candidate::new(
                        neighbor.path.clone(),
                        score,
                        Self::NAME,
                        format!("{} with {recent}", neighbor.kind),
                    )),
                }
            }
        }
        best.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        best.truncate(ctx.limit);
        Ok(best)
    }

    /// Reads the live graph; nothing to train.
    async fn train(&self, _history: &[InteractionEvent]) -> Result<(), FilewiseError> {
        Ok(())
    }

    fn accuracy(&self) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filewise_config::model::ContextConfig;
    use filewise_context::{compute_context, Profile};
    use filewise_core::{EventKind, FileMetadata};
    use filewise_history::EdgeKind;

    fn ctx(history: Vec<InteractionEvent>, recent: &[&str], profile: Option<Profile>) -> ScoringContext {
        let now = Utc::now();
        let mut features = compute_context(now, &history, &ContextConfig::default());
        features.recent_files = recent.iter().map(|s| s.to_string()).collect();
        ScoringContext {
            subject: "u1".into(),
            now,
            features,
            history: Arc::new(history),
            profile,
            limit: 3,
        }
    }

    #[test]
    fn popularity_skips_excluded_paths() {
        let events: Vec<_> = ["a", "b", "a", "c", "a", "b"]
            .iter()
            .map(|p| InteractionEvent::new("u2", *p, EventKind::Open))
            .collect();
        let refs: Vec<_> = events.iter().collect();
        let exclude: HashSet<&str> = ["a"].into_iter().collect();
        let ranked = popularity_rank(&refs, &exclude, 5);
        let paths: Vec<_> = ranked.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["b", "c"]);
        assert_eq!(ranked[0].confidence, 1.0);
    }

    #[tokio::test]
    async fn popularity_reads_global_history() {
        let history = Arc::new(HistoryStore::with_capacity(100));
        for (subject, path) in [("u2", "shared.md"), ("u3", "shared.md"), ("u2", "mine.rs")] {
            history
                .append(InteractionEvent::new(subject, path, EventKind::Open))
                .await
                .unwrap();
        }
        let model = PopularityModel::new(history, Duration::from_secs(3600));
        let own = vec![InteractionEvent::new("u1", "mine.rs", EventKind::Open)];
        let candidates = model.score(&ctx(own, &[], None)).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].path, "shared.md");
    }

    #[tokio::test]
    async fn similar_content_needs_a_personal_embedding() {
        let store = Arc::new(VectorStore::with_limit(10));
        store
            .upsert("near.md", Some(vec![1.0, 0.0]), "", FileMetadata::default())
            .await
            .unwrap();
        store
            .upsert("seen.md", Some(vec![1.0, 0.1]), "", FileMetadata::default())
            .await
            .unwrap();
        let model = SimilarContentModel::new(store, 0.3);

        assert!(model.score(&ctx(Vec::new(), &[], None)).await.unwrap().is_empty());

        let mut profile = Profile::new("u1");
        profile.personal_embedding = Some(vec![1.0, 0.05]);
        let seen = vec![InteractionEvent::new("u1", "seen.md", EventKind::Open)];
        let candidates = model.score(&ctx(seen, &[], Some(profile))).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].path, "near.md");
        assert_eq!(candidates[0].source, "similar_content");
    }

    #[tokio::test]
    async fn similar_content_surfaces_dimension_errors() {
        let store = Arc::new(VectorStore::with_limit(10));
        store
            .upsert("a.md", Some(vec![1.0, 0.0]), "", FileMetadata::default())
            .await
            .unwrap();
        let model = SimilarContentModel::new(store, 0.3);
        let mut profile = Profile::new("u1");
        profile.personal_embedding = Some(vec![1.0, 0.0, 0.0]);
        assert!(model.score(&ctx(Vec::new(), &[], Some(profile))).await.is_err());
    }

    #[tokio::test]
    async fn co_access_weights_newer_recent_files_higher() {
        let graph = Arc::new(FileGraph::new());
        graph.assert_edge("new.rs", "x.rs", EdgeKind::Sequence, 0.8).await;
        graph.assert_edge("old.rs", "y.rs", EdgeKind::Sequence, 0.9).await;
        graph.assert_edge("old.rs", "x.rs", EdgeKind::Project, 0.2).await;
        let model = CoAccessModel::new(graph);

        let candidates = model
            .score(&ctx(Vec::new(), &["new.rs", "old.rs"], None))
            .await
            .unwrap();
        let paths: Vec<_> = candidates.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["x.rs", "y.rs"]);
        assert!((candidates[0].confidence - 0.8).abs() < 1e-12);
        assert!((candidates[1].confidence - 0.45).abs() < 1e-12);
        assert!(candidates[0].reasoning.contains("new.rs"));
    }
}
