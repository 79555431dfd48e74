// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging candidates that several models agree on.

use std::collections::HashMap;

use filewise_config::model::RankingConfig;
use filewise_core::Candidate;
use tracing::debug;

/// Source label of a candidate merged from more than one model.
pub const COMBINED_SOURCE: &str = "combined";

/// Merges candidates by path and returns them strongest first.
///
/// Paths keep the order in which they were first seen. A path proposed
/// once passes through untouched; a path proposed several times becomes one
/// candidate with the mean confidence, the reasons joined in input order,
/// and the union of tags.
pub fn combine(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<Candidate>> = Vec::new();
    for candidate in candidates {
        match index.get(&candidate.path) {
            Some(&slot) => groups[slot].push(candidate),
            None => {
                index.insert(candidate.path.clone(), groups.len());
                groups.push(vec![candidate]);
            }
        }
    }

    let mut merged: Vec<Candidate> = groups.into_iter().filter_map(merge_group).collect();
    sort_by_confidence(&mut merged);
    merged
}

fn merge_group(mut group: Vec<Candidate>) -> Option<Candidate> {
    if group.len() <= 1 {
        return group.pop();
    }
    let count = group.len() as f64;
    let confidence = group.iter().map(|c| c.confidence).sum::<f64>() / count;
    let reasoning = group
        .iter()
        .map(|c| c.reasoning.as_str())
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join("; ");

    let mut tags: Vec<String> = Vec::new();
    for tag in group.iter().flat_map(|c| c.tags.iter()) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }

    let mut first = group.swap_remove(0);
    for other in &group {
        first.file_type = first.file_type.or_else(|| other.file_type.clone());
        first.size = first.size.or(other.size);
        first.modified = first.modified.or(other.modified);
        first.similarity = first.similarity.or(other.similarity);
    }
    first.confidence = confidence.clamp(0.0, 1.0);
    first.reasoning = reasoning;
    first.tags = tags;
    first.source = COMBINED_SOURCE.to_string();
    Some(first)
}

/// Stable sort, strongest first.
pub(crate) fn sort_by_confidence(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Drops candidates under `min_confidence`, then keeps the first
/// `max_results`. Expects sorted input.
pub fn finalize(candidates: Vec<Candidate>, min_confidence: f64, max_results: usize) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.confidence >= min_confidence)
        .take(max_results)
        .collect()
}

/// Combination plus the configured cut-off.
#[derive(Debug, Clone)]
pub struct RankingEngine {
    min_confidence: f64,
    max_results: usize,
}

impl RankingEngine {
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            max_results: config.max_results,
        }
    }

    pub fn rank(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let proposed = candidates.len();
        let ranked = finalize(combine(candidates), self.min_confidence, self.max_results);
        debug!(proposed, returned = ranked.len(), "candidates ranked");
        ranked
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(path: &str, confidence: f64, source: &str) -> Candidate {
        Candidate::new(path, confidence, source, format!("{source} says so"))
    }

    #[test]
    fn duplicates_merge_to_the_mean() {
        let merged = combine(vec![
            candidate("a.rs", 0.9, "frequency").with_tags(vec!["rust".into()]),
            candidate("b.rs", 0.5, "temporal"),
            candidate("a.rs", 0.5, "pattern").with_tags(vec!["rust".into(), "core".into()]),
        ]);
        assert_eq!(merged.len(), 2);
        let a = &merged[0];
        assert_eq!(a.path, "a.rs");
        assert!((a.confidence - 0.7).abs() < 1e-12);
        assert_eq!(a.source, COMBINED_SOURCE);
        assert_eq!(a.reasoning, "frequency says so; pattern says so");
        assert_eq!(a.tags, ["rust", "core"]);
        assert_eq!(merged[1].source, "temporal");
    }

    #[test]
    fn ties_keep_discovery_order() {
        let merged = combine(vec![
            candidate("first", 0.5, "a"),
            candidate("second", 0.5, "b"),
            candidate("third", 0.5, "c"),
        ]);
        let paths: Vec<_> = merged.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["first", "second", "third"]);
    }

    #[test]
    fn filter_runs_before_truncate() {
        let engine = RankingEngine::new(&RankingConfig {
            min_confidence: 0.5,
            max_results: 3,
            ..Default::default()
        });
        let ranked = engine.rank(
            [("a", 0.9), ("b", 0.8), ("c", 0.4), ("d", 0.3), ("e", 0.95)]
                .into_iter()
                .map(|(p, c)| candidate(p, c, "m"))
                .collect(),
        );
        let confidences: Vec<_> = ranked.iter().map(|c| c.confidence).collect();
        assert_eq!(confidences, [0.95, 0.9, 0.8]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(combine(Vec::new()).is_empty());
        assert!(finalize(Vec::new(), 0.0, 10).is_empty());
    }
}
