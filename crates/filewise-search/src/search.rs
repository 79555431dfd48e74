// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query answering over the [`VectorStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use filewise_config::model::SearchConfig;
use filewise_core::{Candidate, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::query::{Intent, ProcessedQuery};
use crate::store::{sort_by_confidence, VectorStore};

/// Largest score bump an intent match can give.
const INTENT_BOOST: f64 = 0.1;
/// Modification age after which the recent-intent boost is gone.
const RECENT_DAYS: f64 = 30.0;

const CODE_TYPES: &[&str] = &[
    "rs", "py", "js", "ts", "tsx", "jsx", "go", "java", "kt", "c", "h", "cpp", "hpp", "cs", "rb",
    "php", "swift", "sh", "sql", "toml", "yaml", "yml", "json",
];
const DOCUMENT_TYPES: &[&str] = &[
    "md", "txt", "pdf", "doc", "docx", "odt", "rtf", "tex", "rst", "org", "html",
];
const IMAGE_TYPES: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "svg", "webp", "tiff", "heic",
];

/// Caller-supplied search filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Only return these file types (extensions, with or without the dot).
    #[serde(default)]
    pub file_types: Vec<String>,
    /// Only return files at most this many bytes.
    pub max_size: Option<u64>,
    /// Overrides the configured result cap.
    pub max_results: Option<usize>,
}

pub struct SemanticSearch {
    store: Arc<VectorStore>,
    min_similarity: f64,
}

impl SemanticSearch {
    pub fn new(store: Arc<VectorStore>, config: &SearchConfig) -> Self {
        Self {
            store,
            min_similarity: config.min_similarity,
        }
    }

    /// Unranked hits for a processed query, filtered by `options` and the
    /// query's extension entities, with intent boosts applied.
    ///
    /// Uses cosine similarity when the query carries a vector the index can
    /// compare against, keyword overlap otherwise. Files indexed without a
    /// vector are always matched by keyword overlap.
    pub async fn search(
        &self,
        query: &ProcessedQuery,
        options: &SearchOptions,
        now: DateTime<Utc>,
    ) -> Result<Vec<Candidate>> {
        let mut hits = match &query.vector {
            Some(vector) => match self.store.search(vector, self.min_similarity).await {
                Ok(hits) => {
                    let unembedded = self.store.unembedded_keyword_search(&query.keywords).await;
                    merge_by_path(hits, unembedded)
                }
                Err(e) if e.is_validation() => {
                    warn!(error = %e, "query vector unusable, using keywords");
                    self.store.keyword_search(&query.keywords).await
                }
                Err(e) => return Err(e),
            },
            None => self.store.keyword_search(&query.keywords).await,
        };

        let allowed: Vec<String> = options
            .file_types
            .iter()
            .map(|t| t.trim_start_matches('.').to_lowercase())
            .chain(query.extensions.iter().cloned())
            .collect();
        hits.retain(|c| {
            let type_ok = allowed.is_empty()
                || c.file_type
                    .as_deref()
                    .is_some_and(|t| allowed.iter().any(|a| a == t));
            let size_ok = match (options.max_size, c.size) {
                (Some(max), Some(size)) => size <= max,
                _ => true,
            };
            type_ok && size_ok
        });

        let largest = hits.iter().filter_map(|c| c.size).max().unwrap_or(0);
        for candidate in &mut hits {
            let boost = intent_boost(query.intent, candidate, largest, now);
            if boost > 0.0 {
                candidate.confidence = (candidate.confidence + boost).min(1.0);
                candidate.reasoning = format!("{}; fits {} intent", candidate.reasoning, query.intent);
            }
        }
        sort_by_confidence(&mut hits);

        debug!(hits = hits.len(), intent = %query.intent, "search candidates");
        Ok(hits)
    }
}

/// Union of two hit lists; a path present in both keeps its higher score.
fn merge_by_path(primary: Vec<Candidate>, extra: Vec<Candidate>) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = Vec::with_capacity(primary.len() + extra.len());
    for candidate in primary.into_iter().chain(extra) {
        match merged.iter_mut().find(|c| c.path == candidate.path) {
            Some(existing) if existing.confidence < candidate.confidence => *existing = candidate,
            Some(_) => {}
            None => merged.push(candidate),
        }
    }
    merged
}

/// Bump in [0, 0.1] for a candidate that fits the query's intent.
pub fn intent_boost(
    intent: Intent,
    candidate: &Candidate,
    largest_size: u64,
    now: DateTime<Utc>,
) -> f64 {
    let is_type = |types: &[&str]| {
        candidate
            .file_type
            .as_deref()
            .is_some_and(|t| types.contains(&t))
    };
    match intent {
        Intent::Code if is_type(CODE_TYPES) => INTENT_BOOST,
        Intent::Document if is_type(DOCUMENT_TYPES) => INTENT_BOOST,
        Intent::Image if is_type(IMAGE_TYPES) => INTENT_BOOST,
        Intent::Recent => candidate.modified.map_or(0.0, |modified| {
            let days = (now - modified).num_seconds() as f64 / 86_400.0;
            INTENT_BOOST * (1.0 - days.max(0.0) / RECENT_DAYS).max(0.0)
        }),
        Intent::Size if largest_size > 0 => candidate
            .size
            .map_or(0.0, |size| INTENT_BOOST * size as f64 / largest_size as f64),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use filewise_core::FileMetadata;

    async fn store() -> Arc<VectorStore> {
        let store = Arc::new(VectorStore::with_limit(100));
        let files = [
            ("src/parser.rs", vec![1.0, 0.0], "parse tokens into an ast", "rs", 4_000),
            ("docs/parser.md", vec![0.9, 0.2], "how the parser works", "md", 900),
            ("assets/logo.png", vec![0.0, 1.0], "", "png", 50_000),
        ];
        for (path, vector, content, file_type, size) in files {
            store
                .upsert(
                    path,
                    Some(vector),
                    content,
                    FileMetadata {
                        file_type: Some(file_type.to_string()),
                        size: Some(size),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
        store
    }

    fn search(store: Arc<VectorStore>) -> SemanticSearch {
        SemanticSearch::new(store, &SearchConfig::default())
    }

    #[tokio::test]
    async fn vector_path_ranks_by_similarity() {
        let mut query = ProcessedQuery::analyze("parser").unwrap();
        query.vector = Some(vec![1.0, 0.0]);
        let hits = search(store().await)
            .search(&query, &SearchOptions::default(), Utc::now())
            .await
            .unwrap();
        let paths: Vec<_> = hits.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["src/parser.rs", "docs/parser.md"]);
    }

    #[tokio::test]
    async fn keyword_fallback_without_vector() {
        let query = ProcessedQuery::analyze("parser").unwrap();
        let hits = search(store().await)
            .search(&query, &SearchOptions::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "docs/parser.md");
        assert_eq!(hits[0].source, "keyword");
    }

    #[tokio::test]
    async fn mismatched_query_vector_falls_back() {
        let mut query = ProcessedQuery::analyze("parser").unwrap();
        query.vector = Some(vec![1.0, 0.0, 0.0]);
        let hits = search(store().await)
            .search(&query, &SearchOptions::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn filters_by_type_and_size() {
        let mut query = ProcessedQuery::analyze("parser .md").unwrap();
        query.vector = Some(vec![1.0, 0.0]);
        let hits = search(store().await)
            .search(&query, &SearchOptions::default(), Utc::now())
            .await
            .unwrap();
        assert!(hits.iter().all(|c| c.file_type.as_deref() == Some("md")));

        let mut query = ProcessedQuery::analyze("anything").unwrap();
        query.vector = Some(vec![0.5, 0.5]);
        let options = SearchOptions {
            max_size: Some(5_000),
            ..Default::default()
        };
        let hits = search(store().await)
            .search(&query, &options, Utc::now())
            .await
            .unwrap();
        assert!(hits.iter().all(|c| c.size.unwrap_or(0) <= 5_000));
        assert!(!hits.is_empty());
    }

    #[tokio::test]
    async fn vector_query_still_reaches_keyword_only_files() {
        let store = store().await;
        store
            .upsert("notes/parser-todo.txt", None, "rewrite the parser", FileMetadata::default())
            .await
            .unwrap();
        let mut query = ProcessedQuery::analyze("parser").unwrap();
        query.vector = Some(vec![1.0, 0.0]);
        let hits = search(store)
            .search(&query, &SearchOptions::default(), Utc::now())
            .await
            .unwrap();
        let todo = hits.iter().find(|c| c.path == "notes/parser-todo.txt").unwrap();
        assert_eq!(todo.source, "keyword");
        assert!(hits.iter().any(|c| c.path == "src/parser.rs" && c.source == "vector"));
    }

    #[tokio::test]
    async fn vector_query_on_index_without_vectors_uses_keywords() {
        let store = Arc::new(VectorStore::with_limit(10));
        store
            .upsert("a.md", None, "tokio upgrade plan", FileMetadata::default())
            .await
            .unwrap();
        let mut query = ProcessedQuery::analyze("tokio upgrade").unwrap();
        query.vector = Some(vec![0.3, 0.7]);
        let hits = search(store)
            .search(&query, &SearchOptions::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "a.md");
    }

    #[test]
    fn merge_keeps_the_higher_score_per_path() {
        let merged = merge_by_path(
            vec![Candidate::new("a", 0.4, "vector", ""), Candidate::new("b", 0.9, "vector", "")],
            vec![Candidate::new("a", 0.6, "keyword", ""), Candidate::new("c", 0.2, "keyword", "")],
        );
        let summary: Vec<_> = merged
            .iter()
            .map(|c| (c.path.as_str(), c.source.as_str()))
            .collect();
        assert_eq!(summary, [("a", "keyword"), ("b", "vector"), ("c", "keyword")]);
    }

    #[test]
    fn intent_boost_is_small_and_targeted() {
        let now = Utc::now();
        let code = Candidate::new("a.rs", 0.5, "vector", "");
        let doc = Candidate::new("a.md", 0.5, "vector", "");
        assert_eq!(intent_boost(Intent::Code, &code, 0, now), INTENT_BOOST);
        assert_eq!(intent_boost(Intent::Code, &doc, 0, now), 0.0);
        assert_eq!(intent_boost(Intent::General, &code, 0, now), 0.0);

        let mut fresh = Candidate::new("a.md", 0.5, "vector", "");
        fresh.modified = Some(now - TimeDelta::days(15));
        let boost = intent_boost(Intent::Recent, &fresh, 0, now);
        assert!((boost - 0.05).abs() < 1e-6);

        let mut big = Candidate::new("a.bin", 0.5, "vector", "");
        big.size = Some(50);
        assert!((intent_boost(Intent::Size, &big, 100, now) - 0.05).abs() < 1e-12);
    }
}
