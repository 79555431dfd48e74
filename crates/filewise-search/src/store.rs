// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory file index with embeddings.

use std::collections::{BTreeMap, HashSet};

use filewise_config::model::SearchConfig;
use filewise_core::{Candidate, FileMetadata, FilewiseError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::similarity::{cosine_similarity, keyword_score, squash};

/// Source label for candidates found by embedding similarity.
pub const VECTOR_SOURCE: &str = "vector";
/// Source label for candidates found by keyword overlap.
pub const KEYWORD_SOURCE: &str = "keyword";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFile {
    pub path: String,
    /// Extracted content or summary.
    pub content: String,
    pub vector: Option<Vec<f32>>,
    pub metadata: FileMetadata,
    /// Index version at which this entry was last written.
    pub version: u64,
}

#[derive(Debug, Default)]
struct Index {
    files: BTreeMap<String, IndexedFile>,
    dimension: Option<usize>,
    version: u64,
}

/// Bounded file index. The first stored vector fixes the dimension.
#[derive(Debug)]
pub struct VectorStore {
    index: RwLock<Index>,
    max_files: usize,
}

impl VectorStore {
    pub fn new(config: &SearchConfig) -> Self {
        Self::with_limit(config.max_indexed_files)
    }

    pub fn with_limit(max_files: usize) -> Self {
        Self {
            index: RwLock::new(Index::default()),
            max_files,
        }
    }

    /// Inserts or replaces a file, returning the new index version.
    pub async fn upsert(
        &self,
        path: &str,
        vector: Option<Vec<f32>>,
        content: &str,
        metadata: FileMetadata,
    ) -> Result<u64> {
        if path.trim().is_empty() {
            return Err(FilewiseError::Validation(
                "indexed path must not be empty".to_string(),
            ));
        }
        if let Some(vector) = &vector {
            check_vector(vector)?;
        }

        let mut index = self.index.write().await;
        if let (Some(vector), Some(dimension)) = (&vector, index.dimension) {
            if vector.len() != dimension {
                return Err(FilewiseError::Validation(format!(
                    "vector for {path} has dimension {}, index uses {dimension}",
                    vector.len()
                )));
            }
        }
        if !index.files.contains_key(path) && index.files.len() >= self.max_files {
            return Err(FilewiseError::storage(format!(
                "vector store is full ({} files)",
                self.max_files
            )));
        }

        if index.dimension.is_none() {
            index.dimension = vector.as_ref().map(Vec::len);
        }
        index.version += 1;
        let version = index.version;
        index.files.insert(
            path.to_string(),
            IndexedFile {
                path: path.to_string(),
                content: content.to_string(),
                vector,
                metadata,
                version,
            },
        );
        debug!(path, version, "file indexed");
        Ok(version)
    }

    /// Files whose cosine similarity to `query` is at least
    /// `min_similarity`, most similar first.
    pub async fn search(&self, query: &[f32], min_similarity: f64) -> Result<Vec<Candidate>> {
        check_vector(query)?;
        let index = self.index.read().await;
        if let Some(dimension) = index.dimension {
            if query.len() != dimension {
                return Err(FilewiseError::Validation(format!(
                    "query vector has dimension {}, index uses {dimension}",
                    query.len()
                )));
            }
        }

        let mut hits: Vec<Candidate> = index
            .files
            .values()
            .filter_map(|file| {
                let similarity = cosine_similarity(query, file.vector.as_deref()?);
                (similarity >= min_similarity).then(|| {
                    Candidate::new(
                        &file.path,
                        similarity,
                        VECTOR_SOURCE,
                        format!("semantic similarity {similarity:.2}"),
                    )
                    .with_metadata(&file.metadata)
                    .with_similarity(similarity)
                })
            })
            .collect();
        sort_by_confidence(&mut hits);
        Ok(hits)
    }

    /// Files whose content mentions any keyword, scored by overlap and
    /// squashed into [0, 1).
    pub async fn keyword_search(&self, keywords: &[String]) -> Vec<Candidate> {
        let index = self.index.read().await;
        keyword_hits(index.files.values(), keywords)
    }

    /// Keyword hits restricted to files stored without a vector, which a
    /// vector query can never reach.
    pub async fn unembedded_keyword_search(&self, keywords: &[String]) -> Vec<Candidate> {
        let index = self.index.read().await;
        keyword_hits(
            index.files.values().filter(|file| file.vector.is_none()),
            keywords,
        )
    }

    /// Up to `limit` files most similar to an already indexed one.
    pub async fn nearest(&self, path: &str, limit: usize, min_similarity: f64) -> Vec<Candidate> {
        let Some(vector) = self.vector(path).await else {
            return Vec::new();
        };
        match self.search(&vector, min_similarity).await {
            Ok(hits) => hits
                .into_iter()
                .filter(|c| c.path != path)
                .take(limit)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn get(&self, path: &str) -> Option<IndexedFile> {
        self.index.read().await.files.get(path).cloned()
    }

    pub async fn vector(&self, path: &str) -> Option<Vec<f32>> {
        self.index
            .read()
            .await
            .files
            .get(path)
            .and_then(|file| file.vector.clone())
    }

    pub async fn metadata(&self, path: &str) -> Option<FileMetadata> {
        self.index
            .read()
            .await
            .files
            .get(path)
            .map(|file| file.metadata.clone())
    }

    pub async fn paths(&self) -> HashSet<String> {
        self.index.read().await.files.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.files.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.files.is_empty()
    }

    pub async fn version(&self) -> u64 {
        self.index.read().await.version
    }

    pub async fn dimension(&self) -> Option<usize> {
        self.index.read().await.dimension
    }
}

fn keyword_hits<'a>(
    files: impl Iterator<Item = &'a IndexedFile>,
    keywords: &[String],
) -> Vec<Candidate> {
    let mut hits: Vec<Candidate> = files
        .filter_map(|file| {
            let raw = keyword_score(keywords, &file.content);
            (raw > 0.0).then(|| {
                Candidate::new(
                    &file.path,
                    squash(raw),
                    KEYWORD_SOURCE,
                    format!("keyword overlap {raw:.2}"),
                )
                .with_metadata(&file.metadata)
            })
        })
        .collect();
    sort_by_confidence(&mut hits);
    hits
}

fn check_vector(vector: &[f32]) -> Result<()> {
    if vector.is_empty() {
        return Err(FilewiseError::Validation("vector must not be empty".to_string()));
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(FilewiseError::Validation(
            "vector contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Stable descending sort; equal scores keep their input order.
pub(crate) fn sort_by_confidence(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
