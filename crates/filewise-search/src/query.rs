// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text query analysis.
//!
//! Tokenizes, expands synonyms, extracts `.ext` filters, drops stop words,
//! and classifies intent with ordered substring rules. Embedding is best
//! effort: any failure leaves the query without a vector.

use std::sync::Arc;
use std::time::Duration;

use filewise_config::model::SearchConfig;
use filewise_core::{EmbeddingProvider, FilewiseError, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};

/// What the user is most likely looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    Recent,
    Size,
    Code,
    Document,
    Image,
    General,
}

/// Intent rules, checked in order; the first rule with a matching
/// substring wins.
const INTENT_RULES: &[(&[&str], Intent)] = &[
    (&["recent", "latest"], Intent::Recent),
    (&["large", "big"], Intent::Size),
    (&["code", "function"], Intent::Code),
    (&["document", "text"], Intent::Document),
    (&["image", "photo"], Intent::Image),
];

/// Terms appended after a token; the token itself is always kept.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("doc", &["document", "documentation"]),
    ("docs", &["document", "documentation"]),
    ("img", &["image", "picture"]),
    ("pic", &["image", "picture"]),
    ("photo", &["image", "picture"]),
    ("picture", &["image", "photo"]),
    ("config", &["configuration", "settings"]),
    ("settings", &["config", "configuration"]),
    ("func", &["function"]),
    ("fn", &["function"]),
    ("script", &["code"]),
    ("test", &["spec"]),
    ("spec", &["test"]),
    ("notes", &["note", "memo"]),
    ("todo", &["task"]),
    ("report", &["summary"]),
    ("spreadsheet", &["sheet", "table"]),
];

/// Removed from the keyword set; they still count for intent rules.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "of", "to", "in", "on", "for", "with", "from", "about", "by",
    "is", "are", "was", "be", "it", "this", "that", "my", "me", "i", "all", "any", "some", "find",
    "show", "get", "give", "list", "where", "what", "which", "file", "files",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedQuery {
    pub original: String,
    /// Lowercased, whitespace-normalized query text.
    pub normalized: String,
    /// Tokens followed by their synonym expansions, in order, deduplicated.
    pub terms: Vec<String>,
    /// Terms minus stop words and extension filters.
    pub keywords: Vec<String>,
    /// Extensions named as `.ext` tokens, without the dot.
    pub extensions: Vec<String>,
    pub intent: Intent,
    pub vector: Option<Vec<f32>>,
}

impl ProcessedQuery {
    /// Analyzes a query without embedding it.
    pub fn analyze(raw: &str) -> Result<Self> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if normalized.is_empty() {
            return Err(FilewiseError::Validation("query must not be empty".to_string()));
        }

        let mut terms: Vec<String> = Vec::new();
        let mut extensions: Vec<String> = Vec::new();
        for token in tokenize(&normalized) {
            if let Some(ext) = extension_filter(token) {
                push_unique(&mut extensions, ext);
                continue;
            }
            push_unique(&mut terms, token.to_string());
            if let Some((_, expansions)) = SYNONYMS.iter().find(|(word, _)| *word == token) {
                for expansion in *expansions {
                    push_unique(&mut terms, expansion.to_string());
                }
            }
        }

        let keywords = terms
            .iter()
            .filter(|t| !STOP_WORDS.contains(&t.as_str()))
            .cloned()
            .collect();

        Ok(Self {
            original: raw.to_string(),
            intent: classify_intent(&normalized),
            normalized,
            terms,
            keywords,
            extensions,
            vector: None,
        })
    }
}

/// First matching intent rule, or [`Intent::General`].
pub fn classify_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();
    INTENT_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map_or(Intent::General, |(_, intent)| *intent)
}

fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '?' | '!' | '"' | '(' | ')'))
        .map(|t| t.trim_end_matches(['.', ':']))
        .filter(|t| !t.is_empty())
}

fn extension_filter(token: &str) -> Option<String> {
    let ext = token.strip_prefix('.')?;
    (!ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())).then(|| ext.to_string())
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Turns raw query text into a [`ProcessedQuery`], embedding it when an
/// embedding provider is available.
pub struct QueryProcessor {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    embed_timeout: Duration,
    min_embed_chars: usize,
}

impl QueryProcessor {
    pub fn new(embedder: Option<Arc<dyn EmbeddingProvider>>, config: &SearchConfig) -> Self {
        Self {
            embedder,
            embed_timeout: config.embed_timeout(),
            min_embed_chars: config.min_embed_chars,
        }
    }

    /// Analyzes and, best effort, embeds a query. Only an empty query is
    /// an error.
    pub async fn process(&self, raw: &str) -> Result<ProcessedQuery> {
        let mut query = ProcessedQuery::analyze(raw)?;
        query.vector = self.embed(&query.normalized).await;
        debug!(
            intent = %query.intent,
            keywords = query.keywords.len(),
            has_vector = query.vector.is_some(),
            "query processed"
        );
        Ok(query)
    }

    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        if text.chars().count() < self.min_embed_chars {
            return None;
        }
        match tokio::time::timeout(self.embed_timeout, embedder.embed(text)).await {
            Ok(Ok(vector)) if !vector.is_empty() && vector.iter().all(|x| x.is_finite()) => {
                Some(vector)
            }
            Ok(Ok(_)) => {
                warn!(provider = embedder.name(), "embedding provider returned an unusable vector");
                None
            }
            Ok(Err(e)) => {
                warn!(provider = embedder.name(), error = %e, "query embedding failed, using keywords");
                None
            }
            Err(_) => {
                warn!(
                    provider = embedder.name(),
                    timeout_ms = self.embed_timeout.as_millis() as u64,
                    "query embedding timed out, using keywords"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use filewise_core::{AdapterType, HealthStatus, PluginAdapter};
    use tracing_test::traced_test;

    enum Behaviour {
        Vector(Vec<f32>),
        Fail,
        Hang,
    }

    struct StubEmbedder(Behaviour);

    #[async_trait]
    impl PluginAdapter for StubEmbedder {
        fn name(&self) -> &str {
            "stub"
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::Embedding
        }

        async fn health_check(&self) -> Result<HealthStatus> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            match &self.0 {
                Behaviour::Vector(v) => Ok(v.clone()),
                Behaviour::Fail => Err(FilewiseError::collaborator("backend down")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(vec![1.0])
                }
            }
        }
    }

    fn processor(behaviour: Behaviour) -> QueryProcessor {
        QueryProcessor::new(
            Some(Arc::new(StubEmbedder(behaviour))),
            &SearchConfig::default(),
        )
    }

    #[test]
    fn synonyms_are_appended_not_replaced() {
        let q = ProcessedQuery::analyze("Config docs").unwrap();
        assert_eq!(
            q.terms,
            ["config", "configuration", "settings", "docs", "document", "documentation"]
        );
    }

    #[test]
    fn extensions_become_filters() {
        let q = ProcessedQuery::analyze("budget .xlsx .PDF").unwrap();
        assert_eq!(q.extensions, ["xlsx", "pdf"]);
        assert_eq!(q.keywords, ["budget"]);
    }

    #[test]
    fn stop_words_leave_keywords_only() {
        let q = ProcessedQuery::analyze("find the notes about rust").unwrap();
        assert_eq!(q.keywords, ["notes", "note", "memo", "rust"]);
        assert!(q.terms.contains(&"the".to_string()));
    }

    #[test]
    fn intent_first_match_wins() {
        assert_eq!(classify_intent("latest big image"), Intent::Recent);
        assert_eq!(classify_intent("big photo"), Intent::Size);
        assert_eq!(classify_intent("the parse function"), Intent::Code);
        assert_eq!(classify_intent("plain text notes"), Intent::Document);
        assert_eq!(classify_intent("holiday photo"), Intent::Image);
        assert_eq!(classify_intent("quarterly numbers"), Intent::General);
    }

    #[test]
    fn empty_query_is_rejected() {
        assert!(ProcessedQuery::analyze("   ").unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn successful_embedding_is_attached() {
        let q = processor(Behaviour::Vector(vec![0.5, 0.5]))
            .process("rust notes")
            .await
            .unwrap();
        assert_eq!(q.vector, Some(vec![0.5, 0.5]));
    }

    #[tokio::test]
    async fn short_queries_skip_embedding() {
        let q = processor(Behaviour::Vector(vec![1.0])).process("go").await.unwrap();
        assert!(q.vector.is_none());
    }

    #[tokio::test]
    #[traced_test]
    async fn failing_embedder_degrades_to_keywords() {
        let q = processor(Behaviour::Fail).process("rust notes").await.unwrap();
        assert!(q.vector.is_none());
        assert!(logs_contain("query embedding failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_embedder_times_out() {
        let q = processor(Behaviour::Hang).process("rust notes").await.unwrap();
        assert!(q.vector.is_none());
        assert_eq!(q.keywords, ["rust", "notes", "note", "memo"]);
    }

    #[tokio::test]
    async fn nan_vectors_are_discarded() {
        let q = processor(Behaviour::Vector(vec![f32::NAN]))
            .process("rust notes")
            .await
            .unwrap();
        assert!(q.vector.is_none());
    }

    #[tokio::test]
    async fn no_embedder_means_no_vector() {
        let q = QueryProcessor::new(None, &SearchConfig::default())
            .process("rust notes")
            .await
            .unwrap();
        assert!(q.vector.is_none());
    }
}
