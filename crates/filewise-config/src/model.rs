// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Filewise engine.
//!
//! Every struct rejects unknown keys so a typo in `filewise.toml` fails at
//! startup instead of silently falling back to a default.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Filewise configuration. All sections are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilewiseConfig {
    /// Engine-wide settings (logging, deadlines, retraining).
    #[serde(default)]
    pub engine: EngineConfig,

    /// Interaction history settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Access-pattern mining settings.
    #[serde(default)]
    pub learning: LearningConfig,

    /// Context feature settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// Built-in scoring model settings.
    #[serde(default)]
    pub models: ModelsConfig,

    /// Combination and ranking settings.
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Vector search and query processing settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Externally-backed scoring model settings.
    #[serde(default)]
    pub external: ExternalConfig,
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Default deadline for recommend/predict/search calls, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Interval between background retraining passes, in seconds.
    #[serde(default = "default_retrain_interval_secs")]
    pub retrain_interval_secs: u64,
}

impl EngineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retrain_interval(&self) -> Duration {
        Duration::from_secs(self.retrain_interval_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_ms: default_request_timeout_ms(),
            retrain_interval_secs: default_retrain_interval_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_ms() -> u64 {
    2_000
}

fn default_retrain_interval_secs() -> u64 {
    300
}

/// Interaction history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Maximum events kept per log (global and per subject).
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Window used by models that look at "recent" history, in seconds.
    #[serde(default = "default_recent_window_secs")]
    pub recent_window_secs: u64,
}

impl HistoryConfig {
    pub fn recent_window(&self) -> Duration {
        Duration::from_secs(self.recent_window_secs)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            recent_window_secs: default_recent_window_secs(),
        }
    }
}

fn default_capacity() -> usize {
    10_000
}

fn default_recent_window_secs() -> u64 {
    7 * 24 * 3600
}

/// Access-pattern mining configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LearningConfig {
    /// Mine patterns inline on every append.
    #[serde(default = "default_learning_enabled")]
    pub enabled: bool,

    /// Shortest mined subsequence.
    #[serde(default = "default_min_sequence_len")]
    pub min_sequence_len: usize,

    /// Longest mined subsequence.
    #[serde(default = "default_max_sequence_len")]
    pub max_sequence_len: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            enabled: default_learning_enabled(),
            min_sequence_len: default_min_sequence_len(),
            max_sequence_len: default_max_sequence_len(),
        }
    }
}

fn default_learning_enabled() -> bool {
    true
}

fn default_min_sequence_len() -> usize {
    2
}

fn default_max_sequence_len() -> usize {
    4
}

/// Context feature configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Size of the recent-files window.
    #[serde(default = "default_recent_files")]
    pub recent_files: usize,

    /// Trailing window for work-mode classification, in seconds.
    #[serde(default = "default_work_mode_window_secs")]
    pub work_mode_window_secs: u64,
}

impl ContextConfig {
    pub fn work_mode_window(&self) -> Duration {
        Duration::from_secs(self.work_mode_window_secs)
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            recent_files: default_recent_files(),
            work_mode_window_secs: default_work_mode_window_secs(),
        }
    }
}

fn default_recent_files() -> usize {
    5
}

fn default_work_mode_window_secs() -> u64 {
    3600
}

/// Built-in scoring model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    /// Maximum candidates a single model may return.
    #[serde(default = "default_candidates_per_model")]
    pub candidates_per_model: usize,

    /// Recency window of the temporal model, in seconds.
    #[serde(default = "default_temporal_window_secs")]
    pub temporal_window_secs: u64,
}

impl ModelsConfig {
    pub fn temporal_window(&self) -> Duration {
        Duration::from_secs(self.temporal_window_secs)
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            candidates_per_model: default_candidates_per_model(),
            temporal_window_secs: default_temporal_window_secs(),
        }
    }
}

fn default_candidates_per_model() -> usize {
    5
}

fn default_temporal_window_secs() -> u64 {
    24 * 3600
}

/// Combination and ranking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RankingConfig {
    /// Candidates below this combined confidence are dropped.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Maximum results per response, applied after the confidence filter.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Pinned per-model weights. Models without an entry are weighted by
    /// their self-reported accuracy.
    #[serde(default)]
    pub model_weights: BTreeMap<String, f64>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            max_results: default_max_results(),
            model_weights: BTreeMap::new(),
        }
    }
}

fn default_min_confidence() -> f64 {
    0.1
}

fn default_max_results() -> usize {
    10
}

/// Vector search and query processing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Minimum cosine similarity for a vector hit.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    /// Minimum final relevance for a search result.
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,

    /// Maximum search results.
    #[serde(default = "default_search_max_results")]
    pub max_results: usize,

    /// Timeout for one embedding request, in milliseconds.
    #[serde(default = "default_embed_timeout_ms")]
    pub embed_timeout_ms: u64,

    /// Queries shorter than this skip embedding and use keyword matching.
    #[serde(default = "default_min_embed_chars")]
    pub min_embed_chars: usize,

    /// Upper bound on indexed files.
    #[serde(default = "default_max_indexed_files")]
    pub max_indexed_files: usize,
}

impl SearchConfig {
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_similarity: default_min_similarity(),
            min_relevance: default_min_relevance(),
            max_results: default_search_max_results(),
            embed_timeout_ms: default_embed_timeout_ms(),
            min_embed_chars: default_min_embed_chars(),
            max_indexed_files: default_max_indexed_files(),
        }
    }
}

fn default_min_similarity() -> f64 {
    0.3
}

fn default_min_relevance() -> f64 {
    0.05
}

fn default_search_max_results() -> usize {
    20
}

fn default_embed_timeout_ms() -> u64 {
    1_500
}

fn default_min_embed_chars() -> usize {
    3
}

fn default_max_indexed_files() -> usize {
    100_000
}

/// Externally-backed scoring model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalConfig {
    /// Register the external model when a backend is supplied.
    #[serde(default)]
    pub enabled: bool,

    /// Timeout for one backend request, in milliseconds.
    #[serde(default = "default_external_timeout_ms")]
    pub timeout_ms: u64,
}

impl ExternalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: default_external_timeout_ms(),
        }
    }
}

fn default_external_timeout_ms() -> u64 {
    2_000
}
