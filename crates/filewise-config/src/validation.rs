// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Collects every problem instead of failing on the first one.

use crate::diagnostic::ConfigError;
use crate::model::FilewiseConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &FilewiseConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.engine.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "engine.log_level `{}` must be one of {}",
                config.engine.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    for (key, value) in [
        ("engine.request_timeout_ms", config.engine.request_timeout_ms),
        ("engine.retrain_interval_secs", config.engine.retrain_interval_secs),
        ("search.embed_timeout_ms", config.search.embed_timeout_ms),
        ("external.timeout_ms", config.external.timeout_ms),
        ("context.work_mode_window_secs", config.context.work_mode_window_secs),
        ("models.temporal_window_secs", config.models.temporal_window_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::OutOfRange {
                key: key.to_string(),
                value: value.to_string(),
                range: "greater than 0".to_string(),
            });
        }
    }

    for (key, value) in [
        ("history.capacity", config.history.capacity),
        ("context.recent_files", config.context.recent_files),
        ("models.candidates_per_model", config.models.candidates_per_model),
        ("ranking.max_results", config.ranking.max_results),
        ("search.max_results", config.search.max_results),
        ("search.max_indexed_files", config.search.max_indexed_files),
    ] {
        if value == 0 {
            errors.push(ConfigError::OutOfRange {
                key: key.to_string(),
                value: value.to_string(),
                range: "at least 1".to_string(),
            });
        }
    }

    let unit_interval = [
        ("ranking.min_confidence".to_string(), config.ranking.min_confidence),
        ("search.min_relevance".to_string(), config.search.min_relevance),
    ]
    .into_iter()
    .chain(
        config
            .ranking
            .model_weights
            .iter()
            .map(|(name, weight)| (format!("ranking.model_weights.{name}"), *weight)),
    );
    for (key, value) in unit_interval {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::OutOfRange {
                key,
                value: value.to_string(),
                range: "0.0..=1.0".to_string(),
            });
        }
    }

    if !(-1.0..=1.0).contains(&config.search.min_similarity) {
        errors.push(ConfigError::OutOfRange {
            key: "search.min_similarity".to_string(),
            value: config.search.min_similarity.to_string(),
            range: "-1.0..=1.0".to_string(),
        });
    }

    let (min_len, max_len) = (
        config.learning.min_sequence_len,
        config.learning.max_sequence_len,
    );
    if min_len < 2 || max_len > 4 || min_len > max_len {
        errors.push(ConfigError::Validation {
            message: format!(
                "learning sequence lengths must satisfy 2 <= min <= max <= 4, got min={min_len} max={max_len}"
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
