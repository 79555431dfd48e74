// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-scoring search results against the subject's profile.

use chrono::{DateTime, Utc};
use filewise_context::Profile;
use filewise_core::Candidate;

use crate::combine::sort_by_confidence;

const TYPE_WEIGHT: f64 = 0.3;
const CATEGORY_WEIGHT: f64 = 0.2;
const RECENCY_WEIGHT: f64 = 0.1;
/// Files modified longer ago than this earn no recency credit.
const RECENCY_HORIZON_DAYS: f64 = 30.0;

/// `1 - days since modified / 30`, floored at 0. Unknown mtime scores 0.
pub fn recency_score(modified: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(modified) = modified else {
        return 0.0;
    };
    let days = (now - modified).num_seconds().max(0) as f64 / 86_400.0;
    (1.0 - days / RECENCY_HORIZON_DAYS).clamp(0.0, 1.0)
}

/// How well a candidate fits the profile.
pub fn personal_score(candidate: &Candidate, profile: &Profile, now: DateTime<Utc>) -> f64 {
    let type_weight = candidate
        .file_type
        .as_deref()
        .map(|t| profile.type_weight(t))
        .unwrap_or(0.0);
    let category_weight: f64 = if candidate.tags.is_empty() {
        candidate
            .file_type
            .as_deref()
            .map(|t| profile.category_weight(t))
            .unwrap_or(0.0)
    } else {
        candidate
            .tags
            .iter()
            .map(|tag| profile.category_weight(tag))
            .sum()
    };
    TYPE_WEIGHT * type_weight
        + CATEGORY_WEIGHT * category_weight
        + RECENCY_WEIGHT * recency_score(candidate.modified, now)
}

/// Averages each relevance with its personal score and re-sorts.
/// Without a profile the input order and scores stand.
pub fn personalize(
    mut candidates: Vec<Candidate>,
    profile: Option<&Profile>,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let Some(profile) = profile else {
        return candidates;
    };
    for candidate in &mut candidates {
        let personal = personal_score(candidate, profile, now);
        candidate.confidence = ((candidate.confidence + personal) / 2.0).clamp(0.0, 1.0);
    }
    sort_by_confidence(&mut candidates);
    candidates
}
