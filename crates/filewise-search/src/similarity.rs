// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoring functions shared by the vector and keyword paths.

/// Cosine similarity `dot(a, b) / (|a| * |b|)`, in [-1, 1].
///
/// Zero when either norm is zero or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Keyword overlap: `sum(count(keyword in content) / len(keyword))`.
///
/// Matching is case-insensitive and counts non-overlapping occurrences.
pub fn keyword_score(keywords: &[String], content: &str) -> f64 {
    let content = content.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| {
            let keyword = k.to_lowercase();
            content.matches(keyword.as_str()).count() as f64 / keyword.chars().count() as f64
        })
        .sum()
}

/// Maps a non-negative score into [0, 1).
pub fn squash(score: f64) -> f64 {
    let score = score.max(0.0);
    score / (1.0 + score)
}
