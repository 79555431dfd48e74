// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decay-weighted aggregation as pure functions.
//!
//! Pattern confidence, node importance, and profile weights are all built
//! from these so each can be tested without a running engine.

use chrono::{DateTime, TimeDelta, Utc};

/// Hours after which the recency factor reaches zero (one week).
pub const RECENCY_WINDOW_HOURS: f64 = 168.0;

/// Occurrences at which the frequency factor saturates.
pub const FREQUENCY_SATURATION: f64 = 10.0;

/// `min(frequency / 10, 1)`.
pub fn frequency_factor(frequency: u64) -> f64 {
    (frequency as f64 / FREQUENCY_SATURATION).min(1.0)
}

/// `max(0, 1 - hours / 168)`. Negative elapsed time counts as zero.
pub fn recency_factor(elapsed: TimeDelta) -> f64 {
    let hours = elapsed.num_milliseconds() as f64 / 3_600_000.0;
    (1.0 - hours.max(0.0) / RECENCY_WINDOW_HOURS).clamp(0.0, 1.0)
}

/// Mean of the frequency and recency factors, in [0, 1].
pub fn pattern_confidence(frequency: u64, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (frequency_factor(frequency) + recency_factor(now - last_seen)) / 2.0
}

/// Exponential running update: moves `old` toward `observation` by `rate`.
///
/// Profile weights are the `(old, observation, elapsed)` aggregation with
/// elapsed time ignored: every observation moves the weight by the same
/// fixed step no matter how long ago the previous one was, and nothing
/// decays between observations. Time-sensitive aggregates (pattern
/// confidence, node importance) take elapsed time through
/// [`recency_factor`] instead.
pub fn running_update(old: f64, observation: f64, rate: f64) -> f64 {
    old + rate.clamp(0.0, 1.0) * (observation - old)
}

/// Averages a re-asserted weight into the existing one.
pub fn average_weight(old: f64, asserted: f64) -> f64 {
    (old + asserted) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_saturates_at_ten() {
        assert_eq!(frequency_factor(0), 0.0);
        assert!((frequency_factor(5) - 0.5).abs() < 1e-12);
        assert_eq!(frequency_factor(10), 1.0);
        assert_eq!(frequency_factor(250), 1.0);
    }

    #[test]
    fn recency_decays_over_a_week() {
        assert_eq!(recency_factor(TimeDelta::zero()), 1.0);
        assert!((recency_factor(TimeDelta::hours(84)) - 0.5).abs() < 1e-9);
        assert_eq!(recency_factor(TimeDelta::hours(168)), 0.0);
        assert_eq!(recency_factor(TimeDelta::days(30)), 0.0);
        assert_eq!(recency_factor(TimeDelta::hours(-3)), 1.0);
    }

    #[test]
    fn fresh_single_occurrence() {
        let now = Utc::now();
        let c = pattern_confidence(1, now, now);
        assert!((c - 0.55).abs() < 1e-9);
    }

    #[test]
    fn running_update_moves_toward_observation() {
        assert!((running_update(1.0, 0.0, 0.2) - 0.8).abs() < 1e-12);
        assert!((running_update(0.5, 1.0, 0.5) - 0.75).abs() < 1e-12);
        assert_eq!(running_update(0.3, 0.9, 0.0), 0.3);
        assert_eq!(running_update(0.3, 0.9, 7.0), 0.9);
    }

    #[test]
    fn only_recency_depends_on_elapsed_time() {
        let now = Utc::now();
        let fresh = pattern_confidence(3, now, now);
        let day_old = pattern_confidence(3, now - TimeDelta::days(1), now);
        assert!(day_old < fresh);
        // Two feedback steps land on the same weight whatever their spacing.
        let twice = running_update(running_update(1.0, 0.0, 0.2), 0.0, 0.2);
        assert!((twice - 0.64).abs() < 1e-12);
    }

    #[test]
    fn average_weight_is_midpoint() {
        assert!((average_weight(0.2, 0.6) - 0.4).abs() < 1e-12);
    }
}
