// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{HashMap, HashSet};

use filewise_core::Candidate;
use filewise_ranking::{combine, finalize};
use proptest::prelude::*;

fn candidates() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec((0usize..6, 0.0f64..=1.0), 0..30).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (slot, confidence))| {
                Candidate::new(format!("file{slot}.rs"), confidence, format!("m{i}"), "r")
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn combined_paths_are_unique_and_sorted(input in candidates()) {
        let merged = combine(input);
        let unique: HashSet<_> = merged.iter().map(|c| c.path.clone()).collect();
        prop_assert_eq!(unique.len(), merged.len());
        for pair in merged.windows(2) {
            prop_assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn combined_confidence_is_the_mean(input in candidates()) {
        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
        for c in &input {
            let entry = sums.entry(c.path.clone()).or_insert((0.0, 0));
            entry.0 += c.confidence;
            entry.1 += 1;
        }
        for c in combine(input) {
            let (sum, n) = sums[&c.path];
            prop_assert!((c.confidence - sum / n as f64).abs() < 1e-9);
            prop_assert_eq!(c.source == "combined", n > 1);
        }
    }

    #[test]
    fn finalize_filters_then_truncates(
        input in candidates(),
        min in 0.0f64..=1.0,
        max in 0usize..8,
    ) {
        let sorted = combine(input);
        let passing = sorted.iter().filter(|c| c.confidence >= min).count();
        let kept = finalize(sorted, min, max);
        prop_assert_eq!(kept.len(), passing.min(max));
        prop_assert!(kept.iter().all(|c| c.confidence >= min));
    }
}
