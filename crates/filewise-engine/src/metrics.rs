// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process operation counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time view of the engine's counters and sizes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineMetrics {
    /// Interactions recorded plus recommend, predict, and search calls.
    pub total_ops: u64,
    pub accepted_count: u64,
    pub rejected_count: u64,
    /// Accepted share of recommendation feedback; `None` before any.
    pub accuracy: Option<f64>,
    pub model_count: usize,
    pub history_size: usize,
    pub vector_count: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    total_ops: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl Counters {
    pub(crate) fn op(&self) {
        self.total_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn feedback(&self, accepted: bool) {
        let counter = if accepted {
            &self.accepted
        } else {
            &self.rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        model_count: usize,
        history_size: usize,
        vector_count: usize,
    ) -> EngineMetrics {
        let accepted = self.accepted.load(Ordering::Relaxed);
        let rejected = self.rejected.load(Ordering::Relaxed);
        let judged = accepted + rejected;
        EngineMetrics {
            total_ops: self.total_ops.load(Ordering::Relaxed),
            accepted_count: accepted,
            rejected_count: rejected,
            accuracy: (judged > 0).then(|| accepted as f64 / judged as f64),
            model_count,
            history_size,
            vector_count,
        }
    }
}
