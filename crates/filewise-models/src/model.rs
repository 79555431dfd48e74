// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The scoring model capability and the inputs it scores against.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filewise_context::{ContextFeatures, Profile};
use filewise_core::{Candidate, FilewiseError, InteractionEvent};

/// One independently scoring member of the ensemble.
///
/// Models own their trained state. `score` must stay cheap and must not
/// wait on `train`.
#[async_trait]
pub trait ScoringModel: Send + Sync {
    /// Unique name; used for weight overrides and candidate attribution.
    fn name(&self) -> &str;

    /// Candidates for the context, at most `ctx.limit`, strongest first.
    async fn score(&self, ctx: &ScoringContext) -> Result<Vec<Candidate>, FilewiseError>;

    /// Refreshes internal state from the global history (oldest first).
    async fn train(&self, history: &[InteractionEvent]) -> Result<(), FilewiseError>;

    /// Self-measured accuracy in [0, 1], or `None` until it is known.
    fn accuracy(&self) -> Option<f64>;
}

/// Everything a model may read for one request.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub subject: String,
    pub now: DateTime<Utc>,
    pub features: ContextFeatures,
    /// The subject's history, oldest first.
    pub history: Arc<Vec<InteractionEvent>>,
    pub profile: Option<Profile>,
    /// Per-model candidate cap.
    pub limit: usize,
}

impl ScoringContext {
    /// Paths the subject has accessed.
    pub fn touched(&self) -> HashSet<&str> {
        self.history
            .iter()
            .filter(|e| e.kind.is_access())
            .map(|e| e.path.as_str())
            .collect()
    }
}

/// Result of the last training pass, published atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelStats {
    pub accuracy: Option<f64>,
    /// Back-test predictions the accuracy was measured on.
    pub trials: usize,
    pub trained_at: Option<DateTime<Utc>>,
}
