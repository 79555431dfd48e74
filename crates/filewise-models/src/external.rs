// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoring model backed by an external request processor.
//!
//! The backend receives the subject's context as JSON and answers with
//! predictions. Anything short of a well-formed answer within the timeout
//! yields no candidates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use filewise_config::model::ExternalConfig;
use filewise_core::{Candidate, FilewiseError, InteractionEvent, RequestProcessor};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{ScoringContext, ScoringModel};

#[derive(Debug, Serialize)]
struct ExternalRequest<'a> {
    subject: &'a str,
    recent_files: &'a [String],
    hour: u32,
    weekday: String,
    work_mode: String,
}

#[derive(Debug, Deserialize)]
struct ExternalResponse {
    #[serde(default)]
    predictions: Vec<ExternalPrediction>,
}

#[derive(Debug, Deserialize)]
struct ExternalPrediction {
    path: String,
    confidence: f64,
    #[serde(default)]
    reason: Option<String>,
}

pub struct ExternalModel {
    backend: Arc<dyn RequestProcessor>,
    timeout: Duration,
}

impl ExternalModel {
    pub const NAME: &'static str = "external";

    pub fn new(backend: Arc<dyn RequestProcessor>, config: &ExternalConfig) -> Self {
        Self {
            backend,
            timeout: config.timeout(),
        }
    }

    async fn request(&self, ctx: &ScoringContext) -> Result<ExternalResponse, FilewiseError> {
        let request = serde_json::to_value(ExternalRequest {
            subject: &ctx.subject,
            recent_files: &ctx.features.recent_files,
            hour: ctx.features.hour,
            weekday: ctx.features.weekday.to_string(),
            work_mode: ctx.features.work_mode.to_string(),
        })
        .map_err(|e| FilewiseError::Internal(format!("failed to encode backend request: {e}")))?;

        let response = tokio::time::timeout(self.timeout, self.backend.process(request))
            .await
            .map_err(|_| FilewiseError::Timeout {
                duration: self.timeout,
            })??;

        serde_json::from_value(response).map_err(|e| FilewiseError::Collaborator {
            message: "backend returned a malformed response".to_string(),
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl ScoringModel for ExternalModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, ctx: &ScoringContext) -> Result<Vec<Candidate>, FilewiseError> {
        match self.request(ctx).await {
            Ok(response) => Ok(response
                .predictions
                .into_iter()
                .filter(|p| !p.path.is_empty() && p.confidence.is_finite())
                .take(ctx.limit)
                .map(|p| {
                    let reason = p.reason.unwrap_or_else(|| "suggested by backend".to_string());
                    Candidate::new(p.path, p.confidence, Self::NAME, reason)
                })
                .collect()),
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "external model unavailable, returning no candidates"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn train(&self, _history: &[InteractionEvent]) -> Result<(), FilewiseError> {
        Ok(())
    }

    fn accuracy(&self) -> Option<f64> {
        None
    }
}
