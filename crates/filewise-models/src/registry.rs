// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Name-indexed set of scoring models with accuracy-driven weighting.
//!
//! The registry is built once at startup and then shared read-only behind an
//! `Arc`. Models keep their own trained state, so scoring needs no lock here.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use filewise_config::model::RankingConfig;
use filewise_core::{Candidate, FilewiseError, InteractionEvent};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::model::{ScoringContext, ScoringModel};

/// Scoring models in registration order.
pub struct ModelRegistry {
    models: Vec<Arc<dyn ScoringModel>>,
    overrides: BTreeMap<String, f64>,
}

impl ModelRegistry {
    /// Creates an empty registry with pinned weights.
    pub fn new(overrides: BTreeMap<String, f64>) -> Self {
        Self {
            models: Vec::new(),
            overrides,
        }
    }

    pub fn from_config(config: &RankingConfig) -> Self {
        Self::new(config.model_weights.clone())
    }

    /// Adds a model. Names must be unique.
    pub fn register(&mut self, model: Arc<dyn ScoringModel>) -> Result<(), FilewiseError> {
        if self.get(model.name()).is_some() {
            return Err(FilewiseError::Validation(format!(
                "model `{}` is already registered",
                model.name()
            )));
        }
        debug!(model = model.name(), "model registered");
        self.models.push(model);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ScoringModel>> {
        self.models.iter().find(|m| m.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Configured override, else self-reported accuracy, else 1.0.
    pub fn weight(&self, name: &str) -> f64 {
        if let Some(weight) = self.overrides.get(name) {
            return *weight;
        }
        self.get(name).and_then(|m| m.accuracy()).unwrap_or(1.0)
    }

    /// Accuracy each model reports, in registration order.
    pub fn accuracies(&self) -> Vec<(String, Option<f64>)> {
        self.models
            .iter()
            .map(|m| (m.name().to_string(), m.accuracy()))
            .collect()
    }

    /// Scores every model concurrently and returns their weighted
    /// candidates in registration order.
    ///
    /// A failing model contributes nothing; the failure is logged and the
    /// other models still count.
    pub async fn score_all(&self, ctx: &ScoringContext) -> Vec<Candidate> {
        let results = join_all(self.models.iter().map(|m| m.score(ctx))).await;

        let mut weighted = Vec::new();
        for (model, result) in self.models.iter().zip(results) {
            let name = model.name();
            let candidates = match result {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(model = name, error = %e, "model scoring failed, ignoring its candidates");
                    continue;
                }
            };
            let weight = self.weight(name);
            let mut seen = HashSet::new();
            weighted.extend(
                candidates
                    .into_iter()
                    .filter(|c| seen.insert(c.path.clone()))
                    .take(ctx.limit)
                    .map(|mut c| {
                        c.confidence = (c.confidence * weight).clamp(0.0, 1.0);
                        c
                    }),
            );
        }
        weighted
    }

    /// Trains every model on the same snapshot. Returns how many succeeded.
    pub async fn train_all(&self, history: &[InteractionEvent]) -> usize {
        let results = join_all(self.models.iter().map(|m| m.train(history))).await;
        let mut trained = 0;
        for (model, result) in self.models.iter().zip(results) {
            match result {
                Ok(()) => trained += 1,
                Err(e) => warn!(model = model.name(), error = %e, "model training failed"),
            }
        }
        trained
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use filewise_config::model::ContextConfig;
    use filewise_context::compute_context;
    use tracing_test::traced_test;

    struct FixedModel {
        name: &'static str,
        accuracy: Option<f64>,
        output: Vec<(&'static str, f64)>,
        fail: bool,
    }

    impl FixedModel {
        fn new(name: &'static str, output: Vec<(&'static str, f64)>) -> Self {
            Self {
                name,
                accuracy: None,
                output,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl ScoringModel for FixedModel {
        fn name(&self) -> &str {
            self.name
        }

        async fn score(&self, _ctx: &ScoringContext) -> Result<Vec<Candidate>, FilewiseError> {
            if self.fail {
                return Err(FilewiseError::Internal("model blew up".into()));
            }
            Ok(self
                .output
                .iter()
                .map(|(path, conf)| Candidate::new(*path, *conf, self.name, "fixed"))
                .collect())
        }

        async fn train(&self, _history: &[InteractionEvent]) -> Result<(), FilewiseError> {
            if self.fail {
                return Err(FilewiseError::Internal("cannot train".into()));
            }
            Ok(())
        }

        fn accuracy(&self) -> Option<f64> {
            self.accuracy
        }
    }

    fn ctx(limit: usize) -> ScoringContext {
        let now = Utc::now();
        ScoringContext {
            subject: "u1".into(),
            now,
            features: compute_context::<InteractionEvent>(now, &[], &ContextConfig::default()),
            history: Arc::new(Vec::new()),
            profile: None,
            limit,
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = ModelRegistry::default();
        registry
            .register(Arc::new(FixedModel::new("a", vec![])))
            .unwrap();
        let err = registry
            .register(Arc::new(FixedModel::new("a", vec![])))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(registry.names(), ["a"]);
    }

    #[test]
    fn weight_prefers_override_then_accuracy() {
        let mut overrides = BTreeMap::new();
        overrides.insert("pinned".to_string(), 0.25);
        let mut registry = ModelRegistry::new(overrides);

        let mut pinned = FixedModel::new("pinned", vec![]);
        pinned.accuracy = Some(0.9);
        let mut measured = FixedModel::new("measured", vec![]);
        measured.accuracy = Some(0.6);
        registry.register(Arc::new(pinned)).unwrap();
        registry.register(Arc::new(measured)).unwrap();
        registry
            .register(Arc::new(FixedModel::new("fresh", vec![])))
            .unwrap();

        assert_eq!(registry.weight("pinned"), 0.25);
        assert_eq!(registry.weight("measured"), 0.6);
        assert_eq!(registry.weight("fresh"), 1.0);
    }

    #[tokio::test]
    async fn score_all_weights_and_keeps_registration_order() {
        let mut registry = ModelRegistry::default();
        let mut half = FixedModel::new("half", vec![("x.rs", 0.8), ("y.rs", 0.4)]);
        half.accuracy = Some(0.5);
        registry.register(Arc::new(half)).unwrap();
        registry
            .register(Arc::new(FixedModel::new("full", vec![("x.rs", 0.6)])))
            .unwrap();

        let out = registry.score_all(&ctx(5)).await;
        let summary: Vec<_> = out
            .iter()
            .map(|c| (c.source.as_str(), c.path.as_str(), c.confidence))
            .collect();
        assert_eq!(
            summary,
            [("half", "x.rs", 0.4), ("half", "y.rs", 0.2), ("full", "x.rs", 0.6)]
        );
    }

    #[tokio::test]
    async fn score_all_caps_each_model() {
        let mut registry = ModelRegistry::default();
        registry
            .register(Arc::new(FixedModel::new(
                "chatty",
                vec![("a", 0.9), ("b", 0.8), ("c", 0.7), ("d", 0.6)],
            )))
            .unwrap();
        assert_eq!(registry.score_all(&ctx(2)).await.len(), 2);
    }

    #[traced_test]
    #[tokio::test]
    async fn failing_model_is_absorbed() {
        let mut registry = ModelRegistry::default();
        let mut broken = FixedModel::new("broken", vec![("a", 0.9)]);
        broken.fail = true;
        registry.register(Arc::new(broken)).unwrap();
        registry
            .register(Arc::new(FixedModel::new("ok", vec![("b", 0.7)])))
            .unwrap();

        let out = registry.score_all(&ctx(5)).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, "b");
        assert!(logs_contain("model scoring failed"));

        assert_eq!(registry.train_all(&[]).await, 1);
        assert!(logs_contain("model training failed"));
    }
}
