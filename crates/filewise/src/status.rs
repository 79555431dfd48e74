// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `filewise status` command implementation.

use filewise_config::FilewiseConfig;
use filewise_core::{FilewiseError, HealthStatus};
use filewise_engine::FilewiseEngine;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub name: String,
    pub role: &'static str,
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub models: Vec<ModelStatus>,
    pub collaborators: Vec<(String, String)>,
    pub config: FilewiseConfig,
}

/// Collect model weights, collaborator health, and the effective config.
pub async fn collect(engine: &FilewiseEngine) -> StatusResponse {
    let mut models = Vec::new();
    for (role, registry) in [
        ("predictor", engine.predictors()),
        ("recommender", engine.recommenders()),
    ] {
        models.extend(registry.names().into_iter().map(|name| ModelStatus {
            name: name.to_string(),
            role,
            weight: registry.weight(name),
        }));
    }

    let collaborators = engine
        .health()
        .await
        .into_iter()
        .map(|(name, status)| (name, describe(&status)))
        .collect();

    StatusResponse {
        models,
        collaborators,
        config: engine.config().clone(),
    }
}

fn describe(status: &HealthStatus) -> String {
    match status {
        HealthStatus::Healthy => "healthy".to_string(),
        HealthStatus::Degraded(reason) => format!("degraded: {reason}"),
        HealthStatus::Unhealthy(reason) => format!("unhealthy: {reason}"),
    }
}

/// Run the `filewise status` command.
pub async fn run_status(config: FilewiseConfig, json: bool) -> Result<(), FilewiseError> {
    let engine = FilewiseEngine::builder(config).build()?;
    let status = collect(&engine).await;

    if json {
        let out = serde_json::to_string_pretty(&status)
            .map_err(|e| FilewiseError::Internal(format!("failed to encode status: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    println!("models:");
    for model in &status.models {
        println!("  {:<12} {:<16} weight {:.2}", model.role, model.name, model.weight);
    }
    if status.collaborators.is_empty() {
        println!("collaborators: none configured");
    } else {
        println!("collaborators:");
        for (name, health) in &status.collaborators {
            println!("  {name}: {health}");
        }
    }
    let config = toml::to_string_pretty(&status.config)
        .map_err(|e| FilewiseError::Internal(format!("failed to render config: {e}")))?;
    println!("\n{config}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filewise_test_utils::TestHarness;

    #[tokio::test]
    async fn lists_every_builtin_model() {
        let engine = FilewiseEngine::builder(FilewiseConfig::default())
            .build()
            .unwrap();
        let status = collect(&engine).await;
        let names: Vec<_> = status.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "frequency",
                "pattern",
                "temporal",
                "context",
                "popularity",
                "similar_content",
                "co_access"
            ]
        );
        assert!(status.models.iter().all(|m| m.weight == 1.0));
        assert!(status.collaborators.is_empty());
    }

    #[tokio::test]
    async fn pinned_weights_and_collaborators_show_up() {
        let mut config = FilewiseConfig::default();
        config.ranking.model_weights.insert("frequency".into(), 0.25);
        let harness = TestHarness::builder()
            .with_config(config)
            .with_backend()
            .build()
            .unwrap();
        let status = collect(&harness.engine).await;

        let frequency = status.models.iter().find(|m| m.name == "frequency").unwrap();
        assert_eq!(frequency.weight, 0.25);
        assert!(status.models.iter().any(|m| m.name == "external"));
        let names: Vec<_> = status.collaborators.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["mock-embedder", "mock-backend"]);
        assert!(status.collaborators.iter().all(|(_, h)| h == "healthy"));
    }

    #[tokio::test]
    async fn status_renders_as_json() {
        let engine = FilewiseEngine::builder(FilewiseConfig::default())
            .build()
            .unwrap();
        let json = serde_json::to_value(collect(&engine).await).unwrap();
        assert_eq!(json["config"]["ranking"]["max_results"], 10);
        assert_eq!(json["models"][0]["role"], "predictor");
    }
}
