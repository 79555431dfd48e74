// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted backend for the external scoring model.

use std::collections::VecDeque;

use async_trait::async_trait;
use filewise_core::{AdapterType, FilewiseError, HealthStatus, PluginAdapter, RequestProcessor};
use serde_json::{json, Value};
use tokio::sync::Mutex;

/// Replies are popped from a FIFO queue; an empty queue answers with no
/// predictions. Every request is kept for inspection.
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<Value, String>>>,
    requests: Mutex<Vec<Value>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues a response listing `(path, confidence)` predictions.
    pub async fn push_predictions(&self, predictions: &[(&str, f64)]) {
        let predictions: Vec<Value> = predictions
            .iter()
            .map(|(path, confidence)| {
                json!({ "path": path, "confidence": confidence, "reason": "backend says so" })
            })
            .collect();
        self.push_reply(json!({ "predictions": predictions })).await;
    }

    pub async fn push_reply(&self, reply: Value) {
        self.replies.lock().await.push_back(Ok(reply));
    }

    /// Queues a failure.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.replies.lock().await.push_back(Err(message.into()));
    }

    pub async fn requests(&self) -> Vec<Value> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Backend
    }

    async fn health_check(&self) -> Result<HealthStatus, FilewiseError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl RequestProcessor for MockBackend {
    async fn process(&self, request: Value) -> Result<Value, FilewiseError> {
        self.requests.lock().await.push(request);
        match self.replies.lock().await.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(FilewiseError::collaborator(message)),
            None => Ok(json!({ "predictions": [] })),
        }
    }
}
