// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine tests.
//!
//! `TestHarness` assembles a complete engine around a [`MockEmbedder`] and,
//! when asked, a [`MockBackend`] for the external model.

use std::sync::Arc;

use filewise_config::FilewiseConfig;
use filewise_core::{FileMetadata, FilewiseError, InteractionEvent};
use filewise_engine::FilewiseEngine;

use crate::events::EventBuilder;
use crate::mock_backend::MockBackend;
use crate::mock_embedder::MockEmbedder;

pub struct TestHarnessBuilder {
    config: FilewiseConfig,
    embedder: Option<MockEmbedder>,
    backend: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: FilewiseConfig::default(),
            embedder: Some(MockEmbedder::new()),
            backend: false,
        }
    }

    pub fn with_config(mut self, config: FilewiseConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default embedder.
    pub fn with_embedder(mut self, embedder: MockEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Runs with keyword search only.
    pub fn without_embedder(mut self) -> Self {
        self.embedder = None;
        self
    }

    /// Enables the external model behind a [`MockBackend`].
    pub fn with_backend(mut self) -> Self {
        self.backend = true;
        self
    }

    pub fn build(self) -> Result<TestHarness, FilewiseError> {
        let mut config = self.config;
        let embedder = self.embedder.map(Arc::new);
        let backend = self.backend.then(|| Arc::new(MockBackend::new()));

        if backend.is_some() {
            config.external.enabled = true;
        }
        let mut builder = FilewiseEngine::builder(config);
        if let Some(embedder) = &embedder {
            builder = builder.with_embedder(embedder.clone());
        }
        if let Some(backend) = &backend {
            builder = builder.with_backend(backend.clone());
        }

        Ok(TestHarness {
            engine: Arc::new(builder.build()?),
            embedder,
            backend,
        })
    }
}

pub struct TestHarness {
    pub engine: Arc<FilewiseEngine>,
    pub embedder: Option<Arc<MockEmbedder>>,
    pub backend: Option<Arc<MockBackend>>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Default configuration with the mock embedder.
    pub fn new() -> Result<Self, FilewiseError> {
        Self::builder().build()
    }

    /// Records an `Open` of `path` by `subject`, stamped now.
    pub async fn open(&self, subject: &str, path: &str) -> Result<(), FilewiseError> {
        self.engine
            .record_interaction(EventBuilder::new(path).subject(subject).build())
            .await
    }

    pub async fn record(&self, event: InteractionEvent) -> Result<(), FilewiseError> {
        self.engine.record_interaction(event).await
    }

    /// Records opens of `paths` by `subject`, a minute apart, ending now.
    pub async fn open_sequence(&self, subject: &str, paths: &[&str]) -> Result<(), FilewiseError> {
        for event in EventBuilder::sequence(subject, paths) {
            self.engine.record_interaction(event).await?;
        }
        Ok(())
    }

    /// Indexes `path` with `content` and the given tags.
    pub async fn index(&self, path: &str, content: &str, tags: &[&str]) -> Result<u64, FilewiseError> {
        let metadata = FileMetadata {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            size: Some(content.len() as u64),
            ..Default::default()
        };
        self.engine.index_file(path, content, metadata).await
    }
}
