// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider trait for vector generation.

use async_trait::async_trait;

use crate::error::FilewiseError;
use crate::traits::adapter::PluginAdapter;

/// Produces an embedding vector for a piece of text.
///
/// Callers always wrap this in a short timeout and treat any failure as
/// "no vector available".
#[async_trait]
pub trait EmbeddingProvider: PluginAdapter {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, FilewiseError>;
}
