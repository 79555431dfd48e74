// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The core only talks to the outside world through these traits. All of
//! them extend [`PluginAdapter`] and use `#[async_trait]` so they can be
//! held as `Arc<dyn ...>`.

pub mod adapter;
pub mod backend;
pub mod embedding;

pub use adapter::PluginAdapter;
pub use backend::RequestProcessor;
pub use embedding::EmbeddingProvider;
