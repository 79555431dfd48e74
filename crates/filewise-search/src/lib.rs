// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval for the Filewise engine.
//!
//! Files are indexed with an optional embedding into the [`VectorStore`].
//! Free-text queries go through the [`QueryProcessor`] and are answered by
//! [`SemanticSearch`]: cosine similarity when the query has a vector,
//! keyword overlap when it does not. Both paths yield the same
//! [`Candidate`](filewise_core::Candidate) shape.

pub mod query;
pub mod search;
pub mod similarity;
pub mod store;

pub use query::{Intent, ProcessedQuery, QueryProcessor};
pub use search::{SearchOptions, SemanticSearch};
pub use similarity::{cosine_similarity, keyword_score, squash};
pub use store::{IndexedFile, VectorStore};
