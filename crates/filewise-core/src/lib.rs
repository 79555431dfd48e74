// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Filewise recommendation engine.
//!
//! Provides the error taxonomy, the domain types that flow between crates
//! (events, candidates, file metadata), and the collaborator traits the
//! engine consumes.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{FilewiseError, Result};
pub use traits::{EmbeddingProvider, PluginAdapter, RequestProcessor};
pub use types::{
    AdapterType, Candidate, EventKind, FileMetadata, HealthStatus, InteractionEvent,
    GLOBAL_SUBJECT,
};
