// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Filewise engine.
//!
//! [`FilewiseEngine`] owns every component (history, pattern learner,
//! profiles, file graph, vector store, both model registries) and exposes
//! the request operations: recording interactions, recommending,
//! predicting the next access, and searching.

pub mod engine;
pub mod metrics;
pub mod recording;
pub mod retrain;

pub use engine::{EngineBuilder, FilewiseEngine};
pub use metrics::EngineMetrics;
