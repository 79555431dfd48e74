// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoring models for the Filewise ensemble.
//!
//! Every model implements [`ScoringModel`]. The [`ModelRegistry`] holds
//! them in registration order, weights their candidates, and absorbs their
//! failures so one broken model never fails a request.

pub mod backtest;
pub mod external;
pub mod model;
pub mod predictors;
pub mod recommenders;
pub mod registry;

pub use external::ExternalModel;
pub use model::{ModelStats, ScoringContext, ScoringModel};
pub use predictors::{ContextAwareModel, FrequencyModel, PatternModel, TemporalModel};
pub use recommenders::{CoAccessModel, PopularityModel, SimilarContentModel};
pub use registry::ModelRegistry;
