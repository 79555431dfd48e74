// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns weighted per-model candidates into one ranked response.

pub mod combine;
pub mod personalize;

pub use combine::{combine, finalize, RankingEngine, COMBINED_SOURCE};
pub use personalize::{personal_score, personalize, recency_score};
