// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interaction history for the Filewise engine.
//!
//! Holds the capacity-bounded event logs, the access-pattern learner that
//! mines them, the decay functions both share, and the file relationship
//! graph.

pub mod decay;
pub mod graph;
pub mod log;
pub mod patterns;
pub mod store;

pub use graph::{EdgeKind, FileGraph, FileNode, Neighbor};
pub use log::EventLog;
pub use patterns::{
    access_sequence, find_continuations, mine_patterns, AccessPattern, Continuation,
    PatternLearner,
};
pub use store::HistoryStore;
