// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Filewise integration tests.
//!
//! Deterministic stand-ins for the collaborators plus a harness that wires
//! a full engine around them.
//!
//! # Components
//!
//! - [`MockEmbedder`] - bag-of-words embedding provider with failure modes
//! - [`MockBackend`] - scripted backend for the external scoring model
//! - [`EventBuilder`] - fluent construction of interaction events
//! - [`TestHarness`] - an engine plus its mocks

pub mod events;
pub mod harness;
pub mod mock_backend;
pub mod mock_embedder;

pub use events::EventBuilder;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_backend::MockBackend;
pub use mock_embedder::MockEmbedder;
