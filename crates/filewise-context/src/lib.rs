// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context features and learned per-subject profiles.

pub mod features;
pub mod profile;

pub use features::{classify_work_mode, compute_context, ContextFeatures, WorkMode};
pub use profile::{Profile, ProfileStore};
