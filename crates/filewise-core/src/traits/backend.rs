// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque request processor behind the externally-backed scoring model.

use async_trait::async_trait;

use crate::error::FilewiseError;
use crate::traits::adapter::PluginAdapter;

/// Processes an opaque JSON request and returns an opaque JSON response.
///
/// The core never interprets anything about the backend beyond the
/// request/response shapes the external scoring model defines.
#[async_trait]
pub trait RequestProcessor: PluginAdapter {
    async fn process(
        &self,
        request: serde_json::Value,
    ) -> Result<serde_json::Value, FilewiseError>;
}
