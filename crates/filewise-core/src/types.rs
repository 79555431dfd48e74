// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by every Filewise crate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::FilewiseError;

/// Subject id under which the global (all-users) history is kept.
pub const GLOBAL_SUBJECT: &str = "*";

/// Health status reported by collaborator health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Collaborator is fully operational.
    Healthy,
    /// Collaborator is operational but experiencing issues.
    Degraded(String),
    /// Collaborator is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator behind an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum AdapterType {
    /// Produces embedding vectors for text.
    Embedding,
    /// Processes opaque scoring requests for the externally-backed model.
    Backend,
}

/// What the user did to a file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Open,
    Edit,
    Save,
    Close,
    Search,
    AcceptRecommendation,
    RejectRecommendation,
}

impl EventKind {
    /// Kinds that count as touching the target file.
    pub fn is_access(&self) -> bool {
        matches!(
            self,
            EventKind::Open
                | EventKind::Edit
                | EventKind::Save
                | EventKind::Close
                | EventKind::AcceptRecommendation
        )
    }

    /// Kinds that carry feedback on a previous recommendation.
    pub fn is_feedback(&self) -> bool {
        matches!(
            self,
            EventKind::AcceptRecommendation | EventKind::RejectRecommendation
        )
    }
}

/// A single user action on a file. Immutable once appended to history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Unique identifier for this event. Generated when absent.
    #[serde(default = "new_event_id")]
    pub id: String,
    /// User the event belongs to.
    pub subject: String,
    /// Path of the file acted upon (or the query text for `Search`).
    pub path: String,
    /// What happened.
    pub kind: EventKind,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// How long the interaction lasted, in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
    /// Free-form context (e.g. `project`, `cwd`).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl InteractionEvent {
    /// Creates an event stamped with the current time.
    pub fn new(subject: impl Into<String>, path: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: new_event_id(),
            subject: subject.into(),
            path: path.into(),
            kind,
            timestamp: Utc::now(),
            duration_ms: 0,
            context: BTreeMap::new(),
        }
    }

    /// Overrides the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the interaction duration.
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Adds a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Checks the event is well-formed before it is appended anywhere.
    pub fn validate(&self) -> Result<(), FilewiseError> {
        if self.subject.trim().is_empty() {
            return Err(FilewiseError::Validation(
                "event subject must not be empty".to_string(),
            ));
        }
        if self.subject == GLOBAL_SUBJECT {
            return Err(FilewiseError::Validation(format!(
                "event subject `{GLOBAL_SUBJECT}` is reserved"
            )));
        }
        if self.path.trim().is_empty() {
            return Err(FilewiseError::Validation(
                "event path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Lowercased file extension of the target, if any.
    pub fn file_type(&self) -> Option<String> {
        file_type_of(&self.path)
    }
}

fn new_event_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Lowercased extension of a path (`src/main.RS` → `rs`).
pub fn file_type_of(path: &str) -> Option<String> {
    let name = path.rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Parent directory of a path, if it has one.
pub fn parent_dir(path: &str) -> Option<&str> {
    let idx = path.rfind(['/', '\\'])?;
    if idx == 0 {
        return Some(&path[..1]);
    }
    Some(&path[..idx])
}

/// Metadata attached to an indexed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// File type (usually the extension).
    pub file_type: Option<String>,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Last modification time.
    pub modified: Option<DateTime<Utc>>,
    /// Free-form categories.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Importance hint in [0, 1].
    #[serde(default)]
    pub importance: f64,
}

/// A scored, attributable suggestion of a target file.
///
/// The common currency between scoring models, the vector store, and the
/// ranking engine. Predictions, recommendations, and search results all use
/// this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Target file path. Unique within one response.
    pub path: String,
    /// Confidence or relevance in [0, 1].
    pub confidence: f64,
    /// Name of the model that produced it, or `combined`.
    pub source: String,
    /// Human-readable explanation.
    pub reasoning: String,
    pub file_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
    /// Cosine similarity component, when the candidate came from vector search.
    pub similarity: Option<f64>,
}

impl Candidate {
    pub fn new(
        path: impl Into<String>,
        confidence: f64,
        source: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let file_type = file_type_of(&path);
        Self {
            path,
            confidence: confidence.clamp(0.0, 1.0),
            source: source.into(),
            reasoning: reasoning.into(),
            file_type,
            tags: Vec::new(),
            size: None,
            modified: None,
            similarity: None,
        }
    }

    /// Copies type, tags, size, and mtime from indexed metadata.
    pub fn with_metadata(mut self, metadata: &FileMetadata) -> Self {
        if metadata.file_type.is_some() {
            self.file_type = metadata.file_type.clone();
        }
        self.tags = metadata.tags.clone();
        self.size = metadata.size;
        self.modified = metadata.modified;
        self
    }

    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}
