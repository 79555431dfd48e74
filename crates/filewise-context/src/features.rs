// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transient context features, recomputed per request.

use std::borrow::Borrow;
use std::collections::HashSet;

use chrono::{DateTime, Datelike, TimeDelta, Timelike, Utc, Weekday};
use filewise_config::model::ContextConfig;
use filewise_core::types::parent_dir;
use filewise_core::{EventKind, InteractionEvent};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Variety below which a subject is considered focused.
const FOCUSED_BELOW: f64 = 0.3;
/// Variety above which a subject is considered exploratory.
const EXPLORATORY_ABOVE: f64 = 0.7;

/// How broadly the subject is working right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkMode {
    Focused,
    Exploratory,
    Collaborative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFeatures {
    /// Hour of day (UTC), 0-23.
    pub hour: u32,
    pub weekday: Weekday,
    /// Most recently accessed distinct paths, newest first.
    pub recent_files: Vec<String>,
    pub active_project: Option<String>,
    pub work_mode: WorkMode,
    /// Distinct files over events in the work-mode window.
    pub file_variety: f64,
}

pub fn classify_work_mode(file_variety: f64) -> WorkMode {
    if file_variety < FOCUSED_BELOW {
        WorkMode::Focused
    } else if file_variety > EXPLORATORY_ABOVE {
        WorkMode::Exploratory
    } else {
        WorkMode::Collaborative
    }
}

/// Derives context from a subject's history (oldest first) at `now`.
///
/// Pure: reads nothing but its arguments, so repeated calls with the same
/// inputs return identical features.
pub fn compute_context<E: Borrow<InteractionEvent>>(
    now: DateTime<Utc>,
    events: &[E],
    config: &ContextConfig,
) -> ContextFeatures {
    let past = || {
        events
            .iter()
            .map(as_event)
            .rev()
            .filter(move |e| e.timestamp <= now)
    };

    let cutoff = TimeDelta::from_std(config.work_mode_window())
        .ok()
        .and_then(|w| now.checked_sub_signed(w))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut total = 0usize;
    let mut distinct = HashSet::new();
    for event in past()
        .take_while(|e| e.timestamp >= cutoff)
        .filter(|e| e.kind != EventKind::Search)
    {
        total += 1;
        distinct.insert(event.path.as_str());
    }
    let file_variety = if total == 0 {
        0.0
    } else {
        distinct.len() as f64 / total as f64
    };

    let mut seen = HashSet::new();
    let recent_files: Vec<String> = past()
        .filter(|e| e.kind.is_access())
        .filter(|e| seen.insert(e.path.as_str()))
        .take(config.recent_files)
        .map(|e| e.path.clone())
        .collect();

    ContextFeatures {
        hour: now.hour(),
        weekday: now.weekday(),
        active_project: active_project(past()),
        recent_files,
        work_mode: classify_work_mode(file_variety),
        file_variety,
    }
}

fn as_event<E: Borrow<InteractionEvent>>(event: &E) -> &InteractionEvent {
    event.borrow()
}

fn active_project<'a>(mut newest_first: impl Iterator<Item = &'a InteractionEvent>) -> Option<String> {
    let newest = newest_first.find(|e| e.kind != EventKind::Search)?;
    newest
        .context
        .get("project")
        .or_else(|| newest.context.get("cwd"))
        .cloned()
        .or_else(|| parent_dir(&newest.path).map(str::to_string))
}
