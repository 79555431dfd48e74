// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Learned per-subject preferences.
//!
//! Counters are stored raw and normalized when read. Click-through weights
//! and the personal embedding move by running updates, never reset.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Timelike, Utc};
use filewise_core::{EventKind, InteractionEvent};
use filewise_history::decay::running_update;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Rate at which accept/reject feedback moves a click-through weight.
const CLICK_THROUGH_RATE: f64 = 0.2;
/// Rate at which a touched file's embedding pulls the personal embedding.
const EMBEDDING_RATE: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub subject: String,
    pub type_counts: BTreeMap<String, u64>,
    pub category_counts: BTreeMap<String, u64>,
    pub hour_histogram: [u64; 24],
    pub click_through: BTreeMap<String, f64>,
    pub personal_embedding: Option<Vec<f32>>,
    pub interactions: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            type_counts: BTreeMap::new(),
            category_counts: BTreeMap::new(),
            hour_histogram: [0; 24],
            click_through: BTreeMap::new(),
            personal_embedding: None,
            interactions: 0,
            updated_at: None,
        }
    }

    /// Share of accesses that hit this file type.
    pub fn type_weight(&self, file_type: &str) -> f64 {
        share(&self.type_counts, file_type)
    }

    /// Share of accesses in this category, scaled by its click-through.
    pub fn category_weight(&self, category: &str) -> f64 {
        share(&self.category_counts, category) * self.click_through(category)
    }

    /// Click-through weight for a category; 1.0 until feedback arrives.
    pub fn click_through(&self, category: &str) -> f64 {
        self.click_through.get(category).copied().unwrap_or(1.0)
    }

    /// Activity in `hour` relative to the busiest hour, in [0, 1].
    pub fn hour_affinity(&self, hour: u32) -> f64 {
        let peak = self.hour_histogram.iter().copied().max().unwrap_or(0);
        if peak == 0 {
            return 0.0;
        }
        let count = self.hour_histogram.get(hour as usize).copied().unwrap_or(0);
        count as f64 / peak as f64
    }

    /// Folds one event into the profile.
    ///
    /// `tags` are the target's indexed categories; the file type stands in
    /// when there are none. `embedding` is the target's vector, if indexed.
    pub fn apply(&mut self, event: &InteractionEvent, tags: &[String], embedding: Option<&[f32]>) {
        self.interactions += 1;
        self.updated_at = Some(event.timestamp);
        self.hour_histogram[event.timestamp.hour() as usize % 24] += 1;

        if event.kind == EventKind::Search {
            return;
        }

        let file_type = event.file_type();
        let categories: Vec<String> = if tags.is_empty() {
            file_type.iter().cloned().collect()
        } else {
            tags.to_vec()
        };

        if event.kind.is_access() {
            if let Some(file_type) = &file_type {
                *self.type_counts.entry(file_type.clone()).or_insert(0) += 1;
            }
            for category in &categories {
                *self.category_counts.entry(category.clone()).or_insert(0) += 1;
            }
            if let Some(embedding) = embedding {
                self.absorb_embedding(embedding);
            }
        }

        if event.kind.is_feedback() {
            let target = if event.kind == EventKind::AcceptRecommendation {
                1.0
            } else {
                0.0
            };
            for category in categories {
                let weight = self.click_through.entry(category).or_insert(1.0);
                *weight = running_update(*weight, target, CLICK_THROUGH_RATE);
            }
        }
    }

    fn absorb_embedding(&mut self, embedding: &[f32]) {
        match &mut self.personal_embedding {
            Some(current) if current.len() == embedding.len() => {
                for (c, e) in current.iter_mut().zip(embedding) {
                    *c += EMBEDDING_RATE * (e - *c);
                }
            }
            Some(_) => {}
            None => self.personal_embedding = Some(embedding.to_vec()),
        }
    }
}

fn share(counts: &BTreeMap<String, u64>, key: &str) -> f64 {
    let total: u64 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    counts.get(key).copied().unwrap_or(0) as f64 / total as f64
}

/// Profiles keyed by subject, created on first use.
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The subject's profile, creating an empty one if none exists.
    pub async fn get_or_create(&self, subject: &str) -> Profile {
        if let Some(profile) = self.profiles.read().await.get(subject) {
            return profile.clone();
        }
        let mut profiles = self.profiles.write().await;
        profiles
            .entry(subject.to_string())
            .or_insert_with(|| {
                debug!(subject, "profile created");
                Profile::new(subject)
            })
            .clone()
    }

    pub async fn get(&self, subject: &str) -> Option<Profile> {
        self.profiles.read().await.get(subject).cloned()
    }

    pub async fn update_on_event(
        &self,
        event: &InteractionEvent,
        tags: &[String],
        embedding: Option<&[f32]>,
    ) {
        let mut profiles = self.profiles.write().await;
        profiles
            .entry(event.subject.clone())
            .or_insert_with(|| Profile::new(event.subject.clone()))
            .apply(event, tags, embedding);
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}
