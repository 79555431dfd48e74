// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `filewise replay` command implementation.
//!
//! Feeds a JSON-lines event log (and optionally a JSON-lines index of file
//! contents) through a fresh engine, retrains once, and prints predictions
//! and recommendations per subject.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::Args;
use filewise_config::FilewiseConfig;
use filewise_core::{Candidate, FileMetadata, FilewiseError, InteractionEvent, GLOBAL_SUBJECT};
use filewise_engine::{EngineMetrics, FilewiseEngine};
use filewise_search::SearchOptions;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file of interaction events, oldest first.
    pub events: PathBuf,

    /// JSON-lines file of `{path, content, metadata}` entries to index first.
    #[arg(long)]
    pub index: Option<PathBuf>,

    /// Only report on this subject.
    #[arg(long)]
    pub subject: Option<String>,

    /// Run this search after the replay.
    #[arg(long)]
    pub query: Option<String>,

    /// Output JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// One line of the index file.
#[derive(Debug, Deserialize)]
pub struct IndexEntry {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: FileMetadata,
}

#[derive(Debug, Serialize)]
pub struct SubjectReport {
    pub subject: String,
    pub predictions: Vec<Candidate>,
    pub recommendations: Vec<Candidate>,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub recorded: usize,
    pub rejected: usize,
    pub indexed: usize,
    pub subjects: Vec<SubjectReport>,
    pub search: Option<Vec<Candidate>>,
    pub metrics: EngineMetrics,
}

/// Parses JSON lines, skipping blank lines and `#` comments.
pub fn parse_lines<T: for<'de> Deserialize<'de>>(content: &str) -> Result<Vec<T>, FilewiseError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| FilewiseError::Validation(format!("line {}: {e}", n + 1)))
        })
        .collect()
}

async fn read(path: &Path) -> Result<String, FilewiseError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FilewiseError::Storage { source: Box::new(e) })
}

/// Replays `events` (after indexing `entries`) and builds the report.
pub async fn replay(
    engine: &FilewiseEngine,
    entries: Vec<IndexEntry>,
    events: Vec<InteractionEvent>,
    subject: Option<&str>,
    query: Option<&str>,
) -> Result<ReplayReport, FilewiseError> {
    let mut indexed = 0;
    for entry in entries {
        match engine.index_file(&entry.path, &entry.content, entry.metadata).await {
            Ok(_) => indexed += 1,
            Err(e) if e.is_validation() => warn!(path = %entry.path, error = %e, "skipping index entry"),
            Err(e) => return Err(e),
        }
    }

    let mut subjects = BTreeSet::new();
    let (mut recorded, mut rejected) = (0, 0);
    for event in events {
        let who = event.subject.clone();
        match engine.record_interaction(event).await {
            Ok(()) => {
                recorded += 1;
                subjects.insert(who);
            }
            Err(e) => {
                rejected += 1;
                warn!(error = %e, "skipping event");
            }
        }
    }
    engine.retrain().await?;
    info!(recorded, rejected, indexed, "replay finished");

    let wanted: Vec<String> = match subject {
        Some(subject) => vec![subject.to_string()],
        None => subjects.into_iter().collect(),
    };
    let mut reports = Vec::with_capacity(wanted.len());
    for subject in wanted {
        reports.push(SubjectReport {
            predictions: engine.predict_next_access(&subject, None).await?,
            recommendations: engine.get_recommendations(&subject, None).await?,
            subject,
        });
    }

    let search = match query {
        Some(query) => {
            let who = subject.unwrap_or(GLOBAL_SUBJECT);
            Some(engine.search(query, who, &SearchOptions::default(), None).await?)
        }
        None => None,
    };

    Ok(ReplayReport {
        recorded,
        rejected,
        indexed,
        subjects: reports,
        search,
        metrics: engine.get_metrics().await,
    })
}

/// Run the `filewise replay` command.
pub async fn run_replay(config: FilewiseConfig, args: ReplayArgs) -> Result<(), FilewiseError> {
    let engine = FilewiseEngine::builder(config).build()?;

    let entries = match &args.index {
        Some(path) => parse_lines(&read(path).await?)?,
        None => Vec::new(),
    };
    let events = parse_lines(&read(&args.events).await?)?;

    let report = replay(
        &engine,
        entries,
        events,
        args.subject.as_deref(),
        args.query.as_deref(),
    )
    .await?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| FilewiseError::Internal(format!("failed to encode report: {e}")))?;
        println!("{json}");
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ReplayReport) {
    println!(
        "replayed {} events ({} rejected), indexed {} files",
        report.recorded, report.rejected, report.indexed
    );
    for subject in &report.subjects {
        println!("\n{}", subject.subject);
        print_candidates("  next", &subject.predictions);
        print_candidates("  recommended", &subject.recommendations);
    }
    if let Some(results) = &report.search {
        println!();
        print_candidates("search", results);
    }
}

fn print_candidates(label: &str, candidates: &[Candidate]) {
    if candidates.is_empty() {
        println!("{label}: (none)");
        return;
    }
    println!("{label}:");
    for candidate in candidates {
        println!(
            "    {:.2}  {}  [{}] {}",
            candidate.confidence, candidate.path, candidate.source, candidate.reasoning
        );
    }
}
