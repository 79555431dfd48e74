// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine assembly and the request operations.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use filewise_config::validation::validate_config;
use filewise_config::FilewiseConfig;
use filewise_context::{compute_context, ContextFeatures, Profile, ProfileStore};
use filewise_core::types::parent_dir;
use filewise_core::{
    Candidate, EmbeddingProvider, EventKind, FileMetadata, FilewiseError, HealthStatus,
    InteractionEvent, RequestProcessor, Result,
};
use filewise_history::decay::recency_factor;
use filewise_history::{EdgeKind, FileGraph, HistoryStore, PatternLearner};
use filewise_models::{
    CoAccessModel, ContextAwareModel, ExternalModel, FrequencyModel, ModelRegistry, PatternModel,
    PopularityModel, ScoringContext, ScoringModel, SimilarContentModel, TemporalModel,
};
use filewise_ranking::{finalize, personalize, RankingEngine};
use filewise_search::{QueryProcessor, SearchOptions, SemanticSearch, VectorStore};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::metrics::{Counters, EngineMetrics};
use crate::recording;

/// Weight of the edge between two files of the same project.
const PROJECT_EDGE_WEIGHT: f64 = 0.5;
/// Similar-content edges added per indexed file.
const SIMILAR_NEIGHBORS: usize = 5;

/// Collects collaborators and extra models before assembling the engine.
pub struct EngineBuilder {
    config: FilewiseConfig,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    backend: Option<Arc<dyn RequestProcessor>>,
    predictors: Vec<Arc<dyn ScoringModel>>,
    recommenders: Vec<Arc<dyn ScoringModel>>,
}

impl EngineBuilder {
    pub fn new(config: FilewiseConfig) -> Self {
        Self {
            config,
            embedder: None,
            backend: None,
            predictors: Vec::new(),
            recommenders: Vec::new(),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Backend for the external model. Only used when `external.enabled`.
    pub fn with_backend(mut self, backend: Arc<dyn RequestProcessor>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Adds a model to the next-access ensemble, after the built-ins.
    pub fn with_predictor(mut self, model: Arc<dyn ScoringModel>) -> Self {
        self.predictors.push(model);
        self
    }

    /// Adds a model to the recommendation ensemble, after the built-ins.
    pub fn with_recommender(mut self, model: Arc<dyn ScoringModel>) -> Self {
        self.recommenders.push(model);
        self
    }

    /// Validates the configuration and wires every component.
    pub fn build(self) -> Result<FilewiseEngine> {
        let config = self.config;
        validate_config(&config).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            FilewiseError::Config(messages.join("; "))
        })?;

        let history = Arc::new(HistoryStore::new(&config.history));
        let learner = Arc::new(PatternLearner::new(&config.learning));
        let graph = Arc::new(FileGraph::new());
        let store = Arc::new(VectorStore::new(&config.search));
        let recent_window = config.history.recent_window();

        let mut predictors = ModelRegistry::from_config(&config.ranking);
        predictors.register(Arc::new(FrequencyModel::new()))?;
        predictors.register(Arc::new(PatternModel::new(Arc::clone(&learner))))?;
        predictors.register(Arc::new(TemporalModel::new(&config.models)))?;
        predictors.register(Arc::new(ContextAwareModel::new(&config.context, recent_window)))?;
        if config.external.enabled {
            match &self.backend {
                Some(backend) => predictors.register(Arc::new(ExternalModel::new(
                    Arc::clone(backend),
                    &config.external,
                )))?,
                None => warn!("external model enabled without a backend, skipping it"),
            }
        }
        for model in self.predictors {
            predictors.register(model)?;
        }

        let mut recommenders = ModelRegistry::from_config(&config.ranking);
        recommenders.register(Arc::new(PopularityModel::new(
            Arc::clone(&history),
            recent_window,
        )))?;
        recommenders.register(Arc::new(SimilarContentModel::new(
            Arc::clone(&store),
            config.search.min_similarity,
        )))?;
        recommenders.register(Arc::new(CoAccessModel::new(Arc::clone(&graph))))?;
        for model in self.recommenders {
            recommenders.register(model)?;
        }

        info!(
            predictors = ?predictors.names(),
            recommenders = ?recommenders.names(),
            embedder = self.embedder.is_some(),
            "engine assembled"
        );

        Ok(FilewiseEngine {
            queries: QueryProcessor::new(self.embedder.clone(), &config.search),
            search: SemanticSearch::new(Arc::clone(&store), &config.search),
            ranking: RankingEngine::new(&config.ranking),
            profiles: Arc::new(ProfileStore::new()),
            predictors: Arc::new(predictors),
            recommenders: Arc::new(recommenders),
            embedder: self.embedder,
            backend: self.backend,
            ingest: Mutex::new(()),
            counters: Counters::default(),
            history,
            learner,
            graph,
            store,
            config,
        })
    }
}

/// The shared Filewise service.
///
/// Queries run concurrently. Recording, indexing, and retraining take the
/// ingest lock one at a time.
pub struct FilewiseEngine {
    config: FilewiseConfig,
    history: Arc<HistoryStore>,
    learner: Arc<PatternLearner>,
    profiles: Arc<ProfileStore>,
    graph: Arc<FileGraph>,
    store: Arc<VectorStore>,
    predictors: Arc<ModelRegistry>,
    recommenders: Arc<ModelRegistry>,
    ranking: RankingEngine,
    queries: QueryProcessor,
    search: SemanticSearch,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    backend: Option<Arc<dyn RequestProcessor>>,
    ingest: Mutex<()>,
    counters: Counters,
}

impl FilewiseEngine {
    pub fn builder(config: FilewiseConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn config(&self) -> &FilewiseConfig {
        &self.config
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn graph(&self) -> &Arc<FileGraph> {
        &self.graph
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    pub fn predictors(&self) -> &Arc<ModelRegistry> {
        &self.predictors
    }

    pub fn recommenders(&self) -> &Arc<ModelRegistry> {
        &self.recommenders
    }

    /// Appends an event and folds it into patterns, the profile, and the
    /// file graph.
    pub async fn record_interaction(&self, event: InteractionEvent) -> Result<()> {
        event.validate()?;
        let started = Instant::now();
        let result = {
            let _ingest = self.ingest.lock().await;
            self.ingest_event(&event).await
        };
        self.finish("record_interaction", started, &result);
        result
    }

    async fn ingest_event(&self, event: &InteractionEvent) -> Result<()> {
        self.history.append(event.clone()).await?;
        let subject_events = self.history.subject_events(&event.subject).await;

        if self.config.learning.enabled {
            self.learner
                .learn(&event.subject, &subject_events, Utc::now())
                .await;
        }

        let indexed = match event.kind {
            EventKind::Search => None,
            _ => self.store.get(&event.path).await,
        };
        let tags = indexed
            .as_ref()
            .map(|file| file.metadata.tags.clone())
            .unwrap_or_default();
        let embedding = indexed.as_ref().and_then(|file| file.vector.as_deref());
        self.profiles.update_on_event(event, &tags, embedding).await;

        if event.kind.is_access() {
            self.link(event, &subject_events).await;
        }
        if event.kind.is_feedback() {
            let accepted = event.kind == EventKind::AcceptRecommendation;
            self.counters.feedback(accepted);
            recording::record_feedback(accepted);
        }

        recording::record_interaction(&event.kind.to_string());
        recording::set_history_size(self.history.len().await);
        debug!(subject = %event.subject, path = %event.path, kind = %event.kind, "interaction recorded");
        Ok(())
    }

    /// Adds the graph edges an access implies: a sequence edge from the
    /// previous access and project edges to recent files of the same project.
    async fn link(&self, event: &InteractionEvent, subject_events: &[InteractionEvent]) {
        self.graph.touch(&event.path, event.timestamp).await;

        let earlier: Vec<&InteractionEvent> = subject_events
            .iter()
            .rev()
            .filter(|e| e.kind.is_access() && e.id != event.id && e.timestamp <= event.timestamp)
            .collect();

        if let Some(previous) = earlier.first() {
            if previous.path != event.path {
                let weight = recency_factor(event.timestamp - previous.timestamp);
                self.graph
                    .assert_edge(&previous.path, &event.path, EdgeKind::Sequence, weight)
                    .await;
            }
        }

        let Some(project) = project_of(event) else {
            return;
        };
        let mut seen: Vec<&str> = Vec::new();
        for other in earlier {
            if seen.len() >= self.config.context.recent_files {
                break;
            }
            if other.path == event.path || seen.contains(&other.path.as_str()) {
                continue;
            }
            seen.push(&other.path);
            if project_of(other).as_deref() == Some(project.as_str()) {
                self.graph
                    .assert_edge(&event.path, &other.path, EdgeKind::Project, PROJECT_EDGE_WEIGHT)
                    .await;
                self.graph
                    .assert_edge(&other.path, &event.path, EdgeKind::Project, PROJECT_EDGE_WEIGHT)
                    .await;
            }
        }
    }

    /// Files the subject has not touched yet, strongest first.
    pub async fn get_recommendations(
        &self,
        subject: &str,
        deadline: Option<Duration>,
    ) -> Result<Vec<Candidate>> {
        check_subject(subject)?;
        self.run("get_recommendations", deadline, async {
            let ctx = self.scoring_context(subject).await;
            let touched = ctx.touched();
            let mut candidates = self.recommenders.score_all(&ctx).await;
            candidates.retain(|c| !touched.contains(c.path.as_str()));
            Ok(self.ranking.rank(candidates))
        })
        .await
    }

    /// Files the subject is likely to open next, strongest first.
    pub async fn predict_next_access(
        &self,
        subject: &str,
        deadline: Option<Duration>,
    ) -> Result<Vec<Candidate>> {
        check_subject(subject)?;
        self.run("predict_next_access", deadline, async {
            let ctx = self.scoring_context(subject).await;
            let candidates = self.predictors.score_all(&ctx).await;
            Ok(self.ranking.rank(candidates))
        })
        .await
    }

    /// Indexed files relevant to `query`, personalized for `subject`.
    pub async fn search(
        &self,
        query: &str,
        subject: &str,
        options: &SearchOptions,
        deadline: Option<Duration>,
    ) -> Result<Vec<Candidate>> {
        check_subject(subject)?;
        self.run("search", deadline, async {
            let processed = self.queries.process(query).await?;
            let now = Utc::now();
            let hits = self.search.search(&processed, options, now).await?;
            let profile = self.profiles.get(subject).await;
            let ranked = personalize(hits, profile.as_ref(), now);
            let max_results = options.max_results.unwrap_or(self.config.search.max_results);
            Ok(finalize(ranked, self.config.search.min_relevance, max_results))
        })
        .await
    }

    /// Adds or replaces a file in the vector store and links it to its
    /// nearest neighbours. Returns the new index version.
    pub async fn index_file(
        &self,
        path: &str,
        content: &str,
        metadata: FileMetadata,
    ) -> Result<u64> {
        let started = Instant::now();
        let result = {
            let _ingest = self.ingest.lock().await;
            self.index(path, content, metadata).await
        };
        self.finish("index_file", started, &result);
        result
    }

    async fn index(&self, path: &str, content: &str, metadata: FileMetadata) -> Result<u64> {
        let vector = self.embed_content(path, content).await;
        let has_vector = vector.is_some();
        let version = self.store.upsert(path, vector, content, metadata).await?;

        if has_vector {
            let min_similarity = self.config.search.min_similarity;
            for hit in self.store.nearest(path, SIMILAR_NEIGHBORS, min_similarity).await {
                let weight = hit.similarity.unwrap_or(hit.confidence);
                self.graph
                    .assert_edge(path, &hit.path, EdgeKind::Similar, weight)
                    .await;
                self.graph
                    .assert_edge(&hit.path, path, EdgeKind::Similar, weight)
                    .await;
            }
        }
        recording::set_indexed_files(self.store.len().await);
        Ok(version)
    }

    async fn embed_content(&self, path: &str, content: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        if content.trim().is_empty() {
            return None;
        }
        let timeout = self.config.search.embed_timeout();
        match tokio::time::timeout(timeout, embedder.embed(content)).await {
            Ok(Ok(vector)) if !vector.is_empty() && vector.iter().all(|x| x.is_finite()) => {
                Some(vector)
            }
            Ok(Ok(_)) => {
                warn!(
                    path,
                    provider = embedder.name(),
                    "unusable content embedding, indexing for keywords only"
                );
                None
            }
            Ok(Err(e)) => {
                warn!(
                    path,
                    provider = embedder.name(),
                    error = %e,
                    "content embedding failed, indexing for keywords only"
                );
                None
            }
            Err(_) => {
                warn!(
                    path,
                    provider = embedder.name(),
                    "content embedding timed out, indexing for keywords only"
                );
                None
            }
        }
    }

    /// The subject's profile, created empty on first use.
    pub async fn profile(&self, subject: &str) -> Profile {
        self.profiles.get_or_create(subject).await
    }

    /// Context features for the subject as of now.
    pub async fn context(&self, subject: &str) -> ContextFeatures {
        let events = self.history.subject_events(subject).await;
        compute_context(Utc::now(), &events, &self.config.context)
    }

    pub async fn get_metrics(&self) -> EngineMetrics {
        self.counters.snapshot(
            self.predictors.len() + self.recommenders.len(),
            self.history.len().await,
            self.store.len().await,
        )
    }

    /// Retrains every model on a snapshot of the global history.
    ///
    /// Also re-mines access patterns when inline learning is off, so the
    /// pattern model still has tables to read. Graph paths that left both
    /// the history and the index are pruned afterwards.
    pub async fn retrain(&self) -> Result<()> {
        let started = Instant::now();
        let _ingest = self.ingest.lock().await;
        let snapshot = self.history.global_events().await;

        if !self.config.learning.enabled {
            let now = Utc::now();
            for (subject, events) in self.history.snapshot().await {
                self.learner.learn(&subject, &events, now).await;
            }
        }

        let trained = self.predictors.train_all(&snapshot).await
            + self.recommenders.train_all(&snapshot).await;
        self.prune().await;
        info!(
            events = snapshot.len(),
            trained,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "models retrained"
        );
        Ok(())
    }

    /// Drops graph paths that left both the history and the index.
    async fn prune(&self) {
        let mut live = self.history.live_paths().await;
        live.extend(self.store.paths().await);
        let removed = self.graph.retain_paths(|path| live.contains(path)).await;
        if removed > 0 {
            let nodes = self.graph.node_count().await;
            debug!(removed, nodes, "pruned stale graph paths");
        }
    }

    /// Health of each configured collaborator.
    pub async fn health(&self) -> Vec<(String, HealthStatus)> {
        let mut report = Vec::new();
        if let Some(embedder) = &self.embedder {
            let status = embedder.health_check().await;
            report.push((embedder.name().to_string(), unwrap_status(status)));
        }
        if let Some(backend) = &self.backend {
            let status = backend.health_check().await;
            report.push((backend.name().to_string(), unwrap_status(status)));
        }
        report
    }

    async fn scoring_context(&self, subject: &str) -> ScoringContext {
        let now = Utc::now();
        let history = self.history.subject_events(subject).await;
        let features = compute_context(now, &history, &self.config.context);
        ScoringContext {
            subject: subject.to_string(),
            now,
            features,
            history: Arc::new(history),
            profile: self.profiles.get(subject).await,
            limit: self.config.models.candidates_per_model,
        }
    }

    /// Runs `work` under the caller's deadline, or the configured default.
    async fn run<T, F>(&self, operation: &'static str, deadline: Option<Duration>, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let limit = deadline.unwrap_or_else(|| self.config.engine.request_timeout());
        let result = match tokio::time::timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms = limit.as_millis() as u64, "deadline expired");
                Err(FilewiseError::Timeout { duration: limit })
            }
        };
        self.finish(operation, started, &result);
        result
    }

    fn finish<T>(&self, operation: &'static str, started: Instant, result: &Result<T>) {
        self.counters.op();
        let outcome = if result.is_ok() { "ok" } else { "error" };
        recording::record_operation(operation, outcome, started.elapsed().as_secs_f64());
    }
}

fn check_subject(subject: &str) -> Result<()> {
    if subject.trim().is_empty() {
        return Err(FilewiseError::Validation(
            "subject must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Project an event belongs to: its `project` context, else its directory.
fn project_of(event: &InteractionEvent) -> Option<String> {
    event
        .context
        .get("project")
        .cloned()
        .or_else(|| parent_dir(&event.path).map(str::to_string))
}

fn unwrap_status(result: Result<HealthStatus>) -> HealthStatus {
    result.unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn engine() -> FilewiseEngine {
        FilewiseEngine::builder(FilewiseConfig::default())
            .build()
            .unwrap()
    }

    #[test]
    fn builder_registers_the_built_in_models() {
        let engine = engine();
        assert_eq!(
            engine.predictors().names(),
            ["frequency", "pattern", "temporal", "context"]
        );
        assert_eq!(
            engine.recommenders().names(),
            ["popularity", "similar_content", "co_access"]
        );
    }

    #[test]
    fn invalid_config_is_rejected_at_build() {
        let mut config = FilewiseConfig::default();
        config.history.capacity = 0;
        let err = FilewiseEngine::builder(config).build().err().unwrap();
        assert!(matches!(err, FilewiseError::Config(_)));
    }

    #[test]
    fn project_prefers_context_over_directory() {
        let plain = InteractionEvent::new("u1", "src/lib.rs", EventKind::Open);
        assert_eq!(project_of(&plain).as_deref(), Some("src"));
        let tagged = plain.with_context("project", "filewise");
        assert_eq!(project_of(&tagged).as_deref(), Some("filewise"));
        let bare = InteractionEvent::new("u1", "README", EventKind::Open);
        assert_eq!(project_of(&bare), None);
    }

    #[tokio::test]
    async fn empty_subject_is_a_validation_error() {
        let engine = engine();
        let err = engine.predict_next_access(" ", None).await.unwrap_err();
        assert!(err.is_validation());
        assert!(engine.get_recommendations("", None).await.is_err());
        let err = engine
            .search("release notes", "", &SearchOptions::default(), None)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(engine.get_metrics().await.total_ops, 0);
    }

    #[tokio::test]
    async fn accesses_build_sequence_and_project_edges() {
        let engine = engine();
        for path in ["src/a.rs", "src/b.rs"] {
            engine
                .record_interaction(InteractionEvent::new("u1", path, EventKind::Open))
                .await
                .unwrap();
        }
        let neighbors = engine.graph().neighbors("src/a.rs").await;
        let kinds: Vec<_> = neighbors.iter().map(|n| n.kind).collect();
        assert!(kinds.contains(&EdgeKind::Sequence));
        assert!(kinds.contains(&EdgeKind::Project));
        let back = engine.graph().neighbors("src/b.rs").await;
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].kind, EdgeKind::Project);
    }

    #[tokio::test]
    async fn feedback_feeds_the_metrics() {
        let engine = engine();
        let events = [
            ("a.md", EventKind::AcceptRecommendation),
            ("b.md", EventKind::RejectRecommendation),
            ("c.md", EventKind::AcceptRecommendation),
        ];
        for (path, kind) in events {
            engine
                .record_interaction(InteractionEvent::new("u1", path, kind))
                .await
                .unwrap();
        }
        let metrics = engine.get_metrics().await;
        assert_eq!(metrics.accepted_count, 2);
        assert_eq!(metrics.rejected_count, 1);
        assert_eq!(metrics.total_ops, 3);
        assert_eq!(metrics.history_size, 3);
        assert_eq!(metrics.model_count, 7);
    }

    #[tokio::test]
    async fn keyword_indexing_needs_no_embedder() {
        let engine = engine();
        let version = engine
            .index_file("notes/todo.md", "buy milk and eggs", FileMetadata::default())
            .await
            .unwrap();
        assert_eq!(version, 1);
        let results = engine
            .search("milk", "u1", &SearchOptions::default(), None)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, "notes/todo.md");
    }

    #[tokio::test]
    async fn pinned_weights_come_from_config() {
        let mut config = FilewiseConfig::default();
        config.ranking.model_weights = BTreeMap::from([("temporal".to_string(), 0.2)]);
        let engine = FilewiseEngine::builder(config).build().unwrap();
        assert_eq!(engine.predictors().weight("temporal"), 0.2);
        assert_eq!(engine.predictors().weight("frequency"), 1.0);
    }
}
