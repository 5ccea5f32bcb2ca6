//! Orchestration of clustering, gap scans and search over the collaborators.
//!
//! Every operation works on a fresh snapshot from the [`EmbeddingStore`].
//! CPU-bound work runs on the blocking pool; the naming and embedding
//! collaborators additionally run under a timeout. Clustering runs for the
//! same scope are serialized so the store only ever sees one full replace
//! at a time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task;
use tokio::time;
use tracing::{debug, info, warn};

use crate::cluster::{
    ClusterEngine, ClusteringOutcome, MAX_TITLES, RngSeedSource, extract_keywords, most_central,
};
use crate::config::{ClusteringConfig, GapConfig, SearchRequest};
use crate::error::{AnalysisError, AnalysisResult};
use crate::gap::{RecordCitationOracle, detect_gaps};
use crate::naming::{NamingService, color_for};
use crate::search::{group_by_cluster, rank};
use crate::store::{ClusterStore, EmbeddingStore};
use crate::types::{
    ArticleId, Cluster, ClusterName, EmbeddingRecord, GapCandidate, ScopeId, SearchGroup,
    SearchHit,
};
use crate::vector::{ClusterId, EmbeddingGenerator, embed_one};

const DEFAULT_NAMING_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one clustering run.
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringReport {
    pub scope: ScopeId,
    pub clusters: Vec<Cluster>,
    pub unassigned_ids: Vec<ArticleId>,

    /// Articles in the snapshot, neighbours included
    pub article_count: usize,
    pub requested_k: usize,
    pub effective_k: usize,

    /// Centroids actually placed; below `effective_k` on duplicate-heavy data
    pub seeded: usize,
    pub iterations: usize,
    pub converged: bool,
    pub generated_at: DateTime<Utc>,
}

impl ClusteringReport {
    /// True when fewer clusters were attempted than requested.
    pub fn k_was_reduced(&self) -> bool {
        self.attempted_k() < self.requested_k
    }

    /// Clusters the run could actually attempt.
    pub fn attempted_k(&self) -> usize {
        self.effective_k.min(self.seeded)
    }
}

/// Gap candidates of one scope.
#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    pub scope: ScopeId,
    pub threshold: f32,
    pub gaps: Vec<GapCandidate>,
}

/// Ranked hits plus the same hits grouped by cluster.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub hits: Vec<SearchHit>,
    pub groups: Vec<SearchGroup>,
}

/// Entry point for every analysis operation.
pub struct AnalysisService {
    embeddings: Arc<dyn EmbeddingStore>,
    clusters: Arc<dyn ClusterStore>,
    namer: Option<Arc<dyn NamingService>>,
    embedder: Option<Arc<dyn EmbeddingGenerator>>,
    naming_timeout: Duration,
    embedding_timeout: Duration,
    scope_locks: DashMap<ScopeId, Arc<Mutex<()>>>,
}

impl AnalysisService {
    pub fn new(embeddings: Arc<dyn EmbeddingStore>, clusters: Arc<dyn ClusterStore>) -> Self {
        Self {
            embeddings,
            clusters,
            namer: None,
            embedder: None,
            naming_timeout: DEFAULT_NAMING_TIMEOUT,
            embedding_timeout: DEFAULT_EMBEDDING_TIMEOUT,
            scope_locks: DashMap::new(),
        }
    }

    /// Attach a naming service, called per cluster with `timeout`.
    pub fn with_naming(mut self, namer: Arc<dyn NamingService>, timeout: Duration) -> Self {
        self.namer = Some(namer);
        self.naming_timeout = timeout;
        self
    }

    /// Attach the query embedding generator used by [`Self::search`].
    pub fn with_embedder(
        mut self,
        embedder: Arc<dyn EmbeddingGenerator>,
        timeout: Duration,
    ) -> Self {
        self.embedder = Some(embedder);
        self.embedding_timeout = timeout;
        self
    }

    fn scope_lock(&self, scope: &ScopeId) -> Arc<Mutex<()>> {
        self.scope_locks.entry(scope.clone()).or_default().clone()
    }

    /// Cluster a scope and replace its stored clusters.
    ///
    /// Validation happens before any data is fetched. Naming failures never
    /// fail the run; the affected cluster is called `Cluster N` instead.
    pub async fn run_clustering(
        &self,
        scope: &ScopeId,
        config: &ClusteringConfig,
    ) -> AnalysisResult<ClusteringReport> {
        config.validate()?;

        let lock = self.scope_lock(scope);
        let _guard = lock.lock().await;

        let records = self.embeddings.fetch_graph_embeddings(scope)?;
        let article_count = records.len();
        info!("Clustering {article_count} articles for scope '{scope}'");

        let engine = ClusterEngine::new(config.params());
        let seed = config.seed;
        let (records, outcome) = task::spawn_blocking(move || {
            let mut seeds = RngSeedSource::from_optional_seed(seed);
            let outcome = engine.run(&records, &mut seeds);
            (records, outcome)
        })
        .await
        .map_err(|e| AnalysisError::computation(format!("clustering task failed: {e}")))?;
        let outcome = outcome?;

        let clusters = self
            .label_clusters(&records, &outcome, config.generate_names)
            .await;
        self.clusters.replace_clusters(scope, clusters.clone())?;

        info!(
            "Scope '{scope}': {} clusters, {} unassigned, converged={}",
            clusters.len(),
            outcome.unassigned_ids.len(),
            outcome.converged
        );

        Ok(ClusteringReport {
            scope: scope.clone(),
            clusters,
            unassigned_ids: outcome.unassigned_ids,
            article_count,
            requested_k: outcome.requested_k,
            effective_k: outcome.effective_k,
            seeded: outcome.seeded,
            iterations: outcome.iterations,
            converged: outcome.converged,
            generated_at: Utc::now(),
        })
    }

    async fn label_clusters(
        &self,
        records: &[EmbeddingRecord],
        outcome: &ClusteringOutcome,
        generate_names: bool,
    ) -> Vec<Cluster> {
        let mut clusters = Vec::with_capacity(outcome.clusters.len());

        for (index, draft) in outcome.clusters.iter().enumerate() {
            let id = ClusterId::from_index(index);
            let vectors: Vec<&[f32]> = draft
                .member_indices
                .iter()
                .map(|&i| records[i].vector.as_slice())
                .collect();
            let central = most_central(&vectors).map(|c| draft.member_indices[c.index]);

            // Central member first, then the rest in input order
            let titles: Vec<String> = central
                .into_iter()
                .chain(draft.member_indices.iter().copied().filter(|&i| Some(i) != central))
                .take(MAX_TITLES)
                .map(|i| records[i].title.clone())
                .collect();

            let keywords = extract_keywords(&titles);
            let name = if generate_names {
                Some(self.name_cluster(id, titles).await)
            } else {
                None
            };

            clusters.push(Cluster {
                id,
                member_ids: draft.member_ids.clone(),
                centroid: draft.centroid.clone(),
                avg_internal_similarity: draft.avg_internal_similarity,
                central_id: central.map(|i| records[i].id.clone()),
                keywords,
                name,
                color: color_for(index).to_string(),
            });
        }

        clusters
    }

    async fn name_cluster(&self, id: ClusterId, titles: Vec<String>) -> ClusterName {
        let Some(namer) = self.namer.clone() else {
            debug!("No naming service configured, using fallback name for cluster {id}");
            return ClusterName::fallback(id);
        };

        let call = task::spawn_blocking(move || namer.name_cluster(&titles));
        match time::timeout(self.naming_timeout, call).await {
            Ok(Ok(Ok(name))) => name,
            Ok(Ok(Err(e))) => {
                warn!("Naming cluster {id} failed: {e}");
                ClusterName::fallback(id)
            }
            Ok(Err(e)) => {
                warn!("Naming task for cluster {id} panicked: {e}");
                ClusterName::fallback(id)
            }
            Err(_) => {
                warn!(
                    "Naming cluster {id} timed out after {}ms",
                    self.naming_timeout.as_millis()
                );
                ClusterName::fallback(id)
            }
        }
    }

    /// Stored clusters of a scope.
    pub fn clusters(&self, scope: &ScopeId) -> AnalysisResult<Arc<[Cluster]>> {
        self.clusters.get_clusters(scope)
    }

    /// Similar article pairs in the scope that do not cite each other.
    pub async fn find_gaps(
        &self,
        scope: &ScopeId,
        config: &GapConfig,
    ) -> AnalysisResult<GapReport> {
        config.validate()?;

        let records = self.embeddings.fetch_graph_embeddings(scope)?;
        let params = config.params();
        let gaps = task::spawn_blocking(move || {
            let oracle = RecordCitationOracle::from_records(&records);
            debug!(
                "Scanning {} articles with {} citation edges",
                records.len(),
                oracle.edge_count()
            );
            detect_gaps(&records, &params, &oracle)
        })
        .await
        .map_err(|e| AnalysisError::computation(format!("gap scan task failed: {e}")))??;

        info!("Scope '{scope}': {} gap candidates", gaps.len());
        Ok(GapReport {
            scope: scope.clone(),
            threshold: config.threshold,
            gaps,
        })
    }

    /// Rank the scope's articles against a text query.
    ///
    /// The query embedding is required; any failure or timeout of the
    /// embedding generator fails the request with `ExternalService`.
    pub async fn search(
        &self,
        scope: &ScopeId,
        request: &SearchRequest,
    ) -> AnalysisResult<SearchReport> {
        request.validate()?;

        let query = self.embed_query(&request.query).await?;
        let corpus = self.embeddings.fetch_graph_embeddings(scope)?;
        let stored = self.clusters.get_clusters(scope)?;

        if let Some(filter) = request.cluster_id {
            if !stored.iter().any(|c| c.id == filter) {
                return Err(AnalysisError::validation(
                    "cluster_id",
                    format!("scope '{scope}' has no cluster {filter}"),
                ));
            }
        }

        let membership: HashMap<ArticleId, ClusterId> = stored
            .iter()
            .flat_map(|c| c.member_ids.iter().map(move |id| (id.clone(), c.id)))
            .collect();

        let hits = rank(&query, &corpus, &request.rank_params(), &membership)?;
        let groups = group_by_cluster(&hits);
        debug!(
            "Search in '{scope}' returned {} hits in {} groups",
            hits.len(),
            groups.len()
        );

        Ok(SearchReport {
            query: request.query.clone(),
            hits,
            groups,
        })
    }

    async fn embed_query(&self, text: &str) -> AnalysisResult<Vec<f32>> {
        let embedder = self.embedder.clone().ok_or_else(|| AnalysisError::ExternalService {
            service: "embedding",
            reason: "no embedding generator configured".to_string(),
        })?;

        let text = text.to_string();
        let call = task::spawn_blocking(move || embed_one(embedder.as_ref(), &text));
        let failure = |reason: String| AnalysisError::ExternalService {
            service: "embedding",
            reason,
        };

        match time::timeout(self.embedding_timeout, call).await {
            Ok(Ok(Ok(vector))) => Ok(vector),
            Ok(Ok(Err(e))) => Err(failure(e.to_string())),
            Ok(Err(e)) => Err(failure(format!("embedding task panicked: {e}"))),
            Err(_) => Err(failure(format!(
                "timed out after {}ms",
                self.embedding_timeout.as_millis()
            ))),
        }
    }
}
