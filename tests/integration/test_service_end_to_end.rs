//! Full runs over a snapshot file and the on-disk cluster store.

use std::sync::Arc;
use std::time::Duration;

use citelens::naming::KeywordNamingService;
use citelens::store::{ClusterStore, FileClusterStore, SnapshotStore};
use citelens::vector::{EmbeddingGenerator, VectorDimension, VectorError};
use citelens::{
    AnalysisError, AnalysisService, ClusteringConfig, GapConfig, ScopeId, SearchConfig,
    SearchRequest,
};
use tempfile::TempDir;

use crate::common::{single_scope, topic_records, write_snapshot};

/// Embeds "axis N" as the unit vector on dimension N.
struct AxisEmbedder {
    dimension: usize,
}

impl EmbeddingGenerator for AxisEmbedder {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        texts
            .iter()
            .map(|text| {
                let axis: usize = text
                    .trim_start_matches("axis ")
                    .parse()
                    .map_err(|_| VectorError::EmbeddingFailed(format!("no axis in '{text}'")))?;
                let mut vector = vec![0.0; self.dimension];
                vector[axis] = 1.0;
                Ok(vector)
            })
            .collect()
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(self.dimension).unwrap()
    }
}

struct Workspace {
    _dir: TempDir,
    service: AnalysisService,
    store: Arc<FileClusterStore>,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap();
    // No noise: every topic is one point, which keeps seeding deterministic
    let snapshot = single_scope("thesis", topic_records(2, 6, 0.0, 1));
    let path = write_snapshot(dir.path(), &snapshot);

    let store = Arc::new(FileClusterStore::new(dir.path().join("clusters")));
    let service = AnalysisService::new(
        Arc::new(SnapshotStore::load(&path).unwrap()),
        store.clone(),
    )
    .with_naming(
        Arc::new(KeywordNamingService::default()),
        Duration::from_secs(5),
    )
    .with_embedder(Arc::new(AxisEmbedder { dimension: 2 }), Duration::from_secs(5));

    Workspace {
        _dir: dir,
        service,
        store,
    }
}

fn config(num_clusters: usize) -> ClusteringConfig {
    ClusteringConfig {
        num_clusters,
        min_cluster_size: 3,
        seed: Some(7),
        ..ClusteringConfig::default()
    }
}

#[tokio::test]
async fn test_clustering_persists_to_disk() {
    let ws = workspace();
    let scope = ScopeId::new("thesis");

    let report = ws.service.run_clustering(&scope, &config(2)).await.unwrap();
    assert_eq!(report.clusters.len(), 2);
    assert_eq!(report.article_count, 12);
    assert!(ws.store.scope_path(&scope).exists());

    // A second store over the same directory sees the saved clusters
    let reopened = FileClusterStore::new(ws.store.dir());
    let stored = reopened.get_clusters(&scope).unwrap();
    assert_eq!(stored.to_vec(), report.clusters);
}

#[tokio::test]
async fn test_rerun_replaces_stored_clusters() {
    let ws = workspace();
    let scope = ScopeId::new("thesis");

    ws.service.run_clustering(&scope, &config(2)).await.unwrap();
    let first = ws.service.clusters(&scope).unwrap();

    // Too much data requested: the run fails and the stored set survives
    let err = ws
        .service
        .run_clustering(
            &scope,
            &ClusteringConfig {
                min_cluster_size: 7,
                ..config(2)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    assert_eq!(ws.service.clusters(&scope).unwrap().to_vec(), first.to_vec());

    let report = ws
        .service
        .run_clustering(
            &scope,
            &ClusteringConfig {
                generate_names: false,
                ..config(2)
            },
        )
        .await
        .unwrap();
    let stored = ws.service.clusters(&scope).unwrap();
    assert_eq!(stored.to_vec(), report.clusters);
    assert!(stored.iter().all(|c| c.name.is_none()));
}

#[tokio::test]
async fn test_unknown_scope_is_storage_error() {
    let ws = workspace();
    let err = ws
        .service
        .run_clustering(&ScopeId::new("missing"), &config(2))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Storage { .. }));
}

#[tokio::test]
async fn test_gaps_and_search_after_clustering() {
    let ws = workspace();
    let scope = ScopeId::new("thesis");
    ws.service.run_clustering(&scope, &config(2)).await.unwrap();

    // Identical vectors inside a topic and no citations at all
    let gaps = ws
        .service
        .find_gaps(
            &scope,
            &GapConfig {
                limit: 200,
                ..GapConfig::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(gaps.gaps.len(), 2 * 15);

    let request = SearchRequest::new("axis 1", &SearchConfig::default());
    let report = ws.service.search(&scope, &request).await.unwrap();
    assert_eq!(report.hits.len(), 6);
    assert!(report.hits.iter().all(|h| h.id.as_str().starts_with("t1-")));
    assert_eq!(report.groups.len(), 1);
    assert!(report.groups[0].cluster_id.is_some());
}
