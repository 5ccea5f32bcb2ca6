//! Persistence of finished clusterings.
//!
//! A clustering run replaces the scope's previous clusters in a single
//! swap; readers see either the old set or the new one, never a mix.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{Cluster, ScopeId};

/// Write access to clustering results.
pub trait ClusterStore: Send + Sync {
    /// Atomically replace every cluster of `scope` with `clusters`.
    fn replace_clusters(&self, scope: &ScopeId, clusters: Vec<Cluster>) -> AnalysisResult<()>;

    /// Current clusters of `scope`; empty when it was never clustered.
    fn get_clusters(&self, scope: &ScopeId) -> AnalysisResult<Arc<[Cluster]>>;
}

/// Process-local cluster store.
#[derive(Debug, Default)]
pub struct MemoryClusterStore {
    scopes: RwLock<HashMap<ScopeId, Arc<[Cluster]>>>,
}

impl MemoryClusterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClusterStore for MemoryClusterStore {
    fn replace_clusters(&self, scope: &ScopeId, clusters: Vec<Cluster>) -> AnalysisResult<()> {
        let clusters: Arc<[Cluster]> = clusters.into();
        self.scopes.write().insert(scope.clone(), clusters);
        Ok(())
    }

    fn get_clusters(&self, scope: &ScopeId) -> AnalysisResult<Arc<[Cluster]>> {
        Ok(self
            .scopes
            .read()
            .get(scope)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new())))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredClusters {
    scope: ScopeId,
    updated_at: DateTime<Utc>,
    clusters: Vec<Cluster>,
}

/// Cluster store writing one JSON file per scope.
///
/// Files are written to a temporary file in the same directory and renamed
/// into place, so a crash mid-write leaves the previous clustering intact.
#[derive(Debug, Clone)]
pub struct FileClusterStore {
    dir: PathBuf,
}

impl FileClusterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `scope`'s clusters.
    ///
    /// ASCII letters, digits and `-` are kept; every other byte is written
    /// as `_XX` in hex, so distinct scopes never share a file.
    pub fn scope_path(&self, scope: &ScopeId) -> PathBuf {
        let mut name = String::with_capacity(scope.as_str().len());
        for byte in scope.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("_{byte:02X}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }
}

impl ClusterStore for FileClusterStore {
    fn replace_clusters(&self, scope: &ScopeId, clusters: Vec<Cluster>) -> AnalysisResult<()> {
        let write_error = |e: &dyn std::fmt::Display| {
            AnalysisError::storage(
                format!("Failed to write clusters for '{scope}': {e}"),
                "Check disk space and permissions for cluster_dir",
            )
        };

        fs::create_dir_all(&self.dir).map_err(|e| write_error(&e))?;

        let stored = StoredClusters {
            scope: scope.clone(),
            updated_at: Utc::now(),
            clusters,
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|e| write_error(&e))?;

        let mut file = NamedTempFile::new_in(&self.dir).map_err(|e| write_error(&e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| write_error(&e))?;
        file.as_file().sync_all().map_err(|e| write_error(&e))?;

        let path = self.scope_path(scope);
        file.persist(&path).map_err(|e| write_error(&e.error))?;

        debug!(
            "Stored {} clusters for '{scope}' at {}",
            stored.clusters.len(),
            path.display()
        );
        Ok(())
    }

    fn get_clusters(&self, scope: &ScopeId) -> AnalysisResult<Arc<[Cluster]>> {
        let path = self.scope_path(scope);
        if !path.exists() {
            return Ok(Arc::from(Vec::new()));
        }

        let json = fs::read_to_string(&path).map_err(|e| {
            AnalysisError::storage(
                format!("Failed to read clusters at '{}': {e}", path.display()),
                "Check permissions for cluster_dir",
            )
        })?;
        let stored: StoredClusters = serde_json::from_str(&json).map_err(|e| {
            AnalysisError::storage(
                format!("Failed to parse clusters at '{}': {e}", path.display()),
                "Delete the file and run 'citelens cluster' again",
            )
        })?;

        if stored.scope != *scope {
            return Err(AnalysisError::storage(
                format!(
                    "Cluster file '{}' belongs to scope '{}', not '{scope}'",
                    path.display(),
                    stored.scope
                ),
                "Delete the file and run 'citelens cluster' again",
            ));
        }

        Ok(stored.clusters.into())
    }
}
