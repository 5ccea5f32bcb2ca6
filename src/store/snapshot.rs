//! JSON snapshot backed embedding store.
//!
//! The snapshot file has the shape
//! `{"articles": [EmbeddingRecord...], "scopes": {"<scope>": ["<id>"...]}}`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::store::EmbeddingStore;
use crate::types::{ArticleId, EmbeddingRecord, ScopeId};

/// On-disk snapshot of articles and the scopes that own them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub articles: Vec<EmbeddingRecord>,

    #[serde(default)]
    pub scopes: BTreeMap<ScopeId, Vec<ArticleId>>,
}

/// [`EmbeddingStore`] over an in-memory [`Snapshot`].
#[derive(Debug)]
pub struct SnapshotStore {
    articles: Vec<EmbeddingRecord>,
    by_id: HashMap<ArticleId, usize>,
    scopes: BTreeMap<ScopeId, Vec<ArticleId>>,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        let mut by_id = HashMap::with_capacity(snapshot.articles.len());
        for (index, record) in snapshot.articles.iter().enumerate() {
            if by_id.insert(record.id.clone(), index).is_some() {
                warn!("Article '{}' appears twice in the snapshot, keeping the last", record.id);
            }
        }
        Self {
            articles: snapshot.articles,
            by_id,
            scopes: snapshot.scopes,
        }
    }

    /// Load a snapshot file from disk.
    pub fn load(path: &Path) -> AnalysisResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            AnalysisError::storage(
                format!("Failed to read snapshot '{}': {e}", path.display()),
                "Check snapshot_path in settings.toml or pass --config",
            )
        })?;
        let snapshot: Snapshot = serde_json::from_str(&json).map_err(|e| {
            AnalysisError::storage(
                format!("Failed to parse snapshot '{}': {e}", path.display()),
                "The snapshot must be a JSON object with 'articles' and 'scopes'",
            )
        })?;

        debug!(
            "Loaded snapshot with {} articles in {} scopes",
            snapshot.articles.len(),
            snapshot.scopes.len()
        );
        Ok(Self::new(snapshot))
    }

    pub fn article_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn scope_ids(&self) -> impl Iterator<Item = &ScopeId> {
        self.scopes.keys()
    }

    fn record(&self, id: &ArticleId) -> Option<&EmbeddingRecord> {
        self.by_id.get(id).map(|&index| &self.articles[index])
    }
}

impl EmbeddingStore for SnapshotStore {
    fn fetch_graph_embeddings(&self, scope: &ScopeId) -> AnalysisResult<Vec<EmbeddingRecord>> {
        let own = self.scopes.get(scope).ok_or_else(|| {
            AnalysisError::storage(
                format!("Unknown scope '{scope}'"),
                "Check the scope name against the 'scopes' keys of the snapshot",
            )
        })?;

        let own_ids: HashSet<&ArticleId> = own.iter().collect();
        let mut seen: HashSet<&ArticleId> = HashSet::new();
        let mut records = Vec::new();

        for id in own {
            match self.record(id) {
                Some(record) => {
                    if seen.insert(&record.id) {
                        records.push(record.clone());
                    }
                }
                None => debug!("Scope '{scope}' lists '{id}' but the snapshot has no embedding"),
            }
        }

        let own_count = records.len();

        // Neighbours in snapshot order: anything an own article cites or is
        // cited by, whichever side recorded the edge
        for record in &self.articles {
            if seen.contains(&record.id) {
                continue;
            }
            let linked = record
                .references
                .iter()
                .chain(record.cited_by.iter())
                .any(|id| own_ids.contains(id))
                || own.iter().filter_map(|id| self.record(id)).any(|o| {
                    o.references.contains(&record.id) || o.cited_by.contains(&record.id)
                });
            if linked && seen.insert(&record.id) {
                records.push(record.clone());
            }
        }

        debug!(
            "Scope '{scope}': {own_count} own articles, {} neighbours",
            records.len() - own_count
        );
        Ok(records)
    }

    fn fetch_embedding(&self, id: &ArticleId) -> AnalysisResult<Option<Vec<f32>>> {
        Ok(self.record(id).map(|record| record.vector.clone()))
    }
}
