//! Storage collaborators.
//!
//! The engine never owns data: embeddings are read from an
//! [`EmbeddingStore`] snapshot and finished clusters are handed to a
//! [`ClusterStore`], which replaces a scope's clustering in one swap.

mod cluster_store;
mod snapshot;

pub use cluster_store::{ClusterStore, FileClusterStore, MemoryClusterStore};
pub use snapshot::{Snapshot, SnapshotStore};

use crate::error::AnalysisResult;
use crate::types::{ArticleId, EmbeddingRecord, ScopeId};

/// Read access to article embeddings.
pub trait EmbeddingStore: Send + Sync {
    /// Embeddings of the scope's own articles plus their one-hop citation
    /// neighbours (both directions), each article at most once.
    fn fetch_graph_embeddings(&self, scope: &ScopeId) -> AnalysisResult<Vec<EmbeddingRecord>>;

    /// Embedding of a single article, if the store has one.
    fn fetch_embedding(&self, id: &ArticleId) -> AnalysisResult<Option<Vec<f32>>>;
}
