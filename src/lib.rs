//! Semantic clustering and similarity analysis over article embeddings
//! linked by a citation graph.

pub mod cluster;
pub mod config;
pub mod display;
pub mod error;
pub mod gap;
pub mod io;
pub mod naming;
pub mod search;
pub mod service;
pub mod store;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use config::{ClusteringConfig, GapConfig, SearchConfig, SearchRequest, Settings};
pub use error::{AnalysisError, AnalysisResult};
pub use service::{AnalysisService, ClusteringReport, GapReport, SearchReport};
pub use types::{
    ArticleId, Cluster, ClusterName, EmbeddingRecord, GapCandidate, ScopeId, SearchGroup,
    SearchHit,
};
pub use vector::ClusterId;
