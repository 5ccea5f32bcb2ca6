//! Clustering of article embeddings.
//!
//! `engine` partitions a snapshot with cosine k-means; `centrality` and
//! `keywords` turn each raw cluster into something a reader can label.

mod centrality;
mod engine;
mod keywords;
mod seed;

pub use centrality::{Centrality, most_central};
pub use engine::{
    ClusterDraft, ClusterEngine, ClusterParams, ClusteringOutcome, DEFAULT_MAX_ITERATIONS,
};
pub use keywords::{MAX_KEYWORDS, MAX_TITLES, extract_keywords};
pub use seed::{RngSeedSource, SeedSource};
