//! Vector primitives for the analysis engine.
//!
//! Cosine similarity and centroid arithmetic live in `math`; `types` holds
//! the newtypes and errors; `embedding` turns query text into vectors.
//!
//! All similarity work in the crate goes through [`cosine_similarity`], which
//! treats zero-norm or mismatched vectors as unrelated (score 0) instead of
//! failing, so a single malformed embedding never aborts a batch.

mod embedding;
mod math;
mod types;

#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, MAX_EMBED_TEXT_CHARS, embed_one,
    parse_embedding_model,
};
pub use math::{centroid, cosine_similarity, mean_pairwise_similarity, normalize_vector};
pub use types::{
    ClusterId, VECTOR_DIMENSION_384, VectorDimension, VectorError,
};
