//! Degree-sum centrality for picking a cluster's representative article.

use rayon::prelude::*;

use crate::vector::cosine_similarity;

/// The most central member of a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centrality {
    /// Position of the member in the slice passed to [`most_central`]
    pub index: usize,

    /// Sum of cosine similarities to every other member
    pub score: f32,
}

/// Returns the member with the highest degree-sum centrality.
///
/// Ties go to the member that appears first. A singleton is its own centre
/// with score 0; an empty slice has no centre.
pub fn most_central(vectors: &[&[f32]]) -> Option<Centrality> {
    let scores: Vec<f32> = (0..vectors.len())
        .into_par_iter()
        .map(|i| {
            vectors
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| cosine_similarity(vectors[i], other))
                .sum()
        })
        .collect();

    let mut best: Option<Centrality> = None;
    for (index, &score) in scores.iter().enumerate() {
        if best.is_none_or(|b| score > b.score) {
            best = Some(Centrality { index, score });
        }
    }
    best
}
