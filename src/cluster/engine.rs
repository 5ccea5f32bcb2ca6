//! Cosine k-means with k-means++ seeding and a similarity gate.
//!
//! # Algorithm Details
//! - Similarity metric: cosine similarity
//! - Initialization: k-means++ with probability proportional to cosine
//!   distance (`1 - max similarity to the chosen seeds`)
//! - Assignment: nearest centroid, but only when the similarity reaches
//!   `min_similarity`; everything else stays unassigned for the iteration
//! - Update: centroid = arithmetic mean of its current members; a centroid
//!   that loses all members keeps its previous position
//! - Stop: assignment unchanged, or `max_iterations` reached (best effort)
//!
//! Clusters smaller than `min_cluster_size` are dissolved after the loop and
//! their members reported as unassigned.
//!
//! # Performance Characteristics
//! - O(n * k * d * iterations) time
//! - Assignment step runs on the rayon pool

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cluster::seed::SeedSource;
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{ArticleId, EmbeddingRecord};
use crate::vector::{centroid, cosine_similarity, mean_pairwise_similarity};

/// Default iteration budget for the assignment/update loop.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Cosine distances below this count as "same point" during seeding.
const MIN_SEED_DISTANCE: f32 = 1e-6;

/// Parameters of one clustering run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    /// Requested number of clusters
    pub k: usize,

    /// Clusters smaller than this are dissolved
    pub min_cluster_size: usize,

    /// Minimum cosine similarity to join a centroid
    pub min_similarity: f32,

    pub max_iterations: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            k: 5,
            min_cluster_size: 3,
            min_similarity: 0.6,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// A cluster as produced by the engine, before ids and labels are attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterDraft {
    /// Member ids in input order
    pub member_ids: Vec<ArticleId>,

    /// Positions of the members in the input slice
    #[serde(skip)]
    pub member_indices: Vec<usize>,

    pub centroid: Vec<f32>,
    pub avg_internal_similarity: f32,
}

/// Result of [`ClusterEngine::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteringOutcome {
    pub clusters: Vec<ClusterDraft>,

    /// Ids that ended up in no cluster, in input order
    pub unassigned_ids: Vec<ArticleId>,

    pub requested_k: usize,

    /// `min(requested_k, n / min_cluster_size)`
    pub effective_k: usize,

    /// Number of seeds actually placed; lower than `effective_k` when the
    /// data ran out of distinct points
    pub seeded: usize,

    pub iterations: usize,
    pub converged: bool,
}

impl ClusteringOutcome {
    /// True when the data could not support the requested cluster count.
    pub fn k_was_reduced(&self) -> bool {
        self.effective_k < self.requested_k || self.seeded < self.effective_k
    }
}

/// Partitions an embedding snapshot into clusters.
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    params: ClusterParams,
}

impl ClusterEngine {
    pub fn new(params: ClusterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    /// Runs one clustering pass over `records`.
    ///
    /// # Errors
    /// - `InsufficientData` when fewer than `2 * min_cluster_size` records
    /// - `Computation` when the records do not share one dimension
    /// - `Validation` for a zero `k` or `min_cluster_size`
    pub fn run(
        &self,
        records: &[EmbeddingRecord],
        seeds: &mut dyn SeedSource,
    ) -> AnalysisResult<ClusteringOutcome> {
        let params = self.params;
        if params.k == 0 {
            return Err(AnalysisError::validation("k", "must be at least 1"));
        }
        if params.min_cluster_size == 0 {
            return Err(AnalysisError::validation(
                "min_cluster_size",
                "must be at least 1",
            ));
        }

        let n = records.len();
        let required = 2 * params.min_cluster_size;
        if n < required {
            return Err(AnalysisError::InsufficientData {
                actual: n,
                required,
            });
        }

        let dimension = records[0].vector.len();
        if let Some(bad) = records.iter().find(|r| r.vector.len() != dimension) {
            return Err(AnalysisError::computation(format!(
                "embedding for '{}' has dimension {}, expected {dimension}",
                bad.id,
                bad.vector.len()
            )));
        }

        let effective_k = params.k.min(n / params.min_cluster_size);
        if effective_k < params.k {
            warn!(
                "Requested {} clusters but {n} embeddings with min cluster size {} support only {effective_k}",
                params.k, params.min_cluster_size
            );
        }

        let vectors: Vec<&[f32]> = records.iter().map(|r| r.vector.as_slice()).collect();
        let mut centroids = seed_centroids(&vectors, effective_k, seeds);
        let seeded = centroids.len();

        let mut assignments: Vec<Option<usize>> = vec![None; n];
        let mut iterations = 0;
        let mut converged = false;

        for _ in 0..params.max_iterations.max(1) {
            iterations += 1;
            let next = assign_to_centroids(&vectors, &centroids, params.min_similarity);

            if next == assignments {
                converged = true;
                break;
            }

            assignments = next;
            update_centroids(&vectors, &assignments, &mut centroids);
        }

        if converged {
            debug!("K-means converged after {iterations} iterations");
        } else {
            debug!("K-means stopped at the {iterations} iteration budget without converging");
        }

        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); centroids.len()];
        let mut unassigned: Vec<usize> = Vec::new();
        for (index, assignment) in assignments.iter().enumerate() {
            match assignment {
                Some(cluster) => groups[*cluster].push(index),
                None => unassigned.push(index),
            }
        }

        let mut clusters = Vec::with_capacity(groups.len());
        for group in groups {
            if group.len() < params.min_cluster_size {
                if !group.is_empty() {
                    debug!(
                        "Dissolving cluster of {} (< {})",
                        group.len(),
                        params.min_cluster_size
                    );
                }
                unassigned.extend(group);
                continue;
            }
            clusters.push(build_draft(records, &vectors, group)?);
        }
        unassigned.sort_unstable();

        Ok(ClusteringOutcome {
            clusters,
            unassigned_ids: unassigned.into_iter().map(|i| records[i].id.clone()).collect(),
            requested_k: params.k,
            effective_k,
            seeded,
            iterations,
            converged,
        })
    }
}

fn build_draft(
    records: &[EmbeddingRecord],
    vectors: &[&[f32]],
    members: Vec<usize>,
) -> AnalysisResult<ClusterDraft> {
    let member_vectors: Vec<&[f32]> = members.iter().map(|&i| vectors[i]).collect();
    let mean = centroid(member_vectors.iter().copied())
        .ok_or_else(|| AnalysisError::computation("cluster centroid could not be computed"))?;

    Ok(ClusterDraft {
        member_ids: members.iter().map(|&i| records[i].id.clone()).collect(),
        avg_internal_similarity: mean_pairwise_similarity(&member_vectors),
        centroid: mean,
        member_indices: members,
    })
}

/// Picks up to `k` seed vectors with k-means++.
///
/// The first seed is uniform; every further seed is drawn with probability
/// proportional to its cosine distance from the closest existing seed.
/// Seeding stops early when no unchosen point has positive distance.
fn seed_centroids(vectors: &[&[f32]], k: usize, seeds: &mut dyn SeedSource) -> Vec<Vec<f32>> {
    let n = vectors.len();
    let mut chosen: Vec<usize> = Vec::with_capacity(k);
    chosen.push(seeds.pick_index(n).min(n - 1));

    while chosen.len() < k {
        let distances: Vec<f32> = vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| {
                if chosen.contains(&i) {
                    return 0.0;
                }
                let closest = chosen
                    .iter()
                    .map(|&c| cosine_similarity(vector, vectors[c]))
                    .fold(f32::NEG_INFINITY, f32::max);
                let distance = 1.0 - closest;
                if distance < MIN_SEED_DISTANCE {
                    0.0
                } else {
                    distance
                }
            })
            .collect();

        let total: f32 = distances.iter().sum();
        if total <= 0.0 {
            debug!(
                "Stopping k-means++ seeding at {} of {k} centroids: no distinct points left",
                chosen.len()
            );
            break;
        }

        let target = seeds.next_fraction().clamp(0.0, 1.0) * total;
        let mut cumulative = 0.0f32;
        let mut picked = None;
        for (i, &distance) in distances.iter().enumerate() {
            if distance <= 0.0 {
                continue;
            }
            cumulative += distance;
            if cumulative >= target {
                picked = Some(i);
                break;
            }
        }

        // Rounding can leave the cumulative sum just short of the target
        match picked.or_else(|| distances.iter().rposition(|&d| d > 0.0)) {
            Some(i) => chosen.push(i),
            None => break,
        }
    }

    chosen.into_iter().map(|i| vectors[i].to_vec()).collect()
}

/// Assigns each vector to its most similar centroid, or `None` when even
/// the best match is below `min_similarity`. Ties go to the lower index.
fn assign_to_centroids(
    vectors: &[&[f32]],
    centroids: &[Vec<f32>],
    min_similarity: f32,
) -> Vec<Option<usize>> {
    vectors
        .par_iter()
        .map(|vector| {
            let mut best: Option<(usize, f32)> = None;
            for (i, c) in centroids.iter().enumerate() {
                let similarity = cosine_similarity(vector, c);
                if best.is_none_or(|(_, s)| similarity > s) {
                    best = Some((i, similarity));
                }
            }
            best.filter(|&(_, s)| s >= min_similarity).map(|(i, _)| i)
        })
        .collect()
}

/// Moves every centroid to the mean of its members. Centroids without
/// members keep their position.
fn update_centroids(vectors: &[&[f32]], assignments: &[Option<usize>], centroids: &mut [Vec<f32>]) {
    for (index, current) in centroids.iter_mut().enumerate() {
        let members = vectors
            .iter()
            .zip(assignments)
            .filter(|(_, a)| **a == Some(index))
            .map(|(v, _)| *v);
        if let Some(mean) = centroid(members) {
            *current = mean;
        }
    }
}
