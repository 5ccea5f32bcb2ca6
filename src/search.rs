//! Cluster-aware semantic search ranking.

use std::collections::HashMap;

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{ArticleId, EmbeddingRecord, SearchGroup, SearchHit};
use crate::vector::{ClusterId, cosine_similarity};

/// Parameters of one ranking pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankParams {
    /// Hits below this similarity are dropped
    pub threshold: f32,
    pub limit: usize,

    /// Keep only hits in this cluster
    pub cluster_filter: Option<ClusterId>,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            limit: 20,
            cluster_filter: None,
        }
    }
}

/// Ranks `corpus` against `query` by cosine similarity.
///
/// Scores are never clamped. Records whose dimension differs from the query
/// score 0; if no record shares the query's dimension the query cannot be
/// compared at all and the call fails with `Computation`.
///
/// An empty result (nothing above the threshold) is not an error.
pub fn rank(
    query: &[f32],
    corpus: &[EmbeddingRecord],
    params: &RankParams,
    membership: &HashMap<ArticleId, ClusterId>,
) -> AnalysisResult<Vec<SearchHit>> {
    if !corpus.is_empty() && !corpus.iter().any(|r| r.vector.len() == query.len()) {
        return Err(AnalysisError::computation(format!(
            "query embedding has dimension {} but no corpus embedding matches it",
            query.len()
        )));
    }

    let mut hits: Vec<SearchHit> = corpus
        .iter()
        .filter_map(|record| {
            let similarity = cosine_similarity(query, &record.vector);
            if similarity < params.threshold {
                return None;
            }
            let cluster_id = membership.get(&record.id).copied();
            if params.cluster_filter.is_some() && cluster_id != params.cluster_filter {
                return None;
            }
            Some(SearchHit {
                id: record.id.clone(),
                similarity,
                cluster_id,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    hits.truncate(params.limit);
    Ok(hits)
}

/// Groups ranked hits by cluster.
///
/// Groups come out in the order of their best hit; hits inside a group keep
/// their ranked order. Unclustered hits share one `None` group.
pub fn group_by_cluster(hits: &[SearchHit]) -> Vec<SearchGroup> {
    let mut groups: Vec<SearchGroup> = Vec::new();
    let mut positions: HashMap<Option<ClusterId>, usize> = HashMap::new();

    for hit in hits {
        let position = *positions.entry(hit.cluster_id).or_insert_with(|| {
            groups.push(SearchGroup {
                cluster_id: hit.cluster_id,
                hits: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].hits.push(hit.clone());
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<EmbeddingRecord> {
        vec![
            EmbeddingRecord::new("graph-1", "Graph Networks", vec![1.0, 0.0, 0.0]),
            EmbeddingRecord::new("graph-2", "Graph Kernels", vec![0.9, 0.1, 0.0]),
            EmbeddingRecord::new("protein-1", "Protein Folding", vec![0.0, 1.0, 0.0]),
            EmbeddingRecord::new("mixed", "Graphs of Proteins", vec![0.7, 0.7, 0.0]),
        ]
    }

    fn membership() -> HashMap<ArticleId, ClusterId> {
        HashMap::from([
            (ArticleId::from("graph-1"), ClusterId::from_index(0)),
            (ArticleId::from("graph-2"), ClusterId::from_index(0)),
            (ArticleId::from("protein-1"), ClusterId::from_index(1)),
        ])
    }

    #[test]
    fn test_ranked_descending_with_membership() {
        let params = RankParams {
            threshold: 0.5,
            ..RankParams::default()
        };
        let hits = rank(&[1.0, 0.0, 0.0], &corpus(), &params, &membership()).unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["graph-1", "graph-2", "mixed"]);
        assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert_eq!(hits[0].cluster_id, Some(ClusterId::from_index(0)));
        assert_eq!(hits[2].cluster_id, None);
    }

    #[test]
    fn test_threshold_above_best_match_is_empty() {
        let corpus = vec![EmbeddingRecord::new("only", "Only", vec![0.85, 0.5268, 0.0])];
        let params = RankParams {
            threshold: 0.9,
            ..RankParams::default()
        };
        let hits = rank(&[1.0, 0.0, 0.0], &corpus, &params, &HashMap::new()).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_cluster_filter() {
        let params = RankParams {
            threshold: 0.0,
            cluster_filter: Some(ClusterId::from_index(1)),
            ..RankParams::default()
        };
        let hits = rank(&[0.5, 0.5, 0.0], &corpus(), &params, &membership()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "protein-1");
    }

    #[test]
    fn test_limit_truncates() {
        let params = RankParams {
            threshold: 0.0,
            limit: 2,
            cluster_filter: None,
        };
        let hits = rank(&[1.0, 1.0, 0.0], &corpus(), &params, &membership()).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id.as_str(), "mixed");
    }

    #[test]
    fn test_query_dimension_matching_nothing_fails() {
        let err = rank(&[1.0, 0.0], &corpus(), &RankParams::default(), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Computation { .. }));
    }

    #[test]
    fn test_groups_follow_best_hit_order() {
        let params = RankParams {
            threshold: 0.0,
            ..RankParams::default()
        };
        let hits = rank(&[0.8, 0.6, 0.0], &corpus(), &params, &membership()).unwrap();
        let groups = group_by_cluster(&hits);

        // mixed (unclustered) ranks first, then the graph cluster, then protein
        assert_eq!(groups[0].cluster_id, None);
        assert_eq!(groups[1].cluster_id, Some(ClusterId::from_index(0)));
        assert_eq!(groups[1].hits.len(), 2);
        assert_eq!(groups[2].cluster_id, Some(ClusterId::from_index(1)));

        let total: usize = groups.iter().map(|g| g.hits.len()).sum();
        assert_eq!(total, hits.len());
    }
}
