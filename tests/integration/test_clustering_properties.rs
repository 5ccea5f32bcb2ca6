//! Properties of a clustering run that must hold for any seed.

use std::collections::HashSet;

use citelens::cluster::{ClusterEngine, ClusterParams, RngSeedSource};
use citelens::vector::{centroid, cosine_similarity};
use citelens::{AnalysisError, ArticleId};

use crate::common::{ScriptedSeeds, topic_records};

fn params(k: usize) -> ClusterParams {
    ClusterParams {
        k,
        min_cluster_size: 3,
        min_similarity: 0.6,
        max_iterations: 50,
    }
}

#[test]
fn test_every_article_lands_exactly_once() {
    let records = topic_records(3, 6, 0.3, 11);
    let all: HashSet<&ArticleId> = records.iter().map(|r| &r.id).collect();

    for seed in 0..20 {
        let outcome = ClusterEngine::new(params(4))
            .run(&records, &mut RngSeedSource::seeded(seed))
            .unwrap();

        let mut seen: HashSet<&ArticleId> = HashSet::new();
        for cluster in &outcome.clusters {
            assert!(cluster.member_ids.len() >= 3, "seed {seed}: undersized cluster");
            for id in &cluster.member_ids {
                assert!(seen.insert(id), "seed {seed}: {id} in two clusters");
            }
        }
        for id in &outcome.unassigned_ids {
            assert!(seen.insert(id), "seed {seed}: {id} both clustered and unassigned");
        }
        assert_eq!(seen, all, "seed {seed}: articles lost");
    }
}

#[test]
fn test_centroid_is_member_mean() {
    let records = topic_records(2, 5, 0.2, 3);
    let outcome = ClusterEngine::new(params(2))
        .run(&records, &mut RngSeedSource::seeded(5))
        .unwrap();

    for cluster in &outcome.clusters {
        let members: Vec<&[f32]> = cluster
            .member_indices
            .iter()
            .map(|&i| records[i].vector.as_slice())
            .collect();
        let expected = centroid(members.iter().copied()).unwrap();
        for (a, b) in expected.iter().zip(&cluster.centroid) {
            assert!((a - b).abs() < 1e-5);
        }
        assert!(cosine_similarity(&expected, &cluster.centroid) > 0.9999);
    }
}

#[test]
fn test_scripted_seeds_recover_three_topics() {
    let records = topic_records(3, 6, 0.05, 7);
    let outcome = ClusterEngine::new(params(3))
        .run(
            &records,
            &mut ScriptedSeeds {
                index: 0,
                fraction: 0.99,
            },
        )
        .unwrap();

    assert_eq!(outcome.clusters.len(), 3);
    assert!(outcome.unassigned_ids.is_empty());
    assert!(outcome.converged);

    for cluster in &outcome.clusters {
        let prefix = &cluster.member_ids[0].as_str()[..3];
        assert_eq!(cluster.member_ids.len(), 6);
        assert!(cluster.member_ids.iter().all(|id| id.as_str().starts_with(prefix)));
        assert!(cluster.avg_internal_similarity > 0.95);
    }
}

#[test]
fn test_same_seed_same_clustering() {
    let records = topic_records(3, 5, 0.4, 21);
    let engine = ClusterEngine::new(params(3));
    let first = engine.run(&records, &mut RngSeedSource::seeded(99)).unwrap();
    let second = engine.run(&records, &mut RngSeedSource::seeded(99)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_insufficient_data_names_counts() {
    let records = topic_records(1, 5, 0.1, 1);
    let err = ClusterEngine::new(params(2))
        .run(&records, &mut RngSeedSource::seeded(0))
        .unwrap_err();

    match err {
        AnalysisError::InsufficientData { actual, required } => {
            assert_eq!(actual, 5);
            assert_eq!(required, 6);
        }
        other => panic!("expected InsufficientData, got {other}"),
    }
}

#[test]
fn test_requested_k_is_clamped_to_data() {
    // 7 records with min size 3 support at most 2 clusters
    let records = topic_records(2, 4, 0.05, 2)[..7].to_vec();
    let outcome = ClusterEngine::new(params(5))
        .run(&records, &mut RngSeedSource::seeded(1))
        .unwrap();
    assert_eq!(outcome.requested_k, 5);
    assert_eq!(outcome.effective_k, 2);
    assert!(outcome.k_was_reduced());
    assert!(outcome.clusters.len() <= 2);
}
