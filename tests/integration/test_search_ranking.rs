//! Search ranking and grouping against stored cluster membership.

use std::collections::HashMap;

use citelens::search::{RankParams, group_by_cluster, rank};
use citelens::{ArticleId, ClusterId, EmbeddingRecord};

use crate::common::topic_records;

fn membership(records: &[EmbeddingRecord]) -> HashMap<ArticleId, ClusterId> {
    // Topic n of the fixture becomes cluster n + 1; the last article of each
    // topic stays unclustered
    records
        .iter()
        .filter(|r| !r.id.as_str().ends_with("-4"))
        .map(|r| {
            let topic: usize = r.id.as_str()[1..2].parse().unwrap();
            (r.id.clone(), ClusterId::from_index(topic))
        })
        .collect()
}

#[test]
fn test_threshold_above_every_match_is_empty_not_error() {
    let records = topic_records(2, 5, 0.3, 5);
    let query = vec![0.7, 0.7];
    let params = RankParams {
        threshold: 0.999,
        ..RankParams::default()
    };
    let hits = rank(&query, &records, &params, &membership(&records)).unwrap();
    assert!(hits.is_empty());
    assert!(group_by_cluster(&hits).is_empty());
}

#[test]
fn test_hits_sorted_and_grouped() {
    let records = topic_records(3, 5, 0.1, 9);
    let query = vec![1.0, 0.0, 0.0];
    let params = RankParams {
        threshold: 0.0,
        limit: 100,
        cluster_filter: None,
    };
    let hits = rank(&query, &records, &params, &membership(&records)).unwrap();

    assert_eq!(hits.len(), records.len());
    assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    // Topic 0 articles come first and carry cluster 1
    assert!(hits[0].id.as_str().starts_with("t0-"));

    let groups = group_by_cluster(&hits);
    let grouped: usize = groups.iter().map(|g| g.hits.len()).sum();
    assert_eq!(grouped, hits.len());
    assert_eq!(groups.iter().filter(|g| g.cluster_id.is_none()).count(), 1);
    for group in &groups {
        assert!(group.hits.iter().all(|h| h.cluster_id == group.cluster_id));
        assert!(
            group
                .hits
                .windows(2)
                .all(|w| w[0].similarity >= w[1].similarity)
        );
    }
}

#[test]
fn test_cluster_filter_restricts_hits() {
    let records = topic_records(3, 5, 0.1, 9);
    let wanted = ClusterId::from_index(2);
    let params = RankParams {
        threshold: 0.0,
        limit: 100,
        cluster_filter: Some(wanted),
    };
    let hits = rank(&[0.0, 0.0, 1.0], &records, &params, &membership(&records)).unwrap();
    assert_eq!(hits.len(), 4);
    assert!(hits.iter().all(|h| h.cluster_id == Some(wanted)));
}
