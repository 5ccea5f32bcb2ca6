//! Gap detection over generated citation graphs.

use citelens::gap::{CitationOracle, GapParams, RecordCitationOracle, detect_gaps};
use citelens::vector::cosine_similarity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::topic_records;

#[test]
fn test_gaps_never_include_cited_pairs() {
    let mut records = topic_records(3, 8, 0.2, 17);
    let ids: Vec<String> = records.iter().map(|r| r.id.to_string()).collect();

    // Random citations, recorded on either side of the edge
    let mut rng = StdRng::seed_from_u64(4);
    for i in 0..records.len() {
        for _ in 0..3 {
            let j = rng.random_range(0..records.len());
            if i == j {
                continue;
            }
            let target = ids[j].clone();
            records[i] = if rng.random::<bool>() {
                records[i].clone().with_references([target])
            } else {
                records[i].clone().with_cited_by([target])
            };
        }
    }

    let oracle = RecordCitationOracle::from_records(&records);
    let params = GapParams {
        threshold: 0.5,
        limit: 200,
        ..GapParams::default()
    };
    let gaps = detect_gaps(&records, &params, &oracle).unwrap();

    assert!(!gaps.is_empty());
    for gap in &gaps {
        assert_ne!(gap.id_a, gap.id_b);
        assert!(!oracle.has_citation_edge(&gap.id_a, &gap.id_b));
        assert!(!oracle.has_citation_edge(&gap.id_b, &gap.id_a));
        assert!(gap.similarity >= 0.5);
    }
    assert!(gaps.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[test]
fn test_every_qualifying_pair_is_found() {
    let records = topic_records(2, 5, 0.1, 8);
    let oracle = RecordCitationOracle::from_records(&records);
    let params = GapParams {
        threshold: 0.9,
        limit: 200,
        ..GapParams::default()
    };
    let gaps = detect_gaps(&records, &params, &oracle).unwrap();

    let mut expected = 0;
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            if cosine_similarity(&a.vector, &b.vector) >= 0.9 {
                expected += 1;
            }
        }
    }
    assert_eq!(gaps.len(), expected);
}

#[test]
fn test_limit_keeps_the_strongest() {
    let records = topic_records(2, 6, 0.3, 12);
    let oracle = RecordCitationOracle::default();
    let all = detect_gaps(
        &records,
        &GapParams {
            threshold: 0.5,
            limit: 200,
            ..GapParams::default()
        },
        &oracle,
    )
    .unwrap();
    let top = detect_gaps(
        &records,
        &GapParams {
            threshold: 0.5,
            limit: 5,
            ..GapParams::default()
        },
        &oracle,
    )
    .unwrap();

    assert_eq!(top.len(), 5.min(all.len()));
    for (a, b) in top.iter().zip(&all) {
        assert_eq!(a.similarity, b.similarity);
    }
}
