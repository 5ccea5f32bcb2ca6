//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use citelens::cluster::SeedSource;
use citelens::store::Snapshot;
use citelens::{ArticleId, EmbeddingRecord, ScopeId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed source that always answers with fixed draws.
pub struct ScriptedSeeds {
    pub index: usize,
    pub fraction: f32,
}

impl SeedSource for ScriptedSeeds {
    fn pick_index(&mut self, len: usize) -> usize {
        self.index.min(len - 1)
    }

    fn next_fraction(&mut self) -> f32 {
        self.fraction
    }
}

/// `per_topic` records around each of `topics` orthogonal axes.
///
/// Every vector is its axis plus uniform noise in `[0, noise)` on all
/// dimensions, so records of one topic are far more similar to each other
/// than to any other topic when `noise` is small. Ids are `t{topic}-{i}`.
pub fn topic_records(topics: usize, per_topic: usize, noise: f32, seed: u64) -> Vec<EmbeddingRecord> {
    let dimension = topics.max(2);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(topics * per_topic);

    for topic in 0..topics {
        for i in 0..per_topic {
            let mut vector: Vec<f32> = (0..dimension)
                .map(|_| rng.random::<f32>() * noise)
                .collect();
            vector[topic] += 1.0;
            records.push(
                EmbeddingRecord::new(
                    format!("t{topic}-{i}"),
                    format!("Topic {topic} article {i}"),
                    vector,
                )
                .with_year(2010 + (i as i32 % 12)),
            );
        }
    }

    records
}

/// Snapshot putting every record into one scope.
pub fn single_scope(scope: &str, articles: Vec<EmbeddingRecord>) -> Snapshot {
    let ids: Vec<ArticleId> = articles.iter().map(|a| a.id.clone()).collect();
    Snapshot {
        articles,
        scopes: BTreeMap::from([(ScopeId::new(scope), ids)]),
    }
}

/// Write a snapshot to `dir/snapshot.json`.
pub fn write_snapshot(dir: &Path, snapshot: &Snapshot) -> PathBuf {
    let path = dir.join("snapshot.json");
    fs::write(&path, serde_json::to_string_pretty(snapshot).unwrap()).unwrap();
    path
}
