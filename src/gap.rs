//! Missing-citation detection.
//!
//! A gap is a pair of highly similar articles with no citation edge between
//! them in either direction. The scan is quadratic in the snapshot size and
//! runs on the rayon pool.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{ArticleId, EmbeddingRecord, GapCandidate};
use crate::vector::cosine_similarity;

/// Answers whether two articles are linked by a citation.
pub trait CitationOracle: Send + Sync {
    /// True when `a` cites `b` or `b` cites `a`.
    fn has_citation_edge(&self, a: &ArticleId, b: &ArticleId) -> bool;
}

/// [`CitationOracle`] over the citation sets carried by the records.
///
/// Edges are taken from both `references` and `cited_by`, so one side of a
/// pair knowing about the citation is enough.
#[derive(Debug, Default)]
pub struct RecordCitationOracle {
    /// Undirected adjacency: each linked article lists the other
    linked: HashMap<ArticleId, HashSet<ArticleId>>,
}

impl RecordCitationOracle {
    pub fn from_records(records: &[EmbeddingRecord]) -> Self {
        let mut oracle = Self::default();
        for record in records {
            for other in record.references.iter().chain(&record.cited_by) {
                oracle.link(&record.id, other);
            }
        }
        oracle
    }

    fn link(&mut self, a: &ArticleId, b: &ArticleId) {
        self.linked.entry(a.clone()).or_default().insert(b.clone());
        self.linked.entry(b.clone()).or_default().insert(a.clone());
    }

    /// Distinct linked pairs, regardless of direction.
    pub fn edge_count(&self) -> usize {
        let ends: usize = self
            .linked
            .iter()
            .map(|(id, others)| others.len() + usize::from(others.contains(id)))
            .sum();
        ends / 2
    }
}

impl CitationOracle for RecordCitationOracle {
    fn has_citation_edge(&self, a: &ArticleId, b: &ArticleId) -> bool {
        self.linked.get(a).is_some_and(|others| others.contains(b))
    }
}

/// Parameters of one gap scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapParams {
    pub threshold: f32,
    pub limit: usize,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

impl Default for GapParams {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            limit: 50,
            year_from: None,
            year_to: None,
        }
    }
}

impl GapParams {
    fn has_year_filter(&self) -> bool {
        self.year_from.is_some() || self.year_to.is_some()
    }

    fn year_in_bounds(&self, year: i32) -> bool {
        self.year_from.is_none_or(|from| year >= from) && self.year_to.is_none_or(|to| year <= to)
    }

    /// With a year filter, both years must be known and inside the bounds.
    fn accepts_years(&self, a: Option<i32>, b: Option<i32>) -> bool {
        if !self.has_year_filter() {
            return true;
        }
        match (a, b) {
            (Some(a), Some(b)) => self.year_in_bounds(a) && self.year_in_bounds(b),
            _ => false,
        }
    }
}

/// Finds similar article pairs that do not cite each other.
///
/// Pairs are compared once (unordered) and records sharing an id are never
/// paired. The result is sorted by descending similarity and truncated to
/// `params.limit`.
pub fn detect_gaps(
    records: &[EmbeddingRecord],
    params: &GapParams,
    oracle: &dyn CitationOracle,
) -> AnalysisResult<Vec<GapCandidate>> {
    if params.limit == 0 {
        return Err(AnalysisError::validation("limit", "must be at least 1"));
    }

    let mut candidates: Vec<GapCandidate> = (0..records.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let a = &records[i];
            records[i + 1..].iter().filter_map(move |b| {
                if a.id == b.id || !params.accepts_years(a.year, b.year) {
                    return None;
                }
                let similarity = cosine_similarity(&a.vector, &b.vector);
                if similarity < params.threshold || oracle.has_citation_edge(&a.id, &b.id) {
                    return None;
                }
                Some(GapCandidate {
                    id_a: a.id.clone(),
                    id_b: b.id.clone(),
                    similarity,
                    reason: gap_reason(similarity, a.year, b.year),
                })
            })
        })
        .collect();

    candidates.sort_by(|x, y| y.similarity.total_cmp(&x.similarity));
    candidates.truncate(params.limit);
    Ok(candidates)
}

/// Explains a gap from the publication years of the pair.
pub fn gap_reason(similarity: f32, year_a: Option<i32>, year_b: Option<i32>) -> String {
    let percent = similarity * 100.0;
    match (year_a, year_b) {
        (Some(a), Some(b)) => {
            let span = (a - b).abs();
            if span <= 2 {
                format!("{percent:.0}% similar, published within {span} years: likely independent concurrent discovery")
            } else if span <= 5 {
                format!("{percent:.0}% similar, {span} years apart: recent, worth a citation check")
            } else {
                format!("{percent:.0}% similar, {span} years apart: cross-era thematic overlap")
            }
        }
        _ => format!("{percent:.0}% semantic similarity with no citation between them"),
    }
}
