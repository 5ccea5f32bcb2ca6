//! Cluster names and display colors.
//!
//! Naming is an optional collaborator: the service calls it on the blocking
//! pool under a timeout and replaces any failure with `Cluster N`.

use crate::cluster::extract_keywords;
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::ClusterName;

/// Display colors, cycled by cluster index.
pub const CLUSTER_PALETTE: [&str; 10] = [
    "#4f46e5", "#0891b2", "#059669", "#ca8a04", "#dc2626", "#7c3aed", "#db2777", "#ea580c",
    "#0d9488", "#64748b",
];

/// Color for the cluster at `index` (0-based, wraps around the palette).
pub fn color_for(index: usize) -> &'static str {
    CLUSTER_PALETTE[index % CLUSTER_PALETTE.len()]
}

/// Produces a human-readable name for a cluster from its member titles.
///
/// Implementations may block (e.g. call a language model); they are always
/// invoked from a blocking thread.
pub trait NamingService: Send + Sync {
    /// `titles` holds at most ten titles, most central member first.
    fn name_cluster(&self, titles: &[String]) -> AnalysisResult<ClusterName>;
}

/// Local naming from title keywords.
///
/// Builds a title-cased name from the top keywords. The native and English
/// names are the same since no translation takes place.
#[derive(Debug, Clone)]
pub struct KeywordNamingService {
    max_words: usize,
}

impl Default for KeywordNamingService {
    fn default() -> Self {
        Self { max_words: 3 }
    }
}

impl KeywordNamingService {
    pub fn new(max_words: usize) -> Self {
        Self {
            max_words: max_words.max(1),
        }
    }
}

impl NamingService for KeywordNamingService {
    fn name_cluster(&self, titles: &[String]) -> AnalysisResult<ClusterName> {
        let keywords = extract_keywords(titles);
        if keywords.is_empty() {
            return Err(AnalysisError::ExternalService {
                service: "naming",
                reason: "titles contain no usable keywords".to_string(),
            });
        }

        let name = keywords
            .iter()
            .take(self.max_words)
            .map(|word| title_case(word))
            .collect::<Vec<_>>()
            .join(" ");

        Ok(ClusterName {
            native: name.clone(),
            en: name,
        })
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
