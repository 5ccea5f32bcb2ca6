//! Domain records shared across the engine.
//!
//! `EmbeddingRecord` is the immutable per-invocation snapshot row; the
//! remaining types are the outputs of clustering, gap detection and search.

use crate::vector::ClusterId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque article identifier as issued by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a project scope (a project's articles plus their one-hop
/// citation neighbours).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One article embedding with the metadata the engine needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: ArticleId,

    /// Embedding of the article's abstract
    #[serde(rename = "embedding")]
    pub vector: Vec<f32>,

    pub title: String,

    #[serde(default, rename = "abstract")]
    pub abstract_text: String,

    /// Publication year, when known
    #[serde(default)]
    pub year: Option<i32>,

    /// Articles this one cites (outbound edges)
    #[serde(default)]
    pub references: BTreeSet<ArticleId>,

    /// Articles citing this one (inbound edges)
    #[serde(default)]
    pub cited_by: BTreeSet<ArticleId>,
}

impl EmbeddingRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: ArticleId::new(id),
            vector,
            title: title.into(),
            abstract_text: String::new(),
            year: None,
            references: BTreeSet::new(),
            cited_by: BTreeSet::new(),
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_references<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references.extend(ids.into_iter().map(ArticleId::new));
        self
    }

    pub fn with_cited_by<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cited_by.extend(ids.into_iter().map(ArticleId::new));
        self
    }
}

/// Display name of a cluster in the author's language and in English.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterName {
    pub native: String,
    pub en: String,
}

impl ClusterName {
    /// Name used when the naming service is unavailable.
    pub fn fallback(id: ClusterId) -> Self {
        let name = format!("Cluster {id}");
        Self {
            native: name.clone(),
            en: name,
        }
    }
}

/// A persisted cluster of semantically related articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub member_ids: Vec<ArticleId>,
    pub centroid: Vec<f32>,
    pub avg_internal_similarity: f32,

    /// Most representative member (highest degree-sum centrality)
    pub central_id: Option<ArticleId>,
    pub keywords: Vec<String>,
    pub name: Option<ClusterName>,

    /// Hex display color, e.g. `#4f46e5`
    pub color: String,
}

impl Cluster {
    pub fn contains(&self, id: &ArticleId) -> bool {
        self.member_ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.member_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }

    /// Label for tables: the English name, falling back to the id.
    pub fn label(&self) -> String {
        self.name
            .as_ref()
            .map(|n| n.en.clone())
            .unwrap_or_else(|| format!("Cluster {}", self.id))
    }
}

/// A pair of similar articles with no citation edge between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapCandidate {
    pub id_a: ArticleId,
    pub id_b: ArticleId,
    pub similarity: f32,
    pub reason: String,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ArticleId,
    pub similarity: f32,
    pub cluster_id: Option<ClusterId>,
}

/// Search hits sharing a cluster, in descending similarity order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchGroup {
    /// `None` collects the unclustered hits
    pub cluster_id: Option<ClusterId>,
    pub hits: Vec<SearchHit>,
}
