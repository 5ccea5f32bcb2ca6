//! Configuration module for the analysis engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.citelens/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CL_` and use double underscores
//! to separate nested levels:
//! - `CL_CLUSTERING__NUM_CLUSTERS=8` sets `clustering.num_clusters`
//! - `CL_GAPS__THRESHOLD=0.8` sets `gaps.threshold`
//! - `CL_EMBEDDING__TIMEOUT_MS=60000` sets `embedding.timeout_ms`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cluster::{ClusterParams, DEFAULT_MAX_ITERATIONS};
use crate::error::{AnalysisError, AnalysisResult};
use crate::gap::GapParams;
use crate::search::RankParams;
use crate::vector::ClusterId;

const CONFIG_DIR: &str = ".citelens";

/// Maximum length of a search query, in characters.
pub const MAX_QUERY_CHARS: usize = 1000;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// JSON snapshot of article embeddings and scopes
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Directory holding one cluster file per scope
    #[serde(default = "default_cluster_dir")]
    pub cluster_dir: PathBuf,

    /// Workspace root directory (where .citelens is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Threads in the rayon pool used for pairwise work
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    #[serde(default)]
    pub clustering: ClusteringConfig,

    #[serde(default)]
    pub gaps: GapConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClusteringConfig {
    /// Requested number of clusters (2-20)
    #[serde(default = "default_num_clusters")]
    pub num_clusters: usize,

    /// Smallest cluster kept (2-50)
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,

    /// Minimum similarity to join a cluster (0.3-0.95)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Ask the naming service for cluster names
    #[serde(default = "default_true")]
    pub generate_names: bool,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Fixed seed for reproducible runs; random when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GapConfig {
    /// Minimum similarity of a gap pair (0.5-0.95)
    #[serde(default = "default_gap_threshold")]
    pub threshold: f32,

    /// Maximum gaps returned (1-200)
    #[serde(default = "default_gap_limit")]
    pub limit: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_from: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_to: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Similarity threshold for search results (0.0 to 1.0)
    #[serde(default = "default_similarity_threshold")]
    pub threshold: f32,

    /// Maximum hits returned (1-100)
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NamingConfig {
    /// Words in a keyword-derived name
    #[serde(default = "default_name_words")]
    pub max_words: usize,

    /// Per-cluster budget for the naming service
    #[serde(default = "default_naming_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Model to use for query embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Where fastembed caches downloaded models
    #[serde(default = "default_model_cache_dir")]
    pub cache_dir: PathBuf,

    /// Budget for embedding one query
    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_false")]
    pub show_progress: bool,
}

/// A semantic search request after CLI/env merging.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub threshold: f32,
    pub limit: usize,
    pub cluster_id: Option<ClusterId>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_snapshot_path() -> PathBuf {
    PathBuf::from(".citelens/snapshot.json")
}
fn default_cluster_dir() -> PathBuf {
    PathBuf::from(".citelens/clusters")
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_num_clusters() -> usize {
    5
}
fn default_min_cluster_size() -> usize {
    3
}
fn default_similarity_threshold() -> f32 {
    0.6
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}
fn default_gap_threshold() -> f32 {
    0.7
}
fn default_gap_limit() -> usize {
    50
}
fn default_search_limit() -> usize {
    20
}
fn default_name_words() -> usize {
    3
}
fn default_naming_timeout_ms() -> u64 {
    10_000
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_model_cache_dir() -> PathBuf {
    PathBuf::from(".citelens/models")
}
fn default_embedding_timeout_ms() -> u64 {
    30_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            snapshot_path: default_snapshot_path(),
            cluster_dir: default_cluster_dir(),
            workspace_root: None,
            debug: false,
            parallel_threads: default_parallel_threads(),
            clustering: ClusteringConfig::default(),
            gaps: GapConfig::default(),
            search: SearchConfig::default(),
            naming: NamingConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            num_clusters: default_num_clusters(),
            min_cluster_size: default_min_cluster_size(),
            similarity_threshold: default_similarity_threshold(),
            generate_names: true,
            max_iterations: default_max_iterations(),
            seed: None,
        }
    }
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            threshold: default_gap_threshold(),
            limit: default_gap_limit(),
            year_from: None,
            year_to: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_similarity_threshold(),
            limit: default_search_limit(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            max_words: default_name_words(),
            timeout_ms: default_naming_timeout_ms(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: default_model_cache_dir(),
            timeout_ms: default_embedding_timeout_ms(),
            show_progress: false,
        }
    }
}

fn check_range<T>(field: &'static str, value: T, range: RangeInclusive<T>) -> AnalysisResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::validation(
            field,
            format!(
                "{value} is outside the allowed range {}..={}",
                range.start(),
                range.end()
            ),
        ))
    }
}

impl ClusteringConfig {
    /// Reject out-of-range values before any data is fetched.
    pub fn validate(&self) -> AnalysisResult<()> {
        check_range("num_clusters", self.num_clusters, 2..=20)?;
        check_range("min_cluster_size", self.min_cluster_size, 2..=50)?;
        check_range("similarity_threshold", self.similarity_threshold, 0.3..=0.95)?;
        if self.max_iterations == 0 {
            return Err(AnalysisError::validation(
                "max_iterations",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn params(&self) -> ClusterParams {
        ClusterParams {
            k: self.num_clusters,
            min_cluster_size: self.min_cluster_size,
            min_similarity: self.similarity_threshold,
            max_iterations: self.max_iterations,
        }
    }
}

impl GapConfig {
    pub fn validate(&self) -> AnalysisResult<()> {
        check_range("gaps.threshold", self.threshold, 0.5..=0.95)?;
        check_range("gaps.limit", self.limit, 1..=200)?;
        if let (Some(from), Some(to)) = (self.year_from, self.year_to) {
            if from > to {
                return Err(AnalysisError::validation(
                    "year_from",
                    format!("{from} is after year_to {to}"),
                ));
            }
        }
        Ok(())
    }

    pub fn params(&self) -> GapParams {
        GapParams {
            threshold: self.threshold,
            limit: self.limit,
            year_from: self.year_from,
            year_to: self.year_to,
        }
    }
}

impl SearchRequest {
    /// Request with the configured threshold and limit.
    pub fn new(query: impl Into<String>, defaults: &SearchConfig) -> Self {
        Self {
            query: query.into(),
            threshold: defaults.threshold,
            limit: defaults.limit,
            cluster_id: None,
        }
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        let chars = self.query.trim().chars().count();
        if chars == 0 {
            return Err(AnalysisError::validation("query", "must not be empty"));
        }
        if chars > MAX_QUERY_CHARS {
            return Err(AnalysisError::validation(
                "query",
                format!("{chars} characters exceeds the maximum of {MAX_QUERY_CHARS}"),
            ));
        }
        check_range("search.threshold", self.threshold, 0.0..=1.0)?;
        check_range("search.limit", self.limit, 1..=100)?;
        Ok(())
    }

    pub fn rank_params(&self) -> RankParams {
        RankParams {
            threshold: self.threshold,
            limit: self.limit,
            cluster_filter: self.cluster_id,
        }
    }
}

impl NamingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Settings {
    fn figment(config_path: impl AsRef<Path>) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path.as_ref()))
            // Double underscore separates nested levels; single underscores
            // stay part of the field name
            .merge(Env::prefixed("CL_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
    }

    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path).extract().map_err(Box::new)
    }

    /// Find the workspace config by looking for a .citelens directory
    /// from the current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .citelens is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolve a configured path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Validate every section that has documented ranges.
    pub fn validate(&self) -> AnalysisResult<()> {
        self.clustering.validate()?;
        self.gaps.validate()?;
        SearchRequest::new("-", &self.search).validate()?;
        if self.parallel_threads == 0 {
            return Err(AnalysisError::validation(
                "parallel_threads",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Create the default settings file under `root/.citelens/`
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# citelens configuration file

# Version of the configuration schema
version = 1

# JSON snapshot with "articles" and "scopes" (relative to workspace root)
snapshot_path = ".citelens/snapshot.json"

# One <scope>.json file per clustered scope
cluster_dir = ".citelens/clusters"

# Global debug mode
debug = false

# Threads for pairwise similarity work (defaults to CPU count)
# parallel_threads = {}

[clustering]
# Requested number of clusters (2-20). Reduced automatically when the
# scope is too small for this many clusters of min_cluster_size.
num_clusters = 5

# Clusters with fewer members are dissolved (2-50)
min_cluster_size = 3

# Minimum cosine similarity to join a cluster (0.3-0.95)
similarity_threshold = 0.6

# Generate human-readable cluster names
generate_names = true

# Iteration budget; stopping early is not an error
max_iterations = {}

# Fix the seed for reproducible clusterings
# seed = 42

[gaps]
# Minimum similarity of an uncited pair (0.5-0.95)
threshold = 0.7

# Maximum pairs reported (1-200)
limit = 50

# Only pairs where both years are known and inside the bounds
# year_from = 2015
# year_to = 2024

[search]
# Similarity threshold for search results (0.0 to 1.0)
threshold = 0.6

# Maximum hits returned (1-100)
limit = 20

[naming]
# Words in a keyword-derived cluster name
max_words = 3

# Budget per cluster before falling back to "Cluster N"
timeout_ms = 10000

[embedding]
# Model used to embed search queries. Must match the corpus embeddings.
model = "AllMiniLML6V2"

# Where downloaded models are cached
cache_dir = ".citelens/models"

# Budget for embedding one query
timeout_ms = 30000

show_progress = false
"#,
            num_cpus::get(),
            DEFAULT_MAX_ITERATIONS
        );

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}
