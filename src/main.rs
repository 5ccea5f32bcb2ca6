//! CLI entry point for citelens.
//!
//! Clusters a scope's article embeddings, lists stored clusters, scans for
//! missing citations and runs cluster-aware semantic search over a JSON
//! snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use citelens::io::{ExitCode, OutputFormat, OutputManager};
use citelens::naming::KeywordNamingService;
use citelens::store::{FileClusterStore, SnapshotStore};
use citelens::vector::FastEmbedGenerator;
use citelens::{AnalysisError, AnalysisService, ClusterId, ScopeId, SearchRequest, Settings};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(
    name = "citelens",
    version = env!("CARGO_PKG_VERSION"),
    about = "Semantic clustering and citation-gap analysis",
    long_about = "Cluster article embeddings, find similar articles that never cite each other, and search a scope by meaning.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .citelens directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .citelens/settings.toml")]
    Config,

    /// Cluster a scope and store the result
    #[command(
        about = "Cluster a scope's articles and replace its stored clusters",
        after_help = "Examples:\n  citelens cluster thesis\n  citelens cluster thesis -k 8 --min-size 4\n  citelens cluster thesis --seed 42 --no-names"
    )]
    Cluster {
        /// Scope to cluster
        scope: String,

        /// Number of clusters (2-20)
        #[arg(short = 'k', long)]
        clusters: Option<usize>,

        /// Minimum cluster size (2-50)
        #[arg(long)]
        min_size: Option<usize>,

        /// Minimum similarity to join a cluster (0.3-0.95)
        #[arg(long)]
        threshold: Option<f32>,

        /// Skip cluster naming
        #[arg(long)]
        no_names: bool,

        /// Seed for reproducible clusterings
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List stored clusters of a scope
    #[command(about = "Show the clusters stored for a scope")]
    Clusters {
        scope: String,
    },

    /// Find similar articles without a citation between them
    #[command(
        about = "Find likely missing citations",
        after_help = "Examples:\n  citelens gaps thesis\n  citelens gaps thesis --threshold 0.85 --from 2018"
    )]
    Gaps {
        scope: String,

        /// Minimum similarity (0.5-0.95)
        #[arg(long)]
        threshold: Option<f32>,

        /// Maximum pairs (1-200)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Earliest publication year
        #[arg(long = "from")]
        year_from: Option<i32>,

        /// Latest publication year
        #[arg(long = "to")]
        year_to: Option<i32>,
    },

    /// Semantic search within a scope
    #[command(
        about = "Rank a scope's articles against a text query",
        after_help = "Examples:\n  citelens search thesis \"graph neural networks\"\n  citelens search thesis \"protein folding\" --cluster 2 --limit 5"
    )]
    Search {
        scope: String,

        /// Query text (1-1000 characters)
        query: String,

        /// Minimum similarity (0.0-1.0)
        #[arg(long)]
        threshold: Option<f32>,

        /// Maximum hits (1-100)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only return hits from this cluster
        #[arg(long)]
        cluster: Option<ClusterId>,
    },
}

/// Setup logging with the specified level
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "citelens=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings, Box<figment::Error>> {
    match path {
        Some(path) => Settings::load_from(path).map(|mut settings| {
            if settings.workspace_root.is_none() {
                settings.workspace_root = Settings::workspace_root();
            }
            settings
        }),
        None => Settings::load(),
    }
}

fn build_service(settings: &Settings, with_embedder: bool) -> Result<AnalysisService, AnalysisError> {
    let snapshot = SnapshotStore::load(&settings.resolve(&settings.snapshot_path))?;
    let clusters = FileClusterStore::new(settings.resolve(&settings.cluster_dir));
    debug!(
        "Snapshot: {} articles, clusters in {}",
        snapshot.article_count(),
        clusters.dir().display()
    );

    let mut service = AnalysisService::new(Arc::new(snapshot), Arc::new(clusters)).with_naming(
        Arc::new(KeywordNamingService::new(settings.naming.max_words)),
        settings.naming.timeout(),
    );

    if with_embedder {
        let embedding = &settings.embedding;
        let generator = FastEmbedGenerator::new(
            &embedding.model,
            &settings.resolve(&embedding.cache_dir),
            embedding.show_progress,
        )
        .map_err(|e| AnalysisError::ExternalService {
            service: "embedding",
            reason: e.to_string(),
        })?;
        service = service.with_embedder(Arc::new(generator), embedding.timeout());
    }

    Ok(service)
}

async fn run(cli: Cli, mut settings: Settings) -> anyhow::Result<ExitCode> {
    let mut output = OutputManager::new(OutputFormat::from_json_flag(cli.json));

    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force).map_err(|e| anyhow!("{e}"))?;
            output.info(&format!("Created configuration at: {}", path.display()))?;
            Ok(ExitCode::Success)
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(ExitCode::Success)
        }

        Commands::Cluster {
            scope,
            clusters,
            min_size,
            threshold,
            no_names,
            seed,
        } => {
            let config = &mut settings.clustering;
            if let Some(k) = clusters {
                config.num_clusters = k;
            }
            if let Some(size) = min_size {
                config.min_cluster_size = size;
            }
            if let Some(threshold) = threshold {
                config.similarity_threshold = threshold;
            }
            if no_names {
                config.generate_names = false;
            }
            config.seed = seed.or(config.seed);

            let scope = ScopeId::new(scope);
            let result = match build_service(&settings, false) {
                Ok(service) => service.run_clustering(&scope, &settings.clustering).await,
                Err(e) => Err(e),
            };
            Ok(match result {
                Ok(report) => output.success(report)?,
                Err(e) => output.error(&e)?,
            })
        }

        Commands::Clusters { scope } => {
            let scope = ScopeId::new(scope);
            let result = build_service(&settings, false).and_then(|service| service.clusters(&scope));
            Ok(match result {
                Ok(clusters) => output.collection(clusters.iter(), "clusters for scope", scope.as_str())?,
                Err(e) => output.error(&e)?,
            })
        }

        Commands::Gaps {
            scope,
            threshold,
            limit,
            year_from,
            year_to,
        } => {
            let config = &mut settings.gaps;
            if let Some(threshold) = threshold {
                config.threshold = threshold;
            }
            if let Some(limit) = limit {
                config.limit = limit;
            }
            config.year_from = year_from.or(config.year_from);
            config.year_to = year_to.or(config.year_to);

            let scope = ScopeId::new(scope);
            let result = match build_service(&settings, false) {
                Ok(service) => service.find_gaps(&scope, &settings.gaps).await,
                Err(e) => Err(e),
            };
            Ok(match result {
                Ok(report) => output.success(report)?,
                Err(e) => output.error(&e)?,
            })
        }

        Commands::Search {
            scope,
            query,
            threshold,
            limit,
            cluster,
        } => {
            let mut request = SearchRequest::new(query, &settings.search);
            if let Some(threshold) = threshold {
                request.threshold = threshold;
            }
            if let Some(limit) = limit {
                request.limit = limit;
            }
            request.cluster_id = cluster;

            // Validate before the embedding model is loaded
            if let Err(e) = request.validate() {
                return Ok(output.error(&e)?);
            }

            let scope = ScopeId::new(scope);
            let result = match build_service(&settings, true) {
                Ok(service) => service.search(&scope, &request).await,
                Err(e) => Err(e),
            };
            Ok(match result {
                Ok(report) => output.success(report)?,
                Err(e) => output.error(&e)?,
            })
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(ExitCode::ConfigError.into());
        }
    };

    setup_logging(cli.verbose || settings.debug);

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.parallel_threads)
        .build_global()
    {
        warn!("Could not size the rayon pool: {e}");
    }

    let code = match run(cli, settings).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.into());
}
