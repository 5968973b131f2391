use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cli::narrow::Narrowing;
use cli::output::{filter_fields, print_json, to_rows};
use newslens_core::analytics::{AnomalyMethod, Field};
use newslens_core::config::{self, AppConfig};
use newslens_core::{AnalyticsEngine, RecordSet, StoreClient};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "newslens")]
#[command(about = "Retrieve news articles from a vector store and analyse them", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Which articles to pull from the store.
#[derive(Args, Debug, Clone)]
struct Retrieval {
    /// Only articles of this domain (exact match, applied by the store)
    #[arg(long)]
    domain: Option<String>,
    /// Only articles published in the last N days
    #[arg(long, conflicts_with = "domain")]
    recent_days: Option<i64>,
    /// Maximum number of articles; defaults to store.default_limit
    #[arg(long)]
    limit: Option<u64>,
}

/// In-memory filters applied after retrieval.
#[derive(Args, Debug, Clone)]
struct Filters {
    /// Keep only these domains (comma-separated)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    only_domains: Vec<String>,
    /// Keep only these sources (comma-separated)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    sources: Vec<String>,
    /// Earliest publication day, YYYY-MM-DD (inclusive)
    #[arg(long)]
    since: Option<String>,
    /// Latest publication day, YYYY-MM-DD (inclusive)
    #[arg(long)]
    until: Option<String>,
    #[arg(long)]
    min_quality: Option<f64>,
    #[arg(long)]
    max_quality: Option<f64>,
}

impl From<Filters> for Narrowing {
    fn from(f: Filters) -> Self {
        Narrowing {
            domains: f.only_domains,
            sources: f.sources,
            since: f.since,
            until: f.until,
            min_quality: f.min_quality,
            max_quality: f.max_quality,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Dimension {
    Domain,
    Source,
    Daily,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the vector store is reachable and ready
    Status,
    /// List classes and their object counts
    Schema,
    /// Fetch articles and print or export them
    Fetch {
        #[command(flatten)]
        retrieval: Retrieval,
        /// Restrict output fields (comma-separated), e.g. title,domain,published_date
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        fields: Vec<String>,
        /// Write the articles to a JSON file instead of stdout
        #[arg(long)]
        export_json: Option<PathBuf>,
        /// Write the articles to a CSV file instead of stdout
        #[arg(long)]
        export_csv: Option<PathBuf>,
    },
    /// Semantic search over the article class
    Search {
        /// Query text
        query: String,
        /// Number of results
        #[arg(short, long, default_value_t = 10)]
        limit: u64,
        /// Restrict candidates to these domains (comma-separated)
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        domains: Vec<String>,
        /// Restrict output fields (comma-separated), e.g. title,similarity
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        fields: Vec<String>,
    },
    /// Corpus summary statistics
    Stats {
        #[command(flatten)]
        retrieval: Retrieval,
        #[command(flatten)]
        filters: Filters,
    },
    /// Per-domain, per-source or per-day breakdown
    Breakdown {
        #[arg(long, value_enum, default_value_t = Dimension::Domain)]
        by: Dimension,
        #[command(flatten)]
        retrieval: Retrieval,
        #[command(flatten)]
        filters: Filters,
    },
    /// Most frequent content keywords
    Keywords {
        #[arg(short, long, default_value_t = 20)]
        top: usize,
        #[command(flatten)]
        retrieval: Retrieval,
        #[command(flatten)]
        filters: Filters,
    },
    /// Hourly, weekday and monthly publication frequencies
    Patterns {
        #[command(flatten)]
        retrieval: Retrieval,
        #[command(flatten)]
        filters: Filters,
    },
    /// Articles whose field value deviates from the mean
    Anomalies {
        /// Field to test, e.g. quality_score or content
        #[arg(long, default_value = "quality_score")]
        field: Field,
        /// zscore (numeric fields) or length (title, content)
        #[arg(long, default_value = "zscore")]
        method: AnomalyMethod,
        /// Standard deviations; defaults to analytics.anomaly_threshold
        #[arg(long)]
        threshold: Option<f64>,
        #[command(flatten)]
        retrieval: Retrieval,
        #[command(flatten)]
        filters: Filters,
    },
    /// Full summary report
    Report {
        /// Write the report to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        retrieval: Retrieval,
        #[command(flatten)]
        filters: Filters,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::load(cli.config.as_deref())?;
    let client = StoreClient::connect(&cfg)
        .await
        .with_context(|| format!("cannot reach vector store at {}", cfg.store.url))?;

    match cli.command {
        Commands::Status => print_json(&serde_json::json!({
            "status": "ok",
            "backend": cfg.store.backend,
            "url": cfg.store.url,
            "class_name": cfg.store.class_name,
        })),
        Commands::Schema => print_json(&client.schema_info().await?),
        Commands::Fetch {
            retrieval,
            fields,
            export_json,
            export_csv,
        } => run_fetch(&client, retrieval, fields, export_json, export_csv).await,
        Commands::Search {
            query,
            limit,
            domains,
            fields,
        } => {
            let domain_filter = (!domains.is_empty()).then_some(domains.as_slice());
            let results = client.search(&query, limit, domain_filter).await?;
            print_json(&filter_fields(to_rows(&results)?, &fields))
        }
        Commands::Stats { retrieval, filters } => {
            let engine = load_engine(&client, &cfg, &retrieval, filters).await?;
            print_json(&engine.summary_stats())
        }
        Commands::Breakdown {
            by,
            retrieval,
            filters,
        } => {
            let engine = load_engine(&client, &cfg, &retrieval, filters).await?;
            match by {
                Dimension::Domain => print_json(&engine.domain_breakdown()),
                Dimension::Source => print_json(&engine.source_breakdown()),
                Dimension::Daily => print_json(&engine.daily_counts()),
            }
        }
        Commands::Keywords {
            top,
            retrieval,
            filters,
        } => {
            let engine = load_engine(&client, &cfg, &retrieval, filters).await?;
            print_json(&engine.top_keywords(top))
        }
        Commands::Patterns { retrieval, filters } => {
            let engine = load_engine(&client, &cfg, &retrieval, filters).await?;
            print_json(&engine.publication_patterns())
        }
        Commands::Anomalies {
            field,
            method,
            threshold,
            retrieval,
            filters,
        } => {
            let engine = load_engine(&client, &cfg, &retrieval, filters).await?;
            let threshold = threshold.unwrap_or(cfg.analytics.anomaly_threshold);
            let flagged = engine.detect_anomalies(field, method, threshold);
            info!(%field, count = flagged.len(), "anomaly detection");
            print_json(&flagged)
        }
        Commands::Report {
            out,
            retrieval,
            filters,
        } => {
            let engine = load_engine(&client, &cfg, &retrieval, filters).await?;
            let report = engine.summary_report();
            match out {
                Some(path) => {
                    let body = serde_json::to_string_pretty(&report)?;
                    std::fs::write(&path, body)
                        .with_context(|| format!("writing report to {}", path.display()))?;
                    info!(path = %path.display(), "report written");
                    Ok(())
                }
                None => print_json(&report),
            }
        }
    }
}

async fn retrieve(client: &StoreClient, retrieval: &Retrieval) -> Result<RecordSet> {
    let limit = retrieval
        .limit
        .unwrap_or(client.settings().default_limit);
    let records = match (&retrieval.domain, retrieval.recent_days) {
        (Some(domain), _) => client.fetch_by_domain(domain, limit).await,
        (None, Some(days)) => client.fetch_recent(days, limit).await,
        (None, None) => client.fetch_all(limit).await,
    };
    Ok(records?)
}

async fn load_engine(
    client: &StoreClient,
    cfg: &AppConfig,
    retrieval: &Retrieval,
    filters: Filters,
) -> Result<AnalyticsEngine> {
    let records = retrieve(client, retrieval).await?;
    let engine = AnalyticsEngine::with_config(records, &cfg.analytics);
    Narrowing::from(filters).apply(engine)
}

async fn run_fetch(
    client: &StoreClient,
    retrieval: Retrieval,
    fields: Vec<String>,
    export_json: Option<PathBuf>,
    export_csv: Option<PathBuf>,
) -> Result<()> {
    let records = retrieve(client, &retrieval).await?;
    if export_json.is_none() && export_csv.is_none() {
        return print_json(&filter_fields(to_rows(&records)?, &fields));
    }
    let mut written = Vec::new();
    if let Some(path) = export_json {
        written.push(serde_json::json!({
            "path": path.display().to_string(),
            "format": "json",
            "ok": client.export_json(&records, &path),
        }));
    }
    if let Some(path) = export_csv {
        written.push(serde_json::json!({
            "path": path.display().to_string(),
            "format": "csv",
            "ok": client.export_csv(&records, &path),
        }));
    }
    print_json(&serde_json::json!({
        "articles": records.len(),
        "exports": written,
    }))
}
