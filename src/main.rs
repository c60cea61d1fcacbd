use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tabvec::{CollisionPolicy, GroupOrder, Pipeline, PipelineConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const PREVIEW_CHARS: usize = 250;

/// Join tables, group rows by category into documents, and search them
#[derive(Parser, Debug)]
#[command(name = "tabvec")]
#[command(about = "Category documents from joined tables, with similarity search", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, join, group and index the source tables
    Build(BuildArgs),
    /// Search a previously built index
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON pipeline configuration; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the index
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Embedding dimension; queries default to the saved index's
    #[arg(long)]
    dim: Option<usize>,
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Source CSV file; repeat in join order, base table first
    #[arg(short, long = "table")]
    tables: Vec<PathBuf>,

    /// Join key column; repeat for a composite key
    #[arg(long = "key")]
    keys: Vec<String>,

    /// Column whose values become documents
    #[arg(long)]
    category: Option<String>,

    /// Only serialize these columns
    #[arg(long = "column")]
    columns: Vec<String>,

    /// Leave these columns out of the row records
    #[arg(long = "exclude")]
    excluded: Vec<String>,

    /// How same-named columns from later tables are handled
    #[arg(long, value_parser = parse_collision)]
    collision: Option<CollisionPolicy>,

    /// Emit documents sorted by category instead of first-seen order
    #[arg(long)]
    sorted: bool,

    /// Text written for null cells
    #[arg(long)]
    null_sentinel: Option<String>,

    /// Embed content only, without the metadata prefix
    #[arg(long)]
    no_embed_metadata: bool,

    /// Print the build report as JSON
    #[arg(long)]
    json: bool,

    /// Run a search right after the build
    #[arg(long)]
    query: Option<String>,

    /// Number of results for --query
    #[arg(short = 'k', long, default_value_t = 1)]
    k: usize,
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Free-text query
    query: String,

    /// Number of results
    #[arg(short = 'k', long, default_value_t = 4)]
    k: usize,
}

fn parse_collision(s: &str) -> Result<CollisionPolicy, String> {
    match s.to_lowercase().as_str() {
        "suffix" => Ok(CollisionPolicy::Suffix),
        "overwrite" => Ok(CollisionPolicy::Overwrite),
        _ => Err(format!("unknown collision policy '{}' (suffix|overwrite)", s)),
    }
}

impl CommonArgs {
    fn config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.index_dir {
            config.index_dir = dir.clone();
        }
        if let Some(dim) = self.dim {
            config.embedding_dim = Some(dim);
        }
        Ok(config)
    }
}

impl BuildArgs {
    fn config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = self.common.config()?;
        if !self.tables.is_empty() {
            config.tables = self.tables.clone();
        }
        if !self.keys.is_empty() {
            config.join_key = self.keys.clone();
        }
        if let Some(category) = &self.category {
            config.category_column = category.clone();
        }
        if !self.columns.is_empty() {
            config.columns = Some(self.columns.clone());
        }
        if !self.excluded.is_empty() {
            config.excluded = self.excluded.clone();
        }
        if let Some(collision) = self.collision {
            config.collision = collision;
        }
        if self.sorted {
            config.group_order = GroupOrder::Sorted;
        }
        if let Some(sentinel) = &self.null_sentinel {
            config.null_sentinel = sentinel.clone();
        }
        if self.no_embed_metadata {
            config.embed_metadata = false;
        }
        Ok(config)
    }
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if preview.len() < text.len() {
        preview.push_str("...");
    }
    preview
}

fn run_query(pipeline: &Pipeline, query: &str, k: usize) -> anyhow::Result<()> {
    let results = pipeline.query(query, k)?;
    println!("Search results for '{}':", query);
    for (rank, hit) in results.iter().enumerate() {
        let category = hit
            .document
            .category()
            .map(ToString::to_string)
            .unwrap_or_default();
        println!("{}. {} (score {:.4})", rank + 1, category, hit.score);
        println!("   {}", preview(hit.document.content()));
    }
    Ok(())
}

fn build(args: &BuildArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(args.config()?)?;
    let report = pipeline.build()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Unified {} rows from {} tables",
            report.unified_rows,
            report.source_rows.len()
        );
        for (i, doc) in report.documents.iter().enumerate() {
            println!(
                "Document {}: {} = {} ({} records, {} chars)",
                i + 1,
                pipeline.config().category_column,
                doc.category,
                doc.records,
                doc.content_len
            );
        }
        println!(
            "Index saved to {}",
            pipeline.config().index_dir.display()
        );
    }

    if let Some(query) = &args.query {
        run_query(&pipeline, query, args.k)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting tabvec v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Command::Build(args) => build(args),
        Command::Query(args) => {
            let pipeline = Pipeline::new(args.common.config()?)?;
            run_query(&pipeline, &args.query, args.k)
        }
    }
}
