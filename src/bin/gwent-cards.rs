use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use gwent_card_renderer::{
    BatchReport, BatchRunner, Catalog, CardGenerator, GeneratorConfig, ResampleFilter,
    parse_custom_args,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "gwent-cards", version)]
struct Cli {
    /// Generator config JSON. Defaults are used for anything it omits.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Stop after this many generated cards (0 for no limit).
    #[arg(long, global = true)]
    max: Option<usize>,

    /// Game version tag used in the output path.
    #[arg(long = "version-tag", global = true)]
    version_tag: Option<String>,

    /// Worker threads for batch runs.
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Resampling filter.
    #[arg(long, value_enum, global = true)]
    filter: Option<ResampleFilter>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the given catalog ids.
    Cards {
        /// Comma-separated card ids.
        #[arg(value_delimiter = ',', required = true)]
        ids: Vec<String>,
    },
    /// Generate a card that is not in the catalog.
    Custom {
        /// `key=value` pairs: filename, faction, type, rarity, strength,
        /// position, spy, count.
        params: Vec<String>,
    },
    /// Generate the whole catalog, up to the configured cap.
    All,
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.cmd {
        Command::Cards { ids } => {
            let ids: Vec<String> = ids
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect();
            cmd_batch(config, Some(ids.as_slice()))
        }
        Command::All => cmd_batch(config, None),
        Command::Custom { params } => cmd_custom(config, &params),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => GeneratorConfig::default(),
    };

    if let Some(max) = cli.max {
        config.max_generated = max;
    }
    if let Some(version) = &cli.version_tag {
        config.version = version.clone();
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(filter) = cli.filter {
        config.resample_filter = filter;
    }
    Ok(config)
}

fn cmd_batch(config: GeneratorConfig, ids: Option<&[String]>) -> anyhow::Result<()> {
    let catalog = Catalog::load(&config.catalog_path)
        .with_context(|| format!("load catalog '{}'", config.catalog_path.display()))?;
    tracing::debug!(cards = catalog.len(), "catalog loaded");

    let max = config.max_generated;
    let workers = config.workers;
    let generator = CardGenerator::new(config, catalog);
    let runner = BatchRunner::new(&generator);

    let report = run(&runner, ids, max, workers)?;
    println!("{report}");
    Ok(())
}

#[cfg(feature = "rayon")]
fn run(
    runner: &BatchRunner<'_, CardGenerator>,
    ids: Option<&[String]>,
    max: usize,
    workers: usize,
) -> anyhow::Result<BatchReport> {
    if workers > 1 {
        return runner
            .run_parallel(ids, max, workers)
            .context("start worker pool");
    }
    Ok(runner.run(ids, max))
}

#[cfg(not(feature = "rayon"))]
fn run(
    runner: &BatchRunner<'_, CardGenerator>,
    ids: Option<&[String]>,
    max: usize,
    workers: usize,
) -> anyhow::Result<BatchReport> {
    if workers > 1 {
        tracing::warn!(workers, "built without the `rayon` feature, running sequentially");
    }
    Ok(runner.run(ids, max))
}

fn cmd_custom(config: GeneratorConfig, params: &[String]) -> anyhow::Result<()> {
    let generator = CardGenerator::custom_only(config);
    let params = parse_custom_args(params);

    let card = generator
        .generate_custom_card(&params)
        .context("generate custom card")?;
    println!("{}", card.destination.display());
    Ok(())
}
