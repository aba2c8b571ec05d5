//! `graphseed seed`: generate a dataset, snapshot it, and bulk-load it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use rand::thread_rng;

use graphseed_fixtures::{Dataset, EntityKind, ScaleConfig, DEFAULT_MAX_PAIR_EVALUATIONS};
use graphseed_loader::{
    BatchWriter, BulkLoader, DynamoDbWriter, InMemoryStore, LoaderConfig, PendingWrites,
    RetryPolicy, Settlement, SettlementReport, MAX_BATCH_ITEMS,
};

use crate::deployment::{OutputSource, TableTargets, DEFAULT_STATE_PATH};

pub const DEFAULT_SNAPSHOT_PATH: &str = "./loaded-data.json";

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    /// Number of movies
    #[arg(long, default_value_t = 30)]
    pub movies: usize,
    /// Number of users
    #[arg(long, default_value_t = 20)]
    pub users: usize,
    /// Number of lists
    #[arg(long, default_value_t = 10)]
    pub lists: usize,
    /// RNG seed for a reproducible dataset
    #[arg(long)]
    pub seed: Option<u64>,
    /// Upper bound on pairs examined by the association, follow and review generators
    #[arg(long, default_value_t = DEFAULT_MAX_PAIR_EVALUATIONS)]
    pub max_pair_evaluations: usize,

    /// Deployment state document
    #[arg(long, default_value = DEFAULT_STATE_PATH)]
    pub state: PathBuf,
    /// Read table names from environment variables instead of the state file
    #[arg(long)]
    pub from_env: bool,

    /// Where the snapshot is written
    #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
    pub snapshot: PathBuf,
    /// Skip writing the snapshot
    #[arg(long)]
    pub no_snapshot: bool,

    /// Load into an in-memory store instead of DynamoDB
    #[arg(long)]
    pub dry_run: bool,
    /// Load only the combined single table
    #[arg(long)]
    pub single_table_only: bool,
    /// Print the combined entry list as JSON to stdout
    #[arg(long)]
    pub print: bool,

    /// Per-request deadline in seconds (none by default)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Retries for throttled or failed batch writes
    #[arg(long, default_value_t = 0)]
    pub max_retries: usize,
}

impl SeedArgs {
    pub fn scale(&self) -> ScaleConfig {
        ScaleConfig {
            max_pair_evaluations: self.max_pair_evaluations,
            ..ScaleConfig::new(self.movies, self.users, self.lists)
        }
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            chunk_size: MAX_BATCH_ITEMS,
            retry: RetryPolicy::disabled().with_max_retries(self.max_retries),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    fn targets(&self) -> Result<TableTargets> {
        if self.dry_run {
            return Ok(TableTargets::logical(self.single_table_only));
        }
        let source = if self.from_env {
            OutputSource::from_process_env()
        } else {
            OutputSource::from_state_file(&self.state)?
        };
        Ok(TableTargets::resolve(&source, self.single_table_only)?)
    }
}

pub fn cmd_seed(args: SeedArgs) -> Result<()> {
    let targets = args.targets()?;
    let scale = args.scale();

    println!(
        "{} {} movies, {} users, {} lists",
        "Generating".green().bold(),
        scale.movies,
        scale.users,
        scale.lists
    );
    let dataset = match args.seed {
        Some(seed) => Dataset::seeded(seed, &scale)?,
        None => Dataset::generate(thread_rng(), &scale)?,
    };
    for kind in EntityKind::ALL {
        println!("  {} {:<12} {}", "→".yellow(), kind.as_str(), dataset.len(kind));
    }

    if !args.no_snapshot {
        dataset
            .write_snapshot(&args.snapshot)
            .with_context(|| format!("writing snapshot {}", args.snapshot.display()))?;
        println!("  {} {}", "→".cyan(), args.snapshot.display());
    }

    if args.print {
        println!("{}", serde_json::to_string_pretty(&dataset.combined())?);
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;

    rt.block_on(load_async(&args, &targets, &dataset))
}

async fn load_async(args: &SeedArgs, targets: &TableTargets, dataset: &Dataset) -> Result<()> {
    let memory = args.dry_run.then(|| Arc::new(InMemoryStore::new()));
    let writer: Arc<dyn BatchWriter> = match &memory {
        Some(store) => store.clone() as Arc<dyn BatchWriter>,
        None => Arc::new(DynamoDbWriter::from_env().await),
    };

    let loader = BulkLoader::new(writer, args.loader_config());
    let mut pending = PendingWrites::new();
    let dispatched = dispatch_all(&loader, &mut pending, targets, dataset)?;

    println!(
        "{} {} batch writes{}",
        "Loading".green().bold(),
        dispatched,
        if args.dry_run { " (dry run)" } else { "" }
    );

    let report = pending.settle().await;
    print_settlement(&report);

    if let Some(store) = memory {
        for (table, count) in store.table_counts() {
            println!("  {} {:<14} {} items", "→".cyan(), table, count);
        }
    }
    Ok(())
}

/// Dispatch every table's batches before any of them is awaited: the six
/// per-kind tables in generation order, then the combined table.
pub fn dispatch_all(
    loader: &BulkLoader,
    pending: &mut PendingWrites,
    targets: &TableTargets,
    dataset: &Dataset,
) -> Result<usize> {
    let mut dispatched = 0;
    if let Some(multi) = &targets.multi {
        for kind in EntityKind::ALL {
            dispatched += loader.load(pending, multi.for_kind(kind), &dataset.records(kind))?;
        }
    }
    dispatched += loader.load(pending, &targets.combined, &dataset.combined())?;
    Ok(dispatched)
}

pub fn settlement_line(outcome: &graphseed_loader::WriteOutcome) -> String {
    let retries = if outcome.attempts > 1 {
        format!(" after {} attempts", outcome.attempts)
    } else {
        String::new()
    };
    match &outcome.settlement {
        Settlement::Fulfilled(output) => format!(
            "{} batch {} {} ({} items, {} unprocessed){}",
            "fulfilled".green(),
            outcome.batch,
            outcome.table,
            outcome.items,
            output.unprocessed,
            retries
        ),
        Settlement::Rejected(err) => format!(
            "{} batch {} {} ({} items){}: {}",
            "rejected".red().bold(),
            outcome.batch,
            outcome.table,
            outcome.items,
            retries,
            err
        ),
    }
}

fn print_settlement(report: &SettlementReport) {
    for outcome in &report.outcomes {
        println!("  {}", settlement_line(outcome));
    }

    let status = if report.is_clean() {
        "ok".green().bold()
    } else {
        "partial".yellow().bold()
    };
    println!(
        "{} {} fulfilled, {} rejected",
        status,
        report.fulfilled_count(),
        report.rejected_count()
    );
    for (table, summary) in report.by_table() {
        if summary.rejected > 0 {
            println!(
                "  {} {}: {} of {} items not written",
                "→".red(),
                table,
                summary.items_failed,
                summary.items_failed + summary.items_written
            );
        }
    }
}
