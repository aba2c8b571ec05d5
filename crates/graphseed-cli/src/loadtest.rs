//! `graphseed loadtest`: replay a named query against both APIs.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;

use graphseed_fixtures::Dataset;
use graphseed_loadtest::{
    sample_from_dataset, EndpointReport, EndpointSchedule, LoadTest, LoadTestConfig,
    LoadTestReport, QueryTemplate, DEFAULT_REPETITIONS,
};

use crate::deployment::{ApiTargets, OutputSource, DEFAULT_STATE_PATH};
use crate::seed::DEFAULT_SNAPSHOT_PATH;

#[derive(Args, Debug, Clone)]
pub struct LoadTestArgs {
    /// Query template to run (query1, query2, query3)
    #[arg(default_value = "query1")]
    pub query: String,

    /// Deployment state document
    #[arg(long, default_value = DEFAULT_STATE_PATH)]
    pub state: PathBuf,
    /// Read API endpoints from environment variables instead of the state file
    #[arg(long)]
    pub from_env: bool,
    /// Snapshot written by `seed`, used to pick the user
    #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
    pub snapshot: PathBuf,

    /// Requests per endpoint
    #[arg(long, default_value_t = DEFAULT_REPETITIONS)]
    pub repetitions: usize,
    /// Per-request deadline in seconds (none by default)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Run the two endpoints side by side instead of one after the other
    #[arg(long)]
    pub concurrent_endpoints: bool,
    /// RNG seed for picking the user
    #[arg(long)]
    pub seed: Option<u64>,
}

impl LoadTestArgs {
    pub fn template(&self) -> Result<&'static QueryTemplate> {
        QueryTemplate::find(&self.query).ok_or_else(|| {
            anyhow!(
                "unknown query {:?} (expected one of: {})",
                self.query,
                QueryTemplate::names().collect::<Vec<_>>().join(", ")
            )
        })
    }

    pub fn config(&self) -> LoadTestConfig {
        LoadTestConfig {
            repetitions: self.repetitions,
            timeout: self.timeout_secs.map(Duration::from_secs),
            schedule: if self.concurrent_endpoints {
                EndpointSchedule::Concurrent
            } else {
                EndpointSchedule::Sequential
            },
        }
    }
}

pub fn cmd_loadtest(args: LoadTestArgs) -> Result<()> {
    let template = args.template()?;
    let source = if args.from_env {
        OutputSource::from_process_env()
    } else {
        OutputSource::from_state_file(&args.state)?
    };
    let apis = ApiTargets::resolve(&source)?;

    let dataset = Dataset::read_snapshot(&args.snapshot)
        .with_context(|| format!("reading snapshot {}", args.snapshot.display()))?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let user_id = sample_from_dataset(&mut rng, &dataset)
        .ok_or_else(|| anyhow!("snapshot {} has no users", args.snapshot.display()))?;

    println!(
        "{} {} as {}",
        "Executing".green().bold(),
        template.name,
        user_id.bold()
    );

    let request = template.for_user(&user_id);
    let config = args.config();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;
    let report = rt.block_on(async {
        let harness = LoadTest::new(config)?;
        Ok::<_, anyhow::Error>(harness.run(&apis.endpoints(), &request).await)
    })?;

    print_report(&report);
    Ok(())
}

fn format_ms(d: Duration) -> String {
    format!("{:.1}ms", d.as_secs_f64() * 1000.0)
}

pub fn summary_line(report: &EndpointReport) -> String {
    let latency = match report.latency() {
        Some(l) => format!(
            "min {} / mean {} / max {}",
            format_ms(l.min),
            format_ms(l.mean),
            format_ms(l.max)
        ),
        None => "no responses".to_string(),
    };
    format!(
        "{}: {} ok, {} query errors, {} transport errors; {}",
        report.label,
        report.successes(),
        report.application_errors(),
        report.transport_errors(),
        latency
    )
}

fn print_report(report: &LoadTestReport) {
    for endpoint in &report.endpoints {
        let marker = if endpoint.successes() == endpoint.outcomes.len() {
            "→".cyan()
        } else {
            "→".red()
        };
        println!("  {} {}", marker, summary_line(endpoint));
    }
    let status = if report.total_failures() == 0 {
        "ok".green().bold()
    } else {
        "failures".yellow().bold()
    };
    println!(
        "{} {} requests, {} failed",
        status,
        report.total_requests(),
        report.total_failures()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use graphseed_loadtest::{QueryError, RequestOutcome};
    use serde_json::json;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        loadtest: LoadTestArgs,
    }

    fn parse(args: &[&str]) -> LoadTestArgs {
        Harness::parse_from(std::iter::once("loadtest").chain(args.iter().copied())).loadtest
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.template().unwrap().name, "query1");
        let config = args.config();
        assert_eq!(config.repetitions, 5);
        assert_eq!(config.schedule, EndpointSchedule::Sequential);
    }

    #[test]
    fn test_named_query_and_flags() {
        let args = parse(&["query3", "--concurrent-endpoints", "--timeout-secs", "2"]);
        assert_eq!(args.template().unwrap().name, "query3");
        let config = args.config();
        assert_eq!(config.schedule, EndpointSchedule::Concurrent);
        assert_eq!(config.timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_unknown_query() {
        let err = parse(&["query7"]).template().unwrap_err();
        assert!(err.to_string().contains("query1, query2, query3"));
    }

    #[test]
    fn test_summary_line() {
        let report = EndpointReport {
            label: "SingleTableAPI".into(),
            outcomes: vec![
                RequestOutcome {
                    iteration: 0,
                    elapsed: Duration::from_millis(12),
                    result: Ok(json!({})),
                },
                RequestOutcome {
                    iteration: 1,
                    elapsed: Duration::from_millis(3),
                    result: Err(QueryError::Transport("connection refused".into())),
                },
            ],
        };
        assert_eq!(
            summary_line(&report),
            "SingleTableAPI: 1 ok, 0 query errors, 1 transport errors; min 12.0ms / mean 12.0ms / max 12.0ms"
        );
    }
}
