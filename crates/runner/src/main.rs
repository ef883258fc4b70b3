//! finprobe CLI - Main Entry Point
//!
//! Runs expectation suites against a live API, or checks a saved response
//! against a single case offline.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use finprobe_runner::output::{self, OutputFormat};
use finprobe_runner::{RunnerConfig, SuiteRunner};
use finprobe_validator::{validate_api_response, ActualResponse, ExpectationDocument, TestSuite};

/// finprobe - declarative API response checks
#[derive(Parser)]
#[command(name = "finprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run suites against the API under test
    Run {
        /// Suite files (.json, .yaml, .yml)
        #[arg(required = true)]
        suites: Vec<PathBuf>,

        /// Configuration file
        #[arg(long, env = "FINPROBE_CONFIG", default_value = "finprobe.toml")]
        config: PathBuf,

        /// Override the configured base URL
        #[arg(long, env = "FINPROBE_BASE_URL")]
        base_url: Option<String>,

        /// Only run cases carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Skip writing result files
        #[arg(long)]
        no_write: bool,
    },

    /// Validate a saved response against one case without sending anything
    Check {
        /// Case document
        case: PathBuf,

        /// Response JSON: `{ "status", "headers", "data", "duration" }`
        response: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let outcome = match cli.command {
        Commands::Run {
            suites,
            config,
            base_url,
            tag,
            no_write,
        } => run(&suites, &config, base_url, tag.as_deref(), no_write, cli.format).await,
        Commands::Check { case, response } => check(&case, &response, cli.format),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(2)
        }
    }
}

async fn run(
    paths: &[PathBuf],
    config_path: &Path,
    base_url: Option<String>,
    tag: Option<&str>,
    no_write: bool,
    format: OutputFormat,
) -> anyhow::Result<bool> {
    let mut config = RunnerConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }

    let mut suites = Vec::with_capacity(paths.len());
    for path in paths {
        let suite = TestSuite::from_file(path)
            .with_context(|| format!("loading suite {}", path.display()))?;
        let suite = match tag {
            Some(tag) => suite.filter_by_tag(tag),
            None => suite,
        };
        if suite.cases.is_empty() {
            output::print_warning(&format!("Suite '{}' has no cases to run", suite.name));
        }
        suites.push(suite);
    }

    let runner = SuiteRunner::new(config)?;
    let results = runner.run_suites(suites).await?;

    if !no_write {
        for result in &results {
            runner.write_results(result)?;
        }
    }

    output::print_suites(&results, format);
    Ok(results.iter().all(|r| r.success()))
}

fn check(case: &Path, response: &Path, format: OutputFormat) -> anyhow::Result<bool> {
    let doc = ExpectationDocument::from_file(case)
        .with_context(|| format!("loading case {}", case.display()))?;
    let content = std::fs::read_to_string(response)
        .with_context(|| format!("reading {}", response.display()))?;
    let response: ActualResponse = serde_json::from_str(&content)?;

    match validate_api_response(&doc, &response) {
        Ok(report) => {
            output::print_report(&report, format);
            Ok(true)
        }
        Err(e) => {
            output::print_error(&format!("{} [{}]", e, e.category()));
            Ok(false)
        }
    }
}
