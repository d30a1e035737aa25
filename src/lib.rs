//! Fuzzkit: coverage collection and crash triage for AFL-style fuzzing.
//!
//! Fuzzkit drives external tools (the fuzz build/run wrapper, the CI
//! command-line client, cargo) and does the bookkeeping around them:
//! enumerating corpora, replaying them in parallel with per-worker
//! profiling output, locating crash artifacts, and deduplicating panics.
//!
//! # Modules
//!
//! - [`corpus`]: Corpus enumeration for fuzz targets
//! - [`coverage`]: Instrumented build and parallel corpus replay
//! - [`triage`]: Crash reproduction, panic deduplication, and reporting
//! - [`pool`]: Worker pool used for replay
//! - [`config`]: Build configuration and tool locations
//! - [`error`]: Error types for fuzzkit operations

pub mod config;
pub mod corpus;
pub mod coverage;
pub mod error;
pub mod harness;
pub mod pool;
pub mod triage;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{ToolPaths, TriageConfig};
use coverage::CoverageDriver;
use harness::ScriptHarness;
use pool::{HaltPolicy, WorkerPool};
use triage::ci::GhCli;
use triage::reproduce::ReleaseBinary;
use triage::{TriageOutcome, Triager};

pub use error::FuzzkitError;

/// The fuzzkit CLI application.
#[derive(Parser)]
#[command(name = "fuzzkit")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Replay stored corpora through coverage-instrumented fuzz targets.
    Coverage(CoverageArgs),
    /// Reproduce and deduplicate crashes from a local or CI fuzzing run.
    Triage(TriageArgs),
}

/// Arguments for the coverage subcommand.
#[derive(clap::Args)]
struct CoverageArgs {
    /// Fuzz targets to process (default: every target the listing script prints).
    targets: Vec<String>,

    /// Project root holding the `afl/` and `corpus/` directories.
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Directory receiving the per-worker profiling files.
    #[arg(long, default_value = "coverage")]
    profile_dir: PathBuf,

    /// Number of replay workers (default: available parallelism).
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Stop dispatching inputs after the first failing replay.
    #[arg(long)]
    halt_on_failure: bool,

    /// Fuzz build/run wrapper script.
    #[arg(long, env = "FUZZKIT_FUZZ_SCRIPT", default_value = "./fuzz.sh")]
    fuzz_script: PathBuf,

    /// Script listing fuzz target names.
    #[arg(long, env = "FUZZKIT_LIST_SCRIPT", default_value = "./list-fuzz-targets.sh")]
    list_script: PathBuf,

    /// Build mode passed to the wrapper script.
    #[arg(long, env = "FUZZKIT_MODE", default_value = "simple")]
    mode: String,
}

/// Arguments for the triage subcommand.
#[derive(clap::Args)]
struct TriageArgs {
    /// `help`, a local AFL output directory, or a CI run id/URL.
    reference: String,

    /// Directory in which work directories are created.
    #[arg(long, default_value = ".")]
    work_root: PathBuf,

    /// GitHub CLI executable.
    #[arg(long, env = "FUZZKIT_GH", default_value = "gh")]
    gh: PathBuf,

    /// Workflow a CI run must belong to.
    #[arg(long, default_value = "Fuzzing")]
    workflow: String,

    /// Artifact bundle downloaded from the CI run.
    #[arg(long, default_value = "fuzz-results")]
    artifact: String,

    /// Repository cloned to reproduce crashes of a CI run.
    #[arg(
        long,
        env = "FUZZKIT_REPO_URL",
        default_value = "https://github.com/radixdlt/radixdlt-scrypto"
    )]
    repo_url: String,

    /// Existing checkout used to reproduce crashes of a local directory.
    #[arg(long, default_value = ".")]
    local_repo: PathBuf,

    /// Fuzz crate directory inside the repository.
    #[arg(long, default_value = "fuzz-tests")]
    fuzz_dir: PathBuf,

    /// Release binary used to reproduce crashes.
    #[arg(long, default_value = "transaction")]
    binary: String,
}

impl TriageArgs {
    fn config(&self) -> TriageConfig {
        TriageConfig {
            workflow: self.workflow.clone(),
            artifact: self.artifact.clone(),
            repo_url: self.repo_url.clone(),
            local_repo: self.local_repo.clone(),
            fuzz_dir: self.fuzz_dir.clone(),
            binary: self.binary.clone(),
            ..TriageConfig::default()
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over the
/// verbosity flags.
pub fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fuzzkit={level}")));

    // A subscriber may already be installed when embedded in another program.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the fuzzkit CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), FuzzkitError> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Coverage(args)) => run_coverage(args),
        Some(Commands::Triage(args)) => run_triage(args),
        None => {
            println!("fuzzkit {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Coverage collection and crash triage for AFL-style fuzzing runs.");
            println!();
            println!("Run 'fuzzkit --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the coverage subcommand.
fn run_coverage(args: CoverageArgs) -> Result<(), FuzzkitError> {
    let tools = ToolPaths {
        fuzz_script: args.fuzz_script,
        list_script: args.list_script,
        mode: args.mode,
    };
    let project_root = std::fs::canonicalize(&args.project_root)?;
    let harness = ScriptHarness::new(tools, &project_root);

    let halt = if args.halt_on_failure {
        HaltPolicy::OnFirstFailure
    } else {
        HaltPolicy::Never
    };
    let pool = WorkerPool::new(args.jobs.unwrap_or_else(WorkerPool::default_size), halt);

    std::fs::create_dir_all(&args.profile_dir)?;
    let profile_dir = std::fs::canonicalize(&args.profile_dir)?;

    let driver = CoverageDriver::new(&harness, &project_root, profile_dir, pool);
    let report = driver.run(&args.targets)?;
    print!("{}", report);
    Ok(())
}

/// Execute the triage subcommand.
fn run_triage(args: TriageArgs) -> Result<(), FuzzkitError> {
    let config = args.config();
    let gh = GhCli::new(&args.gh);
    let triager = Triager::new(&gh, config.clone(), &args.work_root);

    let outcome = triager.run(&args.reference, |checkout, work_dir| {
        ReleaseBinary::new(checkout, work_dir, config.clone())
    })?;

    match outcome {
        TriageOutcome::Help => print!("{}", triage::TRIAGE_USAGE),
        TriageOutcome::Report(report) => print!("{}", report),
    }
    Ok(())
}
