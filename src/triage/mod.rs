//! Crash triage for AFL fuzzing runs.
//!
//! A triage starts from a single argument: a local AFL output directory or a
//! CI run id/URL. Crash and hang artifacts are located, replayed against a
//! release binary, and the resulting panics deduplicated into a summary.
//!
//! Fatal problems (an unfinished or failed run, the wrong workflow) abort the
//! whole procedure. Individual artifacts failing to reproduce do not.

pub mod artifacts;
pub mod ci;
pub mod dedup;
pub mod report;
pub mod reproduce;
pub mod resolve;
pub mod stats;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::config::TriageConfig;
use crate::error::FuzzkitError;

use ci::{CiClient, RunMetadata};
use dedup::PanicLedger;
pub use report::{CrashSummary, TriageReport};
use reproduce::{extract_panic, Reproducer, SourceCheckout};
pub use resolve::{resolve_reference, RunReference};

/// Usage text for the triage argument.
pub const TRIAGE_USAGE: &str = "\
Usage: fuzzkit triage <REF>

REF is one of:
  help | h        print this message
  <directory>     a local AFL output directory (one holding fuzzer_stats)
  <run id | URL>  a CI run of the fuzzing workflow, downloaded first
";

/// Result of a triage invocation.
#[derive(Clone, Debug)]
pub enum TriageOutcome {
    /// Usage was requested; nothing else happened.
    Help,
    Report(TriageReport),
}

/// Runs the triage procedure against a CI client.
pub struct Triager<'a> {
    ci: &'a dyn CiClient,
    config: TriageConfig,
    base: PathBuf,
    now: NaiveDateTime,
}

impl<'a> Triager<'a> {
    /// `base` is where work directories are created.
    pub fn new(ci: &'a dyn CiClient, config: TriageConfig, base: impl Into<PathBuf>) -> Self {
        Self {
            ci,
            config,
            base: base.into(),
            now: chrono::Local::now().naive_local(),
        }
    }

    /// Use a fixed time for naming local work directories.
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    /// Triage `arg`. `make_reproducer` receives the resolved source checkout
    /// and the work directory; it is only invoked once artifacts exist.
    pub fn run<R, F>(&self, arg: &str, make_reproducer: F) -> Result<TriageOutcome, FuzzkitError>
    where
        R: Reproducer,
        F: FnOnce(SourceCheckout, &Path) -> R,
    {
        let reference = resolve_reference(arg, &self.base, self.now)?;

        let (work_dir, crash_root, run) = match reference {
            RunReference::Help => return Ok(TriageOutcome::Help),
            RunReference::Local {
                crash_root,
                work_dir,
                ..
            } => {
                fs::create_dir_all(&work_dir)?;
                (work_dir, crash_root, None)
            }
            RunReference::Remote {
                run_id,
                work_dir,
                crash_root,
            } => {
                let run = self.fetch_run(&run_id, &work_dir)?;
                (work_dir, crash_root, Some(run))
            }
        };

        let mut summary = CrashSummary {
            stats: read_stats(&crash_root)?,
            run: run.clone(),
            ..CrashSummary::default()
        };

        let found = artifacts::find_crash_artifacts(&crash_root)?;
        tracing::info!(root = %crash_root.display(), artifacts = found.len(), "located crash artifacts");

        if !found.is_empty() {
            let checkout = match &run {
                Some(meta) => SourceCheckout::Clone {
                    url: self.config.repo_url.clone(),
                    commit: meta.head_sha.clone(),
                },
                None => SourceCheckout::Link {
                    target: self.config.local_repo.clone(),
                },
            };
            let mut reproducer = make_reproducer(checkout, &work_dir);
            reproducer.prepare()?;

            let ledger = reproduce_all(&reproducer, &found);
            let records = ledger.persist(&work_dir)?;
            summary.panics = dedup::merge_records(&records)?;
            dedup::cleanup_records(&records)?;

            summary.distinct_panics = ledger.len();
            summary.command = Some(reproducer.command_template());
            summary.artifacts = found.iter().map(|p| p.display().to_string()).collect();
        }

        let summary_path = work_dir.join(&self.config.summary_file);
        summary.write_to(&summary_path)?;

        let summary_copy = match (&run, crash_root.parent()) {
            (Some(_), Some(parent)) if parent.is_dir() => {
                let copy = parent.join(&self.config.summary_file);
                fs::copy(&summary_path, &copy)?;
                Some(copy)
            }
            _ => None,
        };

        Ok(TriageOutcome::Report(TriageReport {
            run_url: run.map(|meta| meta.url),
            summary,
            work_dir,
            summary_path,
            summary_copy,
        }))
    }

    /// Validate the run, then download and unpack its artifact bundle.
    fn fetch_run(&self, run_id: &str, work_dir: &Path) -> Result<RunMetadata, FuzzkitError> {
        let meta = self.ci.view_run(run_id)?;
        ci::validate_run(&meta, &self.config.workflow)?;
        tracing::info!(
            title = %meta.display_title,
            branch = %meta.head_branch,
            commit = %meta.head_sha,
            "processing run"
        );

        fs::create_dir_all(work_dir)?;
        self.ci
            .download_artifact(run_id, &self.config.artifact, work_dir)?;
        artifacts::extract_archives(work_dir)?;
        Ok(meta)
    }
}

fn read_stats(crash_root: &Path) -> Result<Option<String>, FuzzkitError> {
    let Some(path) = stats::locate_summary(crash_root) else {
        tracing::debug!(root = %crash_root.display(), "no summary file");
        return Ok(None);
    };
    let text = fs::read_to_string(&path)?;
    Ok(stats::excerpt_summary(&text))
}

/// Replay every artifact in order and collect their panics.
fn reproduce_all<R: Reproducer>(reproducer: &R, found: &[PathBuf]) -> PanicLedger {
    let mut ledger = PanicLedger::new();
    for artifact in found {
        match reproducer.reproduce(artifact) {
            Ok(output) => {
                let panic = extract_panic(&output);
                if panic.is_none() {
                    tracing::debug!(artifact = %artifact.display(), "no panic in output");
                }
                ledger.add(panic, artifact);
            }
            Err(err) => {
                tracing::warn!(artifact = %artifact.display(), error = %err, "reproduction failed");
                ledger.add(None, artifact);
            }
        }
    }
    ledger
}
