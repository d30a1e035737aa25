//! Coverage collection: build instrumented targets and replay their corpora.

use std::fmt;
use std::path::PathBuf;

use crate::config::{BuildConfig, ProfilePattern};
use crate::corpus;
use crate::error::FuzzkitError;
use crate::harness::FuzzHarness;
use crate::pool::{PoolOutcome, WorkerPool};

/// Outcome for a single fuzz target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetStatus {
    /// No corpus was found, so nothing was built or replayed.
    Skipped,
    /// The corpus was replayed through the instrumented binary.
    Replayed(PoolOutcome),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetCoverage {
    pub target: String,
    pub status: TargetStatus,
}

/// The result of a coverage collection run.
#[derive(Clone, Debug, Default)]
pub struct CoverageReport {
    pub targets: Vec<TargetCoverage>,
}

impl CoverageReport {
    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .filter(|t| t.status == TargetStatus::Skipped)
            .map(|t| t.target.as_str())
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Coverage collection:")?;
        for entry in &self.targets {
            match &entry.status {
                TargetStatus::Skipped => {
                    writeln!(f, "  {}: skipped (no corpus)", entry.target)?;
                }
                TargetStatus::Replayed(outcome) => {
                    writeln!(
                        f,
                        "  {}: {} input(s) replayed, {} failed",
                        entry.target,
                        outcome.total(),
                        outcome.failed
                    )?;
                }
            }
        }
        Ok(())
    }
}

/// Drives build-and-replay for a list of targets.
pub struct CoverageDriver<'a, H: FuzzHarness> {
    harness: &'a H,
    project_root: PathBuf,
    profile_dir: PathBuf,
    pool: WorkerPool,
    build: BuildConfig,
}

impl<'a, H: FuzzHarness> CoverageDriver<'a, H> {
    pub fn new(
        harness: &'a H,
        project_root: impl Into<PathBuf>,
        profile_dir: impl Into<PathBuf>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            harness,
            project_root: project_root.into(),
            profile_dir: profile_dir.into(),
            pool,
            build: BuildConfig::coverage(),
        }
    }

    /// Collect coverage for `targets`, or for every listed target when empty.
    pub fn run(&self, targets: &[String]) -> Result<CoverageReport, FuzzkitError> {
        let targets = if targets.is_empty() {
            self.harness.list_targets()?
        } else {
            targets.to_vec()
        };
        if targets.is_empty() {
            return Err(FuzzkitError::NoTargets);
        }

        let mut report = CoverageReport::default();
        for target in targets {
            let status = self.collect_target(&target)?;
            report.targets.push(TargetCoverage { target, status });
        }
        Ok(report)
    }

    fn collect_target(&self, target: &str) -> Result<TargetStatus, FuzzkitError> {
        let files = corpus::enumerate_corpus(&self.project_root, target)?;
        if files.is_empty() {
            tracing::info!(fuzz_target = target, "no corpus found, skipping");
            return Ok(TargetStatus::Skipped);
        }

        self.harness.build(target, &self.build)?;
        let list = corpus::write_corpus_list(&self.project_root, target, &files)?;
        tracing::info!(
            fuzz_target = target,
            inputs = files.len(),
            workers = self.pool.workers(),
            list = %list.display(),
            "replaying corpus"
        );

        let outcome = self.pool.run(&files, |worker, file| {
            let config = self
                .build
                .with_profile(ProfilePattern::new(&self.profile_dir, target, worker));
            match self.harness.replay(target, file, &config) {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(format!("replay exited with {status}")),
                Err(err) => Err(err.to_string()),
            }
        })?;

        if outcome.failed > 0 {
            tracing::warn!(
                fuzz_target = target,
                failed = outcome.failed,
                "some inputs failed during replay"
            );
        }
        Ok(TargetStatus::Replayed(outcome))
    }
}
