//! Reproducing crash artifacts against a release build.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::TriageConfig;
use crate::error::FuzzkitError;
use crate::harness::{program_name, run_checked};

/// Replays crash artifacts and captures what they print.
pub trait Reproducer {
    /// Make the reproduction binary available. Called once, and only when
    /// there is at least one artifact.
    fn prepare(&mut self) -> Result<(), FuzzkitError>;

    /// Run one artifact and return its combined stdout and stderr. The exit
    /// status is deliberately ignored: crashing is the expected outcome.
    fn reproduce(&self, artifact: &Path) -> Result<String, FuzzkitError>;

    /// Command shown in the report for reproducing an artifact by hand.
    fn command_template(&self) -> String;
}

/// Where the source tree used for reproduction comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceCheckout {
    /// Clone `url` and check out `commit`.
    Clone { url: String, commit: String },
    /// Symlink an existing checkout.
    Link { target: PathBuf },
}

impl SourceCheckout {
    /// Materialize the source tree at `dest`, reusing it if present.
    pub fn materialize(&self, dest: &Path) -> Result<(), FuzzkitError> {
        if dest.exists() {
            tracing::info!(repo = %dest.display(), "reusing existing checkout");
            return Ok(());
        }

        match self {
            SourceCheckout::Clone { url, commit } => {
                tracing::info!(%url, %commit, "cloning repository");
                run_checked(Command::new("git").args(["clone", url.as_str()]).arg(dest))?;
                run_checked(
                    Command::new("git")
                        .arg("-C")
                        .arg(dest)
                        .args(["checkout", commit.as_str()]),
                )?;
            }
            SourceCheckout::Link { target } => {
                let target = fs::canonicalize(target)?;
                tracing::info!(checkout = %target.display(), "linking repository");
                link_dir(&target, dest)?;
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn link_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn link_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// [`Reproducer`] that builds the release binary from a source checkout and
/// runs it directly, bypassing the fuzz wrapper.
#[derive(Clone, Debug)]
pub struct ReleaseBinary {
    checkout: SourceCheckout,
    repo_dir: PathBuf,
    config: TriageConfig,
}

impl ReleaseBinary {
    pub fn new(checkout: SourceCheckout, work_dir: &Path, config: TriageConfig) -> Self {
        Self {
            checkout,
            repo_dir: work_dir.join("repo"),
            config,
        }
    }

    pub fn binary_path(&self) -> PathBuf {
        self.config.binary_path(&self.repo_dir)
    }
}

impl Reproducer for ReleaseBinary {
    fn prepare(&mut self) -> Result<(), FuzzkitError> {
        self.checkout.materialize(&self.repo_dir)?;

        tracing::info!(binary = %self.config.binary, "building release binary");
        run_checked(
            Command::new("cargo")
                .current_dir(self.repo_dir.join(&self.config.fuzz_dir))
                .args(["build", "--release", "--bin", self.config.binary.as_str()]),
        )?;
        Ok(())
    }

    fn reproduce(&self, artifact: &Path) -> Result<String, FuzzkitError> {
        let mut cmd = Command::new(self.binary_path());
        cmd.arg(artifact);
        let output = cmd.output().map_err(|source| FuzzkitError::CommandSpawn {
            program: program_name(&cmd),
            source,
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }

    fn command_template(&self) -> String {
        format!("{} <artifact>", self.binary_path().display())
    }
}

/// First line of `output` mentioning a panic.
pub fn extract_panic(output: &str) -> Option<&str> {
    output
        .lines()
        .find(|line| line.contains("panic"))
        .map(str::trim_end)
}
