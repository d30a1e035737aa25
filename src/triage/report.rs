//! Crash summary report and terminal formatting.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FuzzkitError;

use super::ci::RunMetadata;

/// The triage result written to `crash_summary.txt` and echoed to stdout.
#[derive(Clone, Debug, Default)]
pub struct CrashSummary {
    /// Metadata of the triaged run; absent for local directories.
    pub run: Option<RunMetadata>,
    /// Excerpt of the aggregate fuzzing statistics, if available.
    pub stats: Option<String>,
    /// Crash and hang files found.
    pub artifacts: Vec<String>,
    /// How to reproduce a single artifact by hand.
    pub command: Option<String>,
    /// Merged panic records.
    pub panics: String,
    /// Number of distinct panic records.
    pub distinct_panics: usize,
}

impl CrashSummary {
    pub fn has_crashes(&self) -> bool {
        !self.artifacts.is_empty()
    }

    pub fn write_to(&self, path: &Path) -> Result<(), FuzzkitError> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}

impl fmt::Display for CrashSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(run) = &self.run {
            writeln!(f, "status: {}", run.status)?;
            writeln!(f, "conclusion: {}", run.conclusion)?;
            writeln!(f, "branch: {}", run.head_branch)?;
            writeln!(f, "commit: {}", run.head_sha)?;
            writeln!(f, "title: {}", run.display_title)?;
            writeln!(f)?;
        }

        if let Some(stats) = &self.stats {
            write!(f, "{stats}")?;
            writeln!(f)?;
        }

        if !self.has_crashes() {
            return writeln!(f, "No crashes found");
        }

        writeln!(f, "Crashes/hangs found: {}", self.artifacts.len())?;
        for artifact in &self.artifacts {
            writeln!(f, "  {artifact}")?;
        }
        writeln!(f)?;

        writeln!(f, "Distinct panics: {}", self.distinct_panics)?;
        if let Some(command) = &self.command {
            writeln!(f, "Reproduce with: {command}")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.panics)
    }
}

/// What the triage command prints once the summary has been written.
#[derive(Clone, Debug)]
pub struct TriageReport {
    /// URL of the triaged CI run (remote runs only).
    pub run_url: Option<String>,
    pub summary: CrashSummary,
    pub work_dir: PathBuf,
    pub summary_path: PathBuf,
    /// Copy of the summary placed next to the crash root (remote runs only).
    pub summary_copy: Option<PathBuf>,
}

impl fmt::Display for TriageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(url) = &self.run_url {
            writeln!(f, "Run: {url}")?;
            writeln!(f)?;
        }
        write!(f, "{}", self.summary)?;
        writeln!(f)?;
        writeln!(f, "Work directory: {}", self.work_dir.display())?;
        writeln!(f, "Summary file: {}", self.summary_path.display())?;
        if let Some(copy) = &self.summary_copy {
            writeln!(f, "Summary copy: {}", copy.display())?;
        }
        Ok(())
    }
}
