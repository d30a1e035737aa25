use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::FuzzkitError;

use super::artifacts::has_fuzzer_stats;

/// Crash root of a downloaded run, relative to its work directory.
pub const REMOTE_CRASH_ROOT: &str = "afl/transaction";

/// What a triage argument refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunReference {
    /// The user asked for usage information.
    Help,
    /// A local AFL output directory.
    Local {
        crash_root: PathBuf,
        work_dir: PathBuf,
        /// False when the directory has no `fuzzer_stats` below it.
        is_afl_output: bool,
    },
    /// A CI run to be downloaded.
    Remote {
        run_id: String,
        work_dir: PathBuf,
        crash_root: PathBuf,
    },
}

/// Resolve the single triage argument.
///
/// Work directories are placed under `base`. `now` names the work directory
/// of a local triage.
pub fn resolve_reference(
    arg: &str,
    base: &Path,
    now: NaiveDateTime,
) -> Result<RunReference, FuzzkitError> {
    if arg == "help" || arg == "h" {
        return Ok(RunReference::Help);
    }

    let path = Path::new(arg);
    if path.is_dir() {
        let is_afl_output = match has_fuzzer_stats(path) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot inspect directory");
                false
            }
        };
        if !is_afl_output {
            tracing::warn!(path = %path.display(), "not an AFL output directory");
        }
        let work_dir = base.join(format!("afl_{}", now.format("%Y%m%d_%H%M%S")));
        return Ok(RunReference::Local {
            crash_root: path.to_path_buf(),
            work_dir,
            is_afl_output,
        });
    }

    let run_id = parse_run_id(arg)?;
    let work_dir = base.join(format!("run_{run_id}"));
    let crash_root = work_dir.join(REMOTE_CRASH_ROOT);
    Ok(RunReference::Remote {
        run_id,
        work_dir,
        crash_root,
    })
}

/// Extract the run id from a bare id or a run URL (its last path segment).
pub fn parse_run_id(input: &str) -> Result<String, FuzzkitError> {
    let trimmed = input.trim();
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        let url = url::Url::parse(trimmed).map_err(|source| FuzzkitError::InvalidRunReference {
            input: input.to_string(),
            message: format!("invalid URL: {source}"),
        })?;
        url.path_segments()
            .and_then(|segments| segments.filter(|seg| !seg.is_empty()).last())
            .map(str::to_string)
            .unwrap_or_default()
    } else {
        trimmed
            .rsplit('/')
            .find(|seg| !seg.is_empty())
            .unwrap_or_default()
            .to_string()
    };

    if candidate.is_empty() || !candidate.chars().all(|c| c.is_ascii_digit()) {
        return Err(FuzzkitError::InvalidRunReference {
            input: input.to_string(),
            message: "expected a run id or a run URL ending in one".to_string(),
        });
    }

    Ok(candidate)
}
