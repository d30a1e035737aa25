//! Continuous-integration run metadata and artifact download.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::error::FuzzkitError;
use crate::harness::run_checked;

/// Fields requested from `gh run view --json`.
pub const RUN_VIEW_FIELDS: &str =
    "status,conclusion,url,workflowName,headBranch,headSha,displayTitle";

/// Metadata of a CI run.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub status: String,
    #[serde(default)]
    pub conclusion: String,
    pub url: String,
    pub workflow_name: String,
    #[serde(default)]
    pub head_branch: String,
    #[serde(default)]
    pub head_sha: String,
    #[serde(default)]
    pub display_title: String,
}

impl RunMetadata {
    pub fn from_json_str(run_id: &str, json: &str) -> Result<Self, FuzzkitError> {
        serde_json::from_str(json).map_err(|source| FuzzkitError::RunMetadataParse {
            run_id: run_id.to_string(),
            source,
        })
    }
}

/// Remote operations needed to triage a CI run.
pub trait CiClient {
    fn view_run(&self, run_id: &str) -> Result<RunMetadata, FuzzkitError>;

    /// Download artifact `name` of the run into `dest`.
    fn download_artifact(&self, run_id: &str, name: &str, dest: &Path)
        -> Result<(), FuzzkitError>;
}

/// [`CiClient`] backed by the GitHub CLI.
#[derive(Clone, Debug)]
pub struct GhCli {
    program: PathBuf,
}

impl GhCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CiClient for GhCli {
    fn view_run(&self, run_id: &str) -> Result<RunMetadata, FuzzkitError> {
        let output = run_checked(
            Command::new(&self.program)
                .args(["run", "view", run_id, "--json", RUN_VIEW_FIELDS]),
        )?;
        RunMetadata::from_json_str(run_id, &String::from_utf8_lossy(&output.stdout))
    }

    fn download_artifact(
        &self,
        run_id: &str,
        name: &str,
        dest: &Path,
    ) -> Result<(), FuzzkitError> {
        tracing::info!(run_id, artifact = name, dest = %dest.display(), "downloading artifact");
        run_checked(
            Command::new(&self.program)
                .args(["run", "download", run_id, "-n", name, "-D"])
                .arg(dest),
        )?;
        Ok(())
    }
}

/// Check that a run is finished, did not fail, and belongs to `workflow`.
pub fn validate_run(meta: &RunMetadata, workflow: &str) -> Result<(), FuzzkitError> {
    if meta.status == "in_progress" {
        return Err(FuzzkitError::RunInProgress {
            url: meta.url.clone(),
        });
    }
    if meta.conclusion == "failure" {
        return Err(FuzzkitError::RunFailed {
            url: meta.url.clone(),
        });
    }
    if meta.workflow_name != workflow {
        return Err(FuzzkitError::WrongWorkflow {
            name: meta.workflow_name.clone(),
            expected: workflow.to_string(),
            url: meta.url.clone(),
        });
    }
    Ok(())
}
