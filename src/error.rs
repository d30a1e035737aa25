use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// The main error type for fuzzkit operations.
///
/// Only fatal conditions are represented here. A fuzz input that crashes or
/// hangs its target is an expected outcome and never becomes an error.
#[derive(Debug, Error)]
pub enum FuzzkitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed while traversing {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Failed to parse run metadata for run {run_id}: {source}")]
    RunMetadataParse {
        run_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Run is still in progress, come back later: {url}")]
    RunInProgress { url: String },

    #[error("Run failed, nothing to process: {url}")]
    RunFailed { url: String },

    #[error("Run belongs to workflow '{name}', expected '{expected}': {url}")]
    WrongWorkflow {
        name: String,
        expected: String,
        url: String,
    },

    #[error("Invalid run reference '{input}': {message}")]
    InvalidRunReference { input: String, message: String },

    #[error("Failed to extract archive {path}: {source}")]
    ArtifactExtract {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Replay worker pool unavailable: {0}")]
    ReplayUnavailable(String),

    #[error("No fuzz targets to process")]
    NoTargets,
}
