//! Locating AFL crash artifacts and unpacking downloaded bundles.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::corpus::QUEUE_DIR;
use crate::error::FuzzkitError;

/// Marker file AFL writes into each fuzzer instance directory.
pub const FUZZER_STATS: &str = "fuzzer_stats";

/// Prefix of crash and hang file names.
const ARTIFACT_PREFIX: &str = "id";

/// True if any immediate subdirectory of `dir` holds a `fuzzer_stats` file.
pub fn has_fuzzer_stats(dir: &Path) -> Result<bool, FuzzkitError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() && entry.path().join(FUZZER_STATS).is_file() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Crash and hang files under `root`: names starting with `id`, outside any
/// `queue` directory. Sorted by path; a missing root yields nothing.
pub fn find_crash_artifacts(root: &Path) -> Result<Vec<PathBuf>, FuzzkitError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut artifacts = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != QUEUE_DIR);

    for entry in walker {
        let entry = entry.map_err(|source| FuzzkitError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !entry
            .file_name()
            .to_string_lossy()
            .starts_with(ARTIFACT_PREFIX)
        {
            continue;
        }
        if in_queue(root, entry.path()) {
            continue;
        }
        artifacts.push(entry.into_path());
    }

    Ok(artifacts)
}

fn in_queue(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == QUEUE_DIR))
}

/// Extract every `*.zip` directly inside `dir` in place, then delete it.
///
/// Returns the archives that were unpacked.
pub fn extract_archives(dir: &Path) -> Result<Vec<PathBuf>, FuzzkitError> {
    let mut archives: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
        })
        .collect();
    archives.sort();

    for archive in &archives {
        tracing::info!(archive = %archive.display(), "extracting artifact bundle");
        let file = fs::File::open(archive)?;
        let mut zip =
            zip::ZipArchive::new(file).map_err(|source| FuzzkitError::ArtifactExtract {
                path: archive.clone(),
                source,
            })?;
        zip.extract(dir)
            .map_err(|source| FuzzkitError::ArtifactExtract {
                path: archive.clone(),
                source,
            })?;
        fs::remove_file(archive)?;
    }

    Ok(archives)
}
