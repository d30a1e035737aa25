//! Corpus enumeration for fuzz targets.
//!
//! Inputs for a target come from two layouts under the project root:
//!
//! - `afl/<target>/*/*/queue/*` — queues of an AFL output tree
//! - `corpus/<target>/*` — a flat corpus directory
//!
//! Both sources are concatenated as-is. A target with neither directory
//! simply has no corpus yet, which is not an error.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::FuzzkitError;

/// Directory holding AFL output trees, relative to the project root.
pub const AFL_DIR: &str = "afl";
/// Directory holding flat corpora, relative to the project root.
pub const CORPUS_DIR: &str = "corpus";
/// Path component naming an AFL queue directory.
pub const QUEUE_DIR: &str = "queue";

/// Enumerate every corpus file for `target` under `root`.
pub fn enumerate_corpus(root: &Path, target: &str) -> Result<Vec<PathBuf>, FuzzkitError> {
    let mut files = afl_queue_files(&root.join(AFL_DIR).join(target))?;
    files.extend(flat_corpus_files(&root.join(CORPUS_DIR).join(target))?);
    Ok(files)
}

/// Files sitting in a `queue` directory exactly three levels below `afl_root`.
fn afl_queue_files(afl_root: &Path) -> Result<Vec<PathBuf>, FuzzkitError> {
    if !afl_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(afl_root)
        .follow_links(true)
        .min_depth(4)
        .max_depth(4)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| FuzzkitError::Walk {
            path: afl_root.to_path_buf(),
            source,
        })?;

        let in_queue = entry
            .path()
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name == QUEUE_DIR);

        if in_queue && entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn flat_corpus_files(dir: &Path) -> Result<Vec<PathBuf>, FuzzkitError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| FuzzkitError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// File name of the enumeration cache for `target`.
pub fn corpus_list_name(target: &str) -> String {
    format!("corpus_files_{target}.lst")
}

/// Write the enumeration cache `corpus_files_<target>.lst` into `dir`,
/// replacing any list left over from a previous run.
pub fn write_corpus_list(
    dir: &Path,
    target: &str,
    files: &[PathBuf],
) -> Result<PathBuf, FuzzkitError> {
    let path = dir.join(corpus_list_name(target));
    if path.exists() {
        fs::remove_file(&path)?;
    }

    let mut out = fs::File::create(&path)?;
    for file in files {
        writeln!(out, "{}", file.display())?;
    }

    Ok(path)
}
