//! Panic deduplication by content hash.
//!
//! Every distinct panic text gets one record, stored as `<sha256>.panic`.
//! The record holds the panic text once followed by every artifact that
//! produced it. Artifacts without a panic line share the record of the
//! empty text.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::FuzzkitError;

/// Extension of persisted panic records.
pub const RECORD_EXTENSION: &str = "panic";

/// Lowercase hex SHA-256 of `text`.
pub fn panic_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// File name of the record for `text`.
pub fn record_file_name(text: &str) -> String {
    format!("{}.{RECORD_EXTENSION}", panic_hash(text))
}

/// One deduplicated panic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanicRecord {
    pub hash: String,
    /// First line mentioning a panic; empty when the artifact produced none.
    pub panic: String,
    pub artifacts: Vec<PathBuf>,
}

impl PanicRecord {
    /// Text stored in the record file.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.panic);
        out.push('\n');
        for artifact in &self.artifacts {
            out.push_str(&artifact.display().to_string());
            out.push('\n');
        }
        out
    }
}

/// Panic records in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct PanicLedger {
    records: Vec<PanicRecord>,
    by_hash: HashMap<String, usize>,
}

impl PanicLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `artifact` produced `panic` (or no panic at all).
    ///
    /// Returns true if this is the first artifact with this panic text.
    pub fn add(&mut self, panic: Option<&str>, artifact: &Path) -> bool {
        let text = panic.unwrap_or_default();
        let hash = panic_hash(text);

        if let Some(&index) = self.by_hash.get(&hash) {
            self.records[index].artifacts.push(artifact.to_path_buf());
            return false;
        }

        self.by_hash.insert(hash.clone(), self.records.len());
        self.records.push(PanicRecord {
            hash,
            panic: text.to_string(),
            artifacts: vec![artifact.to_path_buf()],
        });
        true
    }

    pub fn records(&self) -> &[PanicRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write one `<hash>.panic` file per record into `dir`.
    pub fn persist(&self, dir: &Path) -> Result<Vec<PathBuf>, FuzzkitError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let path = dir.join(format!("{}.{RECORD_EXTENSION}", record.hash));
            fs::write(&path, record.render())?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Concatenate the record files at `paths`, ordered by file name.
pub fn merge_records(paths: &[PathBuf]) -> Result<String, FuzzkitError> {
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut merged = String::new();
    for path in sorted {
        merged.push_str(&fs::read_to_string(path)?);
        merged.push('\n');
    }
    Ok(merged)
}

/// Remove the record files at `paths`.
pub fn cleanup_records(paths: &[PathBuf]) -> Result<usize, FuzzkitError> {
    for path in paths {
        fs::remove_file(path)?;
    }
    Ok(paths.len())
}
