//! Aggregate fuzzing statistics from the AFL `summary` file.

use std::path::{Path, PathBuf};

/// Name of the summary file written next to the fuzzer output.
pub const SUMMARY_FILE: &str = "summary";
/// Line opening the excerpted statistics block.
pub const STATS_BEGIN: &str = "Summary stats";
/// Line closing the excerpted statistics block (included).
pub const STATS_END: &str = "Time without finds";

/// Lines from the [`STATS_BEGIN`] marker through the [`STATS_END`] marker.
///
/// `None` when either marker is missing or they appear out of order.
pub fn excerpt_summary(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let begin = lines.iter().position(|line| line.contains(STATS_BEGIN))?;
    let end = begin + lines[begin..].iter().position(|line| line.contains(STATS_END))?;

    let mut excerpt = lines[begin..=end].join("\n");
    excerpt.push('\n');
    Some(excerpt)
}

/// The `summary` file in `crash_root` or its parent directory.
pub fn locate_summary(crash_root: &Path) -> Option<PathBuf> {
    std::iter::once(crash_root)
        .chain(crash_root.parent())
        .map(|dir| dir.join(SUMMARY_FILE))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const WHATSUP: &str = "\
status check tool for afl-fuzz by Michal Zalewski

Individual fuzzers
==================

>>> main (0 days, 2 hrs) fuzzer PID: 1234 <<<

Summary stats
=============

       Fuzzers alive : 4
      Total run time : 0 days, 8 hours
         Total execs : 12 millions
       Crashes saved : 2
         Hangs saved : 1
  Time without finds : 12 minutes, 3 seconds

trailing noise
";

    #[test]
    fn excerpt_is_bounded_by_markers() {
        let excerpt = excerpt_summary(WHATSUP).expect("excerpt");
        assert!(excerpt.starts_with("Summary stats\n"));
        assert!(excerpt.ends_with("Time without finds : 12 minutes, 3 seconds\n"));
        assert!(excerpt.contains("Crashes saved : 2"));
        assert!(!excerpt.contains("trailing noise"));
        assert!(!excerpt.contains("Individual fuzzers"));
    }

    #[test]
    fn missing_marker_yields_none() {
        assert_eq!(excerpt_summary("Summary stats\nno end here\n"), None);
        assert_eq!(excerpt_summary("Time without finds\nSummary stats\n"), None);
    }

    #[test]
    fn summary_found_in_parent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("transaction");
        fs::create_dir_all(&root).expect("mkdir");
        assert_eq!(locate_summary(&root), None);

        fs::write(tmp.path().join("summary"), WHATSUP).expect("write");
        assert_eq!(locate_summary(&root), Some(tmp.path().join("summary")));
    }
}
