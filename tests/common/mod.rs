#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub fn touch(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

/// Write an executable shell script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    touch(path, &format!("#!/bin/sh\n{body}"));
    let mut perms = fs::metadata(path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod script");
    path.to_path_buf()
}

/// Lay out a finished AFL output directory with a single fuzzer instance.
pub fn afl_output(root: &Path) {
    touch(&root.join("main/fuzzer_stats"), "start_time : 0\n");
    touch(&root.join("main/queue/id:000000,orig:seed"), "seed");
}

pub const RUN_VIEW_IN_PROGRESS: &str = r#"{"status":"in_progress","conclusion":"","url":"https://github.com/org/repo/actions/runs/77","workflowName":"Fuzzing","headBranch":"develop","headSha":"abc","displayTitle":"Nightly"}"#;
