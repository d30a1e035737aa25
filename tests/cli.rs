use assert_cmd::Command;
use predicates::prelude::*;

mod common;

fn fuzzkit() -> Command {
    let mut cmd = Command::cargo_bin("fuzzkit").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn runs() {
    fuzzkit().assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = fuzzkit();
    cmd.arg("-V");
    cmd.assert().success().stdout("fuzzkit 0.1.0\n");
}

// Triage subcommand tests

#[test]
fn triage_help_keyword_prints_usage() {
    for keyword in ["help", "h"] {
        fuzzkit()
            .args(["triage", keyword])
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage: fuzzkit triage <REF>"));
    }
}

#[test]
fn triage_requires_reference() {
    fuzzkit().arg("triage").assert().failure();
}

#[test]
fn triage_local_output_without_crashes() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    common::afl_output(&out);

    fuzzkit()
        .arg("triage")
        .arg(&out)
        .arg("--work-root")
        .arg(tmp.path())
        // Any CI call would fail to spawn.
        .args(["--gh", "fuzzkit-no-such-gh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No crashes found"))
        .stdout(predicate::str::contains("crash_summary.txt"))
        .stdout(predicate::str::contains("Run:").not());
}

#[test]
fn triage_invalid_reference_fails() {
    let tmp = tempfile::tempdir().unwrap();
    fuzzkit()
        .args(["triage", "definitely-not-a-run"])
        .arg("--work-root")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid run reference"));
}

#[cfg(unix)]
#[test]
fn triage_in_progress_run_fails_before_download() {
    let tmp = tempfile::tempdir().unwrap();
    let marker = tmp.path().join("downloaded");
    let gh = common::write_script(
        &tmp.path().join("gh"),
        &format!(
            "case \"$2\" in\n  view) echo '{}' ;;\n  download) touch '{}' ;;\nesac\n",
            common::RUN_VIEW_IN_PROGRESS,
            marker.display()
        ),
    );

    fuzzkit()
        .args(["triage", "https://github.com/org/repo/actions/runs/77"])
        .arg("--work-root")
        .arg(tmp.path())
        .arg("--gh")
        .arg(&gh)
        .assert()
        .failure()
        .stderr(predicate::str::contains("come back later"))
        .stderr(predicate::str::contains("actions/runs/77"));

    assert!(!marker.exists());
    assert!(!tmp.path().join("run_77").exists());
}

// Coverage subcommand tests

#[cfg(unix)]
#[test]
fn coverage_skips_target_without_corpus() {
    let tmp = tempfile::tempdir().unwrap();
    let marker = tmp.path().join("built");
    let script = common::write_script(
        &tmp.path().join("fuzz.sh"),
        &format!("touch '{}'\n", marker.display()),
    );

    fuzzkit()
        .args(["coverage", "transaction"])
        .arg("--project-root")
        .arg(tmp.path())
        .arg("--profile-dir")
        .arg(tmp.path().join("cov"))
        .arg("--fuzz-script")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("transaction: skipped (no corpus)"))
        .stderr(predicate::str::contains("skipping"));

    assert!(!marker.exists());
}

#[cfg(unix)]
#[test]
fn coverage_replays_corpus_and_absorbs_crashes() {
    let tmp = tempfile::tempdir().unwrap();
    let log = tmp.path().join("calls.log");
    let script = common::write_script(
        &tmp.path().join("fuzz.sh"),
        &format!(
            "echo \"$2 $3 $LLVM_PROFILE_FILE\" >> '{}'\ncase \"$4\" in\n  *bad*) exit 1 ;;\nesac\nexit 0\n",
            log.display()
        ),
    );
    common::touch(&tmp.path().join("corpus/t/ok1"), "a");
    common::touch(&tmp.path().join("corpus/t/bad"), "b");
    common::touch(&tmp.path().join("afl/t/out/main/queue/id:000000"), "c");

    fuzzkit()
        .args(["coverage", "t", "--jobs", "2"])
        .arg("--project-root")
        .arg(tmp.path())
        .arg("--profile-dir")
        .arg(tmp.path().join("cov"))
        .arg("--fuzz-script")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("t: 3 input(s) replayed, 1 failed"));

    let calls = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = calls.lines().collect();
    assert_eq!(lines.iter().filter(|l| l.starts_with("build t")).count(), 1);
    assert_eq!(lines.iter().filter(|l| l.starts_with("run t")).count(), 3);
    assert!(lines
        .iter()
        .filter(|l| l.starts_with("run t"))
        .all(|l| l.contains("t-w0-%m.profraw") || l.contains("t-w1-%m.profraw")));
    assert!(tmp.path().join("corpus_files_t.lst").is_file());
}

#[cfg(unix)]
#[test]
fn coverage_finds_default_script_under_project_root() {
    let tmp = tempfile::tempdir().unwrap();
    let project = tmp.path().join("project");
    let elsewhere = tmp.path().join("elsewhere");
    std::fs::create_dir_all(&elsewhere).unwrap();
    let marker = tmp.path().join("built");
    common::write_script(
        &project.join("fuzz.sh"),
        &format!("touch '{}'\n", marker.display()),
    );
    common::touch(&project.join("corpus/t/seed"), "a");

    fuzzkit()
        .current_dir(&elsewhere)
        .env_remove("FUZZKIT_FUZZ_SCRIPT")
        .args(["coverage", "t", "--jobs", "1"])
        .arg("--project-root")
        .arg(&project)
        .arg("--profile-dir")
        .arg(tmp.path().join("cov"))
        .assert()
        .success()
        .stdout(predicate::str::contains("t: 1 input(s) replayed, 0 failed"));

    assert!(marker.exists());
}
