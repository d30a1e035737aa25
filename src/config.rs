//! Explicit configuration for builds and external collaborators.
//!
//! Build settings are carried as values and applied to individual child
//! processes; nothing here mutates the environment of the running process.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// How a fuzz target binary is built and where its profiling data goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Whether incremental compilation stays enabled.
    pub incremental: bool,
    /// Extra compiler flags passed through `RUSTFLAGS`.
    pub rustflags: Vec<String>,
    /// Profiling output routing, present only for instrumented replays.
    pub profile_pattern: Option<ProfilePattern>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            incremental: true,
            rustflags: Vec::new(),
            profile_pattern: None,
        }
    }
}

impl BuildConfig {
    /// Build configuration for coverage-instrumented binaries.
    pub fn coverage() -> Self {
        Self {
            incremental: false,
            rustflags: vec!["-Cinstrument-coverage".to_string()],
            profile_pattern: None,
        }
    }

    /// Returns a copy routing profiling output through `pattern`.
    pub fn with_profile(&self, pattern: ProfilePattern) -> Self {
        Self {
            profile_pattern: Some(pattern),
            ..self.clone()
        }
    }

    /// Environment pairs this configuration sets on a child process.
    pub fn envs(&self) -> Vec<(&'static str, OsString)> {
        let mut envs = Vec::new();
        if !self.incremental {
            envs.push(("CARGO_INCREMENTAL", OsString::from("0")));
        }
        if !self.rustflags.is_empty() {
            envs.push(("RUSTFLAGS", OsString::from(self.rustflags.join(" "))));
        }
        if let Some(pattern) = &self.profile_pattern {
            envs.push(("LLVM_PROFILE_FILE", pattern.render().into_os_string()));
        }
        envs
    }

    /// Applies [`BuildConfig::envs`] to `cmd`.
    pub fn apply(&self, cmd: &mut Command) {
        for (key, value) in self.envs() {
            cmd.env(key, value);
        }
    }
}

/// Per-target, per-worker profiling filename.
///
/// Renders as `<dir>/<target>-w<worker>-%m.profraw`. The worker index keeps
/// concurrent replays from sharing a file; `%m` is expanded by the profiling
/// runtime to the binary module signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfilePattern {
    pub dir: PathBuf,
    pub target: String,
    pub worker: usize,
}

impl ProfilePattern {
    pub fn new(dir: impl Into<PathBuf>, target: impl Into<String>, worker: usize) -> Self {
        Self {
            dir: dir.into(),
            target: target.into(),
            worker,
        }
    }

    pub fn render(&self) -> PathBuf {
        self.dir
            .join(format!("{}-w{}-%m.profraw", self.target, self.worker))
    }
}

/// Locations of the external tools fuzzkit drives.
#[derive(Clone, Debug)]
pub struct ToolPaths {
    /// Fuzz build/run wrapper accepting `<mode> <action> <target> [file]`.
    pub fuzz_script: PathBuf,
    /// Script printing one fuzz target name per line.
    pub list_script: PathBuf,
    /// Build mode handed to the wrapper as its first argument.
    pub mode: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            fuzz_script: PathBuf::from("./fuzz.sh"),
            list_script: PathBuf::from("./list-fuzz-targets.sh"),
            mode: "simple".to_string(),
        }
    }
}

/// Settings for the crash triage procedure.
#[derive(Clone, Debug)]
pub struct TriageConfig {
    /// Workflow name a remote run must belong to.
    pub workflow: String,
    /// Name of the artifact bundle downloaded from a remote run.
    pub artifact: String,
    /// Repository cloned when reproducing crashes of a remote run.
    pub repo_url: String,
    /// Local repository checkout linked when triaging a local directory.
    pub local_repo: PathBuf,
    /// Directory of the fuzz crate inside the repository.
    pub fuzz_dir: PathBuf,
    /// Release binary used for direct reproduction.
    pub binary: String,
    /// Name of the produced summary file.
    pub summary_file: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            workflow: "Fuzzing".to_string(),
            artifact: "fuzz-results".to_string(),
            repo_url: "https://github.com/radixdlt/radixdlt-scrypto".to_string(),
            local_repo: PathBuf::from("."),
            fuzz_dir: PathBuf::from("fuzz-tests"),
            binary: "transaction".to_string(),
            summary_file: "crash_summary.txt".to_string(),
        }
    }
}

impl TriageConfig {
    /// Path of the release binary inside a repository checkout.
    pub fn binary_path(&self, repo: &Path) -> PathBuf {
        repo.join(&self.fuzz_dir)
            .join("target")
            .join("release")
            .join(&self.binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_config_disables_incremental_and_instruments() {
        let envs = BuildConfig::coverage().envs();
        assert!(envs.contains(&("CARGO_INCREMENTAL", OsString::from("0"))));
        assert!(envs.contains(&("RUSTFLAGS", OsString::from("-Cinstrument-coverage"))));
        assert!(!envs.iter().any(|(k, _)| *k == "LLVM_PROFILE_FILE"));
    }

    #[test]
    fn profile_pattern_is_distinct_per_worker() {
        let a = ProfilePattern::new("cov", "transaction", 0).render();
        let b = ProfilePattern::new("cov", "transaction", 1).render();
        assert_ne!(a, b);
        assert_eq!(a, Path::new("cov").join("transaction-w0-%m.profraw"));
    }

    #[test]
    fn with_profile_keeps_flags() {
        let cfg = BuildConfig::coverage().with_profile(ProfilePattern::new("d", "t", 3));
        let envs = cfg.envs();
        assert_eq!(envs.len(), 3);
        assert_eq!(
            envs[2],
            ("LLVM_PROFILE_FILE", Path::new("d").join("t-w3-%m.profraw").into_os_string())
        );
    }

    #[test]
    fn default_build_config_sets_nothing() {
        assert!(BuildConfig::default().envs().is_empty());
    }
}
