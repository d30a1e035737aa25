//! The fuzz build/run wrapper and target listing collaborators.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use crate::config::{BuildConfig, ToolPaths};
use crate::error::FuzzkitError;

/// Builds fuzz targets and replays single inputs through them.
///
/// `replay` is called concurrently from pool workers.
pub trait FuzzHarness: Sync {
    /// Names of every fuzz target in the project.
    fn list_targets(&self) -> Result<Vec<String>, FuzzkitError>;

    /// Build `target` with `config`.
    fn build(&self, target: &str, config: &BuildConfig) -> Result<(), FuzzkitError>;

    /// Run `target` on one input file. A non-zero status is returned, not
    /// raised; only a failure to launch the wrapper is an error.
    fn replay(
        &self,
        target: &str,
        file: &Path,
        config: &BuildConfig,
    ) -> Result<ExitStatus, FuzzkitError>;
}

/// [`FuzzHarness`] backed by the project's shell wrapper scripts.
#[derive(Clone, Debug)]
pub struct ScriptHarness {
    tools: ToolPaths,
    project_root: PathBuf,
}

impl ScriptHarness {
    /// Relative script paths in `tools` are anchored at `project_root`.
    pub fn new(mut tools: ToolPaths, project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        tools.fuzz_script = resolve_script(&project_root, &tools.fuzz_script);
        tools.list_script = resolve_script(&project_root, &tools.list_script);
        Self {
            tools,
            project_root,
        }
    }

    fn wrapper(&self, action: &str, target: &str, config: &BuildConfig) -> Command {
        let mut cmd = Command::new(&self.tools.fuzz_script);
        cmd.current_dir(&self.project_root)
            .arg(&self.tools.mode)
            .arg(action)
            .arg(target);
        config.apply(&mut cmd);
        cmd
    }
}

impl FuzzHarness for ScriptHarness {
    fn list_targets(&self) -> Result<Vec<String>, FuzzkitError> {
        let mut cmd = Command::new(&self.tools.list_script);
        cmd.current_dir(&self.project_root);
        let output = run_checked(&mut cmd)?;
        Ok(parse_target_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn build(&self, target: &str, config: &BuildConfig) -> Result<(), FuzzkitError> {
        tracing::info!(fuzz_target = target, "building fuzz target");
        run_checked(&mut self.wrapper("build", target, config))?;
        Ok(())
    }

    fn replay(
        &self,
        target: &str,
        file: &Path,
        config: &BuildConfig,
    ) -> Result<ExitStatus, FuzzkitError> {
        let mut cmd = self.wrapper("run", target, config);
        cmd.arg(file).stdout(Stdio::null()).stderr(Stdio::null());
        cmd.status().map_err(|source| FuzzkitError::CommandSpawn {
            program: program_name(&cmd),
            source,
        })
    }
}

/// Anchor a relative script path at `root`. Bare program names are left
/// for a `PATH` lookup.
pub fn resolve_script(root: &Path, script: &Path) -> PathBuf {
    if script.is_relative() && script.components().count() > 1 {
        root.join(script)
    } else {
        script.to_path_buf()
    }
}

/// One target name per non-blank line.
pub fn parse_target_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Run `cmd` to completion, capturing output; a non-zero exit is an error.
pub fn run_checked(cmd: &mut Command) -> Result<Output, FuzzkitError> {
    let program = program_name(cmd);
    tracing::debug!(command = ?cmd, "running");

    let output = cmd.output().map_err(|source| FuzzkitError::CommandSpawn {
        program: program.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(FuzzkitError::CommandFailed {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

pub(crate) fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_list_skips_blank_lines() {
        let targets = parse_target_list("transaction\n\n  wasm_instrument \n");
        assert_eq!(targets, vec!["transaction", "wasm_instrument"]);
    }

    #[cfg(unix)]
    #[test]
    fn relative_scripts_are_anchored_at_project_root() {
        let root = Path::new("/srv/project");
        let harness = ScriptHarness::new(ToolPaths::default(), root);
        assert_eq!(harness.tools.fuzz_script, root.join("./fuzz.sh"));
        assert_eq!(harness.tools.list_script, root.join("./list-fuzz-targets.sh"));

        assert_eq!(resolve_script(root, Path::new("/opt/fuzz.sh")), Path::new("/opt/fuzz.sh"));
        assert_eq!(resolve_script(root, Path::new("fuzz-wrapper")), Path::new("fuzz-wrapper"));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let mut cmd = Command::new("fuzzkit-definitely-not-a-real-program");
        let err = run_checked(&mut cmd).expect_err("should fail");
        assert!(matches!(err, FuzzkitError::CommandSpawn { .. }));
    }
}
