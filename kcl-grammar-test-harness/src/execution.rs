//! Execution logic for running the program under test and golden generators.

use crate::error::HarnessError;
#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;
use std::{path::Path, process::ExitStatus};

/// Result of running a command.
#[derive(Clone, Debug)]
pub struct RunResult {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
    /// Duration of the command.
    pub duration: std::time::Duration,
}

impl RunResult {
    /// Returns the captured output for the given channel.
    pub fn output(&self, channel: crate::testcase::Channel) -> &[u8] {
        match channel {
            crate::testcase::Channel::Stdout => &self.stdout,
            crate::testcase::Channel::Stderr => &self.stderr,
        }
    }
}

/// Maps an exit status to an integer code, reporting death-by-signal as the
/// negated signal number.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    if let Some(signal) = status.signal() {
        return -signal;
    }

    -1
}

/// Runs `program` with `args` in `working_dir`, blocking until it exits.
///
/// The child inherits this process's environment unmodified. Both output streams are
/// captured in full. There is no timeout.
pub fn run_command(
    program: &Path,
    args: &[String],
    working_dir: &Path,
) -> Result<RunResult, HarnessError> {
    tracing::debug!(
        target: "execution",
        "running {} {} in {}",
        program.display(),
        args.join(" "),
        working_dir.display()
    );

    let start_time = std::time::Instant::now();
    let output = std::process::Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .output()
        .map_err(|source| HarnessError::Spawn {
            program: program.to_string_lossy().to_string(),
            working_dir: working_dir.to_path_buf(),
            source,
        })?;
    let duration = start_time.elapsed();

    let exit_code = exit_code_of(output.status);
    tracing::debug!(target: "execution", "exited with {exit_code} after {duration:?}");

    Ok(RunResult {
        exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
        duration,
    })
}

/// Outcome of running a golden generator script that exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeneratedGolden {
    /// The script succeeded and printed this output.
    Output(Vec<u8>),
    /// The script exited with a non-zero code.
    Failed {
        /// The script's exit code.
        exit_code: i32,
        /// What the script wrote to stderr.
        stderr: Vec<u8>,
    },
}

/// Runs the golden generator script at `script` under `interpreter`.
///
/// Returns `Ok(None)` if the script doesn't exist.
pub fn generate_golden(
    interpreter: &Path,
    script: &Path,
) -> Result<Option<GeneratedGolden>, HarnessError> {
    if !script.is_file() {
        return Ok(None);
    }

    tracing::debug!(
        target: "golden",
        "generating golden output: {} {}",
        interpreter.display(),
        script.display()
    );

    let output = std::process::Command::new(interpreter)
        .arg(script)
        .output()
        .map_err(|source| HarnessError::GeneratorSpawn {
            script: script.to_path_buf(),
            source,
        })?;

    let exit_code = exit_code_of(output.status);
    if exit_code != 0 {
        tracing::debug!(
            target: "golden",
            "generator {} exited with {exit_code}",
            script.display()
        );
        return Ok(Some(GeneratedGolden::Failed {
            exit_code,
            stderr: output.stderr,
        }));
    }

    Ok(Some(GeneratedGolden::Output(output.stdout)))
}
