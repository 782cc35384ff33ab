//! External tool invocation
//!
//! Every external tool is invoked as a typed program-plus-argv pair. Nothing
//! in this crate builds a shell command line from strings, so quoting and
//! escaping hazards do not exist here.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::PipelineError;

/// A single external command: program plus argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Program to invoke, resolved through PATH
    pub program: String,
    /// Arguments, one element per argv entry
    pub args: Vec<String>,
    /// Working directory for the child, if not the installer's own
    pub cwd: Option<PathBuf>,
    /// Bytes written to the child's stdin (`chpasswd` and friends)
    pub stdin: Option<String>,
}

impl Step {
    /// Create a step from a program and its arguments
    pub fn new<S: AsRef<str>>(program: &str, args: &[S]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            cwd: None,
            stdin: None,
        }
    }

    /// Set the working directory the step runs in
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Feed the child a fixed stdin document
    #[must_use]
    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// One-line rendering for logs and error messages
    pub fn render(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Executes steps and reports pass/fail
///
/// The pipeline driver talks to this trait so tests can substitute a recording
/// executor and exercise the fail-fast rule without touching the host.
pub trait StepRunner {
    /// Run one step to completion; non-zero exit is an error
    fn run(&mut self, phase: &str, step: &Step) -> Result<(), PipelineError>;
}

/// Runs steps as real child processes, inheriting stdout and stderr
#[derive(Debug, Default)]
pub struct HostRunner;

impl StepRunner for HostRunner {
    fn run(&mut self, phase: &str, step: &Step) -> Result<(), PipelineError> {
        tracing::debug!(phase, command = %step.render(), "running step");

        let mut cmd = Command::new(&step.program);
        cmd.args(&step.args);
        if let Some(dir) = &step.cwd {
            cmd.current_dir(dir);
        }

        let status = if let Some(input) = &step.stdin {
            cmd.stdin(Stdio::piped());
            let mut child = cmd.spawn().map_err(|e| PipelineError::Spawn {
                program: step.program.clone(),
                error: e.to_string(),
            })?;
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes())
                    .map_err(|e| PipelineError::Spawn {
                        program: step.program.clone(),
                        error: e.to_string(),
                    })?;
            }
            child.wait().map_err(|e| PipelineError::Spawn {
                program: step.program.clone(),
                error: e.to_string(),
            })?
        } else {
            cmd.status().map_err(|e| PipelineError::Spawn {
                program: step.program.clone(),
                error: e.to_string(),
            })?
        };

        if status.success() {
            Ok(())
        } else {
            Err(PipelineError::StepFailed {
                phase: phase.to_string(),
                program: step.program.clone(),
                status: status.to_string(),
            })
        }
    }
}

/// Run a tool and capture its stdout as UTF-8
///
/// Used for probing (`lsblk`), never for build steps: build output goes
/// straight to the operator's terminal.
pub fn capture<S: AsRef<str>>(program: &str, args: &[S]) -> io::Result<String> {
    let output = Command::new(program)
        .args(args.iter().map(AsRef::as_ref))
        .output()?;

    if !output.status.success() {
        return Err(io::Error::other(format!(
            "'{program}' exited with {}",
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_render() {
        let step = Step::new("parted", &["-s", "/dev/sda", "mklabel", "gpt"]);
        assert_eq!(step.render(), "parted -s /dev/sda mklabel gpt");
    }

    #[test]
    fn test_step_render_bare_program() {
        let step = Step::new("sync", &[] as &[&str]);
        assert_eq!(step.render(), "sync");
    }

    #[test]
    fn test_step_in_dir() {
        let step = Step::new("make", &["-j4"]).in_dir("/tmp/build");
        assert_eq!(step.cwd, Some(PathBuf::from("/tmp/build")));
    }

    #[test]
    fn test_host_runner_reports_failure() {
        let mut runner = HostRunner;
        let step = Step::new("false", &[] as &[&str]);
        let err = runner.run("test", &step).unwrap_err();
        assert!(matches!(err, PipelineError::StepFailed { .. }));
    }

    #[test]
    fn test_host_runner_reports_spawn_error() {
        let mut runner = HostRunner;
        let step = Step::new("scratchroot-no-such-tool", &[] as &[&str]);
        let err = runner.run("test", &step).unwrap_err();
        assert!(matches!(err, PipelineError::Spawn { .. }));
    }

    #[test]
    fn test_host_runner_feeds_stdin() {
        let mut runner = HostRunner;
        let step = Step::new("grep", &["-q", "lfs"]).with_stdin("root:x:0:0\nlfs:x:1000:1000\n");
        assert!(runner.run("test", &step).is_ok());

        let step = Step::new("grep", &["-q", "absent"]).with_stdin("root:x:0:0\n");
        assert!(runner.run("test", &step).is_err());
    }

    #[test]
    fn test_capture_stdout() {
        let out = capture("echo", &["hello"]).unwrap();
        assert_eq!(out.trim(), "hello");
    }
}
