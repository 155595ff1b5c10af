// src/recipe/kitchen/runner.rs

//! External tool execution
//!
//! Every process the kitchen starts (git, cmake, patch) goes through a
//! [`ToolRunner`]. The system runner finds programs on `PATH`; tests plug in
//! a runner that fakes the tools' effects on disk.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Whether the argument list contains `arg`
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Successful output with nothing captured
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Failure text carrying the exit status and the tool's stderr verbatim
    pub fn describe_failure(&self, invocation: &Invocation) -> String {
        let status = match self.code {
            Some(code) => format!("exited with status {}", code),
            None => "was terminated by a signal".to_string(),
        };

        let stderr = self.stderr.trim_end();
        if stderr.is_empty() {
            format!("`{}` {}", invocation, status)
        } else {
            format!("`{}` {}: {}", invocation, status, stderr)
        }
    }
}

/// Runs external tools
pub trait ToolRunner: Send + Sync {
    /// Run a command to completion and capture its output
    ///
    /// An `Err` means the command could not be started at all. A command
    /// that ran and failed returns `Ok` with a non-zero code.
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput>;
}

/// Runner that starts real processes
///
/// Children inherit the kitchen's process group, so an interrupt from the
/// terminal reaches the build tools too.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        let program = which::which(&invocation.program).map_err(|e| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found on PATH: {}", invocation.program, e),
            )
        })?;

        debug!("Running: {}", invocation);

        let mut command = Command::new(program);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null());
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let output = command.output()?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
