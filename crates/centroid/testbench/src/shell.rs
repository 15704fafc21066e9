//! Shell invocation for the external toolchain.
//!
//! Vivado and the `xsim` tools are driven through a single shell line per
//! step, prefixed with the vendor settings scripts. Console output is
//! returned whole and parsed by [`crate::report`].

use std::collections::VecDeque;
use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TestbenchError, TestbenchResult};

// ── Shell Flavor ────────────────────────────────────────────────────

/// How commands are sourced and chained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellFlavor {
    /// `cmd /C`, steps joined with `&`.
    Cmd,
    /// `sh -c`, steps joined with `;`.
    Posix,
}

impl ShellFlavor {
    /// Flavor of the host platform.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::Cmd
        } else {
            Self::Posix
        }
    }

    fn program(self) -> (&'static str, &'static str) {
        match self {
            Self::Cmd => ("cmd", "/C"),
            Self::Posix => ("sh", "-c"),
        }
    }

    /// Quote a path or argument for this shell.
    pub fn quote(self, arg: &str) -> String {
        match self {
            Self::Cmd => format!("\"{}\"", arg),
            Self::Posix => format!("'{}'", arg.replace('\'', r"'\''")),
        }
    }

    /// Statement that loads an environment script into the current shell.
    pub fn source(self, script: &Path) -> String {
        let quoted = self.quote(&script.display().to_string());
        match self {
            Self::Cmd => format!("CALL {}", quoted),
            Self::Posix => format!(". {}", quoted),
        }
    }

    /// Join steps so each runs regardless of the previous exit status.
    pub fn chain<S: AsRef<str>>(self, steps: &[S]) -> String {
        let separator = match self {
            Self::Cmd => " & ",
            Self::Posix => "; ",
        };
        steps
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl std::fmt::Display for ShellFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cmd => write!(f, "cmd"),
            Self::Posix => write!(f, "posix"),
        }
    }
}

// ── Command Runner Trait ────────────────────────────────────────────

/// Trait for running a toolchain shell line.
pub trait CommandRunner: Send + Sync {
    /// Run `script` in `cwd` and return stdout followed by stderr.
    fn run(&self, script: &str, cwd: &Path) -> TestbenchResult<String>;

    /// Name of this runner.
    fn name(&self) -> &str;
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run(&self, script: &str, cwd: &Path) -> TestbenchResult<String> {
        (**self).run(script, cwd)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Runs scripts through the host shell.
pub struct ShellRunner {
    flavor: ShellFlavor,
}

impl ShellRunner {
    pub fn new(flavor: ShellFlavor) -> Self {
        Self { flavor }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(ShellFlavor::native())
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, script: &str, cwd: &Path) -> TestbenchResult<String> {
        let (program, flag) = self.flavor.program();
        debug!(%program, cwd = %cwd.display(), %script, "running toolchain step");

        let mut command = Command::new(program);
        command.current_dir(cwd).arg(flag);
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.raw_arg(script);
        }
        #[cfg(not(windows))]
        command.arg(script);

        let output = command.output().map_err(|source| TestbenchError::Launch {
            program: program.to_string(),
            source,
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let trimmed = combined.trim_end_matches(['\r', '\n']).len();
        combined.truncate(trimmed);

        debug!(status = %output.status, bytes = combined.len(), "toolchain step finished");
        Ok(combined)
    }

    fn name(&self) -> &str {
        "shell"
    }
}

/// Scripted runner that never spawns a process.
///
/// Outputs are handed out in order; once exhausted the fallback is used.
pub struct SimulatedRunner {
    outputs: Mutex<VecDeque<String>>,
    fallback: String,
    scripts: Mutex<Vec<String>>,
}

impl SimulatedRunner {
    pub fn new() -> Self {
        Self {
            outputs: Mutex::new(VecDeque::new()),
            fallback: String::new(),
            scripts: Mutex::new(Vec::new()),
        }
    }

    /// Queue one console output.
    pub fn with_output(self, output: impl Into<String>) -> Self {
        lock(&self.outputs).push_back(output.into());
        self
    }

    /// Output returned once the queue is empty.
    pub fn with_fallback(mut self, output: impl Into<String>) -> Self {
        self.fallback = output.into();
        self
    }

    /// Scripts received so far.
    pub fn scripts(&self) -> Vec<String> {
        lock(&self.scripts).clone()
    }
}

impl Default for SimulatedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SimulatedRunner {
    fn run(&self, script: &str, _cwd: &Path) -> TestbenchResult<String> {
        lock(&self.scripts).push(script.to_string());
        Ok(lock(&self.outputs)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
