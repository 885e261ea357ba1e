use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context};
use settle_bench_runner::prelude::SettleBenchResult;

/// An external command line, e.g. `kubectl -n test get pods -o json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external commands on behalf of the backends.
pub trait CommandRunner {
    /// Run the command to completion and return its standard output.
    ///
    /// A non-zero exit status is an error.
    fn output(&self, invocation: &Invocation) -> SettleBenchResult<String>;

    /// Run the command to completion, discarding its output.
    fn run(&self, invocation: &Invocation) -> SettleBenchResult<()> {
        let output = self.output(invocation)?;
        log::debug!("'{invocation}' finished: {}", output.trim_end());
        Ok(())
    }
}

/// Runs commands as child processes of the benchmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn output(&self, invocation: &Invocation) -> SettleBenchResult<String> {
        log::trace!("Running '{invocation}'");

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .with_context(|| format!("Failed to execute '{invocation}'"))?;

        if !output.status.success() {
            bail!(
                "'{invocation}' failed with {status}: {stderr}",
                status = output.status,
                stderr = String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        String::from_utf8(output.stdout)
            .with_context(|| format!("Output of '{invocation}' is not valid UTF-8"))
    }
}
