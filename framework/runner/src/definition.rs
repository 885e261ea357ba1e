use std::path::PathBuf;
use std::time::Duration;

use settle_bench_core::prelude::{OvershootError, PollOptions};

use crate::cli::SweepCli;
use crate::types::SettleBenchResult;

/// How the observed number of running consumers is compared with the requested number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyPolicy {
    /// Ready once at least the requested number of consumers is running.
    #[default]
    AtLeast,
    /// Ready once exactly the requested number is running. Observing more aborts the run with an
    /// [OvershootError].
    Exactly,
}

impl ReadyPolicy {
    pub fn evaluate(&self, observed: usize, expected: usize) -> SettleBenchResult<bool> {
        match self {
            ReadyPolicy::AtLeast => Ok(observed >= expected),
            ReadyPolicy::Exactly if observed > expected => {
                Err(OvershootError::new("running consumers", observed, expected).into())
            }
            ReadyPolicy::Exactly => Ok(observed == expected),
        }
    }
}

/// The builder for a sweep definition.
///
/// Scenarios create one from their parsed command line, set their defaults, and hand it to
/// [crate::prelude::run].
#[derive(Debug)]
pub struct SweepDefinitionBuilder {
    /// The name of the scenario.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    cli: SweepCli,
    /// Range used when the command line does not choose the consumer counts.
    default_sweep: (usize, usize, usize),
    ready_policy: ReadyPolicy,
}

/// A validated sweep configuration.
#[derive(Debug, Clone)]
pub struct SweepDefinition {
    pub name: String,
    pub run_id: String,
    pub sweep: Vec<usize>,
    pub change_rounds: usize,
    pub base_url: String,
    pub poll: PollOptions,
    pub ready_policy: ReadyPolicy,
    pub log_file: PathBuf,
    pub run_summary: PathBuf,
    pub no_progress: bool,
}

impl SweepDefinitionBuilder {
    pub fn new(name: &str, cli: SweepCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_sweep: (5, 55, 5),
            ready_policy: ReadyPolicy::AtLeast,
        }
    }

    /// Sweep from `start` to `end` inclusive in steps of `step` unless the command line says otherwise.
    pub fn with_default_sweep(mut self, start: usize, end: usize, step: usize) -> Self {
        self.default_sweep = (start, end, step);
        self
    }

    /// Set the ready policy. `--exact-count` on the command line always selects [ReadyPolicy::Exactly].
    pub fn with_ready_policy(mut self, ready_policy: ReadyPolicy) -> Self {
        self.ready_policy = ready_policy;
        self
    }

    pub(crate) fn build(self) -> SettleBenchResult<SweepDefinition> {
        let cli = self.cli;

        let sweep = if cli.consumers.is_empty() {
            let (default_start, default_end, default_step) = self.default_sweep;
            let start = cli.sweep_start.unwrap_or(default_start);
            let end = cli.sweep_end.unwrap_or(default_end);
            let step = cli.sweep_step.unwrap_or(default_step);

            if step == 0 {
                anyhow::bail!("Sweep step must be greater than zero");
            }
            if start > end {
                anyhow::bail!("Sweep start {start} is greater than sweep end {end}");
            }

            (start..=end).step_by(step).collect::<Vec<_>>()
        } else {
            cli.consumers
        };

        if sweep.contains(&0) {
            anyhow::bail!("Consumer counts must be greater than zero, got {sweep:?}");
        }

        if cli.base_url.trim().is_empty() {
            anyhow::bail!("Base URL must not be empty");
        }

        let poll = PollOptions {
            timeout: Duration::from_secs(cli.timeout_s),
            interval: Duration::from_millis(cli.interval_ms),
        };
        if poll.interval.is_zero() {
            anyhow::bail!("Poll interval must be greater than zero");
        }
        if poll.interval > poll.timeout {
            anyhow::bail!(
                "Poll interval {:?} is longer than the timeout {:?}",
                poll.interval,
                poll.timeout
            );
        }

        let ready_policy = if cli.exact_count {
            ReadyPolicy::Exactly
        } else {
            self.ready_policy
        };

        Ok(SweepDefinition {
            name: self.name,
            run_id: cli.run_id.unwrap_or_else(|| nanoid::nanoid!()),
            sweep,
            change_rounds: cli.change_rounds,
            base_url: cli.base_url,
            poll,
            ready_policy,
            log_file: cli.log_file,
            run_summary: cli.run_summary,
            no_progress: cli.no_progress,
        })
    }
}

impl SweepDefinition {
    /// Base URL used for change round `round`, counting from 1.
    pub fn changed_base_url(&self, round: usize) -> String {
        format!("{round}{}", self.base_url)
    }

    /// Deploy round plus change rounds for every sweep value.
    pub fn total_rounds(&self) -> u64 {
        (self.sweep.len() as u64).saturating_mul((self.change_rounds as u64).saturating_add(1))
    }
}
