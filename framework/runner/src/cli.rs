use std::path::PathBuf;

use clap::Args;

/// Command line options shared by every scenario.
///
/// Scenarios add their backend specific options and flatten this struct into their own parser.
#[derive(Debug, Clone, Args)]
pub struct SweepCli {
    /// Consumer counts to sweep over, e.g. `--consumers=5,10,20`.
    ///
    /// Takes precedence over the `--sweep-*` range options.
    #[arg(long, value_delimiter = ',')]
    pub consumers: Vec<usize>,

    /// First consumer count of the sweep range. Defaults to the scenario's default sweep.
    #[arg(long)]
    pub sweep_start: Option<usize>,

    /// Last consumer count of the sweep range, inclusive.
    #[arg(long)]
    pub sweep_end: Option<usize>,

    /// Increment between consumer counts of the sweep range.
    #[arg(long)]
    pub sweep_step: Option<usize>,

    /// Number of times the base URL is changed and re-measured after each deployment
    #[arg(long, default_value_t = 10)]
    pub change_rounds: usize,

    /// The base URL the consumers are deployed with. Change round `i` uses `<i><base-url>`.
    #[arg(long, default_value = "endpoint.example.com")]
    pub base_url: String,

    /// Give up waiting for a phase after this many seconds
    #[arg(long, default_value_t = 600)]
    pub timeout_s: u64,

    /// Milliseconds to wait between two status queries
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Require exactly the requested number of running consumers. Seeing more is a fatal error.
    #[arg(long, default_value = "false")]
    pub exact_count: bool,

    /// Semicolon separated file that measurements are appended to
    #[arg(long, env = "SETTLE_BENCH_LOG_FILE", default_value = "benchmark.csv")]
    pub log_file: PathBuf,

    /// JSON lines file that a summary of the run is appended to
    #[arg(long, env = "SETTLE_BENCH_RUN_SUMMARY", default_value = "run_summary.jsonl")]
    pub run_summary: PathBuf,

    /// Identifier recorded in the run summary. A random one is generated if not set.
    #[arg(long)]
    pub run_id: Option<String>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[arg(long, default_value = "false")]
    pub no_progress: bool,
}

impl Default for SweepCli {
    fn default() -> Self {
        Self {
            consumers: Vec::new(),
            sweep_start: None,
            sweep_end: None,
            sweep_step: None,
            change_rounds: 10,
            base_url: "endpoint.example.com".to_string(),
            timeout_s: 600,
            interval_ms: 1000,
            exact_count: false,
            log_file: PathBuf::from("benchmark.csv"),
            run_summary: PathBuf::from("run_summary.jsonl"),
            run_id: None,
            no_progress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        sweep: SweepCli,
    }

    #[test]
    fn defaults_match_clap_defaults() {
        let parsed = TestCli::parse_from(["test"]).sweep;
        let default = SweepCli::default();

        assert_eq!(default.consumers, parsed.consumers);
        assert_eq!(default.change_rounds, parsed.change_rounds);
        assert_eq!(default.base_url, parsed.base_url);
        assert_eq!(default.timeout_s, parsed.timeout_s);
        assert_eq!(default.interval_ms, parsed.interval_ms);
        assert_eq!(default.exact_count, parsed.exact_count);
        assert_eq!(default.no_progress, parsed.no_progress);
    }

    #[test]
    fn parses_consumer_list() {
        let parsed = TestCli::parse_from(["test", "--consumers=5,10,20", "--exact-count"]).sweep;

        assert_eq!(vec![5, 10, 20], parsed.consumers);
        assert!(parsed.exact_count);
    }
}
