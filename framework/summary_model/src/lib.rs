use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// Summary of a sweep
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner unless passed on the command line. Unique for each run.
    pub run_id: String,
    /// The name of the scenario that was run
    pub scenario_name: String,
    /// The deployment backend, for example `kubectl` or `juju`
    pub backend: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The consumer counts the sweep was configured with, in order
    pub sweep: Vec<usize>,
    /// Number of base URL changes measured after each deployment
    pub change_rounds: usize,
    /// The initial base URL
    pub base_url: String,
    /// Number of rows appended to the measurement log
    pub rows_recorded: usize,
    /// Number of sweep values that were deployed, measured and removed
    ///
    /// Less than `sweep.len()` if the run failed. The cluster may still hold the workloads of the
    /// sweep value that was in progress.
    pub completed_sweep_values: usize,
    /// The error that stopped the run, if any
    pub error: Option<String>,
    /// Backend specific settings that identify the deployment, e.g. namespace or chart
    pub env: HashMap<String, String>,
    /// The version of Settle Bench that was used for this run
    pub settle_bench_version: String,
    /// Identifies runs with the same configuration, see [RunSummary::fingerprint]
    #[serde(default)]
    pub fingerprint: Option<String>,
}

impl RunSummary {
    /// Create a new run summary
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: String,
        scenario_name: String,
        backend: String,
        started_at: i64,
        sweep: Vec<usize>,
        change_rounds: usize,
        base_url: String,
        settle_bench_version: String,
    ) -> Self {
        Self {
            run_id,
            scenario_name,
            backend,
            started_at,
            sweep,
            change_rounds,
            base_url,
            rows_recorded: 0,
            completed_sweep_values: 0,
            error: None,
            env: HashMap::with_capacity(0),
            settle_bench_version,
            fingerprint: None,
        }
    }

    pub fn set_rows_recorded(&mut self, rows_recorded: usize) {
        self.rows_recorded = rows_recorded;
    }

    pub fn set_completed_sweep_values(&mut self, completed: usize) {
        self.completed_sweep_values = completed;
    }

    pub fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }

    /// Add a backend setting
    pub fn add_env(&mut self, key: String, value: String) {
        self.env.insert(key, value);
    }

    /// Compute the fingerprint and store it with the summary
    ///
    /// Call once the backend settings have been added.
    pub fn record_fingerprint(&mut self) -> &str {
        let fingerprint = self.fingerprint();
        self.fingerprint.insert(fingerprint)
    }

    /// Whether every configured sweep value was measured
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.completed_sweep_values == self.sweep.len()
    }

    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint is intended to identify runs that used the same configuration, so their
    /// measurements can be compared. It uses the
    ///     - Scenario name
    ///     - Backend
    ///     - Sweep values
    ///     - Change rounds
    ///     - Backend settings
    ///     - Settle Bench version
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.scenario_name.as_bytes());
        Digest::update(&mut hasher, self.backend.as_bytes());
        self.sweep.iter().for_each(|count| {
            Digest::update(&mut hasher, (*count as u64).to_le_bytes());
        });
        Digest::update(&mut hasher, (self.change_rounds as u64).to_le_bytes());
        self.env
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, v.as_bytes());
            });
        Digest::update(&mut hasher, self.settle_bench_version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary].
pub fn load_summary_runs(path: impl AsRef<Path>) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}
