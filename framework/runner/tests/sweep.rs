use std::path::Path;

use pretty_assertions::assert_eq;
use settle_bench_runner::prelude::{
    run, Backend, ClusterStatus, DeploymentTarget, Entity, EntityKind, EntityPhase,
    OvershootError, PollTimeoutError, ReadyPolicy, SettleBenchResult, SweepCli,
    SweepDefinitionBuilder,
};
use settle_bench_summary_model::load_summary_runs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Healthy,
    /// Runs one more consumer than requested.
    Overshoot,
    /// Consumers never start.
    Stuck,
}

#[derive(Debug, PartialEq, Eq)]
enum Call {
    Apply(usize, String),
    Mutate(usize, String),
    Remove(usize),
}

/// In-memory cluster that converges as soon as it is asked to.
struct FakeBackend {
    mode: Mode,
    calls: Vec<Call>,
    deployed: Option<DeploymentTarget>,
    status_queries: usize,
}

impl FakeBackend {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            calls: Vec::new(),
            deployed: None,
            status_queries: 0,
        }
    }
}

impl Backend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn group_id(&self, target: &DeploymentTarget) -> String {
        format!("fake-{}", target.consumers)
    }

    fn settings(&self) -> Vec<(String, String)> {
        vec![("cluster".to_string(), "in-memory".to_string())]
    }

    fn apply(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        self.calls
            .push(Call::Apply(target.consumers, target.base_url.clone()));
        self.deployed = Some(target.clone());
        Ok(())
    }

    fn mutate_config(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        self.calls
            .push(Call::Mutate(target.consumers, target.base_url.clone()));
        self.deployed = Some(target.clone());
        Ok(())
    }

    fn remove(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        self.calls.push(Call::Remove(target.consumers));
        self.deployed = None;
        Ok(())
    }

    fn query_status(&mut self, _target: &DeploymentTarget) -> SettleBenchResult<ClusterStatus> {
        self.status_queries += 1;

        let Some(deployed) = &self.deployed else {
            return Ok(ClusterStatus::default());
        };

        let (running, phase) = match self.mode {
            Mode::Healthy => (deployed.consumers, EntityPhase::Running),
            Mode::Overshoot => (deployed.consumers + 1, EntityPhase::Running),
            Mode::Stuck => (deployed.consumers, EntityPhase::Pending),
        };

        Ok((0..running)
            .map(|i| {
                Entity::new(format!("sse-consumer-{i}"), EntityKind::Consumer, phase)
                    .with_base_url(&deployed.base_url)
            })
            .collect())
    }
}

fn cli(dir: &Path, consumers: Vec<usize>) -> SweepCli {
    SweepCli {
        consumers,
        interval_ms: 1,
        timeout_s: 5,
        log_file: dir.join("benchmark.csv"),
        run_summary: dir.join("run_summary.jsonl"),
        no_progress: true,
        ..Default::default()
    }
}

fn log_lines(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("benchmark.csv"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn deploys_changes_and_tears_down_each_sweep_value() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = FakeBackend::new(Mode::Healthy);

    let outcome = run(
        SweepDefinitionBuilder::new("sweep_test", cli(dir.path(), vec![5])),
        &mut backend,
    )
    .unwrap();

    assert_eq!(12, backend.calls.len());
    assert_eq!(
        Call::Apply(5, "endpoint.example.com".to_string()),
        backend.calls[0]
    );
    for round in 1..=10 {
        assert_eq!(
            Call::Mutate(5, format!("{round}endpoint.example.com")),
            backend.calls[round]
        );
    }
    assert_eq!(Call::Remove(5), backend.calls[11]);
    assert!(backend.deployed.is_none());

    // Deploy round plus ten change rounds, each with a ready and a settled phase.
    assert_eq!(22, outcome.rows_recorded);
    assert_eq!(1, outcome.completed_sweep_values);

    let lines = log_lines(dir.path());
    assert_eq!(
        "namespace;num_consumers;action;event;start;end;elapsed",
        lines[0]
    );
    assert_eq!(23, lines.len());
    assert!(lines[1].starts_with("fake-5;5;deploy;pods;"));
    assert!(lines[2].starts_with("fake-5;5;deploy;settled;"));
    assert_eq!(
        20,
        lines[3..]
            .iter()
            .filter(|l| l.starts_with("fake-5;5;change;"))
            .count()
    );

    for line in &lines[1..] {
        let fields = line.split(';').collect::<Vec<_>>();
        let start: f64 = fields[4].parse().unwrap();
        let end: f64 = fields[5].parse().unwrap();
        let elapsed: f64 = fields[6].parse().unwrap();
        assert!(elapsed >= 0.0);
        assert!((end - start - elapsed).abs() < 1e-5, "{line}");
    }
}

#[test]
fn moves_on_to_the_next_sweep_value_after_teardown() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = FakeBackend::new(Mode::Healthy);
    let cli = SweepCli {
        change_rounds: 1,
        ..cli(dir.path(), vec![2, 3])
    };

    let outcome = run(SweepDefinitionBuilder::new("sweep_test", cli), &mut backend).unwrap();

    assert_eq!(
        vec![
            Call::Apply(2, "endpoint.example.com".to_string()),
            Call::Mutate(2, "1endpoint.example.com".to_string()),
            Call::Remove(2),
            Call::Apply(3, "endpoint.example.com".to_string()),
            Call::Mutate(3, "1endpoint.example.com".to_string()),
            Call::Remove(3),
        ],
        backend.calls
    );
    assert_eq!(8, outcome.rows_recorded);
    assert_eq!(2, outcome.completed_sweep_values);
}

#[test]
fn overshoot_stops_the_run_before_further_phases() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = FakeBackend::new(Mode::Overshoot);

    let result = run(
        SweepDefinitionBuilder::new("sweep_test", cli(dir.path(), vec![5, 10]))
            .with_ready_policy(ReadyPolicy::Exactly),
        &mut backend,
    );

    let err = result.unwrap_err();
    assert!(err.is::<OvershootError>(), "{err:?}");
    assert_eq!(
        vec![Call::Apply(5, "endpoint.example.com".to_string())],
        backend.calls
    );
    assert_eq!(1, backend.status_queries);

    // Header only, nothing was measured.
    assert_eq!(1, log_lines(dir.path()).len());

    let summaries = load_summary_runs(dir.path().join("run_summary.jsonl")).unwrap();
    assert_eq!(1, summaries.len());
    assert_eq!(0, summaries[0].completed_sweep_values);
    assert!(summaries[0]
        .error
        .as_deref()
        .unwrap()
        .contains("more than requested"));
}

#[test]
fn overshoot_is_accepted_by_at_least_policy() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = FakeBackend::new(Mode::Overshoot);
    let cli = SweepCli {
        change_rounds: 0,
        ..cli(dir.path(), vec![5])
    };

    let outcome = run(SweepDefinitionBuilder::new("sweep_test", cli), &mut backend).unwrap();

    assert_eq!(2, outcome.rows_recorded);
}

#[test]
fn ready_timeout_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = FakeBackend::new(Mode::Stuck);
    let cli = SweepCli {
        timeout_s: 1,
        interval_ms: 50,
        ..cli(dir.path(), vec![3])
    };

    let err = run(SweepDefinitionBuilder::new("sweep_test", cli), &mut backend).unwrap_err();

    assert!(err.is::<PollTimeoutError>(), "{err:?}");
    assert!(backend.status_queries >= 2);
    assert!(!backend.calls.contains(&Call::Remove(3)));
}

#[test]
fn header_is_written_once_across_runs() {
    let dir = tempfile::tempdir().unwrap();

    for _ in 0..2 {
        let mut backend = FakeBackend::new(Mode::Healthy);
        let cli = SweepCli {
            change_rounds: 0,
            ..cli(dir.path(), vec![1])
        };
        run(SweepDefinitionBuilder::new("sweep_test", cli), &mut backend).unwrap();
    }

    let lines = log_lines(dir.path());
    assert_eq!(5, lines.len());
    assert_eq!(
        1,
        lines.iter().filter(|l| l.starts_with("namespace;")).count()
    );
}

#[test]
fn run_summary_describes_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = FakeBackend::new(Mode::Healthy);
    let cli = SweepCli {
        change_rounds: 2,
        run_id: Some("summary-test".to_string()),
        ..cli(dir.path(), vec![4])
    };

    let outcome = run(SweepDefinitionBuilder::new("sweep_test", cli), &mut backend).unwrap();
    assert_eq!("summary-test", outcome.run_id);

    let summaries = load_summary_runs(dir.path().join("run_summary.jsonl")).unwrap();
    assert_eq!(1, summaries.len());
    let summary = &summaries[0];
    assert_eq!("summary-test", summary.run_id);
    assert_eq!("sweep_test", summary.scenario_name);
    assert_eq!("fake", summary.backend);
    assert_eq!(vec![4], summary.sweep);
    assert_eq!(6, summary.rows_recorded);
    assert_eq!(
        Some(&"in-memory".to_string()),
        summary.env.get("cluster")
    );
    assert_eq!(Some(summary.fingerprint()), summary.fingerprint.clone());
    assert!(summary.is_complete());
}
