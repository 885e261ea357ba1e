use anyhow::Context;
use settle_bench_core::prelude::poll_until;
use settle_bench_instruments::{PhaseClock, ReportConfig};
use settle_bench_summary_model::{append_run_summary, RunSummary};

use crate::backend::{Backend, DeploymentTarget};
use crate::definition::{SweepDefinition, SweepDefinitionBuilder};
use crate::progress::SweepProgress;
use crate::recorder::MeasurementRecorder;
use crate::types::SettleBenchResult;

/// What a completed sweep produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    pub run_id: String,
    pub rows_recorded: usize,
    pub completed_sweep_values: usize,
}

pub fn run<B: Backend>(
    definition: SweepDefinitionBuilder,
    backend: &mut B,
) -> SettleBenchResult<SweepOutcome> {
    let definition = definition.build()?;

    log::info!(
        "Running scenario {} against {} with sweep {:?}",
        definition.name,
        backend.name(),
        definition.sweep
    );

    let started_at = chrono::Utc::now().timestamp();
    let reporter = ReportConfig::default()
        .csv_log(&definition.log_file, backend.group_label())
        .enable_summary()
        .init()
        .with_context(|| {
            format!(
                "Failed to open measurement log {}",
                definition.log_file.display()
            )
        })?;
    let mut recorder = MeasurementRecorder::new(reporter);
    let progress = SweepProgress::start(definition.total_rounds(), definition.no_progress);

    let mut completed_sweep_values = 0;
    let mut result = Ok(());
    for &size in &definition.sweep {
        if let Err(e) = run_sweep_value(&definition, backend, &mut recorder, &progress, size) {
            log::error!("Sweep stopped at {size} consumers: {e:?}");
            result = Err(e);
            break;
        }
        completed_sweep_values += 1;
    }

    progress.finish();

    // Report whatever was measured, even if the sweep failed part way.
    recorder.finalize();

    let mut summary = RunSummary::new(
        definition.run_id.clone(),
        definition.name.clone(),
        backend.name().to_string(),
        started_at,
        definition.sweep.clone(),
        definition.change_rounds,
        definition.base_url.clone(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    summary.set_rows_recorded(recorder.rows_recorded());
    summary.set_completed_sweep_values(completed_sweep_values);
    for (key, value) in backend.settings() {
        summary.add_env(key, value);
    }
    log::info!(
        "Run {} has configuration fingerprint {}",
        definition.run_id,
        summary.record_fingerprint()
    );
    if let Err(e) = &result {
        summary.set_error(format!("{e:#}"));
    }

    let stored = append_run_summary(&summary, &definition.run_summary).with_context(|| {
        format!(
            "Failed to write run summary to {}",
            definition.run_summary.display()
        )
    });

    match (result, stored) {
        (Err(e), stored) => {
            if let Err(store_err) = stored {
                log::error!("{store_err:?}");
            }
            Err(e)
        }
        (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(SweepOutcome {
            run_id: definition.run_id,
            rows_recorded: recorder.rows_recorded(),
            completed_sweep_values,
        }),
    }
}

fn run_sweep_value<B: Backend>(
    definition: &SweepDefinition,
    backend: &mut B,
    recorder: &mut MeasurementRecorder,
    progress: &SweepProgress,
    size: usize,
) -> SettleBenchResult<()> {
    let mut target = DeploymentTarget::new(size, definition.base_url.clone());
    let group_id = backend.group_id(&target);
    recorder.set_group(group_id.clone(), size);

    log::info!("Deploying {size} consumers into {group_id}");
    progress.set_message(format!("{size} consumers"));

    backend
        .apply(&target)
        .with_context(|| format!("Failed to deploy {size} consumers into {group_id}"))?;
    let clock = PhaseClock::start();
    time_round(definition, backend, recorder, &clock, "deploy", &target)?;
    progress.round_complete();

    for round in 1..=definition.change_rounds {
        target = DeploymentTarget::new(size, definition.changed_base_url(round));
        log::info!(
            "Change round {round}/{}: base URL {}",
            definition.change_rounds,
            target.base_url
        );

        backend.mutate_config(&target).with_context(|| {
            format!(
                "Failed to change the base URL of {group_id} to {}",
                target.base_url
            )
        })?;
        let clock = PhaseClock::start();
        time_round(definition, backend, recorder, &clock, "change", &target)?;
        progress.round_complete();
    }

    log::info!("Removing {size} consumers from {group_id}");
    backend
        .remove(&target)
        .with_context(|| format!("Failed to remove the consumers from {group_id}"))?;

    let report = poll_until(&format!("{group_id} to be empty"), definition.poll, || {
        let status = backend.query_status(&target)?;
        log::debug!("{} entities remaining in {group_id}", status.remaining());
        Ok(status.is_empty())
    })?;
    log::info!(
        "{group_id} is empty after {:.3}s",
        report.elapsed.as_secs_f64()
    );

    Ok(())
}

/// Wait for the consumers to be ready and then for the cluster to settle, recording both phases
/// from the moment the deploy or change command returned.
fn time_round<B: Backend>(
    definition: &SweepDefinition,
    backend: &mut B,
    recorder: &mut MeasurementRecorder,
    clock: &PhaseClock,
    action: &str,
    target: &DeploymentTarget,
) -> SettleBenchResult<()> {
    let ready_phase = backend.ready_phase().to_string();
    let settle_phase = backend.settle_phase().to_string();

    recorder.time_phase_since(clock, action, &ready_phase, || {
        wait_for_ready(definition, backend, target)
    })?;

    recorder.time_phase_since(clock, action, &settle_phase, || {
        poll_until("cluster to settle", definition.poll, || {
            let status = backend.query_status(target)?;
            if !status.is_settled() {
                log::debug!("{} entities still converging", status.transitional());
            }
            Ok(status.is_settled())
        })
    })?;

    Ok(())
}

fn wait_for_ready<B: Backend>(
    definition: &SweepDefinition,
    backend: &mut B,
    target: &DeploymentTarget,
) -> SettleBenchResult<()> {
    poll_until(
        &format!("{} consumers on {}", target.consumers, target.base_url),
        definition.poll,
        || {
            let observed = backend.query_status(target)?.ready_consumers(&target.base_url);
            log::debug!(
                "Found {observed}/{} consumers on {}",
                target.consumers,
                target.base_url
            );
            definition.ready_policy.evaluate(observed, target.consumers)
        },
    )?;

    Ok(())
}
