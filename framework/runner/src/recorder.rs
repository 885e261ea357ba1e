use settle_bench_instruments::{Measurement, MeasurementRow, PhaseClock, Reporter};

use crate::types::SettleBenchResult;

/// Times benchmark phases and hands every measurement to the [Reporter].
#[derive(Debug)]
pub struct MeasurementRecorder {
    reporter: Reporter,
    group_id: String,
    size: usize,
    rows_recorded: usize,
}

impl MeasurementRecorder {
    pub fn new(reporter: Reporter) -> Self {
        Self {
            reporter,
            group_id: String::new(),
            size: 0,
            rows_recorded: 0,
        }
    }

    /// Set the group and consumer count that following rows are recorded against.
    pub fn set_group(&mut self, group_id: impl Into<String>, size: usize) {
        self.group_id = group_id.into();
        self.size = size;
    }

    /// Run `op` and record how long it took as `phase` of `action`.
    pub fn time_phase<T, F>(&mut self, action: &str, phase: &str, op: F) -> SettleBenchResult<Measurement>
    where
        F: FnOnce() -> SettleBenchResult<T>,
    {
        let clock = PhaseClock::start();
        self.time_phase_since(&clock, action, phase, op)
    }

    /// Run `op` and record the time from the start of `clock` until it finished.
    ///
    /// Nothing is recorded if `op` fails.
    pub fn time_phase_since<T, F>(
        &mut self,
        clock: &PhaseClock,
        action: &str,
        phase: &str,
        op: F,
    ) -> SettleBenchResult<Measurement>
    where
        F: FnOnce() -> SettleBenchResult<T>,
    {
        op()?;
        let measurement = clock.measure(phase);

        log::info!(
            "{action} {} consumers in {}: '{phase}' after {:.3}s",
            self.size,
            self.group_id,
            measurement.elapsed().as_secs_f64()
        );

        let row = MeasurementRow::new(&self.group_id, self.size, action, measurement.clone());
        self.reporter.add_measurement(&row)?;
        self.rows_recorded += 1;

        Ok(measurement)
    }

    pub fn rows_recorded(&self) -> usize {
        self.rows_recorded
    }

    pub fn finalize(&self) {
        self.reporter.finalize();
    }
}
