use std::time::{Duration, Instant};

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// A timed phase of a benchmark round.
///
/// Timestamps are kept at microsecond precision and the elapsed time is derived from them, so
/// `elapsed == finished_at - started_at` holds exactly, including once written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    phase: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl Measurement {
    pub fn new(
        phase: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> anyhow::Result<Self> {
        let phase = phase.into();
        let started_at = truncate_to_micros(started_at);
        let finished_at = truncate_to_micros(finished_at);
        if finished_at < started_at {
            anyhow::bail!(
                "Measurement for phase '{phase}' finishes at {finished_at} before it starts at {started_at}"
            );
        }

        Ok(Self {
            phase,
            started_at,
            finished_at,
        })
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Wall clock start of a round paired with a monotonic clock to measure phases against.
#[derive(Debug, Clone)]
pub struct PhaseClock {
    started_at: DateTime<Utc>,
    started: Instant,
}

impl PhaseClock {
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now.duration_trunc(TimeDelta::microseconds(1)).unwrap_or(now),
            started: Instant::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Measure the time from the start of this clock until now.
    ///
    /// The elapsed time comes from the monotonic clock, so a wall clock adjustment during the
    /// phase cannot make the measurement negative.
    pub fn measure(&self, phase: impl Into<String>) -> Measurement {
        let elapsed_us = i64::try_from(self.started.elapsed().as_micros()).unwrap_or(i64::MAX);
        let finished_at = self
            .started_at
            .checked_add_signed(TimeDelta::microseconds(elapsed_us))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Measurement {
            phase: phase.into(),
            started_at: self.started_at,
            finished_at,
        }
    }
}

/// One line of the measurement log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementRow {
    /// Namespace or model the consumers were deployed into.
    pub group_id: String,
    /// Number of consumers requested.
    pub size: usize,
    /// What triggered the round, `deploy` or `change`.
    pub action: String,
    pub measurement: Measurement,
}

impl MeasurementRow {
    pub fn new(
        group_id: impl Into<String>,
        size: usize,
        action: impl Into<String>,
        measurement: Measurement,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            size,
            action: action.into(),
            measurement,
        }
    }

    /// Header for a log whose group column is called `group_label`.
    pub fn header(group_label: &str) -> [String; 7] {
        [
            group_label.to_string(),
            "num_consumers".to_string(),
            "action".to_string(),
            "event".to_string(),
            "start".to_string(),
            "end".to_string(),
            "elapsed".to_string(),
        ]
    }

    /// Timestamps as Unix seconds and the elapsed time in seconds, all with microsecond precision.
    pub fn to_record(&self) -> [String; 7] {
        [
            self.group_id.clone(),
            self.size.to_string(),
            self.action.clone(),
            self.measurement.phase.clone(),
            unix_seconds(self.measurement.started_at),
            unix_seconds(self.measurement.finished_at),
            unix_seconds_delta(
                self.measurement.finished_at.timestamp_micros()
                    - self.measurement.started_at.timestamp_micros(),
            ),
        ]
    }
}

fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(TimeDelta::microseconds(1)).unwrap_or(at)
}

fn unix_seconds(at: DateTime<Utc>) -> String {
    unix_seconds_delta(at.timestamp_micros())
}

fn unix_seconds_delta(micros: i64) -> String {
    format!(
        "{}.{:06}",
        micros.div_euclid(1_000_000),
        micros.rem_euclid(1_000_000)
    )
}
