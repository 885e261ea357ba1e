mod csv_log;
mod summary_report;

use std::path::PathBuf;

use crate::MeasurementRow;

pub use csv_log::CsvMeasurementLog;
pub use summary_report::SummaryReportCollector;

pub trait ReportCollector {
    /// Record a finished measurement. Collectors that write to disk must have persisted the row
    /// by the time this returns.
    fn add_measurement(&mut self, row: &MeasurementRow) -> anyhow::Result<()>;

    fn finalize(&self);
}

/// Choose which collectors a [Reporter] sends measurements to.
#[derive(Debug, Default)]
pub struct ReportConfig {
    csv_log: Option<(PathBuf, String)>,
    enable_summary: bool,
}

impl ReportConfig {
    /// Append rows to the semicolon separated log at `path`, naming the group column `group_label`.
    pub fn csv_log(mut self, path: impl Into<PathBuf>, group_label: impl Into<String>) -> Self {
        self.csv_log = Some((path.into(), group_label.into()));
        self
    }

    /// Print a summary table of all measurements when the reporter is finalized.
    pub fn enable_summary(mut self) -> Self {
        self.enable_summary = true;
        self
    }

    pub fn init(self) -> anyhow::Result<Reporter> {
        let mut collectors: Vec<Box<dyn ReportCollector>> = Vec::new();

        if let Some((path, group_label)) = self.csv_log {
            collectors.push(Box::new(CsvMeasurementLog::open(path, &group_label)?));
        }

        if self.enable_summary {
            collectors.push(Box::new(SummaryReportCollector::new()));
        }

        Ok(Reporter { collectors })
    }
}

/// Fans measurements out to every configured [ReportCollector].
pub struct Reporter {
    collectors: Vec<Box<dyn ReportCollector>>,
}

impl Reporter {
    pub fn add_measurement(&mut self, row: &MeasurementRow) -> anyhow::Result<()> {
        for collector in &mut self.collectors {
            collector.add_measurement(row)?;
        }

        Ok(())
    }

    pub fn finalize(&self) {
        for collector in &self.collectors {
            collector.finalize();
        }
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("collectors", &self.collectors.len())
            .finish()
    }
}
