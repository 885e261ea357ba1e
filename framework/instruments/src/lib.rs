mod measurement;
mod report;

pub use measurement::{Measurement, MeasurementRow, PhaseClock};
pub use report::{
    CsvMeasurementLog, ReportCollector, ReportConfig, Reporter, SummaryReportCollector,
};
