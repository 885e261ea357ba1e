mod measurements_table;

use std::collections::BTreeMap;
use std::time::Duration;

use tabled::settings::Style;
use tabled::Table;

use crate::report::summary_report::measurements_table::MeasurementSummaryRow;
use crate::report::ReportCollector;
use crate::MeasurementRow;

/// Keeps every measurement in memory and prints min/avg/max per size, action and phase at the end
/// of the sweep.
#[derive(Debug, Default)]
pub struct SummaryReportCollector {
    rows: Vec<MeasurementRow>,
}

impl SummaryReportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn summary_rows(&self) -> Vec<MeasurementSummaryRow> {
        self.rows
            .iter()
            .fold(BTreeMap::new(), |mut acc, row| {
                acc.entry((
                    row.size,
                    row.action.clone(),
                    row.measurement.phase().to_string(),
                ))
                .or_insert_with(Vec::new)
                .push(row.measurement.elapsed());
                acc
            })
            .into_iter()
            .map(|((num_consumers, action, event), elapsed)| {
                let count = elapsed.len();
                let total = elapsed.iter().sum::<Duration>();

                MeasurementSummaryRow {
                    num_consumers,
                    action,
                    event,
                    count,
                    avg_s: total.as_secs_f64() / count as f64,
                    min_s: elapsed.iter().min().copied().unwrap_or_default().as_secs_f64(),
                    max_s: elapsed.iter().max().copied().unwrap_or_default().as_secs_f64(),
                }
            })
            .collect()
    }
}

impl ReportCollector for SummaryReportCollector {
    fn add_measurement(&mut self, row: &MeasurementRow) -> anyhow::Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn finalize(&self) {
        if self.rows.is_empty() {
            println!("\nNo measurements were recorded");
            return;
        }

        println!("\nSummary of measurements");
        let mut table = Table::new(self.summary_rows());
        table.with(Style::modern());

        println!("{}", table);
    }
}
