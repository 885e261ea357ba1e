use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::report::ReportCollector;
use crate::MeasurementRow;

/// Append-only, semicolon separated measurement log.
///
/// The header row is written when the file is created (or found empty) and never again, so many
/// runs can share one log.
pub struct CsvMeasurementLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvMeasurementLog {
    pub fn open(path: impl Into<PathBuf>, group_label: &str) -> anyhow::Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create directory for log {}", path.display())
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open measurement log {}", path.display()))?;
        let is_new = file
            .metadata()
            .with_context(|| format!("Failed to read metadata of {}", path.display()))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_writer(file);

        if is_new {
            log::debug!("Writing header to new measurement log {}", path.display());
            writer
                .write_record(MeasurementRow::header(group_label))
                .context("Failed to write measurement log header")?;
            writer.flush().context("Failed to flush measurement log")?;
        }

        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportCollector for CsvMeasurementLog {
    fn add_measurement(&mut self, row: &MeasurementRow) -> anyhow::Result<()> {
        self.writer
            .write_record(row.to_record())
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        // Flush every row so a crash mid-sweep keeps what was measured so far.
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;

        Ok(())
    }

    fn finalize(&self) {
        log::info!("Measurements written to {}", self.path.display());
    }
}
