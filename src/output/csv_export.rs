//! CSV result exporter
//!
//! Writes `scrape_results_<job id>.csv` with a `Data Type,Value` header into
//! the export directory. The file is written under a `.partial` name and
//! renamed into place, so a failed export never leaves a retrievable file.

use crate::config::OutputConfig;
use crate::extract::FieldResultSet;
use crate::jobs::JobId;
use crate::output::traits::{ExportArtifact, ExportError, ExportRecord, ExportResult, ResultExporter};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const HEADER: [&str; 2] = ["Data Type", "Value"];

/// Exports results as CSV files on local disk
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
    download_prefix: String,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>, download_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            download_prefix: download_prefix.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.export_dir, &config.download_prefix)
    }

    pub fn file_name(job_id: &JobId) -> String {
        format!("scrape_results_{}.csv", job_id)
    }

    pub fn path_for(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(Self::file_name(job_id))
    }

    /// Retrieval location handed back to pollers
    pub fn location_for(&self, job_id: &JobId) -> String {
        format!("{}/{}", self.download_prefix.trim_end_matches('/'), job_id)
    }
}

#[async_trait]
impl ResultExporter for CsvExporter {
    async fn export(&self, job_id: &JobId, results: &FieldResultSet) -> ExportResult<String> {
        let record = ExportRecord::from_results(results);
        let dir = self.dir.clone();
        let path = self.path_for(job_id);
        let rows = record.len();

        tokio::task::spawn_blocking(move || write_csv(&dir, &path, &record))
            .await
            .map_err(|e| ExportError::Worker(e.to_string()))??;

        tracing::info!("Exported {} row(s) for job {}", rows, job_id);
        Ok(self.location_for(job_id))
    }

    async fn retrieve(&self, job_id: &JobId) -> ExportResult<Option<ExportArtifact>> {
        let path = self.path_for(job_id);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(ExportArtifact {
                file_name: Self::file_name(job_id),
                path,
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes the record to `path`, going through a partial file
fn write_csv(dir: &Path, path: &Path, record: &ExportRecord) -> ExportResult<()> {
    std::fs::create_dir_all(dir)?;

    let partial = path.with_extension("csv.partial");
    let result = write_rows(&partial, record).and_then(|()| {
        std::fs::rename(&partial, path).map_err(|e| {
            ExportError::Write(format!("could not move export into place: {}", e))
        })
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

fn write_rows(path: &Path, record: &ExportRecord) -> ExportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;
    for row in record.rows() {
        writer.write_record([row.field_type.as_str(), row.value.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
