//! Exporter traits and types
//!
//! This module defines the interface for result exporters and the
//! tabular record they write.

use crate::extract::FieldResultSet;
use crate::jobs::JobId;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export worker failed: {0}")]
    Worker(String),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// One row of an export: a field type and one of its values
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExportRow {
    pub field_type: String,
    pub value: String,
}

/// The rows written for one finished job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRecord {
    rows: Vec<ExportRow>,
}

impl ExportRecord {
    /// Flattens a result set into rows, one per retained value
    ///
    /// Rows are sorted by field type and value so repeated exports of the
    /// same results are byte-identical.
    pub fn from_results(results: &FieldResultSet) -> Self {
        let mut rows: Vec<ExportRow> = results
            .iter()
            .flat_map(|(field_type, values)| {
                values.iter().map(move |value| ExportRow {
                    field_type: field_type.clone(),
                    value: value.clone(),
                })
            })
            .collect();
        rows.sort();
        Self { rows }
    }

    pub fn rows(&self) -> &[ExportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A stored export, ready to be served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// File name to offer the downloader
    pub file_name: String,

    /// Where the artifact lives on disk
    pub path: PathBuf,
}

/// Trait for result exporters
///
/// Exporters write one durable artifact per job and find it again by job id.
/// Implementations must be thread-safe.
#[async_trait]
pub trait ResultExporter: Send + Sync {
    /// Writes the results of a job
    ///
    /// # Returns
    ///
    /// An opaque location string pollers can use to retrieve the export
    async fn export(&self, job_id: &JobId, results: &FieldResultSet) -> ExportResult<String>;

    /// Looks up the artifact written for a job, if any
    async fn retrieve(&self, job_id: &JobId) -> ExportResult<Option<ExportArtifact>>;
}
