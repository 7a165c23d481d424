//! Output module for exporting job results
//!
//! This module handles:
//! - Flattening field result sets into (field type, value) rows
//! - Writing one CSV artifact per finished job
//! - Looking up a job's artifact for download

mod csv_export;
mod traits;

pub use csv_export::CsvExporter;
pub use traits::{
    ExportArtifact, ExportError, ExportRecord, ExportResult, ExportRow, ResultExporter,
};
