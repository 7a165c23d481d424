//! Field extraction
//!
//! This module turns accumulated page content into typed field sets:
//! - A fixed catalog of named regex rules (phone, email, dob, ...)
//! - Optional user-defined rules from configuration
//! - Match flattening, trimming and per-type deduplication

mod catalog;
mod registry;

pub use catalog::{is_builtin_field, FieldRule, BUILTIN_RULES};
pub use registry::{ExtractionError, Extractor, ExtractorRegistry, FieldResultSet};
