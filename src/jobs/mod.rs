//! Job lifecycle management
//!
//! This module contains:
//! - The job store: per-job status and progress messages
//! - The job manager: validation, the bounded worker pool, polling and
//!   export retrieval

mod manager;
mod store;

pub use manager::{JobManager, SubmitRequest, NOT_FOUND_MESSAGE};
pub use store::{JobId, JobSnapshot, JobStore, INITIAL_MESSAGE};
