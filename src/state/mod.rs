//! State module for tracking job progress
//!
//! - `JobStatus`: lifecycle of a scrape job (pending, running, succeeded, failed)

mod job_state;

pub use job_state::JobStatus;
