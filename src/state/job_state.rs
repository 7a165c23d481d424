/// Job status definitions for tracking scrape progress
///
/// This module defines the lifecycle states of a scrape job.
use std::fmt;

/// Represents the current outcome of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    // ===== Active States =====
    /// Submitted and waiting for a worker
    Pending,

    /// Currently traversing, extracting or exporting
    Running,

    // ===== Terminal States =====
    /// Finished; the export can be retrieved from `export_location`
    Succeeded { export_location: String },

    /// Finished with an error; never retried
    Failed { error: String },
}

impl JobStatus {
    /// Returns true if this is a terminal state (the job will not change again)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if the job has not finished yet
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Returns true if this represents a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short lowercase name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }

    /// The export location, for succeeded jobs
    pub fn export_location(&self) -> Option<&str> {
        match self {
            Self::Succeeded { export_location } => Some(export_location),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { export_location } => {
                write!(f, "{} ({})", self.as_str(), export_location)
            }
            Self::Failed { error } => write!(f, "{}: {}", self.as_str(), error),
            _ => f.write_str(self.as_str()),
        }
    }
}
