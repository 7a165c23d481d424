//! In-memory job store
//!
//! One mutex guards the whole map. Every access is a short lookup or update;
//! the lock is never held across an await.

use crate::state::JobStatus;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Status message shown for a freshly submitted job
pub const INITIAL_MESSAGE: &str = "Starting scrape...";

/// Opaque job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A point-in-time copy of a job's state
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

struct JobRecord {
    status: JobStatus,
    message: String,
    submitted_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    /// Monotonic finish time, used for retention
    finished: Option<Instant>,
}

/// Shared map of job id -> job state
pub struct JobStore {
    jobs: Mutex<HashMap<JobId, JobRecord>>,
    retention: Duration,
}

impl JobStore {
    /// Creates a store that keeps finished jobs for `retention`
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, JobRecord>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new pending job
    pub fn insert(&self, id: JobId) {
        self.lock().insert(
            id,
            JobRecord {
                status: JobStatus::Pending,
                message: INITIAL_MESSAGE.to_string(),
                submitted_at: Utc::now(),
                finished_at: None,
                finished: None,
            },
        );
    }

    /// Overwrites the status message of an active job
    ///
    /// Last writer wins. Messages for finished or unknown jobs are dropped.
    pub fn set_message(&self, id: &JobId, message: String) {
        if let Some(record) = self.lock().get_mut(id) {
            if record.status.is_active() {
                record.message = message;
            }
        }
    }

    /// Moves a pending job to running
    pub fn mark_running(&self, id: &JobId) {
        if let Some(record) = self.lock().get_mut(id) {
            if record.status == JobStatus::Pending {
                record.status = JobStatus::Running;
            }
        }
    }

    /// Sets the terminal status and final message of a job
    pub fn finish(&self, id: &JobId, status: JobStatus, message: String) {
        if let Some(record) = self.lock().get_mut(id) {
            if record.status.is_terminal() {
                tracing::warn!("Job {} finished twice; keeping first outcome", id);
                return;
            }
            record.status = status;
            record.message = message;
            record.finished_at = Some(Utc::now());
            record.finished = Some(Instant::now());
        }
    }

    /// Current status message of a job
    pub fn message(&self, id: &JobId) -> Option<String> {
        self.lock().get(id).map(|record| record.message.clone())
    }

    /// Current status of a job
    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.lock().get(id).map(|record| record.status.clone())
    }

    pub fn snapshot(&self, id: &JobId) -> Option<JobSnapshot> {
        self.lock().get(id).map(|record| JobSnapshot {
            id: *id,
            status: record.status.clone(),
            message: record.message.clone(),
            submitted_at: record.submitted_at,
            finished_at: record.finished_at,
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes finished jobs older than the retention period
    ///
    /// Active jobs are never removed. Returns the number of jobs removed.
    pub fn reap_expired(&self) -> usize {
        self.reap_expired_at(Instant::now())
    }

    fn reap_expired_at(&self, now: Instant) -> usize {
        let mut jobs = self.lock();
        let before = jobs.len();
        jobs.retain(|_, record| match record.finished {
            Some(finished) => now.saturating_duration_since(finished) < self.retention,
            None => true,
        });
        before - jobs.len()
    }
}
