//! Job manager - submission, execution and polling of scrape jobs
//!
//! Each submitted job runs on its own tokio task. A semaphore caps how many
//! jobs execute at once; the rest wait as `pending`. Everything a job does
//! (traversal, extraction, export) happens outside the store lock, and every
//! failure is caught at the job boundary and recorded as a failed status.

use crate::config::{validate, Config, EngineConfig};
use crate::crawler::{
    Credentials, FetchError, FetcherFactory, HttpFetcherFactory, ScrapeRequest, ScrapeSession,
    SessionOptions,
};
use crate::extract::ExtractorRegistry;
use crate::jobs::store::{JobId, JobSnapshot, JobStore};
use crate::output::{CsvExporter, ExportArtifact, ExportError, ResultExporter};
use crate::state::JobStatus;
use crate::{EngineError, ValidationError};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Poll answer for identifiers the manager does not know
pub const NOT_FOUND_MESSAGE: &str = "No progress info found.";

/// A scrape job as submitted by a caller
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub url: String,
    pub field_types: Vec<String>,
    pub follow_pagination: bool,
    pub credentials: Option<Credentials>,
}

/// Everything a running job needs, shared by all jobs
#[derive(Clone)]
struct JobContext {
    store: Arc<JobStore>,
    fetchers: Arc<dyn FetcherFactory>,
    exporter: Arc<dyn ResultExporter>,
    registry: Arc<ExtractorRegistry>,
    options: SessionOptions,
}

/// A validated job waiting for a worker
struct PendingJob {
    id: JobId,
    url: String,
    field_types: BTreeSet<String>,
    follow_pagination: bool,
    credentials: Option<Credentials>,
}

/// Owns the lifecycle of every scrape job in the process
pub struct JobManager {
    context: JobContext,
    workers: Arc<Semaphore>,
}

impl JobManager {
    /// Creates a manager around the given fetcher and exporter
    pub fn new(
        config: &EngineConfig,
        registry: ExtractorRegistry,
        fetchers: Arc<dyn FetcherFactory>,
        exporter: Arc<dyn ResultExporter>,
    ) -> Self {
        Self {
            context: JobContext {
                store: Arc::new(JobStore::new(Duration::from_secs(
                    config.job_retention_secs,
                ))),
                fetchers,
                exporter,
                registry: Arc::new(registry),
                options: SessionOptions::from(config),
            },
            workers: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
        }
    }

    /// Creates a manager using the HTTP fetcher and CSV exporter
    ///
    /// The configuration is validated first, so hand-built configs get the
    /// same checks as loaded ones.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        validate(config)?;
        let registry = ExtractorRegistry::with_custom(&config.extractors)?;
        Ok(Self::new(
            &config.engine,
            registry,
            Arc::new(HttpFetcherFactory::new(config.fetcher.clone())),
            Arc::new(CsvExporter::from_config(&config.output)),
        ))
    }

    /// The field types jobs can request
    pub fn registry(&self) -> &ExtractorRegistry {
        &self.context.registry
    }

    /// Validates and schedules a job, returning its identifier
    ///
    /// Returns immediately; the job runs in the background. Must be called
    /// from within a tokio runtime.
    pub fn submit(&self, request: SubmitRequest) -> Result<JobId, ValidationError> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingLocation);
        }

        let field_types: BTreeSet<String> = request
            .field_types
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if field_types.is_empty() {
            return Err(ValidationError::MissingFieldTypes);
        }

        let reaped = self.context.store.reap_expired();
        if reaped > 0 {
            tracing::debug!("Reaped {} expired job(s)", reaped);
        }

        let id = JobId::new();
        self.context.store.insert(id);
        tracing::info!(
            "Submitted job {} for {} (fields: {:?}, pagination: {})",
            id,
            url,
            field_types,
            request.follow_pagination
        );

        let job = PendingJob {
            id,
            url: url.to_string(),
            field_types,
            follow_pagination: request.follow_pagination,
            credentials: request.credentials,
        };
        let context = self.context.clone();
        let workers = Arc::clone(&self.workers);
        tokio::spawn(async move { context.run(workers, job).await });

        Ok(id)
    }

    /// Current status message of a job
    ///
    /// Unknown identifiers get `NOT_FOUND_MESSAGE`.
    pub fn poll(&self, id: &JobId) -> String {
        self.context
            .store
            .message(id)
            .unwrap_or_else(|| NOT_FOUND_MESSAGE.to_string())
    }

    /// Like `poll`, for identifiers that arrive as text
    pub fn poll_str(&self, id: &str) -> String {
        match id.parse::<JobId>() {
            Ok(id) => self.poll(&id),
            Err(_) => NOT_FOUND_MESSAGE.to_string(),
        }
    }

    /// Typed status of a job
    pub fn status(&self, id: &JobId) -> Option<JobSnapshot> {
        self.context.store.snapshot(id)
    }

    /// Polls until the job finishes, returning its final snapshot
    ///
    /// Returns None if the job is unknown (or was reaped while waiting).
    pub async fn wait_for(&self, id: &JobId, interval: Duration) -> Option<JobSnapshot> {
        loop {
            let snapshot = self.status(id)?;
            if snapshot.status.is_terminal() {
                return Some(snapshot);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Finds the export of a job
    ///
    /// Jobs that are still running or that failed have no export, even if the
    /// exporter left something behind.
    pub async fn retrieve_export(&self, id: &JobId) -> Result<Option<ExportArtifact>, ExportError> {
        match self.context.store.status(id) {
            Some(status) if !status.is_success() => Ok(None),
            _ => self.context.exporter.retrieve(id).await,
        }
    }

    /// Drops finished jobs past their retention period
    pub fn reap_expired(&self) -> usize {
        self.context.store.reap_expired()
    }

    /// Number of jobs currently tracked
    pub fn job_count(&self) -> usize {
        self.context.store.len()
    }
}

impl JobContext {
    /// Waits for a worker slot, runs the job and records its outcome
    async fn run(self, workers: Arc<Semaphore>, job: PendingJob) {
        let id = job.id;

        let _permit = match workers.acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                self.fail(&id, EngineError::Worker(e.to_string()));
                return;
            }
        };
        self.store.mark_running(&id);
        tracing::info!("Job {} started", id);

        // A panic inside the job surfaces here as a JoinError
        let context = self.clone();
        let result = match tokio::spawn(async move { context.execute(job).await }).await {
            Ok(result) => result,
            Err(e) => Err(EngineError::Worker(e.to_string())),
        };

        match result {
            Ok(location) => {
                tracing::info!("Job {} completed, export at {}", id, location);
                self.store.finish(
                    &id,
                    JobStatus::Succeeded {
                        export_location: location.clone(),
                    },
                    format!("Completed! Download CSV: {}", location),
                );
            }
            Err(e) => self.fail(&id, e),
        }
    }

    async fn execute(&self, job: PendingJob) -> Result<String, EngineError> {
        let id = job.id;
        let entry = Url::parse(&job.url).map_err(|source| FetchError::InvalidUrl {
            url: job.url.clone(),
            source,
        })?;
        let request = ScrapeRequest {
            entry,
            field_types: job.field_types,
            follow_pagination: job.follow_pagination,
            credentials: job.credentials,
        };

        let store = Arc::clone(&self.store);
        let progress = move |message: String| store.set_message(&id, message);
        let session = ScrapeSession::new(Arc::clone(&self.registry), self.options, &progress);
        let outcome = session.run(self.fetchers.as_ref(), &request).await?;

        let found: usize = outcome.results.values().map(|values| values.len()).sum();
        tracing::info!(
            "Job {} scraped {} page(s), {} value(s) extracted",
            id,
            outcome.pages_visited,
            found
        );

        let location = self.exporter.export(&id, &outcome.results).await?;
        Ok(location)
    }

    fn fail(&self, id: &JobId, error: EngineError) {
        tracing::error!("Job {} failed: {}", id, error);
        let message = format!("Error: {}", error);
        self.store.finish(
            id,
            JobStatus::Failed {
                error: error.to_string(),
            },
            message,
        );
    }
}
