//! Scrape session - one traversal from entry page to extracted fields
//!
//! This module ties the pieces of a single scrape together:
//! - Acquiring a page fetcher and always releasing it
//! - The optional one-time login after the entry page is loaded
//! - Driving the traversal and accumulating page content
//! - Running the extractors over the accumulated content

use crate::config::EngineConfig;
use crate::crawler::fetcher::{Credentials, FetchError, FetcherFactory, PageFetcher};
use crate::crawler::traversal::{StopReason, Traversal, DEFAULT_MAX_PAGES};
use crate::extract::{ExtractionError, ExtractorRegistry, FieldResultSet};
use crate::EngineError;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Receives human-readable progress messages from a running session
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: String);
}

impl<F> ProgressSink for F
where
    F: Fn(String) + Send + Sync,
{
    fn report(&self, message: String) {
        self(message)
    }
}

/// What to scrape
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub entry: Url,
    pub field_types: BTreeSet<String>,
    pub follow_pagination: bool,
    pub credentials: Option<Credentials>,
}

/// Per-session limits
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Page ceiling for the traversal
    pub max_pages: u32,

    /// Pause after a successful login submission
    pub login_settle: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            login_settle: Duration::from_secs(3),
        }
    }
}

impl From<&EngineConfig> for SessionOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            login_settle: Duration::from_millis(config.login_settle_ms),
        }
    }
}

/// Result of a finished session
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub results: FieldResultSet,
    pub pages_visited: u32,
    pub stop_reason: Option<StopReason>,
}

/// Content accumulated by a completed traversal
struct Collected {
    buffer: String,
    pages_visited: u32,
    stop_reason: Option<StopReason>,
}

/// Runs scrape requests against fetchers from a factory
pub struct ScrapeSession<'a> {
    registry: Arc<ExtractorRegistry>,
    options: SessionOptions,
    progress: &'a dyn ProgressSink,
}

impl<'a> ScrapeSession<'a> {
    pub fn new(
        registry: Arc<ExtractorRegistry>,
        options: SessionOptions,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            registry,
            options,
            progress,
        }
    }

    /// Runs `request` to completion
    ///
    /// The fetcher is released before this returns, on success and on error.
    pub async fn run(
        &self,
        fetchers: &dyn FetcherFactory,
        request: &ScrapeRequest,
    ) -> Result<ScrapeOutcome, EngineError> {
        let mut fetcher = fetchers.acquire().await?;
        let collected = self.traverse(fetcher.as_mut(), request).await;
        fetcher.release().await;
        let collected = collected?;

        tracing::debug!(
            "Collected {} bytes from {} page(s)",
            collected.buffer.len(),
            collected.pages_visited
        );

        let results = self
            .extract(collected.buffer, request.field_types.clone())
            .await?;

        Ok(ScrapeOutcome {
            results,
            pages_visited: collected.pages_visited,
            stop_reason: collected.stop_reason,
        })
    }

    async fn traverse(
        &self,
        fetcher: &mut dyn PageFetcher,
        request: &ScrapeRequest,
    ) -> Result<Collected, FetchError> {
        if let Some(credentials) = request.credentials.as_ref().filter(|c| c.is_complete()) {
            fetcher.fetch(&request.entry).await?;
            self.login(fetcher, credentials).await;
        }

        let mut traversal = Traversal::new(
            request.entry.clone(),
            request.follow_pagination,
            self.options.max_pages,
        );
        let mut buffer = String::new();

        while let Some(location) = traversal.next_fetch().cloned() {
            let page = fetcher.fetch(&location).await?;
            buffer.push_str(&page.content);
            traversal.record_fetch();

            tracing::debug!("Fetched page {}: {}", traversal.pages_visited(), location);
            self.progress.report(format!(
                "Scraped page {}: {}",
                traversal.pages_visited(),
                location
            ));

            traversal.decide(&page.links);
        }

        Ok(Collected {
            buffer,
            pages_visited: traversal.pages_visited(),
            stop_reason: traversal.stop_reason(),
        })
    }

    /// Submits credentials once; failures are reported and otherwise ignored
    async fn login(&self, fetcher: &mut dyn PageFetcher, credentials: &Credentials) {
        match fetcher.login(credentials).await {
            Ok(()) => {
                tokio::time::sleep(self.options.login_settle).await;
                tracing::info!("Logged in as {}", credentials.username);
                self.progress.report("Logged in successfully.".to_string());
            }
            Err(e) => {
                tracing::warn!("Login failed, continuing without it: {}", e);
                self.progress.report(format!("Login failed: {}", e));
            }
        }
    }

    /// Runs the extractors on the blocking pool
    async fn extract(
        &self,
        buffer: String,
        field_types: BTreeSet<String>,
    ) -> Result<FieldResultSet, ExtractionError> {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || registry.extract(&buffer, &field_types))
            .await
            .map_err(|e| ExtractionError::Worker(e.to_string()))
    }
}
