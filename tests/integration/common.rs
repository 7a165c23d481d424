//! Shared helpers for integration tests

use scrape_engine::config::{Config, EngineConfig, FetcherConfig, OutputConfig};
use scrape_engine::crawler::{ScrapeSession, SessionOptions};
use scrape_engine::ExtractorRegistry;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves `body` as HTML for GET requests to `route`, expecting `hits` requests
pub async fn mount_page(server: &MockServer, route: &str, body: String, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(hits)
        .mount(server)
        .await;
}

pub fn fetcher_config() -> FetcherConfig {
    FetcherConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
        request_timeout_secs: 5,
        connect_timeout_secs: 5,
    }
}

/// A configuration that exports into `export_dir` and never waits long
pub fn test_config(export_dir: &Path) -> Config {
    Config {
        engine: EngineConfig {
            max_concurrent_jobs: 2,
            max_pages: 10,
            job_retention_secs: 60,
            login_settle_ms: 10,
        },
        fetcher: fetcher_config(),
        output: OutputConfig {
            export_dir: export_dir.display().to_string(),
            download_prefix: "/download".to_string(),
        },
        extractors: vec![],
    }
}

pub fn session_options(max_pages: u32) -> SessionOptions {
    SessionOptions {
        max_pages,
        login_settle: Duration::from_millis(10),
    }
}

/// Collects progress messages in order
#[derive(Default)]
pub struct Recorder {
    messages: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl scrape_engine::crawler::ProgressSink for Recorder {
    fn report(&self, message: String) {
        self.messages.lock().unwrap().push(message);
    }
}

pub fn session(recorder: &Recorder, max_pages: u32) -> ScrapeSession<'_> {
    ScrapeSession::new(
        Arc::new(ExtractorRegistry::builtin().unwrap()),
        session_options(max_pages),
        recorder,
    )
}
