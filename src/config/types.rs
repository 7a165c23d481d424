use serde::Deserialize;

/// Main configuration structure for the scrape engine
///
/// Every section is optional in the TOML file; missing sections fall back to
/// their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub fetcher: FetcherConfig,
    pub output: OutputConfig,
    /// Additional field types registered next to the built-in catalog
    #[serde(rename = "extractor")]
    pub extractors: Vec<CustomExtractor>,
}

/// Job scheduling and traversal limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of jobs allowed to run at the same time
    #[serde(rename = "max-concurrent-jobs")]
    pub max_concurrent_jobs: usize,

    /// Hard ceiling on pages fetched by a single traversal
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// How long finished jobs stay pollable (seconds)
    #[serde(rename = "job-retention-secs")]
    pub job_retention_secs: u64,

    /// Pause after a login submission before traversal starts (milliseconds)
    #[serde(rename = "login-settle-ms")]
    pub login_settle_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            max_pages: 50,
            job_retention_secs: 3600,
            login_settle_ms: 3000,
        }
    }
}

/// HTTP page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Upper bound on a single page request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on establishing a connection (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl FetcherConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            crawler_name: "ScrapeEngine".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
            request_timeout_secs: 10,
            connect_timeout_secs: 10,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives one CSV file per finished job
    #[serde(rename = "export-dir")]
    pub export_dir: String,

    /// Prefix of the retrieval location handed back to pollers
    #[serde(rename = "download-prefix")]
    pub download_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            export_dir: "uploads".to_string(),
            download_prefix: "/download".to_string(),
        }
    }
}

/// A user-defined field type
#[derive(Debug, Clone, Deserialize)]
pub struct CustomExtractor {
    /// Field type name used in extraction requests
    pub name: String,

    /// Regular expression applied to the accumulated content
    pub pattern: String,
}
