//! Page fetching
//!
//! This module defines the page fetcher capability the scrape session drives,
//! and the default HTTP implementation of it:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests for page content, with error classification
//! - Next-link discovery on every fetched page
//! - Best-effort login form submission

use crate::config::FetcherConfig;
use crate::crawler::parser::{discover_links, locate_login_form, DiscoveredLinks};
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that abort a traversal
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Page fetcher unavailable: {0}")]
    Unavailable(String),
}

/// Errors from a login attempt
///
/// These never abort a traversal; they are reported as progress.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("no page has been loaded yet")]
    NoPage,

    #[error("no form field named '{0}'")]
    FieldNotFound(String),

    #[error("form submission failed: {0}")]
    Submit(String),
}

/// Login credentials and the form field names to put them in
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub username_field: String,
    pub password_field: String,
}

impl Credentials {
    /// Credentials for the default `username`/`password` form fields
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            username_field: "username".to_string(),
            password_field: "password".to_string(),
        }
    }

    /// Overrides the form field names
    pub fn with_fields(
        mut self,
        username_field: impl Into<String>,
        password_field: impl Into<String>,
    ) -> Self {
        self.username_field = username_field.into();
        self.password_field = password_field.into();
        self
    }

    /// Login is only attempted when both username and password are present
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("username_field", &self.username_field)
            .field("password_field", &self.password_field)
            .finish()
    }
}

/// A fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub location: Url,
    /// Page body content
    pub content: String,
    /// Pagination links found on the page
    pub links: DiscoveredLinks,
}

/// A page fetcher owned by one scrape session
///
/// Fetchers are stateful (cookies, the current page). `release` must be called
/// once the session is done with the fetcher, whatever the outcome.
#[async_trait]
pub trait PageFetcher: Send {
    /// Loads `location` and returns its content and pagination links
    async fn fetch(&mut self, location: &Url) -> Result<FetchedPage, FetchError>;

    /// Fills and submits the login form on the current page
    async fn login(&mut self, credentials: &Credentials) -> Result<(), LoginError>;

    /// Releases the fetcher's resources
    async fn release(&mut self);
}

/// Hands out one fresh fetcher per scrape session
#[async_trait]
pub trait FetcherFactory: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn PageFetcher>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// The client keeps a cookie store so a session established by a login form
/// carries over to the pages fetched afterwards.
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Creates `HttpPageFetcher`s from configuration
#[derive(Debug, Clone)]
pub struct HttpFetcherFactory {
    config: FetcherConfig,
}

impl HttpFetcherFactory {
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl FetcherFactory for HttpFetcherFactory {
    async fn acquire(&self) -> Result<Box<dyn PageFetcher>, FetchError> {
        let client = build_http_client(&self.config)
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;
        Ok(Box::new(HttpPageFetcher::new(client)))
    }
}

/// Static HTML fetcher over reqwest
///
/// Pages are taken as served; no script execution happens.
pub struct HttpPageFetcher {
    client: Option<Client>,
    current: Option<(Url, String)>,
}

impl HttpPageFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client: Some(client),
            current: None,
        }
    }

    fn client(&self) -> Result<&Client, FetchError> {
        self.client
            .as_ref()
            .ok_or_else(|| FetchError::Unavailable("fetcher already released".to_string()))
    }

    /// Reads a successful response into a page, remembering it as current
    async fn accept(
        &mut self,
        requested: &Url,
        response: reqwest::Response,
    ) -> Result<FetchedPage, FetchError> {
        let status = response.status();
        let location = response.url().clone();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: requested.to_string(),
                status: status.as_u16(),
            });
        }

        let content = response
            .text()
            .await
            .map_err(|e| classify_error(requested, e))?;
        let links = discover_links(&content, &location);

        self.current = Some((location.clone(), content.clone()));

        Ok(FetchedPage {
            location,
            content,
            links,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&mut self, location: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client()?
            .get(location.clone())
            .send()
            .await
            .map_err(|e| classify_error(location, e))?;

        self.accept(location, response).await
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<(), LoginError> {
        let (page_url, html) = self.current.as_ref().ok_or(LoginError::NoPage)?;
        let form = locate_login_form(
            html,
            page_url,
            &credentials.username_field,
            &credentials.password_field,
        )?;
        let fields = form.fill(credentials);

        let client = self
            .client()
            .map_err(|e| LoginError::Submit(e.to_string()))?;
        let request = if form.is_get() {
            client.get(form.action.clone()).query(&fields)
        } else {
            client.post(form.action.clone()).form(&fields)
        };

        let response = request
            .send()
            .await
            .map_err(|e| LoginError::Submit(e.to_string()))?;

        let action = form.action.clone();
        self.accept(&action, response)
            .await
            .map(|_| ())
            .map_err(|e| LoginError::Submit(e.to_string()))
    }

    async fn release(&mut self) {
        self.current = None;
        self.client = None;
    }
}

/// Maps a reqwest failure to the matching fetch error
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if let Some(status) = error.status() {
        FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
