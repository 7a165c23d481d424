//! Crawler module for page fetching and traversal
//!
//! This module contains the core scraping logic, including:
//! - The page fetcher capability and its HTTP implementation
//! - HTML parsing for pagination links and login forms
//! - The pagination traversal state machine
//! - Scrape sessions tying traversal and extraction together

mod fetcher;
mod parser;
mod session;
mod traversal;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{
    build_http_client, Credentials, FetchError, FetchedPage, FetcherFactory, HttpFetcherFactory,
    HttpPageFetcher, LoginError, PageFetcher,
};
pub use parser::{discover_links, locate_login_form, DiscoveredLinks, FormMethod, LoginForm};
pub use session::{ProgressSink, ScrapeOutcome, ScrapeRequest, ScrapeSession, SessionOptions};
pub use traversal::{LinkStrategy, StopReason, Traversal, TraversalPhase, DEFAULT_MAX_PAGES};
