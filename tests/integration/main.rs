//! Integration tests for the scrape engine
//!
//! These tests use wiremock to stand up mock sites and drive the HTTP
//! fetcher, scrape sessions and the job manager end-to-end.

mod common;
mod login_tests;
mod pagination_tests;
