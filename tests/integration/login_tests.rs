//! Login form handling over a real HTTP fetcher

use crate::common::{fetcher_config, mount_page, session, Recorder};
use scrape_engine::crawler::{HttpFetcherFactory, ScrapeRequest};
use scrape_engine::Credentials;
use std::collections::BTreeSet;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"<html><body>
    <form action="/session" method="post">
        <input type="hidden" name="csrf" value="t0k3n">
        <input type="text" name="username">
        <input type="password" name="password">
    </form>
    <p>support@example.com</p>
</body></html>"#;

fn request(entry: &str, credentials: Credentials) -> ScrapeRequest {
    ScrapeRequest {
        entry: Url::parse(entry).unwrap(),
        field_types: BTreeSet::from(["email".to_string()]),
        follow_pagination: false,
        credentials: Some(credentials),
    }
}

#[tokio::test]
async fn test_login_session_cookie_reaches_later_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/login"))
        .and(header("cookie", "session=abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<p>member@example.com</p>")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_string_contains("username=jane"))
        .and(body_string_contains("password=hunter2"))
        .and(body_string_contains("csrf=t0k3n"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<p>Welcome back</p>")
                .insert_header("set-cookie", "session=abc; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Before login there is no cookie, so only the landing fetch sees the form
    mount_page(&server, "/login", LOGIN_PAGE.to_string(), 1).await;

    let recorder = Recorder::default();
    let factory = HttpFetcherFactory::new(fetcher_config());
    let outcome = session(&recorder, 50)
        .run(
            &factory,
            &request(&format!("{}/login", base), Credentials::new("jane", "hunter2")),
        )
        .await
        .unwrap();

    assert_eq!(outcome.pages_visited, 1);
    assert!(outcome.results["email"].contains("member@example.com"));
    assert_eq!(
        recorder.messages(),
        vec![
            "Logged in successfully.".to_string(),
            format!("Scraped page 1: {}/login", base),
        ]
    );
}

#[tokio::test]
async fn test_login_field_mismatch_is_not_fatal() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Landing fetch plus the traversal's own fetch of the entry page
    mount_page(&server, "/login", LOGIN_PAGE.to_string(), 2).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let credentials = Credentials::new("jane", "hunter2").with_fields("email", "passcode");
    let recorder = Recorder::default();
    let factory = HttpFetcherFactory::new(fetcher_config());
    let outcome = session(&recorder, 50)
        .run(&factory, &request(&format!("{}/login", base), credentials))
        .await
        .unwrap();

    assert_eq!(outcome.pages_visited, 1);
    assert!(outcome.results["email"].contains("support@example.com"));

    let messages = recorder.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("Login failed:"));
    assert!(messages[0].contains("email"));
    assert_eq!(messages[1], format!("Scraped page 1: {}/login", base));
}

#[tokio::test]
async fn test_incomplete_credentials_skip_login() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/login", LOGIN_PAGE.to_string(), 1).await;

    let recorder = Recorder::default();
    let factory = HttpFetcherFactory::new(fetcher_config());
    session(&recorder, 50)
        .run(
            &factory,
            &request(&format!("{}/login", base), Credentials::new("jane", "")),
        )
        .await
        .unwrap();

    assert_eq!(
        recorder.messages(),
        vec![format!("Scraped page 1: {}/login", base)]
    );
}
