//! Pagination traversal over a real HTTP fetcher

use crate::common::{fetcher_config, mount_page, session, Recorder};
use scrape_engine::crawler::{HttpFetcherFactory, ScrapeRequest, StopReason};
use std::collections::BTreeSet;
use url::Url;
use wiremock::MockServer;

fn request(entry: &str, types: &[&str], follow_pagination: bool) -> ScrapeRequest {
    ScrapeRequest {
        entry: Url::parse(entry).unwrap(),
        field_types: types.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
        follow_pagination,
        credentials: None,
    }
}

#[tokio::test]
async fn test_follows_next_link_across_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/list/1",
        r#"<html><body><p>alice@example.com</p><a href="/list/2">Next</a></body></html>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(
        &server,
        "/list/2",
        r#"<html><body><p>bob@example.com</p></body></html>"#.to_string(),
        1,
    )
    .await;

    let recorder = Recorder::default();
    let factory = HttpFetcherFactory::new(fetcher_config());
    let outcome = session(&recorder, 50)
        .run(&factory, &request(&format!("{}/list/1", base), &["email"], true))
        .await
        .unwrap();

    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(outcome.stop_reason, Some(StopReason::NoNextLink));

    let emails = &outcome.results["email"];
    assert_eq!(emails.len(), 2);
    assert!(emails.contains("alice@example.com"));
    assert!(emails.contains("bob@example.com"));

    assert_eq!(
        recorder.messages(),
        vec![
            format!("Scraped page 1: {}/list/1", base),
            format!("Scraped page 2: {}/list/2", base),
        ]
    );
}

#[tokio::test]
async fn test_rel_next_link_is_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/a",
        r#"<a href="/b" rel="next">»</a><p>TXN-ABC123</p>"#.to_string(),
        1,
    )
    .await;
    mount_page(&server, "/b", "<p>TXN-DEF456</p>".to_string(), 1).await;

    let recorder = Recorder::default();
    let factory = HttpFetcherFactory::new(fetcher_config());
    let outcome = session(&recorder, 50)
        .run(
            &factory,
            &request(&format!("{}/a", base), &["transaction_id"], true),
        )
        .await
        .unwrap();

    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(outcome.results["transaction_id"].len(), 2);
}

#[tokio::test]
async fn test_pagination_disabled_fetches_entry_only() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/list/1",
        r#"<p>alice@example.com</p><a href="/list/2">Next</a>"#.to_string(),
        1,
    )
    .await;
    mount_page(&server, "/list/2", "<p>bob@example.com</p>".to_string(), 0).await;

    let recorder = Recorder::default();
    let factory = HttpFetcherFactory::new(fetcher_config());
    let outcome = session(&recorder, 50)
        .run(&factory, &request(&format!("{}/list/1", base), &["email"], false))
        .await
        .unwrap();

    assert_eq!(outcome.pages_visited, 1);
    assert_eq!(outcome.stop_reason, Some(StopReason::PaginationDisabled));
    assert!(!outcome.results["email"].contains("bob@example.com"));
}

#[tokio::test]
async fn test_next_link_cycle_stops_traversal() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/p1", r#"<a href="/p2">Next</a>"#.to_string(), 1).await;
    mount_page(&server, "/p2", r#"<a href="/p1">Next</a>"#.to_string(), 1).await;

    let recorder = Recorder::default();
    let factory = HttpFetcherFactory::new(fetcher_config());
    let outcome = session(&recorder, 50)
        .run(&factory, &request(&format!("{}/p1", base), &["email"], true))
        .await
        .unwrap();

    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(outcome.stop_reason, Some(StopReason::Cycle));
    assert!(outcome.results["email"].is_empty());
}

#[tokio::test]
async fn test_page_ceiling_bounds_traversal() {
    let server = MockServer::start().await;
    let base = server.uri();

    for n in 1..=3 {
        let hits = if n == 3 { 0 } else { 1 };
        mount_page(
            &server,
            &format!("/page/{}", n),
            format!(r#"<a href="/page/{}">Next</a>"#, n + 1),
            hits,
        )
        .await;
    }

    let recorder = Recorder::default();
    let factory = HttpFetcherFactory::new(fetcher_config());
    let outcome = session(&recorder, 2)
        .run(&factory, &request(&format!("{}/page/1", base), &["phone"], true))
        .await
        .unwrap();

    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(outcome.stop_reason, Some(StopReason::PageLimit));
}

#[tokio::test]
async fn test_missing_page_fails_session() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/list/1", r#"<a href="/gone">Next</a>"#.to_string(), 1).await;

    let recorder = Recorder::default();
    let factory = HttpFetcherFactory::new(fetcher_config());
    let error = session(&recorder, 50)
        .run(&factory, &request(&format!("{}/list/1", base), &["email"], true))
        .await
        .unwrap_err();

    assert!(error.to_string().contains("HTTP 404"));
    assert_eq!(recorder.messages().len(), 1);
}
