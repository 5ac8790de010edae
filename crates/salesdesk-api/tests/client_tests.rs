// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use salesdesk_api::Client;
use salesdesk_app::{
    DateRange, FetchError, ListQuery, ListView, SessionContext, StaticSession, ViewCommand,
    ViewConfig, ViewEvent, sales_order_registry,
};
use salesdesk_testkit::{
    MockListServer, MockResponse, OrderFaker, fixture_token, page_json, page_of,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn first_page(page_size: usize) -> ListQuery {
    ListQuery {
        page: 1,
        page_size,
        search: String::new(),
        filters: Vec::new(),
        date_range: DateRange::default(),
    }
}

fn client_for(server: &MockListServer, session: Arc<StaticSession>) -> Result<Client> {
    Client::new(server.base_url(), Duration::from_secs(2), session)
}

#[test]
fn list_orders_sends_query_and_bearer_token() -> Result<()> {
    let orders = OrderFaker::new(11).sales_orders(40);
    let body = page_json(&page_of(&orders, 2, 25))?;
    let server = MockListServer::start(vec![MockResponse::json(200, body)])?;
    let session = Arc::new(StaticSession::new(Some(fixture_token())));
    let client = client_for(&server, session)?;

    let page = client.list_orders(&ListQuery {
        page: 2,
        page_size: 25,
        search: "olive".to_owned(),
        filters: vec![
            ("status".to_owned(), "shipped".to_owned()),
            ("location".to_owned(), String::new()),
        ],
        date_range: DateRange::default(),
    })?;
    assert_eq!(page.count, 40);
    assert_eq!(page.results.len(), 15);
    assert_eq!(page.results[0].id, orders[25].id);

    let requests = server.finish()?;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url,
        "/api/sales/orders/?page=2&page_size=25&search=olive&status=shipped"
    );
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer test-access-token")
    );
    Ok(())
}

#[test]
fn missing_token_sends_no_authorization_header() -> Result<()> {
    let body = page_json(&page_of(&[], 1, 10))?;
    let server = MockListServer::start(vec![MockResponse::json(200, body)])?;
    let client = client_for(&server, Arc::new(StaticSession::new(None)))?;

    let page = client.list_orders(&first_page(10))?;
    assert_eq!(page.count, 0);
    assert_eq!(server.finish()?[0].authorization, None);
    Ok(())
}

#[test]
fn unauthorized_clears_session() -> Result<()> {
    let server = MockListServer::start(vec![MockResponse::json(
        401,
        r#"{"detail": "Given token not valid for any token type"}"#,
    )])?;
    let session = Arc::new(StaticSession::new(Some(fixture_token())));
    let client = client_for(&server, Arc::clone(&session))?;

    let error = client
        .list_orders(&first_page(10))
        .expect_err("401 should fail");
    assert_eq!(error, FetchError::Unauthorized);
    assert_eq!(session.access_token()?, None);
    server.finish()?;
    Ok(())
}

#[test]
fn not_found_is_distinct_from_server_errors() -> Result<()> {
    let server = MockListServer::start(vec![
        MockResponse::text(404, "Not Found"),
        MockResponse::json(500, r#"{"detail": "database unavailable"}"#),
        MockResponse::text(502, "Bad Gateway"),
        MockResponse::text(503, "<html><body>maintenance</body></html>"),
    ])?;
    let client = client_for(&server, Arc::new(StaticSession::new(None)))?;
    let query = first_page(10);

    assert_eq!(client.list_orders(&query), Err(FetchError::NotFound));
    assert_eq!(
        client.list_orders(&query),
        Err(FetchError::Server {
            status: 500,
            message: "database unavailable".to_owned(),
        })
    );
    assert_eq!(
        client.list_orders(&query),
        Err(FetchError::Server {
            status: 502,
            message: "Bad Gateway".to_owned(),
        })
    );
    assert_eq!(
        client.list_orders(&query),
        Err(FetchError::Server {
            status: 503,
            message: String::new(),
        })
    );
    server.finish()?;
    Ok(())
}

#[test]
fn malformed_body_is_a_decode_error() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert!(request.url().starts_with("/api/sales/orders/"));
        let response = Response::from_string(r#"{"count": "many", "results": 3}"#)
            .with_status_code(200)
            .with_header(
                Header::from_bytes("Content-Type", "application/json")
                    .expect("valid content type header"),
            );
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(
        &addr,
        Duration::from_secs(1),
        Arc::new(StaticSession::new(None)),
    )?;
    let error = client
        .list_orders(&first_page(10))
        .expect_err("malformed page should fail");
    assert!(matches!(error, FetchError::Decode(_)));
    assert!(error.user_message().contains("server error"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn unreachable_server_is_a_network_error() -> Result<()> {
    let client = Client::new(
        "http://127.0.0.1:1",
        Duration::from_millis(200),
        Arc::new(StaticSession::new(None)),
    )?;
    let error = client
        .list_orders(&first_page(10))
        .expect_err("nothing listens on port 1");
    assert!(matches!(error, FetchError::Network(_)));
    assert!(error.user_message().contains("failed to fetch"));
    assert!(client.check().is_err());
    Ok(())
}

#[test]
fn list_view_loads_pages_through_client() -> Result<()> {
    let orders = OrderFaker::new(5).sales_orders(30);
    let server = MockListServer::start(vec![
        MockResponse::json(200, page_json(&page_of(&orders, 1, 10))?),
        MockResponse::text(500, "upstream timeout"),
    ])?;
    let client = client_for(&server, Arc::new(StaticSession::new(Some(fixture_token()))))?;
    let (mut view, rx) = ListView::new(
        sales_order_registry()?,
        ViewConfig::default(),
        Arc::new(client),
    )?;

    view.dispatch(ViewCommand::Refresh);
    let loaded = view.handle_event(rx.recv_timeout(Duration::from_secs(5))?);
    assert_eq!(
        loaded,
        vec![ViewEvent::PageLoaded { seq: 1, count: 30 }]
    );
    assert_eq!(view.pagination().total_pages(), 3);
    assert_eq!(view.visible_rows().len(), 10);

    view.dispatch(ViewCommand::NextPage);
    let failed = view.handle_event(rx.recv_timeout(Duration::from_secs(5))?);
    assert!(matches!(failed.as_slice(), [ViewEvent::FetchFailed { .. }]));
    assert_eq!(view.visible_rows().len(), 10);
    assert_eq!(
        view.error(),
        Some("server error (500): upstream timeout")
    );

    let requests = server.finish()?;
    assert_eq!(requests[1].url, "/api/sales/orders/?page=2&page_size=10");
    Ok(())
}
