use malwatch_core::{
    AccountLookup, ActivityGateway, EventKind, GatewayConfig, GatewayError, GitHubGateway,
    Identity,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

/// Runs `f` against a gateway pointed at `server`.
///
/// The blocking client owns its own runtime, so it is built, used and dropped
/// on a blocking worker thread.
async fn with_gateway<T, F>(server: &MockServer, f: F) -> T
where
    F: FnOnce(&GitHubGateway) -> T + Send + 'static,
    T: Send + 'static,
{
    let mut config = GatewayConfig::new(TOKEN);
    config.api_base_url = server.uri();
    tokio::task::spawn_blocking(move || {
        let gateway = GitHubGateway::new(&config).expect("client should build");
        f(&gateway)
    })
    .await
    .expect("gateway call should not panic")
}

async fn mount_feed(server: &MockServer, feed_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(feed_path))
        .and(query_param("per_page", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_maps_not_found_to_removed_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ultimatepate"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
        .mount(&server)
        .await;

    let lookup = with_gateway(&server, |gateway| gateway.lookup_account("ultimatepate")).await;
    assert_eq!(lookup.unwrap(), AccountLookup::NotFound);
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_sends_token_and_maps_success_to_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/lazysmock"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"login":"lazysmock"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let lookup = with_gateway(&server, |gateway| gateway.lookup_account("lazysmock")).await;
    assert_eq!(lookup.unwrap(), AccountLookup::Found);
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_server_error_is_reported_as_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/lazysmock"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = with_gateway(&server, |gateway| gateway.lookup_account("lazysmock"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 500, .. }));
    assert!(!err.is_rate_limited());
}

#[tokio::test(flavor = "multi_thread")]
async fn activity_merges_performed_and_received_feeds() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/users/lazysmock/events/public",
        r#"[{"type":"CreateEvent","repo":{"name":"lazysmock/payload"}}]"#,
    )
    .await;
    mount_feed(
        &server,
        "/users/lazysmock/received_events/public",
        r#"[{"type":"WatchEvent","actor":{"login":"zzz"},"repo":{"name":"lazysmock/payload"}}]"#,
    )
    .await;

    let events = with_gateway(&server, |gateway| {
        gateway.fetch_activity("lazysmock", Identity::Authenticated)
    })
    .await
    .unwrap();

    let mut kinds: Vec<EventKind> = events.iter().map(|event| event.kind).collect();
    kinds.sort_by_key(|kind| format!("{kind:?}"));
    assert_eq!(kinds, vec![EventKind::Create, EventKind::Watch]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|request| request.headers.contains_key("authorization")));
}

#[tokio::test(flavor = "multi_thread")]
async fn anonymous_activity_requests_carry_no_token() {
    let server = MockServer::start().await;
    mount_feed(&server, "/users/ultimatepate/events/public", "[]").await;
    mount_feed(&server, "/users/ultimatepate/received_events/public", "[]").await;

    let events = with_gateway(&server, |gateway| {
        gateway.fetch_activity("ultimatepate", Identity::Anonymous)
    })
    .await
    .unwrap();
    assert!(events.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|request| !request.headers.contains_key("authorization")));
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_quota_on_feed_is_rate_limited_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ultimatepate/events/public"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_string(r#"{"message":"API rate limit exceeded"}"#),
        )
        .mount(&server)
        .await;

    let err = with_gateway(&server, |gateway| {
        gateway.fetch_activity("ultimatepate", Identity::Anonymous)
    })
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Status {
            status: 403,
            rate_limit_remaining: Some(0),
            ..
        }
    ));
    assert!(err.is_rate_limited());
}
