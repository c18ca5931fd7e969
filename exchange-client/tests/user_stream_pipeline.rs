//! User stream pipeline tests against a mock exchange.
//!
//! Every test runs against a local `wiremock` server standing in for the
//! futures REST API, so no network access or API keys are needed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use exchange_client::venue::binance::{
    BinanceHmacSigner, FuturesMarket, FuturesUserStreamClient, ListenKeyKeeper,
};
use exchange_client::venue::http::{ApiRoute, AuthLevel, HttpClient, RequestResult};
use exchange_client::venue::{ErrorKind, RestConfig, TimeSyncConfig, VenueError};

const API_KEY: &str = "test-api-key";
const LISTEN_KEY_PATH: &str = "/fapi/v1/listenKey";
const TIME_PATH: &str = "/fapi/v1/time";

// ============================================================================
// Test Helpers
// ============================================================================

fn auto_sync() -> TimeSyncConfig {
    TimeSyncConfig::default()
}

fn http_client(server: &MockServer, time_sync: TimeSyncConfig) -> Arc<HttpClient> {
    let route = ApiRoute::new(server.uri(), "fapi", "1");
    let rest = RestConfig {
        time_sync,
        ..RestConfig::default()
    }
    .with_base_url(server.uri());

    let signer = BinanceHmacSigner::new(API_KEY, "test-secret");
    Arc::new(HttpClient::new(Box::new(signer), route, rest).expect("client"))
}

fn user_stream(server: &MockServer, time_sync: TimeSyncConfig) -> FuturesUserStreamClient {
    FuturesUserStreamClient::for_market(http_client(server, time_sync), server.uri(), FuturesMarket::Usdt)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

async fn mount_server_time(server: &MockServer, server_time: i64, times: u64) {
    Mock::given(method("GET"))
        .and(path(TIME_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "serverTime": server_time })))
        .expect(times)
        .mount(server)
        .await;
}

async fn received_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}

// ============================================================================
// Start / keepalive / stop
// ============================================================================

#[tokio::test]
async fn start_returns_listen_key_field() {
    let server = MockServer::start().await;
    mount_server_time(&server, now_ms(), 1).await;

    Mock::given(method("POST"))
        .and(path(LISTEN_KEY_PATH))
        .and(header("x-mbx-apikey", API_KEY))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "listenKey": "abc123", "expiresIn": 3600 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = user_stream(&server, auto_sync());
    let result = client.start_user_stream(&CancellationToken::new()).await;

    assert!(result.is_success(), "start failed: {:?}", result.error());
    assert_eq!(result.data().map(String::as_str), Some("abc123"));
    assert_eq!(result.status(), Some(reqwest::StatusCode::OK));
}

#[tokio::test]
async fn keepalive_sends_listen_key_in_form_body() {
    let server = MockServer::start().await;
    mount_server_time(&server, now_ms(), 1).await;

    Mock::given(method("PUT"))
        .and(path(LISTEN_KEY_PATH))
        .and(header("x-mbx-apikey", API_KEY))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("listenKey=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = user_stream(&server, auto_sync());
    let result = client
        .keep_alive_user_stream("abc123", &CancellationToken::new())
        .await;

    assert!(result.is_success(), "keepalive failed: {:?}", result.error());
}

#[tokio::test]
async fn stop_sends_listen_key_in_query() {
    let server = MockServer::start().await;
    mount_server_time(&server, now_ms(), 1).await;

    Mock::given(method("DELETE"))
        .and(path(LISTEN_KEY_PATH))
        .and(query_param("listenKey", "abc123"))
        .and(header("x-mbx-apikey", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = user_stream(&server, auto_sync());
    let result = client
        .stop_user_stream("abc123", &CancellationToken::new())
        .await;

    assert!(result.is_success(), "stop failed: {:?}", result.error());
}

#[tokio::test]
async fn coin_futures_uses_dapi_route() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dapi/v1/listenKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listenKey": "coin-key" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = FuturesUserStreamClient::for_market(
        http_client(&server, TimeSyncConfig::disabled()),
        server.uri(),
        FuturesMarket::Coin,
    );
    let result = client.start_user_stream(&CancellationToken::new()).await;

    assert_eq!(result.data().map(String::as_str), Some("coin-key"));
}

// ============================================================================
// Validation and cancellation
// ============================================================================

#[tokio::test]
async fn empty_listen_key_never_reaches_the_network() {
    let server = MockServer::start().await;
    let client = user_stream(&server, auto_sync());
    let cancel = CancellationToken::new();

    let keepalive = client.keep_alive_user_stream("", &cancel).await;
    let stop = client.stop_user_stream("  ", &cancel).await;

    assert_eq!(keepalive.error_kind(), Some(ErrorKind::Validation));
    assert_eq!(stop.error_kind(), Some(ErrorKind::Validation));
    assert!(keepalive.status().is_none());
    assert_eq!(received_count(&server).await, 0);
}

#[tokio::test]
async fn cancelled_before_dispatch_is_not_a_transport_error() {
    let server = MockServer::start().await;
    let client = user_stream(&server, auto_sync());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = client.start_user_stream(&cancel).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Cancelled));
    assert_eq!(received_count(&server).await, 0);
}

#[tokio::test]
async fn cancelled_while_in_flight() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "listenKey": "late" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = user_stream(&server, TimeSyncConfig::disabled());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = client.start_user_stream(&cancel).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Cancelled));
}

// ============================================================================
// Time synchronization
// ============================================================================

#[tokio::test]
async fn failed_time_sync_blocks_main_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TIME_PATH))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(json!({ "code": -1001, "msg": "Internal error; unable to process your request." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listenKey": "abc123" })))
        .expect(0)
        .mount(&server)
        .await;

    let client = user_stream(&server, auto_sync());
    let result = client.start_user_stream(&CancellationToken::new()).await;

    assert_eq!(
        result.error(),
        Some(&VenueError::TimeSync(Box::new(VenueError::Api {
            status: 503,
            code: Some(-1001),
            message: "Internal error; unable to process your request.".to_string(),
        })))
    );
    assert_eq!(result.status(), Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));
    assert!(result.headers().is_some());
}

#[tokio::test]
async fn concurrent_requests_share_one_time_sync() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TIME_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "serverTime": now_ms() }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(6)
        .mount(&server)
        .await;

    let client = user_stream(&server, auto_sync());

    let tasks = (0..6).map(|_| {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .keep_alive_user_stream("abc123", &CancellationToken::new())
                .await
        })
    });

    for result in futures::future::join_all(tasks).await {
        let result = result.expect("task panicked");
        assert!(result.is_success(), "keepalive failed: {:?}", result.error());
    }
}

#[tokio::test]
async fn disabled_time_sync_skips_time_endpoint() {
    let server = MockServer::start().await;
    mount_server_time(&server, now_ms(), 0).await;

    Mock::given(method("POST"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listenKey": "abc123" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = user_stream(&server, TimeSyncConfig::disabled());
    let result = client.start_user_stream(&CancellationToken::new()).await;

    assert!(result.is_success());
}

#[tokio::test]
async fn offset_is_reused_until_interval_elapses() {
    let server = MockServer::start().await;
    mount_server_time(&server, now_ms(), 1).await;

    Mock::given(method("PUT"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(3)
        .mount(&server)
        .await;

    let client = user_stream(&server, auto_sync());
    let cancel = CancellationToken::new();

    for _ in 0..3 {
        let result = client.keep_alive_user_stream("abc123", &cancel).await;
        assert!(result.is_success());
    }
}

#[tokio::test]
async fn signed_request_carries_drift_corrected_timestamp() {
    let server = MockServer::start().await;
    let drift_ms = 60_000;
    mount_server_time(&server, now_ms() + drift_ms, 1).await;

    Mock::given(method("GET"))
        .and(path("/fapi/v2/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "canTrade": true })))
        .expect(1)
        .mount(&server)
        .await;

    let http = http_client(&server, auto_sync());
    let route = ApiRoute::new(server.uri(), "fapi", "2");

    let sent_at = now_ms();
    let result: RequestResult<serde_json::Value> = http
        .execute(
            &route,
            "account",
            Method::GET,
            AuthLevel::Signed,
            &[],
            &CancellationToken::new(),
        )
        .await;
    assert!(result.is_success(), "signed request failed: {:?}", result.error());

    let requests = server.received_requests().await.expect("recording enabled");
    let account = requests
        .iter()
        .find(|r| r.url.path() == "/fapi/v2/account")
        .expect("account request");
    let query: Vec<(String, String)> = account.url.query_pairs().into_owned().collect();
    let value = |name: &str| {
        query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| panic!("missing {}", name))
    };

    assert_eq!(value("recvWindow"), "5000");

    let timestamp: i64 = value("timestamp").parse().expect("numeric timestamp");
    let skew = timestamp - sent_at - drift_ms;
    assert!((-1_000..=1_000).contains(&skew), "timestamp skew was {}", skew);

    let signature = value("signature");
    assert_eq!(signature.len(), 64);
    assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn reserved_characters_survive_the_query_string() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fapi/v1/echo"))
        .and(query_param("note", "a&b=c d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let http = http_client(&server, TimeSyncConfig::disabled());
    let route = ApiRoute::new(server.uri(), "fapi", "1");

    let result: RequestResult<serde_json::Value> = http
        .execute(
            &route,
            "echo",
            Method::GET,
            AuthLevel::None,
            &[("note", "a&b=c d")],
            &CancellationToken::new(),
        )
        .await;
    assert!(result.is_success(), "request failed: {:?}", result.error());

    let requests = server.received_requests().await.expect("recording enabled");
    let query: Vec<(String, String)> = requests[0].url.query_pairs().into_owned().collect();
    assert_eq!(query, vec![("note".to_string(), "a&b=c d".to_string())]);
}

#[tokio::test]
async fn signature_matches_the_encoded_text_sent() {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let http = http_client(&server, TimeSyncConfig::disabled());
    let route = ApiRoute::new(server.uri(), "fapi", "1");

    let result: RequestResult<serde_json::Value> = http
        .execute(
            &route,
            "order",
            Method::POST,
            AuthLevel::Signed,
            &[("newClientOrderId", "x&y=z 1%")],
            &CancellationToken::new(),
        )
        .await;
    assert!(result.is_success(), "signed request failed: {:?}", result.error());

    let requests = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8(requests[0].body.clone()).expect("utf-8 body");
    let (signed, signature) = body.rsplit_once("&signature=").expect("signature last");

    let mut mac = Hmac::<Sha256>::new_from_slice(b"test-secret").expect("hmac key");
    mac.update(signed.as_bytes());
    assert_eq!(signature, hex::encode(mac.finalize().into_bytes()));

    let decoded: Vec<(String, String)> = url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect();
    assert_eq!(decoded[0], ("newClientOrderId".to_string(), "x&y=z 1%".to_string()));
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn api_error_carries_code_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "code": -1125, "msg": "This listenKey does not exist." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = user_stream(&server, TimeSyncConfig::disabled());
    let result = client
        .keep_alive_user_stream("expired", &CancellationToken::new())
        .await;

    assert_eq!(result.status(), Some(reqwest::StatusCode::BAD_REQUEST));
    let error = result.error().expect("error");
    assert_eq!(error.error_code(), Some(-1125));
    assert_eq!(
        error,
        &VenueError::Api {
            status: 400,
            code: Some(-1125),
            message: "This listenKey does not exist.".to_string(),
        }
    );
}

#[tokio::test]
async fn malformed_success_body_is_a_deserialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = user_stream(&server, TimeSyncConfig::disabled());
    let result = client.start_user_stream(&CancellationToken::new()).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Deserialization));
    assert_eq!(result.status(), Some(reqwest::StatusCode::OK));
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    // Reserve a port, then free it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let uri = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let route = ApiRoute::new(uri.clone(), "fapi", "1");
    let rest = RestConfig {
        time_sync: TimeSyncConfig::disabled(),
        ..RestConfig::default()
    };
    let http = HttpClient::new(
        Box::new(BinanceHmacSigner::new(API_KEY, "secret")),
        route.clone(),
        rest,
    )
    .expect("client");
    let client = FuturesUserStreamClient::new(Arc::new(http), route);

    let result = client.start_user_stream(&CancellationToken::new()).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Transport));
    assert!(result.status().is_none());
}

// ============================================================================
// Listen key keeper
// ============================================================================

#[tokio::test]
async fn keeper_refreshes_and_closes_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listenKey": "kept-key" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(LISTEN_KEY_PATH))
        .and(body_string("listenKey=kept-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2..)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(LISTEN_KEY_PATH))
        .and(query_param("listenKey", "kept-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let keeper = ListenKeyKeeper::new(user_stream(&server, TimeSyncConfig::disabled()))
        .with_keepalive_interval(Duration::from_millis(100));

    let result = keeper.start(&CancellationToken::new()).await;
    assert_eq!(result.data().map(String::as_str), Some("kept-key"));
    assert!(keeper.is_running());
    assert_eq!(keeper.listen_key().as_deref(), Some("kept-key"));

    tokio::time::sleep(Duration::from_millis(350)).await;

    keeper.stop().await;
    assert!(!keeper.is_running());
    assert!(keeper.listen_key().is_none());
}

#[tokio::test]
async fn keeper_does_not_spawn_when_start_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "code": -2015, "msg": "Invalid API-key, IP, or permissions for action." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let keeper = ListenKeyKeeper::new(user_stream(&server, TimeSyncConfig::disabled()));
    let result = keeper.start(&CancellationToken::new()).await;

    assert!(result.error().expect("error").is_auth_error());
    assert!(!keeper.is_running());
    assert!(keeper.listen_key().is_none());
}

#[tokio::test]
async fn concurrent_keeper_starts_spawn_one_task() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "listenKey": "only-key" }))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(LISTEN_KEY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(LISTEN_KEY_PATH))
        .and(query_param("listenKey", "only-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let keeper = ListenKeyKeeper::new(user_stream(&server, TimeSyncConfig::disabled()))
        .with_keepalive_interval(Duration::from_millis(100));
    let cancel = CancellationToken::new();

    let (first, second) = tokio::join!(keeper.start(&cancel), keeper.start(&cancel));

    assert_eq!(first.data().map(String::as_str), Some("only-key"));
    assert_eq!(second.error_kind(), Some(ErrorKind::Validation));

    keeper.stop().await;
    assert!(!keeper.is_running());

    // No keepalive task may outlive stop()
    tokio::time::sleep(Duration::from_millis(350)).await;
}
