//! Integration tests for the Metrytics SDK.

use chrono::{TimeZone, Utc};
use metrytics::{ClientKind, Error, EventExtras, Metrytics, VisitorExtras};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key-123";

fn ok_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "message": "POST request received" }))
}

fn initialized(server: &MockServer) -> Metrytics {
    let metrytics = Metrytics::new();
    metrytics.initialize(server.uri(), API_KEY).unwrap();
    metrytics
}

#[tokio::test]
async fn test_track_visitor_sends_correct_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analytics/visitor"))
        .and(header("content-type", "application/json"))
        .and(header("x-api-key", API_KEY))
        .and(header("Custom-Header", "test"))
        .and(body_json(json!({
            "appName": "test-app",
            "page": "/test-page",
            "ipAddress": "127.0.0.1",
            "browser": "Chrome",
            "os": "Windows",
            "referrer": "http://referrer.com",
            "timestamp": "2024-01-01T00:00:00.000Z",
            "city": "London",
            "country": "UK"
        })))
        .respond_with(ok_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrytics = initialized(&mock_server);

    let response = metrytics
        .visitors()
        .unwrap()
        .track_visitor("test-app", "/test-page")
        .ip_address("127.0.0.1")
        .browser("Chrome")
        .os("Windows")
        .referrer("http://referrer.com")
        .timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .header("Custom-Header", "test")
        .city("London")
        .country("UK")
        .send()
        .await
        .unwrap();

    assert_eq!(response["message"], "POST request received");
}

#[tokio::test]
async fn test_track_visitor_without_extras_sends_required_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analytics/visitor"))
        .respond_with(ok_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrytics = initialized(&mock_server);
    metrytics
        .visitors()
        .unwrap()
        .track_visitor("test-app", "/test-page")
        .send()
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body, json!({ "appName": "test-app", "page": "/test-page" }));

    let headers = &requests[0].headers;
    assert_eq!(headers.get("x-api-key").unwrap(), API_KEY);
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert!(headers.get("custom-header").is_none());
}

#[tokio::test]
async fn test_visitor_round_trip_from_loose_extras() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analytics/visitor"))
        .and(header("Custom-Header", "test"))
        .and(body_json(json!({
            "appName": "app1",
            "page": "/home",
            "ipAddress": "1.2.3.4",
            "timestamp": "2024-01-01T00:00:00.000Z"
        })))
        .respond_with(ok_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let extras: VisitorExtras = serde_json::from_value(json!({
        "ipAddress": "1.2.3.4",
        "timestamp": "2024-01-01T00:00:00Z",
        "extraHeaders": { "Custom-Header": "test" }
    }))
    .unwrap();

    let metrytics = initialized(&mock_server);
    metrytics
        .visitors()
        .unwrap()
        .track_visitor_with("app1", "/home", extras)
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert!(body.get("extraHeaders").is_none());
}

#[tokio::test]
async fn test_loose_extra_headers_never_reach_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analytics/visitor"))
        .and(header("X-Secret", "s"))
        .respond_with(ok_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut extras = VisitorExtras {
        ip_address: Some("1.2.3.4".into()),
        ..Default::default()
    };
    extras
        .additional
        .insert("extraHeaders".into(), json!({ "X-Secret": "s" }));
    extras.additional.insert("ipAddress".into(), json!("9.9.9.9"));

    let metrytics = initialized(&mock_server);
    metrytics
        .visitors()
        .unwrap()
        .track_visitor_with("app", "/", extras)
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let raw = String::from_utf8(requests[0].body.clone()).unwrap();
    assert_eq!(raw, r#"{"appName":"app","page":"/","ipAddress":"1.2.3.4"}"#);
}

#[tokio::test]
async fn test_track_visitor_derives_browser_from_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(json!({
            "appName": "app",
            "page": "/",
            "browser": "Firefox",
            "os": "Linux"
        })))
        .respond_with(ok_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrytics = initialized(&mock_server);
    metrytics
        .visitors()
        .unwrap()
        .track_visitor("app", "/")
        .user_agent("Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0")
        .send()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_track_event_sends_correct_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analytics/events"))
        .and(header("x-api-key", API_KEY))
        .and(header("Custom-Header", "test"))
        .and(body_json(json!({
            "appName": "test-app",
            "eventName": "button_click",
            "eventDescription": "submit-btn",
            "ip": "127.0.0.1",
            "timestamp": "2024-01-01T00:00:00.000Z"
        })))
        .respond_with(ok_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let extras: EventExtras = serde_json::from_value(json!({
        "eventDescription": "submit-btn",
        "ip": "127.0.0.1",
        "timestamp": "2024-01-01T00:00:00Z",
        "extraHeaders": { "Custom-Header": "test" }
    }))
    .unwrap();

    let metrytics = initialized(&mock_server);
    metrytics
        .events()
        .unwrap()
        .track_event_with("test-app", "button_click", extras)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_track_event_without_extras_sends_required_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analytics/events"))
        .and(body_json(json!({ "appName": "test-app", "eventName": "button_click" })))
        .respond_with(ok_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrytics = initialized(&mock_server);
    metrytics
        .events()
        .unwrap()
        .track_event("test-app", "button_click")
        .send()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_extra_headers_override_defaults() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-api-key", "per-call-key"))
        .respond_with(ok_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrytics = initialized(&mock_server);
    metrytics
        .events()
        .unwrap()
        .track_event("a", "b")
        .header("X-Api-Key", "per-call-key")
        .send()
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let keys: Vec<_> = requests[0].headers.get_all("x-api-key").iter().collect();
    assert_eq!(keys.len(), 1);
}

#[tokio::test]
async fn test_non_success_status_is_returned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrytics = initialized(&mock_server);
    let err = metrytics
        .events()
        .unwrap()
        .track_event("a", "b")
        .send()
        .await
        .unwrap_err();

    match &err {
        Error::Transport { status, body } => {
            assert_eq!(*status, 400);
            assert_eq!(body, "Bad Request");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("400"));
    assert!(msg.contains("Bad Request"));
}

#[tokio::test]
async fn test_unreachable_collector_is_network_error() {
    // Grab a free port, then close it so nothing is listening.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let metrytics = Metrytics::new();
    metrytics.initialize(uri, API_KEY).unwrap();

    let err = metrytics
        .visitors()
        .unwrap()
        .track_visitor("app", "/")
        .send()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Network(_)));
}

#[tokio::test]
async fn test_empty_success_body_is_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrytics = initialized(&mock_server);
    let response = metrytics
        .events()
        .unwrap()
        .track_event("a", "b")
        .send()
        .await
        .unwrap();

    assert!(response.is_null());
}

#[tokio::test]
async fn test_concurrent_visits_send_independently() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analytics/visitor"))
        .respond_with(ok_response())
        .expect(2)
        .mount(&mock_server)
        .await;

    let metrytics = initialized(&mock_server);
    let visitors = metrytics.visitors().unwrap();

    let (first, second) = tokio::join!(
        visitors.track_visitor("app", "/one").header("X-Seq", "1").send(),
        visitors.track_visitor("app", "/two").header("X-Seq", "2").send(),
    );
    assert!(first.is_ok());
    assert!(second.is_ok());

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let body: Value = request.body_json().unwrap();
        let seq = request.headers.get("x-seq").unwrap().to_str().unwrap();
        let expected_page = if seq == "1" { "/one" } else { "/two" };
        assert_eq!(body["page"], expected_page);
    }
}

#[tokio::test]
async fn test_uninitialized_registry_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ok_response())
        .expect(0)
        .mount(&mock_server)
        .await;

    let metrytics = Metrytics::new();

    assert!(matches!(
        metrytics.visitors(),
        Err(Error::Uninitialized(ClientKind::Visitors))
    ));
    assert!(matches!(
        metrytics.events(),
        Err(Error::Uninitialized(ClientKind::Events))
    ));
}

#[tokio::test]
async fn test_reinitialize_keeps_original_collector() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ok_response())
        .expect(1)
        .mount(&first)
        .await;
    Mock::given(method("POST"))
        .respond_with(ok_response())
        .expect(0)
        .mount(&second)
        .await;

    let metrytics = initialized(&first);
    metrytics.initialize(second.uri(), "other-key").unwrap();

    metrytics
        .events()
        .unwrap()
        .track_event("a", "b")
        .send()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_global_registry_initializes_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-api-key", API_KEY))
        .respond_with(ok_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = metrytics::initialize(mock_server.uri(), API_KEY).unwrap();
    metrytics::initialize("http://ignored.example.com", "ignored").unwrap();

    assert!(std::ptr::eq(registry, metrytics::global()));
    metrytics::global()
        .visitors()
        .unwrap()
        .track_visitor("app", "/")
        .send()
        .await
        .unwrap();
}
