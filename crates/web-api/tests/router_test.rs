use std::sync::Arc;

use application::{
    AggregationEngine, AggregationEngineDependencies, EventIngestor, EventIngestorDependencies,
    FixedClock, InMemoryCounterStore,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{FixedOffset, TimeZone, Utc};
use config::ReportConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

use web_api::{router, AppState};

// 2024-05-10T09:00:00Z
const NOW: i64 = 1_715_331_600;

fn app() -> (Router, Arc<InMemoryCounterStore>) {
    let store = Arc::new(InMemoryCounterStore::new());
    let offset = FixedOffset::east_opt(0).expect("offset");
    let clock = Arc::new(FixedClock(Utc.timestamp_opt(NOW, 0).unwrap()));

    let ingestor = EventIngestor::new(EventIngestorDependencies {
        store: store.clone(),
        offset,
    });
    let engine = AggregationEngine::new(AggregationEngineDependencies {
        store: store.clone(),
        clock,
        offset,
    });
    let state = AppState::new(Arc::new(ingestor), Arc::new(engine), ReportConfig::default());
    (router(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, body.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or(json!({}))
}

fn event_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/slack/events")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn reaction(kind: &str, name: &str, user: &str, ts: i64) -> Request<Body> {
    event_request(json!({
        "type": "event_callback",
        "team_id": "T1",
        "event": {
            "type": kind,
            "user": user,
            "reaction": name,
            "item": {"type": "message", "channel": "C1", "ts": "1.0"},
            "event_ts": format!("{ts}.000100"),
        }
    }))
}

fn command_request(text: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/slack/commands")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!("command=%2Femojireport&text={text}&user_id=U9")))
        .unwrap()
}

fn block_texts(payload: &Value) -> Vec<String> {
    payload["blocks"]
        .as_array()
        .expect("blocks")
        .iter()
        .filter_map(|b| b["text"]["text"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn health_check() {
    let (app, _) = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn url_verification_echoes_challenge() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        event_request(json!({"type": "url_verification", "token": "t", "challenge": "abc123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"challenge": "abc123"}));
}

#[tokio::test]
async fn reactions_are_counted_and_reported() {
    let (app, store) = app();

    for (kind, name, user) in [
        ("reaction_added", "fire", "U1"),
        ("reaction_added", "fire", "U2"),
        ("reaction_added", "tada", "U1"),
        ("reaction_added", "fire", "U1"),
        ("reaction_removed", "fire", "U1"),
        // 从未添加过，被吸收
        ("reaction_removed", "tada", "U2"),
    ] {
        let (status, body) = send(&app, reaction(kind, name, user, NOW - 60)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }
    assert_eq!(store.len().unwrap(), 2);

    let request = Request::builder()
        .uri("/api/v1/report?numDays=1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body),
        json!([
            {"reaction": "fire", "count": 2},
            {"reaction": "tada", "count": 1},
        ])
    );
}

#[tokio::test]
async fn unhandled_events_are_acknowledged() {
    let (app, store) = app();
    let (status, body) = send(
        &app,
        event_request(json!({
            "type": "event_callback",
            "event": {"type": "message", "user": "U1", "text": "hello", "event_ts": "1.0"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn events_with_structured_user_are_acknowledged() {
    let (app, store) = app();
    let (status, body) = send(
        &app,
        event_request(json!({
            "type": "event_callback",
            "event": {
                "type": "user_change",
                "user": {"id": "U1", "name": "bob"},
                "event_ts": "1.0"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn invalid_events_are_rejected_without_mutation() {
    let (app, store) = app();

    let (status, body) = send(&app, reaction("reaction_added", "", "U1", NOW)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["code"], "INVALID_EVENT");

    let (status, _) = send(&app, reaction("reaction_added", "fire", "U1", -5)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/slack/events")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn slash_command_help_and_unknown() {
    let (app, _) = app();

    let (status, body) = send(&app, command_request("")).await;
    assert_eq!(status, StatusCode::OK);
    let payload = json_body(&body);
    assert_eq!(payload["response_type"], "ephemeral");
    assert_eq!(block_texts(&payload)[0], "I understand the following commands:");

    let (_, body) = send(&app, command_request("leaderboard")).await;
    let payload = json_body(&body);
    assert_eq!(payload["response_type"], "ephemeral");
    assert!(block_texts(&payload)[0].starts_with("Sorry, I didn't understand that."));

    let (_, body) = send(&app, command_request("emoji+0")).await;
    assert_eq!(json_body(&body)["response_type"], "ephemeral");
}

#[tokio::test]
async fn slash_command_reports() {
    let (app, _) = app();
    for (name, user) in [("fire", "U1"), ("fire", "U2"), ("tada", "U1")] {
        let (status, _) = send(&app, reaction("reaction_added", name, user, NOW)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, command_request("emoji+3")).await;
    let payload = json_body(&body);
    assert_eq!(payload["response_type"], "in_channel");
    let texts = block_texts(&payload);
    assert_eq!(texts[0], "The top emoji reactions over the last 3 days are:");
    assert_eq!(texts[1], "*01*) :fire: `:fire:`");
    assert_eq!(texts[2], "*02*) :tada: `:tada:`");

    let (_, body) = send(&app, command_request("people")).await;
    let texts = block_texts(&json_body(&body));
    assert_eq!(texts[1], "*01*)   <@U1>   *2* reactions");

    let (_, body) = send(&app, command_request("%3C%40U2%7Cbob%3E")).await;
    let texts = block_texts(&json_body(&body));
    assert_eq!(texts[1], "*01*) :fire: `:fire:` _1x_");

    let (_, body) = send(&app, command_request("%3Afire%3A")).await;
    let texts = block_texts(&json_body(&body));
    assert_eq!(
        texts[0],
        ":fire: `:fire:` was used *2* times over the last 7 days. The top users are:"
    );
    assert_eq!(texts[1], "*01*) <@U1> _1x_");
    assert_eq!(texts[2], "*02*) <@U2> _1x_");
}

#[tokio::test]
async fn report_window_is_validated() {
    let (app, _) = app();

    let request = Request::builder()
        .uri("/api/v1/report?numDays=0")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["code"], "INVALID_QUERY");

    let request = Request::builder()
        .uri("/api/v1/report?numDays=5000")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .uri("/api/v1/report")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!([]));
}
