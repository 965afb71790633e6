use super::*;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Debug)]
struct SeenRequest {
    headers: HeaderMap,
    query: HashMap<String, String>,
}

#[derive(Clone)]
struct ServerState {
    tx: Arc<Mutex<Option<oneshot::Sender<SeenRequest>>>>,
}

async fn handle_about(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(SeenRequest { headers, query });
    }
    Json(json!({ "content": { "body": "about us" } }))
}

async fn handle_broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn handle_slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({ "content": null }))
}

async fn spawn_content_server() -> anyhow::Result<(String, oneshot::Receiver<SeenRequest>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let state = ServerState {
        tx: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route("/site/about", get(handle_about))
        .route("/broken", get(handle_broken))
        .route("/slow", get(handle_slow))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), rx))
}

#[test]
fn rejects_invalid_origin() {
    let err = HttpTransport::new("not a url", DEFAULT_TIMEOUT)
        .err()
        .expect("must fail");
    assert!(matches!(err, NavError::InvalidUrl { .. }));
}

#[test]
fn endpoint_resolves_location_and_busts_cache() {
    let transport =
        HttpTransport::new("http://example.test/base/", DEFAULT_TIMEOUT).expect("transport");

    let endpoint = transport.endpoint("/site/about?lang=en").expect("endpoint");

    assert_eq!(endpoint.path(), "/site/about");
    let pairs: HashMap<_, _> = endpoint.query_pairs().into_owned().collect();
    assert_eq!(pairs.get("lang").map(String::as_str), Some("en"));
    assert!(pairs.get("_").is_some_and(|stamp| stamp.parse::<u128>().is_ok()));
}

#[tokio::test]
async fn fetches_content_with_no_cache_headers() {
    let (origin, seen_rx) = spawn_content_server().await.expect("spawn server");
    let transport = HttpTransport::new(&origin, DEFAULT_TIMEOUT).expect("transport");

    let payload = transport.fetch_json("/site/about").await.expect("fetch");

    assert_eq!(payload.content, json!({ "body": "about us" }));
    let seen = seen_rx.await.expect("request seen");
    assert_eq!(seen.headers["accept"], "application/json");
    assert_eq!(seen.headers["cache-control"], "no-cache");
    assert_eq!(seen.headers["pragma"], "no-cache");
    assert!(seen.query.contains_key("_"));
}

#[tokio::test]
async fn error_status_is_a_failure() {
    let (origin, _seen_rx) = spawn_content_server().await.expect("spawn server");
    let transport = HttpTransport::new(&origin, DEFAULT_TIMEOUT).expect("transport");

    let err = transport.fetch_json("/broken").await.expect_err("must fail");
    assert!(err.to_string().contains("500"), "unexpected error: {err}");
}

#[tokio::test]
async fn slow_origin_times_out() {
    let (origin, _seen_rx) = spawn_content_server().await.expect("spawn server");
    let transport =
        HttpTransport::new(&origin, Duration::from_millis(100)).expect("transport");

    let err = transport.fetch_json("/slow").await.expect_err("must time out");
    let timed_out = err
        .downcast_ref::<reqwest::Error>()
        .is_some_and(reqwest::Error::is_timeout);
    assert!(timed_out, "unexpected error: {err:#}");
}
