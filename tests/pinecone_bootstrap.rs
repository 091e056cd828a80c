//! Pinecone client against a mock control and data plane.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use ragchat::config::VectorIndexSettings;
use ragchat::vector_index::{IndexSpec, IndexStatus, PineconeIndex, VectorIndex};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const API_KEY: &str = "test-key";

#[derive(Default)]
struct MockState {
    host: String,
    /// (dimension, metric) of the existing index.
    index: Option<(usize, String)>,
    /// Number of describe calls that pretend the index is missing.
    hidden_describes: usize,
    /// Report the index as still initializing forever.
    never_ready: bool,
    describe_calls: usize,
    create_calls: usize,
    last_query: Option<Value>,
}

type Shared = Arc<Mutex<MockState>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("Api-Key").and_then(|v| v.to_str().ok()) == Some(API_KEY)
        && headers.contains_key("X-Pinecone-API-Version")
}

async fn describe(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut state = state.lock().unwrap();
    state.describe_calls += 1;
    if state.hidden_describes > 0 {
        state.hidden_describes -= 1;
        return StatusCode::NOT_FOUND.into_response();
    }
    match &state.index {
        Some((dimension, metric)) => Json(json!({
            "name": name,
            "dimension": dimension,
            "metric": metric,
            "host": state.host,
            "status": { "ready": !state.never_ready, "state": "Ready" }
        }))
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut state = state.lock().unwrap();
    state.create_calls += 1;
    if state.index.is_some() {
        return (StatusCode::CONFLICT, Json(json!({ "error": { "code": "ALREADY_EXISTS" } })))
            .into_response();
    }
    assert_eq!(body["spec"]["serverless"]["cloud"], "aws");
    assert_eq!(body["spec"]["serverless"]["region"], "us-east-1");
    let dimension = body["dimension"].as_u64().unwrap() as usize;
    let metric = body["metric"].as_str().unwrap().to_string();
    state.index = Some((dimension, metric));
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn query(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let top_k = body["topK"].as_u64().unwrap() as usize;
    state.lock().unwrap().last_query = Some(body);
    let matches: Vec<Value> = [("3", 0.91), ("0", 0.72), ("1", 0.40)]
        .iter()
        .take(top_k)
        .map(|(id, score)| json!({ "id": id, "score": score }))
        .collect();
    Json(json!({ "matches": matches, "namespace": "" })).into_response()
}

async fn spawn_mock(state: MockState) -> (String, Shared) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let shared = Arc::new(Mutex::new(MockState {
        host: base.clone(),
        ..state
    }));

    let app = Router::new()
        .route("/indexes", post(create))
        .route("/indexes/{name}", get(describe))
        .route("/query", post(query))
        .with_state(shared.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base, shared)
}

fn settings(control_url: &str) -> VectorIndexSettings {
    VectorIndexSettings {
        control_url: control_url.to_string(),
        ready_poll_attempts: 3,
        ready_poll_interval_ms: 10,
        ..VectorIndexSettings::default()
    }
}

fn spec() -> IndexSpec {
    IndexSpec::from_settings(&VectorIndexSettings::default())
}

#[tokio::test]
async fn test_bootstrap_twice_creates_one_index() {
    let (base, state) = spawn_mock(MockState::default()).await;
    let index = PineconeIndex::new(API_KEY.to_string(), &settings(&base)).unwrap();

    assert_eq!(index.ensure_index(&spec()).await.unwrap(), IndexStatus::Created);
    assert_eq!(index.ensure_index(&spec()).await.unwrap(), IndexStatus::Existing);

    let state = state.lock().unwrap();
    assert_eq!(state.create_calls, 1);
    assert_eq!(state.index, Some((768, "cosine".to_string())));
}

#[tokio::test]
async fn test_concurrent_creation_conflict_is_not_an_error() {
    let (base, state) = spawn_mock(MockState {
        index: Some((768, "cosine".to_string())),
        hidden_describes: 1,
        ..MockState::default()
    })
    .await;
    let index = PineconeIndex::new(API_KEY.to_string(), &settings(&base)).unwrap();

    assert_eq!(index.ensure_index(&spec()).await.unwrap(), IndexStatus::Existing);
    assert_eq!(state.lock().unwrap().create_calls, 1);
}

#[tokio::test]
async fn test_conflict_with_differently_shaped_index_is_rejected() {
    let (base, _state) = spawn_mock(MockState {
        index: Some((384, "euclidean".to_string())),
        hidden_describes: 1,
        ..MockState::default()
    })
    .await;
    let index = PineconeIndex::new(API_KEY.to_string(), &settings(&base)).unwrap();

    let err = index.ensure_index(&spec()).await.unwrap_err();
    assert_eq!(err.kind(), "configuration");
    assert!(err.to_string().contains("384"));
}

#[tokio::test]
async fn test_index_that_never_becomes_ready_fails_without_trailing_wait() {
    let (base, state) = spawn_mock(MockState {
        index: Some((768, "cosine".to_string())),
        never_ready: true,
        ..MockState::default()
    })
    .await;
    let settings = VectorIndexSettings {
        ready_poll_attempts: 2,
        ready_poll_interval_ms: 300,
        ..settings(&base)
    };
    let index = PineconeIndex::new(API_KEY.to_string(), &settings).unwrap();

    let started = Instant::now();
    let err = index.ensure_index(&spec()).await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.kind(), "vector_index");
    // One existence check plus two readiness polls, one pause between them
    assert_eq!(state.lock().unwrap().describe_calls, 3);
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(550), "waited {:?}", elapsed);
}

#[tokio::test]
async fn test_query_returns_matches_in_service_order() {
    let (base, state) = spawn_mock(MockState {
        index: Some((768, "cosine".to_string())),
        ..MockState::default()
    })
    .await;
    let index = PineconeIndex::new(API_KEY.to_string(), &settings(&base)).unwrap();
    index.ensure_index(&spec()).await.unwrap();

    let matches = index.query(&vec![0.1; 768], 2).await.unwrap();
    let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "0"]);

    let sent = state.lock().unwrap().last_query.clone().unwrap();
    assert_eq!(sent["topK"], 2);
    assert_eq!(sent["includeValues"], false);
    assert_eq!(sent["vector"].as_array().unwrap().len(), 768);
}

#[tokio::test]
async fn test_query_resolves_host_without_bootstrap() {
    let (base, _state) = spawn_mock(MockState {
        index: Some((768, "cosine".to_string())),
        ..MockState::default()
    })
    .await;
    let index = PineconeIndex::new(API_KEY.to_string(), &settings(&base)).unwrap();

    assert_eq!(index.query(&vec![0.1; 768], 5).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_rejected_key_is_configuration_error() {
    let (base, _state) = spawn_mock(MockState::default()).await;
    let index = PineconeIndex::new("wrong".to_string(), &settings(&base)).unwrap();

    let err = index.ensure_index(&spec()).await.unwrap_err();
    assert_eq!(err.kind(), "configuration");
}

#[tokio::test]
async fn test_existing_index_with_wrong_dimension_is_rejected() {
    let (base, _state) = spawn_mock(MockState {
        index: Some((384, "cosine".to_string())),
        ..MockState::default()
    })
    .await;
    let index = PineconeIndex::new(API_KEY.to_string(), &settings(&base)).unwrap();

    let err = index.ensure_index(&spec()).await.unwrap_err();
    assert_eq!(err.kind(), "configuration");
}

#[tokio::test]
async fn test_unreachable_service_is_vector_index_error() {
    // Nothing listens on port 9 locally
    let index = PineconeIndex::new(API_KEY.to_string(), &settings("http://127.0.0.1:9")).unwrap();
    let err = index.ensure_index(&spec()).await.unwrap_err();
    assert_eq!(err.kind(), "vector_index");
}
