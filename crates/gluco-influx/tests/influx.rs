//! InfluxDB client against a local stub of the v2 API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use gluco_core::types::{GlucoseSample, Point, ProviderType, Reading, UserId};
use gluco_core::{ErrorKind, ServiceStatus, SinkService};
use gluco_influx::{BucketOutcome, InfluxClient, InfluxConfig, InfluxError};
use jiff::Timestamp;
use serde_json::{Value, json};

const TOKEN: &str = "t0ken";
const ORG: &str = "opengluco";
const ORG_ID: &str = "0a1b2c3d4e5f6789";

#[derive(Default)]
struct Influx {
    lines: Mutex<Vec<String>>,
    write_queries: Mutex<Vec<HashMap<String, String>>>,
    buckets: Mutex<HashMap<String, (String, Value)>>,
    failing: AtomicBool,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .is_some_and(|v| v == format!("Token {TOKEN}").as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "code": "unauthorized", "message": "unauthorized access" })),
    )
        .into_response()
}

async fn write(
    State(influx): State<Arc<Influx>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if influx.failing.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "code": "unavailable", "message": "service unavailable" })),
        )
            .into_response();
    }

    influx.write_queries.lock().unwrap().push(query);
    influx.lines.lock().unwrap().extend(body.lines().map(str::to_owned));
    StatusCode::NO_CONTENT.into_response()
}

async fn list_buckets(
    State(influx): State<Arc<Influx>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let name = query.get("name").cloned().unwrap_or_default();
    let buckets: Vec<Value> = influx
        .buckets
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, (bucket, _))| *bucket == name)
        .map(|(id, (bucket, rules))| json!({ "id": id, "name": bucket, "retentionRules": rules }))
        .collect();

    Json(json!({ "buckets": buckets })).into_response()
}

async fn create_bucket(
    State(influx): State<Arc<Influx>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["orgID"] != ORG_ID {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "bad orgID" }))).into_response();
    }

    let name = body["name"].as_str().unwrap_or_default().to_owned();
    let mut buckets = influx.buckets.lock().unwrap();
    let id = format!("bucket-{}", buckets.len() + 1);
    buckets.insert(id.clone(), (name.clone(), body["retentionRules"].clone()));

    (StatusCode::CREATED, Json(json!({ "id": id, "name": name }))).into_response()
}

async fn update_bucket(
    State(influx): State<Arc<Influx>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut buckets = influx.buckets.lock().unwrap();
    match buckets.get_mut(&id) {
        Some((_, rules)) => {
            *rules = body["retentionRules"].clone();
            Json(json!({ "id": id })).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "bucket not found" })))
            .into_response(),
    }
}

async fn list_orgs(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let orgs = match query.get("org").map(String::as_str) {
        Some(ORG) => vec![json!({ "id": ORG_ID, "name": ORG })],
        _ => Vec::new(),
    };
    Json(json!({ "orgs": orgs })).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({ "name": "influxdb", "status": "pass", "message": "ready for queries and writes" }))
}

async fn serve(influx: Arc<Influx>) -> String {
    let router = Router::new()
        .route("/api/v2/write", post(write))
        .route("/api/v2/buckets", get(list_buckets).post(create_bucket))
        .route("/api/v2/buckets/{id}", patch(update_bucket))
        .route("/api/v2/orgs", get(list_orgs))
        .route("/health", get(health))
        .with_state(influx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    format!("http://{addr}")
}

async fn client(influx: &Arc<Influx>) -> InfluxClient {
    let host = serve(influx.clone()).await;
    InfluxClient::new(InfluxConfig::new(host, TOKEN, ORG, "glucose").with_timeout(5)).unwrap()
}

fn reading_point() -> Point {
    let reading = Reading::new(
        UserId::new(42),
        ProviderType::Libre,
        GlucoseSample::new(6.1, Some(Timestamp::from_second(1_700_000_000).unwrap())),
    );
    Point::from_reading(&reading)
}

#[tokio::test]
async fn writes_line_protocol_through_the_sink() {
    let influx = Arc::new(Influx::default());
    let sink = SinkService::new(client(&influx).await);

    sink.write(&reading_point()).await.unwrap();

    assert_eq!(
        *influx.lines.lock().unwrap(),
        vec!["glucose,provider_type=libre,user_id=42 value=6.1 1700000000000000000".to_owned()]
    );

    let queries = influx.write_queries.lock().unwrap();
    assert_eq!(queries[0].get("org").map(String::as_str), Some(ORG));
    assert_eq!(queries[0].get("bucket").map(String::as_str), Some("glucose"));
    assert_eq!(queries[0].get("precision").map(String::as_str), Some("ns"));
}

#[tokio::test]
async fn unavailable_server_is_reported() {
    let influx = Arc::new(Influx::default());
    influx.failing.store(true, Ordering::SeqCst);
    let sink = SinkService::new(client(&influx).await);

    let error = sink.write(&reading_point()).await.unwrap_err();

    assert_eq!(error.kind, ErrorKind::ServiceUnavailable);
    assert!(influx.lines.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_token_is_an_authentication_error() {
    let influx = Arc::new(Influx::default());
    let host = serve(influx.clone()).await;
    let client = InfluxClient::new(InfluxConfig::new(host, "wrong", ORG, "glucose")).unwrap();

    let error: gluco_core::Error = client
        .write_points(&[reading_point()])
        .await
        .unwrap_err()
        .into();

    assert_eq!(error.kind, ErrorKind::Authentication);
}

#[tokio::test]
async fn ensure_bucket_creates_then_updates_retention() {
    let influx = Arc::new(Influx::default());
    let client = client(&influx).await;

    assert_eq!(client.ensure_bucket().await.unwrap(), BucketOutcome::Created);
    {
        let buckets = influx.buckets.lock().unwrap();
        let (name, rules) = &buckets["bucket-1"];
        assert_eq!(name, "glucose");
        assert_eq!(*rules, json!([{ "type": "expire", "everySeconds": 2_592_000 }]));
    }

    let host = client.config().host.clone();
    let config = InfluxConfig::new(host, TOKEN, ORG, "glucose").with_retention("12h");
    let shorter = InfluxClient::new(config).unwrap();

    assert_eq!(shorter.ensure_bucket().await.unwrap(), BucketOutcome::Updated);
    let buckets = influx.buckets.lock().unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets["bucket-1"].1, json!([{ "type": "expire", "everySeconds": 43_200 }]));
}

#[tokio::test]
async fn ensure_bucket_needs_an_existing_org() {
    let influx = Arc::new(Influx::default());
    let host = serve(influx.clone()).await;
    let client = InfluxClient::new(InfluxConfig::new(host, TOKEN, "elsewhere", "glucose")).unwrap();

    let error = client.ensure_bucket().await.unwrap_err();

    assert!(matches!(error, InfluxError::OrgNotFound(org) if org == "elsewhere"));
    assert!(influx.buckets.lock().unwrap().is_empty());
}

#[tokio::test]
async fn health_check_reports_pass() {
    let influx = Arc::new(Influx::default());
    let sink = SinkService::new(client(&influx).await);

    let health = sink.health_check().await.unwrap();

    assert_eq!(health.status, ServiceStatus::Healthy);
}
