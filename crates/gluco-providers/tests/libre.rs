//! LibreLinkUp sessions against a local stub of the LibreLinkUp API.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use gluco_core::types::{
    ConnectionId, ConnectionRecord, ProviderCredential, ProviderType, Region, UserId,
};
use gluco_core::{ErrorKind, ProviderSession, SessionFactory};
use gluco_providers::{HttpSessionFactory, ProviderHttpClient, ProviderHttpConfig};
use jiff::Timestamp;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use url::Url;

const USER_ID: &str = "9a0e6b5c-1d2f-11ee-be56-0242ac120002";
const PASSWORD: &str = "correct horse";

#[derive(Default)]
struct LinkUp {
    logins: AtomicUsize,
    redirect_first: AtomicBool,
    redirected: AtomicBool,
    no_patients: AtomicBool,
    current: Mutex<Option<String>>,
}

fn app_headers_present(headers: &HeaderMap) -> bool {
    headers.get("product").is_some_and(|v| v == "llu.android")
        && headers.get("version").is_some_and(|v| v == "4.12.0")
}

async fn login(
    State(link): State<Arc<LinkUp>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !app_headers_present(&headers) {
        return (StatusCode::FORBIDDEN, Json(json!({ "message": "missing app headers" })))
            .into_response();
    }

    if link.redirect_first.load(Ordering::SeqCst) && !link.redirected.swap(true, Ordering::SeqCst)
    {
        return Json(json!({ "status": 0, "data": { "redirect": true, "region": "eu" } }))
            .into_response();
    }

    if body["email"] != "alice@example.com" || body["password"] != PASSWORD {
        return Json(json!({ "status": 2, "error": { "message": "notAuthenticated" } }))
            .into_response();
    }

    let n = link.logins.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("token-{n}");
    *link.current.lock().unwrap() = Some(token.clone());

    Json(json!({
        "status": 0,
        "data": {
            "user": { "id": USER_ID, "firstName": "Alice" },
            "authTicket": { "token": token, "expires": 1_700_000_000, "duration": 15_552_000_000u64 }
        }
    }))
    .into_response()
}

async fn connections(State(link): State<Arc<LinkUp>>, headers: HeaderMap) -> Response {
    let expected_token = link.current.lock().unwrap().clone();
    let authorized = expected_token.is_some_and(|token| {
        headers
            .get("authorization")
            .is_some_and(|v| v.to_str().ok() == Some(format!("Bearer {token}").as_str()))
    });
    let account_id = hex::encode(Sha256::digest(USER_ID.as_bytes()));
    let account_matches = headers
        .get("account-id")
        .is_some_and(|v| v.to_str().ok() == Some(account_id.as_str()));

    if !authorized || !account_matches {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid or expired jwt" })))
            .into_response();
    }

    if link.no_patients.load(Ordering::SeqCst) {
        return Json(json!({ "status": 0, "data": [] })).into_response();
    }

    Json(json!({
        "status": 0,
        "data": [{
            "patientId": "patient-1",
            "glucoseMeasurement": {
                "FactoryTimestamp": "11/14/2023 10:13:20 PM",
                "Timestamp": "11/14/2023 11:13:20 PM",
                "ValueInMgPerDl": 101,
                "Value": 101,
                "TrendArrow": 3
            }
        }]
    }))
    .into_response()
}

async fn serve(link: Arc<LinkUp>) -> Url {
    let router = Router::new()
        .route("/llu/auth/login", post(login))
        .route("/llu/connections", get(connections))
        .with_state(link);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    Url::parse(&format!("http://{addr}")).unwrap()
}

fn factory(base_url: Url) -> HttpSessionFactory {
    let config = ProviderHttpConfig::default()
        .with_timeout(5)
        .with_libre_base_url(base_url);
    ProviderHttpClient::new(config).unwrap().into_factory()
}

fn record() -> ConnectionRecord {
    ConnectionRecord {
        id: ConnectionId::new(2),
        user_id: UserId::new(7),
        provider_type: ProviderType::Libre,
        region: Region::new("eu"),
        username: "alice@example.com".to_owned(),
        encrypted_credential: Vec::new(),
    }
}

fn credential(password: &str) -> ProviderCredential {
    ProviderCredential::new("alice@example.com", password)
}

#[tokio::test]
async fn login_and_fetch_first_patient() {
    let link = Arc::new(LinkUp::default());
    let factory = factory(serve(link.clone()).await);

    let mut session = factory
        .create_session(&record(), credential(PASSWORD))
        .await
        .unwrap();
    assert_eq!(session.provider_type(), ProviderType::Libre);

    let sample = session.fetch_reading().await.unwrap();
    assert_eq!(sample.value, 5.6);
    assert_eq!(sample.observed_at, Some(Timestamp::from_second(1_700_000_000).unwrap()));
}

#[tokio::test]
async fn follows_one_region_redirect() {
    let link = Arc::new(LinkUp::default());
    link.redirect_first.store(true, Ordering::SeqCst);
    let factory = factory(serve(link.clone()).await);

    let mut session = factory
        .create_session(&record(), credential(PASSWORD))
        .await
        .unwrap();

    assert!(link.redirected.load(Ordering::SeqCst));
    assert_eq!(link.logins.load(Ordering::SeqCst), 1);
    assert!(session.fetch_reading().await.is_ok());
}

#[tokio::test]
async fn rejected_credentials_fail_construction() {
    let link = Arc::new(LinkUp::default());
    let factory = factory(serve(link.clone()).await);

    let error = factory
        .create_session(&record(), credential("wrong"))
        .await
        .err().unwrap();

    assert_eq!(error.kind, ErrorKind::Authentication);
}

#[tokio::test]
async fn expired_token_is_auth_and_reauth_recovers() {
    let link = Arc::new(LinkUp::default());
    let factory = factory(serve(link.clone()).await);

    let mut session = factory
        .create_session(&record(), credential(PASSWORD))
        .await
        .unwrap();

    *link.current.lock().unwrap() = Some("rotated".to_owned());
    assert!(session.fetch_reading().await.unwrap_err().is_auth());

    session.reauthenticate().await.unwrap();
    assert!(session.fetch_reading().await.is_ok());
    assert_eq!(link.logins.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn no_patients_is_transient() {
    let link = Arc::new(LinkUp::default());
    let factory = factory(serve(link.clone()).await);

    let mut session = factory
        .create_session(&record(), credential(PASSWORD))
        .await
        .unwrap();

    link.no_patients.store(true, Ordering::SeqCst);
    let error = session.fetch_reading().await.unwrap_err();

    assert!(!error.is_auth());
    assert_eq!(error.inner().kind, ErrorKind::NotFound);
}
