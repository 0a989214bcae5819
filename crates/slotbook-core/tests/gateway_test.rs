use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use slotbook_core::api::CONNECTIVITY_MESSAGE;
use slotbook_core::auth::{MemoryStorage, SessionStorage, TOKEN_KEY, USER_KEY};
use slotbook_core::models::{AllBookingsResponse, Role, User};
use slotbook_core::{ApiClient, ApiConfig, ApiError, SessionState, SessionStore};

fn valid_token() -> String {
    let exp = Utc::now().timestamp() + 3600;
    let payload = URL_SAFE_NO_PAD.encode(json!({"sub": "u1", "exp": exp}).to_string());
    format!("eyJhbGciOiJIUzI1NiJ9.{}.signature", payload)
}

struct Harness {
    server: MockServer,
    storage: Arc<MemoryStorage>,
    store: Arc<SessionStore>,
    client: ApiClient,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let store = Arc::new(SessionStore::new(storage.clone()));
    store.initialize(Utc::now());
    let config = ApiConfig::new(format!("{}/api", server.uri()));
    let client = ApiClient::new(config, store.clone()).unwrap();
    Harness {
        server,
        storage,
        store,
        client,
    }
}

async fn logged_in_harness() -> (Harness, String) {
    let h = harness().await;
    let token = valid_token();
    let user: User = serde_json::from_value(json!({"id": "1", "name": "Pat", "email": "patient@example.com"})).unwrap();
    h.store.login(token.clone(), user, Role::Patient);
    (h, token)
}

#[tokio::test]
async fn test_request_attaches_bearer_and_content_type() {
    let (h, token) = logged_in_harness().await;

    Mock::given(method("GET"))
        .and(path("/api/my-bookings"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&h.server)
        .await;

    let bookings = h.client.fetch_my_bookings().await.unwrap();
    assert!(bookings.is_empty());
}

#[tokio::test]
async fn test_request_without_session_sends_no_authorization() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "ok"})))
        .mount(&h.server)
        .await;

    let body = h.client.register("Pat", "patient@example.com", "Passw0rd!").await.unwrap();
    assert_eq!(body["message"], "ok");

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_auth_failure_clears_session_for_any_endpoint() {
    let cases = [
        (401, "GET", "/api/my-bookings"),
        (403, "GET", "/api/all-bookings"),
        (401, "POST", "/api/book"),
        (403, "DELETE", "/api/bookings/b1"),
    ];

    for (status, verb, endpoint) in cases {
        let (h, _) = logged_in_harness().await;
        assert_eq!(h.storage.len(), 2);

        Mock::given(method(verb))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({"error": {"message": "Token invalid"}})),
            )
            .mount(&h.server)
            .await;

        let result = match verb {
            "GET" if endpoint.ends_with("my-bookings") => h.client.fetch_my_bookings().await.map(|_| ()),
            "GET" => h.client.fetch_all_bookings(1, 10).await.map(|_| ()),
            "POST" => h.client.book("s1").await.map(|_| ()),
            _ => h.client.cancel_booking("b1").await.map(|_| ()),
        };

        assert!(matches!(result, Err(ApiError::Unauthorized)), "{} {} {}", status, verb, endpoint);
        assert!(h.storage.is_empty());
        assert_eq!(h.store.snapshot(), SessionState::Absent);
        assert_eq!(h.store.token(), None);
    }
}

#[tokio::test]
async fn test_error_envelope_message_is_surfaced() {
    let (h, _) = logged_in_harness().await;

    Mock::given(method("POST"))
        .and(path("/api/book"))
        .and(body_json(json!({"slotId": "s9"})))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"error": {"message": "X"}})),
        )
        .mount(&h.server)
        .await;

    let err = h.client.book("s9").await.unwrap_err();
    assert_eq!(err.to_string(), "X");
    assert_eq!(err.status(), Some(409));
    // Application errors leave the session alone
    assert!(h.store.snapshot().is_active());
}

#[tokio::test]
async fn test_error_without_envelope_uses_status_fallback() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/api/slots"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&h.server)
        .await;

    let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
    let err = h.client.fetch_slots(from, to).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
}

#[tokio::test]
async fn test_unreachable_server_is_connectivity_error() {
    let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
    store.initialize(Utc::now());
    // Nothing listens on port 1
    let client = ApiClient::new(ApiConfig::new("http://127.0.0.1:1/api"), store).unwrap();

    let err = client.fetch_my_bookings().await.unwrap_err();
    assert!(matches!(err, ApiError::Connectivity { .. }));
    assert_eq!(err.to_string(), CONNECTIVITY_MESSAGE);
}

#[tokio::test]
async fn test_login_persists_patient_role() {
    let h = harness().await;
    let token = valid_token();

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"email": "patient@example.com", "password": "Passw0rd!"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": token,
            "user": {"name": "Pat"},
            "role": "patient"
        })))
        .mount(&h.server)
        .await;

    let session = h.client.login("patient@example.com", "Passw0rd!").await.unwrap();
    assert_eq!(session.user.name, "Pat");
    assert!(h.store.snapshot().is_active());

    let stored_user: serde_json::Value =
        serde_json::from_str(&h.storage.get(USER_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored_user["role"], "patient");
    assert_eq!(h.storage.get(TOKEN_KEY).unwrap(), Some(token));
}

#[tokio::test]
async fn test_empty_slot_week_is_not_an_error() {
    let (h, _) = logged_in_harness().await;

    Mock::given(method("GET"))
        .and(path("/api/slots"))
        .and(query_param("from", "2024-01-01"))
        .and(query_param("to", "2024-01-08"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&h.server)
        .await;

    let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
    let slots = h.client.fetch_slots(from, to).await.unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_all_bookings_envelope_and_bare_array() {
    let (h, _) = logged_in_harness().await;
    let row = json!({
        "id": 1,
        "slot": {"id": 2, "startTime": "2024-01-02T09:00:00Z", "endTime": "2024-01-02T09:30:00Z"},
        "createdAt": "2024-01-01T08:00:00Z",
        "user": {"name": "Pat", "email": "patient@example.com"}
    });

    Mock::given(method("GET"))
        .and(path("/api/all-bookings"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bookings": [row.clone()],
            "pagination": {"page": 2, "limit": 1, "total": 2, "totalPages": 2}
        })))
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/all-bookings"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&h.server)
        .await;

    let paged = h.client.fetch_all_bookings(2, 1).await.unwrap();
    assert!(matches!(paged, AllBookingsResponse::Paginated { .. }));
    assert_eq!(paged.pagination().total_pages, 2);

    let bare = h.client.fetch_all_bookings(1, 10).await.unwrap();
    assert!(matches!(bare, AllBookingsResponse::Bare(_)));
    assert_eq!(bare.bookings()[0].user.as_ref().unwrap().name, "Pat");
}

#[tokio::test]
async fn test_empty_success_body_is_null() {
    let (h, _) = logged_in_harness().await;

    Mock::given(method("DELETE"))
        .and(path("/api/bookings/b1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let body = h.client.cancel_booking("b1").await.unwrap();
    assert!(body.is_null());
}

#[tokio::test]
async fn test_unexpected_shape_is_invalid_response() {
    let (h, _) = logged_in_harness().await;

    Mock::given(method("GET"))
        .and(path("/api/my-bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&h.server)
        .await;

    let err = h.client.fetch_my_bookings().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
    assert!(h.store.snapshot().is_active());
}

#[tokio::test]
async fn test_late_auth_failure_on_retired_store_keeps_new_session() {
    let (h, _) = logged_in_harness().await;

    Mock::given(method("GET"))
        .and(path("/api/my-bookings"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(500)))
        .mount(&h.server)
        .await;

    let stale_client = h.client.clone();
    let in_flight = tokio::spawn(async move { stale_client.fetch_my_bookings().await });

    // The shell swaps in a fresh store and the user logs in again
    h.store.retire();
    let fresh = SessionStore::new(h.storage.clone());
    assert_eq!(fresh.initialize(Utc::now()), SessionState::Absent);
    let token = valid_token();
    let user: User = serde_json::from_value(json!({"id": "1", "name": "Pat"})).unwrap();
    fresh.login(token.clone(), user, Role::Patient);

    let result = in_flight.await.unwrap();
    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(h.store.snapshot(), SessionState::Absent);

    assert!(fresh.snapshot().is_active());
    assert_eq!(h.storage.get(TOKEN_KEY).unwrap(), Some(token));
    assert!(h.storage.get(USER_KEY).unwrap().is_some());
}

#[tokio::test]
async fn test_cancel_encodes_booking_id() {
    let (h, _) = logged_in_harness().await;

    Mock::given(method("DELETE"))
        .and(path("/api/bookings/b%2F1%20x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Booking cancelled"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let body = h.client.cancel_booking("b/1 x").await.unwrap();
    assert_eq!(body["message"], "Booking cancelled");
}
