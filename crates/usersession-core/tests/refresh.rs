//! Integration tests for refreshing the session against an HTTP auth service

use serde_json::json;
use usersession_core::{
    ApiClient, ApiError, AuthResponse, FileStore, MemoryStore, SessionRecord, SessionStore,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_refresh_stores_token_from_service() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 200, "token": "abc", "username": "scout"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let store = SessionStore::new(MemoryStore::new());

    let resp = store.refresh(&client).await.unwrap();
    assert!(resp.is_success());
    assert_eq!(
        store.get().unwrap(),
        Some(SessionRecord::new("abc").with_username("scout"))
    );
}

#[tokio::test]
async fn test_refresh_sends_stored_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "token": "new"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SessionStore::new(MemoryStore::new());
    store
        .set(&SessionRecord::new("old").with_username("u"))
        .unwrap();

    let token = store.token().unwrap().unwrap();
    let client = ApiClient::new(mock_server.uri()).unwrap().with_token(token);

    store.refresh(&client).await.unwrap();
    assert_eq!(
        store.get().unwrap(),
        Some(SessionRecord::new("new").with_username("u"))
    );
}

#[tokio::test]
async fn test_refresh_rejection_in_body_keeps_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 401})))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(FileStore::new(dir.path().to_path_buf()).unwrap());
    let before = SessionRecord::new("old").with_username("u");
    store.set(&before).unwrap();

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let resp = store.refresh(&client).await.unwrap();

    assert_eq!(resp, AuthResponse::with_code(401));
    assert_eq!(store.get().unwrap(), Some(before));
}

#[tokio::test]
async fn test_refresh_http_error_with_envelope_is_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"code": 401, "msg": "expired"})),
        )
        .mount(&mock_server)
        .await;

    let store = SessionStore::new(MemoryStore::new());
    let client = ApiClient::new(mock_server.uri()).unwrap();
    let resp = store.refresh(&client).await.unwrap();

    assert_eq!(resp.code, 401);
    assert_eq!(resp.extra.get("msg"), Some(&json!("expired")));
    assert_eq!(store.get().unwrap(), None);
}

#[tokio::test]
async fn test_refresh_wrong_auth_path_names_the_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "token": "abc"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let store = SessionStore::new(MemoryStore::new());
    let client = ApiClient::with_options(
        mock_server.uri(),
        "/login",
        std::time::Duration::from_secs(5),
    )
    .unwrap();
    let err = store.refresh(&client).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::EndpointMissing { .. })
    ));
    assert_eq!(store.get().unwrap(), None);
}

#[tokio::test]
async fn test_refresh_server_error_propagates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;

    let store = SessionStore::new(MemoryStore::new());
    store.set(&SessionRecord::new("old")).unwrap();

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let err = store.refresh(&client).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Unavailable { .. })
    ));
    assert!(err.downcast_ref::<ApiError>().is_some_and(ApiError::is_transient));
    assert_eq!(store.get().unwrap(), Some(SessionRecord::new("old")));
}
