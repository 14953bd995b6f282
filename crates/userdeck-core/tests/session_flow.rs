//! Integration tests for login, token injection and 401 handling against a
//! mock directory server.

use chrono::Utc;
use serde_json::json;
use userdeck_core::api::{ApiClient, ApiError, ErrorKind};
use userdeck_core::auth::{AuthService, TokenStore, DEMO_EMAIL, DEMO_PASSWORD, DEMO_TOKEN_PREFIX};
use userdeck_core::messages;
use userdeck_core::routes::{Navigator, Route, Screen};
use userdeck_core::session::{AuthStatus, LoginOutcome, SessionContext};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn users_page() -> serde_json::Value {
    json!({
        "page": 1,
        "per_page": 6,
        "total": 12,
        "total_pages": 2,
        "data": [
            {"id": 1, "email": "george.bluth@reqres.in", "first_name": "George",
             "last_name": "Bluth", "avatar": "https://reqres.in/img/faces/1-image.jpg"},
            {"id": 2, "email": "janet.weaver@reqres.in", "first_name": "Janet",
             "last_name": "Weaver", "avatar": "https://reqres.in/img/faces/2-image.jpg"}
        ]
    })
}

fn service(server: &MockServer) -> (AuthService, TokenStore) {
    let store = TokenStore::in_memory();
    let api = ApiClient::new(&server.uri(), store.clone()).unwrap();
    (AuthService::new(api), store)
}

#[tokio::test]
async fn test_login_persists_token_and_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"email": "eve.holt@reqres.in", "password": "pistol"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "QpwL5tke4Pnpja7X4"})))
        .expect(1)
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    let before = Utc::now().timestamp_millis();

    let success = auth.authenticate("eve.holt@reqres.in", "pistol").await.unwrap();

    assert_eq!(success.token, "QpwL5tke4Pnpja7X4");
    assert!(!success.demo);
    assert_eq!(store.get().as_deref(), Some("QpwL5tke4Pnpja7X4"));
    let issued = store.issued_at().unwrap();
    assert!(issued >= before && issued <= Utc::now().timestamp_millis());
    assert!(auth.check_validity());
}

#[tokio::test]
async fn test_login_response_without_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);

    let err = auth.authenticate("a@b.c", "pw").await.unwrap_err();

    assert!(matches!(err, ApiError::AuthenticationFailed));
    assert_eq!(store.get(), None);
    assert_eq!(store.issued_at(), None);
}

#[tokio::test]
async fn test_rejected_login_leaves_store_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "user not found"})))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    let mut ctx = SessionContext::new(auth);
    ctx.initialize();

    let outcome = ctx.login("nobody@example.com", "pw").await;

    assert_eq!(outcome, LoginOutcome::Failure("user not found".to_string()));
    assert_eq!(ctx.status(), AuthStatus::Unauthenticated);
    assert_eq!(ctx.error(), Some("user not found"));
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_unauthorized_login_keeps_existing_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad password"})))
        .expect(1)
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    store.set("active-session").unwrap();
    let mut ctx = SessionContext::new(auth);
    assert_eq!(ctx.initialize(), AuthStatus::Authenticated);

    let outcome = ctx.login("eve.holt@reqres.in", "wrong").await;

    assert_eq!(outcome, LoginOutcome::Failure(messages::LOGIN_FAILED.to_string()));
    assert_eq!(store.get().as_deref(), Some("active-session"));
    assert!(ctx.auth().check_validity());
    assert_eq!(ctx.status(), AuthStatus::Authenticated);
    assert!(!ctx.process_events());
}

#[tokio::test]
async fn test_failed_login_resyncs_with_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "user not found"})))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    store.set("tok").unwrap();
    let mut ctx = SessionContext::new(auth);
    assert_eq!(ctx.initialize(), AuthStatus::Authenticated);

    // Cleared behind the context's back, e.g. by another process
    store.remove().unwrap();
    let outcome = ctx.login("nobody@example.com", "pw").await;

    assert!(!outcome.is_success());
    assert_eq!(ctx.status(), AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "1"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_page()))
        .expect(1)
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    store.set("tok-123").unwrap();

    let page = auth.api().fetch_users(1).await.unwrap();

    assert_eq!(page.total, 12);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[1].first_name, "Janet");
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": 2, "email": "janet.weaver@reqres.in", "first_name": "Janet",
                     "last_name": "Weaver", "avatar": "https://reqres.in/img/faces/2-image.jpg"},
            "support": {"url": "https://reqres.in/#support-heading", "text": "..."}
        })))
        .mount(&server)
        .await;

    let (auth, _) = service(&server);

    let user = auth.api().fetch_user(2).await.unwrap();
    assert_eq!(user.display_name(), "Janet Weaver");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_unauthorized_clears_session_and_redirects_to_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid token"})))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    store.set("stale-but-local").unwrap();
    let api = auth.api().clone();

    let mut ctx = SessionContext::new(auth);
    let mut nav = Navigator::new("/dashboard");
    assert_eq!(ctx.initialize(), AuthStatus::Authenticated);
    assert_eq!(nav.sync(ctx.status()), Screen::Page(Route::Dashboard));

    let err = api.fetch_users(1).await.unwrap_err();

    // The caller still sees the failure
    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(err.kind(), ErrorKind::Authorization);
    // The transport layer already cleared the store
    assert_eq!(store.get(), None);

    assert!(ctx.process_events());
    assert_eq!(ctx.status(), AuthStatus::Unauthenticated);
    assert_eq!(ctx.error(), Some(messages::SESSION_EXPIRED));
    assert_eq!(nav.sync(ctx.status()), Screen::Page(Route::Login));
    assert_eq!(nav.from(), Some(Route::Dashboard));
}

#[tokio::test]
async fn test_guarded_visit_lands_back_after_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh"})))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    let mut ctx = SessionContext::new(auth);
    let mut nav = Navigator::new("/dashboard");

    assert_eq!(nav.sync(ctx.status()), Screen::Waiting);
    ctx.initialize();
    assert_eq!(nav.sync(ctx.status()), Screen::Page(Route::Login));

    assert!(ctx.login("eve.holt@reqres.in", "cityslicka").await.is_success());

    assert_eq!(nav.sync(ctx.status()), Screen::Page(Route::Dashboard));
    assert_eq!(store.get().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_demo_mode_falls_back_when_server_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    let auth = auth.with_demo_mode(true);

    let success = auth.authenticate(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

    assert!(success.demo);
    assert!(success.token.starts_with(DEMO_TOKEN_PREFIX));
    assert_eq!(store.get(), Some(success.token));
    assert!(auth.check_validity());
}

#[tokio::test]
async fn test_demo_mode_rejects_other_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("blocked"))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    let auth = auth.with_demo_mode(true);

    let err = auth.authenticate(DEMO_EMAIL, "wrong").await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidCredentials));
    assert_eq!(err.login_message(), "Invalid email or password");
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_demo_mode_does_not_override_server_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Missing password"})))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    let auth = auth.with_demo_mode(true);

    let err = auth.authenticate(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap_err();

    assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Missing password"));
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_server_failure_propagates_without_demo_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);

    let err = auth.authenticate(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap_err();

    assert!(matches!(err, ApiError::ServerError(_)));
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_transport_failure_reports_connectivity() {
    // Nothing listens on the discard port
    let store = TokenStore::in_memory();
    let api = ApiClient::new("http://127.0.0.1:9", store.clone()).unwrap();
    let mut ctx = SessionContext::new(AuthService::new(api));
    ctx.initialize();

    let outcome = ctx.login("a@b.c", "pw").await;

    assert_eq!(outcome, LoginOutcome::Failure(messages::NETWORK_ERROR.to_string()));
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_register_does_not_start_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({"email": "eve.holt@reqres.in", "password": "pistol"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4, "token": "QpwL5tke4Pnpja7X4"})))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);

    let registered = auth.register("eve.holt@reqres.in", "pistol").await.unwrap();

    assert_eq!(registered.id, Some(4));
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let (auth, store) = service(&server);
    store.set("tok").unwrap();

    let err = auth.api().fetch_users(1).await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidResponse(_)));
    // Only a 401 touches the session
    assert_eq!(store.get().as_deref(), Some("tok"));
}
