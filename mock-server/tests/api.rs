use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, MessagesPage, UserDetailsEnvelope, UserEnvelope, UserRole, AUTH_TOKEN_HEADER};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTH_TOKEN_HEADER, token);
    }
    builder.body(String::new()).unwrap()
}

/// The router shares its store across clones, so each call sees prior state.
async fn send(app: &Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

const ALICE: &str = r#"{"login":"alice","email":"alice@mail.ru","password":"Passw0rd1"}"#;
const ALICE_LOGIN: &str = r#"{"login":"alice","password":"Passw0rd1","rememberMe":true}"#;

async fn latest_link(app: &Router, field: &str) -> String {
    let resp = send(app, bare_request("GET", "/api/v2/messages?limit=50", None)).await;
    let page: MessagesPage = body_json(resp).await;
    let body: serde_json::Value = serde_json::from_str(&page.items[0].content.body).unwrap();
    body[field].as_str().unwrap().rsplit('/').next().unwrap().to_string()
}

async fn register_and_activate(app: &Router) {
    let resp = send(app, json_request("POST", "/v1/account", ALICE)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let token = latest_link(app, "ConfirmationLinkUrl").await;
    let resp = send(app, bare_request("PUT", &format!("/v1/account/{token}"), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn login_token(app: &Router) -> String {
    let resp = send(app, json_request("POST", "/v1/account/login", ALICE_LOGIN)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.headers()[AUTH_TOKEN_HEADER].to_str().unwrap().to_string()
}

// --- register ---

#[tokio::test]
async fn register_returns_201_and_sends_mail() {
    let app = app();
    let resp = send(&app, json_request("POST", "/v1/account", ALICE)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(body_bytes(resp).await.is_empty());

    let resp = send(&app, bare_request("GET", "/api/v2/messages?limit=10", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: MessagesPage = body_json(resp).await;
    assert_eq!(page.total, 1);
    let body: serde_json::Value = serde_json::from_str(&page.items[0].content.body).unwrap();
    assert_eq!(body["Login"], "alice");
}

#[tokio::test]
async fn register_duplicate_login_returns_400() {
    let app = app();
    send(&app, json_request("POST", "/v1/account", ALICE)).await;
    let resp = send(&app, json_request("POST", "/v1/account", ALICE)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["invalidProperties"]["Login"][0], "Taken");
}

#[tokio::test]
async fn register_malformed_json_returns_422() {
    let app = app();
    let resp = send(&app, json_request("POST", "/v1/account", r#"{"login":"x"}"#)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- activate ---

#[tokio::test]
async fn activate_unknown_token_returns_410() {
    let app = app();
    let resp = send(&app, bare_request("PUT", "/v1/account/not-a-token", None)).await;
    assert_eq!(resp.status(), StatusCode::GONE);
}

#[tokio::test]
async fn activation_grants_player_role() {
    let app = app();
    send(&app, json_request("POST", "/v1/account", ALICE)).await;
    let token = latest_link(&app, "ConfirmationLinkUrl").await;
    let resp = send(&app, bare_request("PUT", &format!("/v1/account/{token}"), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let envelope: UserEnvelope = body_json(resp).await;
    assert_eq!(envelope.resource.roles, vec![UserRole::Guest, UserRole::Player]);

    // tokens are single use
    let resp = send(&app, bare_request("PUT", &format!("/v1/account/{token}"), None)).await;
    assert_eq!(resp.status(), StatusCode::GONE);
}

// --- login ---

#[tokio::test]
async fn login_before_activation_returns_403() {
    let app = app();
    send(&app, json_request("POST", "/v1/account", ALICE)).await;
    let resp = send(&app, json_request("POST", "/v1/account/login", ALICE_LOGIN)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["title"].as_str().unwrap().starts_with("User is inactive"));
}

#[tokio::test]
async fn login_wrong_password_returns_400() {
    let app = app();
    register_and_activate(&app).await;
    let resp = send(
        &app,
        json_request("POST", "/v1/account/login", r#"{"login":"alice","password":"nope","rememberMe":true}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_sets_auth_header() {
    let app = app();
    register_and_activate(&app).await;
    let token = login_token(&app).await;
    assert!(!token.is_empty());
}

// --- account ---

#[tokio::test]
async fn get_account_requires_auth() {
    let app = app();
    let resp = send(&app, bare_request("GET", "/v1/account", None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["title"], "User must be authenticated");
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn get_account_returns_details() {
    let app = app();
    register_and_activate(&app).await;
    let token = login_token(&app).await;
    let resp = send(&app, bare_request("GET", "/v1/account", Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let details: UserDetailsEnvelope = body_json(resp).await;
    assert_eq!(details.resource.user.login, "alice");
    assert_eq!(details.resource.settings.paging.entities_per_page, 10);
}

// --- logout ---

#[tokio::test]
async fn logout_invalidates_only_current_session() {
    let app = app();
    register_and_activate(&app).await;
    let first = login_token(&app).await;
    let second = login_token(&app).await;

    let resp = send(&app, bare_request("DELETE", "/v1/account/login", Some(&first))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, bare_request("GET", "/v1/account", Some(&first))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = send(&app, bare_request("GET", "/v1/account", Some(&second))).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_all_invalidates_every_session() {
    let app = app();
    register_and_activate(&app).await;
    let first = login_token(&app).await;
    let second = login_token(&app).await;

    let resp = send(&app, bare_request("DELETE", "/v1/account/login/all", Some(&first))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, bare_request("GET", "/v1/account", Some(&second))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_without_token_returns_401() {
    let app = app();
    let resp = send(&app, bare_request("DELETE", "/v1/account/login", None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- password ---

#[tokio::test]
async fn password_reset_flow() {
    let app = app();
    register_and_activate(&app).await;

    let resp = send(
        &app,
        json_request("POST", "/v1/account/password", r#"{"login":"alice","email":"alice@mail.ru"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let token = latest_link(&app, "ConfirmationLinkUri").await;

    let change = format!(
        r#"{{"login":"alice","token":"{token}","oldPassword":"Passw0rd1","newPassword":"N3wPassword"}}"#
    );
    let resp = send(&app, json_request("PUT", "/v1/account/password", &change)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, json_request("POST", "/v1/account/login", ALICE_LOGIN)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- email ---

#[tokio::test]
async fn change_email_deactivates_until_reactivated() {
    let app = app();
    register_and_activate(&app).await;

    let resp = send(
        &app,
        json_request(
            "PUT",
            "/v1/account/email",
            r#"{"login":"alice","password":"Passw0rd1","email":"alice2@mail.ru"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, json_request("POST", "/v1/account/login", ALICE_LOGIN)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let token = latest_link(&app, "ConfirmationLinkUrl").await;
    let resp = send(&app, bare_request("PUT", &format!("/v1/account/{token}"), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    login_token(&app).await;
}

// --- mailbox ---

#[tokio::test]
async fn messages_are_listed_newest_first_and_limited() {
    let app = app();
    for login in ["first", "second", "third"] {
        let body = format!(r#"{{"login":"{login}","email":"{login}@mail.ru","password":"Passw0rd1"}}"#);
        send(&app, json_request("POST", "/v1/account", &body)).await;
    }
    let resp = send(&app, bare_request("GET", "/api/v2/messages?limit=2", None)).await;
    let page: MessagesPage = body_json(resp).await;
    assert_eq!(page.total, 3);
    assert_eq!(page.count, 2);
    let body: serde_json::Value = serde_json::from_str(&page.items[0].content.body).unwrap();
    assert_eq!(body["Login"], "third");
}
