//! In-memory stand-in for the DM account service and its MailHog inbox.
//!
//! Both APIs are served from one router so a single listener can play both
//! hosts. Every mail the account service would send is appended to the inbox
//! and listed newest first, the way MailHog does.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const AUTH_TOKEN_HEADER: &str = "x-dm-auth-token";
const LINK_BASE: &str = "http://localhost:5051";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Guest,
    Player,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rating {
    pub enabled: bool,
    pub quality: i64,
    pub quantity: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub login: String,
    pub roles: Vec<UserRole>,
    pub medium_picture_url: Option<String>,
    pub small_picture_url: Option<String>,
    pub status: Option<String>,
    pub rating: Rating,
    pub online: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub registration: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub resource: User,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingSettings {
    pub posts_per_page: u32,
    pub comments_per_page: u32,
    pub topics_per_page: u32,
    pub messages_per_page: u32,
    pub entities_per_page: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub color_schema: String,
    pub nanny_greetings_message: Option<String>,
    pub paging: PagingSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub icq: Option<String>,
    pub skype: Option<String>,
    pub original_picture_url: Option<String>,
    pub info: String,
    pub settings: UserSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserDetailsEnvelope {
    pub resource: UserDetails,
    pub metadata: Option<String>,
}

#[derive(Deserialize)]
pub struct Registration {
    pub login: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Deserialize)]
pub struct ResetPassword {
    pub login: String,
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub login: String,
    pub token: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ChangeEmail {
    pub login: String,
    pub password: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneralError {
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadRequestError {
    pub message: String,
    pub invalid_properties: HashMap<String, Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    pub trace_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailAddress {
    pub mailbox: String,
    pub domain: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailContent {
    pub headers: HashMap<String, Vec<String>>,
    pub body: String,
    pub size: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailItem {
    #[serde(rename = "ID")]
    pub id: String,
    pub from: MailAddress,
    pub to: Vec<MailAddress>,
    pub content: MailContent,
    pub created: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessagesPage {
    pub total: usize,
    pub count: usize,
    pub start: usize,
    pub items: Vec<MailItem>,
}

#[derive(Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<usize>,
}

#[derive(Clone, Debug)]
struct Account {
    login: String,
    email: String,
    password: String,
    roles: Vec<UserRole>,
    active: bool,
    registration: DateTime<Utc>,
    online: Option<DateTime<Utc>>,
}

impl Account {
    fn user(&self) -> User {
        User {
            login: self.login.clone(),
            roles: self.roles.clone(),
            medium_picture_url: None,
            small_picture_url: None,
            status: None,
            rating: Rating {
                enabled: true,
                quality: 0,
                quantity: 0,
            },
            online: self.online,
            name: None,
            location: None,
            registration: self.registration,
        }
    }

    fn envelope(&self) -> UserEnvelope {
        UserEnvelope {
            resource: self.user(),
            metadata: None,
        }
    }

    fn details(&self) -> UserDetailsEnvelope {
        UserDetailsEnvelope {
            resource: UserDetails {
                user: self.user(),
                icq: None,
                skype: None,
                original_picture_url: None,
                info: String::new(),
                settings: UserSettings {
                    color_schema: "Modern".to_string(),
                    nanny_greetings_message: None,
                    paging: PagingSettings {
                        posts_per_page: 10,
                        comments_per_page: 10,
                        topics_per_page: 10,
                        messages_per_page: 10,
                        entities_per_page: 10,
                    },
                },
            },
            metadata: None,
        }
    }
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    activation_tokens: HashMap<String, String>,
    reset_tokens: HashMap<String, String>,
    sessions: HashMap<String, String>,
    mails: Vec<MailItem>,
}

impl Store {
    fn send_mail(&mut self, to: &str, subject: &str, body: serde_json::Value) {
        let (mailbox, domain) = to.split_once('@').unwrap_or((to, ""));
        let body = body.to_string();
        let headers = HashMap::from([
            ("To".to_string(), vec![to.to_string()]),
            ("Subject".to_string(), vec![subject.to_string()]),
        ]);
        self.mails.push(MailItem {
            id: format!("{}@mailhog.example", Uuid::new_v4()),
            from: MailAddress {
                mailbox: "noreply".to_string(),
                domain: "dm.am".to_string(),
            },
            to: vec![MailAddress {
                mailbox: mailbox.to_string(),
                domain: domain.to_string(),
            }],
            content: MailContent {
                headers,
                size: body.len(),
                body,
            },
            created: Utc::now(),
        });
    }

    fn issue_activation(&mut self, login: &str, email: &str) {
        let token = Uuid::new_v4().to_string();
        self.activation_tokens.insert(token.clone(), login.to_string());
        self.send_mail(
            email,
            "Activation",
            serde_json::json!({
                "Login": login,
                "ConfirmationLinkUrl": format!("{LINK_BASE}/activate/{token}"),
            }),
        );
    }

    fn issue_reset(&mut self, login: &str, email: &str) {
        let token = Uuid::new_v4().to_string();
        self.reset_tokens.insert(token.clone(), login.to_string());
        self.send_mail(
            email,
            "Password reset",
            serde_json::json!({
                "Login": login,
                "ConfirmationLinkUri": format!("{LINK_BASE}/password/{token}"),
            }),
        );
    }

    fn session_login(&self, headers: &HeaderMap) -> Option<String> {
        let token = headers.get(AUTH_TOKEN_HEADER)?.to_str().ok()?;
        self.sessions.get(token).cloned()
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error responses in the service's three body shapes.
#[derive(Debug)]
pub enum Failure {
    BadRequest(BadRequestError),
    Status(StatusCode, GeneralError),
    Problem(StatusCode, ProblemDetails),
}

impl Failure {
    fn invalid(property: &str, reason: &str) -> Self {
        Failure::BadRequest(BadRequestError {
            message: "Validation failed".to_string(),
            invalid_properties: HashMap::from([(property.to_string(), vec![reason.to_string()])]),
        })
    }

    fn status(code: StatusCode, message: &str) -> Self {
        Failure::Status(
            code,
            GeneralError {
                message: message.to_string(),
            },
        )
    }

    fn problem(code: StatusCode, title: &str) -> Self {
        let kind = match code {
            StatusCode::UNAUTHORIZED => "https://tools.ietf.org/html/rfc7235#section-3.1",
            _ => "https://tools.ietf.org/html/rfc7231#section-6.5.3",
        };
        Failure::Problem(
            code,
            ProblemDetails {
                kind: kind.to_string(),
                title: title.to_string(),
                status: code.as_u16(),
                trace_id: Uuid::new_v4().to_string(),
            },
        )
    }

    fn unauthorized() -> Self {
        Self::problem(StatusCode::UNAUTHORIZED, "User must be authenticated")
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self {
            Failure::BadRequest(body) => (StatusCode::BAD_REQUEST, Json(body)).into_response(),
            Failure::Status(code, body) => (code, Json(body)).into_response(),
            Failure::Problem(code, body) => (code, Json(body)).into_response(),
        }
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/v1/account", get(get_account).post(register))
        .route("/v1/account/login", post(login).delete(logout))
        .route("/v1/account/login/all", delete(logout_all))
        .route(
            "/v1/account/password",
            post(request_password_reset).put(change_password),
        )
        .route("/v1/account/email", put(change_email))
        .route("/v1/account/{token}", put(activate))
        .route("/api/v2/messages", get(list_messages))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn validate_registration(input: &Registration) -> Result<(), Failure> {
    if input.login.trim().is_empty() {
        return Err(Failure::invalid("Login", "Empty"));
    }
    if !input.email.contains('@') {
        return Err(Failure::invalid("Email", "Invalid"));
    }
    if input.password.len() < 6 {
        return Err(Failure::invalid("Password", "Short"));
    }
    Ok(())
}

async fn register(State(db): State<Db>, Json(input): Json<Registration>) -> Result<StatusCode, Failure> {
    validate_registration(&input)?;
    let mut store = db.write().await;
    if store.accounts.contains_key(&input.login) {
        return Err(Failure::invalid("Login", "Taken"));
    }
    store.accounts.insert(
        input.login.clone(),
        Account {
            login: input.login.clone(),
            email: input.email.clone(),
            password: input.password,
            roles: vec![UserRole::Guest],
            active: false,
            registration: Utc::now(),
            online: None,
        },
    );
    store.issue_activation(&input.login, &input.email);
    tracing::info!(login = %input.login, "account registered");
    Ok(StatusCode::CREATED)
}

async fn activate(State(db): State<Db>, Path(token): Path<String>) -> Result<Json<UserEnvelope>, Failure> {
    let mut store = db.write().await;
    let login = store.activation_tokens.remove(&token).ok_or_else(|| {
        Failure::status(
            StatusCode::GONE,
            "Activation token is invalid! Address the technical support for further assistance",
        )
    })?;
    let account = store
        .accounts
        .get_mut(&login)
        .ok_or_else(|| Failure::status(StatusCode::GONE, "Account no longer exists"))?;
    account.active = true;
    if !account.roles.contains(&UserRole::Player) {
        account.roles.push(UserRole::Player);
    }
    tracing::info!(login = %login, "account activated");
    Ok(Json(account.envelope()))
}

async fn login(State(db): State<Db>, Json(input): Json<LoginCredentials>) -> Result<Response, Failure> {
    let mut store = db.write().await;
    let account = store
        .accounts
        .get_mut(&input.login)
        .ok_or_else(|| Failure::invalid("Login", "WrongLogin"))?;
    if account.password != input.password {
        return Err(Failure::invalid("Password", "WrongPassword"));
    }
    if !account.active {
        return Err(Failure::problem(
            StatusCode::FORBIDDEN,
            "User is inactive. Address the technical support for more details",
        ));
    }
    account.online = Some(Utc::now());
    let envelope = account.envelope();

    let token = Uuid::new_v4().to_string();
    store.sessions.insert(token.clone(), input.login.clone());
    tracing::info!(login = %input.login, remember_me = input.remember_me, "logged in");
    Ok(([(AUTH_TOKEN_HEADER, token)], Json(envelope)).into_response())
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    let token = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(Failure::unauthorized)?;
    store.sessions.remove(token).ok_or_else(Failure::unauthorized)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn logout_all(State(db): State<Db>, headers: HeaderMap) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    let login = store.session_login(&headers).ok_or_else(Failure::unauthorized)?;
    store.sessions.retain(|_, owner| *owner != login);
    Ok(StatusCode::NO_CONTENT)
}

async fn get_account(State(db): State<Db>, headers: HeaderMap) -> Result<Json<UserDetailsEnvelope>, Failure> {
    let store = db.read().await;
    let login = store.session_login(&headers).ok_or_else(Failure::unauthorized)?;
    let account = store.accounts.get(&login).ok_or_else(Failure::unauthorized)?;
    Ok(Json(account.details()))
}

async fn request_password_reset(
    State(db): State<Db>,
    Json(input): Json<ResetPassword>,
) -> Result<(StatusCode, Json<UserEnvelope>), Failure> {
    let mut store = db.write().await;
    let account = store
        .accounts
        .get(&input.login)
        .filter(|a| a.email == input.email)
        .cloned()
        .ok_or_else(|| Failure::invalid("Login", "WrongLoginOrEmail"))?;
    store.issue_reset(&account.login, &account.email);
    Ok((StatusCode::CREATED, Json(account.envelope())))
}

async fn change_password(State(db): State<Db>, Json(input): Json<ChangePassword>) -> Result<Json<UserEnvelope>, Failure> {
    let mut store = db.write().await;
    if store.reset_tokens.get(&input.token) != Some(&input.login) {
        return Err(Failure::invalid("Token", "Invalid"));
    }
    let account = store
        .accounts
        .get_mut(&input.login)
        .ok_or_else(|| Failure::invalid("Login", "WrongLogin"))?;
    if account.password != input.old_password {
        return Err(Failure::invalid("OldPassword", "WrongPassword"));
    }
    account.password = input.new_password;
    let envelope = account.envelope();
    store.reset_tokens.remove(&input.token);
    Ok(Json(envelope))
}

async fn change_email(State(db): State<Db>, Json(input): Json<ChangeEmail>) -> Result<Json<UserEnvelope>, Failure> {
    if !input.email.contains('@') {
        return Err(Failure::invalid("Email", "Invalid"));
    }
    let mut store = db.write().await;
    let account = store
        .accounts
        .get_mut(&input.login)
        .ok_or_else(|| Failure::invalid("Login", "WrongLogin"))?;
    if account.password != input.password {
        return Err(Failure::invalid("Password", "WrongPassword"));
    }
    account.email = input.email.clone();
    account.active = false;
    let envelope = account.envelope();
    store.issue_activation(&input.login, &input.email);
    Ok(Json(envelope))
}

async fn list_messages(State(db): State<Db>, Query(query): Query<MessagesQuery>) -> Json<MessagesPage> {
    let store = db.read().await;
    let limit = query.limit.unwrap_or(50);
    let items: Vec<MailItem> = store.mails.iter().rev().take(limit).cloned().collect();
    Json(MessagesPage {
        total: store.mails.len(),
        count: items.len(),
        start: 0,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            login: "alice".to_string(),
            email: "alice@mail.ru".to_string(),
            password: "Passw0rd1".to_string(),
            roles: vec![UserRole::Guest],
            active: false,
            registration: Utc::now(),
            online: None,
        }
    }

    #[test]
    fn user_details_flatten_into_camel_case() {
        let json = serde_json::to_value(account().details()).unwrap();
        let resource = &json["resource"];
        assert_eq!(resource["login"], "alice");
        assert_eq!(resource["roles"], serde_json::json!(["Guest"]));
        assert!(resource["mediumPictureUrl"].is_null());
        assert_eq!(resource["info"], "");
        assert_eq!(resource["settings"]["colorSchema"], "Modern");
        assert_eq!(resource["settings"]["paging"]["postsPerPage"], 10);
    }

    #[test]
    fn activation_mail_carries_login_and_url() {
        let mut store = Store::default();
        store.issue_activation("alice", "alice@mail.ru");
        let mail = &store.mails[0];
        let body: serde_json::Value = serde_json::from_str(&mail.content.body).unwrap();
        assert_eq!(body["Login"], "alice");
        let token = store.activation_tokens.keys().next().unwrap();
        assert!(body["ConfirmationLinkUrl"].as_str().unwrap().ends_with(token.as_str()));
        assert_eq!(mail.to[0].domain, "mail.ru");
    }

    #[test]
    fn reset_mail_uses_uri_field() {
        let mut store = Store::default();
        store.issue_reset("alice", "alice@mail.ru");
        let body: serde_json::Value = serde_json::from_str(&store.mails[0].content.body).unwrap();
        assert!(body.get("ConfirmationLinkUrl").is_none());
        assert!(body["ConfirmationLinkUri"].as_str().is_some());
    }

    #[test]
    fn registration_validation_rejects_bad_email() {
        let input = Registration {
            login: "alice".to_string(),
            email: "alice".to_string(),
            password: "Passw0rd1".to_string(),
        };
        assert!(matches!(validate_registration(&input), Err(Failure::BadRequest(_))));
    }

    #[test]
    fn mail_item_serializes_mailhog_field_names() {
        let mut store = Store::default();
        store.issue_activation("alice", "alice@mail.ru");
        let json = serde_json::to_value(&store.mails[0]).unwrap();
        assert!(json["ID"].is_string());
        assert!(json["Content"]["Body"].is_string());
        assert_eq!(json["Content"]["Headers"]["To"][0], "alice@mail.ru");
        assert!(json["Created"].is_string());
    }

    #[test]
    fn unauthorized_is_a_problem_details_body() {
        let Failure::Problem(code, body) = Failure::unauthorized() else {
            panic!("expected a problem body");
        };
        assert_eq!(code, StatusCode::UNAUTHORIZED);
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["title"], "User must be authenticated");
        assert_eq!(json["status"], 401);
        assert!(json["type"].is_string());
        assert!(json["traceId"].is_string());
    }
}
