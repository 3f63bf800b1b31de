//! Request and response records for the account service and MailHog.
//!
//! # Design
//! These types mirror the service schema but are defined independently of the
//! mock server. Request records and the response envelopes reject unknown
//! fields so schema drift surfaces as a validation error instead of being
//! silently ignored; the nested resources stay lenient.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's login, password and email, as used across a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
    pub email: String,
}

impl Credentials {
    pub fn new(login: &str, password: &str, email: &str) -> Self {
        Self {
            login: login.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        }
    }

    /// Fresh credentials whose login is unique per call.
    pub fn unique(prefix: &str) -> Self {
        let stamp = Utc::now().format("%d_%m_%Y_%H_%M_%S");
        let salt = Uuid::new_v4().simple().to_string();
        let login = format!("{prefix}_{stamp}_{}", &salt[..8]);
        let password = format!("P{}", &salt[8..17]);
        let email = format!("{login}@mail.ru");
        Self {
            login,
            password,
            email,
        }
    }

    pub fn registration(&self) -> Registration {
        Registration {
            login: self.login.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }

    pub fn login_credentials(&self, remember_me: bool) -> LoginCredentials {
        LoginCredentials {
            login: self.login.clone(),
            password: self.password.clone(),
            remember_me,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Registration {
    pub login: String,
    pub email: String,
    pub password: String,
}

fn remember_me_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct LoginCredentials {
    pub login: String,
    pub password: String,
    #[serde(default = "remember_me_default")]
    pub remember_me: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPassword {
    pub login: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ChangePassword {
    pub login: String,
    pub token: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeEmail {
    pub login: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UserRole {
    Guest,
    Player,
    Administrator,
    NannyModerator,
    RegularModerator,
    SeniorModerator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub enabled: bool,
    pub quality: i64,
    pub quantity: i64,
}

/// Short user resource returned by login, activation and the update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub login: Option<String>,
    pub roles: Vec<UserRole>,
    #[serde(default)]
    pub medium_picture_url: Option<String>,
    #[serde(default)]
    pub small_picture_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub rating: Rating,
    #[serde(default)]
    pub online: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub registration: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEnvelope {
    pub resource: User,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSchema {
    Modern,
    Pale,
    Classic,
    ClassicPale,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingSettings {
    pub posts_per_page: u32,
    pub comments_per_page: u32,
    pub topics_per_page: u32,
    pub messages_per_page: u32,
    pub entities_per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub color_schema: ColorSchema,
    #[serde(default)]
    pub nanny_greetings_message: Option<String>,
    pub paging: PagingSettings,
}

/// Full profile returned by `GET /v1/account`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(default)]
    pub login: Option<String>,
    pub roles: Vec<UserRole>,
    #[serde(default)]
    pub medium_picture_url: Option<String>,
    #[serde(default)]
    pub small_picture_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub rating: Rating,
    #[serde(default)]
    pub online: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub registration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub icq: Option<String>,
    #[serde(default)]
    pub skype: Option<String>,
    #[serde(default)]
    pub original_picture_url: Option<String>,
    pub info: String,
    pub settings: UserSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserDetailsEnvelope {
    pub resource: UserDetails,
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BadRequestError {
    pub message: String,
    pub invalid_properties: HashMap<String, Vec<String>>,
}

/// RFC 7807 error body the service returns for authentication and
/// authorization failures. Extra members are tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub title: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
}

/// MailHog v2 message listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mailbox {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub items: Vec<MailMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailMessage {
    #[serde(rename = "ID", default)]
    pub id: String,
    pub content: MailContent,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailContent {
    #[serde(default)]
    pub headers: HashMap<String, Vec<String>>,
    /// JSON text produced by the account service's mail templates.
    pub body: String,
}
