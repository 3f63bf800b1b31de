//! Typed client and workflow helpers for end-to-end tests of the DM account
//! service.
//!
//! # Overview
//! Endpoint clients build `HttpRequest` values and validate `HttpResponse`
//! values; a `RestClient` sends them through a blocking `Transport`. On top,
//! `AccountHelper` chains the clients into scenario-level flows and polls
//! MailHog for the confirmation mails those flows depend on.
//!
//! # Design
//! - Clients hold no session. The auth token captured at login is a `Session`
//!   value passed to every call that needs it.
//! - Typed endpoints come in pairs: `name()` validates, `name_raw()` returns
//!   the response untouched for negative checks.
//! - Polling is a `RetryPolicy` applied to a closure; only "nothing yet" is
//!   retried, never transport errors.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod account;
pub mod checkers;
pub mod config;
pub mod error;
pub mod helper;
pub mod http;
pub mod logging;
pub mod login;
pub mod mailhog;
pub mod models;
pub mod rest;
pub mod retry;
pub mod services;
pub mod session;
pub mod token;

pub use account::AccountApi;
pub use config::Config;
pub use error::{ApiError, Result, ServiceError, StepContext, TokenKind};
pub use helper::AccountHelper;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use login::{Authenticated, LoginApi};
pub use mailhog::MailhogApi;
pub use models::{Credentials, Mailbox, UserDetailsEnvelope, UserEnvelope, UserRole};
pub use rest::RestClient;
pub use retry::{Backoff, RetryPolicy};
pub use services::{ApiMailhog, DmApiAccount};
pub use session::Session;
