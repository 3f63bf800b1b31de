//! Error types for the account and mail clients.
//!
//! # Design
//! Transport failures, unexpected status codes and schema mismatches are
//! separate variants so a test can tell "the service said no" apart from
//! "the service answered with something we cannot read". Workflow helpers
//! wrap failures in `Step` so the failing stage is named in the message.

use std::fmt;

use thiserror::Error;

use crate::models::{BadRequestError, GeneralError, ProblemDetails};

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// The two kinds of confirmation token delivered by mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Activation,
    PasswordReset,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Activation => f.write_str("activation"),
            TokenKind::PasswordReset => f.write_str("password reset"),
        }
    }
}

/// Errors returned by the clients and the workflow helper.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a status the caller did not expect.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body does not match the expected schema.
    #[error("response does not match {schema}: {message}; payload: {payload}")]
    Validation {
        schema: &'static str,
        message: String,
        payload: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("login response carries no x-dm-auth-token header")]
    MissingAuthToken,

    /// The mailbox never produced a matching message.
    #[error("{kind} token for login '{login}' not found after {attempts} attempts")]
    TokenNotFound {
        kind: TokenKind,
        login: String,
        attempts: u32,
    },

    /// A workflow step failed.
    #[error("{step}: {source}")]
    Step {
        step: &'static str,
        source: Box<ApiError>,
    },
}

/// Error body decoded from a failed account-service response.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    BadRequest(BadRequestError),
    General(GeneralError),
    Problem(ProblemDetails),
}

impl ServiceError {
    pub fn message(&self) -> &str {
        match self {
            ServiceError::BadRequest(e) => &e.message,
            ServiceError::General(e) => &e.message,
            ServiceError::Problem(e) => &e.title,
        }
    }
}

impl ApiError {
    /// HTTP status of the innermost `HttpError`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            ApiError::Step { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Name of the outermost failed workflow step.
    pub fn step_name(&self) -> Option<&'static str> {
        match self {
            ApiError::Step { step, .. } => Some(step),
            _ => None,
        }
    }

    /// The error with all `Step` wrappers removed.
    pub fn root(&self) -> &ApiError {
        match self {
            ApiError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// Decode the service's error body from an `HttpError`.
    pub fn service_error(&self) -> Option<ServiceError> {
        let ApiError::HttpError { body, .. } = self.root() else {
            return None;
        };
        if let Ok(e) = serde_json::from_str::<BadRequestError>(body) {
            return Some(ServiceError::BadRequest(e));
        }
        if let Ok(e) = serde_json::from_str::<GeneralError>(body) {
            return Some(ServiceError::General(e));
        }
        serde_json::from_str::<ProblemDetails>(body)
            .ok()
            .map(ServiceError::Problem)
    }
}

/// Attaches a step name to a failing result.
pub trait StepContext<T> {
    fn step(self, step: &'static str) -> Result<T>;
}

impl<T> StepContext<T> for Result<T> {
    fn step(self, step: &'static str) -> Result<T> {
        self.map_err(|source| ApiError::Step {
            step,
            source: Box::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_context_names_the_failed_step() {
        let result: Result<()> = Err(ApiError::HttpError {
            status: 400,
            body: "bad".to_string(),
        });
        let err = result.step("user not created").unwrap_err();
        assert_eq!(err.to_string(), "user not created: HTTP 400: bad");
        assert_eq!(err.step_name(), Some("user not created"));
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn status_is_none_for_non_http_errors() {
        assert_eq!(ApiError::Transport("refused".to_string()).status(), None);
        assert_eq!(ApiError::MissingAuthToken.status(), None);
    }

    #[test]
    fn service_error_decodes_bad_request_body() {
        let err = ApiError::HttpError {
            status: 400,
            body: r#"{"message":"Validation failed","invalidProperties":{"Login":["Taken"]}}"#.to_string(),
        };
        match err.service_error() {
            Some(ServiceError::BadRequest(e)) => {
                assert_eq!(e.message, "Validation failed");
                assert_eq!(e.invalid_properties["Login"], vec!["Taken".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn service_error_decodes_general_body_through_steps() {
        let err = ApiError::Step {
            step: "user not logged in",
            source: Box::new(ApiError::HttpError {
                status: 403,
                body: r#"{"message":"User is inactive"}"#.to_string(),
            }),
        };
        let service = err.service_error().unwrap();
        assert_eq!(service.message(), "User is inactive");
    }

    #[test]
    fn token_not_found_message_names_kind_and_login() {
        let err = ApiError::TokenNotFound {
            kind: TokenKind::PasswordReset,
            login: "alice".to_string(),
            attempts: 5,
        };
        assert_eq!(
            err.to_string(),
            "password reset token for login 'alice' not found after 5 attempts"
        );
    }

    #[test]
    fn service_error_reads_problem_details_title() {
        let err = ApiError::HttpError {
            status: 401,
            body: r#"{"type":"https://tools.ietf.org/html/rfc7235#section-3.1","title":"User must be authenticated","status":401,"traceId":"00-4bf92f3577b34da6-01"}"#.to_string(),
        };
        match err.service_error() {
            Some(ServiceError::Problem(problem)) => {
                assert_eq!(problem.status, Some(401));
                assert_eq!(problem.trace_id.as_deref(), Some("00-4bf92f3577b34da6-01"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(err.service_error().unwrap().message(), "User must be authenticated");
    }

    #[test]
    fn service_error_is_none_for_unknown_bodies() {
        let err = ApiError::HttpError {
            status: 500,
            body: "<html>oops</html>".to_string(),
        };
        assert!(err.service_error().is_none());
    }
}
