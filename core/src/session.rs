//! Authenticated session captured from a login response.

use crate::http::{HttpRequest, HttpResponse};

/// Header carrying the account service's auth token.
pub const AUTH_TOKEN_HEADER: &str = "x-dm-auth-token";

/// An auth token passed explicitly to every call that needs it.
///
/// Clients never store a session; a test that juggles several users simply
/// holds several `Session` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    /// Wrap a token obtained elsewhere, e.g. from another device's login.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn from_response(response: &HttpResponse) -> Option<Self> {
        response
            .header(AUTH_TOKEN_HEADER)
            .filter(|t| !t.is_empty())
            .map(Self::new)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn authorize(&self, request: HttpRequest) -> HttpRequest {
        request.with_header(AUTH_TOKEN_HEADER, &self.token)
    }
}
