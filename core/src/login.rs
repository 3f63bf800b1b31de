//! Client for the `/v1/account/login` endpoints.

use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::models::{LoginCredentials, UserEnvelope};
use crate::rest::{check_status, validate, RestClient};
use crate::session::Session;

const V1_LOGIN: &str = "/v1/account/login";

/// A successful login: the session to reuse and the user it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Authenticated {
    pub session: Session,
    pub user: UserEnvelope,
}

#[derive(Clone)]
pub struct LoginApi {
    rest: RestClient,
}

impl LoginApi {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub fn build_login(&self, data: &LoginCredentials) -> Result<HttpRequest> {
        HttpRequest::new(HttpMethod::Post, V1_LOGIN).with_json(data)
    }

    pub fn build_logout(&self, session: &Session) -> HttpRequest {
        session.authorize(HttpRequest::new(HttpMethod::Delete, V1_LOGIN))
    }

    pub fn build_logout_all(&self, session: &Session) -> HttpRequest {
        session.authorize(HttpRequest::new(HttpMethod::Delete, format!("{V1_LOGIN}/all")))
    }

    pub fn login_raw(&self, data: &LoginCredentials) -> Result<HttpResponse> {
        self.rest.send(self.build_login(data)?)
    }

    pub fn login(&self, data: &LoginCredentials) -> Result<Authenticated> {
        self.parse_login(self.login_raw(data)?)
    }

    pub fn logout_raw(&self, session: &Session) -> Result<HttpResponse> {
        self.rest.send(self.build_logout(session))
    }

    /// End the session on the current device.
    pub fn logout(&self, session: &Session) -> Result<()> {
        check_status(&self.logout_raw(session)?, 204)
    }

    pub fn logout_all_raw(&self, session: &Session) -> Result<HttpResponse> {
        self.rest.send(self.build_logout_all(session))
    }

    /// End every session of the user owning `session`.
    pub fn logout_all(&self, session: &Session) -> Result<()> {
        check_status(&self.logout_all_raw(session)?, 204)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<Authenticated> {
        check_status(&response, 200)?;
        let user = validate(&response, "UserEnvelope")?;
        let session = Session::from_response(&response).ok_or(ApiError::MissingAuthToken)?;
        Ok(Authenticated { session, user })
    }
}
