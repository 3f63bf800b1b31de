//! Client for the `/v1/account` endpoints.
//!
//! # Design
//! Every endpoint is split into a pure `build_*` method producing an
//! `HttpRequest` and an executing method. Endpoints with a typed body come in
//! two flavours: `name()` checks the status and validates the envelope,
//! `name_raw()` hands back the untouched `HttpResponse` for negative tests.

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::models::{ChangeEmail, ChangePassword, Registration, ResetPassword, UserDetailsEnvelope, UserEnvelope};
use crate::rest::{check_status, validate, RestClient};
use crate::session::Session;

const V1_ACCOUNT: &str = "/v1/account";

#[derive(Clone)]
pub struct AccountApi {
    rest: RestClient,
}

impl AccountApi {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn build_register(&self, data: &Registration) -> Result<HttpRequest> {
        HttpRequest::new(HttpMethod::Post, V1_ACCOUNT).with_json(data)
    }

    pub fn build_activate(&self, token: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Put, format!("{V1_ACCOUNT}/{token}")).with_header("accept", "text/plain")
    }

    pub fn build_get_account(&self, session: Option<&Session>) -> HttpRequest {
        let request = HttpRequest::new(HttpMethod::Get, V1_ACCOUNT);
        match session {
            Some(session) => session.authorize(request),
            None => request,
        }
    }

    pub fn build_request_password_reset(&self, data: &ResetPassword) -> Result<HttpRequest> {
        HttpRequest::new(HttpMethod::Post, format!("{V1_ACCOUNT}/password")).with_json(data)
    }

    pub fn build_change_password(&self, data: &ChangePassword, session: Option<&Session>) -> Result<HttpRequest> {
        let request = HttpRequest::new(HttpMethod::Put, format!("{V1_ACCOUNT}/password")).with_json(data)?;
        Ok(match session {
            Some(session) => session.authorize(request),
            None => request,
        })
    }

    pub fn build_change_email(&self, data: &ChangeEmail) -> Result<HttpRequest> {
        HttpRequest::new(HttpMethod::Put, format!("{V1_ACCOUNT}/email")).with_json(data)
    }

    pub fn register_raw(&self, data: &Registration) -> Result<HttpResponse> {
        self.rest.send(self.build_register(data)?)
    }

    /// `POST /v1/account`; the service answers 201 with an empty body.
    pub fn register(&self, data: &Registration) -> Result<()> {
        let response = self.register_raw(data)?;
        check_status(&response, 201)
    }

    pub fn activate_raw(&self, token: &str) -> Result<HttpResponse> {
        self.rest.send(self.build_activate(token))
    }

    pub fn activate(&self, token: &str) -> Result<UserEnvelope> {
        self.parse_user_envelope(self.activate_raw(token)?, 200)
    }

    pub fn get_account_raw(&self, session: Option<&Session>) -> Result<HttpResponse> {
        self.rest.send(self.build_get_account(session))
    }

    pub fn get_account(&self, session: &Session) -> Result<UserDetailsEnvelope> {
        let response = self.get_account_raw(Some(session))?;
        self.parse_get_account(response)
    }

    pub fn request_password_reset_raw(&self, data: &ResetPassword) -> Result<HttpResponse> {
        self.rest.send(self.build_request_password_reset(data)?)
    }

    pub fn request_password_reset(&self, data: &ResetPassword) -> Result<UserEnvelope> {
        self.parse_user_envelope(self.request_password_reset_raw(data)?, 201)
    }

    pub fn change_password_raw(&self, data: &ChangePassword, session: Option<&Session>) -> Result<HttpResponse> {
        self.rest.send(self.build_change_password(data, session)?)
    }

    pub fn change_password(&self, data: &ChangePassword, session: Option<&Session>) -> Result<UserEnvelope> {
        self.parse_user_envelope(self.change_password_raw(data, session)?, 200)
    }

    pub fn change_email_raw(&self, data: &ChangeEmail) -> Result<HttpResponse> {
        self.rest.send(self.build_change_email(data)?)
    }

    pub fn change_email(&self, data: &ChangeEmail) -> Result<UserEnvelope> {
        self.parse_user_envelope(self.change_email_raw(data)?, 200)
    }

    pub fn parse_user_envelope(&self, response: HttpResponse, expected: u16) -> Result<UserEnvelope> {
        check_status(&response, expected)?;
        validate(&response, "UserEnvelope")
    }

    pub fn parse_get_account(&self, response: HttpResponse) -> Result<UserDetailsEnvelope> {
        check_status(&response, 200)?;
        validate(&response, "UserDetailsEnvelope")
    }
}
