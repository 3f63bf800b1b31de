//! Client for the MailHog v2 message listing.

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::models::Mailbox;
use crate::rest::{check_status, validate, RestClient};

const V2_MESSAGES: &str = "/api/v2/messages";

/// Default page size of a listing.
pub const DEFAULT_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct MailhogApi {
    rest: RestClient,
}

impl MailhogApi {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn build_list_messages(&self, limit: u32) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, V2_MESSAGES).with_query("limit", limit)
    }

    pub fn list_messages_raw(&self, limit: u32) -> Result<HttpResponse> {
        self.rest.send(self.build_list_messages(limit))
    }

    pub fn list_messages(&self, limit: u32) -> Result<Mailbox> {
        self.parse_list_messages(self.list_messages_raw(limit)?)
    }

    pub fn parse_list_messages(&self, response: HttpResponse) -> Result<Mailbox> {
        check_status(&response, 200)?;
        validate(&response, "Mailbox")
    }
}
