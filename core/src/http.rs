//! HTTP transport types and the blocking transport that executes them.
//!
//! # Design
//! Requests and responses are plain data. API clients build `HttpRequest`
//! values and parse `HttpResponse` values; only a `Transport` touches the
//! network. Tests swap in scripted transports to drive the poll loop without
//! a mail server.

use std::fmt;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `path` is relative to the host of the `RestClient` that sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Attach a JSON body and the matching content type.
    pub fn with_json<T: serde::Serialize>(mut self, payload: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        self.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        self.body = Some(body);
        Ok(self)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup. The last occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Render the request as a `curl` command line for debugging.
    pub fn to_curl(&self, url: &str) -> String {
        let mut parts = vec![format!("curl -X {}", self.method)];
        for (name, value) in &self.headers {
            parts.push(format!("-H '{name}: {value}'"));
        }
        if let Some(body) = &self.body {
            parts.push(format!("-d '{}'", body.replace('\'', r"'\''")));
        }
        parts.push(format!("'{url}{}'", encode_query(&self.query)));
        parts.join(" ")
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Decode the body as JSON, treating anything undecodable as `{}`.
    pub fn json_or_empty(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .rev()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn encode_query(query: &[(String, String)]) -> String {
    if query.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("?{}", pairs.join("&"))
}

/// Executes a fully addressed request. `url` already includes the host.
pub trait Transport: Send + Sync {
    fn execute(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by `ureq`.
///
/// Status codes are never turned into errors here; interpreting them is the
/// job of `RestClient` and the `parse_*` methods.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.query_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

impl Transport for UreqTransport {
    fn execute(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = &self.agent;
        let body = request.body.as_deref();

        let result = match (request.method, body) {
            (HttpMethod::Get, _) => decorate(agent.get(url), request).call(),
            (HttpMethod::Delete, _) => decorate(agent.delete(url), request).call(),
            (HttpMethod::Post, Some(body)) => decorate(agent.post(url), request).send(body.as_bytes()),
            (HttpMethod::Post, None) => decorate(agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => decorate(agent.put(url), request).send(body.as_bytes()),
            (HttpMethod::Put, None) => decorate(agent.put(url), request).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}
