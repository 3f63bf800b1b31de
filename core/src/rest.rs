//! Host-bound REST wrapper around a `Transport`.
//!
//! Joins the configured host with each request's relative path, merges the
//! client's default headers, logs the exchange and optionally rejects non-2xx
//! responses.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};

#[derive(Clone)]
pub struct RestClient {
    host: String,
    default_headers: Vec<(String, String)>,
    transport: Arc<dyn Transport>,
    log_enabled: bool,
    raise_for_status: bool,
}

impl RestClient {
    /// A client using the blocking `ureq` transport, logging on, strict off.
    pub fn new(host: &str) -> Self {
        Self::with_transport(host, Arc::new(UreqTransport::new()))
    }

    pub fn with_transport(host: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            default_headers: Vec::new(),
            transport,
            log_enabled: true,
            raise_for_status: false,
        }
    }

    pub fn default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn log_enabled(mut self, enabled: bool) -> Self {
        self.log_enabled = enabled;
        self
    }

    /// Turn every non-2xx response into `ApiError::HttpError`.
    pub fn raise_for_status(mut self, raise: bool) -> Self {
        self.raise_for_status = raise;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.host, path.trim_start_matches('/'))
    }

    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request = self.merge_headers(request);
        let url = self.url(&request.path);
        let event_id = Uuid::new_v4().to_string();

        if self.log_enabled {
            info!(
                service = "api",
                event_id = %event_id,
                method = %request.method,
                full_url = %url,
                params = ?request.query,
                headers = ?request.headers,
                json = request.body.as_deref().unwrap_or(""),
                "Request"
            );
            debug!(event_id = %event_id, curl = %request.to_curl(&url), "curl");
        }

        let response = self.transport.execute(&url, &request)?;

        if self.log_enabled {
            info!(
                service = "api",
                event_id = %event_id,
                status_code = response.status,
                headers = ?response.headers,
                json = %response.json_or_empty(),
                "Response"
            );
        }

        if self.raise_for_status && !response.is_success() {
            return Err(ApiError::HttpError {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response)
    }

    /// Defaults first, then per-request headers; a per-request header
    /// replaces a default of the same name.
    fn merge_headers(&self, mut request: HttpRequest) -> HttpRequest {
        let mut headers: Vec<(String, String)> = self
            .default_headers
            .iter()
            .filter(|(name, _)| request.header(name).is_none())
            .cloned()
            .collect();
        headers.append(&mut request.headers);
        request.headers = headers;
        request
    }
}

/// Map any status other than `expected` to `ApiError::HttpError`.
pub fn check_status(response: &HttpResponse, expected: u16) -> Result<()> {
    if response.status == expected {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Validate a response body against `T`, keeping the payload for diagnosis.
pub fn validate<T: DeserializeOwned>(response: &HttpResponse, schema: &'static str) -> Result<T> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Validation {
        schema,
        message: e.to_string(),
        payload: response.body.clone(),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport shared by the unit tests of the API clients.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<HttpResponse>>>,
        pub seen: Mutex<Vec<(String, HttpRequest)>>,
    }

    impl ScriptedTransport {
        pub fn new(responses: Vec<Result<HttpResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse> {
            self.seen
                .lock()
                .unwrap()
                .push((url.to_string(), request.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("script exhausted".to_string())))
        }
    }

    pub fn response(status: u16, body: &str) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }
}
