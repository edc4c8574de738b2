//! Executes `HttpRequest` values against the network.
//!
//! The rest of the crate only builds and parses plain data; this is the one
//! place that does I/O. `UreqTransport` is blocking and returns 4xx/5xx
//! responses as data so the client can interpret the status itself.

use tracing::debug;

use crate::error::ApiError;
use crate::http::{CacheMode, HttpMethod, HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[derive(Debug)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
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

impl Transport for UreqTransport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut headers = request.headers;
        if request.cache == CacheMode::NoStore {
            headers.push(("cache-control".to_string(), "no-store".to_string()));
        }
        let url = request.url.as_str();

        let result = match (request.method, request.body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), &headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), &headers).call(),
            (HttpMethod::Post, Some(body)) => with_headers(self.agent.post(url), &headers).send(body.as_bytes()),
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(self.agent.put(url), &headers).send(body.as_bytes()),
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), &headers).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        debug!(status, url, "response received");
        Ok(HttpResponse { status, headers, body })
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
