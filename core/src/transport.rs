//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! `Transport` is the blocking seam and `AsyncTransport` the non-blocking
//! one. Both perform exactly one HTTP exchange and hand back non-2xx
//! responses as data; classifying them is the response mappers' job.
//!
//! `HttpTransport` implements both: `ureq` for the blocking convention,
//! since it needs no runtime and can be called from inside one, and
//! `reqwest` for the async convention. Both follow redirects.

use std::fmt;
use std::future::Future;

use crate::error::{Result, UmamiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Blocking execution of a single request.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Non-blocking execution of a single request.
pub trait AsyncTransport {
    fn execute_async(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// The default transport, backed by the HTTP crates' own connection pools.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        HttpTransport {
            agent,
            client: reqwest::Client::new(),
        }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Both HTTP crates build on `http` 1.x, so they share this map type.
fn header_pairs(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn prepare<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for HttpTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let result = match request.method {
            HttpMethod::Get => prepare(self.agent.get(request.url.as_str()), request).call(),
            HttpMethod::Post => {
                let builder = prepare(self.agent.post(request.url.as_str()), request);
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| UmamiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = header_pairs(response.headers());
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| UmamiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl AsyncTransport for HttpTransport {
    async fn execute_async(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let mut builder = self.client.request(method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UmamiError::Transport(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let headers = header_pairs(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| UmamiError::Transport(e.without_url().to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
