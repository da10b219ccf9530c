//! The single configured HTTP client every façade goes through.
//!
//! # Design
//! `ApiClient` owns the base URL, a `Transport`, and the shared
//! `LoadingSignal`. Like the rest of the crate it is split into `build_*`
//! (produce an `HttpRequest`) and `parse_envelope` (consume an
//! `HttpResponse`); `execute` glues the two around a transport call.
//!
//! `execute` holds a `LoadingGuard` for the whole round trip, so the signal
//! is released on every exit path. The `*_with` variants take
//! `RequestOptions` for per-call headers, timeout and loading message; the
//! plain forms use the defaults. Failures are normalized into
//! `ApiError::{Server, Network, Request, Decode}`. The envelope's `code` is
//! not inspected here; that is left to the caller.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{BlogApi, ThumbApi, UserApi};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
use crate::loading::LoadingSignal;
use crate::types::ResponseEnvelope;

/// Per-call settings layered over the client's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Sent after the client's own headers.
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    /// Shown by the `LoadingSignal` while the call is in flight.
    pub loading_message: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn loading_message(mut self, message: impl Into<String>) -> Self {
        self.loading_message = Some(message.into());
        self
    }

    fn apply(&self, request: &mut HttpRequest) {
        request.headers.extend(self.headers.iter().cloned());
        if self.timeout.is_some() {
            request.timeout = self.timeout;
        }
    }
}

#[derive(Debug)]
pub struct ApiClient<T = UreqTransport> {
    base_url: String,
    transport: T,
    loading: LoadingSignal,
}

impl ApiClient<UreqTransport> {
    /// Client with the default `ureq` transport and a fresh loading signal.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            &config.base_url,
            UreqTransport::new(config.timeout()),
            LoadingSignal::new(),
        )
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(base_url: &str, transport: T, loading: LoadingSignal) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            loading,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn loading(&self) -> &LoadingSignal {
        &self.loading
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn blogs(&self) -> BlogApi<'_, T> {
        BlogApi::new(self)
    }

    pub fn users(&self) -> UserApi<'_, T> {
        UserApi::new(self)
    }

    pub fn thumbs(&self) -> ThumbApi<'_, T> {
        ThumbApi::new(self)
    }

    pub fn build_get(&self, path: &str, query: &[(&str, String)]) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{path}", self.base_url),
            query: query
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn build_post<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{path}", self.base_url),
            query: Vec::new(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
            timeout: None,
        })
    }

    /// Run `request` through the transport with the loading signal held.
    pub fn execute<D: DeserializeOwned>(&self, request: HttpRequest) -> Result<ResponseEnvelope<D>, ApiError> {
        self.execute_with(request, &RequestOptions::default())
    }

    pub fn execute_with<D: DeserializeOwned>(
        &self,
        mut request: HttpRequest,
        options: &RequestOptions,
    ) -> Result<ResponseEnvelope<D>, ApiError> {
        options.apply(&mut request);
        let _guard = self.loading.start(options.loading_message.as_deref());
        tracing::debug!(
            method = request.method.as_str(),
            path = %request.path,
            query = ?request.query,
            body = request.body.as_deref().unwrap_or(""),
            "sending request"
        );

        let response = self.transport.execute(&request).map_err(|e| match e {
            TransportError::NoResponse(detail) => {
                tracing::error!(path = %request.path, error = %detail, "no response from server");
                ApiError::Network { detail }
            }
            TransportError::Request(detail) => {
                tracing::error!(path = %request.path, error = %detail, "request could not be sent");
                ApiError::Request(detail)
            }
        })?;

        let envelope = parse_envelope::<D>(response);
        match &envelope {
            Ok(env) => tracing::debug!(path = %request.path, code = env.code, "response received"),
            Err(e) => tracing::error!(path = %request.path, error = %e, "request failed"),
        }
        envelope
    }

    pub fn get<D: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<ResponseEnvelope<D>, ApiError> {
        self.get_with(path, query, &RequestOptions::default())
    }

    pub fn get_with<D: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        options: &RequestOptions,
    ) -> Result<ResponseEnvelope<D>, ApiError> {
        self.execute_with(self.build_get(path, query), options)
    }

    pub fn post<D: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<ResponseEnvelope<D>, ApiError> {
        self.post_with(path, body, &RequestOptions::default())
    }

    pub fn post_with<D: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<ResponseEnvelope<D>, ApiError> {
        let request = self.build_post(path, body)?;
        self.execute_with(request, options)
    }

    pub fn parse_envelope<D: DeserializeOwned>(&self, response: HttpResponse) -> Result<ResponseEnvelope<D>, ApiError> {
        parse_envelope(response)
    }
}

/// Map a raw response to an envelope, or to `ApiError::Server` for non-2xx
/// statuses.
pub fn parse_envelope<D: DeserializeOwned>(response: HttpResponse) -> Result<ResponseEnvelope<D>, ApiError> {
    if !response.is_success() {
        return Err(server_error(response));
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn server_error(response: HttpResponse) -> ApiError {
    let data = if response.body.trim().is_empty() {
        None
    } else {
        Some(
            serde_json::from_str(&response.body)
                .unwrap_or_else(|_| serde_json::Value::String(response.body.clone())),
        )
    };
    let message = data
        .as_ref()
        .and_then(|body| body.get("message"))
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .unwrap_or("unknown")
        .to_string();
    ApiError::Server {
        status: response.status,
        message,
        data,
    }
}
