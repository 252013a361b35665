use std::{collections::BTreeMap, time::Duration};

use reqwest::{
    Client, Method, Request, Response, Url,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid URL {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not serialize request body: {0}")]
    Body(#[from] serde_json::Error),
}

/// Settings shared by every request sent through one [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    /// Prefixed to relative request targets.
    pub base_path: Option<String>,
    pub headers: HeaderMap,
}

impl Default for ClientOptions {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            timeout: DEFAULT_TIMEOUT,
            base_path: None,
            headers,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Sent verbatim.
    Bytes(Vec<u8>),
    /// Sent as raw text, never re-encoded as a JSON string.
    Text(String),
    /// Serialized to JSON text when the request is built. Strings go out as raw text.
    Json(Value),
}

/// Everything needed to build one outbound request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub url: String,
    pub method: Method,
    /// Replaces the client's default headers when non-empty.
    pub headers: HeaderMap,
    pub body: Body,
    pub query: BTreeMap<String, String>,
}

impl RequestSpec {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderMap::new(),
            body: Body::Empty,
            query: BTreeMap::new(),
        }
    }

    /// A POST request whose body is `payload` serialized as JSON.
    /// A plain string payload is sent as raw text instead.
    ///
    /// # Errors
    /// Fails if `payload` cannot be represented as JSON.
    pub fn json<T: Serialize>(url: impl Into<String>, payload: &T) -> Result<Self, RequestError> {
        let mut spec = Self::new(Method::POST, url);
        spec.body = match serde_json::to_value(payload)? {
            Value::String(text) => Body::Text(text),
            value => Body::Json(value),
        };
        Ok(spec)
    }
}

/// A built request, ready for [`HttpClient::send`].
#[derive(Debug)]
pub struct PreparedRequest(Request);

impl PreparedRequest {
    #[must_use]
    pub fn url(&self) -> &Url {
        self.0.url()
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        self.0.method()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.0.headers()
    }

    #[must_use]
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.0.body().and_then(reqwest::Body::as_bytes)
    }
}

/// Thin wrapper around one [`reqwest::Client`]. Clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    base_path: Option<String>,
    default_headers: HeaderMap,
}

impl HttpClient {
    /// Builds the underlying client. Meant to be called once at startup.
    ///
    /// # Errors
    /// Fails if the TLS backend cannot be initialized.
    pub fn new(options: ClientOptions) -> Result<Self, RequestError> {
        let inner = Client::builder()
            .timeout(options.timeout)
            .http1_only()
            .build()
            .map_err(RequestError::Client)?;
        Ok(Self {
            inner,
            base_path: options.base_path,
            default_headers: options.headers,
        })
    }

    /// # Errors
    /// Fails if the resulting URL is malformed or the body cannot be serialized.
    pub fn build(&self, spec: RequestSpec) -> Result<PreparedRequest, RequestError> {
        let url = compose_url(self.base_path.as_deref(), &spec.url);
        log::debug!("Generated URL: {url}");

        let headers = if spec.headers.is_empty() {
            self.default_headers.clone()
        } else {
            spec.headers
        };

        let mut builder = self.inner.request(spec.method, &url).headers(headers);
        if !spec.query.is_empty() {
            builder = builder.query(&spec.query);
        }
        builder = match spec.body {
            Body::Empty => builder,
            Body::Bytes(bytes) => builder.body(bytes),
            Body::Text(text) | Body::Json(Value::String(text)) => builder.body(text),
            Body::Json(value) => {
                let text = serde_json::to_string(&value)?;
                log::debug!("JSON request body: {text}");
                builder.body(text)
            }
        };

        let request = builder
            .build()
            .map_err(|source| RequestError::Url { url, source })?;
        Ok(PreparedRequest(request))
    }

    /// Sends the request once. There is no retry.
    ///
    /// # Errors
    /// Fails on transport errors and timeouts; non-success statuses are not errors here.
    pub async fn send(&self, request: PreparedRequest) -> reqwest::Result<Response> {
        self.inner.execute(request.0).await
    }
}

/// Joins a relative `target` onto `base_path`. Absolute targets are returned as-is.
fn compose_url(base_path: Option<&str>, target: &str) -> String {
    match base_path {
        Some(base) if !target.starts_with("http") => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            target.trim_start_matches('/')
        ),
        _ => target.to_owned(),
    }
}
