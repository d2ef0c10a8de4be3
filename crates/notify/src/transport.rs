//! HTTP transport for outbound notifications.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

use crate::config::ProxyConfig;
use crate::error::NotifyError;

/// Content type of the attachments form body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// A fully assembled POST request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub url: Url,
    pub body: RequestBody,
}

/// Body of an outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// Form-encoded body, already serialized.
    Form(String),
    /// File contents streamed with chunked transfer encoding.
    File(PathBuf),
}

/// Status and body returned by the messaging API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Only captured when the server declares a positive content length.
    pub body: Option<String>,
}

impl Response {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Performs exactly one POST per call. No retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: OutboundRequest) -> Result<Response, NotifyError>;
}

/// [`Transport`] backed by a `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client, routing through the proxy when one is configured.
    pub fn new(proxy: &ProxyConfig) -> Result<Self, NotifyError> {
        let mut builder = reqwest::Client::builder();

        if let Some(proxy_url) = proxy.url() {
            let mut http_proxy = reqwest::Proxy::all(proxy_url.as_str())?;
            if let Some((username, password)) = proxy.credentials() {
                http_proxy = http_proxy.basic_auth(username, password);
            }
            debug!(proxy = %proxy_url, "Routing notifications through proxy");
            builder = builder.proxy(http_proxy);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, request: OutboundRequest) -> Result<Response, NotifyError> {
        let builder = self.client.post(request.url);

        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(form) => builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(form),
            RequestBody::File(path) => {
                let file = tokio::fs::File::open(&path).await?;
                builder.body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();

        let body = if response.content_length().is_some_and(|len| len > 0) {
            Some(response.text().await?)
        } else {
            None
        };

        Ok(Response { status, body })
    }
}
