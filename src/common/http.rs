use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Error, StatusCode, header::HeaderMap};

use crate::{common::errors::TransportError, configs::HttpConfig};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";

pub struct HttpClient;

impl HttpClient {
    pub fn default_user_agent() -> String {
        DEFAULT_USER_AGENT.to_string()
    }

    pub fn new(config: &HttpConfig) -> Result<Client, Error> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent);

        Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
    }
}

/// Response of a `GET` or `HEAD` request. `body` is empty for `HEAD`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parsed `Content-Length` header, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    }
}

/// The network seam of the crate. Every page fetch, size probe and range
/// request goes through it, so tests can swap in a deterministic fake.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
    async fn head(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, Error> {
        Ok(Self::new(HttpClient::new(config)?))
    }

    fn classify(url: &str, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
            }
        } else {
            TransportError::Connection {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let res = self
            .client
            .get(url)
            .header("Accept", "*/*")
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Self::classify(url, e)
            } else {
                TransportError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn head(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let res = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        Ok(HttpResponse {
            status: res.status(),
            headers: res.headers().clone(),
            body: Bytes::new(),
        })
    }
}

/// GET `url` and insist on a success status.
pub async fn fetch_ok(transport: &dyn Transport, url: &str) -> Result<Bytes, TransportError> {
    let res = transport.get(url).await?;
    if !res.status.is_success() {
        return Err(TransportError::Status {
            url: url.to_string(),
            status: res.status,
        });
    }
    Ok(res.body)
}
