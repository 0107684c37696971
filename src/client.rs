//! HTTP transport shared by cursors and media downloads
//!
//! [`FeedClient`] wraps a [`reqwest::Client`] configured with the browser-like
//! headers the remote service expects. It is cheap to clone and safe to share
//! between any number of cursors and sessions.

use crate::config::Config;
use crate::error::{Error, Result, TransportError};
use flate2::read::ZlibDecoder;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_ENCODING, HeaderMap, HeaderValue};
use serde_json::Value;
use std::io::Read;
use tracing::debug;
use url::Url;

/// Accept header used when a request does not set its own
const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml,*/*;q=0.8";

/// HTTP client for feed and media requests
#[derive(Clone, Debug)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: Url,
    config: Config,
}

impl FeedClient {
    /// Create a client from configuration
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", config.base_url, e),
            key: Some("base_url".to_string()),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        let language = HeaderValue::from_str(&config.accept_language).map_err(|e| Error::Config {
            message: format!("invalid Accept-Language value: {}", e),
            key: Some("accept_language".to_string()),
        })?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config {
                message: format!("Failed to create HTTP client: {}", e),
                key: None,
            })?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    /// Configuration this client was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build an absolute URL for `path` on the configured host
    ///
    /// Query parameters are appended in the given order.
    pub fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| Error::url("Unable to create request URL", path, e))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// GET `url` and decode the response body as JSON
    ///
    /// `headers` are sent in addition to (and take precedence over) the
    /// client's defaults.
    ///
    /// # Errors
    /// Returns [`Error::Url`] for network failures, non-success statuses,
    /// corrupt compressed bodies and invalid JSON.
    pub async fn get_json(&self, url: &Url, headers: HeaderMap) -> Result<Value> {
        let body = self.fetch(url, headers).await?;
        serde_json::from_slice(&body)
            .map_err(|e| Error::url("Failed to decode JSON response", url.as_str(), e))
    }

    /// GET `url` and return the whole (decompressed) body
    ///
    /// # Errors
    /// Returns [`Error::Url`] if the URL is invalid or the request fails.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(url).map_err(|e| Error::url("Unable to create request URL", url, e))?;
        self.fetch(&url, HeaderMap::new()).await
    }

    async fn fetch(&self, url: &Url, headers: HeaderMap) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                Error::url(
                    "Failed to execute HTTP request",
                    url.as_str(),
                    TransportError::Network(e),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::url(
                "HTTP error",
                url.as_str(),
                TransportError::Status {
                    code: status.as_u16(),
                },
            ));
        }

        // The service labels zlib-framed bodies as "deflate" regardless of what
        // the request accepted.
        let zlib = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("deflate"));

        let body = response.bytes().await.map_err(|e| {
            Error::url(
                "Failed to read response body",
                url.as_str(),
                TransportError::Body(e),
            )
        })?;
        debug!(url = %url, bytes = body.len(), zlib, "Fetched response body");

        if zlib {
            inflate(&body).map_err(|e| {
                Error::url(
                    "Corrupt ZLIB stream",
                    url.as_str(),
                    TransportError::Decompress(e),
                )
            })
        } else {
            Ok(body.to_vec())
        }
    }
}

fn inflate(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(compressed).read_to_end(&mut out)?;
    Ok(out)
}
