use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::core::config::ResolvedConfig;

/// Why a single transfer failed. Never fatal: the worker records a failed slot.
#[derive(Debug)]
pub enum TransferError {
    /// The typed text is not a URL the engine can fetch.
    InvalidUrl(String),
    /// DNS, connect, TLS or mid-body failure.
    Network(String),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::InvalidUrl(msg) => write!(f, "invalid URL: {msg}"),
            TransferError::Network(msg) => write!(f, "network error: {msg}"),
        }
    }
}

impl std::error::Error for TransferError {}

/// The engine that performs one transfer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the name of the transport.
    fn name(&self) -> &str;

    /// Fetch `url`, appending each received chunk of the body to `sink`.
    async fn fetch(&self, url: &str, sink: &mut Vec<u8>) -> Result<(), TransferError>;
}

/// Prefix `http://` when the text has no scheme, the way curl treats a bare host.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// HTTP(S) transport backed by reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ResolvedConfig) -> Result<Self, TransferError> {
        Self::build(&config.user_agent, config.connect_timeout)
    }

    pub fn build(user_agent: &str, connect_timeout: Option<Duration>) -> Result<Self, TransferError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransferError::Network(format!("client setup failed: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str, sink: &mut Vec<u8>) -> Result<(), TransferError> {
        let url = normalize_url(url);
        let parsed =
            reqwest::Url::parse(&url).map_err(|e| TransferError::InvalidUrl(format!("{url}: {e}")))?;

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        let status = response.status();
        debug!("{} response status: {}", url, status);
        if !status.is_success() {
            // The body is still the response; keep it like any other.
            warn!("{} answered with HTTP {}", url, status.as_u16());
        }

        let mut chunk_count = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?
        {
            chunk_count += 1;
            debug!("Chunk received: {} bytes", chunk.len());
            sink.extend_from_slice(&chunk);
        }

        info!(
            "Fetched {}: {} bytes in {} chunks",
            url,
            sink.len(),
            chunk_count
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_scheme_to_bare_host() {
        assert_eq!(normalize_url("example.com"), "http://example.com");
        assert_eq!(normalize_url("  example.com/a  "), "http://example.com/a");
    }

    #[test]
    fn test_normalize_keeps_existing_scheme() {
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("ftp://x"), "ftp://x");
    }

    #[tokio::test]
    async fn test_empty_input_is_invalid_url() {
        let transport = HttpTransport::build("test", None).unwrap();
        let mut sink = Vec::new();
        let err = transport.fetch("", &mut sink).await.unwrap_err();
        assert!(matches!(err, TransferError::InvalidUrl(_)));
        assert!(sink.is_empty());
    }
}
