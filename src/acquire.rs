//! # Network Acquisition
//!
//! This module obtains the raw payload bytes from the remote data source.
//! The transport is a trait so the cycle controller can run against a mock
//! on a development host; the real implementation uses `reqwest` over
//! rustls.
//!
//! Layering: this module performs exactly one request per `fetch` call and
//! never retries. The bounded retry budget (and its backoff) belongs to the
//! cycle controller, which re-invokes `fetch` a configured number of times.
//!
//! `connect` is the link-establishment step. On the original battery
//! hardware that is joining the WiFi network; on a hosted build it is
//! constructing the TLS-capable HTTP client, which is the first point where
//! link setup can fail.

use crate::config::SourceConfig;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Link establishment failed; the cycle cannot reach the network at all.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("WiFi failed")]
pub struct ConnectError;

/// A request went out on an established link but produced no usable body.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AcquireError {
    /// The server answered with a non-success status code
    #[error("HTTP {0}")]
    Status(u16),
    /// Timeout, connection reset, TLS failure, or any other link-level error
    #[error("HTTP transport error")]
    Transport,
}

/// The network collaborator: establish a link once, then fetch byte bodies.
///
/// `fetch` returns the full response body as opaque bytes; content
/// validation belongs to the payload decoder.
pub trait Transport {
    /// Establish the link. Called exactly once per cycle, before any fetch.
    fn connect(&mut self) -> Result<(), ConnectError>;

    /// Issue a single GET request and return the whole body.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, AcquireError>> + Send;
}

/// Production transport backed by `reqwest`.
///
/// The client is built in `connect` so that TLS/client construction failures
/// surface as the link-establishment failure they are, and `fetch` can take
/// `&self`.
pub struct HttpTransport {
    timeout: Duration,
    max_redirects: usize,
    client: Option<reqwest::Client>,
}

impl HttpTransport {
    pub fn new(source: &SourceConfig) -> Self {
        HttpTransport {
            timeout: Duration::from_secs(source.timeout_secs),
            max_redirects: source.max_redirects,
            client: None,
        }
    }
}

impl Transport for HttpTransport {
    fn connect(&mut self) -> Result<(), ConnectError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects))
            .build()
            .map_err(|e| {
                log::error!("building HTTP client failed: {e}");
                ConnectError
            })?;
        self.client = Some(client);
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AcquireError> {
        // connect() ran first in the cycle sequence; a missing client means
        // the link was never established.
        let client = self.client.as_ref().ok_or(AcquireError::Transport)?;

        let response = client.get(url).send().await.map_err(|e| {
            log::warn!("request failed: {e}");
            AcquireError::Transport
        })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("server answered {status}");
            return Err(AcquireError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            log::warn!("reading response body failed: {e}");
            AcquireError::Transport
        })?;

        log::debug!("fetched {} bytes", body.len());
        Ok(body.to_vec())
    }
}
