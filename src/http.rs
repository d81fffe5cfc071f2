// ABOUTME: Best-effort HTTP ping primitive and the transport seam behind it.
// ABOUTME: Transport failures become `false`; only malformed endpoints are errors.

use crate::config::VALID_URL_SCHEMES;
use crate::error::{Error, Result};
use bytes::Bytes;
use snafu::{ResultExt, Snafu};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("healthping/", env!("CARGO_PKG_VERSION"));

/// Failure to deliver a ping, as reported by a [`Transport`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransportError {
    #[snafu(display("failed to build HTTP client: {source}"))]
    Client { source: reqwest::Error },

    #[snafu(display("request to {endpoint} failed: {source}"))]
    Request {
        endpoint: String,
        source: reqwest::Error,
    },

    #[snafu(display("{message}"))]
    Other { message: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure or TLS handshake failure.
    Connect,
    /// No response within the ping timeout.
    Timeout,
    /// Anything else.
    Other,
}

impl TransportError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            TransportError::Request { source, .. } if source.is_timeout() => {
                TransportErrorKind::Timeout
            }
            TransportError::Request { source, .. } if source.is_connect() => {
                TransportErrorKind::Connect
            }
            _ => TransportErrorKind::Other,
        }
    }
}

/// Sends a single ping to the monitoring endpoint.
///
/// Implementations send a `GET` when `body` is `None` and a form-encoded
/// `POST` otherwise. Any response counts as delivered; the status code is
/// not inspected.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        endpoint: &Url,
        timeout: Duration,
        body: Option<Bytes>,
    ) -> std::result::Result<(), TransportError>;
}

/// Blocking transport on top of reqwest with rustls.
///
/// Each ping runs on its own short-lived thread, so reqwest's internal
/// runtime never starts or drops inside the caller's async runtime. The
/// calling thread still waits for the ping to finish.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingTransport;

impl BlockingTransport {
    fn send_blocking(
        endpoint: &Url,
        timeout: Duration,
        body: Option<Bytes>,
    ) -> std::result::Result<(), TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context(ClientSnafu)?;

        let request = match body {
            Some(body) => client
                .post(endpoint.clone())
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(body.to_vec()),
            None => client.get(endpoint.clone()),
        };

        request.send().map(|_| ()).context(RequestSnafu {
            endpoint: endpoint.to_string(),
        })
    }
}

impl Transport for BlockingTransport {
    fn send(
        &self,
        endpoint: &Url,
        timeout: Duration,
        body: Option<Bytes>,
    ) -> std::result::Result<(), TransportError> {
        thread::scope(|s| {
            s.spawn(|| Self::send_blocking(endpoint, timeout, body))
                .join()
                .unwrap_or_else(|payload| {
                    Err(TransportError::Other {
                        message: format!("ping thread panicked: {}", panic_message(&*payload)),
                    })
                })
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Ping `endpoint`, swallowing transport failures.
///
/// Returns `Ok(true)` when a response arrived, `Ok(false)` when the request
/// could not be delivered. Endpoints that don't parse or don't use an
/// http/https scheme are errors: they indicate a bug in URL construction,
/// not a network condition.
pub fn http_request(
    transport: &dyn Transport,
    endpoint: &str,
    timeout: Duration,
    body: Option<Bytes>,
) -> Result<bool> {
    let url = Url::parse(endpoint).map_err(|source| Error::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        source,
    })?;

    if !VALID_URL_SCHEMES.contains(&url.scheme()) {
        return Err(Error::UnsupportedScheme {
            endpoint: endpoint.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    // A panicking transport counts as an undelivered ping.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| transport.send(&url, timeout, body)));

    match outcome {
        Ok(Ok(())) => {
            tracing::debug!(%url, "health check ping sent");
            Ok(true)
        }
        Ok(Err(e)) => {
            tracing::warn!(%url, kind = ?e.kind(), "health check ping failed: {}", e);
            Ok(false)
        }
        Err(payload) => {
            tracing::warn!(%url, "health check transport panicked: {}", panic_message(&*payload));
            Ok(false)
        }
    }
}
