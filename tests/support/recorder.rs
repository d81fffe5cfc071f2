// ABOUTME: In-memory transport that records every ping instead of sending it.
// ABOUTME: Can be switched to fail to simulate an unreachable endpoint.

use bytes::Bytes;
use healthping::{Transport, TransportError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPing {
    pub url: String,
    pub body: Option<Bytes>,
    pub timeout: Duration,
}

#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentPing>>>,
    unreachable: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records pings but reports every one of them as undeliverable.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentPing> {
        self.sent.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.sent().into_iter().map(|p| p.url).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Transport for RecordingTransport {
    fn send(
        &self,
        endpoint: &Url,
        timeout: Duration,
        body: Option<Bytes>,
    ) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(SentPing {
            url: endpoint.to_string(),
            body,
            timeout,
        });
        if self.unreachable {
            return Err(TransportError::Other {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}
