// ABOUTME: Library root for healthping - dead-man's-switch pings around jobs.
// ABOUTME: Re-exports the config resolver, HTTP primitive and call wrapper.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod wrap;

pub use config::{HealthcheckConfig, InvalidConfig, Signal};
pub use diagnostics::{DiagnosticsError, encode_diagnostics};
pub use error::{Error, Result};
pub use http::{BlockingTransport, Transport, TransportError, TransportErrorKind, http_request};
pub use wrap::{Healthcheck, HealthcheckBuilder, Job, Wrapped};
