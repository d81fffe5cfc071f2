// ABOUTME: Wraps a job so it reports start, success and failure pings.
// ABOUTME: Misconfiguration turns the wrapper into a transparent passthrough.

use crate::config::{HealthcheckConfig, Signal, join_host_uuid};
use crate::diagnostics::try_encode_diagnostics;
use crate::http::{BlockingTransport, Transport, http_request};
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Ping URLs derived once from a valid base URL.
#[derive(Debug, Clone)]
struct SignalUrls {
    start: Url,
    success: Url,
    fail: Url,
}

impl SignalUrls {
    fn from_config(config: &HealthcheckConfig) -> Option<Self> {
        Some(Self {
            start: config.signal_url(Signal::Start)?,
            success: config.signal_url(Signal::Success)?,
            fail: config.signal_url(Signal::Fail)?,
        })
    }

    fn get(&self, signal: Signal) -> &Url {
        match signal {
            Signal::Start => &self.start,
            Signal::Success => &self.success,
            Signal::Fail => &self.fail,
        }
    }
}

/// A resolved health check bound to a transport.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct Healthcheck {
    config: HealthcheckConfig,
    urls: Option<SignalUrls>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Healthcheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Healthcheck")
            .field("config", &self.config)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Healthcheck {
    pub fn new(config: HealthcheckConfig, transport: Arc<dyn Transport>) -> Self {
        let urls = SignalUrls::from_config(&config);
        Self {
            config,
            urls,
            transport,
        }
    }

    /// Zero-configuration health check: every setting comes from the
    /// `HEALTHCHECK_*` environment variables or defaults.
    pub fn from_env() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HealthcheckBuilder {
        HealthcheckBuilder::default()
    }

    pub fn config(&self) -> &HealthcheckConfig {
        &self.config
    }

    /// Whether pings will be sent. False when the URL is missing or invalid.
    pub fn is_enabled(&self) -> bool {
        self.urls.is_some()
    }

    /// Send one lifecycle ping. Never fails; returns whether it was delivered.
    pub fn ping(&self, signal: Signal, body: Option<Bytes>) -> bool {
        let Some(urls) = &self.urls else {
            return false;
        };
        let url = urls.get(signal);
        tracing::debug!(%signal, %url, "sending health check ping");

        match http_request(self.transport.as_ref(), url.as_str(), self.config.timeout, body) {
            Ok(sent) => sent,
            Err(e) => {
                tracing::warn!(%signal, "health check ping not sent: {}", e);
                false
            }
        }
    }

    /// Wrap `target` so every call reports to the monitoring endpoint.
    ///
    /// With an invalid configuration the returned wrapper just calls
    /// `target`; a job never fails because its health check is misconfigured.
    pub fn wrap<F>(&self, target: F) -> Wrapped<F> {
        let healthcheck = if self.config.is_valid() {
            Some(self.clone())
        } else {
            tracing::warn!("Disabling healthcheck: invalid config");
            None
        };
        Wrapped {
            target,
            healthcheck,
        }
    }

    /// Run `job` once under the health check.
    ///
    /// Sends the start ping (if enabled), runs the job, then sends the
    /// success ping or the fail ping. Errors are returned unchanged and
    /// panics are resumed with their original payload after the fail ping.
    ///
    /// The success value can be any type, so no diagnostics body is sent;
    /// use [`run_with_diagnostics`](Self::run_with_diagnostics) for that.
    pub fn run<T, E, F>(&self, job: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.run_reporting(job, |_| {
            tracing::debug!("diagnostics requested but the job's result is not serializable");
            None
        })
    }

    /// Like [`run`](Self::run), but with `send_diagnostics` enabled the
    /// success value is form-encoded into the success ping body. Values that
    /// are not a map or a sequence of pairs are logged and sent without a body.
    pub fn run_with_diagnostics<T, E, F>(&self, job: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        T: Serialize,
    {
        self.run_reporting(job, try_encode_diagnostics::<T>)
    }

    fn run_reporting<T, E, F, D>(&self, job: F, diagnostics: D) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        D: FnOnce(&T) -> Option<Bytes>,
    {
        if !self.is_enabled() {
            return job();
        }

        if self.config.send_start {
            self.ping(Signal::Start, None);
        }

        match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(Ok(value)) => {
                let body = if self.config.send_diagnostics {
                    diagnostics(&value)
                } else {
                    None
                };
                self.ping(Signal::Success, body);
                Ok(value)
            }
            Ok(Err(e)) => {
                self.ping(Signal::Fail, None);
                Err(e)
            }
            Err(payload) => {
                self.ping(Signal::Fail, None);
                panic::resume_unwind(payload)
            }
        }
    }
}

/// Builder for [`Healthcheck`]. Unset fields fall back to the environment,
/// then to defaults, when [`build`](Self::build) is called.
#[derive(Default)]
pub struct HealthcheckBuilder {
    url: Option<String>,
    send_start: Option<bool>,
    send_diagnostics: Option<bool>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl HealthcheckBuilder {
    /// Ping URL, e.g. `https://hc-ping.com/<uuid>`.
    ///
    /// Pings go to the parsed, normalised form of this URL: the scheme and
    /// host are lower-cased and an empty path becomes `/`, so
    /// `https://HC-Ping.com` is pinged as `https://hc-ping.com/`.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Legacy addressing: ping host plus check uuid, joined into one URL.
    pub fn host_uuid(self, host: &str, uuid: &str) -> Self {
        self.url(join_host_uuid(host, uuid))
    }

    pub fn send_start(mut self, send_start: bool) -> Self {
        self.send_start = Some(send_start);
        self
    }

    pub fn send_diagnostics(mut self, send_diagnostics: bool) -> Self {
        self.send_diagnostics = Some(send_diagnostics);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn build(self) -> Healthcheck {
        let mut config =
            HealthcheckConfig::resolve(self.url, self.send_start, self.send_diagnostics);
        if let Some(timeout) = self.timeout {
            config = config.timeout(timeout);
        }
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(BlockingTransport));
        Healthcheck::new(config, transport)
    }
}

/// A callable job: any `Fn` taking its arguments as a tuple.
pub trait Job<Args> {
    type Output;

    fn invoke(&self, args: Args) -> Self::Output;
}

macro_rules! impl_job {
    ($($arg:ident),*) => {
        impl<Func, Out, $($arg),*> Job<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Out,
        {
            type Output = Out;

            #[allow(non_snake_case)]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> Out {
                self($($arg),*)
            }
        }
    };
}

impl_job!();
impl_job!(A1);
impl_job!(A1, A2);
impl_job!(A1, A2, A3);
impl_job!(A1, A2, A3, A4);

/// A job wrapped by [`Healthcheck::wrap`].
pub struct Wrapped<F> {
    target: F,
    healthcheck: Option<Healthcheck>,
}

impl<F> Wrapped<F> {
    /// Call the job with `args` as a tuple: `()` for no arguments,
    /// `(x,)` for one.
    pub fn call<Args, T, E>(&self, args: Args) -> Result<T, E>
    where
        F: Job<Args, Output = Result<T, E>>,
    {
        match &self.healthcheck {
            Some(healthcheck) => healthcheck.run(|| self.target.invoke(args)),
            None => self.target.invoke(args),
        }
    }

    /// Like [`call`](Self::call), but attaches the form-encoded success value
    /// to the success ping when `send_diagnostics` is enabled.
    pub fn call_with_diagnostics<Args, T, E>(&self, args: Args) -> Result<T, E>
    where
        F: Job<Args, Output = Result<T, E>>,
        T: Serialize,
    {
        match &self.healthcheck {
            Some(healthcheck) => healthcheck.run_with_diagnostics(|| self.target.invoke(args)),
            None => self.target.invoke(args),
        }
    }

    /// False when the wrapper is a passthrough because the config was invalid.
    pub fn is_monitored(&self) -> bool {
        self.healthcheck.is_some()
    }

    pub fn into_inner(self) -> F {
        self.target
    }
}
