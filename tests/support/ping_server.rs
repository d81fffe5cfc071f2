// ABOUTME: Local HTTP server that records incoming health check pings.
// ABOUTME: Runs hyper on a background tokio runtime bound to an ephemeral port.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, mpsc};
use tokio::net::TcpListener;

/// A request as seen by the monitoring endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPing {
    pub method: String,
    pub path_and_query: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

pub struct PingServer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedPing>>>,
}

impl PingServer {
    pub fn start() -> Self {
        Self::with_status(StatusCode::OK)
    }

    /// Start a server that answers every ping with `status`.
    pub fn with_status(status: StatusCode) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let (addr_tx, addr_rx) = mpsc::channel();
        let log = received.clone();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                addr_tx.send(listener.local_addr().unwrap()).unwrap();

                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        continue;
                    };
                    let log = log.clone();
                    tokio::spawn(async move {
                        let service = service_fn(move |req| record(req, log.clone(), status));
                        if let Err(e) = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await
                        {
                            tracing::warn!("ping server connection error: {}", e);
                        }
                    });
                }
            });
        });

        let addr = addr_rx.recv().unwrap();
        Self { addr, received }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn received(&self) -> Vec<ReceivedPing> {
        self.received.lock().unwrap().clone()
    }
}

async fn record(
    req: Request<Incoming>,
    log: Arc<Mutex<Vec<ReceivedPing>>>,
    status: StatusCode,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().to_string();
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_default();
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };

    log.lock().unwrap().push(ReceivedPing {
        method,
        path_and_query,
        content_type,
        body,
    });

    let mut resp = Response::new(Full::new(Bytes::from_static(b"OK")));
    *resp.status_mut() = status;
    Ok(resp)
}

/// An address nothing is listening on.
pub fn closed_port_url(path: &str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}{}", addr, path)
}
