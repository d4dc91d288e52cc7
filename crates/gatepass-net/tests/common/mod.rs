//! In-process HTTP endpoints for delivery tests.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use gatepass_core::Endpoint;
use gatepass_net::DeliveryClient;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A request as seen by the mock endpoint.
#[derive(Debug)]
pub struct Received {
    pub path: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Received {
    fn new(uri: &Uri, headers: &HeaderMap, body: Bytes) -> Self {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Self {
            path: uri.path().to_string(),
            content_type,
            body,
        }
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

pub struct MockEndpoint {
    pub addr: SocketAddr,
    pub received: mpsc::UnboundedReceiver<Received>,
}

impl MockEndpoint {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::parse(&format!("http://{}/update_color", self.addr), true).unwrap()
    }
}

/// Start an endpoint that answers every POST to `/update_color` with
/// `status` after `delay`.
pub async fn start_mock_endpoint(status: StatusCode, delay: Option<Duration>) -> MockEndpoint {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().route(
        "/update_color",
        post(move |uri: Uri, headers: HeaderMap, body: Bytes| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let _ = tx.send(Received::new(&uri, &headers, body));
            status
        }),
    );
    serve(app, rx).await
}

/// Start an endpoint whose `/update_color` answers `307` pointing at
/// `/elsewhere`, which answers `200`. Both record what they receive.
pub async fn start_redirecting_endpoint() -> MockEndpoint {
    let (tx, rx) = mpsc::unbounded_channel();
    let redirect_tx = tx.clone();
    let app = Router::new()
        .route(
            "/update_color",
            post(move |uri: Uri, headers: HeaderMap, body: Bytes| async move {
                let _ = redirect_tx.send(Received::new(&uri, &headers, body));
                (
                    StatusCode::TEMPORARY_REDIRECT,
                    [(header::LOCATION, "/elsewhere")],
                )
                    .into_response()
            }),
        )
        .route(
            "/elsewhere",
            post(move |uri: Uri, headers: HeaderMap, body: Bytes| async move {
                let _ = tx.send(Received::new(&uri, &headers, body));
                StatusCode::OK
            }),
        );
    serve(app, rx).await
}

async fn serve(app: Router, received: mpsc::UnboundedReceiver<Received>) -> MockEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    MockEndpoint { addr, received }
}

/// An endpoint on a port nothing listens on.
pub async fn refusing_endpoint() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Endpoint::parse(&format!("http://{addr}/update_color"), true).unwrap()
}

/// Delivery client with the production settings, minus any system proxy.
pub fn client(endpoint: Endpoint, timeout: Duration, strict_status: bool) -> DeliveryClient {
    let http = DeliveryClient::http_builder(timeout)
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();
    DeliveryClient::with_http_client(http, endpoint, strict_status)
}
