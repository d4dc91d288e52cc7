//! HTTPS delivery of resolved credential pairs.
//!
//! One POST per resolved event, no retry. Any completed HTTP transaction
//! counts as delivered unless strict status checking is enabled.

use gatepass_core::{Config, CredentialPair, DeliveryOutcome, Endpoint};
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("failed to encode credential payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("endpoint returned status {0}")]
    Status(u16),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Strategy for delivering a credential pair to the remote system.
pub trait Deliver: Send + Sync + 'static {
    fn deliver(&self, credentials: &CredentialPair)
        -> impl Future<Output = DeliveryOutcome> + Send;
}

/// Encode the wire body: `{"person_id": ..., "person_code": ...}`.
pub fn encode_payload(credentials: &CredentialPair) -> Result<Vec<u8>, DeliveryError> {
    let body = json!({
        "person_id": credentials.identity_id,
        "person_code": credentials.access_code,
    });
    Ok(serde_json::to_vec(&body)?)
}

/// reqwest-backed delivery client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    http: reqwest::Client,
    endpoint: Endpoint,
    strict_status: bool,
}

impl DeliveryClient {
    /// Build a client with a whole-request timeout.
    pub fn new(
        endpoint: Endpoint,
        timeout: Duration,
        strict_status: bool,
    ) -> Result<Self, DeliveryError> {
        let http = Self::http_builder(timeout)
            .build()
            .map_err(DeliveryError::Client)?;
        Ok(Self::with_http_client(http, endpoint, strict_status))
    }

    /// Client settings every delivery depends on. Redirects are never
    /// followed: a 3xx completes the one POST, and no other host ever
    /// receives the credentials.
    pub fn http_builder(timeout: Duration) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
    }

    pub fn from_config(config: &Config) -> Result<Self, DeliveryError> {
        let client = Self::new(config.endpoint.clone(), config.timeout(), config.strict_status)?;
        tracing::info!(
            endpoint = %config.endpoint,
            timeout_secs = config.timeout_secs,
            strict_status = config.strict_status,
            "delivery client ready"
        );
        Ok(client)
    }

    /// Wrap an already configured `reqwest::Client`. Start from
    /// [`http_builder`](Self::http_builder) to keep redirects disabled.
    pub fn with_http_client(http: reqwest::Client, endpoint: Endpoint, strict_status: bool) -> Self {
        Self {
            http,
            endpoint,
            strict_status,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// POST the pair to `endpoint`, returning the response status.
    pub async fn try_deliver_to(
        &self,
        credentials: &CredentialPair,
        endpoint: &Endpoint,
    ) -> Result<u16, DeliveryError> {
        let body = encode_payload(credentials)?;

        let response = self
            .http
            .post(endpoint.url().clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(error_chain(&e)))?;

        // The body is never inspected.
        let status = response.status();
        if self.strict_status && !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }
        Ok(status.as_u16())
    }

    /// Deliver to an explicit endpoint, folding errors into the outcome.
    pub async fn deliver_to(
        &self,
        credentials: &CredentialPair,
        endpoint: &Endpoint,
    ) -> DeliveryOutcome {
        match self.try_deliver_to(credentials, endpoint).await {
            Ok(status) => {
                tracing::debug!(
                    identity_id = %credentials.identity_id,
                    status,
                    %endpoint,
                    "credentials sent"
                );
                DeliveryOutcome::Success { status }
            }
            Err(err) => {
                tracing::debug!(
                    identity_id = %credentials.identity_id,
                    error = %err,
                    %endpoint,
                    "credential delivery failed"
                );
                DeliveryOutcome::failure(err.to_string())
            }
        }
    }
}

impl Deliver for DeliveryClient {
    fn deliver(
        &self,
        credentials: &CredentialPair,
    ) -> impl Future<Output = DeliveryOutcome> + Send {
        self.deliver_to(credentials, &self.endpoint)
    }
}

/// Render an error with its full source chain, e.g.
/// `error sending request: client error (Connect): connection refused`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        source = cause.source();
    }
    out
}
