//! Delivery endpoint URL.

use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EndpointError {
    #[error("malformed endpoint URL {url:?}: {reason}")]
    Malformed { url: String, reason: String },
    #[error("endpoint must use https, got {0:?} (set allow_insecure_http for local testing)")]
    InsecureScheme(String),
    #[error("endpoint URL has no host: {0:?}")]
    MissingHost(String),
}

/// A validated delivery target. Always `https` unless insecure HTTP was
/// explicitly allowed at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    pub fn parse(raw: &str, allow_insecure_http: bool) -> Result<Self, EndpointError> {
        let url = Url::parse(raw.trim()).map_err(|e| EndpointError::Malformed {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "https" => {}
            "http" if allow_insecure_http => {
                tracing::warn!(url = %url, "plain HTTP endpoint allowed; credentials travel unencrypted");
            }
            other => return Err(EndpointError::InsecureScheme(other.to_string())),
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(EndpointError::MissingHost(raw.to_string()));
        }

        Ok(Self(url))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
