//! The request dispatcher.
//!
//! One dispatch = one authenticated blocking round trip. The dispatcher
//! owns protocol correctness: path normalization, method gating, request
//! construction, and response classification. It never retries and never
//! swallows a failure.

use crate::config::Pve2Config;
use crate::error::{Error, Result};
use crate::params::FormParams;
use crate::response::{ApiOutcome, RawResponse};
use crate::transport::{ApiRequest, Transport};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use url::Url;

/// Builds, sends and classifies one API request per call.
pub struct Dispatcher {
    transport: Box<dyn Transport>,
    credential: SecretString,
    base: String,
}

impl Dispatcher {
    /// Create a dispatcher for an already-validated configuration.
    ///
    /// Precomputes the credential header value; performs no network
    /// activity.
    #[must_use]
    pub fn new(config: &Pve2Config, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            credential: config.credential(),
            base: config.api_base(),
        }
    }

    /// Dispatch one API call.
    ///
    /// `params` is form-encoded into the body for PUT/POST and ignored for
    /// GET/DELETE. Methods outside those four fail before any request is
    /// built.
    ///
    /// Every dispatch logs the raw response wire image and the parsed
    /// pieces at `debug!` level for operator troubleshooting; the logging
    /// never drives control flow.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedMethod`] for a gated method,
    /// [`Error::Transport`] for network-level failures,
    /// [`Error::MalformedResponse`] when the response cannot be parsed, and
    /// [`Error::Rejected`] for a non-200 status.
    pub fn dispatch(
        &self,
        path: &str,
        method: Method,
        params: Option<&FormParams>,
    ) -> Result<ApiOutcome> {
        let path = normalize_path(path);

        let body = if method == Method::GET || method == Method::DELETE {
            None
        } else if method == Method::PUT || method == Method::POST {
            Some(params.map(FormParams::encode).unwrap_or_default())
        } else {
            return Err(Error::UnsupportedMethod(method.to_string()));
        };

        let url = Url::parse(&format!("{}{}", self.base, path))?;
        let request = ApiRequest {
            method: method.clone(),
            url,
            authorization: SecretString::from(self.credential.expose_secret().to_owned()),
            body,
        };

        info!(method = %request.method, url = %request.url, "sending PVE API request");
        let wire = self.transport.send(&request)?;

        debug!(raw = %String::from_utf8_lossy(&wire), "PVE API raw response");
        let response = RawResponse::from_wire(&wire)?;
        debug!(
            status = response.status,
            reason = %response.reason,
            headers = ?response.headers,
            body = %String::from_utf8_lossy(&response.body),
            decoded = ?response.decoded,
            "PVE API response parsed"
        );

        response.classify(&method)
    }
}

/// Normalize a resource path to carry a single leading separator.
/// Idempotent: an already-prefixed path passes through unchanged.
fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
