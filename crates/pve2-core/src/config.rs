//! Connection configuration for the PVE API client.
//!
//! A [`Pve2Config`] is the connection identity of one cluster node: where
//! it lives, who we are, and the API token that proves it. Validation runs
//! once, at client construction, and the fields are treated as immutable
//! afterwards.

use crate::error::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::net::{IpAddr, ToSocketAddrs};
use validator::Validate;

/// Default API port of a PVE cluster node.
pub const DEFAULT_PORT: u32 = 8006;

/// Connection identity for one PVE cluster node.
///
/// The token secret lives in a [`SecretString`] so it never shows up in
/// `Debug` output or logs; the only place it is exposed is when the
/// credential header value is composed.
#[derive(Debug, Deserialize, Validate)]
pub struct Pve2Config {
    /// Hostname or literal IP address of the cluster node.
    #[validate(length(min = 1, message = "host must not be empty"))]
    pub host: String,

    /// User the API token belongs to.
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub username: String,

    /// Authentication realm (`pam`, `pve`, ...).
    #[validate(length(min = 1, message = "realm must not be empty"))]
    pub realm: String,

    /// API token identifier.
    #[validate(length(min = 1, message = "token_id must not be empty"))]
    pub token_id: String,

    /// API token secret.
    pub token_secret: SecretString,

    /// API port.
    #[validate(range(min = 1, max = 65535, message = "port must be between 1 and 65535"))]
    #[serde(default = "default_port")]
    pub port: u32,

    /// Whether to verify the peer TLS certificate. Disabling this skips
    /// certificate and hostname checks; opting out is a trust decision
    /// that accepts man-in-the-middle exposure.
    #[serde(default)]
    pub verify_tls: bool,
}

const fn default_port() -> u32 {
    DEFAULT_PORT
}

impl Pve2Config {
    /// Create a configuration from the required connection identity fields.
    ///
    /// Uses the default port (8006) and leaves TLS verification disabled,
    /// matching how PVE nodes ship (self-signed certificates).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any field is empty or the host neither
    /// parses as an IP literal nor resolves via name lookup.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        realm: impl Into<String>,
        token_id: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            host: host.into(),
            username: username.into(),
            realm: realm.into(),
            token_id: token_id.into(),
            token_secret: SecretString::from(token_secret.into()),
            port: default_port(),
            verify_tls: false,
        };

        config.ensure_valid()?;
        Ok(config)
    }

    /// Override the API port.
    #[must_use]
    pub const fn with_port(mut self, port: u32) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub const fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Run the full construction-time validation: field emptiness and port
    /// range via the derive rules, token secret emptiness, and the host
    /// resolution check (a literal IP address is accepted without lookup).
    ///
    /// The checks run in that order, so an out-of-range port fails before
    /// any name lookup happens and before a credential is composed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first failing input.
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate()?;

        if self.token_secret.expose_secret().is_empty() {
            return Err(Error::Config("token_secret must not be empty".to_string()));
        }

        if !host_resolves(&self.host) {
            return Err(Error::Config(format!("cannot resolve host `{}`", self.host)));
        }

        Ok(())
    }

    /// Compose the authorization header value:
    /// `PVEAPIToken={username}@{realm}!{token_id}={token_secret}`.
    ///
    /// This is the only place the raw secret is read; the composed value is
    /// itself a secret and stays one until it is written into a request.
    #[must_use]
    pub fn credential(&self) -> SecretString {
        SecretString::from(format!(
            "PVEAPIToken={}@{}!{}={}",
            self.username,
            self.realm,
            self.token_id,
            self.token_secret.expose_secret()
        ))
    }

    /// Base URL of the JSON API on this node.
    #[must_use]
    pub fn api_base(&self) -> String {
        format!("https://{}:{}/api2/json", self.host, self.port)
    }
}

/// A host is acceptable when it is an IP literal or resolves via name
/// lookup. Port 0 keeps `getaddrinfo` from caring about services.
fn host_resolves(host: &str) -> bool {
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }

    (host, 0)
        .to_socket_addrs()
        .map(|mut addrs| addrs.next().is_some())
        .unwrap_or(false)
}
