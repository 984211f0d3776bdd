//! The transport seam and its blocking HTTP implementation.
//!
//! The dispatcher talks to the network through the [`Transport`] trait: one
//! fully-built request in, the raw response wire image out. Production use
//! goes through [`HttpTransport`]; tests plug in a mock, which is what
//! makes "no request was sent" an observable property.

use crate::config::Pve2Config;
use crate::error::{Error, Result};
use reqwest::blocking::{Client, Response};
use reqwest::{header, Method};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use tracing::warn;
use url::Url;

const USER_AGENT: &str = concat!("pve2-core/", env!("CARGO_PKG_VERSION"));

/// One fully-built API request, ready for a transport to send.
pub struct ApiRequest {
    /// HTTP method; the dispatcher only ever builds GET/PUT/POST/DELETE.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// `Authorization` header value (the precomputed API token credential).
    pub authorization: SecretString,
    /// Form-encoded body, present for PUT/POST only.
    pub body: Option<String>,
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("authorization", &"[REDACTED]")
            .field("body", &self.body)
            .finish()
    }
}

/// Abstraction over one blocking HTTP round trip.
///
/// Implementations return the raw response wire image: status line, header
/// block, CRLF CRLF, body. Parsing and classification belong to the
/// dispatcher, not the transport.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Send the request and return the raw response wire image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] for DNS, connect, TLS or timeout
    /// failures.
    fn send(&self, request: &ApiRequest) -> Result<Vec<u8>>;
}

/// Blocking HTTP transport over `reqwest`.
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build the transport for the given connection identity.
    ///
    /// HTTP/1.1 is forced so the response wire image always carries the
    /// status-line form the classifier expects. When `verify_tls` is off,
    /// certificate checks are skipped entirely (under rustls that includes
    /// hostname checks).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the underlying client cannot be built.
    pub fn new(config: &Pve2Config) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT).http1_only();

        if !config.verify_tls {
            warn!("TLS verification disabled for PVE API client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|err| Error::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<Vec<u8>> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .header(header::AUTHORIZATION, request.authorization.expose_secret());

        if let Some(body) = &request.body {
            builder = builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.clone());
        }

        let response = builder.send()?;
        wire_image(response)
    }
}

/// reqwest exposes a parsed response; the classifier works on the wire
/// image, so rebuild the head in front of the body bytes.
fn wire_image(response: Response) -> Result<Vec<u8>> {
    let status = response.status();
    let mut head = format!(
        "HTTP/1.1 {} {}\r\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );

    for (name, value) in response.headers() {
        head.push_str(name.as_str());
        head.push_str(": ");
        head.push_str(&String::from_utf8_lossy(value.as_bytes()));
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    let mut wire = head.into_bytes();
    wire.extend_from_slice(&response.bytes()?);
    Ok(wire)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ApiRequest {
        ApiRequest {
            method: Method::POST,
            url: Url::parse("https://10.0.0.5:8006/api2/json/nodes/pve1/qemu").unwrap(),
            authorization: SecretString::from(
                "PVEAPIToken=root@pam!mytoken=abcd-1234".to_string(),
            ),
            body: Some("vmid=100".to_string()),
        }
    }

    #[test]
    fn debug_redacts_authorization() {
        let rendered = format!("{:?}", request());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("abcd-1234"));
        assert!(rendered.contains("vmid=100"));
    }

    #[test]
    fn mock_transport_returns_wire_image() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(b"HTTP/1.1 200 OK\r\n\r\n{\"data\":null}".to_vec()));

        let wire = transport.send(&request()).unwrap();
        assert!(wire.starts_with(b"HTTP/1.1 200"));
    }
}
