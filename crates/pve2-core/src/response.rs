//! Raw-response parsing and outcome classification.
//!
//! A transport hands back one response wire image per call. Parsing splits
//! it into status line, header block and body; classification turns the
//! parsed pieces into an [`ApiOutcome`] or a typed failure. Classification
//! operates on the parsed values, never on string offsets.

use crate::error::{Error, Result};
use reqwest::Method;
use serde_json::Value;

/// Successful outcome of one dispatched API call.
///
/// Callers branch on the variant, so "the server said null" and "the call
/// failed" can never be confused.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    /// The body's `data` field, present and non-null.
    Data(Value),
    /// A 200 response with no usable `data` field: the key was absent, its
    /// value was null, or the body did not decode as JSON. A reportable
    /// soft success, not a failure.
    Empty,
    /// A 200 response to a PUT. The body is intentionally not exposed.
    Updated,
}

impl ApiOutcome {
    /// The payload, when there is one.
    #[must_use]
    pub fn into_data(self) -> Option<Value> {
        match self {
            Self::Data(value) => Some(value),
            Self::Empty | Self::Updated => None,
        }
    }
}

/// One response parsed out of its wire image. Transient: produced and
/// consumed within a single dispatch call.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Numeric status code from the status line.
    pub status: u16,
    /// Reason phrase from the status line, possibly empty.
    pub reason: String,
    /// Header lines in wire order. Diagnostic only; never drives control
    /// flow.
    pub headers: Vec<(String, String)>,
    /// Raw body bytes.
    pub body: Vec<u8>,
    /// JSON decode of the body, when the body decodes.
    pub decoded: Option<Value>,
}

impl RawResponse {
    /// Split a wire image at the first blank-line boundary and parse the
    /// `HTTP/1.1 <status> <reason>` status line.
    ///
    /// A body that fails to decode as JSON is kept raw with `decoded` unset;
    /// classification still proceeds on the status line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] when the boundary is missing,
    /// the header block is not text, or the status line is not the expected
    /// protocol form.
    pub fn from_wire(wire: &[u8]) -> Result<Self> {
        let boundary = find_boundary(wire).ok_or_else(|| {
            Error::MalformedResponse("no header/body boundary (CRLF CRLF) in response".to_string())
        })?;
        let (head, body) = (&wire[..boundary], &wire[boundary + 4..]);

        let head = std::str::from_utf8(head).map_err(|_| {
            Error::MalformedResponse("header block is not valid UTF-8".to_string())
        })?;
        let mut lines = head.split("\r\n");

        let status_line = lines.next().unwrap_or_default();
        let rest = status_line.strip_prefix("HTTP/1.1 ").ok_or_else(|| {
            Error::MalformedResponse(format!("unexpected status line `{status_line}`"))
        })?;
        let (code, reason) = match rest.split_once(' ') {
            Some((code, reason)) => (code, reason),
            None => (rest, ""),
        };
        let status = code.parse::<u16>().map_err(|_| {
            Error::MalformedResponse(format!("unexpected status line `{status_line}`"))
        })?;

        let headers = lines
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                line.split_once(':')
                    .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            })
            .collect();

        let decoded = serde_json::from_slice(body).ok();

        Ok(Self {
            status,
            reason: reason.to_string(),
            headers,
            body: body.to_vec(),
            decoded,
        })
    }

    /// Classify the response for the verb that produced it.
    ///
    /// 200 + PUT succeeds without a payload; 200 + any other verb yields
    /// the body's `data` field ([`ApiOutcome::Empty`] when it is absent or
    /// null); any other status fails [`Error::Rejected`] without further
    /// interpretation of the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] carrying the status and reason phrase.
    pub fn classify(&self, method: &Method) -> Result<ApiOutcome> {
        if self.status != 200 {
            return Err(Error::Rejected {
                status: self.status,
                reason: self.reason.clone(),
            });
        }

        if *method == Method::PUT {
            return Ok(ApiOutcome::Updated);
        }

        match self.decoded.as_ref().and_then(|body| body.get("data")) {
            Some(data) if !data.is_null() => Ok(ApiOutcome::Data(data.clone())),
            _ => Ok(ApiOutcome::Empty),
        }
    }
}

fn find_boundary(wire: &[u8]) -> Option<usize> {
    wire.windows(4).position(|window| window == b"\r\n\r\n")
}
