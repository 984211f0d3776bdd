//! # pve2-core
//!
//! Core machinery for talking to the Proxmox VE (PVE) HTTP API.
//!
//! This crate provides the request dispatcher and everything beneath it:
//! connection configuration, the failure taxonomy, the transport seam, and
//! raw-response parsing/classification. The caller-facing client lives in
//! the `pve2-client` crate.
//!
//! ## Modules
//!
//! - [`error`] - Error types and programmatic error codes
//! - [`config`] - Connection identity and validation
//! - [`params`] - Form-parameter builder for PUT/POST bodies
//! - [`transport`] - The transport seam and its blocking HTTP implementation
//! - [`response`] - Raw-response parsing and outcome classification
//! - [`dispatch`] - The request dispatcher

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod response;
pub mod transport;

// Re-export commonly used types
pub use config::Pve2Config;
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use params::FormParams;
pub use response::ApiOutcome;
pub use transport::{ApiRequest, HttpTransport, Transport};
