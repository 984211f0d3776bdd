//! Serde models for the payloads the facade decodes.
//!
//! Only the fields the client relies on are required; everything else the
//! API reports is optional and unknown fields are ignored, so the models
//! keep working across PVE releases.

use serde::{Deserialize, Serialize};

/// One entry of the `/nodes` listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node name, unique within the cluster.
    pub node: String,
    /// Resource id (`node/{name}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Resource type discriminator.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `online`, `offline` or `unknown`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Seconds since boot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// CPU utilisation as a fraction of `maxcpu`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    /// Core count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxcpu: Option<u32>,
    /// Memory in use, bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<u64>,
    /// Memory installed, bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmem: Option<u64>,
    /// Root filesystem usage, bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
    /// Root filesystem size, bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxdisk: Option<u64>,
    /// Subscription level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Fingerprint of the node's TLS certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_fingerprint: Option<String>,
}

/// Payload of the `/version` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionInfo {
    /// Full version string, e.g. `7.4-3`.
    pub version: String,
    /// Release series, e.g. `7.4`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// Repository id the packages were built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repoid: Option<String>,
    /// Default console viewer configured on the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console: Option<String>,
}
