//! Blocking client facade for the Proxmox VE (PVE) HTTP API.
//!
//! Provides [`Pve2Client`], which holds the connection identity and the
//! cluster node-name cache, and exposes the verb-level calls plus the
//! derived operations built on top of them.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::Pve2Client;
pub use models::{Node, VersionInfo};

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = pve2_core::Result<T>;
