//! # Vendorkit
//!
//! Per-tenant table provisioning from declarative schemas, a vendor registry
//! client and a one-shot AI chat proxy, served over HTTP.

pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod provisioning;
pub mod registry;
pub mod server;
pub mod telemetry;
pub use migration;
