//! Revly Remote — backend service client implementations.
//!
//! This crate provides:
//! - Connection management ([`RemoteClient`], [`RemoteConfig`])
//! - HTTP implementations of the `revly-core` service traits
//!   ([`HttpIdentityService`], [`HttpProfileService`],
//!   [`HttpTenantService`])
//! - An in-memory backend ([`MemoryBackend`]) for tests and local
//!   demos
//! - Error types ([`RemoteError`])

mod client;
mod error;
mod http;
pub mod memory;

pub use client::{RemoteClient, RemoteConfig};
pub use error::RemoteError;
pub use http::{HttpIdentityService, HttpProfileService, HttpTenantService};
pub use memory::MemoryBackend;
