//! Revly Core — domain models, remote-service contracts, and the
//! shared error type for the Revly client core.
//!
//! This crate is a leaf: it performs no I/O. Service implementations
//! live in `revly-remote`; the state containers live in `revly-store`.

pub mod error;
pub mod models;
pub mod services;

pub use error::{RevlyError, RevlyResult};
