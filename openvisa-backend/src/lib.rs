//! Backend adapter boundary with pluggable implementations
//!
//! This crate defines the narrow capability surface the resource
//! manager consumes from the underlying communication library, plus an
//! in-memory simulated implementation used by tests and the CLI.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod adapter;
pub mod sim;

pub use adapter::VisaBackend;
pub use sim::SimBackend;

// Re-export commonly used types
pub use openvisa_core::{AccessMode, ResourceInfo, SessionId, StatusCode};
