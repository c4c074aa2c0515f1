//! OpenVISA Core - Foundation types, status codes, and errors
//!
//! This crate provides the core abstractions used throughout OpenVISA.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod status;
pub mod types;

pub use error::{Error, Result};
pub use status::StatusCode;
pub use types::{AccessMode, AttrValue, InterfaceType, ResourceInfo, ResourceKind, SessionId};
