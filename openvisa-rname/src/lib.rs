//! Resource name parsing, canonicalization, and filtering
//!
//! This crate implements the structured-address grammar used to
//! identify instrument resources (for example
//! `TCPIP0::192.168.0.1::inst0::INSTR`) together with the VISA-style
//! resource query matching used for discovery.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod filter;
pub mod name;

pub use filter::filter;
pub use name::{to_canonical_name, ResourceName, ResourceNameKind};
