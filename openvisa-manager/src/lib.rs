//! OpenVISA Manager - Discovery, resource-class registry, and session
//! brokering
//!
//! Ties the resource-name grammar, the class registry, and a backend
//! adapter together behind a [`ResourceManager`].

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod manager;
pub mod registry;
pub mod resource;

pub use manager::{OpenOptions, ResourceManager, DEFAULT_QUERY};
pub use registry::{
    lookup_resource_class, register_resource_class, registry_snapshot, restore_registry,
    RegistrySnapshot,
};
pub use resource::Resource;

pub use openvisa_core::{
    AccessMode, AttrValue, Error, InterfaceType, ResourceInfo, ResourceKind, Result, SessionId,
    StatusCode,
};
