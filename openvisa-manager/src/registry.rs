//! Process-wide resource-class registry
//!
//! Maps an `(interface type, resource class)` pair to the
//! [`ResourceKind`] a freshly opened handle should expose. The table is
//! seeded with the standard VISA mapping and can be extended at runtime
//! for custom classes.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

use openvisa_core::{Error, InterfaceType, ResourceKind, Result};

/// A copy of the registry contents, as returned by [`registry_snapshot`]
pub type RegistrySnapshot = HashMap<(InterfaceType, String), ResourceKind>;

static REGISTRY: Lazy<RwLock<RegistrySnapshot>> = Lazy::new(|| RwLock::new(default_entries()));

fn default_entries() -> RegistrySnapshot {
    use InterfaceType::{Asrl, Gpib, Pxi, Tcpip, Unknown, Usb, Vxi};
    use ResourceKind::{Generic, MessageBased, RegisterBased};

    let defaults = [
        (Gpib, "INSTR", MessageBased),
        (Gpib, "INTFC", Generic),
        (Asrl, "INSTR", MessageBased),
        (Tcpip, "INSTR", MessageBased),
        (Tcpip, "SOCKET", MessageBased),
        (Usb, "INSTR", MessageBased),
        (Usb, "RAW", MessageBased),
        (Pxi, "MEMACC", RegisterBased),
        (Pxi, "BACKPLANE", Generic),
        (Vxi, "INSTR", MessageBased),
        (Vxi, "MEMACC", RegisterBased),
        (Vxi, "BACKPLANE", Generic),
        (Vxi, "SERVANT", Generic),
        // Per-interface fallbacks for unlisted classes
        (Gpib, "", Generic),
        (Asrl, "", Generic),
        (Tcpip, "", Generic),
        (Usb, "", Generic),
        (Pxi, "", Generic),
        (Vxi, "", Generic),
        (Unknown, "", Generic),
    ];

    defaults
        .into_iter()
        .map(|(interface_type, class, kind)| ((interface_type, class.to_string()), kind))
        .collect()
}

/// Register the kind of handle to build for an interface/class pair
///
/// An empty `resource_class` registers the fallback for every class of
/// that interface. Re-registering an existing pair replaces the entry
/// and logs a warning.
pub fn register_resource_class(
    interface_type: InterfaceType,
    resource_class: &str,
    kind: ResourceKind,
) {
    let key = (interface_type, resource_class.to_ascii_uppercase());
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);

    if let Some(previous) = registry.insert(key, kind) {
        warn!(
            %interface_type,
            resource_class,
            %previous,
            %kind,
            "Overwriting registered resource class"
        );
    } else {
        debug!(%interface_type, resource_class, %kind, "Registered resource class");
    }
}

/// Resolve the kind registered for an interface/class pair
///
/// Looks up the exact pair first and falls back to the per-interface
/// entry (empty class).
///
/// # Errors
/// Returns [`Error::NoRegisteredClass`] when neither entry exists.
pub fn lookup_resource_class(
    interface_type: InterfaceType,
    resource_class: &str,
) -> Result<ResourceKind> {
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);

    let exact = (interface_type, resource_class.to_ascii_uppercase());
    if let Some(kind) = registry.get(&exact) {
        return Ok(*kind);
    }
    if let Some(kind) = registry.get(&(interface_type, String::new())) {
        return Ok(*kind);
    }

    Err(Error::NoRegisteredClass {
        interface_type,
        resource_class: resource_class.to_string(),
    })
}

/// Copy the current registry contents
///
/// Pair with [`restore_registry`] to mutate the registry in a test
/// without leaking the change into other tests.
#[must_use]
pub fn registry_snapshot() -> RegistrySnapshot {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the registry contents with a previously taken snapshot
pub fn restore_registry(snapshot: RegistrySnapshot) {
    *REGISTRY.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        assert_eq!(
            lookup_resource_class(InterfaceType::Gpib, "INSTR").unwrap(),
            ResourceKind::MessageBased
        );
        assert_eq!(
            lookup_resource_class(InterfaceType::Pxi, "MEMACC").unwrap(),
            ResourceKind::RegisterBased
        );
        assert_eq!(
            lookup_resource_class(InterfaceType::Vxi, "BACKPLANE").unwrap(),
            ResourceKind::Generic
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(
            lookup_resource_class(InterfaceType::Tcpip, "socket").unwrap(),
            ResourceKind::MessageBased
        );
    }

    #[test]
    fn test_fallback_to_interface_entry() {
        // An unlisted class resolves through the per-interface entry.
        assert_eq!(
            lookup_resource_class(InterfaceType::Gpib, "SERVANT").unwrap(),
            ResourceKind::Generic
        );
    }

    #[test]
    fn test_register_and_restore() {
        let snapshot = registry_snapshot();

        register_resource_class(InterfaceType::Tcpip, "CAMERA", ResourceKind::RegisterBased);
        assert_eq!(
            lookup_resource_class(InterfaceType::Tcpip, "CAMERA").unwrap(),
            ResourceKind::RegisterBased
        );

        restore_registry(snapshot);
        // Back to the per-interface fallback.
        assert_eq!(
            lookup_resource_class(InterfaceType::Tcpip, "CAMERA").unwrap(),
            ResourceKind::Generic
        );
    }
}
