//! Core type definitions with strong typing and validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Backend session identifier
///
/// Identifies either the resource-manager session used for discovery
/// or a per-resource session handed out by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Create from a raw backend handle value
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hardware interface addressed by a resource name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterfaceType {
    /// GPIB bus interface
    Gpib,
    /// TCP/IP network interface
    Tcpip,
    /// Universal Serial Bus
    Usb,
    /// Asynchronous serial line
    Asrl,
    /// PXI backplane
    Pxi,
    /// VXI backplane
    Vxi,
    /// Interface type could not be determined
    Unknown,
}

impl InterfaceType {
    /// The keyword that opens resource names for this interface
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Gpib => "GPIB",
            Self::Tcpip => "TCPIP",
            Self::Usb => "USB",
            Self::Asrl => "ASRL",
            Self::Pxi => "PXI",
            Self::Vxi => "VXI",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

impl FromStr for InterfaceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GPIB" => Ok(Self::Gpib),
            "TCPIP" => Ok(Self::Tcpip),
            "USB" => Ok(Self::Usb),
            "ASRL" => Ok(Self::Asrl),
            "PXI" => Ok(Self::Pxi),
            "VXI" => Ok(Self::Vxi),
            other => Err(Error::InvalidValue {
                message: format!("'{other}' is not a known interface type"),
            }),
        }
    }
}

/// Policy governing locking when a session is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Open without acquiring any lock
    #[default]
    NoLock,
    /// Acquire an exclusive lock; openers block until it is released
    ExclusiveLock,
    /// Acquire a shared lock
    SharedLock,
}

impl AccessMode {
    /// Raw VISA access mode value
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        match self {
            Self::NoLock => 0,
            Self::ExclusiveLock => 1,
            Self::SharedLock => 2,
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoLock => "no_lock",
            Self::ExclusiveLock => "exclusive_lock",
            Self::SharedLock => "shared_lock",
        };
        write!(f, "{name}")
    }
}

/// Capability set implemented by a resource handle
///
/// The registry maps each `(interface type, resource class)` pair to
/// the kind a freshly opened handle should expose. Kinds form a small
/// hierarchy: `Generic` is the common subset, the other two extend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Bare session: timeout and locking only
    Generic,
    /// Message-based instrument: terminations and chunked transfers
    MessageBased,
    /// Register-based device: memory-mapped access
    RegisterBased,
}

impl ResourceKind {
    /// Whether a handle of this kind satisfies a caller that asked
    /// for `self` when `registered` is the kind on record.
    ///
    /// `Generic` is a strict capability subset of every kind and is
    /// therefore always accepted. Asking for a richer kind than the
    /// registered one is rejected.
    #[must_use]
    pub const fn is_compatible_with(self, registered: Self) -> bool {
        matches!(self, Self::Generic) || (self as u8) == (registered as u8)
    }

    /// Whether handles of this kind support the named attribute
    #[must_use]
    pub fn supports_attribute(self, name: &str) -> bool {
        match name {
            "timeout" | "access_mode" => true,
            "read_termination" | "write_termination" | "chunk_size" => {
                matches!(self, Self::MessageBased)
            }
            _ => false,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generic => "Generic",
            Self::MessageBased => "MessageBased",
            Self::RegisterBased => "RegisterBased",
        };
        write!(f, "{name}")
    }
}

/// Loosely typed attribute value used for open-time configuration
///
/// Mirrors the way configuration options arrive at the manager: by
/// name, with a value that still has to be coerced to the type the
/// attribute expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Unsigned integer value
    UInt(u64),
    /// Boolean value
    Bool(bool),
    /// String value
    Str(String),
}

impl AttrValue {
    /// Coerce to a non-negative integer count of milliseconds
    ///
    /// # Errors
    /// Returns [`Error::InvalidValue`] when the value is not
    /// convertible to an unsigned integer.
    pub fn as_millis(&self) -> Result<u64> {
        self.as_uint().map_err(|_| Error::InvalidValue {
            message: format!(
                "{self:?} is not a valid timeout: expected an unsigned integer number of milliseconds"
            ),
        })
    }

    /// Coerce to an unsigned integer
    ///
    /// # Errors
    /// Returns [`Error::InvalidValue`] when the value is not
    /// convertible to an unsigned integer.
    pub fn as_uint(&self) -> Result<u64> {
        match self {
            Self::UInt(value) => Ok(*value),
            Self::Str(text) => text.trim().parse().map_err(|_| Error::InvalidValue {
                message: format!("'{text}' is not a valid unsigned integer"),
            }),
            Self::Bool(_) => Err(Error::InvalidValue {
                message: "a boolean is not a valid unsigned integer".to_string(),
            }),
        }
    }

    /// Coerce to a string slice
    ///
    /// # Errors
    /// Returns [`Error::InvalidValue`] for non-string values.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::Str(text) => Ok(text),
            other => Err(Error::InvalidValue {
                message: format!("{other:?} is not a valid string value"),
            }),
        }
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Duration> for AttrValue {
    fn from(value: Duration) -> Self {
        Self::UInt(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Interface and class details for a discovered or parsed resource
///
/// The extended form (as reported by a backend) carries the resource
/// class and a possible alias. The basic form, derived purely from
/// parsing, populates only the interface type and board number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// Interface type of the resource
    pub interface_type: InterfaceType,
    /// Board or interface number
    pub interface_board_number: u32,
    /// Resource class; `None` in the basic (parse-only) form
    pub resource_class: Option<String>,
    /// Canonical resource name
    pub resource_name: String,
    /// User-defined alias, when the backend knows one
    pub alias: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_round_trip() {
        let id = SessionId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_interface_type_from_str() {
        assert_eq!("gpib".parse::<InterfaceType>().unwrap(), InterfaceType::Gpib);
        assert_eq!("TCPIP".parse::<InterfaceType>().unwrap(), InterfaceType::Tcpip);
        assert!("RJ45".parse::<InterfaceType>().is_err());
    }

    #[test]
    fn test_kind_compatibility() {
        use ResourceKind::{Generic, MessageBased, RegisterBased};

        assert!(Generic.is_compatible_with(MessageBased));
        assert!(Generic.is_compatible_with(RegisterBased));
        assert!(MessageBased.is_compatible_with(MessageBased));
        assert!(!MessageBased.is_compatible_with(RegisterBased));
        assert!(!RegisterBased.is_compatible_with(MessageBased));
    }

    #[test]
    fn test_kind_attribute_support() {
        assert!(ResourceKind::Generic.supports_attribute("timeout"));
        assert!(!ResourceKind::Generic.supports_attribute("read_termination"));
        assert!(ResourceKind::MessageBased.supports_attribute("chunk_size"));
        assert!(!ResourceKind::MessageBased.supports_attribute("unknown_attribute"));
    }

    #[test]
    fn test_attr_value_coercions() {
        assert_eq!(AttrValue::from(250_u64).as_millis().unwrap(), 250);
        assert_eq!(AttrValue::from("250").as_millis().unwrap(), 250);
        assert_eq!(AttrValue::from(Duration::from_secs(2)).as_millis().unwrap(), 2000);

        let err = AttrValue::from("").as_millis().unwrap_err();
        assert!(err.to_string().contains("unsigned integer"));

        let err = AttrValue::from(true).as_millis().unwrap_err();
        assert!(err.to_string().contains("unsigned integer"));
    }

    #[test]
    fn test_resource_info_serde() {
        let info = ResourceInfo {
            interface_type: InterfaceType::Tcpip,
            interface_board_number: 0,
            resource_class: Some("INSTR".to_string()),
            resource_name: "TCPIP0::192.168.0.1::inst0::INSTR".to_string(),
            alias: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: ResourceInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(info, back);
    }
}
