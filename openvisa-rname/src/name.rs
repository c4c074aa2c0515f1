//! Structured resource names
//!
//! A resource name is parsed into a typed, immutable descriptor. The
//! canonical string form is deterministic and always spells out every
//! field including defaulted ones, so parsing the canonical form of a
//! name yields a structurally equal descriptor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use openvisa_core::{Error, InterfaceType, ResourceInfo, Result};

/// Typed decomposition of a resource name, one variant per
/// `(interface type, resource class)` pair of the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ResourceNameKind {
    /// `GPIB[board]::primary address[::secondary address][::INSTR]`
    GpibInstr {
        /// Board number
        board: u32,
        /// Primary address of the device
        primary_address: u32,
        /// Secondary address of the device
        secondary_address: u32,
    },
    /// `GPIB[board]::INTFC`
    GpibIntfc {
        /// Board number
        board: u32,
    },
    /// `ASRL[board][::INSTR]`
    AsrlInstr {
        /// Serial port number
        board: u32,
    },
    /// `TCPIP[board]::host address[::LAN device name][::INSTR]`
    TcpipInstr {
        /// Board number
        board: u32,
        /// Host name or IP address
        host_address: String,
        /// LAN device name, `inst0` by default
        lan_device_name: String,
    },
    /// `TCPIP[board]::host address::port[::SOCKET]`
    TcpipSocket {
        /// Board number
        board: u32,
        /// Host name or IP address
        host_address: String,
        /// TCP port
        port: u32,
    },
    /// `USB[board]::manufacturer ID::model code::serial number[::USB interface number][::INSTR]`
    UsbInstr {
        /// Board number
        board: u32,
        /// USB vendor identifier, kept verbatim (often hexadecimal)
        manufacturer_id: String,
        /// USB product identifier, kept verbatim
        model_code: String,
        /// Device serial number
        serial_number: String,
        /// USB interface number
        usb_interface_number: u32,
    },
    /// `USB[board]::manufacturer ID::model code::serial number[::USB interface number]::RAW`
    UsbRaw {
        /// Board number
        board: u32,
        /// USB vendor identifier, kept verbatim
        manufacturer_id: String,
        /// USB product identifier, kept verbatim
        model_code: String,
        /// Device serial number
        serial_number: String,
        /// USB interface number
        usb_interface_number: u32,
    },
    /// `PXI[interface]::chassis number::BACKPLANE`
    PxiBackplane {
        /// Interface number
        interface: u32,
        /// Chassis number
        chassis_number: u32,
    },
    /// `PXI[interface]::MEMACC`
    PxiMemacc {
        /// Interface number
        interface: u32,
    },
    /// `VXI[board][::VXI logical address]::BACKPLANE`
    VxiBackplane {
        /// Board number
        board: u32,
        /// VXI logical address
        logical_address: u32,
    },
    /// `VXI[board]::VXI logical address[::INSTR]`
    VxiInstr {
        /// Board number
        board: u32,
        /// VXI logical address
        logical_address: u32,
    },
    /// `VXI[board]::MEMACC`
    VxiMemacc {
        /// Board number
        board: u32,
    },
    /// `VXI[board]::SERVANT`
    VxiServant {
        /// Board number
        board: u32,
    },
}

impl ResourceNameKind {
    /// Interface type of this name
    #[must_use]
    pub const fn interface_type(&self) -> InterfaceType {
        match self {
            Self::GpibInstr { .. } | Self::GpibIntfc { .. } => InterfaceType::Gpib,
            Self::AsrlInstr { .. } => InterfaceType::Asrl,
            Self::TcpipInstr { .. } | Self::TcpipSocket { .. } => InterfaceType::Tcpip,
            Self::UsbInstr { .. } | Self::UsbRaw { .. } => InterfaceType::Usb,
            Self::PxiBackplane { .. } | Self::PxiMemacc { .. } => InterfaceType::Pxi,
            Self::VxiBackplane { .. }
            | Self::VxiInstr { .. }
            | Self::VxiMemacc { .. }
            | Self::VxiServant { .. } => InterfaceType::Vxi,
        }
    }

    /// Resource class of this name
    #[must_use]
    pub const fn resource_class(&self) -> &'static str {
        match self {
            Self::GpibInstr { .. }
            | Self::AsrlInstr { .. }
            | Self::TcpipInstr { .. }
            | Self::UsbInstr { .. }
            | Self::VxiInstr { .. } => "INSTR",
            Self::GpibIntfc { .. } => "INTFC",
            Self::TcpipSocket { .. } => "SOCKET",
            Self::UsbRaw { .. } => "RAW",
            Self::PxiBackplane { .. } | Self::VxiBackplane { .. } => "BACKPLANE",
            Self::PxiMemacc { .. } | Self::VxiMemacc { .. } => "MEMACC",
            Self::VxiServant { .. } => "SERVANT",
        }
    }

    /// Board or interface number of this name
    #[must_use]
    pub const fn board(&self) -> u32 {
        match self {
            Self::GpibInstr { board, .. }
            | Self::GpibIntfc { board }
            | Self::AsrlInstr { board }
            | Self::TcpipInstr { board, .. }
            | Self::TcpipSocket { board, .. }
            | Self::UsbInstr { board, .. }
            | Self::UsbRaw { board, .. }
            | Self::VxiBackplane { board, .. }
            | Self::VxiInstr { board, .. }
            | Self::VxiMemacc { board }
            | Self::VxiServant { board } => *board,
            Self::PxiBackplane { interface, .. } | Self::PxiMemacc { interface } => *interface,
        }
    }

    /// The user-facing syntax for this `(interface, class)` pair
    #[must_use]
    pub fn syntax(&self) -> &'static str {
        syntax_for(self.interface_type(), self.resource_class())
    }
}

impl fmt::Display for ResourceNameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpibInstr {
                board,
                primary_address,
                secondary_address,
            } => write!(f, "GPIB{board}::{primary_address}::{secondary_address}::INSTR"),
            Self::GpibIntfc { board } => write!(f, "GPIB{board}::INTFC"),
            Self::AsrlInstr { board } => write!(f, "ASRL{board}::INSTR"),
            Self::TcpipInstr {
                board,
                host_address,
                lan_device_name,
            } => write!(f, "TCPIP{board}::{host_address}::{lan_device_name}::INSTR"),
            Self::TcpipSocket {
                board,
                host_address,
                port,
            } => write!(f, "TCPIP{board}::{host_address}::{port}::SOCKET"),
            Self::UsbInstr {
                board,
                manufacturer_id,
                model_code,
                serial_number,
                usb_interface_number,
            } => write!(
                f,
                "USB{board}::{manufacturer_id}::{model_code}::{serial_number}::{usb_interface_number}::INSTR"
            ),
            Self::UsbRaw {
                board,
                manufacturer_id,
                model_code,
                serial_number,
                usb_interface_number,
            } => write!(
                f,
                "USB{board}::{manufacturer_id}::{model_code}::{serial_number}::{usb_interface_number}::RAW"
            ),
            Self::PxiBackplane {
                interface,
                chassis_number,
            } => write!(f, "PXI{interface}::{chassis_number}::BACKPLANE"),
            Self::PxiMemacc { interface } => write!(f, "PXI{interface}::MEMACC"),
            Self::VxiBackplane {
                board,
                logical_address,
            } => write!(f, "VXI{board}::{logical_address}::BACKPLANE"),
            Self::VxiInstr {
                board,
                logical_address,
            } => write!(f, "VXI{board}::{logical_address}::INSTR"),
            Self::VxiMemacc { board } => write!(f, "VXI{board}::MEMACC"),
            Self::VxiServant { board } => write!(f, "VXI{board}::SERVANT"),
        }
    }
}

/// A validated resource name
///
/// Constructed by [`ResourceName::parse`] and immutable afterwards.
/// Equality and hashing consider only the typed decomposition, not
/// whether the resource class had to be defaulted during parsing.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName {
    kind: ResourceNameKind,
    resource_class_default: bool,
}

impl ResourceName {
    /// Parse a resource name string
    ///
    /// Parsing is total for the documented grammar: the whole string
    /// must be consumed, partial matches are rejected.
    ///
    /// # Errors
    /// Returns [`Error::InvalidResourceName`] for an unknown interface
    /// keyword, a missing resource class with no default, malformed
    /// numeric fields, or a wrong number of `::`-separated parts.
    pub fn parse(resource_name: &str) -> Result<Self> {
        let upper = resource_name.to_ascii_uppercase();

        for interface_type in [
            InterfaceType::Gpib,
            InterfaceType::Tcpip,
            InterfaceType::Usb,
            InterfaceType::Asrl,
            InterfaceType::Pxi,
            InterfaceType::Vxi,
        ] {
            let keyword = interface_type.keyword();
            if !upper.starts_with(keyword) {
                continue;
            }

            let rest = &resource_name[keyword.len()..];
            let mut parts: Vec<&str> = if rest.is_empty() {
                Vec::new()
            } else {
                rest.split("::").collect()
            };

            // Split off the resource class when it is spelled out,
            // otherwise fall back to the interface default.
            let mut resource_class_default = false;
            let resource_class = match parts.last().map(|p| p.to_ascii_uppercase()) {
                Some(last) if known_classes(interface_type).contains(&last.as_str()) => {
                    parts.pop();
                    last
                }
                _ => {
                    resource_class_default = true;
                    default_class(interface_type, &parts).ok_or_else(|| {
                        Error::InvalidResourceName {
                            resource_name: resource_name.to_string(),
                            message: format!(
                                "Resource class for {interface_type} not provided and default not found."
                            ),
                        }
                    })?
                }
            };

            let kind = parse_parts(interface_type, &resource_class, &parts, resource_name)?;
            return Ok(Self {
                kind,
                resource_class_default,
            });
        }

        Err(Error::InvalidResourceName {
            resource_name: resource_name.to_string(),
            message: "Unknown interface type.".to_string(),
        })
    }

    /// The typed decomposition
    #[must_use]
    pub const fn kind(&self) -> &ResourceNameKind {
        &self.kind
    }

    /// Interface type of this name
    #[must_use]
    pub const fn interface_type(&self) -> InterfaceType {
        self.kind.interface_type()
    }

    /// Board or interface number
    #[must_use]
    pub const fn board(&self) -> u32 {
        self.kind.board()
    }

    /// Resource class (for example `"INSTR"`)
    #[must_use]
    pub const fn resource_class(&self) -> &'static str {
        self.kind.resource_class()
    }

    /// Whether the resource class was defaulted rather than spelled
    /// out in the parsed string
    #[must_use]
    pub const fn is_resource_class_default(&self) -> bool {
        self.resource_class_default
    }

    /// Canonical string form
    #[must_use]
    pub fn canonical_name(&self) -> String {
        self.kind.to_string()
    }

    /// Derive resource information from this name
    ///
    /// The basic form (`extended == false`) populates only the
    /// interface type and board number; the extended form also carries
    /// the resource class.
    #[must_use]
    pub fn to_resource_info(&self, extended: bool) -> ResourceInfo {
        ResourceInfo {
            interface_type: self.interface_type(),
            interface_board_number: self.board(),
            resource_class: extended.then(|| self.resource_class().to_string()),
            resource_name: self.canonical_name(),
            alias: None,
        }
    }
}

impl From<ResourceNameKind> for ResourceName {
    fn from(kind: ResourceNameKind) -> Self {
        Self {
            kind,
            resource_class_default: false,
        }
    }
}

impl PartialEq for ResourceName {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Hash for ResourceName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl FromStr for ResourceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        name.canonical_name()
    }
}

/// Parse a resource name and return its canonical form
///
/// # Errors
/// Same failure modes as [`ResourceName::parse`].
pub fn to_canonical_name(resource_name: &str) -> Result<String> {
    ResourceName::parse(resource_name).map(|name| name.canonical_name())
}

const fn known_classes(interface_type: InterfaceType) -> &'static [&'static str] {
    match interface_type {
        InterfaceType::Gpib => &["INSTR", "INTFC"],
        InterfaceType::Tcpip => &["INSTR", "SOCKET"],
        InterfaceType::Usb => &["INSTR", "RAW"],
        InterfaceType::Asrl => &["INSTR"],
        InterfaceType::Pxi => &["BACKPLANE", "MEMACC"],
        InterfaceType::Vxi => &["BACKPLANE", "INSTR", "MEMACC", "SERVANT"],
        InterfaceType::Unknown => &[],
    }
}

/// Default resource class when the string omits it.
///
/// TCPIP names default to SOCKET when the trailing part is a bare port
/// number and to INSTR otherwise; PXI has no default.
fn default_class(interface_type: InterfaceType, parts: &[&str]) -> Option<String> {
    match interface_type {
        InterfaceType::Gpib
        | InterfaceType::Asrl
        | InterfaceType::Usb
        | InterfaceType::Vxi => Some("INSTR".to_string()),
        InterfaceType::Tcpip => {
            let class = match parts {
                [_, _, port] if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                    "SOCKET"
                }
                _ => "INSTR",
            };
            Some(class.to_string())
        }
        InterfaceType::Pxi | InterfaceType::Unknown => None,
    }
}

fn syntax_for(interface_type: InterfaceType, resource_class: &str) -> &'static str {
    match (interface_type, resource_class) {
        (InterfaceType::Gpib, "INSTR") => {
            "GPIB[board]::primary address[::secondary address][::INSTR]"
        }
        (InterfaceType::Gpib, _) => "GPIB[board]::INTFC",
        (InterfaceType::Asrl, _) => "ASRL[board][::INSTR]",
        (InterfaceType::Tcpip, "SOCKET") => "TCPIP[board]::host address::port[::SOCKET]",
        (InterfaceType::Tcpip, _) => "TCPIP[board]::host address[::LAN device name][::INSTR]",
        (InterfaceType::Usb, "RAW") => {
            "USB[board]::manufacturer ID::model code::serial number[::USB interface number]::RAW"
        }
        (InterfaceType::Usb, _) => {
            "USB[board]::manufacturer ID::model code::serial number[::USB interface number][::INSTR]"
        }
        (InterfaceType::Pxi, "BACKPLANE") => "PXI[interface]::chassis number::BACKPLANE",
        (InterfaceType::Pxi, _) => "PXI[interface]::MEMACC",
        (InterfaceType::Vxi, "BACKPLANE") => "VXI[board][::VXI logical address]::BACKPLANE",
        (InterfaceType::Vxi, "INSTR") => "VXI[board]::VXI logical address[::INSTR]",
        (InterfaceType::Vxi, "MEMACC") => "VXI[board]::MEMACC",
        (InterfaceType::Vxi, _) => "VXI[board]::SERVANT",
        _ => "",
    }
}

/// One field of an interface-specific part list. `default == None`
/// marks a mandatory field.
struct FieldSpec {
    name: &'static str,
    default: Option<&'static str>,
}

const fn field(name: &'static str, default: Option<&'static str>) -> FieldSpec {
    FieldSpec { name, default }
}

/// Assign the `::`-separated parts to the field list.
///
/// The first field is the only one an empty part may select the
/// default for (the board number glued to the interface keyword);
/// later optional fields are skipped right-to-left when fewer parts
/// than fields were given.
fn assign_parts(parts: &[&str], fields: &[FieldSpec]) -> std::result::Result<Vec<String>, String> {
    let required = fields.iter().filter(|f| f.default.is_none()).count();
    if parts.len() < required {
        return Err("not enough parts".to_string());
    }
    if parts.len() > fields.len() {
        return Err("too many parts".to_string());
    }

    let mut assigned = Vec::with_capacity(fields.len());

    let (first, mut remaining_fields) = match fields.split_first() {
        Some((first, rest)) => (first, rest),
        None => return Ok(assigned),
    };
    let (head, mut pending) = parts.split_first().map_or(("", parts), |(head, rest)| (*head, rest));

    if head.is_empty() {
        match first.default {
            Some(default) => assigned.push(default.to_string()),
            None => return Err(format!("{} part is mandatory", first.name)),
        }
    } else {
        assigned.push(head.to_string());
    }

    while pending.len() < remaining_fields.len() {
        let current = &remaining_fields[0];
        remaining_fields = &remaining_fields[1..];

        match current.default {
            Some(default) => assigned.push(default.to_string()),
            None => {
                let (part, rest) = pending
                    .split_first()
                    .ok_or_else(|| format!("{} part is mandatory", current.name))?;
                if part.is_empty() {
                    return Err(format!("{} part is mandatory", current.name));
                }
                assigned.push((*part).to_string());
                pending = rest;
            }
        }
    }

    for part in pending {
        assigned.push((*part).to_string());
    }

    Ok(assigned)
}

fn parse_u32(value: &str, name: &str) -> std::result::Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("invalid {name}: '{value}'"))
}

fn parse_parts(
    interface_type: InterfaceType,
    resource_class: &str,
    parts: &[&str],
    resource_name: &str,
) -> Result<ResourceNameKind> {
    build_kind(interface_type, resource_class, parts).map_err(|detail| {
        Error::InvalidResourceName {
            resource_name: resource_name.to_string(),
            message: format!(
                "The syntax is '{}' ({detail}).",
                syntax_for(interface_type, resource_class)
            ),
        }
    })
}

fn build_kind(
    interface_type: InterfaceType,
    resource_class: &str,
    parts: &[&str],
) -> std::result::Result<ResourceNameKind, String> {
    match (interface_type, resource_class) {
        (InterfaceType::Gpib, "INSTR") => {
            let v = assign_parts(
                parts,
                &[
                    field("board", Some("0")),
                    field("primary address", None),
                    field("secondary address", Some("0")),
                ],
            )?;
            Ok(ResourceNameKind::GpibInstr {
                board: parse_u32(&v[0], "board")?,
                primary_address: parse_u32(&v[1], "primary address")?,
                secondary_address: parse_u32(&v[2], "secondary address")?,
            })
        }
        (InterfaceType::Gpib, "INTFC") => {
            let v = assign_parts(parts, &[field("board", Some("0"))])?;
            Ok(ResourceNameKind::GpibIntfc {
                board: parse_u32(&v[0], "board")?,
            })
        }
        (InterfaceType::Asrl, "INSTR") => {
            let v = assign_parts(parts, &[field("board", Some("0"))])?;
            Ok(ResourceNameKind::AsrlInstr {
                board: parse_u32(&v[0], "board")?,
            })
        }
        (InterfaceType::Tcpip, "INSTR") => {
            let v = assign_parts(
                parts,
                &[
                    field("board", Some("0")),
                    field("host address", None),
                    field("LAN device name", Some("inst0")),
                ],
            )?;
            Ok(ResourceNameKind::TcpipInstr {
                board: parse_u32(&v[0], "board")?,
                host_address: v[1].clone(),
                lan_device_name: v[2].clone(),
            })
        }
        (InterfaceType::Tcpip, "SOCKET") => {
            let v = assign_parts(
                parts,
                &[
                    field("board", Some("0")),
                    field("host address", None),
                    field("port", None),
                ],
            )?;
            Ok(ResourceNameKind::TcpipSocket {
                board: parse_u32(&v[0], "board")?,
                host_address: v[1].clone(),
                port: parse_u32(&v[2], "port")?,
            })
        }
        (InterfaceType::Usb, class @ ("INSTR" | "RAW")) => {
            let v = assign_parts(
                parts,
                &[
                    field("board", Some("0")),
                    field("manufacturer ID", None),
                    field("model code", None),
                    field("serial number", None),
                    field("USB interface number", Some("0")),
                ],
            )?;
            let board = parse_u32(&v[0], "board")?;
            let usb_interface_number = parse_u32(&v[4], "USB interface number")?;
            if class == "INSTR" {
                Ok(ResourceNameKind::UsbInstr {
                    board,
                    manufacturer_id: v[1].clone(),
                    model_code: v[2].clone(),
                    serial_number: v[3].clone(),
                    usb_interface_number,
                })
            } else {
                Ok(ResourceNameKind::UsbRaw {
                    board,
                    manufacturer_id: v[1].clone(),
                    model_code: v[2].clone(),
                    serial_number: v[3].clone(),
                    usb_interface_number,
                })
            }
        }
        (InterfaceType::Pxi, "BACKPLANE") => {
            let v = assign_parts(
                parts,
                &[field("interface", Some("0")), field("chassis number", None)],
            )?;
            Ok(ResourceNameKind::PxiBackplane {
                interface: parse_u32(&v[0], "interface")?,
                chassis_number: parse_u32(&v[1], "chassis number")?,
            })
        }
        (InterfaceType::Pxi, "MEMACC") => {
            let v = assign_parts(parts, &[field("interface", Some("0"))])?;
            Ok(ResourceNameKind::PxiMemacc {
                interface: parse_u32(&v[0], "interface")?,
            })
        }
        (InterfaceType::Vxi, "BACKPLANE") => {
            let v = assign_parts(
                parts,
                &[
                    field("board", Some("0")),
                    field("VXI logical address", Some("0")),
                ],
            )?;
            Ok(ResourceNameKind::VxiBackplane {
                board: parse_u32(&v[0], "board")?,
                logical_address: parse_u32(&v[1], "VXI logical address")?,
            })
        }
        (InterfaceType::Vxi, "INSTR") => {
            let v = assign_parts(
                parts,
                &[
                    field("board", Some("0")),
                    field("VXI logical address", None),
                ],
            )?;
            Ok(ResourceNameKind::VxiInstr {
                board: parse_u32(&v[0], "board")?,
                logical_address: parse_u32(&v[1], "VXI logical address")?,
            })
        }
        (InterfaceType::Vxi, "MEMACC") => {
            let v = assign_parts(parts, &[field("board", Some("0"))])?;
            Ok(ResourceNameKind::VxiMemacc {
                board: parse_u32(&v[0], "board")?,
            })
        }
        (InterfaceType::Vxi, "SERVANT") => {
            let v = assign_parts(parts, &[field("board", Some("0"))])?;
            Ok(ResourceNameKind::VxiServant {
                board: parse_u32(&v[0], "board")?,
            })
        }
        (interface, class) => Err(format!("no parser for ({interface}, {class})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(name: &str) -> ResourceName {
        ResourceName::parse(name).unwrap()
    }

    #[test]
    fn test_unknown_interface_type() {
        let err = ResourceName::parse("RJ45::1").unwrap_err();
        assert!(err.to_string().contains("Unknown interface type"));
    }

    #[test]
    fn test_missing_default_class() {
        let err = ResourceName::parse("PXI::1").unwrap_err();
        assert!(err.to_string().contains("not provided and default not found"));
    }

    #[test]
    fn test_not_enough_parts() {
        let err = ResourceName::parse("TCPIP::SOCKET").unwrap_err();
        assert!(err.to_string().contains("not enough parts"));
    }

    #[test]
    fn test_missing_mandatory_part() {
        let err = ResourceName::parse("GPIB::INSTR").unwrap_err();
        assert!(err.to_string().contains("primary address part is mandatory"));
    }

    #[test]
    fn test_too_many_parts() {
        let err = ResourceName::parse("GPIB1::1::1::1::INSTR").unwrap_err();
        assert!(err.to_string().contains("too many parts"));
    }

    #[test]
    fn test_malformed_number() {
        let err = ResourceName::parse("GPIB::first::INSTR").unwrap_err();
        assert!(err.to_string().contains("invalid primary address"));
    }

    #[test]
    fn test_gpib_defaults() {
        let name = parsed("GPIB::1::INSTR");
        assert_eq!(
            name.kind(),
            &ResourceNameKind::GpibInstr {
                board: 0,
                primary_address: 1,
                secondary_address: 0,
            }
        );
        assert_eq!(name.canonical_name(), "GPIB0::1::0::INSTR");
        assert!(!name.is_resource_class_default());
    }

    #[test]
    fn test_class_defaulting_is_recorded() {
        let name = parsed("GPIB1::1");
        assert_eq!(name.resource_class(), "INSTR");
        assert!(name.is_resource_class_default());
        assert_eq!(name.canonical_name(), "GPIB1::1::0::INSTR");
    }

    #[test]
    fn test_tcpip_instr_defaults() {
        let name = parsed("TCPIP::192.168.134.102");
        assert_eq!(
            name.kind(),
            &ResourceNameKind::TcpipInstr {
                board: 0,
                host_address: "192.168.134.102".to_string(),
                lan_device_name: "inst0".to_string(),
            }
        );
        assert_eq!(name.canonical_name(), "TCPIP0::192.168.134.102::inst0::INSTR");
    }

    #[test]
    fn test_tcpip_socket_defaulted_from_port() {
        // A bare trailing port selects SOCKET when the class is omitted.
        let name = parsed("TCPIP::1.2.3.4::999");
        assert_eq!(
            name.kind(),
            &ResourceNameKind::TcpipSocket {
                board: 0,
                host_address: "1.2.3.4".to_string(),
                port: 999,
            }
        );
        assert!(name.is_resource_class_default());

        // A non-numeric trailing part is a LAN device name.
        let name = parsed("TCPIP::1.2.3.4::inst3");
        assert_eq!(name.resource_class(), "INSTR");
        assert!(name.is_resource_class_default());
    }

    #[test]
    fn test_usb_instr() {
        let name = parsed("USB::0x1234::125::A22-5::INSTR");
        assert_eq!(
            name.kind(),
            &ResourceNameKind::UsbInstr {
                board: 0,
                manufacturer_id: "0x1234".to_string(),
                model_code: "125".to_string(),
                serial_number: "A22-5".to_string(),
                usb_interface_number: 0,
            }
        );
        assert_eq!(name.canonical_name(), "USB0::0x1234::125::A22-5::0::INSTR");

        let name = parsed("USB2::0x1234::125::A22-5::3::RAW");
        assert_eq!(name.canonical_name(), "USB2::0x1234::125::A22-5::3::RAW");
    }

    #[test]
    fn test_asrl_without_class() {
        let name = parsed("ASRL1");
        assert_eq!(name.kind(), &ResourceNameKind::AsrlInstr { board: 1 });
        assert_eq!(name.canonical_name(), "ASRL1::INSTR");
    }

    #[test]
    fn test_vxi_variants() {
        assert_eq!(parsed("VXI::1::BACKPLANE").canonical_name(), "VXI0::1::BACKPLANE");
        assert_eq!(parsed("VXI::1::INSTR").canonical_name(), "VXI0::1::INSTR");
        assert_eq!(parsed("VXI::SERVANT").canonical_name(), "VXI0::SERVANT");
        assert_eq!(parsed("VXI::MEMACC").canonical_name(), "VXI0::MEMACC");
    }

    #[test]
    fn test_pxi_variants() {
        assert_eq!(parsed("PXI::1::BACKPLANE").canonical_name(), "PXI0::1::BACKPLANE");
        assert_eq!(parsed("PXI::MEMACC").canonical_name(), "PXI0::MEMACC");
    }

    #[test]
    fn test_case_insensitive_keyword() {
        let name = parsed("gpib0::8::instr");
        assert_eq!(name.canonical_name(), "GPIB0::8::0::INSTR");
    }

    #[test]
    fn test_round_trip_structural_equality() {
        for raw in [
            "GPIB::1::INSTR",
            "GPIB1::1",
            "GPIB3::INTFC",
            "ASRL1",
            "TCPIP::dev.company.com::INSTR",
            "TCPIP3::1.2.3.4::inst3::INSTR",
            "TCPIP::1.2.3.4::999",
            "USB::0x1234::125::A22-5",
            "USB2::0x1234::125::A22-5::3::RAW",
            "PXI::1::BACKPLANE",
            "VXI::1::INSTR",
            "VXI::SERVANT",
        ] {
            let name = parsed(raw);
            let reparsed = parsed(&name.canonical_name());
            assert_eq!(name, reparsed, "round trip failed for {raw}");
            // Canonical form is a fixed point.
            assert_eq!(name.canonical_name(), reparsed.canonical_name());
        }
    }

    #[test]
    fn test_resource_info_forms() {
        let name = parsed("TCPIP0::localhost::inst0::INSTR");

        let basic = name.to_resource_info(false);
        assert_eq!(basic.interface_type, InterfaceType::Tcpip);
        assert_eq!(basic.resource_class, None);

        let extended = name.to_resource_info(true);
        assert_eq!(extended.resource_class.as_deref(), Some("INSTR"));
        assert_eq!(extended.resource_name, "TCPIP0::localhost::inst0::INSTR");
    }

    #[test]
    fn test_serde_as_canonical_string() {
        let name = parsed("GPIB::7::INSTR");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"GPIB0::7::0::INSTR\"");
        let back: ResourceName = serde_json::from_str(&json).unwrap();
        assert_eq!(name, back);
    }
}
