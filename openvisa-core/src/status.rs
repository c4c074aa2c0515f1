//! VISA completion and error status codes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status code reported by a backend operation.
///
/// The numeric values are the ones defined by the VISA library
/// specification, so a code obtained from a native backend can be
/// converted losslessly with [`StatusCode::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", from = "i32")]
#[non_exhaustive]
pub enum StatusCode {
    /// Operation completed successfully (`VI_SUCCESS`)
    Success,
    /// Unknown system error (`VI_ERROR_SYSTEM_ERROR`)
    ErrorSystemError,
    /// The given session reference is invalid (`VI_ERROR_INV_OBJECT`)
    ErrorInvalidObject,
    /// The resource is locked by another session (`VI_ERROR_RSRC_LOCKED`)
    ErrorResourceLocked,
    /// Invalid expression for resource search (`VI_ERROR_INV_EXPR`)
    ErrorInvalidExpression,
    /// Insufficient location information, or the device is not present
    /// (`VI_ERROR_RSRC_NFND`)
    ErrorResourceNotFound,
    /// Invalid resource reference (`VI_ERROR_INV_RSRC_NAME`)
    ErrorInvalidResourceName,
    /// Invalid access mode (`VI_ERROR_INV_ACC_MODE`)
    ErrorInvalidAccessMode,
    /// Timeout expired before the operation completed (`VI_ERROR_TMO`)
    ErrorTimeout,
    /// The attribute is not supported by the resource (`VI_ERROR_NSUP_ATTR`)
    ErrorNonsupportedAttribute,
    /// The attribute state is not supported (`VI_ERROR_NSUP_ATTR_STATE`)
    ErrorNonsupportedAttributeState,
    /// The session is not currently locked (`VI_ERROR_SESN_NLOCKED`)
    ErrorSessionNotLocked,
    /// A status code not covered by the known set
    Unknown(i32),
}

impl StatusCode {
    /// Get the raw VISA status value
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::ErrorSystemError => 0xBFFF_0000_u32 as i32,
            Self::ErrorInvalidObject => 0xBFFF_000E_u32 as i32,
            Self::ErrorResourceLocked => 0xBFFF_000F_u32 as i32,
            Self::ErrorInvalidExpression => 0xBFFF_0010_u32 as i32,
            Self::ErrorResourceNotFound => 0xBFFF_0011_u32 as i32,
            Self::ErrorInvalidResourceName => 0xBFFF_0012_u32 as i32,
            Self::ErrorInvalidAccessMode => 0xBFFF_0013_u32 as i32,
            Self::ErrorTimeout => 0xBFFF_0015_u32 as i32,
            Self::ErrorNonsupportedAttribute => 0xBFFF_001D_u32 as i32,
            Self::ErrorNonsupportedAttributeState => 0xBFFF_001E_u32 as i32,
            Self::ErrorSessionNotLocked => 0xBFFF_009C_u32 as i32,
            Self::Unknown(raw) => raw,
        }
    }

    /// Build a status code from a raw VISA status value
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw as u32 {
            0 => Self::Success,
            0xBFFF_0000 => Self::ErrorSystemError,
            0xBFFF_000E => Self::ErrorInvalidObject,
            0xBFFF_000F => Self::ErrorResourceLocked,
            0xBFFF_0010 => Self::ErrorInvalidExpression,
            0xBFFF_0011 => Self::ErrorResourceNotFound,
            0xBFFF_0012 => Self::ErrorInvalidResourceName,
            0xBFFF_0013 => Self::ErrorInvalidAccessMode,
            0xBFFF_0015 => Self::ErrorTimeout,
            0xBFFF_001D => Self::ErrorNonsupportedAttribute,
            0xBFFF_001E => Self::ErrorNonsupportedAttributeState,
            0xBFFF_009C => Self::ErrorSessionNotLocked,
            _ => Self::Unknown(raw),
        }
    }

    /// VISA symbolic constant name for this status
    #[must_use]
    pub const fn constant_name(self) -> &'static str {
        match self {
            Self::Success => "VI_SUCCESS",
            Self::ErrorSystemError => "VI_ERROR_SYSTEM_ERROR",
            Self::ErrorInvalidObject => "VI_ERROR_INV_OBJECT",
            Self::ErrorResourceLocked => "VI_ERROR_RSRC_LOCKED",
            Self::ErrorInvalidExpression => "VI_ERROR_INV_EXPR",
            Self::ErrorResourceNotFound => "VI_ERROR_RSRC_NFND",
            Self::ErrorInvalidResourceName => "VI_ERROR_INV_RSRC_NAME",
            Self::ErrorInvalidAccessMode => "VI_ERROR_INV_ACC_MODE",
            Self::ErrorTimeout => "VI_ERROR_TMO",
            Self::ErrorNonsupportedAttribute => "VI_ERROR_NSUP_ATTR",
            Self::ErrorNonsupportedAttributeState => "VI_ERROR_NSUP_ATTR_STATE",
            Self::ErrorSessionNotLocked => "VI_ERROR_SESN_NLOCKED",
            Self::Unknown(_) => "VI_ERROR_UNKNOWN",
        }
    }

    /// Human-readable description of this status
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully.",
            Self::ErrorSystemError => "Unknown system error.",
            Self::ErrorInvalidObject => "The given session reference is invalid.",
            Self::ErrorResourceLocked => {
                "Specified type of lock cannot be obtained because the resource is already locked."
            }
            Self::ErrorInvalidExpression => "Invalid expression specified for search.",
            Self::ErrorResourceNotFound => {
                "Insufficient location information or the device is not present in the system."
            }
            Self::ErrorInvalidResourceName => {
                "Invalid resource reference specified. Parsing error."
            }
            Self::ErrorInvalidAccessMode => "Invalid access mode.",
            Self::ErrorTimeout => "Timeout expired before operation completed.",
            Self::ErrorNonsupportedAttribute => {
                "The specified attribute is not defined by the referenced resource."
            }
            Self::ErrorNonsupportedAttributeState => {
                "The specified state of the attribute is not valid for the resource."
            }
            Self::ErrorSessionNotLocked => "The current session did not have a lock on the resource.",
            Self::Unknown(_) => "Unknown status code.",
        }
    }

    /// Whether this status reports a failure
    #[must_use]
    pub const fn is_error(self) -> bool {
        self.as_raw() < 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.constant_name(), self.as_raw(), self.description())
    }
}

impl From<StatusCode> for i32 {
    fn from(code: StatusCode) -> Self {
        code.as_raw()
    }
}

impl From<i32> for StatusCode {
    fn from(raw: i32) -> Self {
        Self::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip() {
        for code in [
            StatusCode::Success,
            StatusCode::ErrorInvalidObject,
            StatusCode::ErrorResourceLocked,
            StatusCode::ErrorInvalidExpression,
            StatusCode::ErrorResourceNotFound,
            StatusCode::ErrorTimeout,
            StatusCode::ErrorNonsupportedAttribute,
            StatusCode::ErrorSessionNotLocked,
        ] {
            assert_eq!(StatusCode::from_raw(code.as_raw()), code);
        }
    }

    #[test]
    fn test_known_values() {
        assert_eq!(StatusCode::Success.as_raw(), 0);
        assert_eq!(StatusCode::ErrorTimeout.as_raw(), -1_073_807_339);
        assert_eq!(StatusCode::ErrorResourceLocked.as_raw(), -1_073_807_345);
        assert_eq!(StatusCode::ErrorResourceNotFound.as_raw(), -1_073_807_343);
    }

    #[test]
    fn test_error_detection() {
        assert!(!StatusCode::Success.is_error());
        assert!(StatusCode::ErrorTimeout.is_error());
        assert!(StatusCode::Unknown(-1).is_error());
    }

    #[test]
    fn test_display_names_the_constant() {
        let text = StatusCode::ErrorTimeout.to_string();
        assert!(text.contains("VI_ERROR_TMO"));
        assert!(text.contains("Timeout expired"));
    }
}
