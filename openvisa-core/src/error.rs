//! Error types for OpenVISA

use thiserror::Error;

use crate::status::StatusCode;
use crate::types::{InterfaceType, ResourceKind};

/// OpenVISA error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The resource name string does not match the grammar
    #[error("Could not parse '{resource_name}'. {message}")]
    InvalidResourceName {
        /// The offending resource name
        resource_name: String,
        /// Details, typically including the expected syntax
        message: String,
    },

    /// No construction strategy registered for the resolved pair
    #[error("No resource class registered for ({interface_type}, {resource_class:?})")]
    NoRegisteredClass {
        /// Interface type of the resolved resource
        interface_type: InterfaceType,
        /// Resource class of the resolved resource
        resource_class: String,
    },

    /// Invalid configuration value or option name
    #[error("Invalid value: {message}")]
    InvalidValue {
        /// Error message
        message: String,
    },

    /// A caller-supplied resource kind does not cover the capability
    /// set required for the resolved interface/class pair
    #[error("Resource kind {requested} is not compatible with the registered kind {registered}")]
    IncompatibleResourceKind {
        /// Kind requested by the caller
        requested: ResourceKind,
        /// Kind registered for the resolved pair
        registered: ResourceKind,
    },

    /// Failure status reported by the backend
    #[error("{status}")]
    Visa {
        /// Backend status code
        status: StatusCode,
    },

    /// Operation attempted on a closed session
    #[error("Invalid session handle. The resource might be closed.")]
    InvalidSession,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a backend error from a status code
    #[must_use]
    pub const fn visa(status: StatusCode) -> Self {
        Self::Visa { status }
    }

    /// The backend status carried by this error, if any
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Visa { status } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for OpenVISA operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visa_error_carries_status() {
        let err = Error::visa(StatusCode::ErrorTimeout);
        assert_eq!(err.status(), Some(StatusCode::ErrorTimeout));
        assert!(err.to_string().contains("VI_ERROR_TMO"));
    }

    #[test]
    fn test_non_visa_error_has_no_status() {
        let err = Error::InvalidSession;
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_parse_error_message() {
        let err = Error::InvalidResourceName {
            resource_name: "RJ45::1".to_string(),
            message: "Unknown interface type.".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("RJ45::1"));
        assert!(text.contains("Unknown interface type"));
    }
}
