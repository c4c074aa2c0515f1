//! Backend capability trait consumed by the resource manager

use async_trait::async_trait;
use std::time::Duration;

use openvisa_core::{AccessMode, ResourceInfo, Result, SessionId, StatusCode};
use openvisa_rname::ResourceName;

/// Trait for instrument communication backends
///
/// This is the only surface the resource-manager layer uses to talk
/// to the underlying library:
/// - [`SimBackend`](crate::SimBackend) - In-memory simulation for tests and demos
/// - Future: bindings to a native VISA shared library
///
/// Every operation records a per-session last status retrievable with
/// [`last_status`](VisaBackend::last_status). Operations given a
/// session id the backend does not know fail with
/// [`Error::InvalidSession`](openvisa_core::Error::InvalidSession).
///
/// # Thread Safety
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait VisaBackend: Send + Sync {
    /// Stable identity of this backend instance
    ///
    /// Managers are deduplicated per identity: acquiring a manager for
    /// a backend whose identity is already live returns the existing
    /// manager.
    fn identity(&self) -> String;

    /// Open the backend-level session used for discovery and parsing
    ///
    /// # Errors
    /// Returns error if the backend cannot create the session
    async fn open_default_resource_manager(&self) -> Result<SessionId>;

    /// Close a session (resource-manager or per-resource)
    ///
    /// Closing a session releases any lock it holds.
    ///
    /// # Errors
    /// Returns error if the session is unknown
    async fn close(&self, session: SessionId) -> Result<StatusCode>;

    /// Enumerate configured resources matching a VISA query expression
    ///
    /// # Errors
    /// Returns error for an invalid session or query expression
    async fn find_resources(&self, session: SessionId, query: &str) -> Result<Vec<String>>;

    /// Parse a resource name through the manager session
    ///
    /// The extended form reports the resource class and any alias the
    /// backend knows for the resource; the basic form populates only
    /// interface type and board number.
    ///
    /// # Errors
    /// Returns error for an invalid session or unparseable name
    async fn parse_resource(
        &self,
        session: SessionId,
        resource_name: &str,
        extended: bool,
    ) -> Result<ResourceInfo>;

    /// Open a session to a resource
    ///
    /// When `access_mode` requests a lock and the resource is locked
    /// elsewhere, the call blocks up to `open_timeout` and then fails
    /// with a `VI_ERROR_TMO` status.
    ///
    /// # Errors
    /// Returns error if the resource is unknown, the session invalid,
    /// or the lock cannot be acquired in time
    async fn open_session(
        &self,
        manager_session: SessionId,
        resource_name: &ResourceName,
        access_mode: AccessMode,
        open_timeout: Duration,
    ) -> Result<SessionId>;

    /// Release the lock held by a session
    ///
    /// # Errors
    /// Returns a `VI_ERROR_SESN_NLOCKED` status when the session holds
    /// no lock
    async fn unlock(&self, session: SessionId) -> Result<StatusCode>;

    /// Status code of the most recent operation on a session
    ///
    /// # Errors
    /// Returns error if the session is unknown to the backend
    async fn last_status(&self, session: SessionId) -> Result<StatusCode>;
}
