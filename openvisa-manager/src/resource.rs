//! Open resource handles
//!
//! A [`Resource`] wraps one backend session together with its parsed
//! name, its resolved kind, and the locally held attribute state. It is
//! created by [`ResourceManager::open_resource`] and stays registered
//! with the manager until closed.
//!
//! [`ResourceManager::open_resource`]: crate::ResourceManager::open_resource

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, warn};

use openvisa_backend::VisaBackend;
use openvisa_core::{
    AccessMode, AttrValue, Error, ResourceInfo, ResourceKind, Result, SessionId, StatusCode,
};
use openvisa_rname::ResourceName;

use crate::manager::ResourceManager;

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);
const DEFAULT_WRITE_TERMINATION: &str = "\r\n";
const DEFAULT_CHUNK_SIZE: u64 = 20 * 1024;

struct ResourceState {
    session: Option<SessionId>,
    timeout: Duration,
    access_mode: AccessMode,
    read_termination: Option<String>,
    write_termination: String,
    chunk_size: u64,
}

/// An open session to a single resource
///
/// Handles must be closed explicitly with [`Resource::close`]; dropping
/// an open handle only logs a warning, the backend session stays open
/// until the owning manager is closed.
pub struct Resource {
    manager: Weak<ResourceManager>,
    backend: Arc<dyn VisaBackend>,
    name: ResourceName,
    kind: ResourceKind,
    state: Mutex<ResourceState>,
}

impl Resource {
    pub(crate) fn new(
        manager: Weak<ResourceManager>,
        backend: Arc<dyn VisaBackend>,
        name: ResourceName,
        kind: ResourceKind,
        session: SessionId,
        access_mode: AccessMode,
    ) -> Self {
        Self {
            manager,
            backend,
            name,
            kind,
            state: Mutex::new(ResourceState {
                session: Some(session),
                timeout: DEFAULT_TIMEOUT,
                access_mode,
                read_termination: None,
                write_termination: DEFAULT_WRITE_TERMINATION.to_string(),
                chunk_size: DEFAULT_CHUNK_SIZE,
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ResourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The parsed resource name
    #[must_use]
    pub const fn name(&self) -> &ResourceName {
        &self.name
    }

    /// The capability kind resolved when the resource was opened
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The backend session behind this handle
    ///
    /// # Errors
    /// Returns [`Error::InvalidSession`] once the handle is closed.
    pub fn session(&self) -> Result<SessionId> {
        self.state().session.ok_or(Error::InvalidSession)
    }

    /// Whether the handle still holds an open session
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().session.is_some()
    }

    /// Set a named attribute, coercing the value to the attribute type
    ///
    /// # Errors
    /// Returns [`Error::InvalidValue`] when the attribute is not valid
    /// for this handle's kind or the value cannot be coerced.
    pub fn set_attribute(&self, attribute: &str, value: AttrValue) -> Result<()> {
        if !self.kind.supports_attribute(attribute) {
            return Err(Error::InvalidValue {
                message: format!(
                    "'{attribute}' is not a valid attribute for kind {}",
                    self.kind
                ),
            });
        }

        let mut state = self.state();
        match attribute {
            "timeout" => state.timeout = Duration::from_millis(value.as_millis()?),
            "access_mode" => {
                state.access_mode = match value.as_uint()? {
                    0 => AccessMode::NoLock,
                    1 => AccessMode::ExclusiveLock,
                    2 => AccessMode::SharedLock,
                    other => {
                        return Err(Error::InvalidValue {
                            message: format!("{other} is not a valid access mode"),
                        });
                    }
                };
            }
            "read_termination" => {
                let termination = value.as_str()?;
                state.read_termination =
                    (!termination.is_empty()).then(|| termination.to_string());
            }
            "write_termination" => state.write_termination = value.as_str()?.to_string(),
            "chunk_size" => state.chunk_size = value.as_uint()?,
            _ => {
                return Err(Error::InvalidValue {
                    message: format!("'{attribute}' is not a known attribute"),
                });
            }
        }

        debug!(resource = %self.name, attribute, "Set attribute");

        Ok(())
    }

    /// Read a named attribute back
    ///
    /// # Errors
    /// Returns [`Error::InvalidValue`] when the attribute is not valid
    /// for this handle's kind.
    pub fn get_attribute(&self, attribute: &str) -> Result<AttrValue> {
        if !self.kind.supports_attribute(attribute) {
            return Err(Error::InvalidValue {
                message: format!(
                    "'{attribute}' is not a valid attribute for kind {}",
                    self.kind
                ),
            });
        }

        let state = self.state();
        let value = match attribute {
            "timeout" => AttrValue::from(state.timeout),
            "access_mode" => AttrValue::UInt(u64::from(state.access_mode.as_raw())),
            "read_termination" => {
                AttrValue::Str(state.read_termination.clone().unwrap_or_default())
            }
            "write_termination" => AttrValue::Str(state.write_termination.clone()),
            "chunk_size" => AttrValue::UInt(state.chunk_size),
            _ => {
                return Err(Error::InvalidValue {
                    message: format!("'{attribute}' is not a known attribute"),
                });
            }
        };

        Ok(value)
    }

    /// Release the lock held by this session
    ///
    /// # Errors
    /// Returns the backend error when the session holds no lock.
    pub async fn unlock(&self) -> Result<StatusCode> {
        let session = self.session()?;
        self.backend.unlock(session).await
    }

    /// Status of the last backend operation on this session
    ///
    /// # Errors
    /// Returns [`Error::InvalidSession`] once the handle is closed.
    pub async fn last_status(&self) -> Result<StatusCode> {
        let session = self.session()?;
        self.backend.last_status(session).await
    }

    /// Extended information for this resource
    ///
    /// Queries the backend when the owning manager is still alive so
    /// that aliases are reported; falls back to parse-derived
    /// information otherwise.
    ///
    /// # Errors
    /// Returns the backend error when the query fails.
    pub async fn resource_info(&self) -> Result<ResourceInfo> {
        if let Some(manager) = self.manager.upgrade() {
            let rm_session = manager.session()?;
            return self
                .backend
                .parse_resource(rm_session, &self.name.canonical_name(), true)
                .await;
        }

        Ok(self.name.to_resource_info(true))
    }

    /// Close the handle and its backend session
    ///
    /// The handle is deregistered from the owning manager first, then
    /// the backend session is closed.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSession`] when already closed.
    pub async fn close(&self) -> Result<StatusCode> {
        let session = {
            let mut state = self.state();
            state.session.take().ok_or(Error::InvalidSession)?
        };

        if let Some(manager) = self.manager.upgrade() {
            manager.forget(session).await;
        }

        debug!(resource = %self.name, %session, "Closing resource");

        self.backend.close(session).await
    }

    /// Close using an already drained session id, without touching the
    /// manager's table again. Used by the manager teardown loop.
    pub(crate) async fn close_detached(&self) -> Result<StatusCode> {
        let session = {
            let mut state = self.state();
            state.session.take().ok_or(Error::InvalidSession)?
        };

        self.backend.close(session).await
    }
}

impl Drop for Resource {
    fn drop(&mut self) {
        if let Ok(state) = self.state.lock() {
            if let Some(session) = state.session {
                warn!(
                    resource = %self.name,
                    %session,
                    "Resource dropped while still open; call close() explicitly"
                );
            }
        }
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name.canonical_name())
            .field("kind", &self.kind)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}
