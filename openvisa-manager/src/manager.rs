//! Resource manager
//!
//! The [`ResourceManager`] owns the backend's resource-manager session,
//! performs discovery, and opens resource handles. Managers are kept in
//! a process-wide arena keyed by backend identity so that concurrent
//! [`ResourceManager::acquire`] calls for the same backend share one
//! live manager.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use openvisa_backend::VisaBackend;
use openvisa_core::{
    AccessMode, AttrValue, Error, ResourceInfo, ResourceKind, Result, SessionId, StatusCode,
};
use openvisa_rname::ResourceName;

use crate::registry;
use crate::resource::Resource;

/// Query used by discovery when the caller passes none
pub const DEFAULT_QUERY: &str = "?*::INSTR";

const DEFAULT_OPEN_TIMEOUT_MS: u64 = 2000;

static MANAGERS: Lazy<Mutex<HashMap<String, Weak<ResourceManager>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Options controlling how a resource is opened
///
/// # Example
/// ```
/// use openvisa_core::{AccessMode, ResourceKind};
/// use openvisa_manager::OpenOptions;
///
/// let options = OpenOptions::new()
///     .access_mode(AccessMode::ExclusiveLock)
///     .open_timeout(250_u64)
///     .kind(ResourceKind::Generic);
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    access_mode: AccessMode,
    open_timeout: AttrValue,
    kind: Option<ResourceKind>,
    attributes: Vec<(String, AttrValue)>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            access_mode: AccessMode::NoLock,
            open_timeout: AttrValue::UInt(DEFAULT_OPEN_TIMEOUT_MS),
            kind: None,
            attributes: Vec::new(),
        }
    }
}

impl OpenOptions {
    /// Options with all defaults: no lock, 2000 ms open timeout, kind
    /// resolved through the registry, no attribute assignments
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locking policy for the new session
    #[must_use]
    pub const fn access_mode(mut self, access_mode: AccessMode) -> Self {
        self.access_mode = access_mode;
        self
    }

    /// How long to wait for a lock before the open fails
    ///
    /// Accepts anything coercible to a number of milliseconds; the
    /// coercion is checked when the open runs.
    #[must_use]
    pub fn open_timeout(mut self, open_timeout: impl Into<AttrValue>) -> Self {
        self.open_timeout = open_timeout.into();
        self
    }

    /// Override the kind the handle should expose
    ///
    /// The override must be compatible with the registered kind for the
    /// resolved interface/class pair.
    #[must_use]
    pub const fn kind(mut self, kind: ResourceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Queue an attribute assignment to apply once the handle is open
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// Discovery and session brokering for one backend
///
/// Acquired through [`ResourceManager::acquire`] and shared: a second
/// acquisition for the same backend identity returns the same manager
/// while it is alive and open.
pub struct ResourceManager {
    backend: Arc<dyn VisaBackend>,
    identity: String,
    session: SessionId,
    closed: AtomicBool,
    open: Mutex<HashMap<SessionId, Weak<Resource>>>,
}

impl ResourceManager {
    /// Acquire the manager for a backend
    ///
    /// Creates the manager (and the backend's resource-manager session)
    /// on first acquisition and returns the shared instance afterwards.
    /// A manager that has been closed is replaced by a fresh one.
    ///
    /// # Errors
    /// Returns the backend error when the resource-manager session
    /// cannot be opened.
    pub async fn acquire(backend: Arc<dyn VisaBackend>) -> Result<Arc<Self>> {
        let identity = backend.identity();

        // The arena lock is held across creation so that concurrent
        // acquisitions for the same identity cannot both create.
        let mut arena = MANAGERS.lock().await;

        if let Some(existing) = arena.get(&identity).and_then(Weak::upgrade) {
            if !existing.closed.load(Ordering::SeqCst) {
                debug!(identity, "Reusing live resource manager");
                return Ok(existing);
            }
        }

        let session = backend.open_default_resource_manager().await?;
        let manager = Arc::new(Self {
            backend,
            identity: identity.clone(),
            session,
            closed: AtomicBool::new(false),
            open: Mutex::new(HashMap::new()),
        });
        arena.insert(identity.clone(), Arc::downgrade(&manager));

        debug!(identity, %session, "Created resource manager");

        Ok(manager)
    }

    /// Identity of the backend this manager drives
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The backend adapter behind this manager
    #[must_use]
    pub const fn backend(&self) -> &Arc<dyn VisaBackend> {
        &self.backend
    }

    /// The manager's own backend session
    ///
    /// # Errors
    /// Returns [`Error::InvalidSession`] once the manager is closed.
    pub fn session(&self) -> Result<SessionId> {
        if self.closed.load(Ordering::SeqCst) {
            Err(Error::InvalidSession)
        } else {
            Ok(self.session)
        }
    }

    /// List resource names matching a query
    ///
    /// `None` queries with [`DEFAULT_QUERY`], which matches every
    /// INSTR-class resource.
    ///
    /// # Errors
    /// Returns the backend error, including
    /// `VI_ERROR_INV_EXPR` for a malformed query.
    pub async fn list_resources(&self, query: Option<&str>) -> Result<Vec<String>> {
        let session = self.session()?;
        self.backend
            .find_resources(session, query.unwrap_or(DEFAULT_QUERY))
            .await
    }

    /// Map canonical resource names to their extended information for
    /// every resource matching a query
    ///
    /// # Errors
    /// Same failure modes as [`ResourceManager::list_resources`].
    pub async fn list_resources_info(
        &self,
        query: Option<&str>,
    ) -> Result<HashMap<String, ResourceInfo>> {
        let session = self.session()?;
        let names = self.list_resources(query).await?;

        let mut infos = HashMap::with_capacity(names.len());
        for name in names {
            let info = self.backend.parse_resource(session, &name, true).await?;
            infos.insert(name, info);
        }
        Ok(infos)
    }

    /// Parse a resource name through the backend
    ///
    /// # Errors
    /// Returns the backend error for unparsable names.
    pub async fn resource_info(&self, resource_name: &str, extended: bool) -> Result<ResourceInfo> {
        let session = self.session()?;
        self.backend
            .parse_resource(session, resource_name, extended)
            .await
    }

    /// Open a resource and register the handle with this manager
    ///
    /// The name is parsed, the kind resolved through the registry (or
    /// taken from the options override when compatible), the queued
    /// attribute names validated, and only then is the backend session
    /// opened. Attribute values are applied to the fresh handle; a
    /// value that fails to coerce closes the session again.
    ///
    /// # Errors
    /// Returns parse, registry, compatibility, attribute, or backend
    /// errors. Fails with [`Error::InvalidSession`] when the manager is
    /// closed, including a close that lands while the open is in
    /// flight.
    pub async fn open_resource(
        self: &Arc<Self>,
        resource_name: &str,
        options: OpenOptions,
    ) -> Result<Arc<Resource>> {
        let rm_session = self.session()?;
        let name = ResourceName::parse(resource_name)?;

        let registered =
            registry::lookup_resource_class(name.interface_type(), name.resource_class());
        let kind = match (options.kind, registered) {
            (Some(requested), Ok(registered)) => {
                if !requested.is_compatible_with(registered) {
                    return Err(Error::IncompatibleResourceKind {
                        requested,
                        registered,
                    });
                }
                requested
            }
            // An explicit override stands in for a missing registration.
            (Some(requested), Err(_)) => requested,
            (None, Ok(registered)) => registered,
            (None, Err(err)) => return Err(err),
        };

        for (attribute, _) in &options.attributes {
            if !kind.supports_attribute(attribute) {
                return Err(Error::InvalidValue {
                    message: format!("'{attribute}' is not a valid attribute for kind {kind}"),
                });
            }
        }

        let open_timeout = Duration::from_millis(options.open_timeout.as_millis()?);
        let session = self
            .backend
            .open_session(rm_session, &name, options.access_mode, open_timeout)
            .await?;

        let resource = Arc::new(Resource::new(
            Arc::downgrade(self),
            Arc::clone(&self.backend),
            name,
            kind,
            session,
            options.access_mode,
        ));

        {
            let mut open = self.open.lock().await;
            if self.closed.load(Ordering::SeqCst) {
                drop(open);
                // Closed while the open was in flight; hand the fresh
                // session straight back.
                let _ = resource.close_detached().await;
                return Err(Error::InvalidSession);
            }
            open.insert(session, Arc::downgrade(&resource));
        }

        for (attribute, value) in options.attributes {
            if let Err(err) = resource.set_attribute(&attribute, value) {
                let _ = resource.close().await;
                return Err(err);
            }
        }

        debug!(resource = %resource.name(), %session, kind = %kind, "Opened resource");

        Ok(resource)
    }

    /// Open a raw backend session without wrapping or registering it
    ///
    /// The caller owns the returned session and must close it through
    /// the backend. The manager's teardown will not reach it.
    ///
    /// # Errors
    /// Returns parse or backend errors.
    pub async fn open_bare_resource(
        &self,
        resource_name: &str,
        access_mode: AccessMode,
        open_timeout: Duration,
    ) -> Result<SessionId> {
        let rm_session = self.session()?;
        let name = ResourceName::parse(resource_name)?;
        self.backend
            .open_session(rm_session, &name, access_mode, open_timeout)
            .await
    }

    /// Open a resource, run `body` on it, and close it afterwards
    ///
    /// The handle is closed whether `body` succeeds or not; a close the
    /// body already performed is not an error.
    ///
    /// # Errors
    /// Returns the open error, the body error, or the close error, in
    /// that order of precedence.
    pub async fn with_resource<F, Fut, T>(
        self: &Arc<Self>,
        resource_name: &str,
        options: OpenOptions,
        body: F,
    ) -> Result<T>
    where
        F: FnOnce(Arc<Resource>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let resource = self.open_resource(resource_name, options).await?;
        let result = body(Arc::clone(&resource)).await;

        match (result, resource.close().await) {
            (Ok(value), Ok(_) | Err(Error::InvalidSession)) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), _) => Err(err),
        }
    }

    /// Handles opened through this manager that are still live
    pub async fn list_opened_resources(&self) -> Vec<Arc<Resource>> {
        let mut open = self.open.lock().await;
        open.retain(|_, weak| weak.upgrade().is_some());
        open.values().filter_map(Weak::upgrade).collect()
    }

    /// Status of the last operation on the manager session
    ///
    /// # Errors
    /// Returns [`Error::InvalidSession`] once the manager is closed.
    pub async fn last_status(&self) -> Result<StatusCode> {
        let session = self.session()?;
        self.backend.last_status(session).await
    }

    /// Close the manager, every registered handle, and the manager
    /// session
    ///
    /// Every handle is closed even when some fail; the first failure is
    /// reported after all attempts. A second close is a logged no-op.
    ///
    /// # Errors
    /// Returns the first handle or backend close error.
    pub async fn close(&self) -> Result<StatusCode> {
        let mut arena = MANAGERS.lock().await;
        let drained = {
            let mut open = self.open.lock().await;
            if self.closed.swap(true, Ordering::SeqCst) {
                debug!(identity = self.identity, "Resource manager already closed");
                return Ok(StatusCode::Success);
            }
            std::mem::take(&mut *open)
        };
        arena.remove(&self.identity);
        drop(arena);

        debug!(
            identity = self.identity,
            handles = drained.len(),
            "Closing resource manager"
        );

        let mut first_error = None;
        for (session, weak) in drained {
            let result = match weak.upgrade() {
                Some(resource) => resource.close_detached().await.map(|_| ()),
                // The handle was dropped without closing; release the
                // backend session directly.
                None => self.backend.close(session).await.map(|_| ()),
            };
            if let Err(err) = result {
                warn!(%session, %err, "Failed to close resource during manager teardown");
                first_error.get_or_insert(err);
            }
        }

        let status = self.backend.close(self.session).await;

        match first_error {
            Some(err) => Err(err),
            None => status,
        }
    }

    /// Drop a session from the table. Called by [`Resource::close`].
    pub(crate) async fn forget(&self, session: SessionId) {
        self.open.lock().await.remove(&session);
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            warn!(
                identity = self.identity,
                "Resource manager dropped while still open; call close() explicitly"
            );
        }
    }
}

impl std::fmt::Display for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Resource Manager of {}", self.identity)
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("identity", &self.identity)
            .field("session", &self.session)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_options_defaults() {
        let options = OpenOptions::new();
        assert_eq!(options.access_mode, AccessMode::NoLock);
        assert_eq!(options.open_timeout, AttrValue::UInt(2000));
        assert_eq!(options.kind, None);
        assert!(options.attributes.is_empty());
    }

    #[test]
    fn test_open_options_builder() {
        let options = OpenOptions::new()
            .access_mode(AccessMode::SharedLock)
            .open_timeout("500")
            .kind(ResourceKind::Generic)
            .attribute("timeout", 100_u64);

        assert_eq!(options.access_mode, AccessMode::SharedLock);
        assert_eq!(options.open_timeout.as_millis().unwrap(), 500);
        assert_eq!(options.kind, Some(ResourceKind::Generic));
        assert_eq!(options.attributes.len(), 1);
    }
}
