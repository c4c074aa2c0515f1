//! In-memory simulated backend
//!
//! `SimBackend` implements the full adapter surface against a
//! configurable set of simulated instruments: discovery filters the
//! configured names, opens return fresh sessions, and exclusive locks
//! contend for real with timeouts. Tests and the interactive shell run
//! against it without any hardware.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use tracing::debug;

use openvisa_core::{AccessMode, Error, ResourceInfo, Result, SessionId, StatusCode};
use openvisa_rname::ResourceName;

use crate::adapter::VisaBackend;

/// Instruments configured when none are given explicitly
const DEFAULT_RESOURCES: [&str; 6] = [
    "ASRL1::INSTR",
    "GPIB0::8::0::INSTR",
    "TCPIP0::localhost::inst0::INSTR",
    "TCPIP0::localhost::10001::SOCKET",
    "USB0::0x1111::0x2222::0x4445::0::INSTR",
    "USB0::0x1111::0x2222::0x4445::0::RAW",
];

/// Simulated backend holding its instruments in memory
///
/// # Example
/// ```
/// use openvisa_backend::{SimBackend, VisaBackend};
///
/// # tokio_test::block_on(async {
/// let backend = SimBackend::new("sim@default");
///
/// let rm = backend.open_default_resource_manager().await.unwrap();
/// let found = backend.find_resources(rm, "?*::INSTR").await.unwrap();
/// assert!(found.iter().all(|name| name.ends_with("INSTR")));
/// # });
/// ```
#[derive(Clone)]
pub struct SimBackend {
    identity: String,
    state: Arc<Mutex<SimState>>,
}

struct ResourceRecord {
    name: ResourceName,
    alias: Option<String>,
    exclusive_holder: Option<SessionId>,
    shared_holders: Vec<SessionId>,
    released: Arc<Notify>,
}

impl ResourceRecord {
    fn new(name: ResourceName) -> Self {
        Self {
            name,
            alias: None,
            exclusive_holder: None,
            shared_holders: Vec::new(),
            released: Arc::new(Notify::new()),
        }
    }
}

enum SessionRecord {
    Manager,
    Resource { resource: String },
}

#[derive(Default)]
struct SimState {
    next_session: u64,
    resources: BTreeMap<String, ResourceRecord>,
    sessions: HashMap<SessionId, SessionRecord>,
    status: HashMap<SessionId, StatusCode>,
}

impl SimState {
    fn require_manager(&self, session: SessionId) -> Result<()> {
        match self.sessions.get(&session) {
            Some(SessionRecord::Manager) => Ok(()),
            Some(SessionRecord::Resource { .. }) => {
                Err(Error::visa(StatusCode::ErrorInvalidObject))
            }
            None => Err(Error::InvalidSession),
        }
    }

    fn set_status(&mut self, session: SessionId, status: StatusCode) {
        self.status.insert(session, status);
    }
}

impl SimBackend {
    /// Create a backend with the default simulated instrument set
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self::from_names(
            identity,
            DEFAULT_RESOURCES
                .iter()
                .filter_map(|raw| ResourceName::parse(raw).ok()),
        )
    }

    /// Create a backend with an explicit instrument list
    ///
    /// # Errors
    /// Returns error if any of the names does not parse
    pub fn with_resources<I, S>(identity: impl Into<String>, resources: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = resources
            .into_iter()
            .map(|raw| ResourceName::parse(raw.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_names(identity, parsed))
    }

    fn from_names(identity: impl Into<String>, names: impl IntoIterator<Item = ResourceName>) -> Self {
        let resources = names
            .into_iter()
            .map(|name| (name.canonical_name(), ResourceRecord::new(name)))
            .collect();

        Self {
            identity: identity.into(),
            state: Arc::new(Mutex::new(SimState {
                resources,
                ..SimState::default()
            })),
        }
    }

    /// Add a simulated instrument
    ///
    /// # Errors
    /// Returns error if the name does not parse
    pub async fn add_resource(&self, resource_name: &str) -> Result<()> {
        let name = ResourceName::parse(resource_name)?;
        let mut state = self.state.lock().await;
        state
            .resources
            .entry(name.canonical_name())
            .or_insert_with(|| ResourceRecord::new(name));
        Ok(())
    }

    /// Register an alias for an already configured instrument
    ///
    /// # Errors
    /// Returns error if the name does not parse or is not configured
    pub async fn add_alias(&self, alias: &str, resource_name: &str) -> Result<()> {
        let canonical = ResourceName::parse(resource_name)?.canonical_name();
        let mut state = self.state.lock().await;
        match state.resources.get_mut(&canonical) {
            Some(record) => {
                record.alias = Some(alias.to_string());
                Ok(())
            }
            None => Err(Error::InvalidValue {
                message: format!("'{canonical}' is not a configured resource"),
            }),
        }
    }

    /// Canonical names of all configured instruments
    pub async fn resource_names(&self) -> Vec<String> {
        self.state.lock().await.resources.keys().cloned().collect()
    }

    /// Number of sessions the backend currently considers open
    pub async fn open_session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }
}

impl std::fmt::Debug for SimBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimBackend")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VisaBackend for SimBackend {
    fn identity(&self) -> String {
        self.identity.clone()
    }

    async fn open_default_resource_manager(&self) -> Result<SessionId> {
        let mut state = self.state.lock().await;

        let session = SessionId::from_raw(state.next_session);
        state.next_session += 1;
        state.sessions.insert(session, SessionRecord::Manager);
        state.set_status(session, StatusCode::Success);

        debug!(%session, identity = %self.identity, "Sim: opened default resource manager");

        Ok(session)
    }

    async fn close(&self, session: SessionId) -> Result<StatusCode> {
        let mut state = self.state.lock().await;

        let Some(record) = state.sessions.remove(&session) else {
            return Err(Error::InvalidSession);
        };

        if let SessionRecord::Resource { resource } = record {
            if let Some(res) = state.resources.get_mut(&resource) {
                if res.exclusive_holder == Some(session) {
                    res.exclusive_holder = None;
                }
                res.shared_holders.retain(|holder| *holder != session);
                res.released.notify_waiters();
            }
            debug!(%session, resource, "Sim: closed resource session");
        } else {
            debug!(%session, "Sim: closed resource manager session");
        }

        state.status.remove(&session);

        Ok(StatusCode::Success)
    }

    async fn find_resources(&self, session: SessionId, query: &str) -> Result<Vec<String>> {
        let mut state = self.state.lock().await;
        state.require_manager(session)?;

        let result = openvisa_rname::filter(state.resources.keys().map(String::as_str), query);

        let status = match &result {
            Ok(_) => StatusCode::Success,
            Err(err) => err.status().unwrap_or(StatusCode::ErrorSystemError),
        };
        state.set_status(session, status);

        result
    }

    async fn parse_resource(
        &self,
        session: SessionId,
        resource_name: &str,
        extended: bool,
    ) -> Result<ResourceInfo> {
        let mut state = self.state.lock().await;
        state.require_manager(session)?;

        let name = match ResourceName::parse(resource_name) {
            Ok(name) => name,
            Err(err) => {
                state.set_status(session, StatusCode::ErrorInvalidResourceName);
                return Err(err);
            }
        };

        let mut info = name.to_resource_info(extended);
        if extended {
            if let Some(record) = state.resources.get(&info.resource_name) {
                info.alias.clone_from(&record.alias);
            }
        }

        state.set_status(session, StatusCode::Success);

        Ok(info)
    }

    async fn open_session(
        &self,
        manager_session: SessionId,
        resource_name: &ResourceName,
        access_mode: AccessMode,
        open_timeout: Duration,
    ) -> Result<SessionId> {
        let canonical = resource_name.canonical_name();
        let deadline = Instant::now() + open_timeout;

        loop {
            let released = {
                let mut state = self.state.lock().await;
                state.require_manager(manager_session)?;

                let Some(record) = state.resources.get(&canonical) else {
                    state.set_status(manager_session, StatusCode::ErrorResourceNotFound);
                    return Err(Error::visa(StatusCode::ErrorResourceNotFound));
                };

                let available = match access_mode {
                    AccessMode::NoLock => true,
                    AccessMode::SharedLock => record.exclusive_holder.is_none(),
                    AccessMode::ExclusiveLock => {
                        record.exclusive_holder.is_none() && record.shared_holders.is_empty()
                    }
                };

                if available {
                    let session = SessionId::from_raw(state.next_session);
                    state.next_session += 1;

                    if let Some(record) = state.resources.get_mut(&canonical) {
                        match access_mode {
                            AccessMode::NoLock => {}
                            AccessMode::ExclusiveLock => record.exclusive_holder = Some(session),
                            AccessMode::SharedLock => record.shared_holders.push(session),
                        }
                    }

                    state
                        .sessions
                        .insert(session, SessionRecord::Resource { resource: canonical.clone() });
                    state.set_status(manager_session, StatusCode::Success);
                    state.set_status(session, StatusCode::Success);

                    debug!(%session, resource = %canonical, mode = %access_mode, "Sim: opened session");

                    return Ok(session);
                }

                record.released.clone()
            };

            // Wait for the lock holder to release, re-check, and give
            // up once the open timeout has fully elapsed. The waiter is
            // registered before the wait so a release between the check
            // above and the wait is not lost.
            let notified = released.notified();
            tokio::pin!(notified);
            if notified.as_mut().enable() {
                continue;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero()
                || tokio::time::timeout(remaining, notified).await.is_err()
            {
                let mut state = self.state.lock().await;
                state.set_status(manager_session, StatusCode::ErrorTimeout);

                debug!(resource = %canonical, ?open_timeout, "Sim: lock wait timed out");

                return Err(Error::visa(StatusCode::ErrorTimeout));
            }
        }
    }

    async fn unlock(&self, session: SessionId) -> Result<StatusCode> {
        let mut state = self.state.lock().await;

        let resource = match state.sessions.get(&session) {
            Some(SessionRecord::Resource { resource }) => resource.clone(),
            Some(SessionRecord::Manager) => {
                return Err(Error::visa(StatusCode::ErrorSessionNotLocked));
            }
            None => return Err(Error::InvalidSession),
        };

        let Some(record) = state.resources.get_mut(&resource) else {
            return Err(Error::visa(StatusCode::ErrorSessionNotLocked));
        };

        let held = if record.exclusive_holder == Some(session) {
            record.exclusive_holder = None;
            true
        } else if record.shared_holders.contains(&session) {
            record.shared_holders.retain(|holder| *holder != session);
            true
        } else {
            false
        };

        if held {
            record.released.notify_waiters();
            state.set_status(session, StatusCode::Success);
            debug!(%session, resource, "Sim: released lock");
            Ok(StatusCode::Success)
        } else {
            state.set_status(session, StatusCode::ErrorSessionNotLocked);
            Err(Error::visa(StatusCode::ErrorSessionNotLocked))
        }
    }

    async fn last_status(&self, session: SessionId) -> Result<StatusCode> {
        let state = self.state.lock().await;
        state
            .status
            .get(&session)
            .copied()
            .ok_or(Error::InvalidSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_test_backend() -> SimBackend {
        SimBackend::with_resources("sim@test", ["TCPIP::192.168.200.200::INSTR"]).unwrap()
    }

    #[tokio::test]
    async fn test_discovery_filters_by_class() {
        let backend = SimBackend::new("sim@default");
        let rm = backend.open_default_resource_manager().await.unwrap();

        let instruments = backend.find_resources(rm, "?*::INSTR").await.unwrap();
        assert!(!instruments.is_empty());
        assert!(instruments.iter().all(|name| name.ends_with("::INSTR")));

        let everything = backend.find_resources(rm, "?*").await.unwrap();
        assert!(everything.len() > instruments.len());
    }

    #[tokio::test]
    async fn test_open_and_close_session() {
        let backend = lock_test_backend();
        let rm = backend.open_default_resource_manager().await.unwrap();
        let name = ResourceName::parse("TCPIP::192.168.200.200::INSTR").unwrap();

        let session = backend
            .open_session(rm, &name, AccessMode::NoLock, Duration::ZERO)
            .await
            .unwrap();
        assert_ne!(session, rm);
        assert_eq!(backend.open_session_count().await, 2);

        backend.close(session).await.unwrap();
        assert_eq!(backend.open_session_count().await, 1);

        // Closing twice is not valid.
        assert!(matches!(
            backend.close(session).await,
            Err(Error::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let backend = lock_test_backend();
        let rm = backend.open_default_resource_manager().await.unwrap();
        let name = ResourceName::parse("GPIB::5::INSTR").unwrap();

        let err = backend
            .open_session(rm, &name, AccessMode::NoLock, Duration::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::ErrorResourceNotFound));
        assert_eq!(
            backend.last_status(rm).await.unwrap(),
            StatusCode::ErrorResourceNotFound
        );
    }

    #[tokio::test]
    async fn test_exclusive_lock_contention() {
        let backend = lock_test_backend();
        let rm = backend.open_default_resource_manager().await.unwrap();
        let name = ResourceName::parse("TCPIP::192.168.200.200::INSTR").unwrap();

        let holder = backend
            .open_session(rm, &name, AccessMode::ExclusiveLock, Duration::ZERO)
            .await
            .unwrap();

        // Contended open times out.
        let err = backend
            .open_session(rm, &name, AccessMode::ExclusiveLock, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::ErrorTimeout));
        assert_eq!(backend.last_status(rm).await.unwrap(), StatusCode::ErrorTimeout);

        // After unlock the next exclusive open succeeds.
        backend.unlock(holder).await.unwrap();
        let second = backend
            .open_session(rm, &name, AccessMode::ExclusiveLock, Duration::from_millis(50))
            .await
            .unwrap();
        backend.close(second).await.unwrap();
    }

    #[tokio::test]
    async fn test_shared_lock_blocks_exclusive() {
        let backend = lock_test_backend();
        let rm = backend.open_default_resource_manager().await.unwrap();
        let name = ResourceName::parse("TCPIP::192.168.200.200::INSTR").unwrap();

        let shared = backend
            .open_session(rm, &name, AccessMode::SharedLock, Duration::ZERO)
            .await
            .unwrap();

        // A second shared holder is admitted immediately.
        let second = backend
            .open_session(rm, &name, AccessMode::SharedLock, Duration::ZERO)
            .await
            .unwrap();

        // Exclusive acquisition waits behind the shared holders.
        let err = backend
            .open_session(rm, &name, AccessMode::ExclusiveLock, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::ErrorTimeout));

        // One shared holder left still blocks exclusive access.
        backend.unlock(shared).await.unwrap();
        let err = backend
            .open_session(rm, &name, AccessMode::ExclusiveLock, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::ErrorTimeout));

        backend.unlock(second).await.unwrap();
        let exclusive = backend
            .open_session(rm, &name, AccessMode::ExclusiveLock, Duration::from_millis(50))
            .await
            .unwrap();
        backend.close(exclusive).await.unwrap();
    }

    #[tokio::test]
    async fn test_lock_released_by_close_wakes_waiter() {
        let backend = lock_test_backend();
        let rm = backend.open_default_resource_manager().await.unwrap();
        let name = ResourceName::parse("TCPIP::192.168.200.200::INSTR").unwrap();

        let holder = backend
            .open_session(rm, &name, AccessMode::ExclusiveLock, Duration::ZERO)
            .await
            .unwrap();

        let waiter = {
            let backend = backend.clone();
            let name = name.clone();
            tokio::spawn(async move {
                backend
                    .open_session(rm, &name, AccessMode::ExclusiveLock, Duration::from_secs(5))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        backend.close(holder).await.unwrap();

        let session = waiter.await.unwrap().unwrap();
        backend.close(session).await.unwrap();
    }

    #[tokio::test]
    async fn test_unlock_without_lock() {
        let backend = lock_test_backend();
        let rm = backend.open_default_resource_manager().await.unwrap();
        let name = ResourceName::parse("TCPIP::192.168.200.200::INSTR").unwrap();

        let session = backend
            .open_session(rm, &name, AccessMode::NoLock, Duration::ZERO)
            .await
            .unwrap();

        let err = backend.unlock(session).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::ErrorSessionNotLocked));
    }

    #[tokio::test]
    async fn test_discovery_requires_manager_session() {
        let backend = lock_test_backend();
        let rm = backend.open_default_resource_manager().await.unwrap();
        let name = ResourceName::parse("TCPIP::192.168.200.200::INSTR").unwrap();

        let session = backend
            .open_session(rm, &name, AccessMode::NoLock, Duration::ZERO)
            .await
            .unwrap();

        let err = backend.find_resources(session, "?*").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::ErrorInvalidObject));
    }

    #[tokio::test]
    async fn test_parse_resource_reports_alias() {
        let backend = lock_test_backend();
        backend
            .add_alias("MyDevice", "TCPIP::192.168.200.200::INSTR")
            .await
            .unwrap();
        let rm = backend.open_default_resource_manager().await.unwrap();

        let extended = backend
            .parse_resource(rm, "TCPIP::192.168.200.200::INSTR", true)
            .await
            .unwrap();
        assert_eq!(extended.resource_class.as_deref(), Some("INSTR"));
        assert_eq!(extended.alias.as_deref(), Some("MyDevice"));
        assert_eq!(
            extended.resource_name,
            "TCPIP0::192.168.200.200::inst0::INSTR"
        );

        let basic = backend
            .parse_resource(rm, "TCPIP::192.168.200.200::INSTR", false)
            .await
            .unwrap();
        assert_eq!(basic.resource_class, None);
        assert_eq!(basic.alias, None);
    }

    #[tokio::test]
    async fn test_last_status_unknown_session() {
        let backend = lock_test_backend();
        let err = backend
            .last_status(SessionId::from_raw(999))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSession));
    }
}
