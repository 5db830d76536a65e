// Device/session registry - single source of truth for the active device
use crate::domain::session::DeviceSession;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type Listener = Arc<dyn Fn(Option<&DeviceSession>) + Send + Sync>;
type ListenerMap = Arc<Mutex<BTreeMap<u64, Listener>>>;

/// Registry of known devices and their capture sessions, with one "current"
/// pointer. Constructed explicitly and passed by reference (or `Arc`) to
/// whoever needs device/session state; mutation methods are the only write
/// path and all reads go through [`current_context`](Self::current_context) /
/// [`all_sessions`](Self::all_sessions).
///
/// Invariant: the current device id is always either absent or a key present
/// in the map. Every mutation completes before listeners are notified, so a
/// listener never observes a half-applied update. Listeners run outside the
/// registry's locks, so subscribing or unsubscribing from inside one is safe;
/// mutating the registry from a listener re-enters notify and is on the
/// caller.
#[derive(Default)]
pub struct DeviceSessionRegistry {
    inner: Mutex<RegistryInner>,
    listeners: ListenerMap,
    next_listener_id: AtomicU64,
}

#[derive(Default)]
struct RegistryInner {
    sessions: BTreeMap<String, DeviceSession>,
    current_device_id: Option<String>,
}

/// Removes its listener when dropped.
pub struct RegistrySubscription {
    listeners: ListenerMap,
    id: u64,
}

impl DeviceSessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device (first sight creates the entry, later calls leave
    /// the stored entry untouched) and make it current.
    pub fn set_device(&self, device_id: &str, model: Option<&str>, manufacturer: Option<&str>) {
        {
            let mut inner = self.lock_inner();
            if !inner.sessions.contains_key(device_id) {
                inner.sessions.insert(
                    device_id.to_string(),
                    DeviceSession::new(
                        device_id.to_string(),
                        model.unwrap_or("Unknown").to_string(),
                        manufacturer.unwrap_or("Unknown").to_string(),
                    ),
                );
            }
            inner.current_device_id = Some(device_id.to_string());
        }
        self.notify();
    }

    /// Mark a registered device as capturing under the given session id.
    /// Unknown device ids are a logged no-op.
    pub fn start_session(&self, device_id: &str, session_id: i64) {
        let notified = {
            let mut inner = self.lock_inner();
            match inner.sessions.get_mut(device_id) {
                Some(session) => {
                    session.session_id = Some(session_id);
                    session.is_capturing = true;
                    true
                }
                None => {
                    tracing::warn!(device_id, "start_session for unregistered device ignored");
                    false
                }
            }
        };
        if notified {
            self.notify();
        }
    }

    /// Stop capturing. The session id is kept for audit/history.
    pub fn stop_session(&self, device_id: &str) {
        let notified = {
            let mut inner = self.lock_inner();
            match inner.sessions.get_mut(device_id) {
                Some(session) => {
                    session.is_capturing = false;
                    true
                }
                None => {
                    tracing::warn!(device_id, "stop_session for unregistered device ignored");
                    false
                }
            }
        };
        if notified {
            self.notify();
        }
    }

    /// Remove a device. If it was current, the pointer moves to an arbitrary
    /// remaining device, or clears when none remain.
    pub fn remove_device(&self, device_id: &str) {
        {
            let mut inner = self.lock_inner();
            inner.sessions.remove(device_id);
            if inner.current_device_id.as_deref() == Some(device_id) {
                inner.current_device_id = inner.sessions.keys().next().cloned();
            }
        }
        self.notify();
    }

    /// The current device's session state, if any device is selected.
    pub fn current_context(&self) -> Option<DeviceSession> {
        let inner = self.lock_inner();
        inner
            .current_device_id
            .as_ref()
            .and_then(|id| inner.sessions.get(id))
            .cloned()
    }

    pub fn all_sessions(&self) -> Vec<DeviceSession> {
        self.lock_inner().sessions.values().cloned().collect()
    }

    /// Register a listener invoked with the current context after every
    /// mutation. Dropping the returned subscription unregisters it.
    pub fn subscribe<F>(&self, listener: F) -> RegistrySubscription
    where
        F: Fn(Option<&DeviceSession>) + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.lock_listeners().insert(id, Arc::new(listener));
        RegistrySubscription {
            listeners: self.listeners.clone(),
            id,
        }
    }

    fn notify(&self) {
        let context = self.current_context();
        // Snapshot the listeners so none of the registry's locks are held
        // while callbacks run; a listener may then subscribe or drop a
        // subscription without deadlocking.
        let listeners: Vec<Listener> = self.lock_listeners().values().cloned().collect();
        for listener in listeners {
            listener(context.as_ref());
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_listeners(&self) -> MutexGuard<'_, BTreeMap<u64, Listener>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RegistrySubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for RegistrySubscription {
    fn drop(&mut self) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}
