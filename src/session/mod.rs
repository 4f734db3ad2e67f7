//! Session state: which bearer token (if any) is stored, who it belongs to,
//! and a synchronous fan-out to every view that renders differently when
//! that changes.

pub mod storage;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, info, warn};

use crate::api::MarketApi;
use crate::error::{MarketError, Result};
use crate::models::{Role, Session, User};

pub use storage::{FileStorage, MemoryStorage, SessionStorage, TOKEN_KEY, USER_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { role: Role },
    LoggedOut,
}

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

/// Keeps a listener registered for as long as it is alive
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.lock() {
                registry.listeners.remove(&self.id);
            }
        }
    }
}

/// Observable session store, shared by every view through an `Arc`
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    admin_email: String,
    session: Mutex<Option<Session>>,
    registry: Arc<Mutex<Registry>>,
}

impl SessionStore {
    /// Build a store and restore whatever session the storage holds
    pub fn new(storage: Arc<dyn SessionStorage>, admin_email: impl Into<String>) -> Self {
        let admin_email = admin_email.into();
        let session = read_session(storage.as_ref(), &admin_email);
        if let Some(session) = &session {
            info!(role = ?session.role, "Restored stored session");
        }

        Self {
            storage,
            admin_email,
            session: Mutex::new(session),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_session().is_some()
    }

    /// True iff the stored user's email equals the configured admin email.
    /// Never fails: no user, or an unreadable one, means not admin.
    pub fn is_admin(&self) -> bool {
        self.lock_session()
            .as_ref()
            .map(Session::is_admin)
            .unwrap_or(false)
    }

    pub fn token(&self) -> Option<String> {
        self.lock_session().as_ref().map(|s| s.token.clone())
    }

    pub fn current(&self) -> Option<Session> {
        self.lock_session().clone()
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    /// Persist token and user, then notify listeners.
    ///
    /// An empty token is refused: it would not survive a restore. Either
    /// both keys are written or neither is left behind.
    pub fn login(&self, token: impl Into<String>, user: User) -> Result<Session> {
        let token = token.into();
        if token.is_empty() {
            warn!("Refusing to store an empty token");
            return Err(MarketError::Unauthenticated);
        }

        let user_json = serde_json::to_string(&user)?;
        self.storage.set(TOKEN_KEY, &token)?;
        if let Err(e) = self.storage.set(USER_KEY, &user_json) {
            if let Err(cleanup) = self.storage.remove(TOKEN_KEY) {
                warn!("Failed to roll back stored token: {cleanup}");
            }
            return Err(e);
        }

        let session = Session::new(token, Some(user), &self.admin_email);
        let role = session.role;
        *self.lock_session() = Some(session.clone());

        info!(?role, "Logged in");
        self.notify(SessionEvent::LoggedIn { role });
        Ok(session)
    }

    /// Drop the local session without talking to the backend.
    ///
    /// Local state is always cleared, even when the storage refuses the
    /// removal; that failure is only logged. Returns the session that was
    /// active, if any.
    pub fn clear(&self) -> Option<Session> {
        let previous = self.lock_session().take();

        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to remove {key} from session storage: {e}");
            }
        }

        self.notify(SessionEvent::LoggedOut);
        previous
    }

    /// Clear the local session, then tell the backend on a best-effort basis
    pub async fn logout(&self, api: &dyn MarketApi) {
        let previous = self.clear();
        info!("Logged out locally");

        let Some(session) = previous else {
            return;
        };
        if let Err(e) = api.logout(&session.token).await {
            warn!("Server logout failed: {}", e.user_message());
        }
    }

    /// Re-read storage, e.g. after another process changed the session file.
    /// Listeners are notified only when the authenticated state or role changed.
    pub fn reload(&self) {
        let fresh = read_session(self.storage.as_ref(), &self.admin_email);
        let event = {
            let mut current = self.lock_session();
            let before = current.as_ref().map(|s| s.role);
            let after = fresh.as_ref().map(|s| s.role);
            *current = fresh;
            match (before, after) {
                (b, a) if b == a => None,
                (_, Some(role)) => Some(SessionEvent::LoggedIn { role }),
                (_, None) => Some(SessionEvent::LoggedOut),
            }
        };

        if let Some(event) = event {
            debug!(?event, "Session changed in storage");
            self.notify(event);
        }
    }

    /// Register a listener invoked on every session change
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let mut registry = lock_registry(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, Arc::new(listener));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn listener_count(&self) -> usize {
        lock_registry(&self.registry).listeners.len()
    }

    /// Call every listener in registration order, outside the lock
    fn notify(&self, event: SessionEvent) {
        let listeners: Vec<Listener> = lock_registry(&self.registry)
            .listeners
            .values()
            .cloned()
            .collect();

        for listener in listeners {
            listener(&event);
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Require a logged-in session
    pub fn require(&self) -> Result<Session> {
        self.current().ok_or(MarketError::Unauthenticated)
    }
}

fn lock_registry(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read_session(storage: &dyn SessionStorage, admin_email: &str) -> Option<Session> {
    let token = match storage.get(TOKEN_KEY) {
        Ok(Some(token)) if !token.is_empty() => token,
        Ok(_) => return None,
        Err(e) => {
            warn!("Failed to read stored token: {e}");
            return None;
        }
    };

    let user = match storage.get(USER_KEY) {
        Ok(Some(raw)) => serde_json::from_str::<User>(&raw)
            .map_err(|e| warn!("Stored user is unreadable: {e}"))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read stored user: {e}");
            None
        }
    };

    Some(Session::new(token, user, admin_email))
}
