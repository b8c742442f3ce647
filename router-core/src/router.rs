//! The router: owns every session, maps connections to sessions, and
//! drives authentication.
//!
//! The router is designed to be driven from a single dedicated thread
//! (the "router thread" in the concurrency model): all of its public
//! methods are safe to call from other threads, but `service_all`
//! (the scheduling loop) is only ever meant to run on one thread at a
//! time.

use crate::error::RouterError;
use crate::ids::{EntityId, SessionId, SessionIdAllocator};
use crate::session::Session;
use crate::sync::RwLock;
use hashbrown::HashMap;
use std::sync::Arc;

/// The outcome of an authentication attempt against the external
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    /// Credentials were valid; the caller may attach a connection to
    /// the named entity's session.
    Accepted,
    /// Credentials were invalid.
    Rejected,
}

/// The interface the router uses to check credentials. Implemented by
/// whatever embeds the router (the application's account database);
/// kept as a trait so the router itself never depends on a particular
/// auth backend.
pub trait AuthBackend: Send + Sync {
    /// Validates a site id, entity name, and password, returning the
    /// entity to attach a session to on success.
    fn authenticate(&self, site_id: u32, name: &str, password: &str) -> Result<EntityId, AuthResult>;
}

struct RouterState {
    sessions: HashMap<SessionId, Arc<Session>>,
    by_entity: HashMap<EntityId, SessionId>,
    drivers: Vec<Arc<dyn ConnectionDriver>>,
}

/// Owns every live session and maps connections to sessions.
///
/// A single `Router` is shared (via `Arc`) between the router thread
/// and whatever threads accept new connections; internally it uses an
/// `RwLock` scoped tightly around the session-index mutation, never
/// held while calling into a `Session` or a `Channel`.
pub struct Router {
    state: RwLock<RouterState>,
    session_ids: SessionIdAllocator,
    auth: Arc<dyn AuthBackend>,
    client_window_size: u32,
}

impl Router {
    /// Creates a new, empty router using the given auth backend. Every
    /// session the router creates is given `client_window_size` as its
    /// receive window (see `RouterConfig::client_window_size`).
    pub fn new(auth: Arc<dyn AuthBackend>, client_window_size: u32) -> Self {
        Router {
            state: RwLock::new(RouterState {
                sessions: HashMap::new(),
                by_entity: HashMap::new(),
                drivers: Vec::new(),
            }),
            session_ids: SessionIdAllocator::default(),
            auth,
            client_window_size,
        }
    }

    /// Authenticates a client and returns the session it should
    /// attach to, creating one if the entity has none yet.
    ///
    /// If the entity already has a live session, that same session is
    /// returned so a reconnecting client resumes its existing state
    /// instead of getting a fresh one.
    pub fn authorize_client(
        &self,
        site_id: u32,
        name: &str,
        password: &str,
    ) -> Result<Arc<Session>, AuthResult> {
        let entity_id = self.auth.authenticate(site_id, name, password)?;
        Ok(self.session_for_entity(entity_id))
    }

    /// Re-validates credentials for a session that is attempting to
    /// reconnect to an entity it does not yet own (e.g. after a crash
    /// wiped the router's in-memory state). Unlike
    /// [`Router::authorize_client`], this does not create a new
    /// session for a first-time login.
    pub fn reauthorize_client(
        &self,
        site_id: u32,
        name: &str,
        password: &str,
    ) -> Result<Arc<Session>, RouterError> {
        let entity_id = self
            .auth
            .authenticate(site_id, name, password)
            .map_err(|_| RouterError::Protocol("authentication rejected".to_string()))?;
        let state = self.state.read();
        state
            .by_entity
            .get(&entity_id)
            .and_then(|sid| state.sessions.get(sid).cloned())
            .ok_or_else(|| RouterError::Internal("no existing session for reauthorized entity".to_string()))
    }

    fn session_for_entity(&self, entity_id: EntityId) -> Arc<Session> {
        {
            let state = self.state.read();
            if let Some(sid) = state.by_entity.get(&entity_id) {
                if let Some(session) = state.sessions.get(sid) {
                    return session.clone();
                }
            }
        }

        let session_id = self.session_ids.allocate();
        let session = Arc::new(Session::new(session_id, entity_id, self.client_window_size));
        let mut state = self.state.write();
        state.sessions.insert(session_id, session.clone());
        state.by_entity.insert(entity_id, session_id);
        log::info!(target: "router", "created {} for entity {}", session_id, entity_id);
        session
    }

    /// Looks up a session by id.
    pub fn get_session(&self, session_id: SessionId) -> Option<Arc<Session>> {
        self.state.read().sessions.get(&session_id).cloned()
    }

    /// Looks up the session currently bound to an entity, if any.
    pub fn get_session_for_entity(&self, entity_id: EntityId) -> Option<Arc<Session>> {
        let state = self.state.read();
        state.by_entity.get(&entity_id).and_then(|sid| state.sessions.get(sid).cloned())
    }

    /// Requests disconnection of a session's live connection. The
    /// session itself remains registered with the router.
    pub fn disconnect_session(&self, session_id: SessionId) -> Result<(), RouterError> {
        let session =
            self.get_session(session_id).ok_or(RouterError::UnknownSession(session_id))?;
        session.request_disconnect();
        Ok(())
    }

    /// Permanently removes a session from the router. Called once a
    /// session has been disconnected long enough that it will never
    /// be reconnected to (policy decision left to the caller).
    pub fn release_session(&self, session_id: SessionId) {
        let mut state = self.state.write();
        if let Some(session) = state.sessions.remove(&session_id) {
            state.by_entity.remove(&session.entity_id());
            log::info!(target: "router", "released {}", session_id);
        }
    }

    /// Returns every session currently registered, live or not.
    /// Intended for sweeps that need to inspect every session (e.g.
    /// the puppet idle reaper), as opposed to
    /// [`Router::sessions_needing_service`] which only returns ones
    /// with output to flush.
    pub fn all_sessions(&self) -> Vec<Arc<Session>> {
        self.state.read().sessions.values().cloned().collect()
    }

    /// Returns every session currently registered whose
    /// [`Session::needs_service`] reports pending work.
    pub fn sessions_needing_service(&self) -> Vec<Arc<Session>> {
        self.state
            .read()
            .sessions
            .values()
            .filter(|s| s.needs_service())
            .cloned()
            .collect()
    }

    /// Drives `Session::service()` for every session that currently
    /// has pending work. Intended to be called repeatedly from the
    /// single dedicated router/service thread.
    pub fn service_all(&self) {
        for session in self.sessions_needing_service() {
            session.service();
        }
    }

    /// True if the session has queued work a scheduling pass should
    /// drive via [`Session::service`]. Single-session counterpart of
    /// [`Router::sessions_needing_service`], for callers iterating
    /// their own session set (e.g. a driver that only cares about the
    /// one session it owns).
    pub fn session_needs_service(&self, session_id: SessionId) -> bool {
        self.get_session(session_id).map(|s| s.needs_service()).unwrap_or(false)
    }

    /// Subscribes a channel to a session, registering the session as
    /// the channel's listener and returning the session-scoped id the
    /// channel was assigned.
    pub fn add_channel(
        &self,
        session_id: SessionId,
        channel: Arc<dyn crate::channel::Channel>,
    ) -> Result<crate::ids::ChannelId, RouterError> {
        let session = self.get_session(session_id).ok_or(RouterError::UnknownSession(session_id))?;
        let channel_id = session.channel_added(channel.clone());
        channel.register_control_listener(session.clone() as Arc<dyn crate::channel::ChannelListener>);
        session.channel_added_notify(channel_id);
        Ok(channel_id)
    }

    /// Registers a connection driver with the router so its
    /// `release_connection` callback fires when the router tears down
    /// a session's transport on its own initiative (e.g. an admin
    /// disconnect). Drivers are otherwise independent of the router:
    /// they own accept loops and per-socket state themselves.
    pub fn add_driver(&self, driver: Arc<dyn ConnectionDriver>) {
        self.state.write().drivers.push(driver);
    }

    /// Notifies every registered driver that a session's connection
    /// should be released. Called once a session is far enough into
    /// teardown that drivers should stop considering it reachable.
    pub fn release_connection(&self, session_id: SessionId) {
        let drivers = self.state.read().drivers.clone();
        for driver in drivers {
            driver.on_release_connection(session_id);
        }
    }

    /// The number of sessions currently registered, live or not.
    pub fn session_count(&self) -> usize {
        self.state.read().sessions.len()
    }

    /// Every site id with at least one registered session.
    pub fn get_site_ids(&self) -> Vec<u32> {
        let state = self.state.read();
        let mut ids: Vec<u32> = state.by_entity.keys().map(|e| e.site_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Stats for every session currently registered under `site_id`.
    pub fn get_session_stats(&self, site_id: u32) -> Vec<crate::stats::SessionStats> {
        self.state
            .read()
            .sessions
            .values()
            .filter(|s| s.entity_id().site_id() == site_id)
            .map(|s| s.stats())
            .collect()
    }

    /// Entity ids with a live (connected) session under `site_id`.
    pub fn get_online_ids(&self, site_id: u32) -> Vec<EntityId> {
        self.state
            .read()
            .sessions
            .values()
            .filter(|s| s.entity_id().site_id() == site_id && s.is_connected())
            .map(|s| s.entity_id())
            .collect()
    }

    /// Count of entities with a live (connected) session under `site_id`.
    pub fn get_online_count(&self, site_id: u32) -> usize {
        self.state
            .read()
            .sessions
            .values()
            .filter(|s| s.entity_id().site_id() == site_id && s.is_connected())
            .count()
    }

    /// Stats for the session bound to a single entity, if any.
    pub fn get_entity_stats(&self, entity_id: EntityId) -> Option<crate::stats::SessionStats> {
        self.get_session_for_entity(entity_id).map(|s| s.stats())
    }
}

/// Callback interface a connection driver (e.g. the socket connection
/// driver) registers with the router so it learns when the router
/// wants a connection torn down, without the router depending on any
/// particular transport.
pub trait ConnectionDriver: Send + Sync {
    /// Called when the router wants the driver to release whatever
    /// transport resources it holds for `session_id`.
    fn on_release_connection(&self, session_id: SessionId);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AllowAll;
    impl AuthBackend for AllowAll {
        fn authenticate(&self, site_id: u32, name: &str, _password: &str) -> Result<EntityId, AuthResult> {
            if name == "reject" {
                Err(AuthResult::Rejected)
            } else {
                Ok(EntityId::new(site_id, 42))
            }
        }
    }

    #[test]
    fn authorize_client_creates_one_session_per_entity() {
        let router = Router::new(Arc::new(AllowAll), 64);
        let s1 = router.authorize_client(1, "alice", "pw").unwrap();
        let s2 = router.authorize_client(1, "alice", "pw").unwrap();
        assert_eq!(s1.session_id(), s2.session_id());
        assert_eq!(router.session_count(), 1);
    }

    #[test]
    fn authorize_client_rejects_bad_credentials() {
        let router = Router::new(Arc::new(AllowAll), 64);
        let result = router.authorize_client(1, "reject", "pw");
        assert_eq!(result.err(), Some(AuthResult::Rejected));
    }

    #[test]
    fn release_session_removes_entity_mapping() {
        let router = Router::new(Arc::new(AllowAll), 64);
        let session = router.authorize_client(1, "bob", "pw").unwrap();
        router.release_session(session.session_id());
        assert_eq!(router.session_count(), 0);
        assert!(router.get_session_for_entity(session.entity_id()).is_none());
    }

    #[test]
    fn query_surface_reports_sites_and_online_counts() {
        let router = Router::new(Arc::new(AllowAll), 64);
        router.authorize_client(1, "alice", "pw").unwrap();
        router.authorize_client(2, "carol", "pw").unwrap();

        assert_eq!(router.get_site_ids(), vec![1, 2]);
        assert_eq!(router.get_online_count(1), 0);
        assert_eq!(router.get_session_stats(1).len(), 1);
        assert!(router.get_online_ids(1).is_empty());
    }
}
