//! The socket driver: ties the accept loops into the router and runs
//! the puppet-channel idle reaper.

use crate::socket_connection::PUPPET_CHANNEL_PREFIX;
use router_core::config::RouterConfig;
use router_core::ids::SessionId;
use router_core::router::{ConnectionDriver, Router};
use std::sync::Arc;
use std::time::Duration;

/// Registered with the [`Router`] so it learns when a session's
/// connection should be torn down from the router side (e.g. an admin
/// disconnect), and owns the periodic sweep that closes puppet
/// channels nobody has used in a while.
pub struct SocketDriver {
    router: Arc<Router>,
}

impl SocketDriver {
    /// Creates a driver bound to `router` and registers it so the
    /// router can reach back into it via [`ConnectionDriver`].
    pub fn register(router: Arc<Router>) -> Arc<Self> {
        let driver = Arc::new(SocketDriver { router: router.clone() });
        router.add_driver(driver.clone());
        driver
    }

    /// Spawns the puppet idle reaper as a background task, sweeping
    /// every session once per `config.puppet_idle_secs / 2` (bounded
    /// to a sane minimum) and closing any `"Puppet "`-prefixed channel
    /// that has gone `puppet_idle_secs` without activity.
    pub fn spawn_puppet_reaper(self: &Arc<Self>, config: Arc<RouterConfig>) {
        let router = self.router.clone();
        let sweep_interval = Duration::from_secs((config.puppet_idle_secs / 2).max(5));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                ticker.tick().await;
                let mut total_closed = 0;
                for session in router.all_sessions() {
                    total_closed +=
                        session.close_idle_channels(PUPPET_CHANNEL_PREFIX, config.puppet_idle_secs as i64);
                }
                if total_closed > 0 {
                    log::info!(target: "driver", "puppet reaper closed {} idle channel(s)", total_closed);
                }
            }
        });
    }
}

impl ConnectionDriver for SocketDriver {
    fn on_release_connection(&self, session_id: SessionId) {
        if let Some(session) = self.router.get_session(session_id) {
            session.request_disconnect();
        }
    }
}
