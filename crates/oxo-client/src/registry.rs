//! The set of currently-connected, server-known clients.
//!
//! Lookups by name are linear scans — the table is sized for a handful of
//! concurrent connections, the same scale the protocol's `USERS` listing
//! and 8-bit invitation slot ids already assume.

use std::sync::{Arc, Condvar, Mutex};

use oxo_player::Player;
use oxo_transport::Connection;

use crate::client::Client;

/// Upper bound on concurrently-registered clients.
pub const MAX_CLIENTS: usize = 64;

struct Inner<C: Connection> {
    clients: Vec<Arc<Client<C>>>,
}

/// Tracks every live connection and gates shutdown on all of them having
/// drained.
pub struct ClientRegistry<C: Connection> {
    inner: Mutex<Inner<C>>,
    empty: Condvar,
}

impl<C: Connection> ClientRegistry<C> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { clients: Vec::new() }),
            empty: Condvar::new(),
        }
    }

    /// Wraps `conn` in a fresh `Client` and adds it to the registry. Fails
    /// if the registry is already at capacity.
    pub fn register(&self, conn: C) -> Option<Arc<Client<C>>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.clients.len() >= MAX_CLIENTS {
            return None;
        }
        let client = Client::new(conn);
        inner.clients.push(Arc::clone(&client));
        Some(client)
    }

    /// Removes `client` from the registry. Wakes any thread blocked in
    /// `wait_for_empty` if this was the last one.
    pub fn unregister(&self, client: &Arc<Client<C>>) {
        let mut inner = self.inner.lock().unwrap();
        inner.clients.retain(|c| !Arc::ptr_eq(c, client));
        if inner.clients.is_empty() {
            self.empty.notify_all();
        }
    }

    /// Finds the active client currently logged in as `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<Arc<Client<C>>> {
        let inner = self.inner.lock().unwrap();
        inner.clients.iter().find_map(|client| {
            let logged_in_as = client.player()?;
            (logged_in_as.name() == name).then(|| Arc::clone(client))
        })
    }

    /// True if some *other* active client is already logged in as
    /// `player`. `excluding` is the client performing the login (which may
    /// legitimately hold no player yet, or be re-logging-in).
    pub fn is_player_active(&self, player: &Arc<Player>, excluding: &Arc<Client<C>>) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.clients.iter().any(|client| {
            if Arc::ptr_eq(client, excluding) {
                return false;
            }
            client
                .player()
                .is_some_and(|logged_in| Arc::ptr_eq(&logged_in, player))
        })
    }

    /// Every distinct player currently logged in, for the USERS listing.
    pub fn active_players(&self) -> Vec<Arc<Player>> {
        let inner = self.inner.lock().unwrap();
        inner.clients.iter().filter_map(|client| client.player()).collect()
    }

    /// Shuts down the read half of every active client's connection,
    /// unblocking their service loops so they can log out and exit.
    pub async fn shutdown_all(&self) {
        let clients: Vec<Arc<Client<C>>> = {
            let inner = self.inner.lock().unwrap();
            inner.clients.clone()
        };
        for client in clients {
            let _ = client.connection().shutdown_read().await;
        }
    }

    /// Blocks the calling thread until the registry holds no clients.
    /// Tolerates spurious wakeups. Safe to call from a dedicated shutdown
    /// thread while connection-handling tasks continue to run elsewhere.
    pub fn wait_for_empty(&self) {
        let guard = self.inner.lock().unwrap();
        let _guard = self
            .empty
            .wait_while(guard, |inner| !inner.clients.is_empty())
            .unwrap();
    }
}

impl<C: Connection> Default for ClientRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
