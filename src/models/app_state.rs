use actix::Addr;
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::game::registry::ConnectionRegistry;
use crate::models::{ClientId, ClientText, GameSettings, Outbox};
use crate::websocket::GameSocket;

/// Application state shared between connections
///
/// Every action runs under the registry lock and its messages are handed to
/// the session mailboxes before the lock is released, so clients observe
/// updates in the order they were applied.
pub struct AppState {
    pub registry: Mutex<ConnectionRegistry>,
    pub sessions: Mutex<HashMap<ClientId, Addr<GameSocket>>>,
}

impl AppState {
    pub fn new(settings: GameSettings) -> Self {
        Self {
            registry: Mutex::new(ConnectionRegistry::new(settings)),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the number of open sessions.
    pub fn register(&self, client: ClientId, addr: Addr<GameSocket>) -> usize {
        let mut sessions = lock(&self.sessions);
        sessions.insert(client, addr);
        sessions.len()
    }

    /// Returns the number of open sessions.
    pub fn unregister(&self, client: ClientId) -> usize {
        let mut sessions = lock(&self.sessions);
        sessions.remove(&client);
        sessions.len()
    }

    pub fn handle_text(&self, client: ClientId, text: &str) {
        let mut registry = lock(&self.registry);
        let out = registry.handle_text(client, text);
        self.deliver(out);
    }

    /// Returns the number of lobbies still open.
    pub fn disconnect(&self, client: ClientId) -> usize {
        let mut registry = lock(&self.registry);
        let out = registry.disconnect(client);
        self.deliver(out);
        registry.lobby_count()
    }

    fn deliver(&self, out: Outbox) {
        let sessions = lock(&self.sessions);
        for delivery in out.into_deliveries() {
            match sessions.get(&delivery.to) {
                Some(addr) => addr.do_send(ClientText(delivery.message.to_text())),
                None => debug!("Client {} has no session, dropping message", delivery.to),
            }
        }
    }
}

/// Recover the guard from a poisoned lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
