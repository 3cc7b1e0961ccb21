use std::collections::HashMap;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::realtime::protocol::ServerMessage;

/// A handle to send messages to one WebSocket connection.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub connection_id: Uuid,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

/// Tracks live WebSocket connections per user. A user may hold several
/// connections (tabs, devices); pushes go to all of them.
#[derive(Default)]
pub struct RealtimeHub {
    /// user_id -> connected client handles
    users: RwLock<HashMap<Uuid, Vec<ClientHandle>>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns its id and the receiver the session
    /// should forward to the socket.
    pub async fn join(&self, user_id: Uuid) -> (Uuid, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();

        let mut users = self.users.write().await;
        users.entry(user_id).or_default().push(ClientHandle {
            connection_id,
            sender: tx,
        });

        (connection_id, rx)
    }

    pub async fn leave(&self, user_id: Uuid, connection_id: Uuid) {
        let mut users = self.users.write().await;
        if let Some(handles) = users.get_mut(&user_id) {
            handles.retain(|h| h.connection_id != connection_id);
            if handles.is_empty() {
                users.remove(&user_id);
            }
        }
    }

    /// Push to every connection of `user_id`. Offline users are skipped.
    pub async fn send_to_user(&self, user_id: Uuid, message: ServerMessage) {
        let users = self.users.read().await;
        if let Some(handles) = users.get(&user_id) {
            for handle in handles {
                // A failed send means the session is shutting down; leave() cleans up.
                let _ = handle.sender.send(message.clone());
            }
        }
    }
}
