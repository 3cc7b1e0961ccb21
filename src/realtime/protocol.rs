use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::direct_messages::DirectMessageResponse;
use crate::models::notifications;

// ── Client -> Server messages ──

/// Messages the client sends to the server over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Send a direct message.
    SendMessage { receiver_id: Uuid, content: String },
    /// Mark a received message as read.
    MarkRead { message_id: Uuid },
    Typing { receiver_id: Uuid },
    StopTyping { receiver_id: Uuid },
}

// ── Server -> Client messages ──

/// Messages the server pushes to connected users.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A direct message was sent to or by this user.
    NewMessage { message: DirectMessageResponse },
    /// A message this user sent was read.
    MessageRead { message_id: Uuid },
    /// A notification was created for this user.
    Notification { notification: notifications::Model },
    UserTyping { user_id: Uuid },
    UserStopTyping { user_id: Uuid },
    Error { message: String },
}
