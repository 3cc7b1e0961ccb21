use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use futures_util::StreamExt;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::jwt::JwtService;
use crate::auth::middleware::authenticate;
use crate::db::direct_messages as message_db;
use crate::models::users;
use crate::realtime::RealtimeHub;
use crate::realtime::protocol::{ClientMessage, ServerMessage};

/// Query params for the WebSocket handshake endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// GET /api/auth/ws/?token=<jwt>
///
/// Browsers can't send an Authorization header during the handshake, so the
/// access token travels in the query string.
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsQuery>,
    db: web::Data<DatabaseConnection>,
    jwt: web::Data<JwtService>,
    hub: web::Data<Arc<RealtimeHub>>,
) -> Result<HttpResponse, actix_web::Error> {
    let user = authenticate(&query.token, jwt.get_ref(), db.get_ref()).await?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;
    let (connection_id, rx) = hub.join(user.id).await;
    tracing::debug!(user_id = %user.id, %connection_id, "websocket connected");

    actix_web::rt::spawn(handle_ws_session(
        session,
        msg_stream,
        rx,
        connection_id,
        user,
        db.get_ref().clone(),
        hub.get_ref().clone(),
    ));

    Ok(response)
}

/// Reads client frames, forwards hub pushes, and leaves the hub on disconnect.
async fn handle_ws_session(
    mut session: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    connection_id: Uuid,
    user: users::Model,
    db: DatabaseConnection,
    hub: Arc<RealtimeHub>,
) {
    loop {
        tokio::select! {
            Some(msg) = msg_stream.next() => {
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Some(reply) = handle_client_message(&text, &user, &db, &hub).await {
                            if send(&mut session, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(Message::Ping(bytes)) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) | Err(_) => break,
                    _ => {}
                }
            }
            Some(server_msg) = rx.recv() => {
                if send(&mut session, &server_msg).await.is_err() {
                    break;
                }
            }
            else => break,
        }
    }

    hub.leave(user.id, connection_id).await;
    tracing::debug!(user_id = %user.id, %connection_id, "websocket closed");
    let _ = session.close(None).await;
}

async fn send(
    session: &mut actix_ws::Session,
    message: &ServerMessage,
) -> Result<(), actix_ws::Closed> {
    match serde_json::to_string(message) {
        Ok(json) => session.text(json).await,
        Err(_) => Ok(()),
    }
}

fn error(message: impl Into<String>) -> Option<ServerMessage> {
    Some(ServerMessage::Error {
        message: message.into(),
    })
}

/// Handle one client frame. Returns a message meant only for this socket.
async fn handle_client_message(
    text: &str,
    user: &users::Model,
    db: &DatabaseConnection,
    hub: &RealtimeHub,
) -> Option<ServerMessage> {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => return error(format!("Invalid message format: {e}")),
    };

    match client_msg {
        ClientMessage::SendMessage {
            receiver_id,
            content,
        } => match message_db::send(db, user, receiver_id, &content).await {
            Ok(saved) => {
                let msg = ServerMessage::NewMessage { message: saved };
                hub.send_to_user(receiver_id, msg.clone()).await;
                // Echo to the sender's other tabs and this one.
                if receiver_id != user.id {
                    hub.send_to_user(user.id, msg).await;
                }
                None
            }
            Err(e) => error(format!("Failed to send message: {e}")),
        },

        ClientMessage::MarkRead { message_id } => {
            match message_db::mark_read(db, user.id, message_id).await {
                Ok(message) => {
                    hub.send_to_user(message.sender_id, ServerMessage::MessageRead { message_id })
                        .await;
                    None
                }
                Err(e) => error(format!("Failed to mark message as read: {e}")),
            }
        }

        ClientMessage::Typing { receiver_id } => {
            hub.send_to_user(receiver_id, ServerMessage::UserTyping { user_id: user.id })
                .await;
            None
        }

        ClientMessage::StopTyping { receiver_id } => {
            hub.send_to_user(receiver_id, ServerMessage::UserStopTyping { user_id: user.id })
                .await;
            None
        }
    }
}
