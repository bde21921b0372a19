//! One task per websocket connection.
//!
//! The handshake validates the access token before the upgrade. After that the connection lives in two spawned
//! tasks: one forwards frames queued by the registry to the client, the other reads client frames and reacts to
//! them. Messages sent over the socket go through the same [`ChatApi`] as the REST endpoint, so persistence and
//! fan-out behave identically on both paths.

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::{Closed, Message, MessageStream, Session};
use futures::StreamExt;
use log::*;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use troca_engine::{ChatApi, ChatManagement};

use crate::{
    auth::{bearer_token, TokenIssuer},
    errors::{AuthError, ServerError},
    route,
    ws::{frame, ConnectionId, WsRegistry},
};

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

/// The frames clients may send. Everything else is logged and ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
enum ClientFrame {
    #[serde(rename_all = "camelCase")]
    JoinChat { chat_id: i64 },
    #[serde(rename_all = "camelCase")]
    LeaveChat { chat_id: i64 },
    #[serde(rename_all = "camelCase")]
    SendMessage { chat_id: i64, text: String },
}

route!(web_socket => Get "/ws" impl ChatManagement);
/// Route handler for the websocket endpoint.
///
/// The access token is taken from the `token` query parameter, falling back to the `Authorization: Bearer`
/// header. Connections without a valid token are rejected before the protocol upgrade.
pub async fn web_socket<B: ChatManagement + 'static>(
    req: HttpRequest,
    body: web::Payload,
    query: web::Query<TokenQuery>,
    issuer: web::Data<TokenIssuer>,
    registry: web::Data<WsRegistry>,
    chat_api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, actix_web::Error> {
    let token = query
        .into_inner()
        .token
        .or_else(|| bearer_token(&req).map(String::from))
        .ok_or(ServerError::AuthenticationError(AuthError::MissingToken))?;
    let claims = issuer.decode_token(&token).map_err(ServerError::AuthenticationError)?;
    let (response, session, msg_stream) = actix_ws::handle(&req, body)?;
    let (tx, rx) = unbounded_channel();
    let registry = registry.get_ref().clone();
    let conn_id = registry.connect(claims.sub, tx);
    info!("📡️ Websocket session opened for user #{} (connection {conn_id})", claims.sub);
    actix_web::rt::spawn(forward_frames(session.clone(), rx));
    actix_web::rt::spawn(client_loop(session, msg_stream, registry, chat_api, conn_id, claims.sub));
    Ok(response)
}

/// Pushes frames queued for this connection down the socket. Ends when the registry drops the sender or the
/// client goes away.
async fn forward_frames(mut session: Session, mut rx: UnboundedReceiver<String>) {
    while let Some(payload) = rx.recv().await {
        if session.text(payload).await.is_err() {
            break;
        }
    }
}

async fn client_loop<B: ChatManagement>(
    mut session: Session,
    mut msg_stream: MessageStream,
    registry: WsRegistry,
    chat_api: web::Data<ChatApi<B>>,
    conn_id: ConnectionId,
    user_id: i64,
) {
    while let Some(Ok(msg)) = msg_stream.next().await {
        match msg {
            Message::Text(text) => {
                if handle_frame(&mut session, &registry, chat_api.as_ref(), conn_id, user_id, &text).await.is_err() {
                    break;
                }
            },
            Message::Ping(bytes) => {
                if session.pong(&bytes).await.is_err() {
                    break;
                }
            },
            Message::Close(reason) => {
                debug!("📡️ Connection {conn_id} closed by client. {reason:?}");
                break;
            },
            _ => {},
        }
    }
    registry.disconnect(conn_id);
    let _ = session.close(None).await;
    info!("📡️ Websocket session ended for user #{user_id} (connection {conn_id})");
}

async fn handle_frame<B: ChatManagement>(
    session: &mut Session,
    registry: &WsRegistry,
    chat_api: &ChatApi<B>,
    conn_id: ConnectionId,
    user_id: i64,
    text: &str,
) -> Result<(), Closed> {
    let client_frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(f) => f,
        Err(e) => {
            debug!("📡️ Connection {conn_id} sent an unrecognised frame. {e}");
            return Ok(());
        },
    };
    match client_frame {
        ClientFrame::JoinChat { chat_id } => {
            registry.join_chat(conn_id, chat_id);
            session.text(frame("joinedChat", &json!({ "chatId": chat_id }))).await
        },
        ClientFrame::LeaveChat { chat_id } => {
            registry.leave_chat(conn_id, chat_id);
            session.text(frame("leftChat", &json!({ "chatId": chat_id }))).await
        },
        ClientFrame::SendMessage { chat_id, text } => match chat_api.send_message(chat_id, user_id, &text).await {
            Ok(message) => session.text(frame("messageSent", &message)).await,
            Err(e) => {
                debug!("📡️ Could not send message from connection {conn_id}. {e}");
                session.text(frame("messageError", &json!({ "error": e.to_string() }))).await
            },
        },
    }
}
