//! Connection bookkeeping for the websocket layer.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        PoisonError,
        RwLock,
    },
};

use log::*;
use tokio::sync::mpsc::UnboundedSender;

/// Identifies a single websocket connection for its lifetime. A user with the app open on two devices holds two
/// connection ids under the same user id.
pub type ConnectionId = u64;

#[derive(Debug, Clone)]
struct ClientHandle {
    conn_id: ConnectionId,
    user_id: i64,
    sender: UnboundedSender<String>,
}

/// Tracks which connections belong to which user, and which chat channels each connection has joined.
///
/// The registry is the single owner of this state. It is cheap to clone (the maps live behind an `Arc`) and is
/// handed to the session handlers and the event hooks. Sends never propagate errors; a failed send means the
/// session task is gone, and the handle is dropped from the registry on the spot. Nothing here survives a
/// restart. Clients reconnect and re-fetch state over REST.
#[derive(Debug, Clone, Default)]
pub struct WsRegistry {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    users: RwLock<HashMap<i64, Vec<ClientHandle>>>,
    chats: RwLock<HashMap<i64, Vec<ClientHandle>>>,
}

impl WsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection for the user and returns its connection id.
    pub fn connect(&self, user_id: i64, sender: UnboundedSender<String>) -> ConnectionId {
        let conn_id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = ClientHandle { conn_id, user_id, sender };
        let mut users = self.inner.users.write().unwrap_or_else(PoisonError::into_inner);
        users.entry(user_id).or_default().push(handle);
        debug!("📡️ User #{user_id} connected (connection {conn_id})");
        conn_id
    }

    /// Removes the connection from the user channel and every chat channel it joined. Disconnecting a
    /// connection that was never registered is a no-op.
    pub fn disconnect(&self, conn_id: ConnectionId) {
        let mut users = self.inner.users.write().unwrap_or_else(PoisonError::into_inner);
        for handles in users.values_mut() {
            handles.retain(|h| h.conn_id != conn_id);
        }
        users.retain(|_, handles| !handles.is_empty());
        drop(users);
        let mut chats = self.inner.chats.write().unwrap_or_else(PoisonError::into_inner);
        for handles in chats.values_mut() {
            handles.retain(|h| h.conn_id != conn_id);
        }
        chats.retain(|_, handles| !handles.is_empty());
        debug!("📡️ Connection {conn_id} disconnected");
    }

    /// Subscribes the connection to a chat channel. Joining twice is a no-op.
    pub fn join_chat(&self, conn_id: ConnectionId, chat_id: i64) {
        let Some(handle) = self.handle_for(conn_id) else {
            warn!("📡️ Connection {conn_id} tried to join chat #{chat_id} but is not registered");
            return;
        };
        let mut chats = self.inner.chats.write().unwrap_or_else(PoisonError::into_inner);
        let members = chats.entry(chat_id).or_default();
        if members.iter().any(|h| h.conn_id == conn_id) {
            return;
        }
        debug!("📡️ User #{} (connection {conn_id}) joined chat #{chat_id}", handle.user_id);
        members.push(handle);
    }

    /// Removes the connection from a chat channel. Leaving a channel it never joined is a no-op.
    pub fn leave_chat(&self, conn_id: ConnectionId, chat_id: i64) {
        let mut chats = self.inner.chats.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(members) = chats.get_mut(&chat_id) {
            members.retain(|h| h.conn_id != conn_id);
            if members.is_empty() {
                chats.remove(&chat_id);
            }
            debug!("📡️ Connection {conn_id} left chat #{chat_id}");
        }
    }

    /// Sends a frame to every connection the user has open.
    pub fn send_to_user(&self, user_id: i64, payload: &str) {
        let mut users = self.inner.users.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(handles) = users.get_mut(&user_id) {
            deliver(handles, payload);
            if handles.is_empty() {
                users.remove(&user_id);
            }
        }
    }

    /// Sends a frame to every connection subscribed to the chat channel.
    pub fn send_to_chat(&self, chat_id: i64, payload: &str) {
        let mut chats = self.inner.chats.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(handles) = chats.get_mut(&chat_id) {
            deliver(handles, payload);
            if handles.is_empty() {
                chats.remove(&chat_id);
            }
        }
    }

    /// The number of live connections, across all users.
    pub fn connection_count(&self) -> usize {
        let users = self.inner.users.read().unwrap_or_else(PoisonError::into_inner);
        users.values().map(Vec::len).sum()
    }

    fn handle_for(&self, conn_id: ConnectionId) -> Option<ClientHandle> {
        let users = self.inner.users.read().unwrap_or_else(PoisonError::into_inner);
        users.values().flatten().find(|h| h.conn_id == conn_id).cloned()
    }
}

fn deliver(handles: &mut Vec<ClientHandle>, payload: &str) {
    handles.retain(|h| match h.sender.send(payload.to_string()) {
        Ok(()) => true,
        Err(_) => {
            debug!("📡️ Connection {} is gone. Dropping it from the registry.", h.conn_id);
            false
        },
    });
}
