//! WebSocket hub for real-time updates
//!
//! Connected clients subscribe to one or more user IDs and receive the
//! notifications and chat messages addressed to those users as they
//! happen. Delivery here is best-effort; the notifications table is the
//! durable record.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use crate::chat::ChatMessage;
use crate::notifications::Notification;

/// Events pushed over the WebSocket hub
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    Notification {
        user_id: Uuid,
        notification: Notification,
    },
    MessageReceived {
        user_id: Uuid,
        message: ChatMessage,
    },
}

impl RealtimeEvent {
    /// The user this event is addressed to
    pub fn user_id(&self) -> Uuid {
        match self {
            RealtimeEvent::Notification { user_id, .. }
            | RealtimeEvent::MessageReceived { user_id, .. } => *user_id,
        }
    }
}

/// WebSocket hub state
#[derive(Clone)]
pub struct WsState {
    /// Broadcast channel for realtime events
    pub tx: broadcast::Sender<RealtimeEvent>,
    /// Connected clients registry
    pub clients: Arc<RwLock<HashMap<String, ClientInfo>>>,
}

/// Client connection information
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_id: String,
    pub subscribed_users: Vec<Uuid>,
}

/// Client message types
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    Subscribe { user_ids: Vec<Uuid> },
    Unsubscribe { user_ids: Vec<Uuid> },
    Ping,
}

/// Server message types
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ServerMessage {
    Event { event: RealtimeEvent },
    Subscribed { user_ids: Vec<Uuid> },
    Unsubscribed { user_ids: Vec<Uuid> },
    Pong,
}

impl WsState {
    /// Create new hub state
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            tx,
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Broadcast an event to all connected clients
    pub fn broadcast_event(&self, event: RealtimeEvent) {
        // Send fails when no client is connected, which is routine
        let _ = self.tx.send(event);
    }

    /// Number of connected clients
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    async fn register_client(&self, client_id: String) {
        let mut clients = self.clients.write().await;
        clients.insert(
            client_id.clone(),
            ClientInfo {
                client_id,
                subscribed_users: vec![],
            },
        );
    }

    async fn unregister_client(&self, client_id: &str) {
        let mut clients = self.clients.write().await;
        clients.remove(client_id);
        tracing::info!("Client {} disconnected", client_id);
    }

    async fn update_subscriptions(&self, client_id: &str, user_ids: Vec<Uuid>) {
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get_mut(client_id) {
            client.subscribed_users = user_ids;
        }
    }
}

impl Default for WsState {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket handler - upgrades HTTP connection to WebSocket
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WsState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle one WebSocket connection
async fn handle_socket(socket: WebSocket, state: WsState) {
    let client_id = Uuid::new_v4().to_string();
    state.register_client(client_id.clone()).await;

    let (mut sender, mut receiver) = socket.split();

    // Internal channel for sending confirmations and pongs from recv_task
    let (internal_tx, mut internal_rx) = mpsc::channel::<ServerMessage>(32);

    let mut rx = state.tx.subscribe();
    let client_id_clone = client_id.clone();
    let state_clone = state.clone();

    // Forward broadcast events and internal messages to this client
    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Ok(event) = rx.recv() => {
                    let clients = state_clone.clients.read().await;
                    if let Some(client_info) = clients.get(&client_id_clone) {
                        // Empty subscription list means the firehose
                        let should_send = client_info.subscribed_users.is_empty()
                            || client_info.subscribed_users.contains(&event.user_id());

                        if should_send {
                            let msg = ServerMessage::Event { event };
                            if let Ok(text) = serde_json::to_string(&msg) {
                                if sender.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
                Some(msg) = internal_rx.recv() => {
                    if let Ok(text) = serde_json::to_string(&msg) {
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                }
                else => break,
            }
        }
    });

    // Handle incoming messages from the client
    let state_recv = state.clone();
    let client_id_recv = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) {
                    match client_msg {
                        ClientMessage::Subscribe { user_ids } => {
                            state_recv
                                .update_subscriptions(&client_id_recv, user_ids.clone())
                                .await;
                            let response = ServerMessage::Subscribed { user_ids };
                            let _ = internal_tx.send(response).await;
                            tracing::info!("Client {} subscribed", client_id_recv);
                        }
                        ClientMessage::Unsubscribe { user_ids } => {
                            let clients = state_recv.clients.read().await;
                            if let Some(client_info) = clients.get(&client_id_recv) {
                                let mut current = client_info.subscribed_users.clone();
                                current.retain(|id| !user_ids.contains(id));
                                drop(clients);
                                state_recv
                                    .update_subscriptions(&client_id_recv, current)
                                    .await;
                            }
                            let response = ServerMessage::Unsubscribed { user_ids };
                            let _ = internal_tx.send(response).await;
                            tracing::info!("Client {} unsubscribed", client_id_recv);
                        }
                        ClientMessage::Ping => {
                            tracing::debug!("Ping from client {}", client_id_recv);
                            let _ = internal_tx.send(ServerMessage::Pong).await;
                        }
                    }
                }
            } else if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    state.unregister_client(&client_id).await;
}
