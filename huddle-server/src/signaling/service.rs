use crate::coordinator::CoordinatorCommand;
use crate::signaling::SignalSink;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use huddle_core::{ConnectionId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
}

/// Registry of live WebSocket connections plus the channel into the
/// coordinator. Cheap to clone; shared between all connection handlers.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) coordinator_tx: mpsc::Sender<CoordinatorCommand>,
}

impl SignalingService {
    pub fn new(coordinator_tx: mpsc::Sender<CoordinatorCommand>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
            coordinator_tx,
        }
    }

    pub fn add_peer(&self, socket_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(socket_id, tx);
    }

    pub fn remove_peer(&self, socket_id: &ConnectionId) {
        self.inner.peers.remove(socket_id);
    }

    pub fn send_signal(&self, socket_id: ConnectionId, msg: ServerMessage) {
        if let Some(peer) = self.inner.peers.get(&socket_id) {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        error!("Failed to send WS message to {}: {:?}", socket_id, e);
                    }
                }
                Err(e) => error!("Failed to serialize signal message: {}", e),
            }
        } else {
            warn!("Attempted to send signal to disconnected user {}", socket_id);
        }
    }
}

#[async_trait]
impl SignalSink for SignalingService {
    async fn send(&self, socket_id: ConnectionId, message: ServerMessage) {
        self.send_signal(socket_id, message);
    }

    async fn close(&self, socket_id: ConnectionId) {
        if let Some(peer) = self.inner.peers.get(&socket_id) {
            let _ = peer.send(Message::Close(None));
        }
    }
}
