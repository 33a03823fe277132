use async_trait::async_trait;
use huddle_core::{ConnectionId, ServerMessage};

/// Outbound half of the signaling channel, implemented by the transport
/// layer. The coordinator never talks to sockets directly, which keeps it
/// testable against a capturing mock.
#[async_trait]
pub trait SignalSink: Send + Sync {
    /// Deliver a message to one connection. Delivery to a connection that is
    /// already gone is silently dropped.
    async fn send(&self, socket_id: ConnectionId, message: ServerMessage);

    /// Close a connection server-side (used after a kick).
    async fn close(&self, socket_id: ConnectionId);
}
