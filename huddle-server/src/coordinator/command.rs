use huddle_core::{ClientMessage, ConnectionId};

/// Commands feeding the coordinator event loop from the transport layer
/// (WebSocket handlers, or tests driving the channel directly).
#[derive(Debug)]
pub enum CoordinatorCommand {
    /// A parsed signaling message from a live connection.
    Inbound {
        socket_id: ConnectionId,
        message: ClientMessage,
    },

    /// The connection's WebSocket closed or errored out.
    Disconnect { socket_id: ConnectionId },
}
