use crate::coordinator::CoordinatorCommand;
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, ConnectionId, ServerMessage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    let socket_id = ConnectionId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, socket_id, service))
}

async fn handle_socket(socket: WebSocket, socket_id: ConnectionId, service: SignalingService) {
    info!("New WebSocket connection: {}", socket_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(socket_id, tx);
    service.send_signal(socket_id, ServerMessage::Welcome { socket_id });

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            let cmd = CoordinatorCommand::Inbound { socket_id, message };
                            if let Err(e) = service.coordinator_tx.send(cmd).await {
                                error!("Coordinator died: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid ClientMessage from {}: {:?}", socket_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            let _ = service
                .coordinator_tx
                .send(CoordinatorCommand::Disconnect { socket_id })
                .await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_peer(&socket_id);
    info!("WebSocket disconnected: {}", socket_id);
}
