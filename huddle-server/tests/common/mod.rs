use async_trait::async_trait;
use huddle_core::{ClientMessage, ConnectionId, ServerMessage};
use huddle_server::{Coordinator, CoordinatorCommand, SignalSink};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Mock SignalSink that captures every outgoing message for verification.
#[derive(Clone, Default)]
pub struct MockSignalSink {
    messages: Arc<Mutex<Vec<(ConnectionId, ServerMessage)>>>,
    closed: Arc<Mutex<Vec<ConnectionId>>>,
}

impl MockSignalSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages delivered to one connection, in delivery order.
    pub async fn messages_for(&self, id: &ConnectionId) -> Vec<ServerMessage> {
        self.messages
            .lock()
            .await
            .iter()
            .filter_map(|(to, msg)| (to == id).then(|| msg.clone()))
            .collect()
    }

    pub async fn closed_connections(&self) -> Vec<ConnectionId> {
        self.closed.lock().await.clone()
    }

    /// Poll until `id` has received at least `count` messages.
    pub async fn wait_for_count(&self, id: &ConnectionId, count: usize, timeout_ms: u64) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.messages_for(id).await.len() >= count {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    /// Poll until `id` has received a message matching `pred`; returns it.
    pub async fn wait_for<F>(
        &self,
        id: &ConnectionId,
        timeout_ms: u64,
        pred: F,
    ) -> Option<ServerMessage>
    where
        F: Fn(&ServerMessage) -> bool,
    {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if let Some(msg) = self.messages_for(id).await.into_iter().find(|m| pred(m)) {
                return Some(msg);
            }
            if start.elapsed() > timeout {
                return None;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl SignalSink for MockSignalSink {
    async fn send(&self, socket_id: ConnectionId, message: ServerMessage) {
        self.messages.lock().await.push((socket_id, message));
    }

    async fn close(&self, socket_id: ConnectionId) {
        self.closed.lock().await.push(socket_id);
    }
}

/// A coordinator running on its own task, driven through the command channel
/// exactly the way the WebSocket layer drives the real one.
pub struct TestCoordinator {
    tx: mpsc::Sender<CoordinatorCommand>,
    pub sink: MockSignalSink,
}

impl TestCoordinator {
    pub fn spawn() -> Self {
        let sink = MockSignalSink::new();
        let (tx, rx) = mpsc::channel(64);
        let coordinator = Coordinator::new(Arc::new(sink.clone()));
        tokio::spawn(coordinator.run(rx));
        Self { tx, sink }
    }

    pub async fn send(&self, socket_id: ConnectionId, message: ClientMessage) {
        self.tx
            .send(CoordinatorCommand::Inbound { socket_id, message })
            .await
            .expect("coordinator task is gone");
    }

    pub async fn disconnect(&self, socket_id: ConnectionId) {
        self.tx
            .send(CoordinatorCommand::Disconnect { socket_id })
            .await
            .expect("coordinator task is gone");
    }

    /// Join a meeting and wait for the `joined-meeting` snapshot.
    pub async fn join(&self, socket_id: ConnectionId, meeting_id: &str, name: &str) {
        self.send(
            socket_id,
            ClientMessage::JoinMeeting {
                meeting_id: meeting_id.to_string(),
                participant_name: name.to_string(),
            },
        )
        .await;

        let joined = self
            .sink
            .wait_for(&socket_id, 1000, |m| {
                matches!(m, ServerMessage::JoinedMeeting { .. })
            })
            .await;
        assert!(joined.is_some(), "no joined-meeting for {name}");
    }
}
