mod config;
mod coordinator;
mod error;
mod room;
mod signaling;

pub use config::ServerConfig;
pub use coordinator::{Coordinator, CoordinatorCommand};
pub use error::ActionError;
pub use room::{MeetingLocked, Room, RoomRegistry};
pub use signaling::{SignalSink, SignalingService, ws_handler};
