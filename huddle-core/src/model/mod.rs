mod connection;
mod participant;
mod signaling;

pub use connection::ConnectionId;
pub use participant::{Participant, Permissions};
pub use signaling::{ClientMessage, ServerMessage, SpotlightReason};
