use crate::model::connection::ConnectionId;
use serde::{Deserialize, Serialize};

/// One attendee of a meeting, keyed by their connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub socket_id: ConnectionId,
    pub name: String,
    pub is_host: bool,
    pub is_co_host: bool,
    pub is_muted: bool,
    pub is_camera_off: bool,
}

impl Participant {
    pub fn new(socket_id: ConnectionId, name: String, is_host: bool) -> Self {
        Self {
            socket_id,
            name,
            is_host,
            is_co_host: false,
            is_muted: false,
            is_camera_off: false,
        }
    }
}

/// Room-wide feature switches, host-mutable, uniform for all participants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub chat_enabled: bool,
    pub file_sharing: bool,
    pub emoji_reactions: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            chat_enabled: true,
            file_sharing: true,
            emoji_reactions: true,
        }
    }
}
