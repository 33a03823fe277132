use crate::model::connection::ConnectionId;
use crate::model::participant::{Participant, Permissions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a participant ended up in the spotlight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpotlightReason {
    /// Set explicitly by a host or co-host.
    Manual,
    /// Picked by the coordinator from reported audio levels.
    Auto,
}

/// Everything a client may send over the signaling channel.
///
/// Offer/answer/candidate bodies are opaque blobs: the coordinator relays
/// them verbatim and never looks inside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    JoinMeeting {
        meeting_id: String,
        participant_name: String,
    },
    RaiseHand,
    LowerHand,
    StartScreenShare {
        stream_id: String,
    },
    StopScreenShare,
    SpotlightParticipant {
        target_socket_id: ConnectionId,
    },
    RemoveSpotlight,
    PinParticipant {
        target_socket_id: ConnectionId,
    },
    MuteParticipant {
        target_socket_id: ConnectionId,
    },
    MakeCohost {
        target_socket_id: ConnectionId,
    },
    RevokeCohost {
        target_socket_id: ConnectionId,
    },
    KickParticipant {
        target_socket_id: ConnectionId,
    },
    ToggleMic {
        is_muted: bool,
    },
    ToggleCamera {
        is_camera_off: bool,
    },
    SendReaction {
        emoji: String,
    },
    UpdateMeetingPermissions {
        permissions: Permissions,
    },
    LockMeeting {
        locked: bool,
    },
    AudioLevel {
        level: f64,
    },
    Offer {
        target: ConnectionId,
        offer: Value,
    },
    Answer {
        target: ConnectionId,
        answer: Value,
    },
    IceCandidate {
        target: ConnectionId,
        candidate: Value,
    },
}

/// Everything the coordinator may send back to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First message on every connection: the id the server will know you by.
    Welcome {
        socket_id: ConnectionId,
    },
    /// Initial snapshot for the joining participant.
    JoinedMeeting {
        participants: Vec<Participant>,
        spotlighted_participant: Option<ConnectionId>,
        raised_hands: Vec<ConnectionId>,
        permissions: Permissions,
    },
    MeetingLocked,
    ParticipantJoined {
        participant: Participant,
        participants: Vec<Participant>,
    },
    ParticipantLeft {
        socket_id: ConnectionId,
        participant_name: String,
        participants: Vec<Participant>,
    },
    MeetingEnded,
    HandRaised {
        socket_id: ConnectionId,
        participant_name: String,
        raised_hands: Vec<ConnectionId>,
    },
    HandLowered {
        socket_id: ConnectionId,
        participant_name: String,
        raised_hands: Vec<ConnectionId>,
    },
    ScreenShareStarted {
        participant_id: ConnectionId,
        stream_id: String,
        participant_name: String,
    },
    ScreenShareStopped {
        participant_id: ConnectionId,
    },
    ParticipantSpotlighted {
        spotlighted_participant: ConnectionId,
        participants: Vec<Participant>,
        reason: SpotlightReason,
    },
    SpotlightRemoved {
        participants: Vec<Participant>,
    },
    ParticipantPinned {
        pinned_participant: ConnectionId,
    },
    /// Sent to the target of a host mute; carries the new state.
    ForceMute {
        is_muted: bool,
    },
    ParticipantMuted {
        target_socket_id: ConnectionId,
        is_muted: bool,
        participants: Vec<Participant>,
    },
    MadeCohost,
    CohostAssigned {
        target_socket_id: ConnectionId,
        participants: Vec<Participant>,
    },
    CohostRevoked {
        target_socket_id: ConnectionId,
        participants: Vec<Participant>,
    },
    KickedFromMeeting,
    ParticipantKicked {
        target_socket_id: ConnectionId,
        participants: Vec<Participant>,
    },
    ParticipantAudioChanged {
        socket_id: ConnectionId,
        is_muted: bool,
        participants: Vec<Participant>,
    },
    ParticipantVideoChanged {
        socket_id: ConnectionId,
        is_camera_off: bool,
        participants: Vec<Participant>,
    },
    MeetingPermissionsUpdated {
        permissions: Permissions,
        changed_by: String,
    },
    MeetingLockChanged {
        locked: bool,
        changed_by: String,
    },
    ReactionReceived {
        emoji: String,
        participant_name: String,
        socket_id: ConnectionId,
    },
    /// Instructs a client to open a peer link toward `target_socket_id`.
    /// Exactly one side of every pair is told to create the offer.
    InitiateConnection {
        target_socket_id: ConnectionId,
        should_create_offer: bool,
    },
    Offer {
        sender: ConnectionId,
        offer: Value,
    },
    Answer {
        sender: ConnectionId,
        answer: Value,
    },
    IceCandidate {
        sender: ConnectionId,
        candidate: Value,
    },
    /// Permission or validation failure; delivered to the actor only.
    ActionError {
        message: String,
    },
}
