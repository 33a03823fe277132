use crate::coordinator::CoordinatorCommand;
use crate::error::ActionError;
use crate::room::{Room, RoomRegistry};
use crate::signaling::SignalSink;
use huddle_core::{ClientMessage, ConnectionId, Participant, Permissions, ServerMessage, SpotlightReason};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The server-side authority for every meeting this process hosts.
///
/// One coordinator task owns all room state and the connection-to-meeting
/// session bindings, and processes inbound events strictly one at a time, so
/// room mutation needs no locks. Outbound delivery goes through a
/// [`SignalSink`] so the transport (and tests) stay swappable.
pub struct Coordinator {
    rooms: RoomRegistry,
    /// connection id -> meeting id; the authoritative routing table.
    /// The room's own participant map is the per-room mirror.
    sessions: HashMap<ConnectionId, String>,
    output: Arc<dyn SignalSink>,
}

impl Coordinator {
    pub fn new(output: Arc<dyn SignalSink>) -> Self {
        Self {
            rooms: RoomRegistry::new(),
            sessions: HashMap::new(),
            output,
        }
    }

    /// Run until the command channel closes. Dropping the sender is the
    /// teardown hook: tests (and shutdown) end the loop by closing it.
    pub async fn run(mut self, mut commands: mpsc::Receiver<CoordinatorCommand>) {
        info!("Coordinator event loop started");

        while let Some(cmd) = commands.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Shutting down coordinator.");
    }

    async fn handle_command(&mut self, cmd: CoordinatorCommand) {
        match cmd {
            CoordinatorCommand::Inbound { socket_id, message } => {
                self.handle_message(socket_id, message).await;
            }
            CoordinatorCommand::Disconnect { socket_id } => {
                self.handle_disconnect(socket_id).await;
            }
        }
    }

    async fn handle_message(&mut self, id: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::JoinMeeting {
                meeting_id,
                participant_name,
            } => self.handle_join(id, meeting_id, participant_name).await,
            ClientMessage::RaiseHand => self.handle_hand(id, true).await,
            ClientMessage::LowerHand => self.handle_hand(id, false).await,
            ClientMessage::StartScreenShare { stream_id } => {
                self.handle_start_screen_share(id, stream_id).await;
            }
            ClientMessage::StopScreenShare => self.handle_stop_screen_share(id).await,
            ClientMessage::SpotlightParticipant { target_socket_id } => {
                self.handle_spotlight(id, target_socket_id).await;
            }
            ClientMessage::RemoveSpotlight => self.handle_remove_spotlight(id).await,
            ClientMessage::PinParticipant { target_socket_id } => {
                self.handle_pin(id, target_socket_id).await;
            }
            ClientMessage::MuteParticipant { target_socket_id } => {
                self.handle_mute_participant(id, target_socket_id).await;
            }
            ClientMessage::MakeCohost { target_socket_id } => {
                self.handle_make_cohost(id, target_socket_id).await;
            }
            ClientMessage::RevokeCohost { target_socket_id } => {
                self.handle_revoke_cohost(id, target_socket_id).await;
            }
            ClientMessage::KickParticipant { target_socket_id } => {
                self.handle_kick(id, target_socket_id).await;
            }
            ClientMessage::ToggleMic { is_muted } => self.handle_toggle_mic(id, is_muted).await,
            ClientMessage::ToggleCamera { is_camera_off } => {
                self.handle_toggle_camera(id, is_camera_off).await;
            }
            ClientMessage::SendReaction { emoji } => self.handle_reaction(id, emoji).await,
            ClientMessage::UpdateMeetingPermissions { permissions } => {
                self.handle_update_permissions(id, permissions).await;
            }
            ClientMessage::LockMeeting { locked } => self.handle_lock(id, locked).await,
            ClientMessage::AudioLevel { level } => self.handle_audio_level(id, level).await,
            ClientMessage::Offer { target, offer } => {
                self.relay(id, target, |sender| ServerMessage::Offer { sender, offer })
                    .await;
            }
            ClientMessage::Answer { target, answer } => {
                self.relay(id, target, |sender| ServerMessage::Answer { sender, answer })
                    .await;
            }
            ClientMessage::IceCandidate { target, candidate } => {
                self.relay(id, target, |sender| ServerMessage::IceCandidate {
                    sender,
                    candidate,
                })
                .await;
            }
        }
    }

    // --- join / leave ---------------------------------------------------

    async fn handle_join(&mut self, id: ConnectionId, meeting_id: String, name: String) {
        if self.sessions.contains_key(&id) {
            warn!("Connection {} already joined a meeting, ignoring join", id);
            return;
        }

        let name = name.trim().to_string();
        if name.is_empty() {
            self.send_error(id, ActionError::NameRequired).await;
            return;
        }

        // A locked room rejects everyone but its first-ever participant,
        // and the first participant is the one who created it.
        if self
            .rooms
            .get(&meeting_id)
            .is_some_and(|room| room.locked())
        {
            self.send(id, ServerMessage::MeetingLocked).await;
            return;
        }

        let mut outbox = Vec::new();
        {
            let room = self.rooms.get_or_create(&meeting_id);
            let is_first = room.is_empty();
            let existing = room.connection_ids();

            if room.add_participant(id, name.clone(), is_first).is_err() {
                outbox.push((id, ServerMessage::MeetingLocked));
                self.flush(outbox).await;
                return;
            }

            let roster = room.roster();
            let participant = Participant::new(id, name.clone(), is_first);

            outbox.push((
                id,
                ServerMessage::JoinedMeeting {
                    participants: roster.clone(),
                    spotlighted_participant: room.spotlighted(),
                    raised_hands: room.raised_hands(),
                    permissions: room.permissions(),
                },
            ));

            for other in &existing {
                outbox.push((
                    *other,
                    ServerMessage::ParticipantJoined {
                        participant: participant.clone(),
                        participants: roster.clone(),
                    },
                ));
            }

            // Full-mesh introduction: each pre-existing participant offers
            // toward the newcomer; the newcomer answers. One offer direction
            // per pair, never two.
            for other in &existing {
                outbox.push((
                    *other,
                    ServerMessage::InitiateConnection {
                        target_socket_id: id,
                        should_create_offer: true,
                    },
                ));
                outbox.push((
                    id,
                    ServerMessage::InitiateConnection {
                        target_socket_id: *other,
                        should_create_offer: false,
                    },
                ));
            }

            info!("{} joined meeting {} as {}", name, meeting_id, id);
        }

        self.sessions.insert(id, meeting_id);
        self.flush(outbox).await;
    }

    async fn handle_disconnect(&mut self, id: ConnectionId) {
        let Some(meeting_id) = self.sessions.remove(&id) else {
            debug!("Connection {} disconnected without a session", id);
            return;
        };

        let mut outbox = Vec::new();
        let mut ended_members = Vec::new();

        if let Some(room) = self.rooms.get_mut(&meeting_id) {
            let departed = room.remove_participant(&id);
            let was_host = departed.as_ref().is_some_and(|p| p.is_host);

            if was_host {
                // Host departure always ends the meeting for everyone.
                ended_members = room.connection_ids();
                for member in &ended_members {
                    outbox.push((*member, ServerMessage::MeetingEnded));
                }
                self.rooms.remove(&meeting_id);
                info!("Meeting {} ended - host disconnected", meeting_id);
            } else if let Some(departed) = departed {
                let roster = room.roster();
                for member in room.connection_ids() {
                    outbox.push((
                        member,
                        ServerMessage::ParticipantLeft {
                            socket_id: id,
                            participant_name: departed.name.clone(),
                            participants: roster.clone(),
                        },
                    ));
                }
                if room.is_empty() {
                    self.rooms.remove(&meeting_id);
                }
                info!("Participant {} left meeting {}", id, meeting_id);
            }
        }

        for member in ended_members {
            self.sessions.remove(&member);
        }

        self.flush(outbox).await;
    }

    // --- hands / reactions / screen share -------------------------------

    async fn handle_hand(&mut self, id: ConnectionId, raised: bool) {
        let mut outbox = Vec::new();

        if let Some(room) = self.room_of(&id) {
            let Some(name) = room.participant(&id).map(|p| p.name.clone()) else {
                return;
            };

            if raised {
                room.raise_hand(id);
            } else {
                room.lower_hand(&id);
            }

            let raised_hands = room.raised_hands();
            for member in room.connection_ids() {
                let msg = if raised {
                    ServerMessage::HandRaised {
                        socket_id: id,
                        participant_name: name.clone(),
                        raised_hands: raised_hands.clone(),
                    }
                } else {
                    ServerMessage::HandLowered {
                        socket_id: id,
                        participant_name: name.clone(),
                        raised_hands: raised_hands.clone(),
                    }
                };
                outbox.push((member, msg));
            }
        }

        self.flush(outbox).await;
    }

    async fn handle_reaction(&mut self, id: ConnectionId, emoji: String) {
        let mut outbox = Vec::new();

        if let Some(room) = self.room_of(&id) {
            if !room.permissions().emoji_reactions {
                return;
            }
            let Some(name) = room.participant(&id).map(|p| p.name.clone()) else {
                return;
            };

            for member in room.connection_ids() {
                outbox.push((
                    member,
                    ServerMessage::ReactionReceived {
                        emoji: emoji.clone(),
                        participant_name: name.clone(),
                        socket_id: id,
                    },
                ));
            }
        }

        self.flush(outbox).await;
    }

    async fn handle_start_screen_share(&mut self, id: ConnectionId, stream_id: String) {
        let mut outbox = Vec::new();

        if let Some(room) = self.room_of(&id) {
            let Some(name) = room.participant(&id).map(|p| p.name.clone()) else {
                return;
            };
            room.start_screen_share(id, stream_id.clone());

            for member in room.connection_ids() {
                if member != id {
                    outbox.push((
                        member,
                        ServerMessage::ScreenShareStarted {
                            participant_id: id,
                            stream_id: stream_id.clone(),
                            participant_name: name.clone(),
                        },
                    ));
                }
            }
        }

        self.flush(outbox).await;
    }

    async fn handle_stop_screen_share(&mut self, id: ConnectionId) {
        let mut outbox = Vec::new();

        if let Some(room) = self.room_of(&id) {
            if room.participant(&id).is_none() {
                return;
            }
            room.stop_screen_share(&id);

            for member in room.connection_ids() {
                if member != id {
                    outbox.push((
                        member,
                        ServerMessage::ScreenShareStopped { participant_id: id },
                    ));
                }
            }
        }

        self.flush(outbox).await;
    }

    async fn handle_toggle_mic(&mut self, id: ConnectionId, is_muted: bool) {
        let mut outbox = Vec::new();

        if let Some(room) = self.room_of(&id) {
            let Some(participant) = room.participant_mut(&id) else {
                return;
            };
            participant.is_muted = is_muted;

            let roster = room.roster();
            for member in room.connection_ids() {
                if member != id {
                    outbox.push((
                        member,
                        ServerMessage::ParticipantAudioChanged {
                            socket_id: id,
                            is_muted,
                            participants: roster.clone(),
                        },
                    ));
                }
            }
        }

        self.flush(outbox).await;
    }

    async fn handle_toggle_camera(&mut self, id: ConnectionId, is_camera_off: bool) {
        let mut outbox = Vec::new();

        if let Some(room) = self.room_of(&id) {
            let Some(participant) = room.participant_mut(&id) else {
                return;
            };
            participant.is_camera_off = is_camera_off;

            let roster = room.roster();
            for member in room.connection_ids() {
                if member != id {
                    outbox.push((
                        member,
                        ServerMessage::ParticipantVideoChanged {
                            socket_id: id,
                            is_camera_off,
                            participants: roster.clone(),
                        },
                    ));
                }
            }
        }

        self.flush(outbox).await;
    }

    // --- spotlight / pin -------------------------------------------------

    async fn handle_spotlight(&mut self, id: ConnectionId, target: ConnectionId) {
        let mut outbox = Vec::new();
        let mut denied = false;

        if let Some(room) = self.room_of(&id) {
            if !room.can_perform_host_action(&id) {
                denied = true;
            } else if room.spotlight_participant(target) {
                let roster = room.roster();
                for member in room.connection_ids() {
                    outbox.push((
                        member,
                        ServerMessage::ParticipantSpotlighted {
                            spotlighted_participant: target,
                            participants: roster.clone(),
                            reason: SpotlightReason::Manual,
                        },
                    ));
                }
            }
            // Absent target: benign race with a disconnect, stay silent.
        }

        if denied {
            self.send_error(id, ActionError::PermissionDenied).await;
            return;
        }
        self.flush(outbox).await;
    }

    async fn handle_remove_spotlight(&mut self, id: ConnectionId) {
        let mut outbox = Vec::new();
        let mut denied = false;

        if let Some(room) = self.room_of(&id) {
            if !room.can_perform_host_action(&id) {
                denied = true;
            } else {
                room.remove_spotlight();
                let roster = room.roster();
                for member in room.connection_ids() {
                    outbox.push((
                        member,
                        ServerMessage::SpotlightRemoved {
                            participants: roster.clone(),
                        },
                    ));
                }
            }
        }

        if denied {
            self.send_error(id, ActionError::PermissionDenied).await;
            return;
        }
        self.flush(outbox).await;
    }

    async fn handle_audio_level(&mut self, id: ConnectionId, level: f64) {
        let mut outbox = Vec::new();

        if let Some(room) = self.room_of(&id) {
            if room.auto_spotlight(id, level) {
                let roster = room.roster();
                for member in room.connection_ids() {
                    outbox.push((
                        member,
                        ServerMessage::ParticipantSpotlighted {
                            spotlighted_participant: id,
                            participants: roster.clone(),
                            reason: SpotlightReason::Auto,
                        },
                    ));
                }
            }
        }

        self.flush(outbox).await;
    }

    /// Pinning is viewer-local: echoed to the pinning client only, never
    /// broadcast. Deliberately asymmetric with spotlight.
    async fn handle_pin(&mut self, id: ConnectionId, target: ConnectionId) {
        if self.sessions.contains_key(&id) {
            self.send(
                id,
                ServerMessage::ParticipantPinned {
                    pinned_participant: target,
                },
            )
            .await;
        }
    }

    // --- host actions ----------------------------------------------------

    async fn handle_mute_participant(&mut self, id: ConnectionId, target: ConnectionId) {
        let mut outbox = Vec::new();
        let mut denied = false;

        if let Some(room) = self.room_of(&id) {
            if !room.can_perform_host_action(&id) {
                denied = true;
            } else if let Some(participant) = room.participant_mut(&target) {
                // Host mute is a toggle: the same action unmutes.
                participant.is_muted = !participant.is_muted;
                let is_muted = participant.is_muted;

                let roster = room.roster();
                outbox.push((target, ServerMessage::ForceMute { is_muted }));
                for member in room.connection_ids() {
                    outbox.push((
                        member,
                        ServerMessage::ParticipantMuted {
                            target_socket_id: target,
                            is_muted,
                            participants: roster.clone(),
                        },
                    ));
                }
            }
        }

        if denied {
            self.send_error(id, ActionError::PermissionDenied).await;
            return;
        }
        self.flush(outbox).await;
    }

    async fn handle_make_cohost(&mut self, id: ConnectionId, target: ConnectionId) {
        let mut outbox = Vec::new();
        let mut denied = false;

        if let Some(room) = self.room_of(&id) {
            if !room.can_make_co_host(&id) {
                denied = true;
            } else if room.make_co_host(&target) {
                let roster = room.roster();
                outbox.push((target, ServerMessage::MadeCohost));
                for member in room.connection_ids() {
                    outbox.push((
                        member,
                        ServerMessage::CohostAssigned {
                            target_socket_id: target,
                            participants: roster.clone(),
                        },
                    ));
                }
            }
        }

        if denied {
            self.send_error(id, ActionError::MakeCohostDenied).await;
            return;
        }
        self.flush(outbox).await;
    }

    /// Gated exactly like make-cohost: only the primary host may demote.
    async fn handle_revoke_cohost(&mut self, id: ConnectionId, target: ConnectionId) {
        let mut outbox = Vec::new();
        let mut denied = false;

        if let Some(room) = self.room_of(&id) {
            if !room.can_make_co_host(&id) {
                denied = true;
            } else if room.revoke_co_host(&target) {
                let roster = room.roster();
                for member in room.connection_ids() {
                    outbox.push((
                        member,
                        ServerMessage::CohostRevoked {
                            target_socket_id: target,
                            participants: roster.clone(),
                        },
                    ));
                }
            }
        }

        if denied {
            self.send_error(id, ActionError::RevokeCohostDenied).await;
            return;
        }
        self.flush(outbox).await;
    }

    async fn handle_kick(&mut self, id: ConnectionId, target: ConnectionId) {
        let mut outbox = Vec::new();
        let mut denied = false;
        let mut kicked = false;

        if let Some(room) = self.room_of(&id) {
            let requester_is_host = room.participant(&id).is_some_and(|p| p.is_host);
            let Some(target_participant) = room.participant(&target) else {
                return;
            };

            // Co-hosts are kick-immune: only a plain participant can be
            // kicked, and only by the primary host.
            if !requester_is_host || target_participant.is_co_host {
                denied = true;
            } else {
                room.remove_participant(&target);
                kicked = true;

                let roster = room.roster();
                outbox.push((target, ServerMessage::KickedFromMeeting));
                for member in room.connection_ids() {
                    if member != id {
                        outbox.push((
                            member,
                            ServerMessage::ParticipantKicked {
                                target_socket_id: target,
                                participants: roster.clone(),
                            },
                        ));
                    }
                }
                info!("Participant {} kicked from meeting", target);
            }
        }

        if denied {
            self.send_error(id, ActionError::KickRefused).await;
            return;
        }

        if kicked {
            self.sessions.remove(&target);
            self.flush(outbox).await;
            self.output.close(target).await;
        }
    }

    async fn handle_update_permissions(&mut self, id: ConnectionId, permissions: Permissions) {
        let mut outbox = Vec::new();
        let mut denied = false;

        if let Some(room) = self.room_of(&id) {
            if !room.can_perform_host_action(&id) {
                denied = true;
            } else if let Some(name) = room.participant(&id).map(|p| p.name.clone()) {
                room.set_permissions(permissions);
                for member in room.connection_ids() {
                    outbox.push((
                        member,
                        ServerMessage::MeetingPermissionsUpdated {
                            permissions,
                            changed_by: name.clone(),
                        },
                    ));
                }
            }
        }

        if denied {
            self.send_error(id, ActionError::PermissionsChangeDenied)
                .await;
            return;
        }
        self.flush(outbox).await;
    }

    async fn handle_lock(&mut self, id: ConnectionId, locked: bool) {
        let mut outbox = Vec::new();
        let mut denied = false;

        if let Some(room) = self.room_of(&id) {
            if !room.can_perform_host_action(&id) {
                denied = true;
            } else if let Some(name) = room.participant(&id).map(|p| p.name.clone()) {
                room.set_locked(locked);
                for member in room.connection_ids() {
                    outbox.push((
                        member,
                        ServerMessage::MeetingLockChanged {
                            locked,
                            changed_by: name.clone(),
                        },
                    ));
                }
            }
        }

        if denied {
            self.send_error(id, ActionError::PermissionDenied).await;
            return;
        }
        self.flush(outbox).await;
    }

    // --- relay -----------------------------------------------------------

    /// Verbatim pass-through of peer-negotiation payloads. The body is never
    /// inspected; delivery requires sender and target to share a meeting. A
    /// stale target is an expected race and dropped silently.
    async fn relay<F>(&mut self, id: ConnectionId, target: ConnectionId, build: F)
    where
        F: FnOnce(ConnectionId) -> ServerMessage,
    {
        let Some(sender_meeting) = self.sessions.get(&id) else {
            return;
        };
        match self.sessions.get(&target) {
            Some(target_meeting) if target_meeting == sender_meeting => {
                self.send(target, build(id)).await;
            }
            _ => {
                debug!("Dropping relay from {} to stale target {}", id, target);
            }
        }
    }

    // --- plumbing --------------------------------------------------------

    fn room_of(&mut self, id: &ConnectionId) -> Option<&mut Room> {
        let meeting_id = self.sessions.get(id)?.clone();
        self.rooms.get_mut(&meeting_id)
    }

    async fn send(&self, to: ConnectionId, message: ServerMessage) {
        self.output.send(to, message).await;
    }

    async fn send_error(&self, to: ConnectionId, error: ActionError) {
        self.send(
            to,
            ServerMessage::ActionError {
                message: error.to_string(),
            },
        )
        .await;
    }

    async fn flush(&self, outbox: Vec<(ConnectionId, ServerMessage)>) {
        for (to, message) in outbox {
            self.send(to, message).await;
        }
    }
}
