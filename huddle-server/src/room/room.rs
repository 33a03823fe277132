use huddle_core::{ConnectionId, Participant, Permissions, SpotlightReason};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// Audio level above which a speaker may take the automatic spotlight.
const AUTO_SPOTLIGHT_THRESHOLD: f64 = 0.15;

/// Join rejected because the meeting is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingLocked;

/// In-memory state of one meeting.
///
/// All mutation happens on the coordinator task, one event at a time, so no
/// interior locking is needed. Participant insertion order is preserved: the
/// roster broadcast after every mutation must be deterministic.
pub struct Room {
    meeting_id: String,
    participants: IndexMap<ConnectionId, Participant>,
    spotlight: Option<(ConnectionId, SpotlightReason)>,
    raised_hands: IndexSet<ConnectionId>,
    screen_shares: HashMap<ConnectionId, String>,
    permissions: Permissions,
    locked: bool,
}

impl Room {
    pub fn new(meeting_id: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            participants: IndexMap::new(),
            spotlight: None,
            raised_hands: IndexSet::new(),
            screen_shares: HashMap::new(),
            permissions: Permissions::default(),
            locked: false,
        }
    }

    pub fn meeting_id(&self) -> &str {
        &self.meeting_id
    }

    /// Insert a participant. The first participant of a room becomes its
    /// host; there is exactly one host for the life of the room.
    pub fn add_participant(
        &mut self,
        id: ConnectionId,
        name: String,
        is_first: bool,
    ) -> Result<(), MeetingLocked> {
        if self.locked && !is_first {
            return Err(MeetingLocked);
        }

        self.participants
            .insert(id, Participant::new(id, name, is_first));
        Ok(())
    }

    /// Remove a participant and purge every reference to them: a dangling
    /// spotlight or raised hand must never be observable afterwards.
    pub fn remove_participant(&mut self, id: &ConnectionId) -> Option<Participant> {
        let removed = self.participants.shift_remove(id);

        if self.spotlight.is_some_and(|(s, _)| s == *id) {
            self.spotlight = None;
        }
        self.raised_hands.shift_remove(id);
        self.screen_shares.remove(id);

        removed
    }

    pub fn participant(&self, id: &ConnectionId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn participant_mut(&mut self, id: &ConnectionId) -> Option<&mut Participant> {
        self.participants.get_mut(id)
    }

    /// Hosts and co-hosts may perform host actions.
    pub fn can_perform_host_action(&self, id: &ConnectionId) -> bool {
        self.participants
            .get(id)
            .is_some_and(|p| p.is_host || p.is_co_host)
    }

    /// Only the primary host may grant or revoke co-host status.
    pub fn can_make_co_host(&self, id: &ConnectionId) -> bool {
        self.participants.get(id).is_some_and(|p| p.is_host)
    }

    /// Manually spotlight a participant. Returns false (no-op) if the target
    /// is not present.
    pub fn spotlight_participant(&mut self, id: ConnectionId) -> bool {
        if !self.participants.contains_key(&id) {
            return false;
        }
        self.spotlight = Some((id, SpotlightReason::Manual));
        true
    }

    /// Consider `level` for the automatic spotlight. Returns true when the
    /// spotlight actually moved and a broadcast is warranted.
    ///
    /// A manual spotlight is never displaced, and re-announcing the current
    /// auto-spotlighted speaker is suppressed.
    pub fn auto_spotlight(&mut self, id: ConnectionId, level: f64) -> bool {
        if !self.participants.contains_key(&id) {
            return false;
        }
        if level < AUTO_SPOTLIGHT_THRESHOLD {
            return false;
        }
        match self.spotlight {
            Some((_, SpotlightReason::Manual)) => false,
            Some((current, SpotlightReason::Auto)) if current == id => false,
            _ => {
                self.spotlight = Some((id, SpotlightReason::Auto));
                true
            }
        }
    }

    pub fn remove_spotlight(&mut self) {
        self.spotlight = None;
    }

    pub fn spotlighted(&self) -> Option<ConnectionId> {
        self.spotlight.map(|(id, _)| id)
    }

    /// Idempotent: raising an already-raised hand changes nothing.
    pub fn raise_hand(&mut self, id: ConnectionId) {
        if self.participants.contains_key(&id) {
            self.raised_hands.insert(id);
        }
    }

    pub fn lower_hand(&mut self, id: &ConnectionId) {
        self.raised_hands.shift_remove(id);
    }

    /// Raised hands in raise order.
    pub fn raised_hands(&self) -> Vec<ConnectionId> {
        self.raised_hands.iter().copied().collect()
    }

    /// Returns false (no-op) if the target is not present.
    pub fn make_co_host(&mut self, id: &ConnectionId) -> bool {
        match self.participants.get_mut(id) {
            Some(p) => {
                p.is_co_host = true;
                true
            }
            None => false,
        }
    }

    pub fn revoke_co_host(&mut self, id: &ConnectionId) -> bool {
        match self.participants.get_mut(id) {
            Some(p) => {
                p.is_co_host = false;
                true
            }
            None => false,
        }
    }

    pub fn start_screen_share(&mut self, id: ConnectionId, stream_id: String) {
        if self.participants.contains_key(&id) {
            self.screen_shares.insert(id, stream_id);
        }
    }

    pub fn stop_screen_share(&mut self, id: &ConnectionId) -> Option<String> {
        self.screen_shares.remove(id)
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn set_permissions(&mut self, permissions: Permissions) {
        self.permissions = permissions;
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Full roster snapshot in insertion order. Every mutation broadcast
    /// carries this whole list rather than a delta.
    pub fn roster(&self) -> Vec<Participant> {
        self.participants.values().cloned().collect()
    }

    /// All present connection ids in insertion order.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.participants.keys().copied().collect()
    }
}
