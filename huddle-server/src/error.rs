use thiserror::Error;

/// Validation failures that are reported back to the acting client as an
/// `action-error` message. Benign races — an absent target, a relay
/// destination that already disconnected — never become errors; those are
/// silent no-ops.
///
/// No variant here is ever accompanied by a state change: validation runs
/// before mutation, so a failed action leaves the room untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Insufficient permissions")]
    PermissionDenied,

    #[error("Only host can make co-hosts")]
    MakeCohostDenied,

    #[error("Only host can revoke co-hosts")]
    RevokeCohostDenied,

    #[error("Cannot kick this participant")]
    KickRefused,

    #[error("Only host can change meeting permissions")]
    PermissionsChangeDenied,

    #[error("Participant name is required")]
    NameRequired,
}
