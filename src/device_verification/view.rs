//! Incoming verification view models.

use serde::{Deserialize, Serialize};

use super::transaction::CancelCode;

/// View state of the incoming verification prompt.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum DeviceVerificationIncomingViewState {
    /// The request is shown and waiting for the user.
    #[default]
    Idle,

    /// The user accepted and the SDK is exchanging keys.
    Loading,

    /// The short authentication string is ready to be compared.
    Loaded,

    /// The other party cancelled.
    Cancelled(CancelCode),

    /// This device cancelled.
    CancelledByMe(CancelCode),
}

impl DeviceVerificationIncomingViewState {
    /// Whether no further transitions happen from this state.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled(_) | Self::CancelledByMe(_))
    }

    /// Text explaining why the request was cancelled, if it was.
    pub const fn cancellation_message(&self) -> Option<&'static str> {
        match self {
            Self::Cancelled(code) | Self::CancelledByMe(code) => Some(code.human_readable()),
            _ => None,
        }
    }
}

/// The user whose device asks to be verified.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerificationUser {
    /// Matrix user id.
    pub user_id: String,

    /// Display name, if the user has one.
    pub display_name: Option<String>,

    /// Avatar URL, if the user has one.
    pub avatar_url: Option<String>,
}

/// Static details the prompt shows next to the state.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DeviceVerificationIncomingView {
    /// Requesting user.
    pub user: VerificationUser,

    /// Requesting device.
    pub device_id: String,
}

impl DeviceVerificationIncomingView {
    /// Name to show for the requesting user: the display name when set,
    /// otherwise the user id.
    pub fn user_display_name(&self) -> &str {
        match self.user.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.user.user_id,
        }
    }
}
