//! Room notification states and the policy for showing them.

use serde::{Deserialize, Serialize};

/// How a room notifies the user.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum RoomNotificationState {
    /// Notify for every message.
    #[default]
    All,

    /// Notify only for mentions and keywords.
    MentionsAndKeywordsOnly,

    /// Never notify.
    Mute,
}

impl RoomNotificationState {
    /// Every state, in display order.
    pub const ALL: [Self; 3] = [Self::All, Self::MentionsAndKeywordsOnly, Self::Mute];

    /// Whether the state can be applied to a room with the given encryption.
    /// Keyword matching needs the message content, which the server cannot
    /// see in encrypted rooms.
    pub const fn is_supported(self, room_encrypted: bool) -> bool {
        !(room_encrypted && matches!(self, Self::MentionsAndKeywordsOnly))
    }

    /// The state to show for a persisted `state`: unsupported states are
    /// shown as [`RoomNotificationState::Mute`].
    pub const fn on_read(self, room_encrypted: bool) -> Self {
        if self.is_supported(room_encrypted) { self } else { Self::Mute }
    }

    /// The states the user can choose from.
    pub fn options(room_encrypted: bool) -> Vec<Self> {
        Self::ALL.into_iter().filter(|state| state.is_supported(room_encrypted)).collect()
    }
}
