//! Notification settings view model.

use serde::{Deserialize, Serialize};

use super::model::RoomNotificationState;
use super::service::AvatarImage;

/// View state of the room notification settings screen.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoomNotificationSettingsViewState {
    /// Whether the room is encrypted.
    pub room_encrypted: bool,

    /// Whether a save is in flight.
    pub saving: bool,

    /// The selected notification state.
    pub notification_state: RoomNotificationState,

    /// Room avatar, once fetched.
    pub avatar: Option<AvatarImage>,

    /// Room display name, set together with the avatar.
    pub display_name: Option<String>,
}

impl RoomNotificationSettingsViewState {
    /// The states the user can choose from.
    pub fn notification_options(&self) -> Vec<RoomNotificationState> {
        RoomNotificationState::options(self.room_encrypted)
    }
}
