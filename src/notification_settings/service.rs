//! Services the notification settings screen calls into.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::model::RoomNotificationState;
use crate::error::ServiceError;

/// Reads and persists a room's notification state.
#[async_trait]
pub trait RoomNotificationSettingsService: Send + Sync {
    /// Receiver holding the persisted state and seeing every change to it.
    fn observe_notification_state(&self) -> watch::Receiver<RoomNotificationState>;

    /// Persist a new notification state. Resolves once the change has been
    /// applied.
    async fn update(&self, state: RoomNotificationState) -> Result<(), ServiceError>;
}

/// What to fetch an avatar for.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AvatarInput {
    /// Content URI of the avatar, if any.
    pub mxc_uri: Option<String>,

    /// Id of the room or user the avatar belongs to.
    pub matrix_item_id: String,

    /// Display name, shown next to the avatar.
    pub display_name: Option<String>,
}

/// A fetched avatar image.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AvatarImage {
    /// Base64 encoded image data.
    pub data: String,

    /// Media type of the image.
    pub media_type: String,
}

/// Fetches avatar images.
#[async_trait]
pub trait AvatarService: Send + Sync {
    /// Fetch (or generate) the avatar for `input`.
    async fn avatar_image(&self, input: &AvatarInput) -> Result<AvatarImage, ServiceError>;
}
