//! # Room Notification Settings
//!
//! Lets the user pick how a room notifies them. The screen shows the
//! persisted state (adjusted for encrypted rooms, see
//! [`RoomNotificationState::on_read`]), follows changes made elsewhere, and
//! only persists the user's choice on [`RoomNotificationSettingsAction::Save`].

pub mod model;
pub mod service;
pub mod view;

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;

pub use self::model::RoomNotificationState;
pub use self::service::{AvatarImage, AvatarInput, AvatarService, RoomNotificationSettingsService};
pub use self::view::RoomNotificationSettingsViewState;
use crate::config::Config;
use crate::error::{ServiceError, with_timeout};
use crate::view_model::{StateStore, Subscription, ViewModel};

/// Actions the notification settings screen accepts.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum RoomNotificationSettingsAction {
    /// Publish the current state again (the view has just appeared).
    Load,

    /// The user picked a notification state. Not persisted until saved.
    SelectNotificationState(RoomNotificationState),

    /// Persist the selected state.
    Save,

    /// Leave without saving.
    Cancel,
}

/// Outcomes reported to the coordinator.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum RoomNotificationSettingsOutcome {
    /// The selected state has been saved.
    Completed,

    /// The user left without saving.
    Cancelled,
}

type Store = StateStore<RoomNotificationSettingsViewState, RoomNotificationSettingsOutcome>;

struct Shared {
    store: Store,
    service: Arc<dyn RoomNotificationSettingsService>,
    room_encrypted: bool,
    save_timeout: Duration,
    runtime: Handle,
}

impl Shared {
    fn persisted_state_changed(&self, persisted: RoomNotificationState) {
        let shown = persisted.on_read(self.room_encrypted);
        self.store.update(|state| state.notification_state = shown);
    }

    fn save(self: &Arc<Self>) {
        let mut selected = RoomNotificationState::default();
        let started = self.store.update_if(|state| {
            if state.saving {
                return false;
            }
            state.saving = true;
            selected = state.notification_state;
            true
        });
        if !started {
            tracing::debug!("save ignored: already saving");
            return;
        }

        let service = Arc::clone(&self.service);
        let timeout = self.save_timeout;
        let weak = Arc::downgrade(self);
        self.runtime.spawn(async move {
            let result = with_timeout(timeout, service.update(selected)).await;
            let Some(shared) = weak.upgrade() else {
                tracing::debug!("save completed after the screen was dismissed");
                return;
            };
            shared.save_finished(result);
        });
    }

    fn save_finished(&self, result: Result<(), ServiceError>) {
        self.store.update(|state| state.saving = false);
        match result {
            Ok(()) => self.store.finish(RoomNotificationSettingsOutcome::Completed),
            Err(e) => tracing::warn!(error = %e, "saving notification state failed"),
        }
    }
}

/// View model of the room notification settings screen.
pub struct RoomNotificationSettingsViewModel {
    shared: Arc<Shared>,
    _subscriptions: Vec<Subscription>,
}

impl RoomNotificationSettingsViewModel {
    /// Create the view model. The avatar is fetched in the background when
    /// `avatar` is given.
    ///
    /// Must be called from within a Tokio runtime. Background work keeps
    /// running on that runtime, so [`ViewModel::process`] may be called from
    /// any thread afterwards.
    pub fn new(
        service: Arc<dyn RoomNotificationSettingsService>,
        avatar: Option<(Arc<dyn AvatarService>, AvatarInput)>, room_encrypted: bool,
        config: &Config,
    ) -> Self {
        let mut observer = service.observe_notification_state();
        let persisted = *observer.borrow_and_update();
        let initial = RoomNotificationSettingsViewState {
            room_encrypted,
            saving: false,
            notification_state: persisted.on_read(room_encrypted),
            avatar: None,
            display_name: None,
        };

        let shared = Arc::new(Shared {
            store: StateStore::new(initial),
            service,
            room_encrypted,
            save_timeout: config.service_timeout(),
            runtime: Handle::current(),
        });

        let mut subscriptions = vec![Self::observe(&shared, observer)];
        if let Some((avatar_service, input)) = avatar {
            subscriptions.push(Self::fetch_avatar(&shared, avatar_service, input));
        }

        Self {
            shared,
            _subscriptions: subscriptions,
        }
    }

    fn observe(shared: &Arc<Shared>, mut observer: watch::Receiver<RoomNotificationState>) -> Subscription {
        let runtime = shared.runtime.clone();
        let shared: Weak<Shared> = Arc::downgrade(shared);
        Subscription::spawn(&runtime, async move {
            while observer.changed().await.is_ok() {
                let persisted = *observer.borrow_and_update();
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                shared.persisted_state_changed(persisted);
            }
        })
    }

    fn fetch_avatar(
        shared: &Arc<Shared>, service: Arc<dyn AvatarService>, input: AvatarInput,
    ) -> Subscription {
        let runtime = shared.runtime.clone();
        let shared: Weak<Shared> = Arc::downgrade(shared);
        Subscription::spawn(&runtime, async move {
            let image = match service.avatar_image(&input).await {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(item = %input.matrix_item_id, error = %e, "avatar fetch failed");
                    return;
                }
            };
            let Some(shared) = shared.upgrade() else {
                return;
            };
            shared.store.update(|state| {
                state.avatar = Some(image);
                state.display_name = input.display_name;
            });
        })
    }

    /// The persisted state changed. Normally driven by the service's
    /// observer; exposed for hosts that push changes themselves.
    pub fn external_state_changed(&self, persisted: RoomNotificationState) {
        self.shared.persisted_state_changed(persisted);
    }
}

impl ViewModel for RoomNotificationSettingsViewModel {
    type Action = RoomNotificationSettingsAction;
    type Outcome = RoomNotificationSettingsOutcome;
    type State = RoomNotificationSettingsViewState;

    fn process(&self, action: Self::Action) {
        match action {
            RoomNotificationSettingsAction::Load => self.shared.store.republish(),
            RoomNotificationSettingsAction::SelectNotificationState(selected) => {
                self.shared.store.update(|state| state.notification_state = selected);
            }
            RoomNotificationSettingsAction::Save => self.shared.save(),
            RoomNotificationSettingsAction::Cancel => {
                self.shared.store.finish(RoomNotificationSettingsOutcome::Cancelled);
            }
        }
    }

    fn store(&self) -> &Store {
        &self.shared.store
    }
}
