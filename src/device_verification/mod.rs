//! # Incoming Device Verification
//!
//! The prompt shown when another device asks to be verified with a short
//! authentication string. Accepting moves the screen to
//! [`DeviceVerificationIncomingViewState::Loading`] straight away; the SDK
//! then announces on the [`VerificationEvents`] bus when the string is ready
//! or when the transaction was cancelled.
//!
//! The view model only reacts to announcements about its own transaction. It
//! holds the transaction weakly: the SDK decides how long it lives.

pub mod transaction;
pub mod view;

use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;

pub use self::transaction::{
    CancelCode, IncomingSasTransaction, SasState, TransactionChanged, TransactionId,
    VerificationEvents,
};
pub use self::view::{
    DeviceVerificationIncomingView, DeviceVerificationIncomingViewState, VerificationUser,
};
use crate::view_model::{StateStore, Subscription, ViewModel};

/// Actions the incoming verification prompt accepts.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum DeviceVerificationIncomingAction {
    /// The user accepts the request.
    Accept,

    /// The user declines the request.
    Cancel,
}

/// Outcomes reported to the coordinator.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum DeviceVerificationIncomingOutcome {
    /// The transaction reached the comparison step; the coordinator moves on
    /// to the SAS screen.
    Accepted(TransactionId),

    /// The user declined.
    Cancelled,
}

type Store = StateStore<DeviceVerificationIncomingViewState, DeviceVerificationIncomingOutcome>;

struct Shared {
    store: Store,
    transaction: Weak<dyn IncomingSasTransaction>,
    transaction_id: TransactionId,
}

impl Shared {
    fn transaction(&self) -> Option<Arc<dyn IncomingSasTransaction>> {
        let transaction = self.transaction.upgrade();
        if transaction.is_none() {
            tracing::warn!(transaction_id = %self.transaction_id, "transaction already released");
        }
        transaction
    }

    fn accept(&self) {
        let accepted = self.store.update_if(|state| {
            if *state != DeviceVerificationIncomingViewState::Idle {
                return false;
            }
            *state = DeviceVerificationIncomingViewState::Loading;
            true
        });
        if !accepted {
            tracing::debug!(transaction_id = %self.transaction_id, "accept ignored: request not idle");
            return;
        }
        if let Some(transaction) = self.transaction() {
            transaction.accept();
        }
    }

    fn cancel(&self) {
        let terminal = self.store.read(DeviceVerificationIncomingViewState::is_terminal);
        if !terminal {
            if let Some(transaction) = self.transaction() {
                transaction.cancel(CancelCode::User);
            }
        }
        self.store.finish(DeviceVerificationIncomingOutcome::Cancelled);
    }

    fn transaction_changed(&self, change: &TransactionChanged) {
        if change.transaction_id != self.transaction_id {
            return;
        }

        let next = match change.state {
            SasState::ShowSas => DeviceVerificationIncomingViewState::Loaded,
            SasState::Cancelled | SasState::CancelledByMe => {
                let Some(reason) = change.reason_cancel_code.clone() else {
                    tracing::debug!(
                        transaction_id = %self.transaction_id,
                        "cancellation without reason code dropped"
                    );
                    return;
                };
                if change.state == SasState::Cancelled {
                    DeviceVerificationIncomingViewState::Cancelled(reason)
                } else {
                    DeviceVerificationIncomingViewState::CancelledByMe(reason)
                }
            }
            other => {
                tracing::trace!(transaction_id = %self.transaction_id, state = ?other, "state ignored");
                return;
            }
        };

        let loaded = next == DeviceVerificationIncomingViewState::Loaded;
        let changed = self.store.update_if(|state| {
            if state.is_terminal() || *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed && loaded {
            self.store.finish(DeviceVerificationIncomingOutcome::Accepted(self.transaction_id.clone()));
        }
    }

    // Announcements were missed; catch up from the transaction itself. A
    // cancellation read this way has no reason code and is dropped.
    fn resync(&self) {
        if let Some(transaction) = self.transaction() {
            self.transaction_changed(&TransactionChanged::snapshot(&transaction, None));
        }
    }
}

/// View model of the incoming verification prompt.
pub struct DeviceVerificationIncomingViewModel {
    shared: Arc<Shared>,
    view: DeviceVerificationIncomingView,
    _transaction_changes: Subscription,
}

impl DeviceVerificationIncomingViewModel {
    /// Create the view model for `transaction`, listening on `events` for
    /// changes to it.
    ///
    /// Must be called from within a Tokio runtime; the listener runs on it.
    pub fn new<T>(other_user: VerificationUser, transaction: &Arc<T>, events: &VerificationEvents) -> Self
    where
        T: IncomingSasTransaction + 'static,
    {
        let transaction_id = transaction.id();
        let view = DeviceVerificationIncomingView {
            user: other_user,
            device_id: transaction.other_device_id(),
        };
        let weak_transaction: Weak<dyn IncomingSasTransaction> = Arc::downgrade(transaction) as Weak<T>;
        let shared = Arc::new(Shared {
            store: StateStore::new(DeviceVerificationIncomingViewState::Idle),
            transaction: weak_transaction,
            transaction_id,
        });

        let subscription = Self::subscribe(Arc::downgrade(&shared), events);
        Self {
            shared,
            view,
            _transaction_changes: subscription,
        }
    }

    fn subscribe(shared: Weak<Shared>, events: &VerificationEvents) -> Subscription {
        let mut receiver = events.subscribe();
        Subscription::spawn(&Handle::current(), async move {
            loop {
                match receiver.recv().await {
                    Ok(change) => {
                        let Some(shared) = shared.upgrade() else {
                            return;
                        };
                        shared.transaction_changed(&change);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "verification notifications missed");
                        let Some(shared) = shared.upgrade() else {
                            return;
                        };
                        shared.resync();
                    }
                    Err(RecvError::Closed) => return,
                }
            }
        })
    }

    /// The SDK announced a transaction state change. Changes to other
    /// transactions, unknown states and cancellations without a reason code
    /// are ignored.
    pub fn external_state_changed(&self, change: &TransactionChanged) {
        self.shared.transaction_changed(change);
    }

    /// Id of the transaction this prompt is for.
    pub fn transaction_id(&self) -> &TransactionId {
        &self.shared.transaction_id
    }

    /// Requesting user and device.
    pub const fn view(&self) -> &DeviceVerificationIncomingView {
        &self.view
    }
}

impl ViewModel for DeviceVerificationIncomingViewModel {
    type Action = DeviceVerificationIncomingAction;
    type Outcome = DeviceVerificationIncomingOutcome;
    type State = DeviceVerificationIncomingViewState;

    fn process(&self, action: Self::Action) {
        match action {
            DeviceVerificationIncomingAction::Accept => self.shared.accept(),
            DeviceVerificationIncomingAction::Cancel => self.shared.cancel(),
        }
    }

    fn store(&self) -> &Store {
        &self.shared.store
    }
}
