//! # Poll Timeline
//!
//! A poll shown inline in the room timeline. Picking an answer updates the
//! poll locally and sends the new selection; the poll state the server
//! reports back replaces the local one as it arrives.

pub mod service;
pub mod view;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

pub use self::service::PollService;
pub use self::view::{
    PollKind, PollTimelineAlert, PollTimelineViewState, TimelineAnswerOption, TimelinePoll,
    total_votes_label, votes_label,
};
use crate::config::Config;
use crate::error::with_timeout;
use crate::view_model::{StateStore, Subscription, ViewModel};

/// Actions the poll accepts.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum PollTimelineAction {
    /// The user picked the answer with this id.
    SelectAnswerOption(String),

    /// The poll's author ends the poll.
    EndPoll,

    /// The user dismissed the alert.
    DismissAlert,
}

/// Outcomes reported to the coordinator.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum PollTimelineOutcome {
    /// The poll was ended.
    Ended,
}

type Store = StateStore<PollTimelineViewState, PollTimelineOutcome>;

struct Shared {
    store: Store,
    service: Arc<dyn PollService>,
    poll_start_event_id: String,
    timeout: Duration,
    runtime: Handle,
    // Selections in the order they were made, drained by a single sender task.
    votes: mpsc::UnboundedSender<Vec<String>>,
    ending: AtomicBool,
}

impl Shared {
    fn select_answer(&self, id: &str) {
        let changed = self.store.update_if(|state| {
            if !state.poll.select_answer(id) {
                return false;
            }
            // queued under the state lock so votes go out in selection order
            if self.votes.send(state.poll.selected_answer_ids()).is_err() {
                tracing::warn!(poll = %self.poll_start_event_id, "vote sender stopped");
            }
            true
        });
        if !changed {
            tracing::debug!(poll = %self.poll_start_event_id, answer = id, "selection ignored");
        }
    }

    fn end_poll(self: &Arc<Self>) {
        if self.store.read(|state| state.poll.closed) {
            tracing::debug!(poll = %self.poll_start_event_id, "poll already closed");
            return;
        }
        if self.ending.swap(true, Ordering::SeqCst) {
            tracing::debug!(poll = %self.poll_start_event_id, "end ignored: already ending");
            return;
        }

        let service = Arc::clone(&self.service);
        let event_id = self.poll_start_event_id.clone();
        let timeout = self.timeout;
        let weak = Arc::downgrade(self);
        self.runtime.spawn(async move {
            let result = with_timeout(timeout, service.end_poll(&event_id)).await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match result {
                Ok(()) => shared.store.finish(PollTimelineOutcome::Ended),
                Err(e) => {
                    tracing::warn!(poll = %event_id, error = %e, "poll not closed");
                    shared.ending.store(false, Ordering::SeqCst);
                    shared.show_alert(PollTimelineAlert::NotClosed);
                }
            }
        });
    }

    fn show_alert(&self, alert: PollTimelineAlert) {
        self.store.update(|state| state.alert = Some(alert));
    }

    fn update_with_poll(&self, poll: TimelinePoll) {
        self.store.update_if(|state| {
            if state.poll == poll {
                return false;
            }
            state.poll = poll;
            true
        });
    }
}

// Sends queued selections one at a time. Ends once the view model is gone
// and the queue is drained.
async fn send_votes(
    shared: Weak<Shared>, service: Arc<dyn PollService>, event_id: String, timeout: Duration,
    mut votes: mpsc::UnboundedReceiver<Vec<String>>,
) {
    while let Some(answer_ids) = votes.recv().await {
        let Err(e) = with_timeout(timeout, service.send_answers(&event_id, answer_ids)).await else {
            continue;
        };
        tracing::warn!(poll = %event_id, error = %e, "vote not registered");
        if let Some(shared) = shared.upgrade() {
            shared.show_alert(PollTimelineAlert::VoteNotRegistered);
        }
    }
}

/// View model of a poll in the timeline.
pub struct PollTimelineViewModel {
    shared: Arc<Shared>,
    _poll_updates: Subscription,
}

impl PollTimelineViewModel {
    /// Create the view model for the poll started by `poll_start_event_id`.
    ///
    /// Must be called from within a Tokio runtime. Votes and the end request
    /// are sent on that runtime, so [`ViewModel::process`] may be called from
    /// any thread afterwards.
    pub fn new(poll_start_event_id: impl Into<String>, service: Arc<dyn PollService>, config: &Config) -> Self {
        let poll_start_event_id = poll_start_event_id.into();
        let mut updates = service.observe_poll(&poll_start_event_id);
        let initial = updates.borrow_and_update().clone();
        let (votes, queued) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            store: StateStore::new(PollTimelineViewState {
                poll: initial,
                alert: None,
            }),
            service: Arc::clone(&service),
            poll_start_event_id: poll_start_event_id.clone(),
            timeout: config.service_timeout(),
            runtime: Handle::current(),
            votes,
            ending: AtomicBool::new(false),
        });
        shared.runtime.spawn(send_votes(
            Arc::downgrade(&shared),
            service,
            poll_start_event_id,
            shared.timeout,
            queued,
        ));
        let subscription = Self::observe(&shared, updates);

        Self {
            shared,
            _poll_updates: subscription,
        }
    }

    fn observe(shared: &Arc<Shared>, mut updates: watch::Receiver<TimelinePoll>) -> Subscription {
        let runtime = shared.runtime.clone();
        let shared: Weak<Shared> = Arc::downgrade(shared);
        Subscription::spawn(&runtime, async move {
            while updates.changed().await.is_ok() {
                let poll = updates.borrow_and_update().clone();
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                shared.update_with_poll(poll);
            }
        })
    }

    /// Replace the poll with the state reported by the server. Normally
    /// driven by the service's observer.
    pub fn update_with_poll(&self, poll: TimelinePoll) {
        self.shared.update_with_poll(poll);
    }

    /// Tell the user their vote could not be sent.
    pub fn show_answering_failure(&self) {
        self.shared.show_alert(PollTimelineAlert::VoteNotRegistered);
    }

    /// Tell the user the poll could not be ended.
    pub fn show_closing_failure(&self) {
        self.shared.show_alert(PollTimelineAlert::NotClosed);
    }

    /// Id of the event that started the poll.
    pub fn poll_start_event_id(&self) -> &str {
        &self.shared.poll_start_event_id
    }
}

impl ViewModel for PollTimelineViewModel {
    type Action = PollTimelineAction;
    type Outcome = PollTimelineOutcome;
    type State = PollTimelineViewState;

    fn process(&self, action: Self::Action) {
        match action {
            PollTimelineAction::SelectAnswerOption(id) => self.shared.select_answer(&id),
            PollTimelineAction::EndPoll => self.shared.end_poll(),
            PollTimelineAction::DismissAlert => {
                self.shared.store.update_if(|state| state.alert.take().is_some());
            }
        }
    }

    fn store(&self) -> &Store {
        &self.shared.store
    }
}
