//! Mock services and recording delegates shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chat_screens::device_verification::{
    CancelCode, IncomingSasTransaction, SasState, TransactionId,
};
use chat_screens::notification_settings::{
    AvatarImage, AvatarInput, AvatarService, RoomNotificationSettingsService, RoomNotificationState,
};
use chat_screens::poll_timeline::{PollKind, PollService, TimelineAnswerOption, TimelinePoll};
use chat_screens::{CoordinatorDelegate, ServiceError, ViewDelegate};
use parking_lot::Mutex;
use tokio::sync::{Notify, watch};

/// Upper bound on how long a test waits for an asynchronous delivery.
pub const WAIT: Duration = Duration::from_secs(10);

//--- Delegates ----------------------------------------------------------------

/// Records every state and outcome a view model delivers.
pub struct Recorder<S, O> {
    states: Mutex<Vec<S>>,
    outcomes: Mutex<Vec<O>>,
    changed: Notify,
}

impl<S: Clone, O: Clone> Recorder<S, O> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            states: Mutex::new(Vec::new()),
            outcomes: Mutex::new(Vec::new()),
            changed: Notify::new(),
        })
    }

    pub fn states(&self) -> Vec<S> {
        self.states.lock().clone()
    }

    pub fn outcomes(&self) -> Vec<O> {
        self.outcomes.lock().clone()
    }

    /// Wait until at least `count` states have been delivered.
    pub async fn wait_for_states(&self, count: usize) -> Vec<S> {
        let wait = async {
            loop {
                let notified = self.changed.notified();
                {
                    let states = self.states.lock();
                    if states.len() >= count {
                        return states.clone();
                    }
                }
                notified.await;
            }
        };
        tokio::time::timeout(WAIT, wait).await.expect("states should be delivered")
    }

    /// Wait until at least `count` outcomes have been delivered.
    pub async fn wait_for_outcomes(&self, count: usize) -> Vec<O> {
        let wait = async {
            loop {
                let notified = self.changed.notified();
                {
                    let outcomes = self.outcomes.lock();
                    if outcomes.len() >= count {
                        return outcomes.clone();
                    }
                }
                notified.await;
            }
        };
        tokio::time::timeout(WAIT, wait).await.expect("outcomes should be delivered")
    }
}

impl<S: Clone + Send, O: Send> ViewDelegate<S> for Recorder<S, O> {
    fn did_update_view_state(&self, state: &S) {
        self.states.lock().push(state.clone());
        self.changed.notify_waiters();
    }
}

impl<S: Send, O: Send> CoordinatorDelegate<O> for Recorder<S, O> {
    fn did_finish(&self, outcome: O) {
        self.outcomes.lock().push(outcome);
        self.changed.notify_waiters();
    }
}

/// Let spawned tasks run until `done` holds.
pub async fn settle(mut done: impl FnMut() -> bool) {
    let wait = async {
        while !done() {
            tokio::task::yield_now().await;
        }
    };
    tokio::time::timeout(WAIT, wait).await.expect("condition should hold");
}

/// A runtime for tests that drive the view model from a plain thread, the
/// way a native shell calls in from its UI thread.
pub fn background_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("should build runtime")
}

//--- Device verification ------------------------------------------------------

/// An SDK transaction that records what the view model asks of it.
pub struct MockTransaction {
    id: TransactionId,
    device_id: String,
    state: Mutex<SasState>,
    accepted: AtomicUsize,
    cancelled: Mutex<Vec<CancelCode>>,
}

impl MockTransaction {
    pub fn incoming(device_id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: TransactionId::new(uuid::Uuid::new_v4().to_string()),
            device_id: device_id.into(),
            state: Mutex::new(SasState::IncomingShowAccept),
            accepted: AtomicUsize::new(0),
            cancelled: Mutex::new(Vec::new()),
        })
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> Vec<CancelCode> {
        self.cancelled.lock().clone()
    }

    pub fn set_state(&self, state: SasState) {
        *self.state.lock() = state;
    }
}

impl IncomingSasTransaction for MockTransaction {
    fn id(&self) -> TransactionId {
        self.id.clone()
    }

    fn other_device_id(&self) -> String {
        self.device_id.clone()
    }

    fn state(&self) -> SasState {
        *self.state.lock()
    }

    fn accept(&self) {
        self.accepted.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel(&self, code: CancelCode) {
        self.cancelled.lock().push(code);
        *self.state.lock() = SasState::CancelledByMe;
    }
}

//--- Notification settings ----------------------------------------------------

/// How the mock settings service answers `update`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateBehaviour {
    /// Wait for `complete` to be called, then succeed.
    Gated,
    /// Fail straight away.
    Fail,
    /// Never answer.
    Hang,
}

/// A notification settings service backed by a watch channel.
pub struct MockNotificationService {
    persisted: watch::Sender<RoomNotificationState>,
    updates: Mutex<Vec<RoomNotificationState>>,
    behaviour: UpdateBehaviour,
    gate: Notify,
}

impl MockNotificationService {
    pub fn new(persisted: RoomNotificationState, behaviour: UpdateBehaviour) -> Arc<Self> {
        let (sender, _) = watch::channel(persisted);
        Arc::new(Self {
            persisted: sender,
            updates: Mutex::new(Vec::new()),
            behaviour,
            gate: Notify::new(),
        })
    }

    /// Let a gated update finish.
    pub fn complete(&self) {
        self.gate.notify_one();
    }

    /// Change the persisted state from elsewhere (another device, say).
    pub fn set_persisted(&self, state: RoomNotificationState) {
        self.persisted.send_replace(state);
    }

    pub fn updates(&self) -> Vec<RoomNotificationState> {
        self.updates.lock().clone()
    }
}

#[async_trait]
impl RoomNotificationSettingsService for MockNotificationService {
    fn observe_notification_state(&self) -> watch::Receiver<RoomNotificationState> {
        self.persisted.subscribe()
    }

    async fn update(&self, state: RoomNotificationState) -> Result<(), ServiceError> {
        self.updates.lock().push(state);
        match self.behaviour {
            UpdateBehaviour::Gated => {
                self.gate.notified().await;
                Ok(())
            }
            UpdateBehaviour::Fail => Err(ServiceError::request("homeserver unavailable")),
            UpdateBehaviour::Hang => std::future::pending().await,
        }
    }
}

/// An avatar service that answers with a fixed result.
pub struct MockAvatarService {
    pub result: Result<AvatarImage, ServiceError>,
}

#[async_trait]
impl AvatarService for MockAvatarService {
    async fn avatar_image(&self, _input: &AvatarInput) -> Result<AvatarImage, ServiceError> {
        self.result.clone()
    }
}

//--- Poll timeline ------------------------------------------------------------

/// A poll service backed by a watch channel.
pub struct MockPollService {
    poll: watch::Sender<TimelinePoll>,
    sent: Mutex<Vec<Vec<String>>>,
    ended: AtomicUsize,
    fail: AtomicBool,
}

impl MockPollService {
    pub fn new(poll: TimelinePoll) -> Arc<Self> {
        let (sender, _) = watch::channel(poll);
        Arc::new(Self {
            poll: sender,
            sent: Mutex::new(Vec::new()),
            ended: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        })
    }

    /// Make every following request fail.
    pub fn fail_requests(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Push a new poll state, as the server would.
    pub fn push(&self, poll: TimelinePoll) {
        self.poll.send_replace(poll);
    }

    pub fn sent(&self) -> Vec<Vec<String>> {
        self.sent.lock().clone()
    }

    pub fn ended(&self) -> usize {
        self.ended.load(Ordering::SeqCst)
    }

    fn result(&self) -> Result<(), ServiceError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(ServiceError::request("could not send"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PollService for MockPollService {
    fn observe_poll(&self, _poll_start_event_id: &str) -> watch::Receiver<TimelinePoll> {
        self.poll.subscribe()
    }

    async fn send_answers(
        &self, _poll_start_event_id: &str, answer_ids: Vec<String>,
    ) -> Result<(), ServiceError> {
        self.sent.lock().push(answer_ids);
        self.result()
    }

    async fn end_poll(&self, _poll_start_event_id: &str) -> Result<(), ServiceError> {
        self.ended.fetch_add(1, Ordering::SeqCst);
        self.result()
    }
}

/// The open three-answer poll used across the poll tests.
pub fn sample_poll(closed: bool) -> TimelinePoll {
    let answer = |id: &str, text: &str, count, winner, selected| TimelineAnswerOption {
        id: id.into(),
        text: text.into(),
        count,
        winner,
        selected,
    };
    TimelinePoll {
        question: "You take the blue pill or the red pill?".into(),
        answer_options: vec![
            answer("1", "Blue", 10, false, false),
            answer("2", "Red", 5, false, true),
            answer("3", "Neither", 15, true, false),
        ],
        closed,
        total_answer_count: 30,
        kind: PollKind::Disclosed,
        max_allowed_selections: 1,
    }
}
