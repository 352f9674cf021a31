//! # View Model
//!
//! The contract every screen implements, and the [`StateStore`] that backs it.
//!
//! A view model owns exactly one current view state. Actions from the shell
//! and notifications from the SDK both end up in [`StateStore::update`], which
//! mutates the state and queues the new snapshot in one step. Queued
//! notifications are then delivered to the bound delegates in order. A
//! delegate that calls back into the view model while it is being notified
//! only queues more notifications; they are delivered once the current one
//! returns.
//!
//! Delegates are held weakly. Binding a delegate does not keep it alive and a
//! delegate that has gone away is simply skipped.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Receives every new view state of a view model.
pub trait ViewDelegate<S>: Send + Sync {
    /// The view model has a new view state.
    fn did_update_view_state(&self, state: &S);
}

/// Receives the navigation outcome of a view model (done, cancelled, ...).
pub trait CoordinatorDelegate<O>: Send + Sync {
    /// The view model has finished with the given outcome.
    fn did_finish(&self, outcome: O);
}

/// A screen's view model.
pub trait ViewModel {
    /// The closed set of user intents the screen accepts.
    type Action: Debug;

    /// Everything the screen needs to render at one instant.
    type State: Clone + Debug + Send + 'static;

    /// Navigation outcomes reported to the coordinator.
    type Outcome: Debug + Send + 'static;

    /// Handle one user action. Any service call it starts completes later.
    fn process(&self, action: Self::Action);

    /// The store holding this view model's state.
    fn store(&self) -> &StateStore<Self::State, Self::Outcome>;

    /// Snapshot of the current view state.
    fn view_state(&self) -> Self::State {
        self.store().state()
    }

    /// Bind the view delegate, replacing any previous one.
    fn bind_view<D>(&self, delegate: &Arc<D>)
    where
        D: ViewDelegate<Self::State> + 'static,
    {
        self.store().bind_view(delegate);
    }

    /// Bind the coordinator delegate, replacing any previous one.
    fn bind_coordinator<D>(&self, delegate: &Arc<D>)
    where
        D: CoordinatorDelegate<Self::Outcome> + 'static,
    {
        self.store().bind_coordinator(delegate);
    }
}

enum Notification<S, O> {
    State(S),
    Outcome(O),
}

struct Inner<S, O> {
    state: S,
    outbox: VecDeque<Notification<S, O>>,
}

/// Single source of truth for a view model's state.
pub struct StateStore<S, O> {
    inner: Mutex<Inner<S, O>>,
    delivering: Mutex<()>,
    view: RwLock<Option<Weak<dyn ViewDelegate<S>>>>,
    coordinator: RwLock<Option<Weak<dyn CoordinatorDelegate<O>>>>,
}

impl<S, O> StateStore<S, O>
where
    S: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Create a store holding `initial` as the current state. Nothing is
    /// published until the state changes.
    pub fn new(initial: S) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: initial,
                outbox: VecDeque::new(),
            }),
            delivering: Mutex::new(()),
            view: RwLock::new(None),
            coordinator: RwLock::new(None),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S {
        self.inner.lock().state.clone()
    }

    /// Read the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.lock().state)
    }

    /// Mutate the state and publish the result.
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        {
            let mut inner = self.inner.lock();
            f(&mut inner.state);
            let snapshot = inner.state.clone();
            inner.outbox.push_back(Notification::State(snapshot));
        }
        self.flush();
    }

    /// Mutate the state only if `f` returns `true`, and publish it only then.
    /// Returns whether the state was published.
    pub fn update_if(&self, f: impl FnOnce(&mut S) -> bool) -> bool {
        let changed = {
            let mut inner = self.inner.lock();
            let mut next = inner.state.clone();
            if f(&mut next) {
                inner.state = next.clone();
                inner.outbox.push_back(Notification::State(next));
                true
            } else {
                false
            }
        };
        if changed {
            self.flush();
        }
        changed
    }

    /// Publish the current state again without changing it.
    pub fn republish(&self) {
        self.update(|_| {});
    }

    /// Report a navigation outcome to the coordinator, after any state already
    /// queued.
    pub fn finish(&self, outcome: O) {
        self.inner.lock().outbox.push_back(Notification::Outcome(outcome));
        self.flush();
    }

    /// Bind the view delegate.
    pub fn bind_view<D>(&self, delegate: &Arc<D>)
    where
        D: ViewDelegate<S> + 'static,
    {
        let weak: Weak<dyn ViewDelegate<S>> = Arc::downgrade(delegate) as Weak<D>;
        *self.view.write() = Some(weak);
    }

    /// Bind the coordinator delegate.
    pub fn bind_coordinator<D>(&self, delegate: &Arc<D>)
    where
        D: CoordinatorDelegate<O> + 'static,
    {
        let weak: Weak<dyn CoordinatorDelegate<O>> = Arc::downgrade(delegate) as Weak<D>;
        *self.coordinator.write() = Some(weak);
    }

    // Only one caller drains the outbox at a time. A caller that finds it
    // busy leaves its notifications for the current drainer, which re-checks
    // the outbox after letting go of the delivery lock.
    fn flush(&self) {
        loop {
            let Some(guard) = self.delivering.try_lock() else {
                return;
            };
            loop {
                let next = self.inner.lock().outbox.pop_front();
                let Some(notification) = next else {
                    break;
                };
                self.deliver(notification);
            }
            drop(guard);
            if self.inner.lock().outbox.is_empty() {
                return;
            }
        }
    }

    fn deliver(&self, notification: Notification<S, O>) {
        match notification {
            Notification::State(state) => {
                let view = self.view.read().as_ref().and_then(Weak::upgrade);
                match view {
                    Some(view) => view.did_update_view_state(&state),
                    None => tracing::trace!("no view bound, state not delivered"),
                }
            }
            Notification::Outcome(outcome) => {
                let coordinator = self.coordinator.read().as_ref().and_then(Weak::upgrade);
                match coordinator {
                    Some(coordinator) => coordinator.did_finish(outcome),
                    None => tracing::debug!("no coordinator bound, outcome dropped"),
                }
            }
        }
    }
}

impl<S: Debug, O> Debug for StateStore<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").field("state", &self.inner.lock().state).finish_non_exhaustive()
    }
}

/// A standing subscription (to an SDK notification channel or a service
/// observer). Dropping it deregisters the subscription.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Run `task` on `runtime` for as long as the returned subscription is
    /// alive.
    pub fn spawn<F>(runtime: &Handle, task: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self {
            task: runtime.spawn(task),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
