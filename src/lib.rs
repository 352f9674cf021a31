//! # Chat Screens
//!
//! A shared core for the screen logic of a chat client. Each screen is a view
//! model that holds the current view state, accepts the user's actions, calls
//! out to services owned by the messaging SDK and pushes every new state to the
//! native shell that renders it.
//!
//! The crate does not provide a user interface or a messaging SDK - that is the
//! job of the host application. Services are reached through the traits in
//! each screen's `service` or `transaction` module.
//!
//! # Design
//!
//! ** View Models **
//!
//! Every screen follows the same shape (see [`view_model`]):
//!
//! - a single current view state, kept in a [`view_model::StateStore`],
//! - a closed set of actions handled by [`view_model::ViewModel::process`],
//! - notifications from the SDK that are filtered to the screen's own
//!   transaction or room and mapped onto the state,
//! - at most one view delegate and one coordinator delegate, both held weakly.
//!
//! The state store is the only place state changes are published from, so the
//! shell always sees states in the order they were produced.
//!
//! ** Services **
//!
//! Asynchronous service calls (saving settings, sending votes) run on the
//! Tokio runtime. Their completions are applied through a weak reference to
//! the view model, so a screen that has already been dismissed ignores them.
//! Constructing a view model that subscribes to SDK notifications requires a
//! running Tokio runtime.
//!
//! ** Cells **
//!
//! Timeline cells such as the call summary bubble have no lifecycle of their
//! own. See [`call_bubble`].

pub mod call_bubble;
pub mod config;
pub mod device_verification;
pub mod error;
pub mod notification_settings;
pub mod poll_timeline;
pub mod theme;
pub mod view_model;

pub use config::Config;
pub use error::ServiceError;
pub use view_model::{CoordinatorDelegate, StateStore, Subscription, ViewDelegate, ViewModel};
