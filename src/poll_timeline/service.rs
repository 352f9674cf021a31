//! Services the poll timeline calls into.

use async_trait::async_trait;
use tokio::sync::watch;

use super::view::TimelinePoll;
use crate::error::ServiceError;

/// Access to a poll in a room.
#[async_trait]
pub trait PollService: Send + Sync {
    /// Receiver holding the current state of the poll started by
    /// `poll_start_event_id`, updated as votes and the end event arrive.
    fn observe_poll(&self, poll_start_event_id: &str) -> watch::Receiver<TimelinePoll>;

    /// Send the user's answers. An empty list withdraws the vote.
    async fn send_answers(
        &self, poll_start_event_id: &str, answer_ids: Vec<String>,
    ) -> Result<(), ServiceError>;

    /// End the poll.
    async fn end_poll(&self, poll_start_event_id: &str) -> Result<(), ServiceError>;
}
