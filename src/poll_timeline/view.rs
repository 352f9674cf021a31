//! Poll timeline view models and the local voting rules.

use serde::{Deserialize, Serialize};

/// Whether votes are visible before the poll ends.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum PollKind {
    /// Results are visible while the poll is open.
    #[default]
    Disclosed,

    /// Results are only visible once the poll has ended.
    Undisclosed,
}

/// One answer of a poll.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TimelineAnswerOption {
    /// Answer id, unique within the poll.
    pub id: String,

    /// Answer text.
    pub text: String,

    /// Number of votes for this answer.
    pub count: u32,

    /// Whether the answer won (only meaningful on closed polls).
    pub winner: bool,

    /// Whether the user voted for this answer.
    pub selected: bool,
}

impl TimelineAnswerOption {
    /// Share of `total` votes this answer received, between 0 and 1.
    pub fn progress(&self, total: u32) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (f64::from(self.count) / f64::from(total)).min(1.0)
    }
}

/// A poll as shown in the timeline.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TimelinePoll {
    /// The question.
    pub question: String,

    /// The answers, in display order.
    pub answer_options: Vec<TimelineAnswerOption>,

    /// Whether the poll has ended.
    pub closed: bool,

    /// Number of users who voted.
    pub total_answer_count: u32,

    /// Whether results are visible while open.
    pub kind: PollKind,

    /// Maximum number of answers a user can pick.
    pub max_allowed_selections: u32,
}

impl Default for TimelinePoll {
    fn default() -> Self {
        Self {
            question: String::new(),
            answer_options: Vec::new(),
            closed: false,
            total_answer_count: 0,
            kind: PollKind::Disclosed,
            max_allowed_selections: 1,
        }
    }
}

impl TimelinePoll {
    /// Ids of the answers the user picked.
    pub fn selected_answer_ids(&self) -> Vec<String> {
        self.answer_options.iter().filter(|a| a.selected).map(|a| a.id.clone()).collect()
    }

    /// Whether vote counts are shown.
    pub const fn shows_results(&self) -> bool {
        self.total_answer_count > 0 && (self.closed || matches!(self.kind, PollKind::Disclosed))
    }

    /// Whether `answer` is highlighted as the winner.
    pub const fn shows_winner(&self, answer: &TimelineAnswerOption) -> bool {
        self.closed && answer.winner
    }

    /// Apply the user's pick of answer `id` locally, adjusting the counts the
    /// way the server will once the vote arrives. Returns `false` (and leaves
    /// the poll untouched) when the pick changes nothing: the poll is closed,
    /// the answer does not exist, it is already the single selection, or the
    /// selection limit is reached.
    pub fn select_answer(&mut self, id: &str) -> bool {
        if self.closed {
            return false;
        }
        let Some(index) = self.answer_options.iter().position(|a| a.id == id) else {
            return false;
        };
        let had_voted = self.answer_options.iter().any(|a| a.selected);

        if self.max_allowed_selections <= 1 {
            if self.answer_options[index].selected {
                return false;
            }
            for answer in &mut self.answer_options {
                if answer.selected {
                    answer.selected = false;
                    answer.count = answer.count.saturating_sub(1);
                }
            }
            let answer = &mut self.answer_options[index];
            answer.selected = true;
            answer.count = answer.count.saturating_add(1);
        } else {
            let answer_selected = self.answer_options[index].selected;
            let selected_count = self.answer_options.iter().filter(|a| a.selected).count();
            if !answer_selected
                && u32::try_from(selected_count).unwrap_or(u32::MAX) >= self.max_allowed_selections
            {
                return false;
            }
            let answer = &mut self.answer_options[index];
            if answer_selected {
                answer.selected = false;
                answer.count = answer.count.saturating_sub(1);
            } else {
                answer.selected = true;
                answer.count = answer.count.saturating_add(1);
            }
        }

        let has_voted = self.answer_options.iter().any(|a| a.selected);
        if !had_voted && has_voted {
            self.total_answer_count = self.total_answer_count.saturating_add(1);
        } else if had_voted && !has_voted {
            self.total_answer_count = self.total_answer_count.saturating_sub(1);
        }
        true
    }
}

/// Alerts the poll can raise.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum PollTimelineAlert {
    /// The vote could not be sent.
    VoteNotRegistered,

    /// The poll could not be ended.
    NotClosed,
}

/// View state of a poll in the timeline.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PollTimelineViewState {
    /// The poll.
    pub poll: TimelinePoll,

    /// Alert to show, if any.
    pub alert: Option<PollTimelineAlert>,
}

/// Label for an answer's vote count.
pub fn votes_label(count: u32) -> String {
    if count == 1 { "1 vote".into() } else { format!("{count} votes") }
}

/// Label for the poll's total vote count.
pub fn total_votes_label(total: u32) -> String {
    if total == 1 {
        "Based on 1 vote".into()
    } else {
        format!("Based on {total} votes")
    }
}
