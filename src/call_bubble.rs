//! # Call Bubble
//!
//! Content of the call summary bubble in the room timeline. The bubble has no
//! lifecycle of its own: [`CallBubbleContentView::render`] assigns its visual
//! properties from a [`CallBubbleData`] snapshot and
//! [`CallBubbleContentView::apply_theme`] assigns its colours. Neither keeps a
//! reference to its input.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::theme::{Color, Theme};

/// Height of the call summary when other content sits below it.
pub const CALL_SUMMARY_WITH_BOTTOM_VIEW_HEIGHT: f64 = 20.0;

/// Height of the call summary when it stands alone.
pub const CALL_SUMMARY_STANDALONE_VIEW_HEIGHT: f64 = 20.0 + 44.0;

/// Kind of call.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum CallType {
    /// Audio only.
    #[default]
    Voice,

    /// Audio and video.
    Video,
}

impl CallType {
    /// Label shown under the caller's name.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Voice => "Voice call",
            Self::Video => "Video call",
        }
    }

    /// Icon shown next to the label.
    pub const fn icon(self) -> CallIcon {
        match self {
            Self::Voice => CallIcon::VoiceCall,
            Self::Video => CallIcon::VideoCall,
        }
    }
}

/// Icons the bubble can show.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum CallIcon {
    /// Handset.
    #[default]
    VoiceCall,

    /// Camera.
    VideoCall,
}

/// What a call bubble shows, taken from the timeline cell data.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CallBubbleData {
    /// When the call happened, in the user's time zone.
    pub timestamp: DateTime<FixedOffset>,

    /// Whether this is the first bubble of its day, which carries the date
    /// header.
    pub is_pagination_first_bubble: bool,

    /// Name of the other party.
    pub caller_name: String,

    /// Kind of call.
    pub call_type: CallType,

    /// Status text ("Missed call", "Active call", ...), if any.
    pub status_text: Option<String>,
}

/// Colours of the bubble's parts.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CallBubbleColors {
    /// Date header text.
    pub pagination_label: Color,
    /// Line under the date header.
    pub pagination_separator: Color,
    /// Card background.
    pub background: Color,
    /// Caller name.
    pub caller_name: Color,
    /// Call icon tint.
    pub call_icon: Color,
    /// Call type label.
    pub call_type: Color,
    /// Dot between call type and status.
    pub dot: Color,
    /// Status text.
    pub call_status: Color,
}

impl From<&Theme> for CallBubbleColors {
    fn from(theme: &Theme) -> Self {
        Self {
            pagination_label: theme.tint_color,
            pagination_separator: theme.tint_color,
            background: theme.header_background_color,
            caller_name: theme.text_primary_color,
            call_icon: theme.text_tertiary_color,
            call_type: theme.text_tertiary_color,
            dot: theme.text_tertiary_color,
            call_status: theme.text_tertiary_color,
        }
    }
}

/// Visual properties of a call bubble.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CallBubbleContentView {
    /// Whether the date header is hidden.
    pub pagination_title_hidden: bool,

    /// Date header text.
    pub pagination_label: Option<String>,

    /// Caller name.
    pub caller_name: String,

    /// Call type label.
    pub call_type_label: String,

    /// Call icon.
    pub call_icon: CallIcon,

    /// Status text.
    pub call_status: Option<String>,

    /// Whether the dot before the status is hidden.
    pub dot_hidden: bool,

    /// Height of the call summary.
    pub call_summary_height: f64,

    /// Whether the owning cell placed content below the summary.
    pub has_bottom_content: bool,

    /// Whether the avatar is cached in memory.
    pub avatar_in_memory_cache: bool,

    /// Current colours.
    pub colors: CallBubbleColors,

    theme: Theme,
}

impl CallBubbleContentView {
    /// An empty bubble painted with `theme`.
    pub fn new(theme: &Theme) -> Self {
        Self {
            pagination_title_hidden: true,
            pagination_label: None,
            caller_name: String::new(),
            call_type_label: String::new(),
            call_icon: CallIcon::default(),
            call_status: None,
            dot_hidden: true,
            call_summary_height: CALL_SUMMARY_STANDALONE_VIEW_HEIGHT,
            has_bottom_content: false,
            avatar_in_memory_cache: false,
            colors: CallBubbleColors::from(theme),
            theme: theme.clone(),
        }
    }

    /// Assign the bubble's content from `data`. `today` is the user's current
    /// date, used to label the date header.
    pub fn render(&mut self, data: &CallBubbleData, today: NaiveDate) {
        if data.is_pagination_first_bubble {
            self.pagination_title_hidden = false;
            self.pagination_label =
                Some(pagination_date_label(data.timestamp.date_naive(), today).to_uppercase());
        } else {
            self.pagination_title_hidden = true;
            self.pagination_label = None;
        }

        self.caller_name.clone_from(&data.caller_name);
        self.call_type_label = data.call_type.label().to_owned();
        self.call_icon = data.call_type.icon();
        self.set_status_text(data.status_text.clone());
        self.avatar_in_memory_cache = true;
    }

    /// Set the status text; the dot is shown only when there is one.
    pub fn set_status_text(&mut self, status_text: Option<String>) {
        self.dot_hidden = status_text.is_none();
        self.call_status = status_text;
    }

    /// Size the call summary for whether content sits below it.
    pub fn relayout_call_summary(&mut self) {
        self.call_summary_height = if self.has_bottom_content {
            CALL_SUMMARY_WITH_BOTTOM_VIEW_HEIGHT
        } else {
            CALL_SUMMARY_STANDALONE_VIEW_HEIGHT
        };
    }

    /// Paint the bubble with `theme`. Only colours change.
    pub fn apply_theme(&mut self, theme: &Theme) {
        self.theme = theme.clone();
        self.colors = CallBubbleColors::from(theme);
    }

    /// The theme last applied.
    pub const fn theme(&self) -> &Theme {
        &self.theme
    }
}

/// Label for the date header: "Today", "Yesterday", the weekday for the past
/// week, otherwise the date (with the year when it is not the current one).
pub fn pagination_date_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        return "Today".into();
    }
    if today.pred_opt() == Some(date) {
        return "Yesterday".into();
    }
    if date < today && today - date < Duration::days(7) {
        return date.format("%A").to_string();
    }
    if date.year() == today.year() {
        date.format("%B %-d").to_string()
    } else {
        date.format("%B %-d, %Y").to_string()
    }
}
