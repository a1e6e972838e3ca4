//! Conversation data model.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::category::Category;
use crate::chat::ids::{ConversationId, MessageId};

/// Longest title kept verbatim.
const TITLE_MAX_CHARS: usize = 60;
/// Characters kept before the ellipsis when a title is truncated.
const TITLE_TRUNCATED_CHARS: usize = 57;

/// Current time truncated to whole milliseconds, the persisted precision.
#[must_use]
pub fn now_millis() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

fn truncate_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(instant.timestamp_millis()).unwrap_or(instant)
}

/// Author of a message.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing.
    User,
    /// The model.
    Assistant,
}

impl Role {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id.
    pub id: MessageId,
    /// Author.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Creation instant, persisted as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: now_millis(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A conversation and its ordered messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation id.
    pub id: ConversationId,
    /// Short title derived from the first message.
    pub title: String,
    /// Category, fixed at creation.
    pub category: Category,
    /// Messages in insertion order.
    pub messages: Vec<Message>,
    /// Creation instant.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Last time a message was appended.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Instant after which the conversation is purged. `None` keeps it forever.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Start a conversation from its first user message.
    #[must_use]
    pub fn start(category: Category, title_source: &str, first: Message) -> Self {
        let now = now_millis();
        Self {
            id: ConversationId::new(),
            title: title_from(title_source),
            category,
            messages: vec![first],
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    /// Append a message and bump `updated_at`.
    pub fn push(&mut self, message: Message) {
        self.updated_at = now_millis();
        self.messages.push(message);
    }

    /// Whether the conversation must be purged at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Build a conversation title from the first message.
#[must_use]
pub fn title_from(text: &str) -> String {
    if text.chars().count() > TITLE_MAX_CHARS {
        let head: String = text.chars().take(TITLE_TRUNCATED_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Retention choices offered for a conversation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ExpiryOption {
    /// Never purge.
    Never,
    /// Purge one hour from now.
    OneHour,
    /// Purge 24 hours from now.
    OneDay,
    /// Purge seven days from now.
    SevenDays,
}

impl ExpiryOption {
    /// All options in menu order.
    pub const ALL: [Self; 4] = [Self::Never, Self::OneHour, Self::OneDay, Self::SevenDays];

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Never => "No auto-delete",
            Self::OneHour => "1 hour",
            Self::OneDay => "24 hours",
            Self::SevenDays => "7 days",
        }
    }

    /// Time to live, if any.
    #[must_use]
    pub fn ttl(self) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::OneHour => Some(Duration::hours(1)),
            Self::OneDay => Some(Duration::hours(24)),
            Self::SevenDays => Some(Duration::days(7)),
        }
    }

    /// Absolute expiry computed from `now`.
    ///
    /// Truncated to whole milliseconds so the in-memory value matches what
    /// is persisted.
    #[must_use]
    pub fn expires_at(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ttl().map(|ttl| truncate_millis(now + ttl))
    }
}

impl std::str::FromStr for ExpiryOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" | "none" => Ok(Self::Never),
            "1h" => Ok(Self::OneHour),
            "24h" | "1d" => Ok(Self::OneDay),
            "7d" => Ok(Self::SevenDays),
            other => Err(format!("unknown expiry option: {other} (use never, 1h, 24h, 7d)")),
        }
    }
}
