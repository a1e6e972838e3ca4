//! Storage statistics and expiry display helpers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chat::Conversation;

const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;

/// Summary of what is stored locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Number of conversations.
    pub conversation_count: usize,
    /// Total number of messages across conversations.
    pub message_count: usize,
    /// Serialized size, e.g. `512 B`, `1.5 KB`.
    pub storage_used: String,
}

/// Compute stats over `list`, sized by its serialized JSON form.
#[must_use]
pub fn storage_stats(list: &[Conversation]) -> StorageStats {
    let bytes = serde_json::to_string(list).map_or(0, |raw| raw.len());
    StorageStats {
        conversation_count: list.len(),
        message_count: list.iter().map(|c| c.messages.len()).sum(),
        storage_used: format_size(bytes),
    }
}

/// Render a byte count as `B`, `KB` or `MB` with one decimal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: usize) -> String {
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

/// Render the time left until `expires_at`, rounded up to the largest unit.
#[must_use]
pub fn format_time_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const SECOND: i64 = 1_000;
    const MINUTE: i64 = 60 * SECOND;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    let remaining = (expires_at - now).num_milliseconds();
    if remaining <= 0 {
        return "Expired".to_string();
    }
    let ceil = |unit: i64| (remaining + unit - 1) / unit;
    if remaining < MINUTE {
        format!("{}s", ceil(SECOND))
    } else if remaining < HOUR {
        format!("{}m", ceil(MINUTE))
    } else if remaining < DAY {
        format!("{}h", ceil(HOUR))
    } else {
        format!("{}d", ceil(DAY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Category, Message};
    use chrono::Duration;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_storage_stats_counts() {
        let mut first = Conversation::start(Category::Health, "a", Message::user("a"));
        first.push(Message::assistant("b"));
        let second = Conversation::start(Category::General, "c", Message::user("c"));

        let stats = storage_stats(&[first, second]);
        assert_eq!(stats.conversation_count, 2);
        assert_eq!(stats.message_count, 3);
        assert!(stats.storage_used.ends_with(" B"));
    }

    #[test]
    fn test_time_remaining() {
        let now = Utc::now();
        assert_eq!(format_time_remaining(now, now), "Expired");
        assert_eq!(format_time_remaining(now - Duration::seconds(5), now), "Expired");
        assert_eq!(format_time_remaining(now + Duration::milliseconds(1_500), now), "2s");
        assert_eq!(format_time_remaining(now + Duration::seconds(90), now), "2m");
        assert_eq!(format_time_remaining(now + Duration::hours(1), now), "1h");
        assert_eq!(format_time_remaining(now + Duration::minutes(61), now), "2h");
        assert_eq!(format_time_remaining(now + Duration::days(7), now), "7d");
    }
}
