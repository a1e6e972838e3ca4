//! Conversation list persistence and expiry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::chat::Conversation;
use crate::store::error::StoreResult;
use crate::store::records::{CONVERSATIONS_KEY, RecordStore};

/// Keep the conversations that are still alive at `now`.
///
/// A conversation survives when it has no expiry or its expiry is strictly
/// after `now`. Pure and idempotent.
#[must_use]
pub fn purge(list: &[Conversation], now: DateTime<Utc>) -> Vec<Conversation> {
    list.iter()
        .filter(|conversation| !conversation.is_expired_at(now))
        .cloned()
        .collect()
}

/// Reads and writes the whole conversation list as one record.
#[derive(Clone)]
pub struct ConversationStore {
    records: Arc<dyn RecordStore>,
}

impl ConversationStore {
    /// Wrap a record store.
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Load the persisted list.
    ///
    /// A missing, unreadable or corrupt record loads as an empty list.
    #[must_use]
    pub fn load(&self) -> Vec<Conversation> {
        let raw = match self.records.get(CONVERSATIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "Could not read stored conversations");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(err) => {
                warn!(error = %err, "Stored conversations are corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Persist the full list.
    ///
    /// # Errors
    /// Returns an error if serialization fails or storage rejects the write.
    pub fn try_save(&self, list: &[Conversation]) -> StoreResult<()> {
        let raw = serde_json::to_string(list)?;
        self.records.put(CONVERSATIONS_KEY, &raw)?;
        debug!(count = list.len(), bytes = raw.len(), "Saved conversations");
        Ok(())
    }

    /// Persist the full list, absorbing failures.
    ///
    /// Returns whether the write went through. On failure the caller's
    /// in-memory list stays authoritative and nothing is retried.
    pub fn save(&self, list: &[Conversation]) -> bool {
        match self.try_save(list) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Could not persist conversations, keeping them in memory");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Category, Message, now_millis};
    use crate::store::records::SqliteRecordStore;
    use chrono::Duration;

    fn conversation(expires_at: Option<DateTime<Utc>>) -> Conversation {
        let mut conversation =
            Conversation::start(Category::General, "hello", Message::user("hello"));
        conversation.expires_at = expires_at;
        conversation
    }

    fn store() -> (Arc<SqliteRecordStore>, ConversationStore) {
        let records = Arc::new(SqliteRecordStore::in_memory().unwrap());
        let store = ConversationStore::new(records.clone());
        (records, store)
    }

    #[test]
    fn test_purge_boundaries() {
        let now = Utc::now();
        let list = vec![
            conversation(None),
            conversation(Some(now - Duration::seconds(1))),
            conversation(Some(now)),
            conversation(Some(now + Duration::seconds(1))),
        ];
        let kept = purge(&list, now);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, list[0].id);
        assert_eq!(kept[1].id, list[3].id);
    }

    #[test]
    fn test_purge_is_idempotent() {
        let now = Utc::now();
        let list: Vec<_> = (-3..3)
            .map(|offset| conversation(Some(now + Duration::minutes(offset))))
            .chain(std::iter::once(conversation(None)))
            .collect();
        for t in [now - Duration::hours(1), now, now + Duration::hours(1)] {
            let once = purge(&list, t);
            assert_eq!(purge(&once, t), once);
        }
    }

    #[test]
    fn test_purge_never_removes_unexpiring() {
        let list = vec![conversation(None), conversation(None)];
        let far_future = Utc::now() + Duration::days(365 * 100);
        assert_eq!(purge(&list, far_future), list);
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let (records, store) = store();
        assert!(store.load().is_empty());

        records.put(CONVERSATIONS_KEY, "{not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let (_records, store) = store();
        let mut first = conversation(Some(now_millis() + Duration::hours(1)));
        first.push(Message::assistant("hi there"));
        let list = vec![first, conversation(None)];

        assert!(store.save(&list));
        assert_eq!(store.load(), list);
    }

    #[test]
    fn test_save_failure_is_absorbed() {
        let records = Arc::new(
            SqliteRecordStore::in_memory()
                .unwrap()
                .with_quota_bytes(Some(16)),
        );
        let store = ConversationStore::new(records);
        let list = vec![conversation(None)];

        assert!(store.try_save(&list).is_err());
        assert!(!store.save(&list));
        assert!(store.load().is_empty());
    }
}
