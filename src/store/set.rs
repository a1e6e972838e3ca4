//! The in-memory conversation set, persisted after every change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::chat::{Conversation, ConversationId};
use crate::store::conversations::{ConversationStore, purge};

/// Authoritative list of conversations for one session.
///
/// Clones share the same list. Every mutation is followed by a save whose
/// failure is absorbed by [`ConversationStore::save`].
#[derive(Clone)]
pub struct ConversationSet {
    inner: Arc<Mutex<Vec<Conversation>>>,
    store: ConversationStore,
}

impl ConversationSet {
    /// Load the persisted list and drop whatever expired before `now`.
    ///
    /// The purged list is written back only if something was removed.
    #[must_use]
    pub fn open(store: ConversationStore, now: DateTime<Utc>) -> Self {
        let loaded = store.load();
        let live = purge(&loaded, now);
        if live.len() < loaded.len() {
            info!(purged = loaded.len() - live.len(), "Purged expired conversations on load");
            store.save(&live);
        }
        Self {
            inner: Arc::new(Mutex::new(live)),
            store,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Conversation>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the list, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<Conversation> {
        self.lock().clone()
    }

    /// Number of conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of one conversation.
    #[must_use]
    pub fn get(&self, id: ConversationId) -> Option<Conversation> {
        self.lock().iter().find(|c| c.id == id).cloned()
    }

    /// Add a conversation at the front.
    pub fn insert(&self, conversation: Conversation) {
        let mut list = self.lock();
        list.insert(0, conversation);
        self.store.save(&list);
    }

    /// Mutate one conversation in place and persist.
    ///
    /// Returns `None` if the id is unknown.
    pub fn update<R>(
        &self,
        id: ConversationId,
        mutate: impl FnOnce(&mut Conversation) -> R,
    ) -> Option<R> {
        let mut list = self.lock();
        let conversation = list.iter_mut().find(|c| c.id == id)?;
        let out = mutate(conversation);
        self.store.save(&list);
        Some(out)
    }

    /// Delete one conversation. Returns whether it existed.
    pub fn remove(&self, id: ConversationId) -> bool {
        let mut list = self.lock();
        let before = list.len();
        list.retain(|c| c.id != id);
        let removed = list.len() < before;
        if removed {
            self.store.save(&list);
        }
        removed
    }

    /// Delete every conversation.
    pub fn clear(&self) {
        let mut list = self.lock();
        list.clear();
        self.store.save(&list);
    }

    /// Add imported conversations whose ids are not present yet.
    ///
    /// Returns how many were added.
    pub fn import(&self, imported: Vec<Conversation>) -> usize {
        let mut list = self.lock();
        let mut added = 0;
        for conversation in imported {
            if list.iter().any(|c| c.id == conversation.id) {
                continue;
            }
            list.push(conversation);
            added += 1;
        }
        if added > 0 {
            self.store.save(&list);
        }
        added
    }

    /// Drop conversations expired at `now`, persisting only if any were removed.
    ///
    /// Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut list = self.lock();
        let live = purge(&list, now);
        let removed = list.len() - live.len();
        if removed > 0 {
            *list = live;
            self.store.save(&list);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Category, Message};
    use crate::store::records::{CONVERSATIONS_KEY, RecordStore, SqliteRecordStore};
    use chrono::Duration;

    fn conversation(text: &str, expires_at: Option<DateTime<Utc>>) -> Conversation {
        let mut conversation = Conversation::start(Category::General, text, Message::user(text));
        conversation.expires_at = expires_at;
        conversation
    }

    fn fresh() -> (Arc<SqliteRecordStore>, ConversationStore) {
        let records = Arc::new(SqliteRecordStore::in_memory().unwrap());
        (records.clone(), ConversationStore::new(records))
    }

    #[test]
    fn test_open_purges_and_resaves() {
        let (records, store) = fresh();
        let now = Utc::now();
        store.save(&[
            conversation("old", Some(now - Duration::hours(1))),
            conversation("keep", None),
        ]);

        let set = ConversationSet::open(store.clone(), now);
        assert_eq!(set.len(), 1);
        assert_eq!(store.load().len(), 1);
        assert!(records.get(CONVERSATIONS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_open_without_expired_does_not_write() {
        let (records, store) = fresh();
        let set = ConversationSet::open(store, Utc::now());
        assert!(set.is_empty());
        assert!(records.get(CONVERSATIONS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_mutations_persist() {
        let (_records, store) = fresh();
        let set = ConversationSet::open(store.clone(), Utc::now());

        let first = conversation("first", None);
        let second = conversation("second", None);
        set.insert(first.clone());
        set.insert(second.clone());
        assert_eq!(store.load()[0].id, second.id);

        let count = set.update(first.id, |c| {
            c.push(Message::assistant("reply"));
            c.messages.len()
        });
        assert_eq!(count, Some(2));
        assert_eq!(store.load()[1].messages.len(), 2);

        assert!(set.remove(second.id));
        assert!(!set.remove(second.id));
        assert_eq!(store.load().len(), 1);

        set.clear();
        assert!(store.load().is_empty());
        assert!(set.update(first.id, |_| ()).is_none());
    }

    #[test]
    fn test_import_skips_known_ids() {
        let (_records, store) = fresh();
        let set = ConversationSet::open(store, Utc::now());
        let existing = conversation("a", None);
        set.insert(existing.clone());

        let added = set.import(vec![existing, conversation("b", None)]);
        assert_eq!(added, 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_write_failure_keeps_memory_authoritative() {
        let records = Arc::new(
            SqliteRecordStore::in_memory()
                .unwrap()
                .with_quota_bytes(Some(10)),
        );
        let store = ConversationStore::new(records);
        let set = ConversationSet::open(store.clone(), Utc::now());

        set.insert(conversation("too big for the quota", None));
        assert_eq!(set.len(), 1);
        assert!(store.load().is_empty());
    }
}
