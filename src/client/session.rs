//! One chat session: conversations, credential state and turn execution.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chat::{Category, Conversation, ConversationId, ExpiryOption, Message, Role};
use crate::client::config::ClientConfig;
use crate::client::consumer::{StreamConsumer, StreamOutcome};
use crate::client::credential::{CredentialCache, CredentialSource, bootstrap};
use crate::client::enrich::{Attachment, Enricher};
use crate::client::error::{ConsumeError, SessionError};
use crate::protocol::{ChatRequest, WireMessage};
use crate::store::{
    ConversationSet, ConversationStore, RecordStore, SqliteRecordStore, StoreConfig, StoreResult,
};
use crate::wallet::EndpointWalletSource;

/// What a turn added to its conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnResult {
    /// The reply streamed to completion. Blank replies are not stored.
    Completed(String),
    /// The user stopped the reply. Non-blank partial text is stored.
    Cancelled(String),
    /// The turn failed; the stored error turn carries this message.
    Failed(String),
    /// No usable credential. The cached one was cleared.
    EnrollmentRequired,
}

/// Builds the visible assistant message for a failed turn.
#[must_use]
pub fn error_turn(message: &str) -> String {
    format!("Something went wrong: {message}. Please try again.")
}

struct StreamGuard<'a> {
    active: &'a Mutex<HashSet<ConversationId>>,
    id: ConversationId,
}

impl Drop for StreamGuard<'_> {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Session state shared by every chat operation.
pub struct ChatSession {
    conversations: ConversationSet,
    consumer: StreamConsumer,
    enricher: Enricher,
    credentials: CredentialCache,
    source: Mutex<CredentialSource>,
    active: Mutex<HashSet<ConversationId>>,
}

impl ChatSession {
    /// Assemble a session from its parts.
    #[must_use]
    pub fn new(
        conversations: ConversationSet,
        consumer: StreamConsumer,
        enricher: Enricher,
        credentials: CredentialCache,
        source: CredentialSource,
    ) -> Self {
        Self {
            conversations,
            consumer,
            enricher,
            credentials,
            source: Mutex::new(source),
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Open local storage, load and purge conversations, and check which
    /// credential the server expects.
    ///
    /// # Errors
    /// Returns an error if configuration is invalid or storage cannot be opened.
    pub async fn connect(client: &ClientConfig, store: &StoreConfig) -> Result<Self, SessionError> {
        client.validate()?;
        store.validate()?;

        let records: Arc<dyn RecordStore> =
            Arc::new(SqliteRecordStore::open(&store.db_path)?.with_quota_bytes(store.quota_bytes));
        let conversations = ConversationSet::open(ConversationStore::new(records.clone()), Utc::now());
        let credentials = CredentialCache::new(records);

        let http = reqwest::Client::builder()
            .connect_timeout(client.connect_timeout)
            .build()?;
        let consumer = StreamConsumer::new(http.clone(), client.endpoint("/api/chat")?, credentials.clone());
        let wallets = EndpointWalletSource::new(http.clone(), &client.server_url)?;
        let enricher = Enricher::new(Arc::new(wallets), client.wallet_timeout)?;

        let source = bootstrap(&http, client.endpoint("/api/config")?, &credentials).await;
        info!(
            conversations = conversations.len(),
            enrollment_required = source.needs_enrollment(),
            "Session ready"
        );

        Ok(Self::new(conversations, consumer, enricher, credentials, source))
    }

    /// Shared conversation set, e.g. for the background sweep.
    #[must_use]
    pub const fn conversations(&self) -> &ConversationSet {
        &self.conversations
    }

    /// Conversations, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<Conversation> {
        self.conversations.list()
    }

    /// Copy of one conversation.
    #[must_use]
    pub fn get(&self, id: ConversationId) -> Option<Conversation> {
        self.conversations.get(id)
    }

    fn source(&self) -> MutexGuard<'_, CredentialSource> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current credential source.
    #[must_use]
    pub fn credential_source(&self) -> CredentialSource {
        self.source().clone()
    }

    /// Store a user-supplied credential and use it from now on.
    ///
    /// # Errors
    /// Returns an error if the credential cannot be persisted.
    pub fn enroll(&self, credential: &str) -> StoreResult<()> {
        self.credentials.store(credential)?;
        *self.source() = CredentialSource::Local(credential.trim().to_string());
        Ok(())
    }

    /// Forget the local credential.
    pub fn logout(&self) {
        self.credentials.clear();
        *self.source() = CredentialSource::EnrollmentRequired;
    }

    /// Delete one conversation. Returns whether it existed.
    pub fn delete(&self, id: ConversationId) -> bool {
        self.conversations.remove(id)
    }

    /// Delete every conversation.
    pub fn delete_all(&self) {
        self.conversations.clear();
    }

    /// Set or clear the expiry of a conversation, relative to `now`.
    ///
    /// # Errors
    /// Returns an error if the conversation does not exist.
    pub fn set_expiry(
        &self,
        id: ConversationId,
        option: ExpiryOption,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, SessionError> {
        let expires_at = option.expires_at(now);
        self.conversations
            .update(id, |conversation| conversation.expires_at = expires_at)
            .ok_or(SessionError::UnknownConversation(id))?;
        Ok(expires_at)
    }

    fn claim(&self, id: ConversationId) -> Result<StreamGuard<'_>, SessionError> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(id) {
            return Err(SessionError::Busy(id));
        }
        Ok(StreamGuard {
            active: &self.active,
            id,
        })
    }

    /// Start a conversation with its first turn and stream the reply.
    ///
    /// # Errors
    /// Returns an error if neither text nor an attachment is given.
    pub async fn start_conversation<F: FnMut(&str)>(
        &self,
        category: Category,
        text: &str,
        attachment: Option<&Attachment>,
        cancel: &CancellationToken,
        on_update: F,
    ) -> Result<(ConversationId, TurnResult), SessionError> {
        ensure_not_empty(text, attachment)?;
        let turn = self.enricher.prepare(category, text, attachment).await;

        let conversation = Conversation::start(category, text, Message::user(turn.display));
        let id = conversation.id;
        let _guard = self.claim(id)?;
        self.conversations.insert(conversation);

        let history = vec![WireMessage::new(Role::User, turn.outbound)];
        let result = self.run_turn(id, category, history, cancel, on_update).await;
        Ok((id, result))
    }

    /// Send a follow-up turn in an existing conversation.
    ///
    /// # Errors
    /// Returns an error if the message is empty, the conversation is unknown,
    /// or a reply is already streaming for it.
    pub async fn send<F: FnMut(&str)>(
        &self,
        id: ConversationId,
        text: &str,
        attachment: Option<&Attachment>,
        cancel: &CancellationToken,
        on_update: F,
    ) -> Result<TurnResult, SessionError> {
        ensure_not_empty(text, attachment)?;
        let conversation = self
            .conversations
            .get(id)
            .ok_or(SessionError::UnknownConversation(id))?;
        let _guard = self.claim(id)?;

        let turn = self
            .enricher
            .prepare(conversation.category, text, attachment)
            .await;

        let mut history: Vec<WireMessage> = conversation
            .messages
            .iter()
            .map(|m| WireMessage::new(m.role, m.content.clone()))
            .collect();
        history.push(WireMessage::new(Role::User, turn.outbound));

        self.conversations
            .update(id, |c| c.push(Message::user(turn.display)))
            .ok_or(SessionError::UnknownConversation(id))?;

        Ok(self
            .run_turn(id, conversation.category, history, cancel, on_update)
            .await)
    }

    async fn run_turn<F: FnMut(&str)>(
        &self,
        id: ConversationId,
        category: Category,
        messages: Vec<WireMessage>,
        cancel: &CancellationToken,
        on_update: F,
    ) -> TurnResult {
        let request = ChatRequest {
            messages,
            category: category.as_str().to_string(),
            credential: self.source().credential().map(str::to_string),
        };

        let (reply, result) = match self.consumer.consume(&request, cancel, on_update).await {
            Ok(StreamOutcome::Completed(text)) => {
                (non_blank(&text), TurnResult::Completed(text))
            }
            Ok(StreamOutcome::Cancelled(text)) => {
                info!(conversation = %id, chars = text.len(), "Reply cancelled");
                (non_blank(&text), TurnResult::Cancelled(text))
            }
            Err(err @ ConsumeError::NoCredential) => {
                *self.source() = CredentialSource::EnrollmentRequired;
                (Some(error_turn(&err.to_string())), TurnResult::EnrollmentRequired)
            }
            Err(err) => {
                let message = err.to_string();
                warn!(conversation = %id, error = %message, "Reply failed");
                (Some(error_turn(&message)), TurnResult::Failed(message))
            }
        };

        if let Some(content) = reply {
            self.conversations
                .update(id, |c| c.push(Message::assistant(content)));
        }
        result
    }
}

fn ensure_not_empty(text: &str, attachment: Option<&Attachment>) -> Result<(), SessionError> {
    if text.trim().is_empty() && attachment.is_none() {
        return Err(SessionError::EmptyMessage);
    }
    Ok(())
}

fn non_blank(text: &str) -> Option<String> {
    (!text.trim().is_empty()).then(|| text.to_string())
}
