//! Background purge of expired conversations.
//!
//! Runs on a fixed timer next to the chat loop. Each pass purges the shared
//! [`ConversationSet`] and only writes when something was removed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::set::ConversationSet;

/// Configuration for the purge sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Interval between sweeps (in seconds).
    pub interval_seconds: u64,
    /// Whether the sweep runs at all.
    pub enabled: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
            enabled: true,
        }
    }
}

/// Statistics from one sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepStats {
    /// Conversations removed.
    pub purged: usize,
    /// Conversations left.
    pub remaining: usize,
    /// Sweep duration in milliseconds.
    pub duration_ms: u64,
}

/// Periodic purge worker.
pub struct PurgeSweep {
    set: ConversationSet,
    config: SweepConfig,
    shutdown: Arc<Notify>,
}

impl PurgeSweep {
    /// Create a sweep over `set`.
    #[must_use]
    pub fn new(set: ConversationSet, config: SweepConfig) -> Self {
        Self {
            set,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a notifier that stops the sweep.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the sweep as a tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        if !self.config.enabled {
            info!("Purge sweep is disabled");
            return;
        }

        let interval = Duration::from_secs(self.config.interval_seconds);
        debug!(?interval, "Starting purge sweep");

        loop {
            tokio::select! {
                () = tokio::time::sleep(interval) => {
                    let stats = self.run_sweep();
                    if stats.purged > 0 {
                        info!(
                            purged = stats.purged,
                            remaining = stats.remaining,
                            duration_ms = stats.duration_ms,
                            "Purged expired conversations"
                        );
                    }
                }
                () = self.shutdown.notified() => {
                    debug!("Purge sweep shutting down");
                    break;
                }
            }
        }
    }

    /// Run one sweep now.
    #[must_use]
    pub fn run_sweep(&self) -> SweepStats {
        let start = std::time::Instant::now();
        let purged = self.set.purge_expired(Utc::now());
        SweepStats {
            purged,
            remaining: self.set.len(),
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Builder for sweep configuration.
#[derive(Debug, Clone, Default)]
pub struct SweepConfigBuilder {
    interval_seconds: Option<u64>,
    enabled: Option<bool>,
}

impl SweepConfigBuilder {
    /// Create a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sweep interval in seconds.
    #[must_use]
    pub const fn interval_seconds(mut self, seconds: u64) -> Self {
        self.interval_seconds = Some(seconds);
        self
    }

    /// Enable or disable the sweep.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Build the sweep configuration.
    #[must_use]
    pub fn build(self) -> SweepConfig {
        let default = SweepConfig::default();
        SweepConfig {
            interval_seconds: self.interval_seconds.unwrap_or(default.interval_seconds),
            enabled: self.enabled.unwrap_or(default.enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Category, Conversation, Message};
    use crate::store::conversations::ConversationStore;
    use crate::store::records::SqliteRecordStore;

    fn empty_set() -> (ConversationStore, ConversationSet) {
        let store = ConversationStore::new(Arc::new(SqliteRecordStore::in_memory().unwrap()));
        let set = ConversationSet::open(store.clone(), Utc::now());
        (store, set)
    }

    #[test]
    fn test_config_builder() {
        let config = SweepConfigBuilder::new()
            .interval_seconds(5)
            .enabled(false)
            .build();
        assert_eq!(config.interval_seconds, 5);
        assert!(!config.enabled);
        assert_eq!(SweepConfigBuilder::new().build(), SweepConfig::default());
    }

    #[test]
    fn test_expired_conversation_gone_after_sweep() {
        let (store, set) = empty_set();
        let mut expired = Conversation::start(Category::Personal, "bye", Message::user("bye"));
        expired.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        set.insert(expired.clone());
        set.insert(Conversation::start(Category::General, "hi", Message::user("hi")));
        assert!(set.get(expired.id).is_some());

        let sweep = PurgeSweep::new(set.clone(), SweepConfig::default());
        let stats = sweep.run_sweep();

        assert_eq!(stats.purged, 1);
        assert_eq!(stats.remaining, 1);
        assert!(set.get(expired.id).is_none());
        assert!(store.load().iter().all(|c| c.id != expired.id));
    }

    #[test]
    fn test_sweep_without_expired_is_a_no_op() {
        let (_store, set) = empty_set();
        set.insert(Conversation::start(Category::General, "hi", Message::user("hi")));
        let stats = PurgeSweep::new(set, SweepConfig::default()).run_sweep();
        assert_eq!(stats.purged, 0);
        assert_eq!(stats.remaining, 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_worker() {
        let (_store, set) = empty_set();
        let sweep = PurgeSweep::new(set, SweepConfig::default());
        let shutdown = sweep.shutdown_notifier();
        let handle = sweep.spawn();
        shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_disabled_worker_returns() {
        let (_store, set) = empty_set();
        let config = SweepConfigBuilder::new().enabled(false).build();
        let handle = PurgeSweep::new(set, config).spawn();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
