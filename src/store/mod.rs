//! Local persistence: conversation list, credential record, purge and export.

pub mod config;
pub mod conversations;
pub mod error;
pub mod export;
pub mod records;
pub mod set;
pub mod stats;
pub mod sweep;

pub use config::StoreConfig;
pub use conversations::{ConversationStore, purge};
pub use error::{StoreError, StoreResult};
pub use export::{ExportArtifact, export_all, export_one, export_text, import, safe_title};
pub use records::{CONVERSATIONS_KEY, CREDENTIAL_KEY, RecordStore, SqliteRecordStore};
pub use set::ConversationSet;
pub use stats::{StorageStats, format_size, format_time_remaining, storage_stats};
pub use sweep::{PurgeSweep, SweepConfig, SweepConfigBuilder, SweepStats};
