//! Terminal-side chat client.
//!
//! Owns the local conversation set and the cached credential, prepares
//! turns (attachments, wallet context) and consumes the proxy's frame
//! stream with cooperative cancellation.

pub mod config;
pub mod consumer;
pub mod credential;
pub mod enrich;
pub mod error;
pub mod session;

pub use config::ClientConfig;
pub use consumer::{StreamConsumer, StreamOutcome};
pub use credential::{CredentialCache, CredentialSource, bootstrap, fetch_config};
pub use enrich::{Attachment, Enricher, PreparedTurn};
pub use error::{ConsumeError, SessionError};
pub use session::{ChatSession, TurnResult, error_turn};
