//! Wallet enrichment.
//!
//! Detects chain addresses in user text, looks them up concurrently under a
//! per-query timeout and renders the results as a context block that is put
//! in front of the outbound message.

pub mod config;
pub mod context;
pub mod detect;
pub mod error;
pub mod fanout;
pub mod rpc;
pub mod source;
pub mod types;
pub mod units;

pub use config::WalletConfig;
pub use context::{aggregate, prepend_context};
pub use detect::AddressDetector;
pub use error::WalletError;
pub use fanout::{fan_out, settle};
pub use rpc::RpcWalletSource;
pub use source::{EndpointWalletSource, WalletSource};
pub use types::{Chain, UNKNOWN_BALANCE, WalletQuery, WalletResult};
pub use units::{format_atomic, format_balance};
