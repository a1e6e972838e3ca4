//! Conversation domain types shared by the proxy, the store and the client.

pub mod category;
pub mod ids;
pub mod types;

pub use category::{Category, CategoryInfo, UnknownCategory};
pub use ids::{ConversationId, MessageId};
pub use types::{Conversation, ExpiryOption, Message, Role, now_millis, title_from};
