//! Outbound message preparation: attachments and wallet context.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::chat::Category;
use crate::wallet::{
    AddressDetector, WalletError, WalletSource, aggregate, fan_out, prepend_context,
};

/// A text file sent along with a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown in the conversation.
    pub name: String,
    /// File contents sent to the model.
    pub content: String,
}

impl Attachment {
    /// Build an attachment.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// The two renderings of one user turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedTurn {
    /// Text stored in the conversation.
    pub display: String,
    /// Text sent to the model.
    pub outbound: String,
}

/// Prepares user turns before they are sent.
pub struct Enricher {
    detector: AddressDetector,
    source: Arc<dyn WalletSource>,
    timeout: Duration,
}

impl Enricher {
    /// Create an enricher looking wallets up through `source`.
    ///
    /// # Errors
    /// Returns an error if the address grammars fail to compile.
    pub fn new(source: Arc<dyn WalletSource>, timeout: Duration) -> Result<Self, WalletError> {
        Ok(Self {
            detector: AddressDetector::new()?,
            source,
            timeout,
        })
    }

    /// Wallet context block for the addresses in `text`, empty if none.
    ///
    /// Lookup failures end up inside the block, so this never fails.
    pub async fn wallet_context(&self, text: &str) -> String {
        let queries = self.detector.detect(text);
        if queries.is_empty() {
            return String::new();
        }
        info!(count = queries.len(), "Fetching wallet data");
        let results = fan_out(self.source.as_ref(), &queries, self.timeout).await;
        aggregate(&results)
    }

    /// Build the stored and outbound forms of a turn.
    ///
    /// Wallet data is only fetched for categories that use it, and only from
    /// the typed text, not from attachments.
    pub async fn prepare(
        &self,
        category: Category,
        text: &str,
        attachment: Option<&Attachment>,
    ) -> PreparedTurn {
        let (display, outbound) = match attachment {
            Some(file) => {
                let display = if file.name.is_empty() {
                    text.to_string()
                } else {
                    format!("[{}] {text}", file.name)
                };
                let outbound = format!(
                    "[Attached file: {}]\n{}\n---\n{text}",
                    file.name, file.content
                );
                (display, outbound)
            }
            None => (text.to_string(), text.to_string()),
        };

        if !category.enriches_wallets() {
            return PreparedTurn { display, outbound };
        }
        let context = self.wallet_context(text).await;
        PreparedTurn {
            display,
            outbound: prepend_context(&context, &outbound),
        }
    }
}
