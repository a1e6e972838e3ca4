//! Export and import of conversations.
//!
//! Exports are read-only with respect to stored state: they render
//! artifacts, the caller decides where they go.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;

use crate::chat::{Conversation, Role};
use crate::store::error::{StoreError, StoreResult};

const SAFE_TITLE_CHARS: usize = 30;

/// A rendered export, ready to be written somewhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Suggested file name.
    pub file_name: String,
    /// MIME type of `body`.
    pub mime: &'static str,
    /// File contents.
    pub body: String,
}

impl ExportArtifact {
    /// Write the artifact into `dir` and return the written path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.body)?;
        Ok(path)
    }
}

/// File-name friendly version of a title: first 30 chars, anything that is
/// not an ASCII letter or digit replaced by `-`.
#[must_use]
pub fn safe_title(title: &str) -> String {
    title
        .chars()
        .take(SAFE_TITLE_CHARS)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Export every conversation as one pretty-printed JSON array.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn export_all(list: &[Conversation], today: NaiveDate) -> StoreResult<ExportArtifact> {
    Ok(ExportArtifact {
        file_name: format!("undox-export-{}.json", today.format("%Y-%m-%d")),
        mime: "application/json",
        body: serde_json::to_string_pretty(list)?,
    })
}

/// Export one conversation as pretty-printed JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn export_one(conversation: &Conversation, today: NaiveDate) -> StoreResult<ExportArtifact> {
    Ok(ExportArtifact {
        file_name: format!(
            "undox-{}-{}.json",
            safe_title(&conversation.title),
            today.format("%Y-%m-%d")
        ),
        mime: "application/json",
        body: serde_json::to_string_pretty(conversation)?,
    })
}

/// Export one conversation as a readable transcript.
#[must_use]
pub fn export_text(conversation: &Conversation, today: NaiveDate) -> ExportArtifact {
    let mut body = format!("# {}\n", conversation.title);
    let _ = writeln!(body, "Category: {}", conversation.category);
    let _ = writeln!(
        body,
        "Date: {}",
        conversation.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    body.push_str("---\n\n");

    for message in &conversation.messages {
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "AI",
        };
        let _ = writeln!(
            body,
            "**{speaker}** ({}):",
            message.timestamp.format("%H:%M:%S")
        );
        let _ = writeln!(body, "{}\n", message.content);
    }

    ExportArtifact {
        file_name: format!(
            "undox-{}-{}.txt",
            safe_title(&conversation.title),
            today.format("%Y-%m-%d")
        ),
        mime: "text/plain",
        body,
    }
}

/// Parse an exported artifact back into conversations.
///
/// Accepts either a JSON array (full export) or a single conversation.
///
/// # Errors
/// Returns an error if the input is not a valid export.
pub fn import(raw: &str) -> StoreResult<Vec<Conversation>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| StoreError::Import(err.to_string()))?;
    let parsed = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|one| vec![one])
    };
    parsed.map_err(|err| StoreError::Import(err.to_string()))
}
