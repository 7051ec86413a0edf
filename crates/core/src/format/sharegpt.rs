//! ShareGPT: one `{"conversations": [...]}` line per transcript.

use serde::{Deserialize, Serialize};

use super::{ConvertedEntry, FormatConverter, OutputLayout, Role};
use crate::error::ConvertError;
use crate::record::ConversationMetadata;
use crate::template::expand_placeholders;
use crate::Anonymizer;

/// System message used when no template is configured.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are {characterName}, a character in a roleplay conversation with {userName}. Stay in character and keep the established tone and style.";

/// Stand-in for `{characterName}` when the character is unknown.
pub const CHARACTER_FALLBACK: &str = "a";

/// One ShareGPT conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGptRecord {
    pub conversations: Vec<ShareGptMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGptMessage {
    pub from: Role,
    pub value: String,
}

impl From<&ConvertedEntry> for ShareGptMessage {
    fn from(entry: &ConvertedEntry) -> Self {
        Self {
            from: entry.role,
            value: entry.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShareGptConverter {
    system_template: Option<String>,
}

impl ShareGptConverter {
    pub fn new(system_template: Option<String>) -> Self {
        Self { system_template }
    }

    fn system_message(
        &self,
        metadata: &ConversationMetadata,
        anonymizer: Option<&mut dyn Anonymizer>,
    ) -> String {
        let template = self
            .system_template
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_MESSAGE);
        expand_placeholders(
            template,
            metadata.character_name.as_deref(),
            metadata.user_name.as_deref(),
            anonymizer,
            CHARACTER_FALLBACK,
        )
    }
}

impl FormatConverter for ShareGptConverter {
    fn name(&self) -> &'static str {
        "sharegpt"
    }

    fn layout(&self) -> OutputLayout {
        OutputLayout::JsonLines
    }

    /// Serialize the whole transcript as one line.
    ///
    /// A system message is synthesized and prepended unless one is already
    /// present, so even a transcript without valid entries yields one line.
    fn serialize_entries(
        &self,
        entries: &[ConvertedEntry],
        metadata: &ConversationMetadata,
        anonymizer: Option<&mut dyn Anonymizer>,
    ) -> Result<String, ConvertError> {
        let mut conversations = Vec::with_capacity(entries.len() + 1);
        if !entries.iter().any(|e| e.role == Role::System) {
            conversations.push(ShareGptMessage {
                from: Role::System,
                value: self.system_message(metadata, anonymizer),
            });
        }
        conversations.extend(entries.iter().map(ShareGptMessage::from));

        let line = serde_json::to_string(&ShareGptRecord { conversations })?;
        Ok(format!("{}\n", line))
    }
}
