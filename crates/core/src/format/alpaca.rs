//! Alpaca: each transcript condensed into one instruction/input/output record.

use serde::{Deserialize, Serialize};

use super::{ConvertedEntry, FormatConverter, OutputLayout, Role};
use crate::error::ConvertError;
use crate::record::ConversationMetadata;
use crate::template::expand_placeholders;
use crate::Anonymizer;

/// Instruction used when the character is known and no template is configured.
pub const DEFAULT_ROLEPLAY_INSTRUCTION: &str = "You are {characterName}, a character in a roleplay scenario. Respond in character, maintaining the established tone and style.";

/// Instruction used when neither a template nor a character name is available.
pub const DEFAULT_ASSISTANT_INSTRUCTION: &str =
    "You are an AI assistant. Continue the conversation with a helpful and consistent response.";

/// Stand-in for `{characterName}` when the character is unknown.
pub const CHARACTER_FALLBACK: &str = "an AI assistant";

/// Label for assistant turns when the character is unknown.
pub const DEFAULT_ASSISTANT_LABEL: &str = "Assistant";

pub const HUMAN_LABEL: &str = "Human";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlpacaRecord {
    pub instruction: String,
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, Default)]
pub struct AlpacaConverter {
    instruction_template: Option<String>,
}

impl AlpacaConverter {
    pub fn new(instruction_template: Option<String>) -> Self {
        Self {
            instruction_template,
        }
    }

    fn instruction(
        &self,
        metadata: &ConversationMetadata,
        anonymizer: Option<&mut dyn Anonymizer>,
    ) -> String {
        let template = match (&self.instruction_template, &metadata.character_name) {
            (Some(template), _) => template.as_str(),
            (None, Some(_)) => DEFAULT_ROLEPLAY_INSTRUCTION,
            (None, None) => DEFAULT_ASSISTANT_INSTRUCTION,
        };
        expand_placeholders(
            template,
            metadata.character_name.as_deref(),
            metadata.user_name.as_deref(),
            anonymizer,
            CHARACTER_FALLBACK,
        )
    }

    /// Fold a transcript into at most one record.
    ///
    /// Returns `None` when the transcript has no assistant turn.
    pub fn condense(
        &self,
        entries: &[ConvertedEntry],
        metadata: &ConversationMetadata,
        anonymizer: Option<&mut dyn Anonymizer>,
    ) -> Option<AlpacaRecord> {
        let assistant_label = metadata
            .character_name
            .as_deref()
            .unwrap_or(DEFAULT_ASSISTANT_LABEL);

        let mut turns = Vec::with_capacity(entries.len());
        let mut last_response = None;
        for entry in entries.iter().filter(|e| !e.text.is_empty()) {
            match entry.role {
                Role::Human => turns.push(format!("{}: {}", HUMAN_LABEL, entry.text)),
                Role::Assistant => {
                    turns.push(format!("{}: {}", assistant_label, entry.text));
                    last_response = Some(entry.text.as_str());
                }
                Role::System => {}
            }
        }

        let output = last_response?.to_string();
        Some(AlpacaRecord {
            instruction: self.instruction(metadata, anonymizer),
            input: turns.join("\n\n"),
            output,
        })
    }
}

impl FormatConverter for AlpacaConverter {
    fn name(&self) -> &'static str {
        "alpaca"
    }

    fn layout(&self) -> OutputLayout {
        OutputLayout::JsonArray
    }

    fn serialize_entries(
        &self,
        entries: &[ConvertedEntry],
        metadata: &ConversationMetadata,
        anonymizer: Option<&mut dyn Anonymizer>,
    ) -> Result<String, ConvertError> {
        let records: Vec<AlpacaRecord> = self
            .condense(entries, metadata, anonymizer)
            .into_iter()
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role: Role, text: &str) -> ConvertedEntry {
        ConvertedEntry {
            role,
            text: text.to_string(),
            name: None,
        }
    }

    fn rex() -> ConversationMetadata {
        ConversationMetadata {
            character_name: Some("Rex".to_string()),
            user_name: None,
        }
    }

    #[test]
    fn test_condenses_transcript() {
        let converter = AlpacaConverter::default();
        let entries = vec![entry(Role::Human, "Hi"), entry(Role::Assistant, "Hello there")];
        let out = converter.serialize_entries(&entries, &rex(), None).unwrap();
        let records: Vec<AlpacaRecord> = serde_json::from_str(&out).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].input, "Human: Hi\n\nRex: Hello there");
        assert_eq!(records[0].output, "Hello there");
        assert_eq!(
            records[0].instruction,
            "You are Rex, a character in a roleplay scenario. Respond in character, maintaining the established tone and style."
        );
    }

    #[test]
    fn test_user_only_transcript_yields_no_record() {
        let converter = AlpacaConverter::default();
        let entries = vec![entry(Role::Human, "Hi"), entry(Role::Human, "Anyone?")];
        let out = converter.serialize_entries(&entries, &rex(), None).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_output_is_last_assistant_turn() {
        let converter = AlpacaConverter::default();
        let entries = vec![
            entry(Role::Assistant, "Greetings"),
            entry(Role::Human, "Hi"),
            entry(Role::Assistant, "Welcome"),
            entry(Role::Human, "Bye"),
        ];
        let record = converter
            .condense(&entries, &ConversationMetadata::default(), None)
            .unwrap();
        assert_eq!(
            record.input,
            "Assistant: Greetings\n\nHuman: Hi\n\nAssistant: Welcome\n\nHuman: Bye"
        );
        assert_eq!(record.output, "Welcome");
        assert_eq!(record.instruction, DEFAULT_ASSISTANT_INSTRUCTION);
    }

    #[test]
    fn test_configured_instruction() {
        let converter = AlpacaConverter::new(Some("Act as {characterName} for {userName}.".to_string()));
        let entries = vec![entry(Role::Assistant, "Hi")];
        let record = converter
            .condense(&entries, &ConversationMetadata::default(), None)
            .unwrap();
        assert_eq!(record.instruction, "Act as an AI assistant for User.");
    }
}
