//! Output formats and the converter contract they share.

mod alpaca;
mod sharegpt;

pub use alpaca::{AlpacaConverter, AlpacaRecord};
pub use sharegpt::{ShareGptConverter, ShareGptMessage, ShareGptRecord};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::TemplateConfig;
use crate::error::ConvertError;
use crate::record::{ConversationMetadata, RawMessage};
use crate::Anonymizer;

pub const REASONING_OPEN: &str = "<think>";
pub const REASONING_CLOSE: &str = "</think>";

/// Who produced a converted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "human")]
    Human,
    #[serde(rename = "gpt")]
    Assistant,
    #[serde(rename = "system")]
    System,
}

/// A normalized message produced by [`FormatConverter::convert_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedEntry {
    pub role: Role,
    pub text: String,
    /// Speaker display name, anonymized like the text.
    pub name: Option<String>,
}

/// How a format lays out its artifact on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// One JSON record per line.
    JsonLines,
    /// A single JSON array of records.
    JsonArray,
}

/// Per-format conversion of one transcript.
///
/// The pipeline calls these in order: `extract_metadata` over the whole
/// transcript, `is_valid_entry` to filter, `convert_entry` per kept entry,
/// then `serialize_entries` once.
pub trait FormatConverter: Send + Sync {
    fn name(&self) -> &'static str;

    fn layout(&self) -> OutputLayout;

    /// File extension (without the dot) for this format's artifacts.
    fn extension(&self) -> &'static str {
        match self.layout() {
            OutputLayout::JsonLines => "jsonl",
            OutputLayout::JsonArray => "json",
        }
    }

    fn extract_metadata(&self, entries: &[RawMessage]) -> ConversationMetadata {
        ConversationMetadata::extract(entries)
    }

    fn is_valid_entry(&self, entry: &RawMessage) -> bool {
        entry.text().is_some()
    }

    fn convert_entry(
        &self,
        entry: &RawMessage,
        include_reasoning: bool,
        anonymizer: Option<&dyn Anonymizer>,
        _metadata: &ConversationMetadata,
    ) -> ConvertedEntry {
        convert_message(entry, include_reasoning, anonymizer)
    }

    fn serialize_entries(
        &self,
        entries: &[ConvertedEntry],
        metadata: &ConversationMetadata,
        anonymizer: Option<&mut dyn Anonymizer>,
    ) -> Result<String, ConvertError>;
}

/// Shared message transformation: optional reasoning prefix, anonymization, role.
pub fn convert_message(
    entry: &RawMessage,
    include_reasoning: bool,
    anonymizer: Option<&dyn Anonymizer>,
) -> ConvertedEntry {
    let anonymize = |text: &str| match anonymizer {
        Some(anonymizer) => anonymizer.replace(text),
        None => text.to_string(),
    };

    let message = entry.mes.as_deref().unwrap_or_default();
    let mut text = match entry.reasoning().filter(|_| include_reasoning) {
        Some(reasoning) => format!(
            "{}{}{} {}",
            REASONING_OPEN,
            anonymize(reasoning),
            REASONING_CLOSE,
            message
        ),
        None => message.to_string(),
    };
    text = anonymize(&text);

    ConvertedEntry {
        role: if entry.is_user {
            Role::Human
        } else {
            Role::Assistant
        },
        text,
        name: entry.name.as_deref().map(|name| anonymize(name)),
    }
}

/// The closed set of supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    ShareGpt,
    Alpaca,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::ShareGpt, OutputFormat::Alpaca];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::ShareGpt => "sharegpt",
            OutputFormat::Alpaca => "alpaca",
        }
    }

    /// Build the converter for this format with the configured templates.
    pub fn converter(self, templates: &TemplateConfig) -> Box<dyn FormatConverter> {
        match self {
            OutputFormat::ShareGpt => Box::new(ShareGptConverter::new(
                templates.sharegpt_system_message.clone(),
            )),
            OutputFormat::Alpaca => {
                Box::new(AlpacaConverter::new(templates.alpaca_instruction.clone()))
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sharegpt" | "conversational" => Ok(OutputFormat::ShareGpt),
            "alpaca" | "condensed" => Ok(OutputFormat::Alpaca),
            _ => Err(ConvertError::UnsupportedFormat {
                requested: s.to_string(),
                supported: supported_formats().join(", "),
            }),
        }
    }
}

/// Canonical names of every supported format.
pub fn supported_formats() -> Vec<&'static str> {
    OutputFormat::ALL.iter().map(|f| f.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SamToJordan;

    impl Anonymizer for SamToJordan {
        fn replace(&self, text: &str) -> String {
            text.replace("Sam", "Jordan")
        }

        fn random_user_name(&mut self) -> String {
            "Jordan".to_string()
        }
    }

    fn message(mes: &str, is_user: bool, reasoning: Option<&str>) -> RawMessage {
        RawMessage {
            mes: Some(mes.to_string()),
            is_user,
            name: Some("Sam".to_string()),
            extra: reasoning.map(|r| crate::record::MessageExtra {
                reasoning: Some(r.to_string()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_reasoning_included() {
        let entry = message("Hello Sam", false, Some("Sam seems nice"));
        let converted = convert_message(&entry, true, None);
        assert_eq!(converted.text, "<think>Sam seems nice</think> Hello Sam");
        assert_eq!(converted.role, Role::Assistant);
    }

    #[test]
    fn test_reasoning_excluded() {
        let entry = message("Hello", false, Some("thinking"));
        assert_eq!(convert_message(&entry, false, None).text, "Hello");

        let blank = message("Hello", false, Some("   "));
        assert_eq!(convert_message(&blank, true, None).text, "Hello");
    }

    #[test]
    fn test_anonymizes_text_reasoning_and_name() {
        let entry = message("Hi Sam", true, Some("Sam asked"));
        let converted = convert_message(&entry, true, Some(&SamToJordan));
        assert_eq!(converted.text, "<think>Jordan asked</think> Hi Jordan");
        assert_eq!(converted.name.as_deref(), Some("Jordan"));
        assert_eq!(converted.role, Role::Human);
    }

    #[test]
    fn test_format_lookup() {
        assert_eq!("ShareGPT".parse::<OutputFormat>().unwrap(), OutputFormat::ShareGpt);
        assert_eq!("condensed".parse::<OutputFormat>().unwrap(), OutputFormat::Alpaca);

        let err = "csv".parse::<OutputFormat>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported format: csv. Supported formats: sharegpt, alpaca"
        );
    }

    #[test]
    fn test_converter_identity() {
        let templates = TemplateConfig::default();
        let sharegpt = OutputFormat::ShareGpt.converter(&templates);
        assert_eq!(sharegpt.name(), "sharegpt");
        assert_eq!(sharegpt.extension(), "jsonl");
        let alpaca = OutputFormat::Alpaca.converter(&templates);
        assert_eq!(alpaca.layout(), OutputLayout::JsonArray);
        assert_eq!(alpaca.extension(), "json");
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"gpt\"");
        assert_eq!(serde_json::to_string(&Role::Human).unwrap(), "\"human\"");
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    }
}
