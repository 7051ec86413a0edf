//! Core conversion logic for chat transcripts.
//!
//! This crate turns SillyTavern-style `.jsonl` chat logs (one message record
//! per line) into fine-tuning datasets, either as ShareGPT conversations or as
//! condensed Alpaca instruction records, optionally anonymizing the user's
//! name along the way.

/// Trait for name anonymization used while converting a transcript.
///
/// Converters only see this capability; they never construct an anonymizer
/// themselves. [`NameAnonymizer`] is the implementation used by the pipeline.
pub trait Anonymizer {
    /// Replace every known name in `text`.
    fn replace(&self, text: &str) -> String;

    /// A replacement name suitable for `{userName}` in templates.
    fn random_user_name(&mut self) -> String;
}

mod anonymize;
mod config;
mod error;
pub mod format;
mod helpers;
mod names;
pub mod pipeline;
mod record;
mod template;

pub use anonymize::{Gender, NameAnonymizer};
pub use config::TemplateConfig;
pub use error::ConvertError;
pub use format::{
    supported_formats, AlpacaConverter, AlpacaRecord, ConvertedEntry, FormatConverter,
    OutputFormat, OutputLayout, Role, ShareGptConverter, ShareGptMessage, ShareGptRecord,
};
pub use pipeline::{
    combine_outputs, convert_directory, convert_file, convert_source, convert_transcript,
    discover_transcript_files, parse_transcript, BatchSummary, ConversionOptions,
    ConvertedTranscript, FileFailure, FileReport,
};
pub use record::{ChatMetadata, ConversationMetadata, MessageExtra, RawMessage, SwipeInfo};
pub use template::{expand_placeholders, FALLBACK_USER_NAME};
