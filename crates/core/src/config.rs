//! Optional template configuration.
//!
//! ```json
//! {
//!   "sharegptSystemMessage": "You are {characterName}, talking with {userName}.",
//!   "alpacaInstruction": "Reply as {characterName}."
//! }
//! ```
//!
//! A missing or malformed file is never fatal; the built-in templates apply.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    /// System message prepended to ShareGPT conversations.
    #[serde(default)]
    pub sharegpt_system_message: Option<String>,
    /// Instruction field of Alpaca records.
    #[serde(default)]
    pub alpaca_instruction: Option<String>,
}

impl TemplateConfig {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load configuration from `path`, falling back to defaults on any problem.
    pub fn load_or_default(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config file found, using default templates");
                return Self::default();
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read config file, using default templates");
                return Self::default();
            }
        };

        match Self::parse(&text) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded template config");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Malformed config file, using default templates");
                Self::default()
            }
        }
    }
}
