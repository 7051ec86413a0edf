//! Raw transcript records and the metadata derived from them.
//!
//! Chat logs are loosely structured: the first line of a SillyTavern export is
//! a header carrying `user_name`, `character_name` and `chat_metadata`, the
//! remaining lines are messages. Every field here is optional, and a field
//! present with the wrong JSON type is treated as absent rather than failing
//! the whole line.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One line of an input transcript.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMessage {
    /// Message text. Absent or blank makes the entry invalid.
    #[serde(default, deserialize_with = "lenient")]
    pub mes: Option<String>,
    /// Speaker role flag. Absent or non-boolean means "not the user".
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_user: bool,
    /// Speaker display name.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub character_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub chat_metadata: Option<ChatMetadata>,
    #[serde(default, deserialize_with = "lenient")]
    pub extra: Option<MessageExtra>,
    /// Index of the selected alternative reply in `swipe_info`.
    #[serde(default, deserialize_with = "lenient")]
    pub swipe_id: Option<usize>,
    #[serde(default, deserialize_with = "lenient")]
    pub swipe_info: Option<Vec<SwipeInfo>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub character_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageExtra {
    #[serde(default, deserialize_with = "lenient")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SwipeInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub extra: Option<MessageExtra>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(matches!(value, Value::Bool(true)))
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

impl RawMessage {
    /// Build a record from an already-decoded JSON value.
    ///
    /// Values that are not objects (arrays, numbers, ...) yield an empty record.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// The message text, if present and not blank.
    pub fn text(&self) -> Option<&str> {
        non_blank(self.mes.as_ref())
    }

    /// Reasoning annotation for this message, if any.
    ///
    /// Looks at the message's own `extra` block first, then at the `extra`
    /// block of the currently selected swipe.
    pub fn reasoning(&self) -> Option<&str> {
        let own = self
            .extra
            .as_ref()
            .and_then(|extra| non_blank(extra.reasoning.as_ref()));
        own.or_else(|| {
            let swipe = self.swipe_info.as_ref()?.get(self.swipe_id?)?;
            non_blank(swipe.extra.as_ref()?.reasoning.as_ref())
        })
    }

    fn display_name(&self) -> Option<&str> {
        non_blank(self.name.as_ref())
    }
}

/// Names resolved once per transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationMetadata {
    pub character_name: Option<String>,
    pub user_name: Option<String>,
}

impl ConversationMetadata {
    /// Resolve character and user names from an unfiltered transcript.
    ///
    /// For each role: `chat_metadata` wins, then a top-level header field,
    /// then the first message of that role carrying a non-blank `name`.
    pub fn extract(entries: &[RawMessage]) -> Self {
        let character_name = entries
            .iter()
            .find_map(|e| {
                e.chat_metadata
                    .as_ref()
                    .and_then(|m| non_blank(m.character_name.as_ref()))
            })
            .or_else(|| entries.iter().find_map(|e| non_blank(e.character_name.as_ref())))
            .or_else(|| {
                entries
                    .iter()
                    .filter(|e| !e.is_user)
                    .find_map(RawMessage::display_name)
            });

        let user_name = entries
            .iter()
            .find_map(|e| {
                e.chat_metadata
                    .as_ref()
                    .and_then(|m| non_blank(m.user_name.as_ref()))
            })
            .or_else(|| entries.iter().find_map(|e| non_blank(e.user_name.as_ref())))
            .or_else(|| {
                entries
                    .iter()
                    .filter(|e| e.is_user)
                    .find_map(RawMessage::display_name)
            });

        Self {
            character_name: character_name.map(str::to_string),
            user_name: user_name.map(str::to_string),
        }
    }
}
