//! `{characterName}` / `{userName}` expansion for system and instruction templates.

use crate::Anonymizer;

pub const CHARACTER_PLACEHOLDER: &str = "{characterName}";
pub const USER_PLACEHOLDER: &str = "{userName}";

/// Used for `{userName}` when neither metadata nor an anonymizer supplies one.
pub const FALLBACK_USER_NAME: &str = "User";

/// Expand the name placeholders in `template`.
///
/// `{characterName}` becomes `character_name`, or `character_fallback` when
/// unknown. `{userName}` resolves to the metadata user name (anonymized when
/// an anonymizer is active), then a name from the anonymizer, then
/// [`FALLBACK_USER_NAME`]. The anonymizer is only consulted when the template
/// actually contains `{userName}`.
pub fn expand_placeholders(
    template: &str,
    character_name: Option<&str>,
    user_name: Option<&str>,
    anonymizer: Option<&mut dyn Anonymizer>,
    character_fallback: &str,
) -> String {
    let has_character = template.contains(CHARACTER_PLACEHOLDER);
    let has_user = template.contains(USER_PLACEHOLDER);
    let mut expanded = template.to_string();

    if has_character {
        expanded = expanded.replace(
            CHARACTER_PLACEHOLDER,
            character_name.unwrap_or(character_fallback),
        );
    }

    if has_user {
        let resolved = match (user_name, anonymizer) {
            (Some(name), Some(anonymizer)) => anonymizer.replace(name),
            (Some(name), None) => name.to_string(),
            (None, Some(anonymizer)) => anonymizer.random_user_name(),
            (None, None) => FALLBACK_USER_NAME.to_string(),
        };
        expanded = expanded.replace(USER_PLACEHOLDER, &resolved);
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAnonymizer {
        calls: usize,
    }

    impl Anonymizer for FixedAnonymizer {
        fn replace(&self, text: &str) -> String {
            text.replace("Sam", "Jordan")
        }

        fn random_user_name(&mut self) -> String {
            self.calls += 1;
            "Casey".to_string()
        }
    }

    #[test]
    fn test_user_fallback() {
        assert_eq!(expand_placeholders("Hi {userName}", None, None, None, "a"), "Hi User");
    }

    #[test]
    fn test_character_fallback() {
        assert_eq!(
            expand_placeholders("You are {characterName}.", None, None, None, "an AI assistant"),
            "You are an AI assistant."
        );
        assert_eq!(
            expand_placeholders("You are {characterName}.", Some("Rex"), None, None, "a"),
            "You are Rex."
        );
    }

    #[test]
    fn test_every_occurrence_replaced_identically() {
        let mut anonymizer = FixedAnonymizer { calls: 0 };
        let out = expand_placeholders(
            "{userName} and {userName} meet {characterName}, {characterName}",
            Some("Rex"),
            None,
            Some(&mut anonymizer),
            "a",
        );
        assert_eq!(out, "Casey and Casey meet Rex, Rex");
        assert_eq!(anonymizer.calls, 1);
    }

    #[test]
    fn test_metadata_user_name_wins() {
        assert_eq!(
            expand_placeholders("Hi {userName}", None, Some("Sam"), None, "a"),
            "Hi Sam"
        );

        let mut anonymizer = FixedAnonymizer { calls: 0 };
        assert_eq!(
            expand_placeholders("Hi {userName}", None, Some("Sam"), Some(&mut anonymizer), "a"),
            "Hi Jordan"
        );
        assert_eq!(anonymizer.calls, 0);
    }

    #[test]
    fn test_anonymizer_untouched_without_placeholder() {
        let mut anonymizer = FixedAnonymizer { calls: 0 };
        let out = expand_placeholders("No names here", None, None, Some(&mut anonymizer), "a");
        assert_eq!(out, "No names here");
        assert_eq!(anonymizer.calls, 0);
    }
}
