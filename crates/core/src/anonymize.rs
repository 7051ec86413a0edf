//! Participant-name anonymization.
//!
//! A `NameAnonymizer` is built per transcript: it collects the user's names
//! from the raw records, assigns each one a generated first name, and rewrites
//! text so every whole-word occurrence of an original name becomes its
//! replacement with the same case pattern.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::{Captures, Regex};

use crate::error::ConvertError;
use crate::helpers::{apply_case_pattern, whole_word_matcher};
use crate::names::{FEMALE_FIRST_NAMES, MALE_FIRST_NAMES};
use crate::record::RawMessage;
use crate::Anonymizer;

/// Name pool preference for generated names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    fn pool(self) -> &'static [&'static str] {
        match self {
            Gender::Male => MALE_FIRST_NAMES,
            Gender::Female => FEMALE_FIRST_NAMES,
        }
    }
}

impl FromStr for Gender {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            _ => Err(ConvertError::InvalidGender(s.to_string())),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

#[derive(Debug, Clone)]
struct NameMapping {
    original: String,
    replacement: String,
    matcher: Regex,
}

/// Consistent, case-preserving name substitution for one transcript.
#[derive(Debug)]
pub struct NameAnonymizer {
    gender: Option<Gender>,
    rng: StdRng,
    detected: Vec<String>,
    mappings: Vec<NameMapping>,
}

impl NameAnonymizer {
    /// Create an anonymizer seeded from OS entropy.
    pub fn new(gender: Option<Gender>) -> Self {
        Self::from_rng(gender, StdRng::from_entropy())
    }

    /// Create an anonymizer with a fixed seed, for reproducible output.
    pub fn with_seed(gender: Option<Gender>, seed: u64) -> Self {
        Self::from_rng(gender, StdRng::seed_from_u64(seed))
    }

    fn from_rng(gender: Option<Gender>, rng: StdRng) -> Self {
        Self {
            gender,
            rng,
            detected: Vec::new(),
            mappings: Vec::new(),
        }
    }

    /// Collect user names from the transcript and assign replacements.
    ///
    /// Candidates come from `user_name`, `chat_metadata.user_name` and the
    /// `name` of user messages. Names already mapped keep their replacement.
    pub fn initialize(&mut self, entries: &[RawMessage]) {
        for entry in entries {
            let metadata_name = entry
                .chat_metadata
                .as_ref()
                .and_then(|m| m.user_name.as_deref());
            let speaker_name = if entry.is_user {
                entry.name.as_deref()
            } else {
                None
            };

            for candidate in [entry.user_name.as_deref(), metadata_name, speaker_name]
                .into_iter()
                .flatten()
            {
                let candidate = candidate.trim();
                if !candidate.is_empty() && !self.detected.iter().any(|n| n == candidate) {
                    self.detected.push(candidate.to_string());
                }
            }
        }

        for index in 0..self.detected.len() {
            if self.replacement_for(&self.detected[index]).is_some() {
                continue;
            }
            let original = self.detected[index].clone();
            let matcher = match whole_word_matcher(&original) {
                Ok(matcher) => matcher,
                Err(e) => {
                    tracing::debug!(name = %original, error = %e, "Skipping unmatchable name");
                    continue;
                }
            };
            let replacement = self.generate_name();
            self.mappings.push(NameMapping {
                original,
                replacement,
                matcher,
            });
        }

        let mapping: Vec<(&str, &str)> = self
            .mappings
            .iter()
            .map(|m| (m.original.as_str(), m.replacement.as_str()))
            .collect();
        tracing::debug!(detected = ?self.detected, ?mapping, "Replacement mapping");
    }

    /// Draw a first name from the configured pool, or from either pool at random.
    pub fn generate_name(&mut self) -> String {
        let gender = match self.gender {
            Some(gender) => gender,
            None if self.rng.gen_bool(0.5) => Gender::Male,
            None => Gender::Female,
        };
        gender
            .pool()
            .choose(&mut self.rng)
            .map(|name| name.to_string())
            .unwrap_or_default()
    }

    /// Rewrite every whole-word occurrence of a mapped name.
    pub fn replace(&self, text: &str) -> String {
        let mut result = text.to_string();
        for mapping in &self.mappings {
            result = mapping
                .matcher
                .replace_all(&result, |caps: &Captures| {
                    apply_case_pattern(&caps[0], &mapping.replacement)
                })
                .into_owned();
        }
        result
    }

    /// The first assigned replacement, or a fresh name that is not recorded.
    pub fn random_user_name(&mut self) -> String {
        match self.mappings.first() {
            Some(mapping) => mapping.replacement.clone(),
            None => self.generate_name(),
        }
    }

    /// The replacement assigned to `original`, if any.
    pub fn replacement_for(&self, original: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.original == original)
            .map(|m| m.replacement.as_str())
    }

    /// Names detected so far, in first-seen order.
    pub fn detected_names(&self) -> &[String] {
        &self.detected
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl Anonymizer for NameAnonymizer {
    fn replace(&self, text: &str) -> String {
        NameAnonymizer::replace(self, text)
    }

    fn random_user_name(&mut self) -> String {
        NameAnonymizer::random_user_name(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, mes: &str) -> RawMessage {
        RawMessage {
            mes: Some(mes.to_string()),
            is_user: true,
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn seeded_with(names: &[&str], seed: u64) -> NameAnonymizer {
        let entries: Vec<RawMessage> = names.iter().map(|n| user(n, "hi")).collect();
        let mut anonymizer = NameAnonymizer::with_seed(None, seed);
        anonymizer.initialize(&entries);
        anonymizer
    }

    #[test]
    fn test_detects_names_from_all_sources() {
        let entries = vec![
            RawMessage {
                user_name: Some(" Header ".to_string()),
                chat_metadata: Some(crate::record::ChatMetadata {
                    user_name: Some("Meta".to_string()),
                    character_name: Some("Rex".to_string()),
                }),
                ..Default::default()
            },
            user("Speaker", "hello"),
            RawMessage {
                mes: Some("hi".to_string()),
                is_user: false,
                name: Some("Rex".to_string()),
                ..Default::default()
            },
            user("Header", "again"),
            user("   ", "blank name"),
        ];
        let mut anonymizer = NameAnonymizer::with_seed(None, 7);
        anonymizer.initialize(&entries);

        assert_eq!(anonymizer.detected_names(), &["Header", "Meta", "Speaker"]);
        assert!(anonymizer.replacement_for("Rex").is_none());
        assert!(anonymizer.replacement_for("Header").is_some());
    }

    #[test]
    fn test_whole_word_only() {
        let anonymizer = seeded_with(&["Anna"], 1);
        let replacement = anonymizer.replacement_for("Anna").unwrap().to_string();

        let out = anonymizer.replace("Anna met Annabelle and anna.");
        assert!(out.contains("Annabelle"));
        assert!(out.starts_with(&replacement));
        assert!(out.ends_with(&format!("{}.", replacement.to_lowercase())));
        assert!(!out.contains("Anna "));
    }

    #[test]
    fn test_case_preservation() {
        let anonymizer = seeded_with(&["sam"], 3);
        let replacement = anonymizer.replacement_for("sam").unwrap().to_string();

        assert_eq!(anonymizer.replace("SAM"), replacement.to_uppercase());
        assert_eq!(
            anonymizer.replace("Sam"),
            crate::helpers::capitalize(&replacement)
        );
        assert_eq!(anonymizer.replace("sam"), replacement.to_lowercase());
    }

    #[test]
    fn test_consistent_within_transcript() {
        let anonymizer = seeded_with(&["Sam", "Sam"], 11);
        let out = anonymizer.replace("Sam said hi. Later Sam left.");
        let replacement = anonymizer.replacement_for("Sam").unwrap();
        assert_eq!(out.matches(replacement).count(), 2);
        assert_eq!(anonymizer.detected_names().len(), 1);
    }

    #[test]
    fn test_initialize_is_stable() {
        let entries = vec![user("Sam", "hi"), user("Kim", "yo")];
        let mut anonymizer = NameAnonymizer::with_seed(None, 5);
        anonymizer.initialize(&entries);
        let first = anonymizer.replacement_for("Sam").unwrap().to_string();
        anonymizer.initialize(&entries);
        assert_eq!(anonymizer.replacement_for("Sam"), Some(first.as_str()));
        assert_eq!(anonymizer.detected_names().len(), 2);

        let mut again = NameAnonymizer::with_seed(None, 5);
        again.initialize(&entries);
        assert_eq!(again.replacement_for("Sam"), Some(first.as_str()));
    }

    #[test]
    fn test_instances_differ() {
        let entries = vec![user("Sam", "hi")];
        let replacements: std::collections::HashSet<String> = (0..20u64)
            .map(|seed| {
                let mut anonymizer = NameAnonymizer::with_seed(None, seed);
                anonymizer.initialize(&entries);
                anonymizer.replacement_for("Sam").unwrap().to_string()
            })
            .collect();
        assert!(replacements.len() > 1);
    }

    #[test]
    fn test_gender_pool() {
        let mut anonymizer = NameAnonymizer::with_seed(Some(Gender::Female), 9);
        for _ in 0..50 {
            let name = anonymizer.generate_name();
            assert!(FEMALE_FIRST_NAMES.contains(&name.as_str()));
        }
        let mut anonymizer = NameAnonymizer::with_seed(Some(Gender::Male), 9);
        for _ in 0..50 {
            let name = anonymizer.generate_name();
            assert!(MALE_FIRST_NAMES.contains(&name.as_str()));
        }
    }

    #[test]
    fn test_regex_metacharacters_escaped() {
        let anonymizer = seeded_with(&["J.D"], 2);
        assert_eq!(anonymizer.replace("JxD"), "JxD");
        assert_ne!(anonymizer.replace("J.D"), "J.D");
    }

    #[test]
    fn test_random_user_name() {
        let mut anonymizer = seeded_with(&["Sam", "Kim"], 4);
        let first = anonymizer.replacement_for("Sam").unwrap().to_string();
        assert_eq!(anonymizer.random_user_name(), first);

        let mut empty = NameAnonymizer::with_seed(None, 4);
        empty.initialize(&[]);
        assert!(!empty.random_user_name().is_empty());
        assert!(empty.is_empty());
        assert_eq!(empty.replace("Sam is here"), "Sam is here");
    }

    #[test]
    fn test_gender_from_str() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert!("other".parse::<Gender>().is_err());
    }
}
