use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectKeyError {
    #[error("subject name cannot be empty")]
    Empty,
}

/// Identifier of a subject inside a question bank (e.g. `world_history`).
///
/// Keys arrive already normalized from whoever authored the bank; the quiz
/// session compares them verbatim.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKey(String);

impl SubjectKey {
    /// Wraps a key exactly as given.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives a key from a human-entered subject name.
    ///
    /// Trims, lowercases and collapses every whitespace run into `_`.
    ///
    /// # Errors
    ///
    /// Returns `SubjectKeyError::Empty` if the name is blank.
    pub fn from_display_name(name: &str) -> Result<Self, SubjectKeyError> {
        let words: Vec<String> = name.split_whitespace().map(str::to_lowercase).collect();
        if words.is_empty() {
            return Err(SubjectKeyError::Empty);
        }
        Ok(Self(words.join("_")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-facing label: underscores become spaces and the first letter is
    /// upper-cased (`world_history` → `World history`).
    #[must_use]
    pub fn display_name(&self) -> String {
        let spaced = self.0.replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Debug for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectKey({})", self.0)
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_normalizes_case_and_whitespace() {
        let key = SubjectKey::from_display_name("  World   History\t").unwrap();
        assert_eq!(key.as_str(), "world_history");
    }

    #[test]
    fn blank_display_name_is_rejected() {
        assert_eq!(
            SubjectKey::from_display_name("   "),
            Err(SubjectKeyError::Empty)
        );
    }

    #[test]
    fn new_keeps_key_verbatim() {
        let key = SubjectKey::new("Math Basics");
        assert_eq!(key.as_str(), "Math Basics");
    }

    #[test]
    fn display_name_capitalizes_and_spaces() {
        assert_eq!(SubjectKey::new("world_history").display_name(), "World history");
        assert_eq!(SubjectKey::new("").display_name(), "");
    }
}
