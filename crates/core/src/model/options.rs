use serde::de::{Deserializer, Error as DeError};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── OPTION LETTER ─────────────────────────────────────────────────────────────
//

/// One of the five multiple-choice option slots, 'a' through 'e'.
///
/// Parsing is case-insensitive; the canonical form is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
    E,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid option letter: {raw:?} (expected 'a'..'e')")]
pub struct ParseLetterError {
    pub raw: String,
}

impl OptionLetter {
    /// Canonical lowercase form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLetter::A => "a",
            OptionLetter::B => "b",
            OptionLetter::C => "c",
            OptionLetter::D => "d",
            OptionLetter::E => "e",
        }
    }

    /// Uppercase form, used when echoing the correct option back to callers.
    #[must_use]
    pub fn as_uppercase(&self) -> &'static str {
        match self {
            OptionLetter::A => "A",
            OptionLetter::B => "B",
            OptionLetter::C => "C",
            OptionLetter::D => "D",
            OptionLetter::E => "E",
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLetter {
    type Err = ParseLetterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(OptionLetter::A),
            "b" => Ok(OptionLetter::B),
            "c" => Ok(OptionLetter::C),
            "d" => Ok(OptionLetter::D),
            "e" => Ok(OptionLetter::E),
            _ => Err(ParseLetterError { raw: s.to_string() }),
        }
    }
}

//
// ─── OPTION SET ────────────────────────────────────────────────────────────────
//

/// Ordered letter → text mapping for a question's alternatives.
///
/// Invariants: 2 to 5 entries, unique letters, non-blank texts. Entries are
/// normalized to letter order on construction, so iteration is always
/// 'a' before 'b' and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    entries: Vec<(OptionLetter, String)>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OptionSetError {
    #[error("too few options: {0} (minimum 2)")]
    TooFew(usize),

    #[error("too many options: {0} (maximum 5)")]
    TooMany(usize),

    #[error("duplicate option letter: {0}")]
    DuplicateLetter(OptionLetter),

    #[error("option {0} has blank text")]
    BlankText(OptionLetter),
}

impl OptionSet {
    /// Builds a validated option set from letter/text pairs.
    ///
    /// # Errors
    ///
    /// Returns `OptionSetError` when the entry count is out of range, a
    /// letter repeats, or a text is blank.
    pub fn new(
        entries: impl IntoIterator<Item = (OptionLetter, String)>,
    ) -> Result<Self, OptionSetError> {
        let mut entries: Vec<(OptionLetter, String)> = entries.into_iter().collect();

        if entries.len() < 2 {
            return Err(OptionSetError::TooFew(entries.len()));
        }
        if entries.len() > 5 {
            return Err(OptionSetError::TooMany(entries.len()));
        }

        entries.sort_by_key(|(letter, _)| *letter);
        for window in entries.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(OptionSetError::DuplicateLetter(window[0].0));
            }
        }
        for (letter, text) in &entries {
            if text.trim().is_empty() {
                return Err(OptionSetError::BlankText(*letter));
            }
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, letter: OptionLetter) -> bool {
        self.entries.iter().any(|(l, _)| *l == letter)
    }

    /// Text for a letter, if the question offers it.
    #[must_use]
    pub fn text_for(&self, letter: OptionLetter) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| *l == letter)
            .map(|(_, text)| text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionLetter, &str)> {
        self.entries.iter().map(|(l, text)| (*l, text.as_str()))
    }
}

// Serialized as a JSON object ("a": "...", "b": "..."), the on-disk shape
// of the options column.
impl Serialize for OptionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (letter, text) in &self.entries {
            map.serialize_entry(letter.as_str(), text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OptionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut entries = Vec::with_capacity(raw.len());
        for (key, text) in raw {
            let letter = key.parse::<OptionLetter>().map_err(DeError::custom)?;
            entries.push((letter, text));
        }
        OptionSet::new(entries).map_err(DeError::custom)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(letter: OptionLetter, text: &str) -> (OptionLetter, String) {
        (letter, text.to_string())
    }

    #[test]
    fn letter_parses_case_insensitively() {
        assert_eq!("a".parse::<OptionLetter>().unwrap(), OptionLetter::A);
        assert_eq!("C".parse::<OptionLetter>().unwrap(), OptionLetter::C);
        assert_eq!(" e ".parse::<OptionLetter>().unwrap(), OptionLetter::E);
        assert!("f".parse::<OptionLetter>().is_err());
        assert!("ab".parse::<OptionLetter>().is_err());
    }

    #[test]
    fn set_requires_two_to_five_entries() {
        let err = OptionSet::new([pair(OptionLetter::A, "only one")]).unwrap_err();
        assert!(matches!(err, OptionSetError::TooFew(1)));

        let ok = OptionSet::new([
            pair(OptionLetter::A, "first"),
            pair(OptionLetter::B, "second"),
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn set_rejects_duplicates_and_blank_texts() {
        let err = OptionSet::new([
            pair(OptionLetter::A, "x"),
            pair(OptionLetter::A, "y"),
        ])
        .unwrap_err();
        assert!(matches!(err, OptionSetError::DuplicateLetter(OptionLetter::A)));

        let err = OptionSet::new([
            pair(OptionLetter::A, "x"),
            pair(OptionLetter::B, "   "),
        ])
        .unwrap_err();
        assert!(matches!(err, OptionSetError::BlankText(OptionLetter::B)));
    }

    #[test]
    fn set_normalizes_to_letter_order() {
        let set = OptionSet::new([
            pair(OptionLetter::C, "third"),
            pair(OptionLetter::A, "first"),
            pair(OptionLetter::B, "second"),
        ])
        .unwrap();

        let letters: Vec<_> = set.iter().map(|(l, _)| l).collect();
        assert_eq!(letters, vec![OptionLetter::A, OptionLetter::B, OptionLetter::C]);
        assert_eq!(set.text_for(OptionLetter::C), Some("third"));
        assert!(!set.contains(OptionLetter::E));
    }

    #[test]
    fn set_serde_roundtrips_as_object() {
        let set = OptionSet::new([
            pair(OptionLetter::A, "um"),
            pair(OptionLetter::B, "dois"),
        ])
        .unwrap();

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"a":"um","b":"dois"}"#);

        let back: OptionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn set_deserialize_rejects_invalid_keys() {
        let result = serde_json::from_str::<OptionSet>(r#"{"a":"um","z":"dois"}"#);
        assert!(result.is_err());
    }
}
