//! Gender values and their compact storage codes.

use serde::{Deserialize, Serialize};

/// Inferred gender of a character.
///
/// The full word form is used everywhere in memory and in the character map
/// handed to callers. The single-letter code form exists only at the
/// persistence boundary (see [`Gender::code`] and [`Gender::from_code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Gender {
    /// Get the display name for this gender.
    pub fn name(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }

    /// Pronoun set used in character summaries.
    pub fn pronouns(&self) -> &'static str {
        match self {
            Gender::Male => "he/him",
            Gender::Female => "she/her",
            Gender::Unknown => "they/them",
        }
    }

    /// Single-letter storage code.
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "m",
            Gender::Female => "f",
            Gender::Unknown => "u",
        }
    }

    /// Parse either a storage code or a full word. Anything unrecognized is
    /// `Unknown`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Gender::Male,
            "f" | "female" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    /// Whether this is a determined gender.
    pub fn is_known(&self) -> bool {
        !matches!(self, Gender::Unknown)
    }

    /// The other binary gender, used by possessive inference.
    pub fn opposite(&self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
            Gender::Unknown => Gender::Unknown,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Compress a gender word into its storage code.
pub fn compress(word: &str) -> &'static str {
    Gender::from_code(word).code()
}

/// Expand a storage code back into a gender word.
pub fn expand(code: &str) -> &'static str {
    Gender::from_code(code).name()
}

/// Gender signalled by a third-person singular pronoun, if any.
pub fn pronoun_gender(word: &str) -> Gender {
    match word.to_ascii_lowercase().as_str() {
        "he" | "him" | "his" => Gender::Male,
        "she" | "her" | "hers" => Gender::Female,
        _ => Gender::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for (input, expected) in [
            ("male", "male"),
            ("female", "female"),
            ("unknown", "unknown"),
            ("xyzzy", "unknown"),
            ("", "unknown"),
        ] {
            assert_eq!(expand(compress(input)), expected, "round trip of {input:?}");
        }
    }

    #[test]
    fn test_from_code_accepts_both_forms() {
        assert_eq!(Gender::from_code("m"), Gender::Male);
        assert_eq!(Gender::from_code("Female"), Gender::Female);
        assert_eq!(Gender::from_code(" u "), Gender::Unknown);
    }

    #[test]
    fn test_serde_uses_full_words() {
        let json = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(json, "\"female\"");
        let parsed: Gender = serde_json::from_str("\"nonbinary\"").unwrap();
        assert_eq!(parsed, Gender::Unknown);
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Gender::Male.opposite(), Gender::Female);
        assert_eq!(Gender::Female.opposite(), Gender::Male);
        assert_eq!(Gender::Unknown.opposite(), Gender::Unknown);
    }

    #[test]
    fn test_pronoun_gender() {
        assert_eq!(pronoun_gender("His"), Gender::Male);
        assert_eq!(pronoun_gender("hers"), Gender::Female);
        assert_eq!(pronoun_gender("they"), Gender::Unknown);
    }
}
