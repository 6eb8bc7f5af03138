//! Relationship words and the gender they imply.

use crate::gender::Gender;
use std::collections::HashMap;

/// How a relationship word constrains gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationRule {
    /// The character holding this role has a fixed gender, whoever the
    /// partner is (`father`, `sister`).
    Absolute(Gender),
    /// The implied gender depends on the partner's gender. Applies to
    /// either side of the relationship (`husband`, `kissed`).
    ConditionalOnPartner(&'static [(Gender, Gender)]),
}

/// Partner gender → implied gender for pairings that assume opposite sexes.
const OPPOSITE: &[(Gender, Gender)] = &[(Gender::Male, Gender::Female), (Gender::Female, Gender::Male)];

/// Which rule group a word belongs to, which sets its weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationGroup {
    /// loved, kissed, embraced, married, dating.
    Romantic,
    /// brother, sister, son, daughter, father, mother, husband, wife.
    Family,
}

impl RelationGroup {
    /// Score weight added when a rule of this group fires.
    pub fn weight(&self) -> f64 {
        match self {
            RelationGroup::Romantic => 3.0,
            RelationGroup::Family => 4.0,
        }
    }
}

lazy_static::lazy_static! {
    static ref RULES: HashMap<&'static str, (RelationGroup, RelationRule)> = {
        use RelationGroup::{Family, Romantic};
        use RelationRule::{Absolute, ConditionalOnPartner};

        HashMap::from([
            ("father", (Family, Absolute(Gender::Male))),
            ("mother", (Family, Absolute(Gender::Female))),
            ("brother", (Family, Absolute(Gender::Male))),
            ("sister", (Family, Absolute(Gender::Female))),
            ("son", (Family, Absolute(Gender::Male))),
            ("daughter", (Family, Absolute(Gender::Female))),
            ("husband", (Family, ConditionalOnPartner(OPPOSITE))),
            ("wife", (Family, ConditionalOnPartner(OPPOSITE))),
            ("loved", (Romantic, ConditionalOnPartner(OPPOSITE))),
            ("kissed", (Romantic, ConditionalOnPartner(OPPOSITE))),
            ("embraced", (Romantic, ConditionalOnPartner(OPPOSITE))),
            ("married", (Romantic, ConditionalOnPartner(OPPOSITE))),
            ("dating", (Romantic, ConditionalOnPartner(OPPOSITE))),
        ])
    };
}

/// Look up the rule and group for a relationship word (case-insensitive).
pub fn lookup(word: &str) -> Option<(RelationGroup, RelationRule)> {
    RULES.get(word.to_lowercase().as_str()).copied()
}

/// Gender implied for the target of a relationship.
///
/// `target_holds_role` is true when the word describes the target itself
/// (`Mary's brother John` with target John) and false when the target is
/// the other side (`John's wife Mary` with target John). Unrecognized words
/// and unknown partners yield `Unknown`.
pub fn infer(word: &str, target_holds_role: bool, partner: Gender) -> Gender {
    match lookup(word) {
        Some((_, RelationRule::Absolute(gender))) if target_holds_role => gender,
        Some((_, RelationRule::Absolute(_))) => Gender::Unknown,
        Some((_, RelationRule::ConditionalOnPartner(map))) => map
            .iter()
            .find(|(p, _)| *p == partner)
            .map(|&(_, implied)| implied)
            .unwrap_or(Gender::Unknown),
        None => Gender::Unknown,
    }
}
