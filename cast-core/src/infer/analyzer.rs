//! Evidence gathering for one character's gender.
//!
//! Four independent passes each add weighted male/female points:
//!
//! | pass         | signal                                   | weight          |
//! |--------------|------------------------------------------|-----------------|
//! | sentence     | pronouns referring to the target         | 2 per pronoun   |
//! | possessive   | `Tom's wife`, `Ann's boyfriend`          | 3 per sentence  |
//! | dialogue     | pronouns around a speech attribution     | 6 alone, 3 shared |
//! | relationship | `Ann kissed Tom`, `Tom's sister Ann`     | 3 romantic, 4 family |
//!
//! Scores are only added, never subtracted. Turning them into a gender
//! happens in [`super::GenderDecision`].

use super::cache::AnalysisCache;
use super::relationship::{self, RelationGroup};
use super::resolver::{resolve, Mention};
use crate::character::{CharacterMap, CharacterRecord};
use crate::config::EngineConfig;
use crate::extract::{name_pattern, speaker_pattern, SPEECH_VERBS};
use crate::gender::{pronoun_gender, Gender};
use crate::text::{contains_word, mask_quotes, sentence_end, sentence_spans, truncate_chars, word_offsets};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::{Add, AddAssign, Range};

const PRONOUN_WEIGHT: f64 = 2.0;
const POSSESSIVE_WEIGHT: f64 = 3.0;
const ISOLATED_ATTRIBUTION_BOOST: f64 = 3.0;
const SHARED_ATTRIBUTION_BOOST: f64 = 1.5;

const ROMANTIC_VERBS: &str = "loved|kissed|embraced|married|dating";
const FAMILY_NOUNS: &str = "brother|sister|son|daughter|father|mother|husband|wife";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

lazy_static::lazy_static! {
    static ref PRONOUN: Regex = compile(r"(?i)\b(?:he|him|his|she|her|hers)\b");

    /// What follows a name in `Tom's wife`.
    static ref POSSESSIVE_TAIL: Regex = compile(r"^['’]s[ \t]+([a-z]+)\b");

    /// `"…," Mary said` or `"…," said Mary`.
    static ref QUOTE_THEN_ATTRIBUTION: Regex = compile(&format!(
        r#"["“][^"“”\n]{{1,500}}["”][ \t]*,?[ \t]*(?:([A-Z][^.!?"“”\n]{{0,40}}?)[ \t]+(?:{SPEECH_VERBS})|(?:{SPEECH_VERBS})[ \t]+({name}))\b"#,
        name = speaker_pattern()
    ));

    /// `Mary said, "…"`.
    static ref ATTRIBUTION_THEN_QUOTE: Regex = compile(&format!(
        r#"([A-Z][^.!?"“”\n]{{0,40}}?)[ \t]+(?:{SPEECH_VERBS})[ \t]*[,:]?[ \t]*["“]"#
    ));

    /// `Ann kissed Tom`, `Ann was dating Tom`.
    static ref ROMANTIC_ACTIVE: Regex = compile(&format!(
        r"\b({name})[ \t]+(?:(?:is|was)[ \t]+)?({ROMANTIC_VERBS})[ \t]+({name})\b",
        name = name_pattern()
    ));

    /// `Ann was kissed by Tom`, `Ann was married to Tom`.
    static ref ROMANTIC_PASSIVE: Regex = compile(&format!(
        r"\b({name})[ \t]+(?:was|is|were|got|had been)[ \t]+({ROMANTIC_VERBS})[ \t]+(?:by|to)[ \t]+({name})\b",
        name = name_pattern()
    ));

    /// `Tom's wife Ann`, `Tom's wife, Ann`.
    static ref FAMILY_POSSESSIVE: Regex = compile(&format!(
        r"\b({name})['’]s[ \t]+({FAMILY_NOUNS})[ \t]*,?[ \t]+({name})\b",
        name = name_pattern()
    ));

    /// `Ann, Tom's wife` or `Ann is Tom's wife`.
    static ref FAMILY_APPOSITIVE: Regex = compile(&format!(
        r"\b({name})(?:[ \t]*,[ \t]*|[ \t]+(?:is|was)[ \t]+)({name})['’]s[ \t]+({FAMILY_NOUNS})\b",
        name = name_pattern()
    ));
}

/// Accumulated male/female points plus a human-readable justification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvidenceScore {
    pub male_score: f64,
    pub female_score: f64,
    /// Distinct justifications joined by `"; "`.
    pub evidence: Option<String>,
}

impl EvidenceScore {
    /// Add `weight` points to one side. Unknown is ignored.
    pub fn add_points(&mut self, gender: Gender, weight: f64) {
        match gender {
            Gender::Male => self.male_score += weight,
            Gender::Female => self.female_score += weight,
            Gender::Unknown => {}
        }
    }

    /// Append a justification unless it is already present.
    pub fn note(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        match &mut self.evidence {
            Some(existing) if existing.split("; ").any(|part| part == text) => {}
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&text);
            }
            None => self.evidence = Some(text),
        }
    }

    /// Whether no points were scored.
    pub fn is_empty(&self) -> bool {
        self.male_score == 0.0 && self.female_score == 0.0
    }
}

impl AddAssign for EvidenceScore {
    fn add_assign(&mut self, other: Self) {
        self.male_score += other.male_score;
        self.female_score += other.female_score;
        if let Some(evidence) = other.evidence {
            for part in evidence.split("; ") {
                self.note(part);
            }
        }
    }
}

impl Add for EvidenceScore {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

/// Pronoun references to the target found in one span of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct References {
    male: u32,
    female: u32,
    /// Whether other known characters were present.
    shared: bool,
}

impl References {
    fn score(&self, weight: f64) -> EvidenceScore {
        let mut score = EvidenceScore::default();
        score.add_points(Gender::Male, f64::from(self.male) * weight);
        score.add_points(Gender::Female, f64::from(self.female) * weight);
        score
    }

    fn describe(&self, label: &str) -> Option<String> {
        (self.male + self.female > 0)
            .then(|| format!("{label}: {} male, {} female", self.male, self.female))
    }
}

impl AddAssign for References {
    fn add_assign(&mut self, other: Self) {
        self.male += other.male;
        self.female += other.female;
        self.shared |= other.shared;
    }
}

/// Collects gender evidence for characters in a text.
#[derive(Debug)]
pub struct GenderEvidenceAnalyzer {
    cache: AnalysisCache,
    max_text_length: usize,
    relationship_min_confidence: f64,
}

impl Default for GenderEvidenceAnalyzer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl GenderEvidenceAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            cache: AnalysisCache::new(config.strict_cache_keys),
            max_text_length: config.max_text_length,
            relationship_min_confidence: config.relationship_min_confidence,
        }
    }

    /// Score every signal for `target` in `text`.
    ///
    /// `known` supplies the other characters for pronoun disambiguation and
    /// relationship inference; it may contain `target` itself. An empty
    /// target or text yields a zero score.
    pub fn analyze(&mut self, target: &str, text: &str, known: &CharacterMap) -> EvidenceScore {
        let target = target.trim();
        if target.is_empty() || text.trim().is_empty() {
            return EvidenceScore::default();
        }
        let text = truncate_chars(text, self.max_text_length);

        let mut score = self.sentence_pass(target, text, known);
        score += self.dialogue_pass(target, text, known);
        score += self.relationship_pass(target, text, known);

        log::trace!(
            "Evidence for {target}: male {} female {}",
            score.male_score,
            score.female_score
        );
        score
    }

    /// Direct pronoun references plus possessive phrasing, sentence by sentence.
    pub fn sentence_pass(&mut self, target: &str, text: &str, known: &CharacterMap) -> EvidenceScore {
        let spans = self.cache.sentences_or_insert_with(target, text, || {
            sentence_spans(text)
                .into_iter()
                .filter(|span| contains_word(&text[span.clone()], target))
                .collect()
        });

        let mut references = References::default();
        let mut possessive = EvidenceScore::default();
        for span in spans {
            let Some(sentence) = text.get(span) else {
                continue;
            };
            references += count_references(target, &mask_quotes(sentence), known);
            possessive += possessive_in_sentence(target, sentence);
        }

        let mut score = references.score(PRONOUN_WEIGHT);
        if let Some(note) = references.describe("pronoun references") {
            score.note(note);
        }
        score + possessive
    }

    /// Pronouns near dialogue lines the target is credited with.
    pub fn dialogue_pass(&mut self, target: &str, text: &str, known: &CharacterMap) -> EvidenceScore {
        self.cache
            .dialogue_or_insert_with(target, text, || score_dialogue(target, text, known))
    }

    /// Romantic and family phrasing involving a confidently gendered partner.
    pub fn relationship_pass(&self, target: &str, text: &str, known: &CharacterMap) -> EvidenceScore {
        let mut score = EvidenceScore::default();

        for pattern in [&*ROMANTIC_ACTIVE, &*ROMANTIC_PASSIVE] {
            for caps in pattern.captures_iter(text) {
                let (Some(subject), Some(word), Some(object)) = (caps.get(1), caps.get(2), caps.get(3)) else {
                    continue;
                };
                // Romantic rules are symmetric, so the role does not matter.
                let pairing = if refers_to(subject.as_str(), target, NameSide::Before) {
                    Some((true, object.as_str()))
                } else if refers_to(object.as_str(), target, NameSide::After) {
                    Some((false, subject.as_str()))
                } else {
                    None
                };
                if let Some((holds_role, partner)) = pairing {
                    self.score_relation(&mut score, target, word.as_str(), holds_role, partner, known);
                }
            }
        }

        // (bearer, possessor, word) group indices per pattern.
        for (pattern, bearer_idx, possessor_idx, word_idx) in [
            (&*FAMILY_POSSESSIVE, 3, 1, 2),
            (&*FAMILY_APPOSITIVE, 1, 2, 3),
        ] {
            for caps in pattern.captures_iter(text) {
                let (Some(bearer), Some(possessor), Some(word)) =
                    (caps.get(bearer_idx), caps.get(possessor_idx), caps.get(word_idx))
                else {
                    continue;
                };
                let bearer_side = if bearer.start() < possessor.start() {
                    NameSide::Before
                } else {
                    NameSide::After
                };
                let possessor_side = if bearer_side == NameSide::Before {
                    NameSide::After
                } else {
                    NameSide::Before
                };

                let pairing = if refers_to(bearer.as_str(), target, bearer_side) {
                    Some((true, possessor.as_str()))
                } else if refers_to(possessor.as_str(), target, possessor_side) {
                    Some((false, bearer.as_str()))
                } else {
                    None
                };
                if let Some((holds_role, partner)) = pairing {
                    self.score_relation(&mut score, target, word.as_str(), holds_role, partner, known);
                }
            }
        }

        score
    }

    fn score_relation(
        &self,
        score: &mut EvidenceScore,
        target: &str,
        word: &str,
        holds_role: bool,
        partner_text: &str,
        known: &CharacterMap,
    ) {
        let Some((group, _)) = relationship::lookup(word) else {
            return;
        };
        let Some(partner) = find_partner(partner_text, target, known) else {
            return;
        };
        if partner.confidence < self.relationship_min_confidence || !partner.gender.is_known() {
            return;
        }

        let implied = relationship::infer(word, holds_role, partner.gender);
        if !implied.is_known() {
            return;
        }
        score.add_points(implied, group.weight());
        let kind = match group {
            RelationGroup::Romantic => "romantic",
            RelationGroup::Family => "family",
        };
        score.note(format!("{kind} relationship \"{word}\" with {} ({})", partner.name, partner.gender));
    }

    /// Drop all memoized analysis.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }
}

/// Count pronouns that refer to `target` in `span`.
///
/// With no other known names present, every pronoun after the target's
/// first mention counts. Otherwise each pronoun goes through the resolver.
fn count_references(target: &str, span: &str, known: &CharacterMap) -> References {
    let target_offsets = word_offsets(span, target);
    let Some(&first) = target_offsets.first() else {
        return References::default();
    };
    let target_spans: Vec<Range<usize>> = target_offsets
        .iter()
        .map(|&offset| offset..offset + target.len())
        .collect();

    let mut others = Vec::new();
    for name in known.keys().filter(|name| name.as_str() != target) {
        for offset in word_offsets(span, name) {
            let overlaps = target_spans
                .iter()
                .any(|t| offset < t.end && t.start < offset + name.len());
            if !overlaps {
                others.push(Mention::new(name.as_str(), offset));
            }
        }
    }

    let shared = !others.is_empty();
    if shared {
        others.extend(target_offsets[1..].iter().map(|&offset| Mention::new(target, offset)));
    }

    let mut references = References {
        shared,
        ..References::default()
    };
    for pronoun in PRONOUN.find_iter(span) {
        let refers = if shared {
            resolve(span, Mention::new(target, first), &others, pronoun.start()) == target
        } else {
            pronoun.start() > first
        };
        if !refers {
            continue;
        }
        match pronoun_gender(pronoun.as_str()) {
            Gender::Male => references.male += 1,
            Gender::Female => references.female += 1,
            Gender::Unknown => {}
        }
    }
    references
}

/// First gendered `Target's <noun>` in a sentence.
fn possessive_in_sentence(target: &str, sentence: &str) -> EvidenceScore {
    let mut score = EvidenceScore::default();
    for offset in word_offsets(sentence, target) {
        let rest = &sentence[offset + target.len()..];
        let Some(noun) = POSSESSIVE_TAIL.captures(rest).and_then(|caps| caps.get(1)) else {
            continue;
        };
        // The noun names the partner; the possessor is taken to be the other sex.
        let partner = match noun.as_str() {
            "wife" | "girlfriend" => Gender::Female,
            "husband" | "boyfriend" => Gender::Male,
            _ => continue,
        };
        let implied = partner.opposite();
        score.add_points(implied, POSSESSIVE_WEIGHT);
        score.note(format!("possessive \"{target}'s {}\"", noun.as_str()));
        break;
    }
    score
}

fn score_dialogue(target: &str, text: &str, known: &CharacterMap) -> EvidenceScore {
    let mut seen = HashSet::new();
    let mut isolated = References::default();
    let mut shared = References::default();

    for pattern in [&*QUOTE_THEN_ATTRIBUTION, &*ATTRIBUTION_THEN_QUOTE] {
        for caps in pattern.captures_iter(text) {
            let Some(attribution) = caps.iter().skip(1).flatten().next() else {
                continue;
            };
            if !contains_word(attribution.as_str(), target) || !seen.insert(attribution.start()) {
                continue;
            }

            let Some(whole) = caps.get(0) else {
                continue;
            };
            let first_end = sentence_end(text, whole.end());
            let end = if first_end < text.len() {
                sentence_end(text, first_end)
            } else {
                first_end
            };
            let context = mask_quotes(&text[attribution.start()..end]);

            let references = count_references(target, &context, known);
            if references.shared {
                shared += references;
            } else {
                isolated += references;
            }
        }
    }

    let mut score = isolated.score(PRONOUN_WEIGHT * ISOLATED_ATTRIBUTION_BOOST)
        + shared.score(PRONOUN_WEIGHT * SHARED_ATTRIBUTION_BOOST);
    let mut total = isolated;
    total += shared;
    if let Some(note) = total.describe("dialogue attribution") {
        score.note(note);
    }
    score
}

/// Which end of a captured span sits next to the relationship word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameSide {
    /// The capture precedes the word, so its last words are the name.
    Before,
    /// The capture follows the word, so its first words are the name.
    After,
}

/// Whether a greedy name capture refers to `name`.
///
/// Captures can swallow neighbouring capitalized words (`Later Tom`,
/// `Ann Smith`), so the name may sit at either end.
fn refers_to(capture: &str, name: &str, side: NameSide) -> bool {
    if capture == name {
        return true;
    }
    match side {
        NameSide::Before => capture
            .strip_suffix(name)
            .is_some_and(|head| head.ends_with(char::is_whitespace)),
        NameSide::After => capture
            .strip_prefix(name)
            .is_some_and(|tail| tail.starts_with(char::is_whitespace)),
    }
}

/// The known character, other than `target`, that a capture names.
///
/// Exact matches win; otherwise the longest known name found at a word
/// boundary inside the capture.
fn find_partner<'a>(capture: &str, target: &str, known: &'a CharacterMap) -> Option<&'a CharacterRecord> {
    if let Some(record) = known.get(capture).filter(|_| capture != target) {
        return Some(record);
    }
    known
        .iter()
        .filter(|(name, _)| name.as_str() != target && contains_word(capture, name))
        .max_by_key(|(name, _)| name.len())
        .map(|(_, record)| record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(entries: &[(&str, Gender, f64)]) -> CharacterMap {
        entries
            .iter()
            .map(|&(name, gender, confidence)| {
                (name.to_string(), CharacterRecord::new(name).with_gender(gender, confidence))
            })
            .collect()
    }

    #[test]
    fn test_isolated_pronouns() {
        let mut analyzer = GenderEvidenceAnalyzer::new();
        let score = analyzer.analyze("Tom", "Tom picked up his bag and he left.", &CharacterMap::new());
        assert_eq!(score.male_score, 4.0);
        assert_eq!(score.female_score, 0.0);
        assert_eq!(score.evidence.as_deref(), Some("pronoun references: 2 male, 0 female"));
    }

    #[test]
    fn test_pronouns_before_target_are_ignored() {
        let mut analyzer = GenderEvidenceAnalyzer::new();
        let score = analyzer.analyze("John", "Her brother John laughed.", &CharacterMap::new());
        assert!(score.is_empty());
    }

    #[test]
    fn test_quoted_pronouns_are_ignored() {
        let mut analyzer = GenderEvidenceAnalyzer::new();
        let score = analyzer.analyze("Mary", "Mary whispered \"he is gone\" quietly.", &CharacterMap::new());
        assert!(score.is_empty());
    }

    #[test]
    fn test_shared_sentence_uses_resolver() {
        let map = known(&[("Alice", Gender::Unknown, 0.0), ("Bob", Gender::Unknown, 0.0)]);
        let text = "Bob said, he sighed, while Alice watched.";

        let mut analyzer = GenderEvidenceAnalyzer::new();
        let bob = analyzer.analyze("Bob", text, &map);
        let alice = analyzer.analyze("Alice", text, &map);
        assert_eq!(bob.male_score, 2.0);
        assert!(alice.is_empty());
    }

    #[test]
    fn test_possessive_pass() {
        let mut analyzer = GenderEvidenceAnalyzer::new();
        let score = analyzer.sentence_pass("Tom", "Tom's wife waved. Later, Tom's girlfriend called.", &CharacterMap::new());
        assert_eq!(score.male_score, 6.0);
        assert_eq!(
            score.evidence.as_deref(),
            Some("possessive \"Tom's wife\"; possessive \"Tom's girlfriend\"")
        );

        let score = analyzer.sentence_pass("Ann", "Ann's boyfriend left.", &CharacterMap::new());
        assert_eq!((score.male_score, score.female_score), (0.0, 3.0));

        let score = analyzer.sentence_pass("Ann", "Ann's eyes closed.", &CharacterMap::new());
        assert!(score.is_empty());
    }

    #[test]
    fn test_dialogue_attribution_boosts_pronouns() {
        let mut analyzer = GenderEvidenceAnalyzer::new();
        let text = "\"I'm fine,\" Mary said. She smiled.";
        let score = analyzer.dialogue_pass("Mary", text, &CharacterMap::new());
        assert_eq!(score.female_score, 6.0);
        assert_eq!(score.male_score, 0.0);
    }

    #[test]
    fn test_dialogue_with_other_characters() {
        let map = known(&[("Mary", Gender::Unknown, 0.0), ("John", Gender::Unknown, 0.0)]);
        let text = "\"I'm fine,\" Mary said. Her brother John laughed.";

        let mut analyzer = GenderEvidenceAnalyzer::new();
        let mary = analyzer.analyze("Mary", text, &map);
        assert_eq!(mary.female_score, 3.0);
        assert_eq!(mary.male_score, 0.0);

        let john = analyzer.analyze("John", text, &map);
        assert!(john.is_empty());
    }

    #[test]
    fn test_attribution_first_form() {
        let mut analyzer = GenderEvidenceAnalyzer::new();
        let text = "Tom said, \"Wait for me.\" He ran after the cart.";
        let score = analyzer.dialogue_pass("Tom", text, &CharacterMap::new());
        assert_eq!(score.male_score, 6.0);
    }

    #[test]
    fn test_dialogue_is_memoized() {
        let mut analyzer = GenderEvidenceAnalyzer::new();
        let text = "\"Go,\" Ann said. She left.";
        let first = analyzer.dialogue_pass("Ann", text, &CharacterMap::new());
        let misses = analyzer.cache().stats().misses;
        let second = analyzer.dialogue_pass("Ann", text, &CharacterMap::new());
        assert_eq!(first, second);
        assert_eq!(analyzer.cache().stats().misses, misses);

        analyzer.clear_cache();
        assert!(analyzer.cache().is_empty());
    }

    #[test]
    fn test_family_relationship_needs_confident_partner() {
        let text = "Lisa's husband Tom came home.";
        let analyzer = GenderEvidenceAnalyzer::new();

        let map = known(&[("Tom", Gender::Male, 0.9), ("Lisa", Gender::Unknown, 0.0)]);
        let score = analyzer.relationship_pass("Lisa", text, &map);
        assert_eq!(score.female_score, 4.0);
        assert_eq!(score.male_score, 0.0);

        let map = known(&[("Tom", Gender::Male, 0.5), ("Lisa", Gender::Unknown, 0.0)]);
        assert!(analyzer.relationship_pass("Lisa", text, &map).is_empty());
    }

    #[test]
    fn test_absolute_family_role() {
        let analyzer = GenderEvidenceAnalyzer::new();
        let map = known(&[("Mary", Gender::Female, 0.9)]);

        let score = analyzer.relationship_pass("John", "Mary's brother John waved.", &map);
        assert_eq!(score.male_score, 4.0);

        let score = analyzer.relationship_pass("John", "John, Mary's brother, waved.", &map);
        assert_eq!(score.male_score, 4.0);
    }

    #[test]
    fn test_romantic_relationships() {
        let analyzer = GenderEvidenceAnalyzer::new();
        let map = known(&[("Ann", Gender::Female, 0.8)]);

        let score = analyzer.relationship_pass("Tom", "Later Tom kissed Ann under the tree.", &map);
        assert_eq!(score.male_score, 3.0);

        let score = analyzer.relationship_pass("Tom", "Ann was married to Tom in spring.", &map);
        assert_eq!(score.male_score, 3.0);
    }

    #[test]
    fn test_empty_inputs() {
        let mut analyzer = GenderEvidenceAnalyzer::new();
        assert_eq!(analyzer.analyze("", "He left.", &CharacterMap::new()), EvidenceScore::default());
        assert_eq!(analyzer.analyze("Tom", "  ", &CharacterMap::new()), EvidenceScore::default());
    }

    #[test]
    fn test_evidence_notes_are_distinct() {
        let mut score = EvidenceScore::default();
        score.note("a");
        score.note("b");
        score.note("a");
        let mut other = EvidenceScore::default();
        other.note("b");
        other.note("c");
        other.add_points(Gender::Male, 1.0);
        score += other;
        assert_eq!(score.evidence.as_deref(), Some("a; b; c"));
        assert_eq!(score.male_score, 1.0);
    }

    #[test]
    fn test_add_points_and_sum() {
        let mut score = EvidenceScore::default();
        score.add_points(Gender::Female, 3.0);
        score.add_points(Gender::Unknown, 9.0);
        assert_eq!(score.female_score, 3.0);
        assert_eq!(score.male_score, 0.0);

        let mut male = EvidenceScore::default();
        male.add_points(Gender::Male, 2.0);
        let total = score + male;
        assert_eq!((total.male_score, total.female_score), (2.0, 3.0));
    }

    #[test]
    fn test_refers_to() {
        assert!(refers_to("Tom", "Tom", NameSide::Before));
        assert!(refers_to("Later Tom", "Tom", NameSide::Before));
        assert!(!refers_to("Later Tom", "Tom", NameSide::After));
        assert!(refers_to("Ann Smith", "Ann", NameSide::After));
        assert!(!refers_to("Annabel", "Ann", NameSide::After));
    }
}
