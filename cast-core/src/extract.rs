//! Character name discovery.
//!
//! Names are found with a fixed, ordered set of surface patterns (speech
//! verbs, dialogue attribution, possessives, titles, honorific prefixes) and
//! then filtered through a name validator. Nothing here tries to be a
//! general named-entity recognizer: the patterns only fire in the narrow
//! contexts where a capitalized span is very likely a character.

use crate::config::EngineConfig;
use crate::gender::Gender;
use crate::text::{truncate_chars, TITLE_ABBREVIATIONS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Names longer than this are clauses, not names.
const MAX_NAME_CHARS: usize = 30;

/// Upper bound for the punctuation-free fallback form.
const FALLBACK_MAX_CHARS: usize = 20;

/// A name with this many words is a run-on fragment.
const FRAGMENT_WORD_COUNT: usize = 5;

/// One word of a name: `Mary`, `O'Brien`, `McAllister`, `Jean-Luc`.
const NAME_WORD: &str = r"(?:O'|Mc|Mac)?[A-Z][a-z]+(?:-[A-Z]?[a-z]+)?";

pub(crate) const SPEECH_VERBS: &str = "said|asked|replied|answered|shouted|whispered|exclaimed|muttered|murmured|cried|yelled|called|added|continued|responded|sighed|laughed|snapped|demanded|insisted";

const POSSESSED_NOUNS: &str = "face|eyes|eye|hand|hands|hair|voice|body|head|heart|arm|arms|lips|smile|expression|gaze|shoulder|shoulders|mother|father|brother|sister|wife|husband|son|daughter|friend|girlfriend|boyfriend|family|mind";

const SPACED_TITLES: &str = "Miss|Lord|Lady|Sir|Madam|Master|Prince|Princess|King|Queen|Elder|Senior|Uncle|Aunt|Young Master|Young Miss";

const DOTTED_TITLES: &str = "Mr|Mrs|Ms|Dr|Prof";

pub(crate) fn name_pattern() -> String {
    format!(r"{NAME_WORD}(?:[ \t]+{NAME_WORD}){{0,2}}")
}

/// A name as a speaker: optionally led by a dotted title (`Dr. Watson`).
pub(crate) fn speaker_pattern() -> String {
    format!(r"(?:(?:{DOTTED_TITLES})\.?[ \t]+)?{name}", name = name_pattern())
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

lazy_static::lazy_static! {
    static ref SPEECH_VERB_NAME: Regex = compile(&format!(
        r"\b({name})[ \t]+(?:{SPEECH_VERBS})\b",
        name = speaker_pattern()
    ));

    static ref QUOTED_ATTRIBUTION: Regex = compile(&format!(
        r#"["“][^"“”\n]{{1,500}}["”][ \t]*,?[ \t]*(?:({name})[ \t]+(?:{SPEECH_VERBS})|(?:{SPEECH_VERBS})[ \t]+({name}))\b"#,
        name = speaker_pattern()
    ));

    static ref COLON_DIALOGUE: Regex = compile(&format!(
        r#"(?m)^[ \t]*({name})[ \t]*:[ \t]*["“]"#,
        name = name_pattern()
    ));

    static ref POSSESSIVE_NOUN: Regex = compile(&format!(
        r"\b({name})['’]s[ \t]+(?:{POSSESSED_NOUNS})\b",
        name = name_pattern()
    ));

    static ref TITLED_NAME: Regex = compile(&format!(
        r"\b((?:(?:{DOTTED_TITLES})\.?|{SPACED_TITLES})[ \t]+{NAME_WORD}(?:[ \t]+{NAME_WORD})?)\b"
    ));

    static ref HONORIFIC_PREFIX: Regex = compile(
        r"\b((?:Xiao|Lao|Ah|Da)[ \t]+[A-Z][a-z]+)\b"
    );

    static ref SINGLE_WORD: Regex = compile(r"^[A-Z][a-zA-Z'\-]*$");

    static ref MULTI_WORD: Regex = compile(r"^[A-Z][a-zA-Z'\-]*(?: [A-Z][a-zA-Z'\-]*){1,2}$");

    static ref TITLE_FORM: Regex = compile(&format!(
        r"^(?:(?:{DOTTED_TITLES})\.?|{SPACED_TITLES}) [A-Z][a-zA-Z'\-]*(?: [A-Z][a-zA-Z'\-]*)?$"
    ));

    static ref XIAO_FORM: Regex = compile(r"^Xiao [A-Z][a-z]+$");

    static ref PRONOUNS: HashSet<&'static str> = [
        "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself",
        "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "we", "us", "our", "ours", "they", "them",
        "their", "theirs", "themselves",
    ]
    .into_iter()
    .collect();

    /// Sentence connectives and common words that are capitalized at the
    /// start of a sentence but never name a character.
    static ref STOPWORDS: HashSet<&'static str> = [
        "the", "a", "an", "and", "but", "or", "nor", "so", "then", "than",
        "when", "while", "where", "what", "which", "who", "whom", "whose",
        "why", "how", "if", "though", "although", "because", "since", "after",
        "before", "until", "unless", "however", "meanwhile", "suddenly",
        "finally", "still", "yet", "also", "just", "even", "only", "perhaps",
        "maybe", "this", "that", "these", "those", "there", "here", "now",
        "well", "yes", "no", "oh", "ah", "okay", "everyone", "someone",
        "nobody", "everything", "nothing", "something", "chapter", "today",
        "tomorrow", "yesterday", "with", "without", "for", "from", "into",
        "at", "in", "on", "of", "to", "by", "as", "not", "later", "soon",
        "again", "once", "instead", "indeed", "thus", "therefore", "otherwise",
        "next", "first", "every", "each", "all", "some", "both",
    ]
    .into_iter()
    .collect();

    static ref AUXILIARIES: HashSet<&'static str> = [
        "is", "was", "are", "were", "am", "be", "been", "being",
        "have", "has", "had", "do", "does", "did",
    ]
    .into_iter()
    .collect();

    /// Matched case-sensitively so `Will` and `May` remain usable names.
    static ref MODALS: HashSet<&'static str> = [
        "will", "would", "can", "could", "shall", "should", "may", "might", "must",
    ]
    .into_iter()
    .collect();
}

/// Which surface pattern produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    /// `Mary said`
    SpeechVerb,
    /// `"…," Mary said` / `"…," said Mary`
    QuotedAttribution,
    /// `Mary: "…"`
    ColonDialogue,
    /// `Mary's eyes`
    Possessive,
    /// `Lord Chen`
    Title,
    /// `Xiao Lan`
    HonorificPrefix,
}

impl PatternKind {
    /// All kinds in the order they are applied.
    pub const ALL: [PatternKind; 6] = [
        PatternKind::SpeechVerb,
        PatternKind::QuotedAttribution,
        PatternKind::ColonDialogue,
        PatternKind::Possessive,
        PatternKind::Title,
        PatternKind::HonorificPrefix,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            PatternKind::SpeechVerb => &*SPEECH_VERB_NAME,
            PatternKind::QuotedAttribution => &*QUOTED_ATTRIBUTION,
            PatternKind::ColonDialogue => &*COLON_DIALOGUE,
            PatternKind::Possessive => &*POSSESSIVE_NOUN,
            PatternKind::Title => &*TITLED_NAME,
            PatternKind::HonorificPrefix => &*HONORIFIC_PREFIX,
        }
    }
}

/// A validated name found in the text. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMatch {
    /// Validated, whitespace-normalized name.
    pub name: String,
    /// Byte offset of the name in the scanned text.
    pub offset: usize,
    /// Pattern that found it.
    pub kind: PatternKind,
}

/// Extraction result for one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Always `Unknown` straight out of extraction.
    pub gender: Gender,
    /// Distinct mentions found.
    pub appearances: u32,
}

/// Candidate names keyed by name.
pub type CandidateMap = BTreeMap<String, Candidate>;

/// Scans text for character names.
#[derive(Debug, Clone)]
pub struct NameCandidateExtractor {
    max_text_length: usize,
    max_total_matches: usize,
    max_matches_per_pattern: usize,
}

impl Default for NameCandidateExtractor {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl NameCandidateExtractor {
    /// Create an extractor with default caps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor using the caps from a config.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_text_length: config.max_text_length,
            max_total_matches: config.max_total_matches,
            max_matches_per_pattern: config.max_matches_per_pattern,
        }
    }

    /// Find every validated name occurrence, in pattern order.
    ///
    /// The same span may be reported by more than one pattern.
    pub fn scan(&self, text: &str) -> Vec<CandidateMatch> {
        let text = truncate_chars(text, self.max_text_length);
        let mut found = Vec::new();
        let mut remaining = self.max_total_matches;

        for kind in PatternKind::ALL {
            if remaining == 0 {
                log::debug!("Match cap reached before {kind:?} patterns");
                break;
            }

            let take = remaining.min(self.max_matches_per_pattern);
            for caps in kind.regex().captures_iter(text).take(take) {
                remaining -= 1;

                // Alternation patterns put the name in whichever group matched.
                let Some(group) = caps.iter().skip(1).flatten().next() else {
                    continue;
                };
                let (lead, stripped) = strip_leading_connectives(group.as_str());
                if let Some(name) = validate_name(stripped) {
                    found.push(CandidateMatch {
                        name,
                        offset: group.start() + lead,
                        kind,
                    });
                }
            }
        }

        found
    }

    /// Build the candidate map for a text.
    ///
    /// Empty or name-free text yields an empty map.
    pub fn extract(&self, text: &str) -> CandidateMap {
        let mut seen = HashSet::new();
        let mut candidates = CandidateMap::new();

        for m in self.scan(text) {
            if !seen.insert((m.name.clone(), m.offset)) {
                continue;
            }
            candidates
                .entry(m.name)
                .or_insert(Candidate {
                    gender: Gender::Unknown,
                    appearances: 0,
                })
                .appearances += 1;
        }

        candidates.retain(|name, _| !is_compound_fragment(name));
        log::debug!("Extracted {} candidate names", candidates.len());
        candidates
    }
}

/// Drop sentence connectives from the front of a raw capture.
///
/// Returns the byte offset of the first kept word and the remaining text.
/// The last word is never dropped so the validator still sees something.
fn strip_leading_connectives(raw: &str) -> (usize, &str) {
    let mut start = 0;
    loop {
        let rest = &raw[start..];
        let word_start = start + (rest.len() - rest.trim_start().len());
        let word_len = raw[word_start..]
            .find(char::is_whitespace)
            .unwrap_or(raw.len() - word_start);
        let word_end = word_start + word_len;

        let word = raw[word_start..word_end].to_lowercase();
        if word_end == raw.len() || !STOPWORDS.contains(word.as_str()) {
            return (word_start, &raw[word_start..]);
        }
        start = word_end;
    }
}

fn is_title_abbreviation(word: &str) -> bool {
    word.strip_suffix('.')
        .is_some_and(|bare| TITLE_ABBREVIATIONS.contains(&bare))
}

/// Validate and normalize a candidate name.
///
/// Returns the whitespace-normalized name if it looks like a character
/// name, `None` otherwise. Idempotent: validating a returned name yields
/// the same name.
pub fn validate_name(raw: &str) -> Option<String> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return None;
    }
    if !name.chars().next()?.is_uppercase() {
        return None;
    }

    for word in name.split(' ') {
        let lower = word.to_lowercase();
        if PRONOUNS.contains(lower.as_str())
            || STOPWORDS.contains(lower.as_str())
            || AUXILIARIES.contains(lower.as_str())
            || MODALS.contains(word)
        {
            return None;
        }
        if word.contains(['.', '!', '?']) && !is_title_abbreviation(word) {
            return None;
        }
        if lower.ends_with("'s") || lower.ends_with("’s") {
            return None;
        }
    }

    let accepted = SINGLE_WORD.is_match(&name)
        || MULTI_WORD.is_match(&name)
        || TITLE_FORM.is_match(&name)
        || XIAO_FORM.is_match(&name)
        || is_short_plain_token(&name);

    accepted.then_some(name)
}

/// Fallback acceptance: short, every word capitalized, no punctuation.
fn is_short_plain_token(name: &str) -> bool {
    name.chars().count() < FALLBACK_MAX_CHARS
        && name
            .chars()
            .all(|c| c.is_alphabetic() || c == ' ' || c == '-' || c == '\'')
        && name
            .split(' ')
            .all(|word| word.chars().next().is_some_and(char::is_uppercase))
}

/// Whether an accepted name is really a glued-together fragment.
pub fn is_compound_fragment(name: &str) -> bool {
    const MARKERS: &[char] = &[',', ';', ':', '"', '“', '”', '(', ')', '[', ']', '!', '?'];
    name.contains(MARKERS) || name.split_whitespace().count() >= FRAGMENT_WORD_COUNT
}
