//! Pronoun reference resolution within one sentence.

use crate::text::clause_start;

/// Speech verbs that mark the preceding name as the speaker.
const ATTRIBUTION_VERBS: &[&str] = &["said", "replied", "asked", "exclaimed"];

/// A name occurrence inside the sentence being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mention<'a> {
    pub name: &'a str,
    /// Byte offset of the name in the sentence.
    pub offset: usize,
}

impl<'a> Mention<'a> {
    pub fn new(name: &'a str, offset: usize) -> Self {
        Self { name, offset }
    }

    fn end(&self) -> usize {
        self.offset + self.name.len()
    }
}

/// Decide which candidate a pronoun at `pronoun_offset` refers to.
///
/// 1. If the clause text right before the pronoun ends in a speech verb
///    (`Bob said, he …`), the candidate closest before that verb wins.
/// 2. A name directly after a possessive determiner and a noun
///    (`her brother John`) is the possessed party and is skipped.
/// 3. Otherwise the candidate whose span is nearest to the pronoun wins,
///    ties going to the earlier candidate.
///
/// `target` is always a candidate, so a name is always returned.
pub fn resolve<'a>(
    sentence: &str,
    target: Mention<'a>,
    others: &[Mention<'a>],
    pronoun_offset: usize,
) -> &'a str {
    let mut candidates: Vec<Mention<'a>> = std::iter::once(target)
        .chain(others.iter().copied())
        .collect();
    candidates.sort_by_key(|m| m.offset);
    let candidates_len = candidates.len();

    if let Some(verb_offset) = speech_verb_before(sentence, pronoun_offset) {
        let speaker = candidates
            .iter()
            .filter(|m| m.end() <= verb_offset)
            .max_by_key(|m| m.offset);
        if let Some(speaker) = speaker {
            return speaker.name;
        }
    }

    let pronoun_end = pronoun_offset
        + sentence[pronoun_offset..]
            .find(|c: char| !c.is_alphabetic())
            .unwrap_or(sentence.len() - pronoun_offset);

    let possessed = possessed_name_offset(sentence, pronoun_offset, pronoun_end);

    let mut best = target;
    let mut best_gap = usize::MAX;
    for m in candidates {
        if Some(m.offset) == possessed && candidates_len > 1 {
            continue;
        }
        let gap = if m.end() <= pronoun_offset {
            pronoun_offset - m.end()
        } else if m.offset >= pronoun_end {
            m.offset - pronoun_end
        } else {
            0
        };
        if gap < best_gap {
            best = m;
            best_gap = gap;
        }
    }
    best.name
}

/// Offset of the name in `his sister Mary`, given the span of `his`.
fn possessed_name_offset(sentence: &str, pronoun_offset: usize, pronoun_end: usize) -> Option<usize> {
    let pronoun = sentence[pronoun_offset..pronoun_end].to_lowercase();
    if pronoun != "his" && pronoun != "her" {
        return None;
    }

    let rest = &sentence[pronoun_end..];
    let noun = rest.trim_start();
    if noun.len() == rest.len() {
        return None;
    }
    let noun_len = noun.find(|c: char| !c.is_lowercase()).unwrap_or(noun.len());
    if noun_len == 0 {
        return None;
    }

    let after_noun = &noun[noun_len..];
    let name = after_noun.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    let starts_upper = name.chars().next().is_some_and(char::is_uppercase);
    (name.len() < after_noun.len() && starts_upper).then(|| sentence.len() - name.len())
}

/// Offset of a speech verb ending the clause text before `offset`, if any.
///
/// Trailing whitespace and commas between the verb and the pronoun are
/// ignored.
fn speech_verb_before(sentence: &str, offset: usize) -> Option<usize> {
    let start = clause_start(sentence, offset);
    let preceding = sentence[start..offset].trim_end_matches(|c: char| c.is_whitespace() || c == ',');

    let word_start = preceding
        .char_indices()
        .rev()
        .find(|&(_, c)| !c.is_alphabetic())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let word = &preceding[word_start..];

    ATTRIBUTION_VERBS
        .contains(&word.to_lowercase().as_str())
        .then_some(start + word_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(sentence: &str, name: &'static str) -> Mention<'static> {
        Mention::new(name, sentence.find(name).unwrap())
    }

    #[test]
    fn test_speech_verb_overrides_distance() {
        let s = "Bob said, he sighed, while Alice watched.";
        let he = s.find(" he ").unwrap() + 1;
        let resolved = resolve(s, mention(s, "Alice"), &[mention(s, "Bob")], he);
        assert_eq!(resolved, "Bob");

        let resolved = resolve(s, mention(s, "Bob"), &[mention(s, "Alice")], he);
        assert_eq!(resolved, "Bob");
    }

    #[test]
    fn test_nearest_candidate_wins() {
        let s = "Alice waved at Bob and he smiled.";
        let he = s.find(" he ").unwrap() + 1;
        let resolved = resolve(s, mention(s, "Alice"), &[mention(s, "Bob")], he);
        assert_eq!(resolved, "Bob");
    }

    #[test]
    fn test_following_candidate_can_win() {
        let s = "After a long pause she thanked Mary, and Tom left.";
        let she = s.find("she").unwrap();
        let resolved = resolve(s, mention(s, "Tom"), &[mention(s, "Mary")], she);
        assert_eq!(resolved, "Mary");
    }

    #[test]
    fn test_ties_go_to_earlier_candidate() {
        let s = "Ann X he X Bea";
        let he = s.find("he").unwrap();
        let resolved = resolve(s, mention(s, "Bea"), &[mention(s, "Ann")], he);
        assert_eq!(resolved, "Ann");
    }

    #[test]
    fn test_speech_verb_without_preceding_candidate_falls_back() {
        let s = "Someone said, he left, and Tom nodded.";
        let he = s.find(" he ").unwrap() + 1;
        let resolved = resolve(s, mention(s, "Tom"), &[], he);
        assert_eq!(resolved, "Tom");
    }

    #[test]
    fn test_possessed_name_is_skipped() {
        let s = "Mary said. Her brother John laughed.";
        let her = s.find("Her").unwrap();
        let resolved = resolve(s, mention(s, "Mary"), &[mention(s, "John")], her);
        assert_eq!(resolved, "Mary");

        let resolved = resolve(s, mention(s, "John"), &[mention(s, "Mary")], her);
        assert_eq!(resolved, "Mary");
    }

    #[test]
    fn test_possessed_name_offset() {
        let s = "Then his sister, Ann, left";
        let his = s.find("his").unwrap();
        assert_eq!(possessed_name_offset(s, his, his + 3), s.find("Ann"));

        let s = "He met Ann";
        assert_eq!(possessed_name_offset(s, 0, 2), None);
    }

    #[test]
    fn test_speech_verb_detection_stops_at_clause() {
        let s = "Mary said nothing. He left with Tom.";
        let he = s.find("He").unwrap();
        assert_eq!(speech_verb_before(s, he), None);

        let s = "Bob said, he sighed";
        let he = s.find(" he").unwrap() + 1;
        assert_eq!(speech_verb_before(s, he), Some(4));
    }
}
