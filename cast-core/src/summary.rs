//! Plain-text character summary for downstream prompts.

use crate::character::{CharacterMap, CharacterRecord};
use std::cmp::Reverse;

/// One line per character, most important first, at most `limit` lines.
///
/// Characters seen more than once come first, then by appearances
/// (descending), then by name. Each line reads
/// `- Name: gender (pronouns), N appearances` (singular for one).
pub fn character_summary(map: &CharacterMap, limit: usize) -> String {
    let mut records: Vec<&CharacterRecord> = map.values().collect();
    records.sort_by_key(|r| (Reverse(r.appearances > 1), Reverse(r.appearances), r.name.as_str()));

    records
        .into_iter()
        .take(limit)
        .map(|r| {
            format!(
                "- {}: {} ({}), {} {}",
                r.name,
                r.gender,
                r.gender.pronouns(),
                r.appearances,
                if r.appearances == 1 { "appearance" } else { "appearances" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gender::Gender;

    fn add(map: &mut CharacterMap, name: &str, gender: Gender, appearances: u32) {
        map.insert(
            name.to_string(),
            CharacterRecord::new(name)
                .with_gender(gender, 0.9)
                .with_appearances(appearances),
        );
    }

    #[test]
    fn test_summary_order_and_format() {
        let mut map = CharacterMap::new();
        add(&mut map, "Zed", Gender::Unknown, 1);
        add(&mut map, "Mary", Gender::Female, 5);
        add(&mut map, "Tom", Gender::Male, 5);
        add(&mut map, "Ann", Gender::Female, 2);

        let summary = character_summary(&map, 10);
        assert_eq!(
            summary,
            "- Mary: female (she/her), 5 appearances\n\
             - Tom: male (he/him), 5 appearances\n\
             - Ann: female (she/her), 2 appearances\n\
             - Zed: unknown (they/them), 1 appearance"
        );
    }

    #[test]
    fn test_summary_limit() {
        let mut map = CharacterMap::new();
        for i in 0..15 {
            add(&mut map, &format!("Name{i:02}"), Gender::Male, 2);
        }
        assert_eq!(character_summary(&map, 10).lines().count(), 10);
        assert_eq!(character_summary(&CharacterMap::new(), 10), "");
    }
}
