//! End-to-end tests for extraction and inference across chapters.
//!
//! Run with: `cargo test -p cast-core --test pipeline`

use cast_core::{
    CharacterMap, CharacterRecord, EngineConfig, Gender, GenderDecision, GenderEvidenceAnalyzer,
    NameCandidateExtractor, NovelSession,
};

// =============================================================================
// Extraction feeding inference
// =============================================================================

#[test]
fn test_dialogue_line_with_sibling() {
    let text = "\"I'm fine,\" Mary said. Her brother John laughed.";

    let candidates = NameCandidateExtractor::new().extract(text);
    let names: Vec<&str> = candidates.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["John", "Mary"]);

    let mut session = NovelSession::new("sibling");
    session.process_chapter(text);

    let mary = session.character("Mary").expect("Mary tracked");
    assert_eq!(mary.gender, Gender::Female);
    assert!(mary.confidence > 0.0);

    let john = session.character("John").expect("John tracked");
    assert_eq!(john.gender, Gender::Unknown);
    assert_eq!(john.confidence, 0.0);
}

#[test]
fn test_two_male_pronouns_alone() {
    let mut analyzer = GenderEvidenceAnalyzer::new();
    let score = analyzer.analyze("Tom", "Tom said he would bring his lantern.", &CharacterMap::new());
    assert_eq!(score.male_score, 4.0);
    assert_eq!(score.female_score, 0.0);
}

#[test]
fn test_speech_verb_resolution_in_session() {
    let mut known = CharacterMap::new();
    known.insert("Bob".into(), CharacterRecord::new("Bob"));
    known.insert("Alice".into(), CharacterRecord::new("Alice"));

    let mut analyzer = GenderEvidenceAnalyzer::new();
    let text = "Bob said, he sighed, while Alice watched.";
    assert_eq!(analyzer.analyze("Bob", text, &known).male_score, 2.0);
    assert_eq!(analyzer.analyze("Alice", text, &known).male_score, 0.0);
}

// =============================================================================
// Relationship inference across chapters
// =============================================================================

#[test]
fn test_relationship_anchors_on_confident_partner() {
    let mut session = NovelSession::new("couple");

    // Chapter one establishes Tom.
    session.process_chapter("\"Morning,\" Tom said. He stretched. He yawned. His coffee was cold.");
    let tom = session.character("Tom").expect("Tom tracked");
    assert_eq!(tom.gender, Gender::Male);
    assert!(tom.confidence >= 0.7);

    // Chapter two only says who Lisa is married to.
    session.process_chapter("Lisa's husband Tom came home late. Lisa said nothing.");
    let lisa = session.character("Lisa").expect("Lisa tracked");
    assert_eq!(lisa.gender, Gender::Female);
    assert!(lisa.evidence.iter().any(|e| e.contains("husband")));
}

#[test]
fn test_weak_partner_does_not_decide() {
    let mut known = CharacterMap::new();
    known.insert(
        "Tom".into(),
        CharacterRecord::new("Tom").with_gender(Gender::Male, 0.5),
    );

    let analyzer = GenderEvidenceAnalyzer::new();
    let score = analyzer.relationship_pass("Lisa", "Lisa's husband Tom came home.", &known);
    assert_eq!(score.female_score, 0.0);

    let config = EngineConfig::default();
    let decision = GenderDecision::from_score(&score, &config);
    assert_eq!(decision.gender, Gender::Unknown);
}

// =============================================================================
// Accumulation
// =============================================================================

#[test]
fn test_appearances_accumulate_and_summary_orders() {
    let mut session = NovelSession::new("accumulate");
    session.process_chapter("\"Hello,\" Ann said. She waved. Bob said hi.");
    session.process_chapter("Ann said goodbye. Ann's eyes were red.");

    assert_eq!(session.character("Ann").unwrap().appearances, 3);
    assert_eq!(session.character("Bob").unwrap().appearances, 1);

    let summary = session.summary();
    let first = summary.lines().next().unwrap();
    assert!(first.starts_with("- Ann: female (she/her)"), "{summary}");
}

#[test]
fn test_chapter_without_names_changes_nothing() {
    let mut session = NovelSession::new("quiet");
    let report = session.process_chapter("the rain fell all night and nobody came.");
    assert!(report.mentioned.is_empty());
    assert!(session.characters().is_empty());
    assert_eq!(session.summary(), "");
}
