//! End-to-end generation pipeline tests.
//!
//! Run with: cargo test --test test_engine

use std::collections::HashSet;

use zyntalic::anchors::ANCHORS;
use zyntalic::engine::{export_tsv, EngineConfig, EngineContext};

fn default_engine() -> EngineContext {
    EngineContext::new(EngineConfig::default())
}

// ---------------------------------------------------------------------------
// Reference scenario: "Love" at the default configuration
// ---------------------------------------------------------------------------

#[test]
fn love_entry_is_stable_and_well_formed() {
    let engine = default_engine();
    let e1 = engine.generate("Love");
    let e2 = engine.generate("Love");

    assert_eq!(e1.token, e2.token);
    assert_eq!(e1.meaning, e2.meaning);
    assert_eq!(e1.sentence, e2.sentence);
    assert_eq!(e1.anchors, e2.anchors);
    assert_eq!(e1.embedding, e2.embedding);

    assert!(!e1.token.is_empty());
    assert_eq!(e1.embedding.len(), 300);
    assert_eq!(e1.anchors.len(), 3);

    // weights are a probability distribution, strongest first
    let sum: f32 = e1.anchors.iter().map(|(_, w)| w).sum();
    assert!((sum - 1.0).abs() < 1e-6, "weights sum = {sum}");
    assert!(e1.anchors.windows(2).all(|p| p[0].1 >= p[1].1));
    for (name, w) in &e1.anchors {
        assert!(ANCHORS.contains(&name.as_str()), "unknown anchor {name}");
        assert!(*w > 0.0);
    }
}

#[test]
fn different_keys_differ() {
    let engine = default_engine();
    let love = engine.generate("Love");
    let war = engine.generate("War");
    assert_ne!(love.token, war.token);
    assert_ne!(love.embedding, war.embedding);
}

#[test]
fn context_annotation_is_last_and_matches_anchors() {
    let engine = default_engine();
    for key in ["Love", "War", "Tiempo", "7"] {
        let e = engine.generate(key);
        assert!(e.sentence.starts_with(&e.meaning));
        let tail = &e.sentence[e.meaning.len()..];
        assert!(tail.starts_with(" ⟦ctx: lemma="), "bad tail: {tail}");
        assert!(tail.ends_with('⟧'));
        let names: Vec<&str> = e.anchors.iter().map(|(n, _)| n.as_str()).collect();
        assert!(
            tail.contains(&format!("anchors={}⟧", names.join("|"))),
            "anchors missing from context: {tail}"
        );
        assert!(tail.contains("pos≈noun") || tail.contains("pos≈verb"));
    }
}

// ---------------------------------------------------------------------------
// Bulk generation
// ---------------------------------------------------------------------------

#[test]
fn wordlist_is_deterministic_and_unique() {
    let engine = default_engine();
    let a = engine.generate_words(50, "suite");
    let b = engine.generate_words(50, "suite");
    assert_eq!(a.len(), 50);

    let tokens: HashSet<&str> = a.iter().map(|e| e.token.as_str()).collect();
    assert_eq!(tokens.len(), 50, "duplicate tokens in wordlist");

    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.token, y.token);
        assert_eq!(x.sentence, y.sentence);
    }
}

#[test]
fn export_round_trips_through_tsv_columns() {
    let engine = default_engine();
    let entries = engine.generate_words(5, "export");
    let mut buf = Vec::new();
    export_tsv(&entries, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    for (line, entry) in lines.iter().zip(entries.iter()) {
        let cols: Vec<&str> = line.split('\t').collect();
        assert_eq!(cols.len(), 5);
        assert_eq!(cols[0], entry.token);
        assert_eq!(cols[1], entry.meaning);
        assert_eq!(cols[2], entry.sentence);
        assert_eq!(cols[3].split(';').count(), entry.anchors.len());
        assert_eq!(cols[4].split(',').count(), 300);
    }
}

// ---------------------------------------------------------------------------
// Graceful degradation
// ---------------------------------------------------------------------------

#[test]
fn missing_lexicons_and_models_still_generate() {
    let engine = EngineContext::new(EngineConfig::default())
        .with_lexicon_dir("/nonexistent/lexicon")
        .with_projection_dir(std::path::Path::new("/nonexistent/models"));
    let e = engine.generate("Love");
    assert!(!e.token.is_empty());
    assert_eq!(e.anchors.len(), 3);
}

#[test]
fn mirror_rate_bounds_hold_across_keys() {
    let engine = default_engine();
    for i in 0..25 {
        let always = engine.generate_with_rate(&format!("k{i}"), 1.0);
        assert!(
            !always.meaning.ends_with(" itself."),
            "plain production at mirror rate 1.0: {}",
            always.meaning
        );
        let never = engine.generate_with_rate(&format!("k{i}"), 0.0);
        assert!(
            never.meaning.ends_with(" itself."),
            "mirrored production at mirror rate 0.0: {}",
            never.meaning
        );
    }
}
