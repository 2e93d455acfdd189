//! Lexicon mining feeding generation: corpus TSV → per-anchor JSON →
//! sentence bias.
//!
//! Run with: cargo test --test test_lexicon_pipeline

use std::collections::HashMap;

use zyntalic::anchors::ANCHORS;
use zyntalic::engine::{EngineConfig, EngineContext};
use zyntalic::lexicon::{self, Lexicon, LexiconStore};

#[test]
fn mined_lexicons_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("anchors.tsv");
    std::fs::write(
        &corpus,
        "Homer_Iliad\tSing goddess the glorious wrath of swift Achilles beside the wine-dark sea\n\
         Spinoza_Ethics\tThe order and connection of ideas mirrors the order and connection of things\n",
    )
    .unwrap();

    let rows = lexicon::read_corpus_tsv(&corpus).unwrap();
    let mined = lexicon::build_lexicons(&rows, 16);
    let out = dir.path().join("lexicon");
    lexicon::write_lexicons(&mined, &out).unwrap();

    let store = LexiconStore::open(&out);
    assert_eq!(store.lexicons().len(), 2);
    let iliad = store.get("Homer_Iliad").unwrap();
    assert!(!iliad.nouns.is_empty());
    assert!(!iliad.motifs.is_empty());
    // stopwords never survive mining
    assert!(!iliad.nouns.contains(&"the".to_string()));
}

#[test]
fn lexicon_motifs_drive_mirrored_sentences() {
    // every anchor gets the same distinctive motif pair, so every
    // mirrored sentence must use it instead of the built-in defaults
    let dir = tempfile::tempdir().unwrap();
    let mut lexicons: HashMap<String, Lexicon> = HashMap::new();
    for &name in ANCHORS.iter() {
        lexicons.insert(
            name.to_string(),
            Lexicon {
                motifs: vec![vec!["ember".to_string(), "frost".to_string()]],
                ..Lexicon::default()
            },
        );
    }
    lexicon::write_lexicons(&lexicons, dir.path()).unwrap();

    let engine = EngineContext::new(EngineConfig::default()).with_lexicon_dir(dir.path());
    for i in 0..10 {
        let e = engine.generate_with_rate(&format!("motif{i}"), 1.0);
        assert!(
            e.meaning.contains("ember") && e.meaning.contains("frost"),
            "lexicon motif not used: {}",
            e.meaning
        );
    }
}

#[test]
fn lexicon_bias_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let mut lexicons: HashMap<String, Lexicon> = HashMap::new();
    for &name in ANCHORS.iter() {
        lexicons.insert(
            name.to_string(),
            Lexicon {
                adjectives: vec!["umbral".to_string()],
                nouns: vec!["tessera".to_string()],
                verbs: vec!["kindles".to_string()],
                ..Lexicon::default()
            },
        );
    }
    lexicon::write_lexicons(&lexicons, dir.path()).unwrap();

    let make = || EngineContext::new(EngineConfig::default()).with_lexicon_dir(dir.path());
    let a: Vec<String> = (0..10)
        .map(|i| make().generate_with_rate(&format!("b{i}"), 0.0).meaning)
        .collect();
    let b: Vec<String> = (0..10)
        .map(|i| make().generate_with_rate(&format!("b{i}"), 0.0).meaning)
        .collect();
    assert_eq!(a, b);
}
