//! Per-anchor lexicons: vocabulary lists that bias sentence sampling.
//!
//! The store loads one JSON document per anchor from a directory and
//! caches the result for the process lifetime — pure lookup after load,
//! never invalidated. Malformed or unreadable files are skipped
//! individually; the engine continues with whatever parsed.
//!
//! The builder half mines lexicons from an anchor corpus TSV: frequency
//! buckets split into adjective/noun/verb lists by a suffix heuristic,
//! plus motif pairs matched against a fixed thematic inventory.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{Result, ZyntalicError};

// ---------------------------------------------------------------------------
// Lexicon record
// ---------------------------------------------------------------------------

/// One anchor's vocabulary. Unknown JSON keys are ignored, missing keys
/// default to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(default)]
    pub adjectives: Vec<String>,
    #[serde(default)]
    pub nouns: Vec<String>,
    #[serde(default)]
    pub verbs: Vec<String>,
    #[serde(default)]
    pub motifs: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexField {
    Adjectives,
    Nouns,
    Verbs,
}

impl Lexicon {
    pub fn field(&self, field: LexField) -> &[String] {
        match field {
            LexField::Adjectives => &self.adjectives,
            LexField::Nouns => &self.nouns,
            LexField::Verbs => &self.verbs,
        }
    }

    /// Motif entries that are well-formed two-element pairs; anything
    /// else is silently dropped.
    pub fn motif_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.motifs
            .iter()
            .filter(|p| p.len() == 2)
            .map(|p| (p[0].clone(), p[1].clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.adjectives.is_empty()
            && self.nouns.is_empty()
            && self.verbs.is_empty()
            && self.motifs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// LexiconStore
// ---------------------------------------------------------------------------

/// Lazily-loaded, immutable map anchor → lexicon.
///
/// Loading is idempotent and pure, so a compute-if-absent race at worst
/// duplicates work.
pub struct LexiconStore {
    dir: Option<PathBuf>,
    cache: OnceCell<HashMap<String, Lexicon>>,
}

impl LexiconStore {
    /// A store with no backing directory; every lookup misses.
    pub fn empty() -> Self {
        Self {
            dir: None,
            cache: OnceCell::new(),
        }
    }

    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            cache: OnceCell::new(),
        }
    }

    pub fn lexicons(&self) -> &HashMap<String, Lexicon> {
        self.cache.get_or_init(|| match &self.dir {
            Some(dir) => load_dir(dir),
            None => HashMap::new(),
        })
    }

    pub fn get(&self, anchor: &str) -> Option<&Lexicon> {
        self.lexicons().get(anchor)
    }
}

fn load_dir(dir: &Path) -> HashMap<String, Lexicon> {
    let mut out = HashMap::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return out, // a missing directory is simply empty
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(anchor) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<Lexicon>(&s).map_err(|e| e.to_string()));
        match parsed {
            Ok(lexicon) => {
                out.insert(anchor.to_string(), lexicon);
            }
            Err(err) => warn!(file = %path.display(), %err, "skipping unreadable lexicon"),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Corpus TSV
// ---------------------------------------------------------------------------

/// Read a training corpus: `anchor-id \t excerpt` per line. Blank lines
/// and lines starting with `#` are ignored, as are rows with fewer than
/// two columns.
pub fn read_corpus_tsv(path: &Path) -> Result<Vec<(String, String)>> {
    let content = fs::read_to_string(path)
        .map_err(|e| ZyntalicError::Io(format!("{}: {e}", path.display())))?;
    let mut rows = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '\t');
        let (Some(anchor), Some(excerpt)) = (parts.next(), parts.next()) else {
            continue;
        };
        rows.push((anchor.to_string(), excerpt.to_string()));
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Builder: suffix-heuristic POS classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordClass {
    Adjective,
    Verb,
    Noun,
}

const ADJ_SUFFIXES: [&str; 17] = [
    "ous", "ful", "ive", "al", "able", "less", "ic", "ish", "ent", "ant", "ate", "ory", "ile",
    "ern", "arian", "esque", "ean",
];
const VERB_SUFFIXES: [&str; 7] = ["ing", "ed", "en", "ify", "ise", "ize", "ate"];

/// Classify a word by suffix. Adjective suffixes win over verb suffixes
/// ("ate" is in both lists); everything unmatched is a noun. An
/// approximation: a misfiled word only shifts sampling bias.
pub fn classify(word: &str) -> WordClass {
    if ADJ_SUFFIXES.iter().any(|s| word.ends_with(s)) {
        WordClass::Adjective
    } else if VERB_SUFFIXES.iter().any(|s| word.ends_with(s)) {
        WordClass::Verb
    } else {
        WordClass::Noun
    }
}

// ---------------------------------------------------------------------------
// Builder: mining lexicons from corpus rows
// ---------------------------------------------------------------------------

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    "a an and are as at be by for from has he her his i in is it its of on or she that the \
     their them they this to was were will with you your yours our us we am been being but \
     not so if then there here into out up down over under again further once only same too \
     very"
        .split_whitespace()
        .collect()
});

/// Thematic pairs a mined motif list is drawn from.
const MOTIF_INVENTORY: [(&str, &str); 27] = [
    ("honor", "shame"),
    ("wrath", "mercy"),
    ("fate", "choice"),
    ("camp", "field"),
    ("home", "exile"),
    ("cunning", "force"),
    ("sea", "shore"),
    ("trial", "rest"),
    ("justice", "power"),
    ("reason", "desire"),
    ("order", "chaos"),
    ("truth", "appearance"),
    ("sin", "grace"),
    ("error", "path"),
    ("descent", "ascent"),
    ("shadow", "light"),
    ("obsession", "rest"),
    ("hunt", "escape"),
    ("storm", "calm"),
    ("error", "truth"),
    ("idol", "method"),
    ("experiment", "theory"),
    ("use", "speculation"),
    ("doubt", "certainty"),
    ("mind", "body"),
    ("cause", "effect"),
    ("clear", "confused"),
];

/// Lowercased alphabetic tokens (apostrophes kept inside words).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphabetic() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Split the most frequent tokens into capped adjective/noun/verb
/// buckets. Ties are broken alphabetically so the output is stable.
fn bucketize(tokens: &[String], topk: usize) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for t in tokens {
        *freq.entry(t.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, usize)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let mut adjs = Vec::new();
    let mut nouns = Vec::new();
    let mut verbs = Vec::new();
    for (word, _) in ranked.into_iter().take(4 * topk) {
        if word.chars().count() <= 2 || STOPWORDS.contains(word) {
            continue;
        }
        let bucket = match classify(word) {
            WordClass::Adjective => &mut adjs,
            WordClass::Verb => &mut verbs,
            WordClass::Noun => &mut nouns,
        };
        if bucket.len() < topk && !bucket.contains(&word.to_string()) {
            bucket.push(word.to_string());
        }
    }
    (adjs, nouns, verbs)
}

/// Motif pairs whose either term occurs in the token set, capped at 8;
/// a fixed fallback when nothing matches.
fn mine_motifs(tokens: &[String]) -> Vec<Vec<String>> {
    let present: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
    let mut motifs: Vec<Vec<String>> = MOTIF_INVENTORY
        .iter()
        .filter(|(a, b)| present.contains(a) || present.contains(b))
        .map(|(a, b)| vec![a.to_string(), b.to_string()])
        .collect();
    if motifs.is_empty() {
        motifs = vec![
            vec!["order".to_string(), "chaos".to_string()],
            vec!["shadow".to_string(), "light".to_string()],
        ];
    }
    motifs.truncate(8);
    motifs
}

/// Mine one lexicon per anchor from corpus rows.
pub fn build_lexicons(rows: &[(String, String)], topk: usize) -> HashMap<String, Lexicon> {
    let mut grouped: HashMap<&str, Vec<String>> = HashMap::new();
    for (anchor, text) in rows {
        grouped.entry(anchor.as_str()).or_default().extend(tokenize(text));
    }
    grouped
        .into_iter()
        .map(|(anchor, tokens)| {
            let (adjectives, nouns, verbs) = bucketize(&tokens, topk);
            let motifs = mine_motifs(&tokens);
            (
                anchor.to_string(),
                Lexicon {
                    adjectives,
                    nouns,
                    verbs,
                    motifs,
                },
            )
        })
        .collect()
}

/// Write each lexicon to `<dir>/<anchor>.json`.
pub fn write_lexicons(lexicons: &HashMap<String, Lexicon>, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ZyntalicError::Io(e.to_string()))?;
    for (anchor, lexicon) in lexicons {
        let json = serde_json::to_string_pretty(lexicon)
            .map_err(|e| ZyntalicError::Io(e.to_string()))?;
        fs::write(dir.join(format!("{anchor}.json")), json)
            .map_err(|e| ZyntalicError::Io(e.to_string()))?;
    }
    Ok(())
}
