//! Sentence composer — mirrored (chiasmus) and plain productions.
//!
//! Two terminal productions, selected by comparing one draw from the
//! caller's stream against the mirror rate:
//!   - mirrored: a motif pair (A, B) substituted into a chiastic
//!     template, so the two half-clauses use the same pair with roles
//!     reversed — the defining mirror invariant;
//!   - plain: one adjective, one noun, one verb sampled from the union
//!     of the resolved anchors' lexicon lists, smoothed with a small
//!     fixed base vocabulary so a valid sample always exists.
//! A context annotation is appended to every full sentence as its final
//! element; it is structural metadata, not prose.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::lexicon::{LexField, LexiconStore};
use crate::token::{self, Pos};

// ---------------------------------------------------------------------------
// Fixed inventories
// ---------------------------------------------------------------------------

pub const TEMPLATES: [&str; 4] = [
    "To {A} through {B}; to {B} through {A}.",
    "{A} begets {B}, and {B} reframes {A}.",
    "Seek {A} by {B}; keep {B} by {A}.",
    "Between {A} and {B}, the path mirrors back from {B} to {A}.",
];

const BASE_ADJECTIVES: [&str; 5] = ["bright", "mysterious", "ancient", "vivid", "whimsical"];
const BASE_NOUNS: [&str; 5] = ["journey", "whisper", "echo", "saga", "pattern"];
const BASE_VERBS: [&str; 4] = ["weaves", "reveals", "hides", "balances"];

/// Constant weight of base-vocabulary items mixed into every pool.
const BASE_WEIGHT: f64 = 0.2;

/// Fallback motif pool when no anchor lexicon declares any.
const DEFAULT_MOTIFS: [(&str, &str); 8] = [
    ("light", "dark"),
    ("order", "chaos"),
    ("silence", "noise"),
    ("rise", "fall"),
    ("future", "past"),
    ("open", "closed"),
    ("presence", "absence"),
    ("truth", "doubt"),
];

// ---------------------------------------------------------------------------
// Weighted sampling
// ---------------------------------------------------------------------------

/// Single-pass cumulative weighted sample: one uniform draw in
/// [0, total), first index whose cumulative weight meets it.
pub fn weighted_sample_index(rng: &mut ChaCha8Rng, weights: &[f64]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let r = rng.gen::<f64>() * total;
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if r <= acc {
            return Some(i);
        }
    }
    Some(weights.len() - 1)
}

/// Union of the resolved anchors' lexicon lists (weight = resolver weight
/// raised to `sharpen`) smoothed with the base vocabulary at low weight.
fn mixed_pool(
    anchors: &[(String, f32)],
    store: &LexiconStore,
    field: LexField,
    base: &[&str],
    sharpen: f64,
) -> (Vec<String>, Vec<f64>) {
    let mut pool = Vec::new();
    let mut weights = Vec::new();
    for (name, w) in anchors {
        if let Some(lex) = store.get(name) {
            for item in lex.field(field) {
                pool.push(item.clone());
                weights.push((*w as f64).powf(sharpen).max(1e-6));
            }
        }
    }
    for item in base {
        pool.push((*item).to_string());
        weights.push(BASE_WEIGHT);
    }
    (pool, weights)
}

fn sample_or_base(
    rng: &mut ChaCha8Rng,
    mut pool: Vec<String>,
    weights: Vec<f64>,
    base: &[&str],
) -> String {
    match weighted_sample_index(rng, &weights) {
        Some(i) => pool.swap_remove(i),
        None => base[rng.gen_range(0..base.len())].to_string(),
    }
}

// ---------------------------------------------------------------------------
// Productions
// ---------------------------------------------------------------------------

/// Pick a motif pair: lexicon-weighted across the anchor set, falling
/// back to the fixed default pool when no lexicon motifs exist.
fn choose_motif(
    rng: &mut ChaCha8Rng,
    anchors: &[(String, f32)],
    store: &LexiconStore,
) -> (String, String) {
    let mut pool: Vec<(String, String)> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();
    for (name, w) in anchors {
        if let Some(lex) = store.get(name) {
            for pair in lex.motif_pairs() {
                pool.push(pair);
                weights.push((*w as f64).max(1e-6));
            }
        }
    }
    if !pool.is_empty() {
        if let Some(i) = weighted_sample_index(rng, &weights) {
            return pool.swap_remove(i);
        }
    }
    let i = ((rng.gen::<f64>() * DEFAULT_MOTIFS.len() as f64) as usize)
        .min(DEFAULT_MOTIFS.len() - 1);
    let (a, b) = DEFAULT_MOTIFS[i];
    (a.to_string(), b.to_string())
}

/// Chiasmus production: both half-clauses use the motif pair with
/// swapped roles.
pub fn mirrored(
    rng: &mut ChaCha8Rng,
    anchors: &[(String, f32)],
    store: &LexiconStore,
) -> String {
    let (a, b) = choose_motif(rng, anchors, store);
    let template = TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
    template.replace("{A}", &a).replace("{B}", &b)
}

/// Plain production: lexicon-weighted adjective/noun/verb slots.
pub fn plain(
    rng: &mut ChaCha8Rng,
    anchors: &[(String, f32)],
    store: &LexiconStore,
    sharpen: f64,
) -> String {
    let (pool, w) = mixed_pool(anchors, store, LexField::Adjectives, &BASE_ADJECTIVES, sharpen);
    let adj = sample_or_base(rng, pool, w, &BASE_ADJECTIVES);
    let (pool, w) = mixed_pool(anchors, store, LexField::Nouns, &BASE_NOUNS, sharpen);
    let noun = sample_or_base(rng, pool, w, &BASE_NOUNS);
    let (pool, w) = mixed_pool(anchors, store, LexField::Verbs, &BASE_VERBS, sharpen);
    let verb = sample_or_base(rng, pool, w, &BASE_VERBS);
    format!("A {adj} {noun} {verb} itself.")
}

/// Select the production by mirror rate; the comparison draw comes first
/// on the caller's stream.
pub fn compose(
    rng: &mut ChaCha8Rng,
    anchors: &[(String, f32)],
    store: &LexiconStore,
    mirror_rate: f64,
    sharpen: f64,
) -> String {
    if rng.gen::<f64>() < mirror_rate {
        mirrored(rng, anchors, store)
    } else {
        plain(rng, anchors, store, sharpen)
    }
}

// ---------------------------------------------------------------------------
// Context annotation
// ---------------------------------------------------------------------------

/// Fixed-format trailing annotation: lemma, coarse POS guess, and the
/// ordered resolved anchor names. Always the last element of the output.
pub fn make_context(token: &str, anchors: &[(String, f32)], pos: Pos) -> String {
    let lemma = token::lemmatize(token);
    let names: Vec<&str> = anchors.iter().map(|(n, _)| n.as_str()).collect();
    format!("⟦ctx: lemma={lemma}; pos≈{pos}; anchors={}⟧", names.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng;

    fn anchors3() -> Vec<(String, f32)> {
        vec![
            ("Homer_Iliad".to_string(), 0.5),
            ("Laozi_TaoTeChing".to_string(), 0.3),
            ("Spinoza_Ethics".to_string(), 0.2),
        ]
    }

    #[test]
    fn test_weighted_sample_single_pass() {
        let mut r = rng::derive("sample");
        let weights = vec![0.1, 0.7, 0.2];
        let i = weighted_sample_index(&mut r, &weights).unwrap();
        assert!(i < 3);
        // deterministic given the stream
        let mut r2 = rng::derive("sample");
        assert_eq!(weighted_sample_index(&mut r2, &weights), Some(i));
    }

    #[test]
    fn test_weighted_sample_empty_pool() {
        let mut r = rng::derive("empty");
        assert_eq!(weighted_sample_index(&mut r, &[]), None);
        assert_eq!(weighted_sample_index(&mut r, &[0.0, 0.0]), None);
    }

    #[test]
    fn test_mirrored_uses_swapped_pair() {
        let store = LexiconStore::empty();
        let mut r = rng::derive("mirror-test");
        let s = mirrored(&mut r, &anchors3(), &store);
        // every template mentions both motif terms at least twice in total
        let found = DEFAULT_MOTIFS
            .iter()
            .any(|(a, b)| s.matches(a).count() >= 1 && s.matches(b).count() >= 1);
        assert!(found, "no default motif pair in: {s}");
    }

    #[test]
    fn test_template_symmetry() {
        // substituting (A, B) then swapping terms equals substituting (B, A)
        for t in TEMPLATES {
            let ab = t.replace("{A}", "alpha").replace("{B}", "beta");
            let ba = t.replace("{A}", "beta").replace("{B}", "alpha");
            let swapped = ab
                .replace("alpha", "\u{0}")
                .replace("beta", "alpha")
                .replace('\u{0}', "beta");
            assert_eq!(swapped, ba, "template not symmetric: {t}");
        }
    }

    #[test]
    fn test_plain_shape_with_empty_lexicons() {
        let store = LexiconStore::empty();
        let mut r = rng::derive("plain-test");
        let s = plain(&mut r, &anchors3(), &store, 1.0);
        assert!(s.starts_with("A "));
        assert!(s.ends_with(" itself."));
        assert_eq!(s.split_whitespace().count(), 5);
    }

    #[test]
    fn test_context_format() {
        let ctx = make_context("bavoł", &anchors3(), Pos::Verb);
        assert!(ctx.starts_with("⟦ctx: lemma=bavo; pos≈verb; anchors="));
        assert!(ctx.ends_with("⟧"));
        assert!(ctx.contains("Homer_Iliad|Laozi_TaoTeChing|Spinoza_Ethics"));
    }
}
