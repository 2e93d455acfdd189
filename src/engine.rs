//! Generation engine — the full pipeline from a seed key to a
//! dictionary entry.
//!
//! An entry bundles the synthetic token, the composed core sentence
//! (its "meaning"), the full sentence with the trailing context
//! annotation, the resolved anchor weights, and the canonical
//! embedding. Every draw descends from the seed key, so identical
//! inputs and configuration always reproduce identical entries.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::embedding::{mix, normalize, EmbeddingSpace, TextEmbedder};
use crate::errors::{Result, ZyntalicError};
use crate::lexicon::LexiconStore;
use crate::projection::Projection;
use crate::resolver;
use crate::rng;
use crate::sentence;
use crate::token;

// ---------------------------------------------------------------------------
// Entry and configuration
// ---------------------------------------------------------------------------

/// One generated dictionary entry.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedEntry {
    /// Synthetic surface token.
    pub token: String,
    /// Core sentence, before the context annotation.
    pub meaning: String,
    /// Full sentence: core plus trailing context block.
    pub sentence: String,
    /// Resolved anchors with softmax weights, strongest first.
    pub anchors: Vec<(String, f32)>,
    /// Canonical embedding the anchors were resolved against.
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub dim: usize,
    pub top_k: usize,
    pub mirror_rate: f64,
    /// Exponent applied to anchor weights when biasing lexicon sampling.
    pub sharpen: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dim: 300,
            top_k: 3,
            mirror_rate: 0.8,
            sharpen: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// EngineContext
// ---------------------------------------------------------------------------

/// Everything generation needs: embedding space, lexicons, and an
/// optional trained projection. Construction never fails; a missing
/// projection or lexicon directory degrades the output, not the API.
pub struct EngineContext {
    pub config: EngineConfig,
    space: EmbeddingSpace,
    lexicons: LexiconStore,
    projection: Option<Projection>,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        let space = EmbeddingSpace::new(config.dim);
        Self {
            config,
            space,
            lexicons: LexiconStore::empty(),
            projection: None,
        }
    }

    pub fn with_lexicon_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.lexicons = LexiconStore::open(dir);
        self
    }

    /// Attach a projection loaded from `dir` if one exists for this
    /// dimension; otherwise keep the blend fallback.
    pub fn with_projection_dir(mut self, dir: &Path) -> Self {
        self.projection = Projection::load(dir, self.config.dim);
        if self.projection.is_none() {
            debug!(dir = %dir.display(), "no projection artifact; using blend fallback");
        }
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn with_embedder(mut self, embedder: Box<dyn TextEmbedder>) -> Self {
        self.space = EmbeddingSpace::new(self.config.dim).with_embedder(embedder);
        self
    }

    pub fn space(&self) -> &EmbeddingSpace {
        &self.space
    }

    /// Canonical embedding plus resolved anchor weights for a text.
    ///
    /// With a trained projection the base embedding is mapped onto the
    /// anchor manifold. Without one it is softly blended: half the base
    /// vector, half its own top-3 anchor centroids at their resolved
    /// weights.
    pub fn generate_embedding(&self, text: &str) -> (Vec<f32>, Vec<(String, f32)>) {
        let base = self.space.base_embedding(text);
        let centroids = self.space.anchor_centroids();
        let canon = match &self.projection {
            Some(proj) => proj.apply(&normalize(&base)),
            None => {
                let nearest = resolver::resolve(&base, centroids, 3);
                let mut vecs: Vec<&[f32]> = vec![&base];
                let mut weights: Vec<f32> = vec![0.5];
                for (name, w) in &nearest {
                    let idx = centroids.iter().position(|(n, _)| n == name);
                    if let Some(idx) = idx {
                        vecs.push(&centroids[idx].1);
                        weights.push(0.5 * w);
                    }
                }
                normalize(&mix(&vecs, &weights))
            }
        };
        let anchors = resolver::resolve(&canon, centroids, self.config.top_k);
        (canon, anchors)
    }

    pub fn generate(&self, seed_key: &str) -> GeneratedEntry {
        self.generate_with_rate(seed_key, self.config.mirror_rate)
    }

    /// Generate one entry, overriding the mirror rate.
    pub fn generate_with_rate(&self, seed_key: &str, mirror_rate: f64) -> GeneratedEntry {
        let mut entry_rng = rng::derive(seed_key);

        let tok = token::make_token(seed_key, None);
        let pos = token::guess_pos(&tok);

        let (embedding, anchors) = self.generate_embedding(seed_key);

        let meaning = sentence::compose(
            &mut entry_rng,
            &anchors,
            &self.lexicons,
            mirror_rate,
            self.config.sharpen,
        );
        let ctx = sentence::make_context(&tok, &anchors, pos);
        let full = format!("{meaning} {ctx}");

        GeneratedEntry {
            token: tok,
            meaning,
            sentence: full,
            anchors,
            embedding,
        }
    }

    /// Deterministic bulk generation: entry i is seeded `{root}:{i}`,
    /// duplicate tokens are skipped, and iteration stops after 10n
    /// attempts as a safety bound.
    pub fn generate_words(&self, n: usize, root_seed: &str) -> Vec<GeneratedEntry> {
        let mut out = Vec::with_capacity(n);
        let mut seen: HashSet<String> = HashSet::new();
        let mut i = 0usize;
        while out.len() < n {
            let seed = format!("{root_seed}:{i}");
            let entry = self.generate(&seed);
            if seen.insert(entry.token.clone()) {
                out.push(entry);
            }
            i += 1;
            if i > n * 10 {
                break;
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// TSV export
// ---------------------------------------------------------------------------

/// Tab-separated export, one entry per line:
/// token, core sentence, full sentence, `anchor:weight` list at 3
/// decimals joined by `;`, embedding components at 6 decimals joined
/// by `,`.
pub fn export_tsv<W: Write>(entries: &[GeneratedEntry], out: &mut W) -> Result<()> {
    for e in entries {
        let anchors_str = e
            .anchors
            .iter()
            .map(|(a, w)| format!("{a}:{w:.3}"))
            .collect::<Vec<_>>()
            .join(";");
        let emb_str = e
            .embedding
            .iter()
            .map(|v| format!("{v:.6}"))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            e.token, e.meaning, e.sentence, anchors_str, emb_str
        )
        .map_err(|e| ZyntalicError::Io(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> EngineContext {
        EngineContext::new(EngineConfig {
            dim: 64,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_entry_reproducible() {
        let a = ctx().generate("Love");
        let b = ctx().generate("Love");
        assert_eq!(a.token, b.token);
        assert_eq!(a.sentence, b.sentence);
        assert_eq!(a.anchors, b.anchors);
        assert_eq!(a.embedding, b.embedding);
    }

    #[test]
    fn test_entry_shape() {
        let e = ctx().generate("Love");
        assert!(!e.token.is_empty());
        assert_eq!(e.anchors.len(), 3);
        assert_eq!(e.embedding.len(), 64);
        let sum: f32 = e.anchors.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(e.sentence.starts_with(&e.meaning));
        assert!(e.sentence.ends_with('⟧'));
    }

    #[test]
    fn test_context_lists_resolved_anchors_in_order() {
        let e = ctx().generate("Love");
        let names: Vec<&str> = e.anchors.iter().map(|(n, _)| n.as_str()).collect();
        assert!(e.sentence.contains(&format!("anchors={}", names.join("|"))));
    }

    #[test]
    fn test_mirror_rate_extremes() {
        let engine = ctx();
        // rate 1.0 never yields the plain production shape
        for i in 0..10 {
            let e = engine.generate_with_rate(&format!("m{i}"), 1.0);
            assert!(!e.meaning.ends_with(" itself."), "plain at rate 1.0: {}", e.meaning);
        }
        // rate 0.0 always does
        for i in 0..10 {
            let e = engine.generate_with_rate(&format!("p{i}"), 0.0);
            assert!(e.meaning.ends_with(" itself."), "mirrored at rate 0.0: {}", e.meaning);
        }
    }

    #[test]
    fn test_bulk_generation_dedupes_and_reproduces() {
        let engine = ctx();
        let a = engine.generate_words(20, "bulk");
        let b = engine.generate_words(20, "bulk");
        assert_eq!(a.len(), 20);
        let tokens: HashSet<&str> = a.iter().map(|e| e.token.as_str()).collect();
        assert_eq!(tokens.len(), 20);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.sentence, y.sentence);
        }
    }

    #[test]
    fn test_root_seed_changes_wordlist() {
        let engine = ctx();
        let a = engine.generate_words(5, "alpha");
        let b = engine.generate_words(5, "beta");
        assert_ne!(
            a.iter().map(|e| &e.token).collect::<Vec<_>>(),
            b.iter().map(|e| &e.token).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_export_tsv_format() {
        let engine = ctx();
        let entries = engine.generate_words(3, "tsv");
        let mut buf = Vec::new();
        export_tsv(&entries, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let cols: Vec<&str> = line.split('\t').collect();
            assert_eq!(cols.len(), 5);
            assert_eq!(cols[3].split(';').count(), 3);
            assert_eq!(cols[4].split(',').count(), 64);
            assert!(cols[3].split(';').all(|p| p.contains(':')));
        }
    }

    #[test]
    fn test_projection_changes_embedding_not_determinism() {
        let space_dim = 16;
        let identity: Vec<f32> = (0..space_dim * space_dim)
            .map(|i| if i % (space_dim + 1) == 0 { 1.0 } else { 0.0 })
            .collect();
        let engine = EngineContext::new(EngineConfig {
            dim: space_dim,
            ..EngineConfig::default()
        })
        .with_projection(Projection {
            dim: space_dim,
            weights: identity,
        });
        let a = engine.generate("Love");
        let b = engine.generate("Love");
        assert_eq!(a.embedding, b.embedding);
        // identity projection normalizes the base embedding
        let norm: f32 = a.embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
