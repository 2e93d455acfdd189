//! Embedding space — base embeddings and anchor centroids.
//!
//! Produces a fixed-dimension vector for any text key and holds one
//! L2-normalized centroid per anchor, computed once per process.
//!
//! Two sources for base embeddings:
//!   - Default: every component drawn from the key's own seeded stream,
//!     so the vector is a pure function of the key.
//!   - Pluggable: a `TextEmbedder` implementation (a real model). Its
//!     output is truncated from the front or padded with key-seeded
//!     values to fit the configured dimension.
//!
//! All similarity comparisons downstream use L2-normalized vectors and
//! dot product (cosine similarity).

use once_cell::sync::OnceCell;
use rand::Rng;

use crate::anchors::{self, ANCHORS};
use crate::rng;

// ---------------------------------------------------------------------------
// Vector helpers
// ---------------------------------------------------------------------------

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2-normalize. A zero vector stays zero: the norm is floored at 1.0
/// instead of dividing by zero.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let n = l2_norm(v);
    let n = if n > 1e-12 { n } else { 1.0 };
    v.iter().map(|x| x / n).collect()
}

/// Weighted mix of vectors (all the same length as the first).
pub fn mix(vecs: &[&[f32]], weights: &[f32]) -> Vec<f32> {
    let dim = vecs.first().map(|v| v.len()).unwrap_or(0);
    let mut out = vec![0.0f32; dim];
    for (v, &w) in vecs.iter().zip(weights.iter()) {
        for (o, &x) in out.iter_mut().zip(v.iter()) {
            *o += w * x;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// TextEmbedder — plug-in hook for a real embedding model
// ---------------------------------------------------------------------------

/// A real text embedder. Implementations must be deterministic for
/// identical input; the engine's reproducibility guarantee depends on it.
pub trait TextEmbedder: Send + Sync {
    /// Embed a text into the model's native dimension.
    fn embed(&self, text: &str) -> Vec<f32>;
}

// ---------------------------------------------------------------------------
// EmbeddingSpace
// ---------------------------------------------------------------------------

/// Base embeddings plus the per-anchor centroid cache.
///
/// The centroid table is computed on first use and immutable afterwards.
/// Recomputing under a cache race is wasteful but harmless: the
/// computation is pure and deterministic.
pub struct EmbeddingSpace {
    /// Embedding dimension (default 300).
    pub dim: usize,
    embedder: Option<Box<dyn TextEmbedder>>,
    centroids: OnceCell<Vec<(String, Vec<f32>)>>,
}

impl EmbeddingSpace {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            embedder: None,
            centroids: OnceCell::new(),
        }
    }

    /// Use a real embedder instead of the seeded default.
    pub fn with_embedder(mut self, embedder: Box<dyn TextEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Base embedding for a text key.
    ///
    /// The seeded default draws one component per dimension from the
    /// `embed::<key>` stream — namespaced so it never aliases the token
    /// stream derived from the same key.
    pub fn base_embedding(&self, key: &str) -> Vec<f32> {
        match &self.embedder {
            Some(embedder) => self.fit_dim(embedder.embed(key), key),
            None => {
                let mut rng = rng::derive(&format!("embed::{key}"));
                (0..self.dim).map(|_| rng.gen::<f32>()).collect()
            }
        }
    }

    /// Fit a native-dimension vector to `self.dim`: truncate from the
    /// front, or pad with values from a key-seeded stream so padding is
    /// itself deterministic.
    fn fit_dim(&self, mut v: Vec<f32>, key: &str) -> Vec<f32> {
        if v.len() > self.dim {
            return v.split_off(v.len() - self.dim);
        }
        if v.len() < self.dim {
            let mut rng = rng::derive(&format!("embed-pad::{key}"));
            while v.len() < self.dim {
                v.push(rng.gen::<f32>());
            }
        }
        v
    }

    /// One L2-normalized centroid per anchor, in declaration order.
    /// Built once, cached for the process lifetime.
    pub fn anchor_centroids(&self) -> &[(String, Vec<f32>)] {
        self.centroids.get_or_init(|| {
            ANCHORS
                .iter()
                .map(|&name| {
                    let vec = normalize(&self.base_embedding(&anchors::label(name)));
                    (name.to_string(), vec)
                })
                .collect()
        })
    }
}
