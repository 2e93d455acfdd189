//! Zyntalic — deterministic semantic generation engine.
//!
//! Core mapping:
//!   - Seed key → ChaCha8 stream (SHA-256 prefix of the key)
//!   - Token = 3 syllables, Hangul blocks + Polish clusters
//!   - Embedding = seeded vector, optionally projected onto the
//!     anchor manifold by a trained orthogonal/ridge map
//!   - Anchors = top-K cosine neighbours with softmax weights
//!   - Sentence = mirrored (chiastic) or plain production, biased by
//!     per-anchor lexicons, closed by a context annotation

pub mod errors;
pub mod rng;
pub mod anchors;
pub mod embedding;
pub mod resolver;
pub mod token;
pub mod lexicon;
pub mod sentence;
pub mod projection;
pub mod engine;
pub mod translate;
