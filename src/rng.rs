//! Deterministic seeded RNG — the golden key of the engine.
//!
//! Every draw in Zyntalic flows from a ChaCha8 stream derived here.
//! Same key → same stream, every run, every process. The global RNG
//! is never touched, so concurrent derivations cannot interfere.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Collision-resistant string → integer seed.
///
/// The key is passed through SHA-256 and the first 4 bytes of the digest
/// (big-endian) become the seed, so nearby keys land on uncorrelated
/// streams. Never uses a language-level object hash.
pub fn derive_seed(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as u64
}

/// Derive an independent, reproducible random stream from a string key.
///
/// The empty string is a valid key and always yields the same stream.
pub fn derive(key: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(key))
}
