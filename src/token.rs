//! Token forge — synthetic surface tokens from a seed key.
//!
//! Tokens are three syllables mixing two alphabet families:
//!   - composed Hangul blocks (choseong + jungseong + jongseong folded
//!     into one code point) — the native family for nouns;
//!   - Polish-flavoured Latin consonant-vowel(-consonant) clusters — the
//!     native family for verbs.
//! Each syllable emits from its native family with probability 0.85 and
//! crosses over with probability 0.15. A marker glyph is fused onto the
//! second syllable with probability 0.3 to simulate a morphological
//! suffix. Everything is drawn from the seed key's own stream; no draw
//! touches any other randomness source.

use std::fmt;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::rng;

// ---------------------------------------------------------------------------
// Alphabet inventories
// ---------------------------------------------------------------------------

pub const CHOSEONG: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ',
    'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

pub const JUNGSEONG: [char; 21] = [
    'ㅏ', 'ㅐ', 'ㅑ', 'ㅒ', 'ㅓ', 'ㅔ', 'ㅕ', 'ㅖ', 'ㅗ', 'ㅘ', 'ㅙ', 'ㅚ', 'ㅛ', 'ㅜ', 'ㅝ',
    'ㅞ', 'ㅟ', 'ㅠ', 'ㅡ', 'ㅢ', 'ㅣ',
];

pub const JONGSEONG: [&str; 28] = [
    "", "ㄱ", "ㄲ", "ㄳ", "ㄴ", "ㄵ", "ㄶ", "ㄷ", "ㄹ", "ㄺ", "ㄻ", "ㄼ", "ㄽ", "ㄾ", "ㄿ",
    "ㅀ", "ㅁ", "ㅂ", "ㅄ", "ㅅ", "ㅆ", "ㅇ", "ㅈ", "ㅊ", "ㅋ", "ㅌ", "ㅍ", "ㅎ",
];

pub const POLISH_CONSONANTS: [char; 25] = [
    'b', 'c', 'ć', 'd', 'đ', 'f', 'g', 'h', 'j', 'k', 'l', 'ł', 'm', 'n', 'ń', 'p', 'r', 's',
    'ś', 't', 'v', 'w', 'z', 'ź', 'ż',
];

pub const POLISH_VOWELS: [char; 9] = ['a', 'ą', 'e', 'ę', 'i', 'o', 'ó', 'u', 'y'];

/// Marker glyphs fused onto the second syllable as a pseudo-suffix.
const MARKERS: [char; 4] = ['ł', 'ㅆ', 'ś', 'ㅇ'];

/// Suffixes stripped by lemmatization, longest first.
const LEMMA_SUFFIXES: [&str; 6] = ["ął", "었", "ㅆ", "ś", "ㅇ", "ł"];

// ---------------------------------------------------------------------------
// Part of speech
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pos {
    Noun,
    Verb,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noun => write!(f, "noun"),
            Self::Verb => write!(f, "verb"),
        }
    }
}

// ---------------------------------------------------------------------------
// Syllable construction
// ---------------------------------------------------------------------------

/// Fold choseong/jungseong/jongseong indices into one composed code point.
fn compose_block(l: usize, v: usize, t: usize) -> String {
    const S_BASE: u32 = 0xAC00;
    const V_COUNT: u32 = 21;
    const T_COUNT: u32 = 28;
    let code = S_BASE + (l as u32 * V_COUNT + v as u32) * T_COUNT + t as u32;
    match char::from_u32(code) {
        Some(c) => c.to_string(),
        None => format!("{}{}{}", CHOSEONG[l], JUNGSEONG[v], JONGSEONG[t]),
    }
}

fn hangul_syllable(rng: &mut ChaCha8Rng) -> String {
    let l = rng.gen_range(0..CHOSEONG.len());
    let swap = rng.gen::<f64>() < 0.25;
    let mut v = rng.gen_range(0..JUNGSEONG.len());
    if swap && JUNGSEONG[v] == 'ㅏ' {
        v = 2; // ㅏ → ㅑ
    }
    let t = rng.gen_range(0..JONGSEONG.len());
    compose_block(l, v, t)
}

fn latin_syllable(rng: &mut ChaCha8Rng) -> String {
    let c = POLISH_CONSONANTS[rng.gen_range(0..POLISH_CONSONANTS.len())];
    let v = POLISH_VOWELS[rng.gen_range(0..POLISH_VOWELS.len())];
    let tail = POLISH_CONSONANTS[rng.gen_range(0..POLISH_CONSONANTS.len())];
    let mut s = String::new();
    s.push(c);
    s.push(v);
    if rng.gen_range(0..2) == 1 {
        s.push(tail);
    }
    s
}

/// One syllable biased toward the native alphabet family for `pos`.
fn syllable(rng: &mut ChaCha8Rng, pos: Pos) -> String {
    let r = rng.gen::<f64>();
    match pos {
        Pos::Noun => {
            if r < 0.85 {
                hangul_syllable(rng)
            } else {
                latin_syllable(rng)
            }
        }
        Pos::Verb => {
            if r < 0.85 {
                latin_syllable(rng)
            } else {
                hangul_syllable(rng)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate a synthetic token deterministically from a seed key.
///
/// Without a POS hint each syllable's bias is itself drawn from the
/// stream; with a hint all three syllables use the hinted family.
pub fn make_token(seed_key: &str, pos_hint: Option<Pos>) -> String {
    let mut rng = rng::derive(seed_key);

    let mut syllables: Vec<String> = (0..3)
        .map(|_| {
            let pos = match pos_hint {
                Some(p) => p,
                None => {
                    if rng.gen_range(0..2) == 0 {
                        Pos::Noun
                    } else {
                        Pos::Verb
                    }
                }
            };
            syllable(&mut rng, pos)
        })
        .collect();

    if rng.gen::<f64>() < 0.3 {
        let marker = MARKERS[rng.gen_range(0..MARKERS.len())];
        syllables[1].push(marker);
    }

    syllables.concat()
}

/// Longest-match suffix stripping; at most one suffix is removed.
pub fn lemmatize(token: &str) -> &str {
    for suffix in LEMMA_SUFFIXES {
        if let Some(stripped) = token.strip_suffix(suffix) {
            return stripped;
        }
    }
    token
}

fn is_hangul(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{3131}'..='\u{318E}')
}

/// Coarse POS guess: noun if the token contains any character from the
/// native noun alphabet (composed Hangul block or jamo), else verb.
/// A heuristic approximation, not a linguistic contract.
pub fn guess_pos(token: &str) -> Pos {
    if token.chars().any(is_hangul) {
        Pos::Noun
    } else {
        Pos::Verb
    }
}
