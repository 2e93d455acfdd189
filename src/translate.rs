//! Text translator — whole passages rendered into the synthetic
//! language, sentence by sentence.
//!
//! Two strategies:
//!   - chiasmus: each source sentence seeds one generated entry, so the
//!     output is a mirrored production semantically aligned to the
//!     sentence's resolved anchors;
//!   - rule-based: word-for-word token substitution that preserves the
//!     source punctuation, with one context annotation appended per
//!     sentence.
//! Both are pure functions of the input text and engine configuration.

use serde::Serialize;

use crate::engine::EngineContext;
use crate::errors::{Result, ZyntalicError};
use crate::sentence;
use crate::token::{self, Pos};

/// Upper bound on translated input, in characters.
pub const MAX_TEXT_LENGTH: usize = 200_000;

// ---------------------------------------------------------------------------
// Strategy and output format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationStrategy {
    Chiasmus,
    RuleBased,
}

impl TranslationStrategy {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "chiasmus" => Ok(Self::Chiasmus),
            "rule-based" | "rulebased" => Ok(Self::RuleBased),
            other => Err(ZyntalicError::Config(format!(
                "unknown strategy '{other}' (expected 'chiasmus' or 'rule-based')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Tsv,
    Jsonl,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "tsv" => Ok(Self::Tsv),
            "jsonl" => Ok(Self::Jsonl),
            other => Err(ZyntalicError::Config(format!(
                "unknown output format '{other}' (expected 'text', 'tsv', or 'jsonl')"
            ))),
        }
    }
}

/// One translated sentence with its anchor attribution.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationRow {
    pub source: String,
    pub target: String,
    pub anchors: Vec<(String, f32)>,
}

// ---------------------------------------------------------------------------
// Translator
// ---------------------------------------------------------------------------

pub struct Translator<'a> {
    ctx: &'a EngineContext,
    strategy: TranslationStrategy,
}

impl<'a> Translator<'a> {
    pub fn new(ctx: &'a EngineContext, strategy: TranslationStrategy) -> Self {
        Self { ctx, strategy }
    }

    /// Translate a passage sentence by sentence. Inputs longer than
    /// `MAX_TEXT_LENGTH` characters are rejected up front.
    pub fn translate_text(&self, text: &str) -> Result<Vec<TranslationRow>> {
        let len = text.chars().count();
        if len > MAX_TEXT_LENGTH {
            return Err(ZyntalicError::InvalidInput(format!(
                "text is {len} characters, maximum is {MAX_TEXT_LENGTH}"
            )));
        }
        let rows = split_sentences(text)
            .into_iter()
            .map(|s| match self.strategy {
                TranslationStrategy::Chiasmus => self.chiasmus_row(&s),
                TranslationStrategy::RuleBased => self.rule_based_row(&s),
            })
            .collect();
        Ok(rows)
    }

    fn chiasmus_row(&self, source: &str) -> TranslationRow {
        let entry = self.ctx.generate(source);
        TranslationRow {
            source: source.to_string(),
            target: entry.sentence,
            anchors: entry.anchors,
        }
    }

    /// Word-for-word substitution. Each alphabetic run becomes a token
    /// seeded by its lowercased form; everything else passes through.
    /// A single trailing sentence terminator is dropped so the context
    /// annotation stays the last element.
    fn rule_based_row(&self, source: &str) -> TranslationRow {
        let (_, anchors) = self.ctx.generate_embedding(source);

        let mut target = String::new();
        let mut first_token: Option<String> = None;
        let mut word = String::new();
        let mut hangul_chars = 0usize;
        let mut total_chars = 0usize;
        for c in source.chars() {
            if c.is_alphabetic() || c == '\'' {
                word.push(c);
                continue;
            }
            flush_word(&mut word, &mut target, &mut first_token, &mut hangul_chars, &mut total_chars);
            target.push(c);
        }
        flush_word(&mut word, &mut target, &mut first_token, &mut hangul_chars, &mut total_chars);

        let mut target = target.trim_end().to_string();
        if target.ends_with(['.', '!', '?']) {
            target.pop();
            target = target.trim_end().to_string();
        }

        let pos = if hangul_chars * 2 >= total_chars.max(1) {
            Pos::Noun
        } else {
            Pos::Verb
        };
        let head = first_token.unwrap_or_default();
        let ctx_block = sentence::make_context(&head, &anchors, pos);
        let target = if target.is_empty() {
            ctx_block
        } else {
            format!("{target} {ctx_block}")
        };

        TranslationRow {
            source: source.to_string(),
            target,
            anchors,
        }
    }
}

fn flush_word(
    word: &mut String,
    target: &mut String,
    first_token: &mut Option<String>,
    hangul_chars: &mut usize,
    total_chars: &mut usize,
) {
    if word.is_empty() {
        return;
    }
    let seed = word.to_lowercase();
    let tok = token::make_token(&seed, None);
    for c in tok.chars() {
        *total_chars += 1;
        if matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{3131}'..='\u{318E}') {
            *hangul_chars += 1;
        }
    }
    if first_token.is_none() {
        *first_token = Some(tok.clone());
    }
    target.push_str(&tok);
    word.clear();
}

/// Split after `.`, `!`, or `?` followed by whitespace or end of input.
/// Whitespace-only fragments are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let boundary = chars.peek().map(|n| n.is_whitespace()).unwrap_or(true);
            if boundary {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
                current.clear();
            }
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    out
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_text(rows: &[TranslationRow]) -> String {
    rows.iter()
        .map(|r| r.target.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_tsv(rows: &[TranslationRow]) -> String {
    let mut out = String::new();
    for r in rows {
        let anchors_str = r
            .anchors
            .iter()
            .map(|(a, w)| format!("{a}:{w:.3}"))
            .collect::<Vec<_>>()
            .join(";");
        out.push_str(&format!("{}\t{}\t{}\n", r.source, r.target, anchors_str));
    }
    out
}

pub fn render_jsonl(rows: &[TranslationRow]) -> Result<String> {
    let mut out = String::new();
    for r in rows {
        let line = serde_json::to_string(r).map_err(|e| ZyntalicError::Io(e.to_string()))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;

    fn engine() -> EngineContext {
        EngineContext::new(EngineConfig {
            dim: 64,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_split_sentences() {
        let s = split_sentences("One two. Three! Is it? Mr. X stays. tail");
        assert_eq!(
            s,
            vec!["One two.", "Three!", "Is it?", "Mr.", "X stays.", "tail"]
        );
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_chiasmus_rows_deterministic() {
        let ctx = engine();
        let t = Translator::new(&ctx, TranslationStrategy::Chiasmus);
        let a = t.translate_text("Silence first. The sea speaks.").unwrap();
        let b = t.translate_text("Silence first. The sea speaks.").unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].target, b[0].target);
        assert_eq!(a[0].source, "Silence first.");
        assert_eq!(a[0].anchors.len(), 3);
        assert!(a[0].target.ends_with('⟧'));
    }

    #[test]
    fn test_rule_based_preserves_punctuation() {
        let ctx = engine();
        let t = Translator::new(&ctx, TranslationStrategy::RuleBased);
        let rows = t.translate_text("Truth is a pathless land, yet we walk.").unwrap();
        assert_eq!(rows.len(), 1);
        let target = &rows[0].target;
        assert!(target.contains(','), "comma lost: {target}");
        // the trailing period is replaced by the context block
        assert!(target.ends_with('⟧'), "no context block: {target}");
        assert!(!target.contains(". ⟦"), "period kept: {target}");
    }

    #[test]
    fn test_rule_based_same_word_same_token() {
        let ctx = engine();
        let t = Translator::new(&ctx, TranslationStrategy::RuleBased);
        let rows = t.translate_text("sea sea.").unwrap();
        let body = rows[0].target.split(" ⟦").next().unwrap();
        let words: Vec<&str> = body.split_whitespace().collect();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], words[1]);
    }

    #[test]
    fn test_length_bound_enforced() {
        let ctx = engine();
        let t = Translator::new(&ctx, TranslationStrategy::Chiasmus);
        let long = "a".repeat(MAX_TEXT_LENGTH + 1);
        assert!(t.translate_text(&long).is_err());
        assert!(t.translate_text("short").is_ok());
    }

    #[test]
    fn test_renderers() {
        let ctx = engine();
        let t = Translator::new(&ctx, TranslationStrategy::Chiasmus);
        let rows = t.translate_text("One. Two.").unwrap();

        let text = render_text(&rows);
        assert_eq!(text.lines().count(), 2);

        let tsv = render_tsv(&rows);
        for line in tsv.lines() {
            assert_eq!(line.split('\t').count(), 3);
        }

        let jsonl = render_jsonl(&rows).unwrap();
        for line in jsonl.lines() {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(v.get("source").is_some());
            assert!(v.get("target").is_some());
            assert!(v.get("anchors").is_some());
        }
    }

    #[test]
    fn test_strategy_and_format_parse() {
        assert!(TranslationStrategy::parse("chiasmus").is_ok());
        assert!(TranslationStrategy::parse("rule-based").is_ok());
        assert!(TranslationStrategy::parse("literal").is_err());
        assert!(OutputFormat::parse("jsonl").is_ok());
        assert!(OutputFormat::parse("xml").is_err());
    }
}
