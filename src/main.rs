//! Zyntalic CLI — generate, train, mine lexicons, translate.
//!
//! Usage:
//!   zyntalic generate --n 1000 --out words.tsv
//!   zyntalic train --corpus anchors.tsv --method procrustes
//!   zyntalic lexicon --corpus anchors.tsv --out lexicon
//!   zyntalic translate --text "The sea whispered to the sky."

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zyntalic::engine::{self, EngineConfig, EngineContext};
use zyntalic::errors::{Result, ZyntalicError};
use zyntalic::lexicon;
use zyntalic::projection::{self, TrainConfig, TrainMethod};
use zyntalic::translate::{OutputFormat, TranslationStrategy, Translator};

#[derive(Parser)]
#[command(name = "zyntalic", version, about = "Zyntalic — deterministic semantic generation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a deterministic wordlist
    Generate {
        /// Number of entries
        #[arg(short, long, default_value = "1000")]
        n: usize,
        /// Output TSV path (prints to stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Root seed for the wordlist
        #[arg(long, default_value = "zyntalic_default")]
        root_seed: String,
        /// Lexicon directory
        #[arg(long, default_value = "lexicon")]
        lexicon_dir: PathBuf,
        /// Trained projection directory
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,
        /// Ignore any trained projection
        #[arg(long)]
        no_proj: bool,
        /// Probability of the mirrored production
        #[arg(long, default_value = "0.8")]
        mirror_rate: f64,
        /// Embedding dimension
        #[arg(long, default_value = "300")]
        dim: usize,
    },
    /// Train a projection from an anchor corpus
    Train {
        /// Corpus TSV: anchor-id <TAB> excerpt
        #[arg(long, default_value = "anchors.tsv")]
        corpus: PathBuf,
        /// Training method: procrustes or ridge
        #[arg(long, default_value = "procrustes")]
        method: String,
        /// Ridge regularization strength
        #[arg(long, default_value = "0.001")]
        ridge_lambda: f32,
        /// Embedding dimension
        #[arg(long, default_value = "300")]
        dim: usize,
        /// Artifact output directory
        #[arg(long, default_value = "models")]
        out_dir: PathBuf,
    },
    /// Mine per-anchor lexicons from an anchor corpus
    Lexicon {
        /// Corpus TSV: anchor-id <TAB> excerpt
        #[arg(long)]
        corpus: PathBuf,
        /// Output directory, one JSON file per anchor
        #[arg(short, long, default_value = "lexicon")]
        out: PathBuf,
        /// Words kept per part-of-speech bucket
        #[arg(long, default_value = "24")]
        topk: usize,
    },
    /// Translate a text passage sentence by sentence
    Translate {
        /// Input file (use --text for inline input)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Inline input text
        #[arg(short, long)]
        text: Option<String>,
        /// Strategy: chiasmus or rule-based
        #[arg(long, default_value = "chiasmus")]
        strategy: String,
        /// Output format: text, tsv, or jsonl
        #[arg(long, default_value = "text")]
        format: String,
        /// Probability of the mirrored production
        #[arg(long, default_value = "0.8")]
        mirror_rate: f64,
        /// Lexicon directory
        #[arg(long, default_value = "lexicon")]
        lexicon_dir: PathBuf,
        /// Trained projection directory
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,
        /// Embedding dimension
        #[arg(long, default_value = "300")]
        dim: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Generate {
            n,
            out,
            root_seed,
            lexicon_dir,
            models_dir,
            no_proj,
            mirror_rate,
            dim,
        } => cmd_generate(
            n,
            out.as_deref(),
            &root_seed,
            &lexicon_dir,
            &models_dir,
            no_proj,
            mirror_rate,
            dim,
        ),
        Commands::Train {
            corpus,
            method,
            ridge_lambda,
            dim,
            out_dir,
        } => cmd_train(&corpus, &method, ridge_lambda, dim, &out_dir),
        Commands::Lexicon { corpus, out, topk } => cmd_lexicon(&corpus, &out, topk),
        Commands::Translate {
            file,
            text,
            strategy,
            format,
            mirror_rate,
            lexicon_dir,
            models_dir,
            dim,
        } => cmd_translate(
            file.as_deref(),
            text.as_deref(),
            &strategy,
            &format,
            mirror_rate,
            &lexicon_dir,
            &models_dir,
            dim,
        ),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn build_context(
    dim: usize,
    mirror_rate: f64,
    lexicon_dir: &Path,
    models_dir: &Path,
    no_proj: bool,
) -> EngineContext {
    let config = EngineConfig {
        dim,
        mirror_rate,
        ..EngineConfig::default()
    };
    let mut ctx = EngineContext::new(config).with_lexicon_dir(lexicon_dir);
    if !no_proj {
        ctx = ctx.with_projection_dir(models_dir);
    }
    ctx
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    n: usize,
    out: Option<&Path>,
    root_seed: &str,
    lexicon_dir: &Path,
    models_dir: &Path,
    no_proj: bool,
    mirror_rate: f64,
    dim: usize,
) -> Result<()> {
    let ctx = build_context(dim, mirror_rate, lexicon_dir, models_dir, no_proj);
    let entries = ctx.generate_words(n, root_seed);
    eprintln!("[generate] {} entries (root_seed={root_seed})", entries.len());

    match out {
        Some(path) => {
            let mut file =
                fs::File::create(path).map_err(|e| ZyntalicError::Io(e.to_string()))?;
            engine::export_tsv(&entries, &mut file)?;
            eprintln!("[generate] Written: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            engine::export_tsv(&entries, &mut stdout)?;
        }
    }
    Ok(())
}

fn cmd_train(
    corpus: &Path,
    method: &str,
    ridge_lambda: f32,
    dim: usize,
    out_dir: &Path,
) -> Result<()> {
    let method = TrainMethod::parse(method)?;
    let rows = lexicon::read_corpus_tsv(corpus)?;
    eprintln!("[train] {} corpus rows (method={})", rows.len(), method.as_str());

    let space = zyntalic::embedding::EmbeddingSpace::new(dim);
    let config = TrainConfig {
        method,
        ridge_lambda,
        ..TrainConfig::default()
    };
    let (proj, meta) = projection::train(&space, &rows, &config)?;
    projection::save_artifacts(&proj, &meta, out_dir)?;

    eprintln!(
        "[train] top-1 accuracy: {:.1}% over {} held-out excerpts",
        meta.top1_accuracy * 100.0,
        meta.test_examples
    );
    eprintln!("[train] Written: {}", out_dir.display());
    Ok(())
}

fn cmd_lexicon(corpus: &Path, out: &Path, topk: usize) -> Result<()> {
    let rows = lexicon::read_corpus_tsv(corpus)?;
    let lexicons = lexicon::build_lexicons(&rows, topk);
    lexicon::write_lexicons(&lexicons, out)?;
    eprintln!(
        "[lexicon] {} anchors mined from {} rows, written to {}",
        lexicons.len(),
        rows.len(),
        out.display()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_translate(
    file: Option<&Path>,
    text: Option<&str>,
    strategy: &str,
    format: &str,
    mirror_rate: f64,
    lexicon_dir: &Path,
    models_dir: &Path,
    dim: usize,
) -> Result<()> {
    let strategy = TranslationStrategy::parse(strategy)?;
    let format = OutputFormat::parse(format)?;
    let input = match (file, text) {
        (Some(path), None) => {
            fs::read_to_string(path).map_err(|e| ZyntalicError::Io(e.to_string()))?
        }
        (None, Some(text)) => text.to_string(),
        _ => {
            return Err(ZyntalicError::InvalidInput(
                "provide exactly one of --file or --text".into(),
            ))
        }
    };

    let ctx = build_context(dim, mirror_rate, lexicon_dir, models_dir, false);
    let translator = Translator::new(&ctx, strategy);
    let rows = translator.translate_text(&input)?;

    let rendered = match format {
        OutputFormat::Text => zyntalic::translate::render_text(&rows),
        OutputFormat::Tsv => zyntalic::translate::render_tsv(&rows),
        OutputFormat::Jsonl => zyntalic::translate::render_jsonl(&rows)?,
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered.trim_end_matches('\n'))
        .map_err(|e| ZyntalicError::Io(e.to_string()))?;
    Ok(())
}
