use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use legal_ingest::chunker::{DEFAULT_MAX_CHUNK_TOKENS, DEFAULT_OVERLAP_TOKENS};
use legal_ingest::embedding::{DEFAULT_EMBEDDING_DIM, DEFAULT_MODEL_ID};
use legal_ingest::parser::InvalidParagraphPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "legal-ingest",
    version,
    about = "Parse, validate and chunk Indonesian statutes into article/paragraph records"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Parse(ParseArgs),
    Chunk(ChunkArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// JSON array of pages (each an array of lines) or form-feed separated text.
    #[arg(long)]
    pub pages_path: PathBuf,

    #[arg(long, default_value = ".cache/legal-ingest")]
    pub output_dir: PathBuf,

    /// First body page, 1-based.
    #[arg(long)]
    pub body_start: usize,

    /// Last body page, 1-based.
    #[arg(long)]
    pub body_end: usize,

    /// First elucidation page, 1-based; the section runs to the end of the document.
    #[arg(long)]
    pub elucidation_start: usize,

    #[arg(long, default_value_t = 0)]
    pub header_lines_to_skip: usize,

    #[arg(long)]
    pub expected_total_articles: u32,

    /// JSON file with `body` and `elucidation` rule sets replacing the built-ins.
    #[arg(long)]
    pub rules_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ParagraphPolicyArg::Discard)]
    pub invalid_paragraph_policy: ParagraphPolicyArg,

    /// Write every per-line parser decision to this JSONL file.
    #[arg(long)]
    pub trace_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ParagraphPolicyArg {
    Discard,
    KeepAsText,
}

impl From<ParagraphPolicyArg> for InvalidParagraphPolicy {
    fn from(value: ParagraphPolicyArg) -> Self {
        match value {
            ParagraphPolicyArg::Discard => Self::Discard,
            ParagraphPolicyArg::KeepAsText => Self::KeepAsText,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    #[arg(long, default_value = ".cache/legal-ingest")]
    pub output_dir: PathBuf,

    #[arg(long, default_value = "UU_22_2009_LLAJ")]
    pub source: String,

    #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_TOKENS)]
    pub max_chunk_tokens: usize,

    #[arg(long, default_value_t = DEFAULT_OVERLAP_TOKENS)]
    pub overlap_tokens: usize,

    #[arg(long, default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIM)]
    pub embedding_dim: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 3)]
    pub max_retries: usize,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/legal-ingest")]
    pub output_dir: PathBuf,
}
