//! Token-bounded sliding-window chunking of parsed items.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ChunkConfigError;
use crate::model::{Chunk, DocumentItem, Section};

pub const DEFAULT_MAX_CHUNK_TOKENS: usize = 300;
pub const DEFAULT_OVERLAP_TOKENS: usize = 30;

// Words and punctuation count as separate tokens.
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b|[^\w\s]").expect("valid token regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    max_chunk_tokens: usize,
    overlap_tokens: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: DEFAULT_MAX_CHUNK_TOKENS,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
        }
    }
}

impl ChunkConfig {
    pub fn new(max_chunk_tokens: usize, overlap_tokens: usize) -> Result<Self, ChunkConfigError> {
        if max_chunk_tokens == 0 {
            return Err(ChunkConfigError::ZeroBudget);
        }
        if overlap_tokens >= max_chunk_tokens {
            return Err(ChunkConfigError::OverlapTooLarge {
                max: max_chunk_tokens,
                overlap: overlap_tokens,
            });
        }

        Ok(Self {
            max_chunk_tokens,
            overlap_tokens,
        })
    }

    pub fn max_chunk_tokens(&self) -> usize {
        self.max_chunk_tokens
    }

    pub fn overlap_tokens(&self) -> usize {
        self.overlap_tokens
    }
}

pub fn tokenize(text: &str) -> Vec<&str> {
    TOKEN_REGEX
        .find_iter(text)
        .map(|token| token.as_str())
        .collect()
}

pub fn token_count(text: &str) -> usize {
    TOKEN_REGEX.find_iter(text).count()
}

/// Splits `text` into windows of at most `max_chunk_tokens` tokens that
/// advance by `max_chunk_tokens - overlap_tokens`. Text that already fits is
/// returned unchanged; windowed chunks are re-joined with single spaces.
pub fn make_chunks(text: &str, config: &ChunkConfig) -> Vec<String> {
    let tokens = tokenize(text);
    let total = tokens.len();

    if total <= config.max_chunk_tokens {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + config.max_chunk_tokens).min(total);
        chunks.push(tokens[start..end].join(" "));

        if end >= total {
            break;
        }
        start = end - config.overlap_tokens;
    }

    chunks
}

pub fn chunk_item(item: &DocumentItem, chunk_type: Section, config: &ChunkConfig) -> Vec<Chunk> {
    make_chunks(&item.text, config)
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| Chunk {
            article_number: item.article_number,
            paragraph_number: item.paragraph_number,
            chunk_index,
            chunk_type,
            token_count: token_count(&text),
            text,
        })
        .collect()
}
