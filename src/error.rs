use thiserror::Error;

/// Problems with a rule set, raised when the rules are compiled.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("invalid {field} pattern `{pattern}`: {source}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        source: regex::Error,
    },

    #[error("{field} pattern `{pattern}` must capture the marker number in group 1")]
    MissingNumberGroup {
        field: &'static str,
        pattern: String,
    },

    #[error("end-of-section marker must not be empty")]
    EmptyEndMarker,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// No item carries a paragraph number, so no paragraph range can be derived.
    #[error("no paragraph numbers found; unable to check missing paragraphs")]
    EmptyParagraphSet,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkConfigError {
    #[error("max_chunk_tokens must be greater than zero")]
    ZeroBudget,

    #[error("overlap_tokens ({overlap}) must be smaller than max_chunk_tokens ({max})")]
    OverlapTooLarge { max: usize, overlap: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageRangeError {
    #[error("page numbers are 1-based, got {0}")]
    ZeroPage(usize),

    #[error("page range start {start} is after end {end}")]
    Inverted { start: usize, end: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbedError {
    /// Quota or rate limit exhausted; retrying would not help.
    #[error("embedding rate limited: {0}")]
    RateLimited(String),

    #[error("transient embedding failure: {0}")]
    Transient(String),
}

impl EmbedError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
