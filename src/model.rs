use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{ChunkValidationReport, ValidationReport};

/// One completed (article, paragraph) unit of a parsed section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentItem {
    pub article_number: u32,
    pub paragraph_number: Option<u32>,
    pub text: String,
}

impl DocumentItem {
    pub fn new(article_number: u32, paragraph_number: Option<u32>, text: impl Into<String>) -> Self {
        Self {
            article_number,
            paragraph_number,
            text: text.into(),
        }
    }
}

/// Which part of the statute a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Body,
    Elucidation,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Body => "body",
            Section::Elucidation => "elucidation",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.jsonl", self.as_str())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub article_number: u32,
    pub paragraph_number: Option<u32>,
    pub chunk_index: usize,
    pub chunk_type: Section,
    pub text: String,
    pub token_count: usize,
}

/// Line written to `chunks_with_embeddings.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub source: String,
    #[serde(flatten)]
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFile {
    pub path: String,
    pub sha256: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSummary {
    pub section: Section,
    pub page_start: usize,
    pub page_end: usize,
    pub item_count: usize,
    pub valid: bool,
    pub report: Option<ValidationReport>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub input: InputFile,
    pub header_lines_to_skip: usize,
    pub expected_total_articles: u32,
    pub invalid_paragraph_policy: String,
    pub rules_source: String,
    pub sections: Vec<SectionSummary>,
    pub outputs: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkCounts {
    pub body_items: usize,
    pub elucidation_items: usize,
    pub body_chunks: usize,
    pub elucidation_chunks: usize,
    pub multi_chunk_items: usize,
    pub embedded_chunks: usize,
    pub embed_retries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub source: String,
    pub model_id: String,
    pub embedding_dim: usize,
    pub max_chunk_tokens: usize,
    pub overlap_tokens: usize,
    pub batch_size: usize,
    pub duration_ms: u128,
    pub counts: ChunkCounts,
    pub report: ChunkValidationReport,
    pub output: Option<String>,
    pub warnings: Vec<String>,
}
