//! Post-hoc structural checks over parsed items and generated chunks.

mod chunks;
mod document;

pub use chunks::{ChunkKey, ChunkValidationReport, GroupKey, validate_chunks};
pub use document::{
    IncompleteReport, ValidationReport, check_duplicate_article_paragraphs,
    check_missing_articles, check_missing_paragraphs, check_total_articles, validate,
};
