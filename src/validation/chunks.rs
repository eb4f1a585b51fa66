use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chunker::{ChunkConfig, token_count};
use crate::model::{ChunkRecord, Section};

/// Embedding components above this magnitude are reported but not fatal.
const EXTREME_EMBEDDING_VALUE: f32 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub chunk_type: Section,
    pub article_number: u32,
    pub paragraph_number: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    #[serde(flatten)]
    pub group: GroupKey,
    pub chunk_index: usize,
}

impl ChunkKey {
    fn of(record: &ChunkRecord) -> Self {
        Self {
            group: GroupKey {
                chunk_type: record.chunk.chunk_type,
                article_number: record.chunk.article_number,
                paragraph_number: record.chunk.paragraph_number,
            },
            chunk_index: record.chunk.chunk_index,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkValidationReport {
    pub total_chunks: usize,
    pub empty_texts: Vec<ChunkKey>,
    pub over_budget: Vec<ChunkKey>,
    pub token_count_mismatches: Vec<ChunkKey>,
    pub non_contiguous_groups: Vec<GroupKey>,
    pub missing_embeddings: Vec<ChunkKey>,
    pub dimension_mismatches: Vec<ChunkKey>,
    pub non_finite_embeddings: Vec<ChunkKey>,
    pub extreme_value_warnings: Vec<ChunkKey>,
}

impl ChunkValidationReport {
    /// Extreme values are warnings and do not affect validity.
    pub fn is_valid(&self) -> bool {
        self.total_chunks > 0
            && self.empty_texts.is_empty()
            && self.over_budget.is_empty()
            && self.token_count_mismatches.is_empty()
            && self.non_contiguous_groups.is_empty()
            && self.missing_embeddings.is_empty()
            && self.dimension_mismatches.is_empty()
            && self.non_finite_embeddings.is_empty()
    }
}

pub fn validate_chunks(
    records: &[ChunkRecord],
    config: &ChunkConfig,
    expected_dim: usize,
) -> ChunkValidationReport {
    let mut report = ChunkValidationReport {
        total_chunks: records.len(),
        ..ChunkValidationReport::default()
    };
    let mut group_indices = BTreeMap::<GroupKey, Vec<usize>>::new();

    for record in records {
        let key = ChunkKey::of(record);
        let chunk = &record.chunk;
        group_indices
            .entry(key.group)
            .or_default()
            .push(chunk.chunk_index);

        if chunk.text.trim().is_empty() {
            report.empty_texts.push(key);
        }

        let actual_tokens = token_count(&chunk.text);
        if actual_tokens != chunk.token_count {
            report.token_count_mismatches.push(key);
        }
        if actual_tokens > config.max_chunk_tokens() {
            report.over_budget.push(key);
        }

        let embedding = &record.embedding;
        if embedding.is_empty() {
            report.missing_embeddings.push(key);
            continue;
        }
        if embedding.len() != expected_dim {
            report.dimension_mismatches.push(key);
            continue;
        }
        if embedding.iter().any(|value| !value.is_finite()) {
            report.non_finite_embeddings.push(key);
            continue;
        }
        if embedding
            .iter()
            .any(|value| value.abs() > EXTREME_EMBEDDING_VALUE)
        {
            report.extreme_value_warnings.push(key);
        }
    }

    report.non_contiguous_groups = group_indices
        .into_iter()
        .filter(|(_, indices)| {
            indices
                .iter()
                .enumerate()
                .any(|(position, index)| position != *index)
        })
        .map(|(group, _)| group)
        .collect();

    report
}
