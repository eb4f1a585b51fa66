use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{error, info, warn};

use legal_ingest::chunker::{ChunkConfig, chunk_item};
use legal_ingest::embedding::{Embedder, LocalHashEmbedder, RetryPolicy, embed_with_retry};
use legal_ingest::model::{ChunkCounts, ChunkRecord, ChunkRunManifest, DocumentItem, Section};
use legal_ingest::util::{
    ensure_directory, now_utc_string, read_jsonl, utc_compact_string, write_json_pretty,
    write_jsonl,
};
use legal_ingest::validation::{ChunkValidationReport, validate_chunks};

use crate::cli::ChunkArgs;

pub const CHUNKS_FILE_NAME: &str = "chunks_with_embeddings.jsonl";

pub fn run(args: ChunkArgs) -> Result<()> {
    let embedder = LocalHashEmbedder::new(&args.model_id, args.embedding_dim);
    let policy = RetryPolicy {
        max_retries: args.max_retries,
        ..RetryPolicy::default()
    };

    let manifest = execute(&args, &embedder, &policy)?;
    if manifest.status != "completed" {
        let report = &manifest.report;
        if report.total_chunks == 0 {
            bail!("chunk validation failed: no chunks were produced");
        }
        bail!(
            "chunk validation failed: {} problems across {} chunks",
            problem_count(report),
            report.total_chunks
        );
    }

    Ok(())
}

pub(super) fn execute<E>(
    args: &ChunkArgs,
    embedder: &E,
    policy: &RetryPolicy,
) -> Result<ChunkRunManifest>
where
    E: Embedder + ?Sized,
{
    let config = ChunkConfig::new(args.max_chunk_tokens, args.overlap_tokens)
        .context("invalid chunk configuration")?;
    let batch_size = args.batch_size.max(1);

    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let started = Instant::now();
    let run_id = format!("chunk-{}", utc_compact_string(started_ts));

    let manifest_dir = args.output_dir.join("manifests");
    ensure_directory(&manifest_dir)?;

    info!(
        output_dir = %args.output_dir.display(),
        model_id = %embedder.model_id(),
        run_id = %run_id,
        "starting chunk"
    );

    let mut counts = ChunkCounts {
        body_items: 0,
        elucidation_items: 0,
        body_chunks: 0,
        elucidation_chunks: 0,
        multi_chunk_items: 0,
        embedded_chunks: 0,
        embed_retries: 0,
    };
    let mut warnings = Vec::new();
    let mut records = Vec::<ChunkRecord>::new();

    for section in [Section::Body, Section::Elucidation] {
        let items = load_section(&args.output_dir, section)?;
        if items.is_empty() {
            let message = format!("{section} items file is empty");
            warn!(section = %section, "{message}");
            warnings.push(message);
        }

        let mut section_chunks = 0usize;
        for item in &items {
            let chunks = chunk_item(item, section, &config);
            if chunks.len() > 1 {
                counts.multi_chunk_items += 1;
                info!(
                    section = %section,
                    article = item.article_number,
                    paragraph = ?item.paragraph_number,
                    chunks = chunks.len(),
                    "split item into multiple chunks"
                );
            }
            section_chunks += chunks.len();
            records.extend(chunks.into_iter().map(|chunk| ChunkRecord {
                source: args.source.clone(),
                chunk,
                embedding: Vec::new(),
            }));
        }

        match section {
            Section::Body => {
                counts.body_items = items.len();
                counts.body_chunks = section_chunks;
            }
            Section::Elucidation => {
                counts.elucidation_items = items.len();
                counts.elucidation_chunks = section_chunks;
            }
        }
        info!(section = %section, items = items.len(), chunks = section_chunks, "chunked section");
    }

    let total_chunks = records.len();
    for batch in records.chunks_mut(batch_size) {
        for record in batch.iter_mut() {
            let embedded = embed_with_retry(embedder, &record.chunk.text, policy).with_context(|| {
                format!(
                    "failed to embed {} article {} paragraph {:?} chunk {}",
                    record.chunk.chunk_type,
                    record.chunk.article_number,
                    record.chunk.paragraph_number,
                    record.chunk.chunk_index
                )
            })?;
            record.embedding = embedded.vector;
            counts.embed_retries += embedded.retries;
            counts.embedded_chunks += 1;
        }
        info!(
            model_id = %embedder.model_id(),
            embedded_chunks = counts.embedded_chunks,
            total_chunks,
            "embed batch completed"
        );
    }

    let report = validate_chunks(&records, &config, embedder.dimensions());
    let valid = log_chunk_report(&report);

    let output = if valid {
        let path = args.output_dir.join(CHUNKS_FILE_NAME);
        write_jsonl(&path, &records)?;
        info!(path = %path.display(), chunks = records.len(), "wrote chunk records");
        Some(path.display().to_string())
    } else {
        warn!(
            output_dir = %args.output_dir.display(),
            "skipping chunk output because validation failed"
        );
        None
    };

    let manifest = ChunkRunManifest {
        manifest_version: 1,
        run_id,
        status: if valid { "completed" } else { "invalid" }.to_string(),
        started_at,
        updated_at: now_utc_string(),
        source: args.source.clone(),
        model_id: embedder.model_id().to_string(),
        embedding_dim: embedder.dimensions(),
        max_chunk_tokens: config.max_chunk_tokens(),
        overlap_tokens: config.overlap_tokens(),
        batch_size,
        duration_ms: started.elapsed().as_millis(),
        counts,
        report,
        output,
        warnings,
    };

    let manifest_path = manifest_dir.join(format!(
        "chunk_run_{}.json",
        utc_compact_string(started_ts)
    ));
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        path = %manifest_path.display(),
        status = %manifest.status,
        body_chunks = manifest.counts.body_chunks,
        elucidation_chunks = manifest.counts.elucidation_chunks,
        multi_chunk_items = manifest.counts.multi_chunk_items,
        embed_retries = manifest.counts.embed_retries,
        duration_ms = manifest.duration_ms as u64,
        "chunk run completed"
    );

    Ok(manifest)
}

fn load_section(output_dir: &Path, section: Section) -> Result<Vec<DocumentItem>> {
    let path = output_dir.join(section.file_name());
    let items = read_jsonl::<DocumentItem>(&path)
        .with_context(|| format!("failed to load {section} items; run `parse` first"))?;
    info!(path = %path.display(), items = items.len(), "loaded section items");
    Ok(items)
}

fn log_chunk_report(report: &ChunkValidationReport) -> bool {
    for key in &report.extreme_value_warnings {
        warn!(chunk = ?key, "embedding has values above 1e6 in magnitude");
    }

    let problems = [
        ("empty chunk text", &report.empty_texts),
        ("chunk exceeds token budget", &report.over_budget),
        ("token count does not match text", &report.token_count_mismatches),
        ("missing embedding", &report.missing_embeddings),
        ("embedding dimension mismatch", &report.dimension_mismatches),
        ("embedding has NaN or infinite values", &report.non_finite_embeddings),
    ];
    for (message, keys) in problems {
        for key in keys {
            error!(chunk = ?key, "{message}");
        }
    }
    for group in &report.non_contiguous_groups {
        error!(group = ?group, "chunk indices are not contiguous from zero");
    }

    if report.total_chunks == 0 {
        error!("no chunks were produced");
    }

    let valid = report.is_valid();
    if valid {
        info!(
            total_chunks = report.total_chunks,
            warnings = report.extreme_value_warnings.len(),
            "chunk validation passed"
        );
    }
    valid
}

fn problem_count(report: &ChunkValidationReport) -> usize {
    report.non_contiguous_groups.len()
        + report.empty_texts.len()
        + report.over_budget.len()
        + report.token_count_mismatches.len()
        + report.missing_embeddings.len()
        + report.dimension_mismatches.len()
        + report.non_finite_embeddings.len()
}
