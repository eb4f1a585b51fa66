use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use legal_ingest::model::{ChunkRunManifest, ParseRunManifest, Section};
use legal_ingest::util::count_jsonl_records;

use crate::cli::StatusArgs;
use crate::commands::chunk::CHUNKS_FILE_NAME;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.output_dir.join("manifests");

    info!(output_dir = %args.output_dir.display(), "status requested");

    match latest_manifest(&manifest_dir, "parse_run_")? {
        Some(path) => {
            let manifest: ParseRunManifest = read_manifest(&path)?;
            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                input = %manifest.input.path,
                input_sha256 = %manifest.input.sha256,
                expected_total_articles = manifest.expected_total_articles,
                warnings = manifest.warnings.len(),
                "loaded latest parse manifest"
            );
            for summary in &manifest.sections {
                info!(
                    section = %summary.section,
                    pages = %format!("{}-{}", summary.page_start, summary.page_end),
                    items = summary.item_count,
                    valid = summary.valid,
                    "parsed section"
                );
            }
        }
        None => warn!(path = %manifest_dir.display(), "no parse manifest found"),
    }

    match latest_manifest(&manifest_dir, "chunk_run_")? {
        Some(path) => {
            let manifest: ChunkRunManifest = read_manifest(&path)?;
            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                model_id = %manifest.model_id,
                embedding_dim = manifest.embedding_dim,
                total_chunks = manifest.report.total_chunks,
                "loaded latest chunk manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no chunk manifest found"),
    }

    let outputs = [
        Section::Body.file_name(),
        Section::Elucidation.file_name(),
        CHUNKS_FILE_NAME.to_string(),
    ];
    for name in outputs {
        let path = args.output_dir.join(name);
        if path.exists() {
            let records = count_jsonl_records(&path)?;
            info!(path = %path.display(), records, "output present");
        } else {
            warn!(path = %path.display(), "output missing");
        }
    }

    Ok(())
}

/// Newest manifest with the given prefix. Compact UTC timestamps in the file
/// names sort chronologically.
fn latest_manifest(manifest_dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to list {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to list {}", manifest_dir.display()))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(prefix) || !name.ends_with(".json") {
            continue;
        }

        let path = entry.path();
        if latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

fn read_manifest<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
