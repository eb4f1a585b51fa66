use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use legal_ingest::error::PageRangeError;

pub type Page = Vec<String>;

/// Loads pre-extracted pages from either a JSON array of line arrays or
/// form-feed separated text, normalizing every line.
pub fn load_pages(path: &Path) -> Result<Vec<Page>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read pages file {}", path.display()))?;
    pages_from_str(&raw).with_context(|| format!("failed to parse pages file {}", path.display()))
}

pub fn pages_from_str(raw: &str) -> Result<Vec<Page>> {
    let mut pages = if raw.trim_start().starts_with('[') {
        let parsed: Vec<Vec<String>> =
            serde_json::from_str(raw).context("pages json must be an array of string arrays")?;
        parsed
            .into_iter()
            .map(|page| normalize_lines(page.iter().map(String::as_str)))
            .collect::<Vec<Page>>()
    } else {
        raw.split('\u{000C}')
            .map(|chunk| normalize_lines(chunk.lines()))
            .collect::<Vec<Page>>()
    };

    while pages.last().is_some_and(|page| page.is_empty()) {
        pages.pop();
    }

    Ok(pages)
}

fn normalize_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Page {
    lines
        .map(|line| line.replace('\u{0000}', ""))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Pages `start..=end` (1-based), or `start..` when `end` is `None`. Bounds
/// past the document are clamped.
pub fn page_slice(
    pages: &[Page],
    start: usize,
    end: Option<usize>,
) -> Result<&[Page], PageRangeError> {
    if start == 0 {
        return Err(PageRangeError::ZeroPage(start));
    }
    if let Some(end) = end {
        if end == 0 {
            return Err(PageRangeError::ZeroPage(end));
        }
        if start > end {
            return Err(PageRangeError::Inverted { start, end });
        }
    }

    let lo = (start - 1).min(pages.len());
    let hi = end.unwrap_or(pages.len()).min(pages.len());
    Ok(&pages[lo..hi])
}
