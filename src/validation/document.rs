use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;
use crate::model::DocumentItem;

/// Stands in for a missing paragraph number so article-level items take part
/// in duplicate detection.
const NO_PARAGRAPH: u32 = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_articles: usize,
    pub missing_articles: BTreeSet<u32>,
    pub missing_paragraphs: BTreeMap<u32, BTreeSet<u32>>,
    pub duplicate_article_paragraphs: BTreeSet<(u32, u32)>,
}

impl ValidationReport {
    pub fn is_valid(&self, expected_total_articles: u32) -> bool {
        self.total_articles == expected_total_articles as usize
            && self.missing_articles.is_empty()
            && self.missing_paragraphs.is_empty()
            && self.duplicate_article_paragraphs.is_empty()
    }
}

/// Returned when the paragraph check cannot run. Carries the article-level
/// diagnostics that were computed before it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{cause} (total_articles={total_articles}, missing_articles={missing_articles:?}, \
     duplicate_article_paragraphs={duplicate_article_paragraphs:?})"
)]
pub struct IncompleteReport {
    pub cause: ValidationError,
    pub total_articles: usize,
    pub missing_articles: BTreeSet<u32>,
    pub duplicate_article_paragraphs: BTreeSet<(u32, u32)>,
}

pub fn check_total_articles(items: &[DocumentItem]) -> usize {
    items
        .iter()
        .map(|item| item.article_number)
        .collect::<BTreeSet<u32>>()
        .len()
}

pub fn check_missing_articles(items: &[DocumentItem], expected_total_articles: u32) -> BTreeSet<u32> {
    let observed = items
        .iter()
        .map(|item| item.article_number)
        .collect::<BTreeSet<u32>>();

    (1..=expected_total_articles)
        .filter(|number| !observed.contains(number))
        .collect()
}

/// Reports, per article that has numbered paragraphs, the gaps in
/// `1..=max(paragraph)`. Articles without paragraph numbers are left out.
pub fn check_missing_paragraphs(
    items: &[DocumentItem],
) -> Result<BTreeMap<u32, BTreeSet<u32>>, ValidationError> {
    let mut article_to_paragraphs = BTreeMap::<u32, BTreeSet<u32>>::new();
    for item in items {
        if let Some(paragraph) = item.paragraph_number {
            article_to_paragraphs
                .entry(item.article_number)
                .or_default()
                .insert(paragraph);
        }
    }

    if article_to_paragraphs.is_empty() {
        return Err(ValidationError::EmptyParagraphSet);
    }

    let mut missing = BTreeMap::new();
    for (article, paragraphs) in article_to_paragraphs {
        let Some(&max_paragraph) = paragraphs.last() else {
            continue;
        };

        let gaps = (1..=max_paragraph)
            .filter(|number| !paragraphs.contains(number))
            .collect::<BTreeSet<u32>>();
        if !gaps.is_empty() {
            missing.insert(article, gaps);
        }
    }

    Ok(missing)
}

pub fn check_duplicate_article_paragraphs(items: &[DocumentItem]) -> BTreeSet<(u32, u32)> {
    let mut counts = BTreeMap::<(u32, u32), usize>::new();
    for item in items {
        let key = (
            item.article_number,
            item.paragraph_number.unwrap_or(NO_PARAGRAPH),
        );
        *counts.entry(key).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key)
        .collect()
}

/// Runs every document check over one parsed section.
pub fn validate(
    items: &[DocumentItem],
    expected_total_articles: u32,
) -> Result<ValidationReport, IncompleteReport> {
    let total_articles = check_total_articles(items);
    let missing_articles = check_missing_articles(items, expected_total_articles);
    let duplicate_article_paragraphs = check_duplicate_article_paragraphs(items);

    match check_missing_paragraphs(items) {
        Ok(missing_paragraphs) => Ok(ValidationReport {
            total_articles,
            missing_articles,
            missing_paragraphs,
            duplicate_article_paragraphs,
        }),
        Err(cause) => Err(IncompleteReport {
            cause,
            total_articles,
            missing_articles,
            duplicate_article_paragraphs,
        }),
    }
}
