//! Line classification rules for one section of a statute.
//!
//! Body text and elucidation text mark paragraphs and list items differently,
//! so each section gets its own [`ParsingRules`]. Rules start life as a
//! serializable [`RuleSpec`] of pattern strings and are compiled once before
//! parsing begins.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RulesError;
use crate::model::Section;

pub const PAGE_PATTERN: &str = r"^-\s\d+\s-$";
pub const CHAPTER_PATTERN: &str = r"^BAB\s[A-Z]+$";
pub const SECTION_PATTERN: &str = r"^Bagian\s[A-Z][a-z]+$";
pub const SUBSECTION_PATTERN: &str = r"^Paragraf\s\d+$";
pub const ARTICLE_PATTERN: &str = r"^Pasal\s(\d+)$";
pub const BARE_ARTICLE_PATTERN: &str = r"^Pasal$";
pub const BODY_PARAGRAPH_PATTERN: &str = r"^\((\d+)\)$";
pub const ELUCIDATION_PARAGRAPH_PATTERN: &str = r"^Ayat \((\d+)\)$";
pub const BODY_ORDERED_LIST_PATTERN: &str =
    r"^[a-z]\.$|^[a-z]\.\s[a-zA-Z]|^\d+\.$|^\d+\.\s[a-zA-Z]";
pub const ELUCIDATION_ORDERED_LIST_PATTERN: &str = r"^[a-z]\.$|^[a-z]\.\s[a-zA-Z]|^\d+\.$|^\d+\.\s[a-zA-Z]|^Huruf\s[a-z]$|^Huruf\s[a-z]\s[a-zA-Z]";
pub const TRIPLE_DOTS_PATTERN: &str = r"^.+\.\.\.$";
pub const TRIPLE_SPACED_DOTS_PATTERN: &str = r"^.+\.\s\.\s\.$";

pub const END_OF_BODY_MARKER: &str = "Disahkan di Jakarta";
pub const END_OF_ELUCIDATION_MARKER: &str =
    "TAMBAHAN LEMBARAN NEGARA REPUBLIK INDONESIA NOMOR 5025";

/// Uncompiled rule set, as stored in a rules file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub end_marker: String,
    pub paragraph_pattern: String,
    pub ordered_list_pattern: String,
    pub article_pattern: String,
    pub bare_article_pattern: String,
    pub section_marker_patterns: Vec<String>,
    pub skip_patterns: Vec<String>,
}

impl RuleSpec {
    pub fn body() -> Self {
        Self::indonesian(
            END_OF_BODY_MARKER,
            BODY_PARAGRAPH_PATTERN,
            BODY_ORDERED_LIST_PATTERN,
        )
    }

    pub fn elucidation() -> Self {
        Self::indonesian(
            END_OF_ELUCIDATION_MARKER,
            ELUCIDATION_PARAGRAPH_PATTERN,
            ELUCIDATION_ORDERED_LIST_PATTERN,
        )
    }

    fn indonesian(end_marker: &str, paragraph: &str, ordered_list: &str) -> Self {
        Self {
            end_marker: end_marker.to_string(),
            paragraph_pattern: paragraph.to_string(),
            ordered_list_pattern: ordered_list.to_string(),
            article_pattern: ARTICLE_PATTERN.to_string(),
            bare_article_pattern: BARE_ARTICLE_PATTERN.to_string(),
            section_marker_patterns: vec![
                CHAPTER_PATTERN.to_string(),
                SECTION_PATTERN.to_string(),
                SUBSECTION_PATTERN.to_string(),
            ],
            skip_patterns: vec![
                PAGE_PATTERN.to_string(),
                TRIPLE_DOTS_PATTERN.to_string(),
                TRIPLE_SPACED_DOTS_PATTERN.to_string(),
            ],
        }
    }
}

/// Rules file layout: one rule set per section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFile {
    pub body: RuleSpec,
    pub elucidation: RuleSpec,
}

impl Default for RuleFile {
    fn default() -> Self {
        Self {
            body: RuleSpec::body(),
            elucidation: RuleSpec::elucidation(),
        }
    }
}

impl RuleFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read rules file {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse rules file {}", path.display()))
    }

    pub fn spec(&self, section: Section) -> &RuleSpec {
        match section {
            Section::Body => &self.body,
            Section::Elucidation => &self.elucidation,
        }
    }
}

/// What a single line looks like, before parser state is taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "number", rename_all = "snake_case")]
pub enum LineClass {
    EndOfSection,
    Skip,
    SectionBoundary,
    Article(u32),
    BareArticle,
    Paragraph(u32),
    ListItem,
    Prose,
}

/// Compiled, immutable rule set for one section.
#[derive(Debug, Clone)]
pub struct ParsingRules {
    end_marker: String,
    paragraph: Regex,
    ordered_list: Regex,
    article: Regex,
    bare_article: Regex,
    section_markers: Vec<Regex>,
    skips: Vec<Regex>,
}

impl ParsingRules {
    pub fn compile(spec: &RuleSpec) -> Result<Self, RulesError> {
        if spec.end_marker.trim().is_empty() {
            return Err(RulesError::EmptyEndMarker);
        }

        let paragraph = compile_numbered("paragraph", &spec.paragraph_pattern)?;
        let article = compile_numbered("article", &spec.article_pattern)?;

        Ok(Self {
            end_marker: spec.end_marker.clone(),
            paragraph,
            ordered_list: compile_pattern("ordered_list", &spec.ordered_list_pattern)?,
            article,
            bare_article: compile_pattern("bare_article", &spec.bare_article_pattern)?,
            section_markers: spec
                .section_marker_patterns
                .iter()
                .map(|pattern| compile_pattern("section_marker", pattern))
                .collect::<Result<_, _>>()?,
            skips: spec
                .skip_patterns
                .iter()
                .map(|pattern| compile_pattern("skip", pattern))
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn body() -> Result<Self, RulesError> {
        Self::compile(&RuleSpec::body())
    }

    pub fn elucidation() -> Result<Self, RulesError> {
        Self::compile(&RuleSpec::elucidation())
    }

    /// Classifies a line in parser priority order: end marker, skip, section
    /// boundary, numbered article, bare article, then [`Self::classify_content`].
    pub fn classify(&self, line: &str) -> LineClass {
        if line == self.end_marker {
            return LineClass::EndOfSection;
        }

        if self.skips.iter().any(|pattern| pattern.is_match(line)) {
            return LineClass::Skip;
        }

        if self.section_markers.iter().any(|pattern| pattern.is_match(line)) {
            return LineClass::SectionBoundary;
        }

        if let Some(number) = captured_number(&self.article, line) {
            return LineClass::Article(number);
        }

        if self.bare_article.is_match(line) {
            return LineClass::BareArticle;
        }

        self.classify_content(line)
    }

    /// Classification for lines already known to be article content.
    pub fn classify_content(&self, line: &str) -> LineClass {
        if let Some(number) = captured_number(&self.paragraph, line) {
            return LineClass::Paragraph(number);
        }

        if self.is_list_item(line) {
            return LineClass::ListItem;
        }

        LineClass::Prose
    }

    pub fn is_list_item(&self, line: &str) -> bool {
        self.ordered_list.is_match(line)
    }
}

fn compile_pattern(field: &'static str, pattern: &str) -> Result<Regex, RulesError> {
    Regex::new(pattern).map_err(|source| RulesError::InvalidPattern {
        field,
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_numbered(field: &'static str, pattern: &str) -> Result<Regex, RulesError> {
    let regex = compile_pattern(field, pattern)?;
    // captures_len counts the implicit whole-match group.
    if regex.captures_len() < 2 {
        return Err(RulesError::MissingNumberGroup {
            field,
            pattern: pattern.to_string(),
        });
    }
    Ok(regex)
}

fn captured_number(regex: &Regex, line: &str) -> Option<u32> {
    regex
        .captures(line)?
        .get(1)?
        .as_str()
        .trim()
        .parse::<u32>()
        .ok()
}
