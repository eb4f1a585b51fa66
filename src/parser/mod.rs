//! Structural parser: folds a section's page lines into article/paragraph items.
//!
//! The parser never fails. Unrecognised structure degrades to prose, text
//! outside any article is dropped, and completeness is checked afterwards by
//! [`crate::validation`].

mod trace;
#[cfg(test)]
mod tests;

use crate::model::DocumentItem;
use crate::rules::{LineClass, ParsingRules};

pub use trace::{Action, DecisionSink, LineDecision, Tee, TracingSink};

/// What to do with a paragraph-shaped line whose number is out of sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidParagraphPolicy {
    /// Consume the line without appending it anywhere.
    #[default]
    Discard,
    /// Append the line to the current unit like any other content line.
    KeepAsText,
}

impl InvalidParagraphPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discard => "discard",
            Self::KeepAsText => "keep-as-text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Outside,
    InArticle,
    /// A bare article keyword was seen; the next content line decides whether
    /// it was a split header or prose.
    AwaitingArticleNumber { in_article: bool, marker: String },
}

impl Phase {
    fn in_article(&self) -> bool {
        match self {
            Phase::Outside => false,
            Phase::InArticle => true,
            Phase::AwaitingArticleNumber { in_article, .. } => *in_article,
        }
    }

    fn region(in_article: bool) -> Self {
        if in_article {
            Phase::InArticle
        } else {
            Phase::Outside
        }
    }
}

#[derive(Debug)]
struct ParserState {
    article: Option<u32>,
    paragraph: Option<u32>,
    buffer: String,
    phase: Phase,
}

impl ParserState {
    fn new() -> Self {
        Self {
            article: None,
            paragraph: None,
            buffer: String::new(),
            phase: Phase::Outside,
        }
    }

    /// Moves the buffer into `items` when it holds any text, leaving it empty.
    fn flush(&mut self, items: &mut Vec<DocumentItem>) {
        let mut text = std::mem::take(&mut self.buffer);
        let Some(article) = self.article else {
            return;
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        if trimmed.len() != text.len() {
            text = trimmed.to_string();
        }

        items.push(DocumentItem {
            article_number: article,
            paragraph_number: self.paragraph,
            text,
        });
    }

    fn start_article(&mut self, number: u32, items: &mut Vec<DocumentItem>) {
        if self.article.is_some() {
            self.flush(items);
        }
        self.article = Some(number);
        self.paragraph = None;
        self.buffer.clear();
        self.phase = Phase::InArticle;
    }

    fn next_article_accepts(&self, line: &str) -> Option<u32> {
        if line.is_empty() || !line.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }

        let number = line.parse::<u32>().ok()?;
        let expected = self.article.map_or(Some(1), |article| article.checked_add(1))?;
        (number == expected).then_some(number)
    }

    fn next_paragraph_accepts(&self, candidate: u32) -> bool {
        match self.paragraph {
            None => candidate == 1,
            Some(previous) => previous.checked_add(1) == Some(candidate),
        }
    }

    fn append(&mut self, line: &str, list_item: bool) {
        if line.is_empty() {
            return;
        }
        if !self.buffer.is_empty() {
            self.buffer.push(if list_item { '\n' } else { ' ' });
        }
        self.buffer.push_str(line);
    }
}

enum Step {
    Continue,
    Stop,
}

/// Parser for one section, configured with its rules, per-page header skip,
/// and invalid paragraph policy.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'r> {
    rules: &'r ParsingRules,
    header_lines_to_skip: usize,
    policy: InvalidParagraphPolicy,
}

impl<'r> Parser<'r> {
    pub fn new(rules: &'r ParsingRules, header_lines_to_skip: usize) -> Self {
        Self {
            rules,
            header_lines_to_skip,
            policy: InvalidParagraphPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: InvalidParagraphPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn parse<P, L>(&self, pages: &[P]) -> Vec<DocumentItem>
    where
        P: AsRef<[L]>,
        L: AsRef<str>,
    {
        self.parse_with_sink(pages, &mut ())
    }

    pub fn parse_with_sink<P, L, S>(&self, pages: &[P], sink: &mut S) -> Vec<DocumentItem>
    where
        P: AsRef<[L]>,
        L: AsRef<str>,
        S: DecisionSink + ?Sized,
    {
        let mut state = ParserState::new();
        let mut items = Vec::new();

        'pages: for (page_index, page) in pages.iter().enumerate() {
            let lines = page.as_ref();
            for (line_index, line) in lines.iter().enumerate().skip(self.header_lines_to_skip) {
                let position = (page_index + 1, line_index + 1);
                if let Step::Stop = self.step(&mut state, &mut items, line.as_ref(), position, sink)
                {
                    break 'pages;
                }
            }
        }

        state.flush(&mut items);
        items
    }

    fn step<S>(
        &self,
        state: &mut ParserState,
        items: &mut Vec<DocumentItem>,
        line: &str,
        (page, line_no): (usize, usize),
        sink: &mut S,
    ) -> Step
    where
        S: DecisionSink + ?Sized,
    {
        let mut record = |class: LineClass, rejoined: bool, text: &str, action: Action| {
            if sink.enabled() {
                sink.record(LineDecision {
                    page,
                    line: line_no,
                    text: text.to_string(),
                    class,
                    bare_marker_rejoined: rejoined,
                    action,
                });
            }
        };

        let class = self.rules.classify(line);
        match class {
            LineClass::EndOfSection => {
                record(class, false, line, Action::EndOfSection);
                return Step::Stop;
            }
            LineClass::Skip => {
                record(class, false, line, Action::Skipped);
                return Step::Continue;
            }
            LineClass::SectionBoundary => {
                // A pending bare marker survives a boundary; only the region changes.
                state.phase = match std::mem::replace(&mut state.phase, Phase::Outside) {
                    Phase::AwaitingArticleNumber { marker, .. } => Phase::AwaitingArticleNumber {
                        in_article: false,
                        marker,
                    },
                    _ => Phase::Outside,
                };
                record(class, false, line, Action::LeftArticleRegion);
                return Step::Continue;
            }
            LineClass::Article(number) => {
                state.start_article(number, items);
                record(class, false, line, Action::StartedArticle { number });
                return Step::Continue;
            }
            LineClass::BareArticle => {
                state.phase = Phase::AwaitingArticleNumber {
                    in_article: state.phase.in_article(),
                    marker: line.to_string(),
                };
                record(class, false, line, Action::AwaitingArticleNumber);
                return Step::Continue;
            }
            _ => {}
        }

        let mut content = std::borrow::Cow::Borrowed(line);
        let mut class = class;
        let mut rejoined = false;

        let phase = std::mem::replace(&mut state.phase, Phase::Outside);
        state.phase = match phase {
            Phase::AwaitingArticleNumber { in_article, marker } => {
                if let Some(number) = state.next_article_accepts(line) {
                    state.start_article(number, items);
                    record(
                        LineClass::Article(number),
                        false,
                        line,
                        Action::StartedArticle { number },
                    );
                    return Step::Continue;
                }

                // The keyword was ordinary prose, e.g. "... oleh Pasal ini".
                content = std::borrow::Cow::Owned(format!("{marker} {line}"));
                class = self.rules.classify_content(&content);
                rejoined = true;
                Phase::region(in_article)
            }
            other => other,
        };

        if let LineClass::Paragraph(candidate) = class {
            if state.next_paragraph_accepts(candidate) {
                if state.paragraph.is_some() {
                    state.flush(items);
                }
                state.paragraph = Some(candidate);
                state.buffer.clear();
                record(
                    class,
                    rejoined,
                    &content,
                    Action::StartedParagraph { number: candidate },
                );
                return Step::Continue;
            }

            if self.policy == InvalidParagraphPolicy::Discard {
                record(
                    class,
                    rejoined,
                    &content,
                    Action::DiscardedParagraphMarker { candidate },
                );
                return Step::Continue;
            }
        }

        if !state.phase.in_article() {
            record(class, rejoined, &content, Action::DroppedOutsideArticle);
            return Step::Continue;
        }

        let list_item = match class {
            LineClass::ListItem => true,
            LineClass::Paragraph(_) => self.rules.is_list_item(&content),
            _ => false,
        };
        state.append(&content, list_item);
        record(class, rejoined, &content, Action::Appended { list_item });

        Step::Continue
    }
}

/// Parses one section with the default invalid paragraph policy.
pub fn parse<P, L>(pages: &[P], rules: &ParsingRules, header_lines_to_skip: usize) -> Vec<DocumentItem>
where
    P: AsRef<[L]>,
    L: AsRef<str>,
{
    Parser::new(rules, header_lines_to_skip).parse(pages)
}
