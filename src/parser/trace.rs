//! Per-line parser decisions and the sinks that receive them.

use serde::Serialize;
use tracing::debug;

use crate::model::Section;
use crate::rules::LineClass;

/// What the parser did with one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    EndOfSection,
    Skipped,
    LeftArticleRegion,
    StartedArticle { number: u32 },
    AwaitingArticleNumber,
    StartedParagraph { number: u32 },
    DiscardedParagraphMarker { candidate: u32 },
    Appended { list_item: bool },
    DroppedOutsideArticle,
}

/// Per-line decision record. `page` and `line` are 1-based positions within
/// the pages handed to the parser, header lines included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDecision {
    pub page: usize,
    pub line: usize,
    pub text: String,
    pub class: LineClass,
    pub bare_marker_rejoined: bool,
    #[serde(flatten)]
    pub action: Action,
}

pub trait DecisionSink {
    fn record(&mut self, decision: LineDecision);

    /// Sinks that discard everything return false so the parser can skip
    /// building decisions.
    fn enabled(&self) -> bool {
        true
    }
}

impl DecisionSink for () {
    fn record(&mut self, _decision: LineDecision) {}

    fn enabled(&self) -> bool {
        false
    }
}

impl DecisionSink for Vec<LineDecision> {
    fn record(&mut self, decision: LineDecision) {
        self.push(decision);
    }
}

/// Forwards decisions to `tracing` at debug level.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    section: Section,
}

impl TracingSink {
    pub fn new(section: Section) -> Self {
        Self { section }
    }
}

impl DecisionSink for TracingSink {
    fn record(&mut self, decision: LineDecision) {
        debug!(
            section = %self.section,
            page = decision.page,
            line = decision.line,
            class = ?decision.class,
            action = ?decision.action,
            rejoined = decision.bare_marker_rejoined,
            text = %decision.text,
            "line decision"
        );
    }

    fn enabled(&self) -> bool {
        tracing::enabled!(tracing::Level::DEBUG)
    }
}

/// Fans one decision out to two sinks.
pub struct Tee<'a, A: ?Sized, B: ?Sized> {
    pub first: &'a mut A,
    pub second: &'a mut B,
}

impl<A, B> DecisionSink for Tee<'_, A, B>
where
    A: DecisionSink + ?Sized,
    B: DecisionSink + ?Sized,
{
    fn record(&mut self, decision: LineDecision) {
        match (self.first.enabled(), self.second.enabled()) {
            (true, true) => {
                self.first.record(decision.clone());
                self.second.record(decision);
            }
            (true, false) => self.first.record(decision),
            (false, true) => self.second.record(decision),
            (false, false) => {}
        }
    }

    fn enabled(&self) -> bool {
        self.first.enabled() || self.second.enabled()
    }
}
