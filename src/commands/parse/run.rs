use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use legal_ingest::model::{DocumentItem, InputFile, ParseRunManifest, Section, SectionSummary};
use legal_ingest::parser::{InvalidParagraphPolicy, LineDecision, Parser, Tee, TracingSink};
use legal_ingest::rules::{ParsingRules, RuleFile};
use legal_ingest::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
    write_jsonl,
};
use legal_ingest::validation::{IncompleteReport, ValidationReport, validate};

use super::{Page, load_pages, page_slice};
use crate::cli::ParseArgs;

pub fn run(args: ParseArgs) -> Result<()> {
    let manifest = execute(&args, Utc::now())?;

    if manifest.status != "completed" {
        let invalid = manifest
            .sections
            .iter()
            .filter(|summary| !summary.valid)
            .map(|summary| summary.section.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        bail!("structural validation failed for: {invalid}");
    }

    Ok(())
}

/// Runs the parse and always writes a manifest; section outputs are written
/// only when every section validates.
pub(super) fn execute(args: &ParseArgs, started_ts: DateTime<Utc>) -> Result<ParseRunManifest> {
    let started_at = now_utc_string();
    let run_id = format!("parse-{}", utc_compact_string(started_ts));

    let manifest_dir = args.output_dir.join("manifests");
    ensure_directory(&manifest_dir)?;
    let manifest_path = manifest_dir.join(format!(
        "parse_run_{}.json",
        utc_compact_string(started_ts)
    ));

    info!(
        pages_path = %args.pages_path.display(),
        output_dir = %args.output_dir.display(),
        run_id = %run_id,
        "starting parse"
    );

    let pages = load_pages(&args.pages_path)?;
    let input = InputFile {
        path: args.pages_path.display().to_string(),
        sha256: sha256_file(&args.pages_path)?,
        page_count: pages.len(),
    };
    info!(pages = pages.len(), sha256 = %input.sha256, "loaded pages");

    let (rule_file, rules_source) = match &args.rules_path {
        Some(path) => (RuleFile::load(path)?, path.display().to_string()),
        None => (RuleFile::default(), "built-in".to_string()),
    };

    let mut warnings = Vec::new();
    let ranges = [
        (Section::Body, args.body_start, Some(args.body_end)),
        (Section::Elucidation, args.elucidation_start, None),
    ];

    let policy = InvalidParagraphPolicy::from(args.invalid_paragraph_policy);
    let mut trace = args.trace_path.as_ref().map(|_| Vec::<TraceRecord>::new());
    let mut sections = Vec::with_capacity(ranges.len());

    for (section, start, end) in ranges {
        let section_pages = page_slice(&pages, start, end)
            .with_context(|| format!("invalid {section} page range"))?;
        let rules = ParsingRules::compile(rule_file.spec(section))
            .with_context(|| format!("failed to compile {section} rules"))?;

        if section_pages.is_empty() {
            let message = format!("{section} page range selects no pages");
            warn!(section = %section, start, end = ?end, "{message}");
            warnings.push(message);
        } else if end.is_some_and(|end| end > pages.len()) {
            let message = format!(
                "{section} page range end clamped to document length {}",
                pages.len()
            );
            warn!(section = %section, "{message}");
            warnings.push(message);
        }

        let parser = Parser::new(&rules, args.header_lines_to_skip).with_policy(policy);
        let parsed = parse_section(&parser, section, start, section_pages, trace.as_mut());
        info!(
            section = %section,
            pages = section_pages.len(),
            items = parsed.len(),
            "parsed section"
        );

        let outcome = validate(&parsed, args.expected_total_articles);
        let valid = log_validation(section, &outcome, args.expected_total_articles);
        sections.push(SectionRun {
            section,
            page_start: start,
            page_end: start + section_pages.len().saturating_sub(1),
            items: parsed,
            outcome,
            valid,
        });
    }

    if let (Some(path), Some(records)) = (&args.trace_path, &trace) {
        write_jsonl(path, records)?;
        info!(path = %path.display(), decisions = records.len(), "wrote parser trace");
    }

    let all_valid = sections.iter().all(|run| run.valid);
    let mut outputs = Vec::new();
    if all_valid {
        ensure_directory(&args.output_dir)?;
        for run in &sections {
            let path = args.output_dir.join(run.section.file_name());
            write_jsonl(&path, &run.items)?;
            info!(path = %path.display(), items = run.items.len(), "wrote section items");
            outputs.push(path.display().to_string());
        }
    } else {
        warn!(
            output_dir = %args.output_dir.display(),
            "skipping section outputs because validation failed"
        );
    }

    let manifest = ParseRunManifest {
        manifest_version: 1,
        run_id,
        status: if all_valid { "completed" } else { "invalid" }.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_parse_command(args),
        input,
        header_lines_to_skip: args.header_lines_to_skip,
        expected_total_articles: args.expected_total_articles,
        invalid_paragraph_policy: policy.as_str().to_string(),
        rules_source,
        sections: sections.into_iter().map(SectionRun::into_summary).collect(),
        outputs,
        warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), status = %manifest.status, "wrote parse run manifest");

    Ok(manifest)
}

/// Trace line: the parser decision tagged with its section. `page` is
/// rewritten to the document page number.
#[derive(Debug, Serialize)]
pub(super) struct TraceRecord {
    pub section: Section,
    #[serde(flatten)]
    pub decision: LineDecision,
}

struct SectionRun {
    section: Section,
    page_start: usize,
    page_end: usize,
    items: Vec<DocumentItem>,
    outcome: Result<ValidationReport, IncompleteReport>,
    valid: bool,
}

impl SectionRun {
    fn into_summary(self) -> SectionSummary {
        let (report, error) = match self.outcome {
            Ok(report) => (Some(report), None),
            Err(incomplete) => (None, Some(incomplete.to_string())),
        };

        SectionSummary {
            section: self.section,
            page_start: self.page_start,
            page_end: self.page_end,
            item_count: self.items.len(),
            valid: self.valid,
            report,
            error,
        }
    }
}

fn parse_section(
    parser: &Parser<'_>,
    section: Section,
    first_page: usize,
    pages: &[Page],
    trace: Option<&mut Vec<TraceRecord>>,
) -> Vec<DocumentItem> {
    let mut tracing_sink = TracingSink::new(section);

    let Some(trace) = trace else {
        return parser.parse_with_sink(pages, &mut tracing_sink);
    };

    let mut decisions = Vec::<LineDecision>::new();
    let items = parser.parse_with_sink(
        pages,
        &mut Tee {
            first: &mut tracing_sink,
            second: &mut decisions,
        },
    );

    trace.extend(decisions.into_iter().map(|mut decision| {
        decision.page += first_page - 1;
        TraceRecord { section, decision }
    }));

    items
}

/// Logs every diagnostic of a section report and returns whether it passed.
fn log_validation(
    section: Section,
    outcome: &Result<ValidationReport, IncompleteReport>,
    expected_total_articles: u32,
) -> bool {
    let report = match outcome {
        Ok(report) => report,
        Err(incomplete) => {
            error!(
                section = %section,
                error = %incomplete.cause,
                total_articles = incomplete.total_articles,
                expected_total_articles,
                missing_articles = ?incomplete.missing_articles,
                duplicate_article_paragraphs = ?incomplete.duplicate_article_paragraphs,
                "section validation incomplete"
            );
            return false;
        }
    };

    if report.is_valid(expected_total_articles) {
        info!(
            section = %section,
            total_articles = report.total_articles,
            "section passed structural validation"
        );
        return true;
    }

    error!(
        section = %section,
        total_articles = report.total_articles,
        expected_total_articles,
        "section failed structural validation"
    );
    if !report.missing_articles.is_empty() {
        error!(section = %section, articles = ?report.missing_articles, "missing articles");
    }
    for (article, paragraphs) in &report.missing_paragraphs {
        error!(section = %section, article, paragraphs = ?paragraphs, "missing paragraphs");
    }
    for (article, paragraph) in &report.duplicate_article_paragraphs {
        error!(section = %section, article, paragraph, "duplicate article/paragraph");
    }

    false
}

pub(super) fn render_parse_command(args: &ParseArgs) -> String {
    let mut command = vec![
        "legal-ingest".to_string(),
        "parse".to_string(),
        "--pages-path".to_string(),
        args.pages_path.display().to_string(),
        "--output-dir".to_string(),
        args.output_dir.display().to_string(),
        "--body-start".to_string(),
        args.body_start.to_string(),
        "--body-end".to_string(),
        args.body_end.to_string(),
        "--elucidation-start".to_string(),
        args.elucidation_start.to_string(),
        "--header-lines-to-skip".to_string(),
        args.header_lines_to_skip.to_string(),
        "--expected-total-articles".to_string(),
        args.expected_total_articles.to_string(),
        "--invalid-paragraph-policy".to_string(),
        InvalidParagraphPolicy::from(args.invalid_paragraph_policy)
            .as_str()
            .to_string(),
    ];

    if let Some(path) = &args.rules_path {
        command.push("--rules-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.trace_path {
        command.push("--trace-path".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}
