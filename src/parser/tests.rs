use super::*;

fn body_rules() -> ParsingRules {
    ParsingRules::body().expect("built-in body rules compile")
}

fn elucidation_rules() -> ParsingRules {
    ParsingRules::elucidation().expect("built-in elucidation rules compile")
}

fn item(article: u32, paragraph: Option<u32>, text: &str) -> DocumentItem {
    DocumentItem::new(article, paragraph, text)
}

#[test]
fn flush_joins_prose_lines_with_single_spaces() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 1", "text1", "text2", "text3"]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(items, vec![item(1, None, "text1 text2 text3")]);
}

#[test]
fn ordered_list_lines_are_newline_joined() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 1", "lead:", "1. a", "2. b"]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(items, vec![item(1, None, "lead:\n1. a\n2. b")]);
}

#[test]
fn bare_marker_followed_by_next_number_starts_article() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 5", "isi lima", "Pasal", "6", "isi enam"]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(
        items,
        vec![item(5, None, "isi lima"), item(6, None, "isi enam")]
    );
}

#[test]
fn bare_marker_followed_by_out_of_sequence_number_is_prose() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 2", "sebagaimana dimaksud dalam", "Pasal", "6", "berlaku"]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(
        items,
        vec![item(2, None, "sebagaimana dimaksud dalam Pasal 6 berlaku")]
    );
}

#[test]
fn first_bare_marker_must_be_article_one() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal", "1", "pertama"], vec!["Pasal", "3", "ketiga"]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(items, vec![item(1, None, "pertama Pasal 3 ketiga")]);
}

#[test]
fn bare_marker_survives_skipped_lines_between_pages() {
    let rules = body_rules();
    let pages = vec![
        vec!["HEADER", "Pasal 1", "isi", "Pasal"],
        vec!["HEADER", "- 2 -", "2", "isi dua"],
    ];

    let items = parse(&pages, &rules, 1);

    assert_eq!(items, vec![item(1, None, "isi"), item(2, None, "isi dua")]);
}

#[test]
fn numbered_article_clears_pending_bare_marker() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 1", "isi", "Pasal", "Pasal 2", "dua"]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(items, vec![item(1, None, "isi"), item(2, None, "dua")]);
}

#[test]
fn bare_marker_pending_across_boundary_resolves_outside_article() {
    let rules = body_rules();

    let accepted = parse(
        &[vec!["Pasal 1", "isi", "Pasal", "BAB II", "2", "isi dua"]],
        &rules,
        0,
    );
    assert_eq!(accepted, vec![item(1, None, "isi"), item(2, None, "isi dua")]);

    let rejected = parse(
        &[vec!["Pasal 1", "isi", "Pasal", "BAB II", "lanjut", "Pasal 2", "dua"]],
        &rules,
        0,
    );
    assert_eq!(rejected, vec![item(1, None, "isi"), item(2, None, "dua")]);
}

#[test]
fn bare_marker_pending_at_end_of_input_is_dropped() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 1", "isi", "Pasal"]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(items, vec![item(1, None, "isi")]);
}

#[test]
fn bare_marker_after_largest_article_number_falls_back_to_prose() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 4294967295", "isi", "Pasal", "1", "lanjut"]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(items, vec![item(u32::MAX, None, "isi Pasal 1 lanjut")]);
}

#[test]
fn duplicate_paragraph_marker_is_discarded_by_default() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 1", "(1)", "satu", "(2)", "dua", "(2)", "lanjutan"]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(
        items,
        vec![item(1, Some(1), "satu"), item(1, Some(2), "dua lanjutan")]
    );
}

#[test]
fn keep_as_text_policy_appends_rejected_paragraph_marker() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 1", "(1)", "satu", "(2)", "dua", "(2)", "lanjutan"]];

    let items = Parser::new(&rules, 0)
        .with_policy(InvalidParagraphPolicy::KeepAsText)
        .parse(&pages);

    assert_eq!(
        items,
        vec![item(1, Some(1), "satu"), item(1, Some(2), "dua (2) lanjutan")]
    );
}

#[test]
fn stray_parenthesized_number_inside_prose_does_not_open_paragraph() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 4", "ketentuan umum", "(3)", "tetap berlaku"]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(items, vec![item(4, None, "ketentuan umum tetap berlaku")]);
}

#[test]
fn section_boundary_drops_text_until_next_article() {
    let rules = body_rules();
    let pages = vec![vec![
        "Pasal 1",
        "isi",
        "BAB II",
        "KETENTUAN LAIN",
        "Bagian Kesatu",
        "Judul Bagian",
        "Pasal 2",
        "isi dua",
    ]];

    let items = parse(&pages, &rules, 0);

    assert_eq!(items, vec![item(1, None, "isi"), item(2, None, "isi dua")]);
}

#[test]
fn end_marker_stops_the_whole_section() {
    let rules = body_rules();
    let pages = vec![
        vec!["Pasal 1", "isi", END_OF_BODY],
        vec!["Pasal 2", "tidak dibaca"],
    ];

    let items = parse(&pages, &rules, 0);

    assert_eq!(items, vec![item(1, None, "isi")]);
}

const END_OF_BODY: &str = crate::rules::END_OF_BODY_MARKER;

#[test]
fn parse_is_deterministic_and_article_numbers_never_decrease() {
    let rules = body_rules();
    let pages = body_fixture();

    let first = parse(&pages, &rules, 3);
    let second = parse(&pages, &rules, 3);

    assert_eq!(first, second);
    assert!(
        first
            .windows(2)
            .all(|pair| pair[0].article_number <= pair[1].article_number)
    );
}

#[test]
fn decision_sink_records_every_consumed_line() {
    let rules = body_rules();
    let pages = vec![vec!["HEADER", "Pasal 1", "(1)", "satu", "(1)", "- 2 -"]];
    let mut decisions = Vec::<LineDecision>::new();

    let items = Parser::new(&rules, 1).parse_with_sink(&pages, &mut decisions);

    assert_eq!(items, vec![item(1, Some(1), "satu")]);
    let actions = decisions
        .iter()
        .map(|decision| decision.action.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        actions,
        vec![
            Action::StartedArticle { number: 1 },
            Action::StartedParagraph { number: 1 },
            Action::Appended { list_item: false },
            Action::DiscardedParagraphMarker { candidate: 1 },
            Action::Skipped,
        ]
    );
    assert_eq!(decisions[0].page, 1);
    assert_eq!(decisions[0].line, 2);
}

#[test]
fn decision_sink_marks_rejoined_bare_marker() {
    let rules = body_rules();
    let pages = vec![vec!["Pasal 8", "Yang diatur oleh", "Pasal", "ini adalah:"]];
    let mut decisions = Vec::<LineDecision>::new();

    Parser::new(&rules, 0).parse_with_sink(&pages, &mut decisions);

    let last = decisions.last().expect("decisions recorded");
    assert!(last.bare_marker_rejoined);
    assert_eq!(last.text, "Pasal ini adalah:");
    assert_eq!(last.action, Action::Appended { list_item: false });
}

#[test]
fn parse_body_fixture() {
    let rules = body_rules();

    let items = parse(&body_fixture(), &rules, 3);

    assert_eq!(
        items,
        vec![
            item(1, None, "text1 text2 text3 text4 text5 text6 text7 text8"),
            item(2, Some(1), "text1 text2"),
            item(2, Some(2), "text1"),
            item(3, Some(1), "text1"),
            item(4, None, "text1 text2 text3"),
            item(
                5,
                Some(1),
                "text1 text2:\n1. ordered list 1\n2. ordered list 2\n3. ordered list 3 text3"
            ),
            item(
                5,
                Some(2),
                "text1:\na. ordered list 1;\nb. ordered list 2; dan\nc. ordered list 3 text2"
            ),
            item(6, None, "text1 text2"),
            item(7, Some(1), "text1 text2"),
            item(
                8,
                None,
                "Yang diatur oleh Pasal ini adalah:\n1. ordered list 1\n2. ordered list 2 text1\n3. ordered list 3"
            ),
        ]
    );
}

#[test]
fn parse_elucidation_fixture() {
    let rules = elucidation_rules();

    let items = parse(&elucidation_fixture(), &rules, 3);

    assert_eq!(
        items,
        vec![
            item(1, None, "Cukup jelas."),
            item(
                2,
                None,
                "Huruf a text1 text2\nHuruf b text1 text2\nHuruf c text1 text2"
            ),
            item(3, Some(1), "Cukup jelas."),
            item(3, Some(2), "text1 text2 text3"),
            item(3, Some(3), "Cukup jelas."),
            item(4, Some(1), "Huruf a text1 text2\nHuruf b text1 text2"),
            item(4, Some(2), "Cukup jelas."),
            item(5, None, "Yang dimaksud:\n1. text1 text2\n2. text1 text2"),
            item(6, Some(1), "Yang dimaksud:\na. text1 text2\nb. text1 text2"),
            item(
                6,
                Some(2),
                "Huruf a yaitu:\n1. text1 text2\n2. text1 text2\nHuruf b yaitu:\n1. text1 di antaranya:\na. text1 text2\nb. text1\n2. text1 text2\nHuruf c text1 text2"
            ),
        ]
    );
}

fn page(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

fn body_fixture() -> Vec<Vec<String>> {
    vec![
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 2 -",
            "text4 . . .",
            "Mengingat",
            ":",
            "Pasal 5 ayat (1) serta Pasal 20 ayat (1) dan ayat (2) Undang-",
            "UNDANG-UNDANG TENTANG LALU LINTAS DAN ANGKUTAN",
            "JALAN.",
            "BAB I",
            "KETENTUAN UMUM",
            "Pasal 1",
            "text1",
            "text2",
            "text3",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 3 -",
            "text6 . . .",
            "text4",
            "text5",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 4 -",
            "Pasal 2 . . .",
            "text6",
            "text7",
            "text8",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 5 -",
            "(2) . . .",
            "Pasal 2",
            "(1)",
            "text1",
            "text2",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 5 -",
            "Pasal 4 . . .",
            "(2)",
            "text1",
            "BAB II",
            "JUDUL BAB",
            "Bagian Kesatu",
            "Judul Bagian Kesatu",
            "Pasal 3",
            "(1)",
            "text1",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 6 -",
            "text3 . . .",
            "Pasal 4",
            "text1",
            "text2",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 7 -",
            "text1 . . .",
            "text3",
            "Bagian Kedua",
            "Judul Bagian Kedua",
            "Pasal 5",
            "(1)",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 8 -",
            "Pasal 6 . . .",
            "text1",
            "text2:",
            "1. ordered list 1",
            "2.",
            "ordered list 2",
            "3.",
            "ordered list 3",
            "text3",
            "(2)",
            "text1:",
            "a.",
            "ordered list 1;",
            "b. ordered list 2; dan",
            "c.",
            "ordered list 3",
            "text2",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 9 -",
            "Pasal 9 . . .",
            "Bagian Ketiga",
            "Judul Bagian Ketiga",
            "Pasal",
            "6",
            "text1",
            "text2",
            "Pasal",
            "7",
            "(1)",
            "text1",
            "text2",
            "Pasal 8",
            "Yang diatur oleh",
            "Pasal",
            "ini adalah:",
            "1.",
            "ordered list 1",
            "2. ordered list 2",
            "text1",
            "3. ordered list 3",
        ]),
    ]
}

fn elucidation_fixture() -> Vec<Vec<String>> {
    vec![
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 7 -",
            "text2 . . .",
            "II. PASAL DEMI PASAL",
            "Pasal 1",
            "Cukup jelas.",
            "Pasal 2",
            "Huruf a text1 text2",
            "Huruf b",
            "text1 text2",
            "Huruf c",
            "text1",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 8 -",
            "Ayat (3) . . .",
            "text2",
            "Pasal 3",
            "Ayat (1)",
            "Cukup jelas.",
            "Ayat (2)",
            "text1 text2",
            "text3",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 9 -",
            "Pasal 5 . . .",
            "Ayat (3)",
            "Cukup jelas.",
            "Pasal 4",
            "Ayat (1)",
            "Huruf a",
            "text1 text2",
            "Huruf b text1",
            "text2",
            "Ayat (2)",
            "Cukup jelas.",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 10 -",
            "Huruf b . . .",
            "Pasal 5",
            "Yang dimaksud:",
            "1. text1",
            "text2",
            "2.",
            "text1 text2",
            "Pasal 6",
            "Ayat (1)",
            "Yang dimaksud:",
            "a.",
            "text1 text2",
            "b. text1",
            "text2",
            "Ayat (2)",
            "Huruf a",
            "yaitu:",
            "1.",
            "text1 text2",
            "2. text1 text2",
        ]),
        page(&[
            "PRESIDEN",
            "REPUBLIK INDONESIA",
            "- 11 -",
            "Pasal 7 . . .",
            "Huruf b",
            "yaitu:",
            "1. text1",
            "di antaranya:",
            "a. text1 text2",
            "b.",
            "text1",
            "2.",
            "text1 text2",
            "Huruf c",
            "text1 text2",
        ]),
    ]
}
