//! End-to-end document assembly and citation scenarios.

use chrono::{TimeZone, Utc};
use compendium_kernel::{
    Applier, Block, CitationRequest, Document, DocumentIndex, Entry, InsertionOperation,
    OperationOutcome, apply_batch, render, resolve,
};
use std::collections::BTreeMap;

fn chat() -> BTreeMap<String, Block> {
    let at = |h, m| Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap();
    [
        Block::new("100", "Where should we eat tonight?")
            .with_author("ana")
            .with_timestamp(at(18, 2)),
        Block::new("101", "Ramen place by the station,\nit's cheap.")
            .with_author("bo")
            .with_timestamp(at(18, 5))
            .replying_to("100"),
        Block::new("102", "Also the night market.")
            .with_author("cy")
            .with_timestamp(at(18, 7)),
        Block::new("103", "Bring cash for the trains.")
            .with_author("ana")
            .with_timestamp(at(18, 9))
            .replying_to("90"),
        Block::new("104", "Get a day pass.")
            .with_author("bo")
            .with_timestamp(at(18, 11)),
    ]
    .into_iter()
    .map(|b| (b.id.clone(), b))
    .collect()
}

fn chat_batch() -> Vec<InsertionOperation> {
    vec![
        InsertionOperation::append("100", "Food"),
        InsertionOperation::append("101", "Food"),
        InsertionOperation::append("103", "Transport"),
        InsertionOperation::before("102", "Food", "101"),
        InsertionOperation::after("104", "Transport", "103"),
        InsertionOperation::append("999", "Food"),
    ]
}

#[test]
fn assembles_a_categorized_document() {
    let (text, report) =
        apply_batch("# Trip notes\n", &chat_batch(), &chat()).expect("batch applies");

    assert_eq!(report.requested, 6);
    assert_eq!(report.inserted, 5);
    assert_eq!(report.outcomes[5].outcome, OperationOutcome::SkippedUnknown);

    insta::assert_snapshot!(text, @r#"
    # Trip notes

    ## Food

    2024-05-01 18:02 **ana**: Where should we eat tonight? [#100]
    2024-05-01 18:07 **cy**: Also the night market. [#102]
    > ↳ re #100, ana: "Where should we eat tonight?"
    2024-05-01 18:05 **bo**: Ramen place by the station, it's cheap. [#101]

    ## Transport

    2024-05-01 18:09 **ana**: (re #90) Bring cash for the trains. [#103]
    2024-05-01 18:11 **bo**: Get a day pass. [#104]
    "#);
}

#[test]
fn reapplying_a_batch_changes_nothing() {
    let (once, _) = apply_batch("", &chat_batch(), &chat()).expect("batch applies");
    let (twice, report) = apply_batch(&once, &chat_batch(), &chat()).expect("batch applies");
    assert_eq!(once, twice);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped_duplicates(), 5);
}

#[test]
fn overlapping_batches_anchor_each_block_once() {
    let source = chat();
    let first = vec![
        InsertionOperation::append("100", "Food"),
        InsertionOperation::append("102", "Food"),
    ];
    let second = vec![
        InsertionOperation::prepend("102", "Misc"),
        InsertionOperation::append("101", "Misc"),
        InsertionOperation::after("100", "Misc", "101"),
    ];
    let (v1, _) = apply_batch("", &first, &source).expect("first batch applies");
    let (v2, _) = apply_batch(&v1, &second, &source).expect("second batch applies");

    let document = Document::parse(&v2).expect("result parses");
    let index = DocumentIndex::build(&document).expect("anchors stay unique");
    assert_eq!(index.anchor_count(), 3);
    for id in ["100", "101", "102"] {
        let occurrences = document
            .lines()
            .filter(|line| line.ends_with(&format!("[#{id}]")))
            .count();
        assert_eq!(occurrences, 1, "block {id} anchored {occurrences} times");
    }
}

#[test]
fn live_index_matches_a_fresh_scan_after_every_operation() {
    let source = chat();
    let mut applier = Applier::from_text("# Trip notes\n\n## Food\n").expect("document indexes");
    for op in chat_batch() {
        applier.apply_one(&op, &source);
        let rescanned = DocumentIndex::build(applier.document()).expect("still valid");
        assert_eq!(&rescanned, applier.index(), "index drifted after {op:?}");
    }
}

#[test]
fn index_round_trips_through_render() {
    let (text, _) = apply_batch("", &chat_batch(), &chat()).expect("batch applies");
    let document = Document::parse(&text).expect("parses");
    let before = DocumentIndex::build(&document).expect("indexes");
    let reparsed = Document::parse(&document.render()).expect("parses");
    let after = DocumentIndex::build(&reparsed).expect("indexes");
    assert_eq!(before, after);
}

#[test]
fn citation_scenarios_render_expected_markers() {
    let text = "Ramen is cheap here.";
    let single = render(
        text,
        &resolve(text, &[CitationRequest::new(5, ["42"])]).citations,
    );
    assert_eq!(single.text, "Ramen is cheap here.[1]");
    assert_eq!(single.footnotes[&1], vec!["42".to_string()]);

    let pair = render(
        text,
        &resolve(
            text,
            &[CitationRequest::new(4, ["1"]), CitationRequest::new(6, ["2"])],
        )
        .citations,
    );
    assert_eq!(pair.text, "Ramen is cheap here.[1][2]");
}

#[test]
fn entries_parse_render_and_serialize() {
    let raw = r#"{"id":"7","category":"Food","text":"Pho is good. Ramen is better! Sushi","citations":[{"atChar":30,"sources":[{"identifier":"3"}]},{"atChar":0,"sources":[{"identifier":"1"},{"identifier":"2"},{"identifier":"1"}]},{"atChar":500,"sources":[{"identifier":"9"}]}]}"#;
    let entry: Entry = serde_json::from_str(raw).expect("entry parses");
    let rendered = entry.render();
    assert_eq!(rendered.defects.len(), 1);
    assert_eq!(
        rendered.entry.text,
        "Pho is good.[1] Ramen is better! Sushi[2]"
    );
    assert_eq!(
        rendered.entry.footnotes[&1],
        vec!["1".to_string(), "2".to_string()]
    );
}
