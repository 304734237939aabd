mod common;

use std::process::Command;

use mud_report_metrics::{
    SourceDocument, Template, ViewRequest, build_report, columns, comparison_csv, fields,
    process_documents,
};
use tempfile::tempdir;

fn baku_document(name: &str, well: &str, date: &str, mud_weight: &str) -> SourceDocument {
    let bytes = common::report_pdf_bytes(&common::baku_report(well, date, mud_weight))
        .expect("PDF fixture should be created");
    SourceDocument::new(name, bytes)
}

#[test]
fn extracts_fields_from_a_generated_baku_report() {
    let document = baku_document("day-1.pdf", "GUN-204", "03/14/24", "10.2");
    let report = build_report(&[document], &ViewRequest::new(Template::ShakerScreen));

    assert!(report.failures.is_empty(), "failures: {:?}", report.failures);
    let row = &report.table.rows[0];
    assert_eq!(row.text(fields::WELL_NAME), Some("GUN-204"));
    assert_eq!(row.number(fields::MUD_WEIGHT), 10.2);
    assert_eq!(row.number(fields::PV), 12.0);
    assert_eq!(row.number(fields::SCREEN_COUNT), 2.0);
    assert_eq!(row.number(columns::GPM_TOTAL), 600.0);
    assert_eq!(row.number(columns::GPM_PER_SCREEN), 300.0);
    assert!(row.date.is_some());
}

#[test]
fn unreadable_document_does_not_affect_its_siblings() {
    let documents = vec![
        baku_document("first.pdf", "GUN-204", "03/14/24", "10.2"),
        SourceDocument::new("second.pdf", b"this is not a pdf".to_vec()),
        baku_document("third.pdf", "GUN-205", "03/15/24", "10.4"),
    ];

    let outcome = process_documents(Template::ShakerScreen, &documents);
    let names = outcome
        .documents
        .iter()
        .map(|document| document.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["first.pdf", "third.pdf"]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].name, "second.pdf");
}

#[test]
fn rows_are_ordered_by_report_date() {
    let documents = vec![
        baku_document("late.pdf", "GUN-204", "03/20/24", "10.6"),
        baku_document("early.pdf", "GUN-204", "03/10/24", "10.1"),
    ];
    let report = build_report(&documents, &ViewRequest::new(Template::ShakerScreen));
    let order = report
        .table
        .rows
        .iter()
        .map(|row| row.document.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["early.pdf", "late.pdf"]);
}

#[test]
fn comparison_groups_reports_by_well() {
    let documents = vec![
        baku_document("a1.pdf", "GUN-204", "03/14/24", "10.0"),
        baku_document("a2.pdf", "GUN-204", "03/15/24", "11.0"),
        baku_document("b1.pdf", "GUN-310", "03/14/24", "9.0"),
    ];
    let request = ViewRequest::new(Template::ShakerScreen)
        .with_group_by(fields::WELL_NAME)
        .expect("well name is categorical");
    let report = build_report(&documents, &request);

    let aggregate = report.aggregate.as_ref().expect("grouped report");
    let gun_204 = aggregate.row("GUN-204").expect("group should exist");
    assert_eq!(gun_204.reports, 2);
    assert!((gun_204.values["Mud Weight Mean"] - 10.5).abs() < 1e-9);

    let (file_name, bytes) = comparison_csv(&report).expect("comparison should render");
    assert_eq!(file_name, "Well Name_comparison.csv");
    let csv = String::from_utf8(bytes).expect("csv is utf-8");
    assert!(csv.starts_with("Well Name,Reports,"), "unexpected CSV: {csv:?}");
    assert!(csv.contains("GUN-310,1,"), "unexpected CSV: {csv:?}");
}

#[test]
fn cli_writes_derived_csv() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("day-1.pdf");
    let output = dir.path().join("metrics.csv");
    common::write_report_pdf(&input, &common::baku_report("GUN-204", "03/14/24", "10.2"))
        .expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_mudreport"))
        .args([
            "extract",
            "-t",
            "shaker-screen",
            "-o",
            &output.to_string_lossy(),
            &input.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");
    assert_eq!(status.code(), Some(0));

    let csv = std::fs::read_to_string(&output).expect("CSV should be readable");
    assert!(csv.starts_with("Document,Well Name,"), "unexpected CSV: {csv:?}");
    assert!(csv.contains("day-1.pdf,GUN-204,"), "unexpected CSV: {csv:?}");
}

#[test]
fn cli_compare_writes_comparison_file() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("day-1.pdf");
    common::write_report_pdf(&input, &common::baku_report("GUN-204", "03/14/24", "10.2"))
        .expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_mudreport"))
        .args([
            "compare",
            "-t",
            "baku",
            "--group-by",
            "Well Name",
            "--out-dir",
            &dir.path().to_string_lossy(),
            &input.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");
    assert_eq!(status.code(), Some(0));
    assert!(dir.path().join("Well Name_comparison.csv").exists());
}

#[test]
fn cli_exits_with_code_2_when_no_document_is_readable() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("broken.pdf");
    std::fs::write(&input, b"not a pdf").expect("fixture should be written");

    let output = Command::new(env!("CARGO_BIN_EXE_mudreport"))
        .args(["extract", &input.to_string_lossy()])
        .output()
        .expect("CLI should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("broken.pdf").count(),
        1,
        "skipped file should be reported once: {stderr}"
    );
}

#[test]
fn cli_rejects_unknown_template() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("any.pdf");
    std::fs::write(&input, b"not a pdf").expect("fixture should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_mudreport"))
        .args(["summary", "-t", "weekly", &input.to_string_lossy()])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(1));
}
