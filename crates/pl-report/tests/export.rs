//! Export tests for pl-report.

use std::path::PathBuf;

use pl_core::{ControlKey, Snapshot};
use pl_report::{ChangeLog, ExportFormat, PdfRenderer, ReportColumns, ReportError};

fn columns() -> ReportColumns {
    ReportColumns::new(vec![
        ("abertura".into(), "Valve (%)".to_string()),
        ("rpm".into(), "Electric motor (RPM (%))".to_string()),
        ("q(l/m)".into(), "Flow meter (Q (l/min))".to_string()),
    ])
}

fn snapshot(valve: &str, rpm: &str, flow: &str) -> Snapshot {
    let mut s = Snapshot::new();
    s.insert("abertura".into(), valve);
    s.insert("rpm".into(), rpm);
    s.insert("q(l/m)".into(), flow);
    s
}

fn sample_log() -> ChangeLog {
    let mut log = ChangeLog::new();
    log.take_note(
        &snapshot("0", "0 (0)", "0"),
        &ControlKey::from("rpm"),
        "890 (50)",
        &snapshot("0", "890 (50)", "0"),
    );
    log.take_note(
        &snapshot("0", "890 (50)", "0"),
        &ControlKey::from("abertura"),
        "50",
        &snapshot("50", "890 (50)", "226.3"),
    );
    log
}

#[test]
fn csv_has_before_change_after_blocks() {
    let bytes = sample_log().export(ExportFormat::Csv, &columns()).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines[0],
        "State,Valve (%),Electric motor (RPM (%)),Flow meter (Q (l/min))"
    );
    assert_eq!(lines[1], "Before,0,0 (0),0");
    assert_eq!(lines[2], "Change,,890 (50),");
    assert_eq!(lines[3], "After,0,890 (50),0");
    assert_eq!(lines[4], ",,,");
    assert_eq!(lines[5], "Before,0,890 (50),0");
    assert_eq!(lines[6], "Change,50,,");
    assert_eq!(lines[7], "After,50,890 (50),226.3");
    assert_eq!(lines[8], ",,,");
    assert!(lines[9].starts_with("Obtained at:,"));
    assert_eq!(lines.len(), 10);
}

#[test]
fn csv_timestamp_uses_day_month_year() {
    let bytes = sample_log().export(ExportFormat::Csv, &columns()).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let stamp = text
        .lines()
        .last()
        .and_then(|l| l.strip_prefix("Obtained at:,"))
        .unwrap();

    // dd/mm/yyyy hh:mm:ss
    assert_eq!(stamp.len(), 19);
    assert_eq!(&stamp[2..3], "/");
    assert_eq!(&stamp[5..6], "/");
    assert_eq!(&stamp[13..14], ":");
}

#[test]
fn pdf_without_fonts_reports_search_path() {
    let missing = std::env::temp_dir().join("pl_report_no_fonts_here");
    let _ = std::fs::remove_dir_all(&missing);
    let renderer = PdfRenderer::new(vec![missing.clone()], "LiberationSans");

    let err = sample_log()
        .export_with(ExportFormat::Pdf, &columns(), &renderer)
        .unwrap_err();
    match err {
        ReportError::FontsNotFound { family, searched } => {
            assert_eq!(family, "LiberationSans");
            assert_eq!(searched, vec![PathBuf::from(missing)]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_log_refuses_every_format() {
    let log = ChangeLog::new();
    for format in [ExportFormat::Csv, ExportFormat::Pdf] {
        assert!(matches!(
            log.export(format, &columns()),
            Err(ReportError::Empty)
        ));
    }
}
