use chrono::NaiveDate;

use crate::errors::{NormalizeError, ParserError};
use crate::model::{CellValue, ColumnNames, Parameter};
use crate::normalize::{normalize_cell, normalize_text, require_numeric};
use crate::station_csv::{parse_sample_time, parse_station_csv};
use crate::workbook::{InMemoryWorkbook, SheetSource};

fn number(value: CellValue) -> f64 {
    value
        .as_number()
        .unwrap_or_else(|| panic!("expected a number, got {value:?}"))
}

#[test]
fn below_detection_limit_is_halved() {
    assert_eq!(number(normalize_text("<10")), 5.0);
    assert_eq!(number(normalize_text("< 0.02")), 0.01);
}

#[test]
fn parenthesized_value_wins_over_surrounding_text() {
    assert_eq!(number(normalize_text("(3.2)")), 3.2);
    assert_eq!(number(normalize_text("12 (3.2)")), 3.2);
}

#[test]
fn parentheses_take_priority_over_detection_limit() {
    assert_eq!(number(normalize_text("<5 (4)")), 4.0);
}

#[test]
fn unparseable_parenthesized_capture_falls_through() {
    assert_eq!(number(normalize_text("<8 (1.2.3)")), 4.0);
    assert_eq!(
        normalize_text("(1.2.3)"),
        CellValue::Text("(1.2.3)".to_string())
    );
}

#[test]
fn at_sign_yields_following_number() {
    assert_eq!(number(normalize_text("12@7.5")), 7.5);
}

#[test]
fn non_detect_and_not_available_map_to_zero() {
    assert_eq!(number(normalize_text("ND")), 0.0);
    assert_eq!(number(normalize_text("nd")), 0.0);
    assert_eq!(number(normalize_text(" Nd ")), 0.0);
    assert_eq!(number(normalize_text("N.A.")), 0.0);
    assert_eq!(
        normalize_text("n.a."),
        CellValue::Text("n.a.".to_string())
    );
}

#[test]
fn dashes_map_to_zero() {
    assert_eq!(number(normalize_text("-")), 0.0);
    assert_eq!(number(normalize_text("—")), 0.0);
    assert_eq!(number(normalize_text("*-*")), 0.0);
}

#[test]
fn asterisk_markers_are_stripped_once() {
    assert_eq!(number(normalize_text("*5*")), 5.0);
    assert_eq!(number(normalize_text("*5")), 5.0);
    assert_eq!(number(normalize_text("5*")), 5.0);
    assert_eq!(normalize_text("**5"), CellValue::Text("*5".to_string()));
}

#[test]
fn unrecognized_text_is_returned_stripped() {
    assert_eq!(normalize_text("abc"), CellValue::Text("abc".to_string()));
    assert_eq!(normalize_text("  abc* "), CellValue::Text("abc".to_string()));
}

#[test]
fn negative_and_implausible_numbers_are_kept() {
    assert_eq!(number(normalize_text("-3.5")), -3.5);
    assert_eq!(number(normalize_text("99999")), 99999.0);
}

#[test]
fn non_text_cells_pass_through() {
    let when = NaiveDate::from_ymd_opt(2021, 3, 4)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .expect("valid date");
    for cell in [
        CellValue::Empty,
        CellValue::Number(1.25),
        CellValue::Bool(true),
        CellValue::DateTime(when),
    ] {
        assert_eq!(normalize_cell(&cell), cell);
    }
}

#[test]
fn renormalizing_written_numbers_is_identity() {
    for value in [0.0, 5.0, 3.2, 0.015, 1234.5678, -2.0] {
        let written = CellValue::Number(value).to_string();
        assert_eq!(normalize_text(&written), CellValue::Number(value));
        assert_eq!(normalize_cell(&CellValue::Number(value)), CellValue::Number(value));
    }
}

#[test]
fn require_numeric_classifies_cells() {
    assert_eq!(require_numeric(&CellValue::Empty), Ok(None));
    assert_eq!(require_numeric(&CellValue::Number(2.0)), Ok(Some(2.0)));
    assert_eq!(
        require_numeric(&CellValue::Text("abc".into())),
        Err(NormalizeError::NotNumeric("abc".into()))
    );
    assert_eq!(
        require_numeric(&CellValue::Bool(false)),
        Err(NormalizeError::Boolean(false))
    );
}

#[test]
fn sample_time_accepts_common_layouts() {
    let expected = NaiveDate::from_ymd_opt(2020, 5, 17)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date");
    assert_eq!(parse_sample_time("2020-05-17 00:00:00"), Some(expected));
    assert_eq!(parse_sample_time("2020/05/17"), Some(expected));
    assert_eq!(parse_sample_time("2020-05-17"), Some(expected));
    assert_eq!(parse_sample_time("not a date"), None);
    assert_eq!(parse_sample_time(""), None);
}

fn station_csv(body: &str) -> String {
    let columns = ColumnNames::default();
    format!(
        "\u{feff}{},{},{},{},{},{}\n{}",
        columns.source_sheet,
        columns.sample_time,
        columns.suspended_solids,
        columns.ammonia_nitrogen,
        columns.bod,
        columns.total_phosphorus,
        body
    )
}

#[test]
fn station_csv_coerces_values_and_drops_bad_timestamps() {
    let content = station_csv(
        "G-1,2020-01-05 00:00:00,12,0.05,abc,\n\
         G-1,garbage,1,1,1,1\n\
         G-1,2021-02-01 00:00:00,55.5,0.2,1.5,30\n",
    );
    let parsed = parse_station_csv("G-1.csv", &content, &ColumnNames::default())
        .expect("station csv parse failed");

    assert_eq!(parsed.source, "G-1.csv");
    assert_eq!(parsed.dropped_rows, 1);
    assert_eq!(parsed.records.len(), 2);

    let first = &parsed.records[0];
    assert_eq!(first.value(Parameter::SuspendedSolids), Some(12.0));
    assert_eq!(first.value(Parameter::AmmoniaNitrogen), Some(0.05));
    assert_eq!(first.value(Parameter::Bod), None);
    assert_eq!(first.value(Parameter::TotalPhosphorus), None);
    assert_eq!(first.source, "G-1.csv");

    assert_eq!(parsed.records[1].value(Parameter::TotalPhosphorus), Some(30.0));
}

#[test]
fn station_csv_treats_infinite_values_as_missing() {
    let content = station_csv(
        "G-1,2020-01-05 00:00:00,inf,1e999,-inf,NaN\n\
         G-1,2020-02-05 00:00:00,12,0.1,1,2\n",
    );
    let parsed = parse_station_csv("G-1.csv", &content, &ColumnNames::default())
        .expect("station csv parse failed");

    assert_eq!(parsed.records.len(), 2);
    for parameter in Parameter::ALL {
        assert_eq!(parsed.records[0].value(parameter), None);
    }
    assert_eq!(parsed.records[1].value(Parameter::SuspendedSolids), Some(12.0));
}

#[test]
fn station_csv_reports_missing_columns() {
    let columns = ColumnNames::default();
    let content = format!(
        "{},{}\n2020-01-01,1\n",
        columns.sample_time, columns.suspended_solids
    );
    let err = parse_station_csv("partial.csv", &content, &columns)
        .expect_err("missing columns should fail");
    match err {
        ParserError::MissingColumns { source_name, missing } => {
            assert_eq!(source_name, "partial.csv");
            assert_eq!(missing.len(), 3);
            assert!(missing.contains(&columns.bod));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn in_memory_workbook_builds_headers_and_skips_blank_rows() {
    let mut workbook = InMemoryWorkbook::new().with_rows(
        "G-2",
        vec![
            vec!["採樣時間".into(), CellValue::Empty, " 總磷 ".into()],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
            vec!["2020-01-01".into(), 1.0.into()],
        ],
    );

    assert_eq!(workbook.sheet_names(), vec!["G-2".to_string()]);
    let sheet = workbook.read_sheet("G-2").expect("sheet exists");
    assert_eq!(sheet.headers, vec!["採樣時間", "Unnamed: 1", "總磷"]);
    assert_eq!(sheet.rows.len(), 1);
    assert_eq!(sheet.rows[0].len(), 3);
    assert_eq!(sheet.cell(0, 2), &CellValue::Empty);

    assert!(matches!(
        workbook.read_sheet("missing"),
        Err(ParserError::SheetNotFound(name)) if name == "missing"
    ));
}
