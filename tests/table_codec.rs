use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use repotraffic::error::TrafficError;
use repotraffic::model::CellValue;
use repotraffic::table::{self, deserialize, serialize, TimeSeriesTable};
use std::fs;
use tempfile::tempdir;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn repos(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn columns_follow_given_order_not_key_order() {
    let mut t = TimeSeriesTable::new();
    t.set_count(day("2024-01-02"), "b/z", 3);
    t.set(day("2024-01-02"), "a/y", CellValue::Missing);
    t.set_count(day("2024-01-01"), "b/z", 0);
    t.set_count(day("2024-01-01"), "a/y", 12);

    let text = serialize(&t, &repos(&["b/z", "a/y"]));
    assert_eq!(text, "date,b/z,a/y\n2024-01-01,0,12\n2024-01-02,3,NA\n");

    let text = serialize(&t, &repos(&["a/y", "b/z"]));
    assert_eq!(text, "date,a/y,b/z\n2024-01-01,12,0\n2024-01-02,NA,3\n");
}

#[test]
fn absent_cells_render_as_na() {
    let mut t = TimeSeriesTable::new();
    t.set_count(day("2024-03-01"), "o/a", 1);
    let text = serialize(&t, &repos(&["o/a", "o/b"]));
    assert_eq!(text, "date,o/a,o/b\n2024-03-01,1,NA\n");
}

#[test]
fn round_trip_preserves_table_and_order() {
    let order = repos(&["o/b", "o/a"]);
    let mut t = TimeSeriesTable::new();
    for (d, a, b) in [("2024-01-01", 5, 0), ("2024-01-02", 7, 2), ("2024-01-03", 3, 1)] {
        t.set_count(day(d), "o/a", a);
        t.set_count(day(d), "o/b", b);
    }
    t.set(day("2023-12-31"), "o/a", CellValue::Missing);
    t.set_count(day("2023-12-31"), "o/b", 4);

    let (parsed, parsed_order) = deserialize(&serialize(&t, &order)).unwrap();
    assert_eq!(parsed, t);
    assert_eq!(parsed_order, order);
}

#[test]
fn rows_out_of_order_come_back_sorted() {
    let text = "date,o/a\n2024-01-03,3\n2024-01-01,1\n2024-01-02,2\n";
    let (t, _) = deserialize(text).unwrap();
    let dates: Vec<_> = t.dates().collect();
    assert_eq!(dates, vec![day("2024-01-01"), day("2024-01-02"), day("2024-01-03")]);
    assert_eq!(serialize(&t, &repos(&["o/a"])), "date,o/a\n2024-01-01,1\n2024-01-02,2\n2024-01-03,3\n");
}

#[test]
fn legacy_datetime_cells_are_truncated() {
    let text = "date,o/a\n2024-01-01 00:00:00+00:00,4\n2024-01-02T00:00:00Z,NA\n";
    let (t, _) = deserialize(text).unwrap();
    assert_eq!(t.get(&day("2024-01-01"), "o/a"), Some(CellValue::Count(4)));
    assert_eq!(t.get(&day("2024-01-02"), "o/a"), Some(CellValue::Missing));
}

#[test]
fn empty_text_is_empty_table() {
    let (t, order) = deserialize("").unwrap();
    assert!(t.is_empty());
    assert!(order.is_empty());
}

#[test]
fn header_without_repos_has_empty_rows() {
    let (t, order) = deserialize("date\n2024-01-01\n").unwrap();
    assert!(order.is_empty());
    assert_eq!(t.len(), 1);
    assert!(t.row(&day("2024-01-01")).unwrap().is_empty());
}

#[test]
fn short_row_is_rejected() {
    let err = deserialize("date,o/a,o/b\n2024-01-01,1\n").unwrap_err();
    match err {
        TrafficError::Parse(msg) => assert!(msg.contains("line 2"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn long_row_is_rejected() {
    assert!(matches!(
        deserialize("date,o/a\n2024-01-01,1,2\n"),
        Err(TrafficError::Parse(_))
    ));
}

#[test]
fn malformed_date_is_rejected() {
    assert!(matches!(
        deserialize("date,o/a\nyesterday,1\n"),
        Err(TrafficError::Parse(_))
    ));
}

#[test]
fn malformed_value_is_rejected() {
    assert!(matches!(
        deserialize("date,o/a\n2024-01-01,-3\n"),
        Err(TrafficError::Parse(_))
    ));
    assert!(matches!(
        deserialize("date,o/a\n2024-01-01,n/a\n"),
        Err(TrafficError::Parse(_))
    ));
}

#[test]
fn signed_or_non_decimal_values_are_rejected() {
    for cell in ["+5", "", "0x5", "5.0", "18446744073709551616"] {
        let text = format!("date,o/a\n2024-01-01,{cell}\n");
        assert!(
            matches!(deserialize(&text), Err(TrafficError::Parse(_))),
            "accepted {cell:?}"
        );
    }
    let (t, _) = deserialize("date,o/a\n2024-01-01,007\n").unwrap();
    assert_eq!(t.get(&day("2024-01-01"), "o/a"), Some(CellValue::Count(7)));
}

#[test]
fn header_must_name_date_column() {
    assert!(matches!(
        deserialize("day,o/a\n2024-01-01,1\n"),
        Err(TrafficError::Parse(_))
    ));
}

#[test]
fn load_table_missing_file_is_none() {
    let dir = tempdir().unwrap();
    assert!(table::load_table(&dir.path().join("nope.csv")).unwrap().is_none());
}

#[test]
fn load_table_reports_path_on_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("views.csv");
    fs::write(&path, "date,o/a\n2024-01-01\n").unwrap();
    let err = table::load_table(&path).unwrap_err().to_string();
    assert!(err.contains("views.csv"), "{err}");
}

#[test]
fn load_table_unreadable_path_is_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("views.csv");
    fs::create_dir(&path).unwrap();
    assert!(matches!(table::load_table(&path), Err(TrafficError::Io(_))));
}
