use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use repotraffic::model::{CellValue, DateSpan};
use repotraffic::table::{fill, TimeSeriesTable};

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn span(a: &str, b: &str) -> DateSpan {
    DateSpan::new(day(a), day(b))
}

fn repos(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn history_a() -> TimeSeriesTable {
    let mut t = TimeSeriesTable::new();
    t.set_count(day("2024-01-01"), "A", 5);
    t.set_count(day("2024-01-02"), "A", 5);
    t
}

#[test]
fn empty_table_gets_zero_rows() {
    let t = fill(TimeSeriesTable::new(), span("2024-02-27", "2024-03-01"), &repos(&["A", "B"]));
    assert_eq!(t.len(), 4);
    for (_, row) in t.rows() {
        assert_eq!(row.len(), 2);
        assert!(row.values().all(|v| *v == CellValue::Count(0)));
    }
}

#[test]
fn single_day_span_gives_single_row() {
    let t = fill(TimeSeriesTable::new(), span("2024-01-05", "2024-01-05"), &repos(&["A"]));
    assert_eq!(t.dates().collect::<Vec<_>>(), vec![day("2024-01-05")]);
}

#[test]
fn empty_repo_list_gives_empty_rows() {
    let t = fill(TimeSeriesTable::new(), span("2024-01-01", "2024-01-03"), &[]);
    assert_eq!(t.len(), 3);
    assert!(t.rows().all(|(_, row)| row.is_empty()));
}

#[test]
fn new_repo_is_missing_on_existing_dates_and_zero_on_new_ones() {
    let t = fill(history_a(), span("2024-01-02", "2024-01-03"), &repos(&["A", "B"]));
    assert_eq!(t.get(&day("2024-01-01"), "A"), Some(CellValue::Count(5)));
    assert_eq!(t.get(&day("2024-01-01"), "B"), Some(CellValue::Missing));
    assert_eq!(t.get(&day("2024-01-02"), "B"), Some(CellValue::Missing));
    assert_eq!(t.get(&day("2024-01-03"), "A"), Some(CellValue::Count(0)));
    assert_eq!(t.get(&day("2024-01-03"), "B"), Some(CellValue::Count(0)));
}

#[test]
fn range_is_extended_never_truncated() {
    let mut history = TimeSeriesTable::new();
    history.set_count(day("2023-06-01"), "A", 1);
    history.set_count(day("2023-06-03"), "A", 3);

    let t = fill(history, span("2023-06-10", "2023-06-11"), &repos(&["A"]));
    assert_eq!(t.span(), Some(span("2023-06-01", "2023-06-11")));
    assert_eq!(t.len(), 11);
    assert_eq!(t.get(&day("2023-06-02"), "A"), Some(CellValue::Count(0)));
    assert_eq!(t.get(&day("2023-06-03"), "A"), Some(CellValue::Count(3)));
}

#[test]
fn range_covers_union_of_history_and_request() {
    let cases = [
        (("2024-01-01", "2024-01-02"), ("2023-12-25", "2023-12-28"), ("2023-12-25", "2024-01-02")),
        (("2024-01-01", "2024-01-02"), ("2024-01-01", "2024-01-01"), ("2024-01-01", "2024-01-02")),
        (("2024-01-01", "2024-01-02"), ("2024-01-05", "2024-01-09"), ("2024-01-01", "2024-01-09")),
    ];
    for ((hx, hy), (a, b), (ex, ey)) in cases {
        let mut history = TimeSeriesTable::new();
        history.set_count(day(hx), "A", 1);
        history.set_count(day(hy), "A", 1);
        let t = fill(history, span(a, b), &repos(&["A"]));
        assert_eq!(t.span(), Some(span(ex, ey)));
        assert_eq!(t.len() as i64, span(ex, ey).num_days());
    }
}

#[test]
fn filling_twice_changes_nothing() {
    let r = repos(&["A", "B", "C"]);
    let s = span("2023-12-30", "2024-01-04");
    let once = fill(history_a(), s, &r);
    let twice = fill(once.clone(), s, &r);
    assert_eq!(once, twice);
}

#[test]
fn every_row_holds_exactly_the_repo_list() {
    let mut history = history_a();
    history.set_count(day("2024-01-01"), "gone", 9);
    let r = repos(&["B", "A"]);
    let t = fill(history, span("2024-01-01", "2024-01-04"), &r);
    for (_, row) in t.rows() {
        let keys: Vec<_> = row.keys().cloned().collect();
        assert_eq!(keys, repos(&["A", "B"]));
    }
}

#[test]
fn existing_values_are_kept() {
    let mut history = TimeSeriesTable::new();
    history.set(day("2024-01-01"), "A", CellValue::Missing);
    history.set_count(day("2024-01-01"), "B", 0);
    let t = fill(history, span("2024-01-01", "2024-01-01"), &repos(&["A", "B"]));
    assert_eq!(t.get(&day("2024-01-01"), "A"), Some(CellValue::Missing));
    assert_eq!(t.get(&day("2024-01-01"), "B"), Some(CellValue::Count(0)));
}
