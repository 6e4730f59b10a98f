use staylens::aggregate::{LIST_DELIMITER, TREEMAP_ROOT, aggregate};
use staylens::error::StaylensError;
use staylens::store::{RawRow, Value};

fn amenity_row(value: Value) -> RawRow {
    let mut row = RawRow::new();
    row.push("amenities", value);
    row
}

fn amenity_rows(values: &[&str]) -> Vec<RawRow> {
    values
        .iter()
        .map(|v| amenity_row(Value::Text(v.to_string())))
        .collect()
}

#[test]
fn empty_input_yields_empty_table() {
    let table = aggregate(&[], "amenities", LIST_DELIMITER).expect("aggregate ok");
    assert!(table.is_empty());
}

#[test]
fn all_null_input_yields_empty_table() {
    let rows = vec![amenity_row(Value::Null), amenity_row(Value::Null)];
    let table = aggregate(&rows, "amenities", LIST_DELIMITER).expect("aggregate ok");
    assert!(table.is_empty());
}

#[test]
fn missing_column_is_an_error() {
    let rows = amenity_rows(&["wifi, TV"]);
    let err = aggregate(&rows, "host_verifications", LIST_DELIMITER).unwrap_err();
    assert!(matches!(err, StaylensError::MissingColumn(_)));
}

#[test]
fn counts_merge_case_variants() {
    let rows = amenity_rows(&["wifi, TV", "WiFi, parking"]);
    let table = aggregate(&rows, "amenities", LIST_DELIMITER).expect("aggregate ok");
    assert_eq!(table.len(), 3);
    assert_eq!(table[0].token, "wifi");
    assert_eq!(table[0].count, 2);
    assert_eq!(table[0].ratio_percent, 100.0);
    // both rows counted, so tv and parking each sit at 50%
    assert_eq!(table[1].token, "tv");
    assert_eq!(table[1].count, 1);
    assert_eq!(table[1].ratio_percent, 50.0);
    assert_eq!(table[2].token, "parking");
    assert_eq!(table[2].count, 1);
    assert_eq!(table[2].ratio_percent, 50.0);
}

#[test]
fn every_entry_carries_the_root_label() {
    let rows = amenity_rows(&["wifi, TV"]);
    let table = aggregate(&rows, "amenities", LIST_DELIMITER).expect("aggregate ok");
    assert!(table.iter().all(|f| f.parent == TREEMAP_ROOT));
}

#[test]
fn reruns_are_bit_identical() {
    let rows = amenity_rows(&["wifi, TV, pool", "WiFi, parking", "pool, tv, wifi"]);
    let first = aggregate(&rows, "amenities", LIST_DELIMITER).expect("aggregate ok");
    let second = aggregate(&rows, "amenities", LIST_DELIMITER).expect("aggregate ok");
    assert_eq!(first, second);
}

#[test]
fn ties_keep_first_encounter_order() {
    let rows = amenity_rows(&["washer, dryer", "heating, washer, dryer"]);
    let table = aggregate(&rows, "amenities", LIST_DELIMITER).expect("aggregate ok");
    assert_eq!(table[0].token, "washer");
    assert_eq!(table[1].token, "dryer");
    assert_eq!(table[2].token, "heating");
}

#[test]
fn empty_cells_stay_out_of_the_denominator() {
    let rows = vec![
        amenity_row(Value::Text(String::new())),
        amenity_row(Value::Text("wifi".to_string())),
    ];
    let table = aggregate(&rows, "amenities", LIST_DELIMITER).expect("aggregate ok");
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].token, "wifi");
    assert_eq!(table[0].ratio_percent, 100.0, "empty cell must not dilute the ratio");
}

#[test]
fn delimiter_only_cells_contribute_no_tokens() {
    let rows = vec![amenity_row(Value::Text(", ".to_string()))];
    let table = aggregate(&rows, "amenities", LIST_DELIMITER).expect("aggregate ok");
    assert!(table.is_empty(), "no empty-string token may appear");
}

#[test]
fn tokens_are_trimmed() {
    let rows = amenity_rows(&["wifi ,  TV"]);
    let table = aggregate(&rows, "amenities", ",").expect("aggregate ok");
    assert_eq!(table[0].token, "wifi");
    assert_eq!(table[1].token, "tv");
}

#[test]
fn ratio_and_count_invariants_hold() {
    let rows = amenity_rows(&["wifi, TV, pool", "WiFi", "tv, wifi, dryer, heating"]);
    let table = aggregate(&rows, "amenities", LIST_DELIMITER).expect("aggregate ok");
    let total: u64 = table.iter().map(|f| f.count).sum();
    assert!(total >= 3, "each counted row contributes at least one token");
    for frequency in &table {
        assert!(frequency.count >= 1);
        assert!(frequency.ratio_percent > 0.0);
        assert!(frequency.ratio_percent <= 100.0);
    }
}
