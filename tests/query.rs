use chrono::NaiveDate;

use lanequery::{DataLoader, Error, Filter, FilterMap, Record, Schema, Value};

fn date(s: &str) -> Value {
    Value::Date(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
}

fn record(
    origin: &str,
    destination: &str,
    vehicle: &str,
    weight: f64,
    cost: f64,
    pickup: &str,
) -> Record {
    let mut r = Record::new();
    r.insert("backend_origin_location_code".into(), Value::from(origin));
    r.insert(
        "backend_destination_location_code".into(),
        Value::from(destination),
    );
    r.insert("backend_vehicle_type".into(), Value::from(vehicle));
    r.insert("backend_weight_kg".into(), Value::Float(weight));
    r.insert("backend_cost".into(), Value::Float(cost));
    r.insert("backend_pickup_date".into(), date(pickup));
    r
}

/// The two-row dataset used throughout: a small van shipment and a large
/// truck shipment a year apart.
fn two_row_loader() -> DataLoader {
    let rows = vec![
        record("NW16AA", "E148QS", "van", 10.0, 50.0, "2024-02-01"),
        record("E202AQ", "SW1A1AA", "truck", 500.0, 900.0, "2023-06-01"),
    ];
    DataLoader::from_dataset(
        Schema::shipping(),
        lanequery::Dataset::from_records(rows),
    )
}

#[test]
fn equality_filter_end_to_end() {
    let loader = two_row_loader();
    let mut filters = FilterMap::new();
    filters.insert("vehicle_type".into(), Filter::scalar("van"));

    let result = loader.query(&filters, &["cost", "pickup_date"]).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(
        result.columns(),
        &["cost", "pickup_date", "origin_prefix", "destination_prefix"]
    );
    assert_eq!(result.get(0, "cost"), Some(&Value::Float(50.0)));
    assert_eq!(result.get(0, "pickup_date"), Some(&date("2024-02-01")));
    assert_eq!(result.get(0, "origin_prefix"), Some(&Value::from("NW1")));
    assert_eq!(
        result.get(0, "destination_prefix"),
        Some(&Value::from("E14"))
    );
}

#[test]
fn prefixes_included_even_when_not_requested() {
    let loader = two_row_loader();
    let result = loader.query(&FilterMap::new(), &["cost"]).unwrap();
    assert_eq!(
        result.columns(),
        &["cost", "origin_prefix", "destination_prefix"]
    );
    assert_eq!(result.len(), 2);
}

#[test]
fn duplicate_requested_columns_are_coalesced() {
    let loader = two_row_loader();
    let result = loader
        .query(&FilterMap::new(), &["cost", "cost", "origin_prefix"])
        .unwrap();
    assert_eq!(
        result.columns(),
        &["cost", "origin_prefix", "destination_prefix"]
    );
}

#[test]
fn numeric_range_keeps_inclusive_bounds() {
    let rows = vec![
        record("NW16AA", "E148QS", "van", 5.0, 10.0, "2024-01-01"),
        record("NW16AA", "E148QS", "van", 10.0, 20.0, "2024-01-02"),
        record("NW16AA", "E148QS", "van", 15.0, 30.0, "2024-01-03"),
        record("NW16AA", "E148QS", "van", 20.0, 40.0, "2024-01-04"),
    ];
    let loader =
        DataLoader::from_dataset(Schema::shipping(), lanequery::Dataset::from_records(rows));

    let mut filters = FilterMap::new();
    filters.insert("weight_kg".into(), Filter::range(9.0, 11.0));
    let result = loader.query(&filters, &["weight_kg"]).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0, "weight_kg"), Some(&Value::Float(10.0)));

    // Inclusive at both ends.
    let mut filters = FilterMap::new();
    filters.insert("weight_kg".into(), Filter::range(10.0, 15.0));
    let result = loader.query(&filters, &["weight_kg"]).unwrap();
    assert_eq!(result.len(), 2);
}

#[test]
fn prefix_filter_on_location_code() {
    let loader = two_row_loader();

    let mut filters = FilterMap::new();
    filters.insert("origin_location_code".into(), Filter::scalar("NW1%"));
    assert_eq!(loader.query(&filters, &["cost"]).unwrap().len(), 1);

    let mut filters = FilterMap::new();
    filters.insert("origin_location_code".into(), Filter::scalar("NW2%"));
    assert!(loader.query(&filters, &["cost"]).unwrap().is_empty());
}

#[test]
fn date_window_is_inclusive() {
    let loader = two_row_loader();
    let mut filters = FilterMap::new();
    filters.insert(
        "pickup_date".into(),
        Filter::bounded("2024-01-01", "2024-03-31", "DATE").unwrap(),
    );
    let result = loader.query(&filters, &["pickup_date"]).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0, "pickup_date"), Some(&date("2024-02-01")));

    // The window edge itself matches.
    let mut filters = FilterMap::new();
    filters.insert(
        "pickup_date".into(),
        Filter::bounded("2023-06-01", "2023-06-01", "DATE").unwrap(),
    );
    assert_eq!(loader.query(&filters, &["cost"]).unwrap().len(), 1);
}

#[test]
fn conjunctive_filters_commute() {
    let loader = two_row_loader();

    let mut ab = FilterMap::new();
    ab.insert("vehicle_type".into(), Filter::scalar("van"));
    ab.insert("weight_kg".into(), Filter::range(0.0, 100.0));

    // Same two filters inserted in the opposite order.
    let mut ba = FilterMap::new();
    ba.insert("weight_kg".into(), Filter::range(0.0, 100.0));
    ba.insert("vehicle_type".into(), Filter::scalar("van"));

    let left = loader.query(&ab, &["cost"]).unwrap();
    let right = loader.query(&ba, &["cost"]).unwrap();
    assert_eq!(left, right);
    assert_eq!(left.len(), 1);
}

#[test]
fn filters_can_reference_derived_prefixes() {
    let loader = two_row_loader();
    let mut filters = FilterMap::new();
    filters.insert("origin_prefix".into(), Filter::scalar("E20"));
    let result = loader.query(&filters, &["cost"]).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0, "cost"), Some(&Value::Float(900.0)));
}

#[test]
fn unknown_field_fails_fast() {
    let loader = two_row_loader();

    let mut filters = FilterMap::new();
    filters.insert("not_a_field".into(), Filter::scalar(1i64));
    assert!(matches!(
        loader.query(&filters, &[]),
        Err(Error::UnknownField(f)) if f == "not_a_field"
    ));

    assert!(matches!(
        loader.query(&FilterMap::new(), &["not_a_field"]),
        Err(Error::UnknownField(_))
    ));
}

#[test]
fn distinct_values_sorted_deduplicated_and_stable() {
    let rows = vec![
        record("NW16AA", "E148QS", "van", 10.0, 50.0, "2024-02-01"),
        record("E202AQ", "SW1A1AA", "truck", 500.0, 900.0, "2023-06-01"),
        record("M11AE", "LS81AB", "van", 20.0, 80.0, "2024-03-01"),
    ];
    let loader =
        DataLoader::from_dataset(Schema::shipping(), lanequery::Dataset::from_records(rows));

    let values = loader.distinct_values("vehicle_type", None).unwrap();
    assert_eq!(values, vec![Value::from("truck"), Value::from("van")]);

    // Pure function of dataset + filters.
    let again = loader.distinct_values("vehicle_type", None).unwrap();
    assert_eq!(values, again);

    // Narrowing filters apply before deduplication.
    let mut filters = FilterMap::new();
    filters.insert("weight_kg".into(), Filter::range(0.0, 100.0));
    let narrowed = loader
        .distinct_values("vehicle_type", Some(&filters))
        .unwrap();
    assert_eq!(narrowed, vec![Value::from("van")]);
}

#[test]
fn distinct_values_exclude_nulls() {
    let mut incomplete = Record::new();
    incomplete.insert("backend_vehicle_type".into(), Value::Null);
    incomplete.insert("backend_origin_location_code".into(), Value::from("NW16AA"));
    let rows = vec![
        incomplete,
        record("E202AQ", "SW1A1AA", "truck", 500.0, 900.0, "2023-06-01"),
    ];
    let loader =
        DataLoader::from_dataset(Schema::shipping(), lanequery::Dataset::from_records(rows));

    let values = loader.distinct_values("vehicle_type", None).unwrap();
    assert_eq!(values, vec![Value::from("truck")]);
}

#[test]
fn distinct_prefixes_for_location_codes_only() {
    let rows = vec![
        record("NW16AA", "E148QS", "van", 10.0, 50.0, "2024-02-01"),
        record("NW19ZZ", "SW1A1AA", "van", 12.0, 55.0, "2024-02-02"),
        record("E202AQ", "SW1A1AA", "truck", 500.0, 900.0, "2023-06-01"),
    ];
    let loader =
        DataLoader::from_dataset(Schema::shipping(), lanequery::Dataset::from_records(rows));

    let prefixes = loader
        .distinct_prefixes("origin_location_code", None, None)
        .unwrap();
    assert_eq!(prefixes, vec!["E20", "NW1"]);

    // Dependent narrowing: only vans remain, so only NW1 origins.
    let mut filters = FilterMap::new();
    filters.insert("vehicle_type".into(), Filter::scalar("van"));
    let narrowed = loader
        .distinct_prefixes("origin_location_code", Some(&filters), None)
        .unwrap();
    assert_eq!(narrowed, vec!["NW1"]);

    // Custom prefix length.
    let wide = loader
        .distinct_prefixes("destination_location_code", None, Some(4))
        .unwrap();
    assert_eq!(wide, vec!["E148", "SW1A"]);

    assert!(matches!(
        loader.distinct_prefixes("vehicle_type", None, None),
        Err(Error::InvalidField(_))
    ));
}

#[test]
fn range_filter_on_text_column_signals_instead_of_dropping() {
    let loader = two_row_loader();
    let mut filters = FilterMap::new();
    filters.insert("vehicle_type".into(), Filter::range(1.0, 2.0));
    assert!(matches!(
        loader.query(&filters, &["cost"]),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn unsupported_filter_kind_is_rejected_at_the_boundary() {
    assert!(matches!(
        Filter::bounded(1.0, 2.0, "APPROX"),
        Err(Error::UnsupportedFilterKind(k)) if k == "APPROX"
    ));
}

#[test]
fn csv_round_trip_through_a_real_file() {
    let path = std::env::temp_dir().join("lanequery_query_test.csv");
    let contents = "\
backend_origin_location_code,backend_destination_location_code,backend_vehicle_type,backend_weight_kg,backend_cost,backend_pickup_date
NW16AA,E148QS,van,10,50,2024-02-01
E202AQ,SW1A1AA,truck,500,900,2023-06-01
";
    std::fs::write(&path, contents).unwrap();

    let loader =
        DataLoader::new(lanequery::Source::File(path.clone()), Schema::shipping()).unwrap();
    std::fs::remove_file(&path).ok();

    let mut filters = FilterMap::new();
    filters.insert("vehicle_type".into(), Filter::scalar("van"));
    let result = loader.query(&filters, &["cost", "pickup_date"]).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0, "cost"), Some(&Value::Float(50.0)));
    assert_eq!(result.get(0, "origin_prefix"), Some(&Value::from("NW1")));
    assert_eq!(
        result.get(0, "destination_prefix"),
        Some(&Value::from("E14"))
    );
}

#[test]
fn json_records_load_with_schema_typing() {
    let path = std::env::temp_dir().join("lanequery_query_test.json");
    let contents = r#"[
        {"backend_origin_location_code": "NW16AA", "backend_destination_location_code": "E148QS",
         "backend_vehicle_type": "van", "backend_weight_kg": 10,
         "backend_cost": 50.0, "backend_pickup_date": "2024-02-01"},
        {"backend_origin_location_code": "E202AQ", "backend_destination_location_code": "SW1A1AA",
         "backend_vehicle_type": "truck", "backend_weight_kg": 500,
         "backend_cost": 900.0, "backend_pickup_date": "2023-06-01"}
    ]"#;
    std::fs::write(&path, contents).unwrap();

    let loader =
        DataLoader::new(lanequery::Source::File(path.clone()), Schema::shipping()).unwrap();
    std::fs::remove_file(&path).ok();

    // Integer weights are coerced to the schema's float kind, date strings
    // to dates, so typed filters work the same as for CSV.
    let mut filters = FilterMap::new();
    filters.insert("weight_kg".into(), Filter::range(9.0, 11.0));
    filters.insert(
        "pickup_date".into(),
        Filter::bounded("2024-01-01", "2024-12-31", "DATE").unwrap(),
    );
    let result = loader.query(&filters, &["cost"]).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0, "cost"), Some(&Value::Float(50.0)));
}

#[test]
fn rows_keep_source_order() {
    let rows = vec![
        record("NW16AA", "E148QS", "van", 30.0, 90.0, "2024-03-01"),
        record("NW19ZZ", "E148QS", "van", 10.0, 30.0, "2024-01-01"),
        record("NW12AB", "E148QS", "van", 20.0, 60.0, "2024-02-01"),
    ];
    let loader =
        DataLoader::from_dataset(Schema::shipping(), lanequery::Dataset::from_records(rows));

    let result = loader.query(&FilterMap::new(), &["cost"]).unwrap();
    let costs: Vec<_> = result.column("cost").unwrap();
    assert_eq!(
        costs,
        vec![&Value::Float(90.0), &Value::Float(30.0), &Value::Float(60.0)]
    );
}
