use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::error::Result;

use super::filter::{Filter, FilterMap};
use super::model::RecordSet;

// ---------------------------------------------------------------------------
// Summary statistics over a result column
// ---------------------------------------------------------------------------

/// Plain summary of one numeric result column. Formatting belongs to the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Summarize the numeric values of `field` in a materialized result.
/// Null and non-numeric cells are skipped; returns None when nothing
/// numeric remains.
pub fn summarize(result: &RecordSet, field: &str) -> Option<Summary> {
    let cells = result.column(field)?;
    let mut values: Vec<f64> = cells.iter().filter_map(|v| v.as_f64()).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let median = if count % 2 == 1 {
        values[count / 2]
    } else {
        (values[count / 2 - 1] + values[count / 2]) / 2.0
    };

    Some(Summary {
        count,
        mean,
        median,
        min: values[0],
        max: values[count - 1],
    })
}

/// Extend a filter map with an inclusive `pickup_date` window covering the
/// last `days` days up to `today`. The trailing-window summaries ("last 3
/// months", "last 12 months") are built from this.
pub fn with_trailing_window(
    mut filters: FilterMap,
    date_field: &str,
    today: NaiveDate,
    days: i64,
) -> Result<FilterMap> {
    let from = today - Duration::days(days);
    filters.insert(
        date_field.to_string(),
        Filter::date_range(&from.to_string(), &today.to_string())?,
    );
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    fn costs(vals: &[f64]) -> RecordSet {
        RecordSet::new(
            vec!["cost".into()],
            vals.iter().map(|&v| vec![Value::Float(v)]).collect(),
        )
    }

    #[test]
    fn odd_count_median() {
        let s = summarize(&costs(&[50.0, 900.0, 100.0]), "cost").unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.median, 100.0);
        assert_eq!(s.min, 50.0);
        assert_eq!(s.max, 900.0);
        assert!((s.mean - 350.0).abs() < 1e-9);
    }

    #[test]
    fn even_count_median_averages() {
        let s = summarize(&costs(&[10.0, 20.0, 30.0, 40.0]), "cost").unwrap();
        assert_eq!(s.median, 25.0);
    }

    #[test]
    fn empty_or_non_numeric_yields_none() {
        assert!(summarize(&costs(&[]), "cost").is_none());
        let rs = RecordSet::new(vec!["cost".into()], vec![vec![Value::Null]]);
        assert!(summarize(&rs, "cost").is_none());
        assert!(summarize(&costs(&[1.0]), "missing").is_none());
    }

    #[test]
    fn trailing_window_is_inclusive_of_both_ends() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let filters =
            with_trailing_window(FilterMap::new(), "pickup_date", today, 90).unwrap();
        match &filters["pickup_date"] {
            Filter::DateRange(from, to) => {
                assert_eq!(*to, today);
                assert_eq!(*from, today - Duration::days(90));
            }
            other => panic!("expected a date range, got {other:?}"),
        }
    }
}
