//! Median-price lookup over a shipment CSV.
//!
//! Mirrors the pricing-dashboard flow: estimate the median cost of similar
//! shipments over the last 3 months, widening to 12 months without the
//! weight bound when nothing matches. The widening happens here, in the
//! caller, as a second explicit query; the core never auto-widens.
//!
//! Usage: price_lookup <shipments.csv> <vehicle_type> <origin_prefix> <destination_prefix> <weight_kg>

use anyhow::{bail, Context, Result};
use chrono::Local;

use lanequery::{summarize, with_trailing_window, DataLoader, Filter, FilterMap, Schema, Source};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [path, vehicle, origin, destination, weight] = args.as_slice() else {
        bail!("usage: price_lookup <shipments.csv> <vehicle_type> <origin_prefix> <destination_prefix> <weight_kg>");
    };
    let weight: f64 = weight
        .parse()
        .with_context(|| format!("'{weight}' is not a weight in kg"))?;

    let loader = DataLoader::new(Source::File(path.into()), Schema::shipping())?;
    let today = Local::now().date_naive();

    let mut filters = FilterMap::new();
    filters.insert("vehicle_type".into(), Filter::scalar(vehicle.as_str()));
    filters.insert(
        "origin_location_code".into(),
        Filter::scalar(format!("{origin}%").as_str()),
    );
    filters.insert(
        "destination_location_code".into(),
        Filter::scalar(format!("{destination}%").as_str()),
    );
    filters.insert(
        "weight_kg".into(),
        Filter::bounded(weight * 0.9, weight * 1.1, "RANGE")?,
    );
    let filters = with_trailing_window(filters, "pickup_date", today, 90)?;

    let result = loader.query(&filters, &["pickup_date", "cost"])?;

    if let Some(summary) = summarize(&result, "cost") {
        println!(
            "Estimated median cost over the last 3 months: £{:.2} ({} similar shipments)",
            summary.median, summary.count
        );
        return Ok(());
    }

    // Nothing similar in the last 3 months: widen to 12 months and drop the
    // weight bound.
    let mut widened = FilterMap::new();
    widened.insert("vehicle_type".into(), Filter::scalar(vehicle.as_str()));
    widened.insert(
        "origin_location_code".into(),
        Filter::scalar(format!("{origin}%").as_str()),
    );
    widened.insert(
        "destination_location_code".into(),
        Filter::scalar(format!("{destination}%").as_str()),
    );
    let widened = with_trailing_window(widened, "pickup_date", today, 365)?;

    let result = loader.query(&widened, &["pickup_date", "weight_kg", "cost"])?;
    match summarize(&result, "cost") {
        Some(summary) => println!(
            "No similar-weight shipments in the last 3 months. Median over the \
             last 12 months, any weight: £{:.2} ({} shipments)",
            summary.median, summary.count
        ),
        None => println!("No data found for the criteria. Try changing filters."),
    }
    Ok(())
}
