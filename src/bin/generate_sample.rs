use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// UK-style postcode: outward area + inward `<digit><letter><letter>`.
fn postcode(rng: &mut SimpleRng) -> String {
    const AREAS: &[&str] = &[
        "NW1", "NW3", "E14", "E20", "SW1", "SE15", "M1", "M20", "B33", "LS8", "G2", "EH1",
    ];
    const LETTERS: &[char] = &[
        'A', 'B', 'D', 'E', 'F', 'G', 'H', 'J', 'L', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'W',
    ];
    format!(
        "{}{}{}{}",
        rng.pick(AREAS),
        rng.next_u64() % 10,
        rng.pick(LETTERS),
        rng.pick(LETTERS),
    )
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);

    let vehicle_types = ["van", "truck", "lorry"];
    let contract_types = ["Marketplace", "Dedicated", "Spot"];
    let carriers = ["SwiftHaul", "BlueArrow", "CargoLine", "RedKite"];
    let shippers = ["Acme Retail", "Northwind Traders", "Globex"];

    // Vehicle type drives the base rate per km; cost also scales with weight.
    let base_rate = |vehicle: &str| match vehicle {
        "van" => 0.8,
        "truck" => 1.0,
        _ => 1.2,
    };

    let n_rows = 500;
    let anchor = NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid anchor date");

    let output_path = "shipments.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    writer.write_record([
        "backend_origin_location_code",
        "backend_destination_location_code",
        "backend_vehicle_type",
        "backend_contract_type",
        "backend_carrier_name",
        "backend_shipper_name",
        "backend_weight_kg",
        "backend_cost",
        "backend_route_distance_km",
        "backend_pickup_date",
    ])?;

    for _ in 0..n_rows {
        let origin = postcode(&mut rng);
        let destination = postcode(&mut rng);
        let vehicle = *rng.pick(&vehicle_types);
        let contract = *rng.pick(&contract_types);
        let carrier = *rng.pick(&carriers);
        let shipper = *rng.pick(&shippers);

        let distance_km = (rng.uniform(20.0, 800.0) * 10.0).round() / 10.0;
        let weight_kg = (rng.uniform(1.0, 200.0) * 10.0).round() / 10.0;
        let cost = (base_rate(vehicle) * distance_km * (0.8 + 0.4 * (weight_kg / 100.0)) * 100.0)
            .round()
            / 100.0;
        let pickup = anchor - Duration::days((rng.next_u64() % 540) as i64);

        let weight = weight_kg.to_string();
        let cost = cost.to_string();
        let distance = distance_km.to_string();
        let pickup = pickup.to_string();
        writer.write_record([
            origin.as_str(),
            destination.as_str(),
            vehicle,
            contract,
            carrier,
            shipper,
            weight.as_str(),
            cost.as_str(),
            distance.as_str(),
            pickup.as_str(),
        ])?;
    }

    writer.flush().context("flushing CSV")?;
    println!("Wrote {n_rows} shipment rows to {output_path}");
    Ok(())
}
