use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// (manufacturer, brand group, typical price, relative listing volume)
const MAKES: &[(&str, &str, f64, u32)] = &[
    ("ford", "USA", 21000.0, 12),
    ("chevrolet", "USA", 23000.0, 11),
    ("jeep", "USA", 24000.0, 6),
    ("ram", "USA", 32000.0, 5),
    ("tesla", "USA", 42000.0, 2),
    ("bmw", "Germany", 30000.0, 5),
    ("mercedes-benz", "Germany", 33000.0, 5),
    ("audi", "Germany", 29000.0, 3),
    ("volkswagen", "Germany", 15000.0, 4),
    ("porsche", "Germany", 55000.0, 1),
    ("toyota", "Japan", 19000.0, 10),
    ("honda", "Japan", 16000.0, 8),
    ("nissan", "Japan", 14000.0, 7),
    ("subaru", "Japan", 17000.0, 4),
    ("hyundai", "Korea", 14500.0, 5),
    ("kia", "Korea", 15500.0, 4),
    ("land rover", "UK", 38000.0, 1),
    ("mini", "UK", 12000.0, 1),
    ("alfa-romeo", "Italy", 28000.0, 1),
    ("fiat", "Italy", 9000.0, 1),
    ("volvo", "Sweden", 22000.0, 2),
    ("harley-davidson", "Other", 13000.0, 1),
];

const LISTINGS: usize = 5000;
const CURRENT_YEAR: i64 = 2021;

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

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

#[derive(Debug, Serialize)]
struct Listing {
    manufacturer: &'static str,
    brand_group: &'static str,
    weekday: &'static str,
    price: f64,
    age: i64,
    year: i64,
    month: i64,
}

fn pick_make(rng: &mut SimpleRng) -> (&'static str, &'static str, f64) {
    let total: u32 = MAKES.iter().map(|m| m.3).sum();
    let mut ticket = rng.below(total as u64) as u32;
    for &(make, group, price, weight) in MAKES {
        if ticket < weight {
            return (make, group, price);
        }
        ticket -= weight;
    }
    let (make, group, price, _) = MAKES[0];
    (make, group, price)
}

fn generate(rng: &mut SimpleRng) -> Vec<Listing> {
    (0..LISTINGS)
        .map(|_| {
            let (manufacturer, brand_group, typical) = pick_make(rng);
            let age = rng.below(20) as i64;
            let weekday = DAYS[rng.below(7) as usize];
            // Weekend listings skew slightly pricier.
            let weekend = if weekday.starts_with('S') { 1.05 } else { 1.0 };
            let depreciation = 0.93f64.powi(age as i32);
            let noise = rng.gauss(1.0, 0.25).max(0.02);
            // A few rows land outside the accepted price window on purpose.
            let price = (typical * depreciation * weekend * noise).round();
            Listing {
                manufacturer,
                brand_group,
                weekday,
                price,
                age,
                year: CURRENT_YEAR - age,
                month: 1 + rng.below(12) as i64,
            }
        })
        .collect()
}

fn write_csv(path: &Path, listings: &[Listing]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for listing in listings {
        writer.serialize(listing)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, listings: &[Listing]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("manufacturer", DataType::Utf8, false),
        Field::new("brand_group", DataType::Utf8, false),
        Field::new("weekday", DataType::Utf8, false),
        Field::new("price", DataType::Float64, false),
        Field::new("age", DataType::Int64, false),
        Field::new("year", DataType::Int64, false),
        Field::new("month", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(listings.iter().map(|l| l.manufacturer))),
            Arc::new(StringArray::from_iter_values(listings.iter().map(|l| l.brand_group))),
            Arc::new(StringArray::from_iter_values(listings.iter().map(|l| l.weekday))),
            Arc::new(Float64Array::from_iter_values(listings.iter().map(|l| l.price))),
            Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.age))),
            Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.year))),
            Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.month))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let csv_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/used_cars_cleaned.csv"));
    let parquet_path = csv_path.with_extension("parquet");

    if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut rng = SimpleRng::new(42);
    let listings = generate(&mut rng);

    write_csv(&csv_path, &listings)?;
    write_parquet(&parquet_path, &listings)?;

    println!(
        "Wrote {} listings to {} and {}",
        listings.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
