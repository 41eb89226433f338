use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Weekday – the seven listing days in canonical order
// ---------------------------------------------------------------------------

/// Day of the week a listing was posted.
///
/// The derived `Ord` follows declaration order, which is the canonical
/// Monday-first order used by the weekday scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Position in the canonical week (Monday = 0).
    pub fn rank(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = ();

    /// Accepts full names and three-letter abbreviations, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Weekday::ALL
            .into_iter()
            .find(|day| {
                let name = day.name();
                s.eq_ignore_ascii_case(name) || s.eq_ignore_ascii_case(&name[..3])
            })
            .ok_or(())
    }
}

// ---------------------------------------------------------------------------
// PriceRange – the open interval a listing price must fall into
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Exclusive lower bound.
    pub min: f64,
    /// Exclusive upper bound.
    pub max: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 1_000.0,
            max: 100_000.0,
        }
    }
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price > self.min && price < self.max
    }
}

// ---------------------------------------------------------------------------
// CarRecord – one validated listing
// ---------------------------------------------------------------------------

/// A single used-car listing (one row of the source table).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarRecord {
    pub manufacturer: String,
    /// Coarse country/ownership group used for colouring and filtering.
    pub brand_group: String,
    pub weekday: Option<Weekday>,
    pub price: f64,
    pub age: Option<f64>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl CarRecord {
    /// Convenience constructor used by tests and the sample generator.
    pub fn new(manufacturer: &str, brand_group: &str, price: f64) -> Self {
        Self {
            manufacturer: manufacturer.to_string(),
            brand_group: brand_group.to_string(),
            weekday: None,
            price,
            age: None,
            year: None,
            month: None,
        }
    }

    pub fn with_weekday(mut self, weekday: Weekday) -> Self {
        self.weekday = Some(weekday);
        self
    }
}

/// Why a source row did not become a [`CarRecord`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowRejection {
    #[error("missing manufacturer")]
    MissingManufacturer,
    #[error("price '{0}' is not a number")]
    InvalidPrice(String),
    #[error("missing price")]
    MissingPrice,
    #[error("price {0} outside accepted range")]
    PriceOutOfRange(f64),
}

impl RowRejection {
    /// Short stable label used for tallying rejections.
    pub fn kind(&self) -> &'static str {
        match self {
            RowRejection::MissingManufacturer => "missing manufacturer",
            RowRejection::InvalidPrice(_) => "invalid price",
            RowRejection::MissingPrice => "missing price",
            RowRejection::PriceOutOfRange(_) => "price out of range",
        }
    }
}

// ---------------------------------------------------------------------------
// CarDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full validated dataset plus what was dropped on the way in.
#[derive(Debug, Clone, Default)]
pub struct CarDataset {
    pub records: Vec<CarRecord>,
    /// Every brand group seen in `records`, sorted.
    pub brand_groups: BTreeSet<String>,
    /// Rejected row counts keyed by [`RowRejection::kind`].
    pub rejected: BTreeMap<&'static str, usize>,
    pub source: Option<PathBuf>,
}

impl CarDataset {
    pub fn from_records(records: Vec<CarRecord>) -> Self {
        let brand_groups = records.iter().map(|r| r.brand_group.clone()).collect();
        CarDataset {
            records,
            brand_groups,
            rejected: BTreeMap::new(),
            source: None,
        }
    }

    pub fn record_rejection(&mut self, rejection: &RowRejection) {
        *self.rejected.entry(rejection.kind()).or_default() += 1;
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Drop records outside `range`, tallying them as out-of-range rejections.
    pub fn retain_price_range(&mut self, range: &PriceRange) {
        let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|r| range.contains(r.price));
        for record in &dropped {
            self.record_rejection(&RowRejection::PriceOutOfRange(record.price));
        }
        self.records = kept;
        self.brand_groups = self.records.iter().map(|r| r.brand_group.clone()).collect();
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_parses_names_and_abbreviations() {
        assert_eq!("sunday".parse::<Weekday>(), Ok(Weekday::Sunday));
        assert_eq!(" Wed ".parse::<Weekday>(), Ok(Weekday::Wednesday));
        assert_eq!("MONDAY".parse::<Weekday>(), Ok(Weekday::Monday));
        assert!("funday".parse::<Weekday>().is_err());
    }

    #[test]
    fn weekday_order_is_monday_first() {
        assert!(Weekday::Monday < Weekday::Sunday);
        assert_eq!(Weekday::Sunday.rank(), 6);
    }

    #[test]
    fn narrowing_the_price_range_tallies_dropped_records() {
        let mut ds = CarDataset::from_records(vec![
            CarRecord::new("toyota", "Japan", 5_000.0),
            CarRecord::new("bmw", "Germany", 60_000.0),
        ]);
        ds.retain_price_range(&PriceRange {
            min: 1_000.0,
            max: 50_000.0,
        });
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].manufacturer, "toyota");
        assert!(!ds.brand_groups.contains("Germany"));
        assert_eq!(ds.rejected.get("price out of range"), Some(&1));
    }

    #[test]
    fn price_range_is_exclusive() {
        let range = PriceRange::default();
        assert!(!range.contains(1_000.0));
        assert!(range.contains(1_000.01));
        assert!(range.contains(99_999.0));
        assert!(!range.contains(100_000.0));
        assert!(!range.contains(f64::NAN));
    }

    #[test]
    fn dataset_collects_brand_groups() {
        let ds = CarDataset::from_records(vec![
            CarRecord::new("toyota", "Japan", 10_000.0),
            CarRecord::new("bmw", "Germany", 30_000.0),
            CarRecord::new("honda", "Japan", 12_000.0),
        ]);
        assert_eq!(ds.len(), 3);
        let groups: Vec<&str> = ds.brand_groups.iter().map(String::as_str).collect();
        assert_eq!(groups, vec!["Germany", "Japan"]);
    }
}
