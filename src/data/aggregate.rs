use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::{CarRecord, Weekday};

// ---------------------------------------------------------------------------
// Grouping key, metric and sort policy
// ---------------------------------------------------------------------------

/// Which record attribute a scene groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Manufacturer,
    BrandGroup,
    Weekday,
}

impl GroupKey {
    /// The grouping value of a record, or `None` if the record lacks it.
    pub fn key_of<'a>(self, record: &'a CarRecord) -> Option<&'a str> {
        match self {
            GroupKey::Manufacturer => Some(record.manufacturer.as_str()),
            GroupKey::BrandGroup => Some(record.brand_group.as_str()),
            GroupKey::Weekday => record.weekday.map(Weekday::name),
        }
    }

    /// Axis label for the categorical axis.
    pub fn label(self) -> &'static str {
        match self {
            GroupKey::Manufacturer => "Brand",
            GroupKey::BrandGroup => "Country group",
            GroupKey::Weekday => "Weekday",
        }
    }

    /// Position of `key` in this grouping's fixed order, if it has one.
    pub fn canonical_rank(self, key: &str) -> Option<usize> {
        match self {
            GroupKey::Weekday => key.parse::<Weekday>().ok().map(Weekday::rank),
            GroupKey::Manufacturer | GroupKey::BrandGroup => None,
        }
    }
}

/// The quantity plotted on the value axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MeanPrice,
    Count,
}

impl Metric {
    pub fn value(self, summary: &GroupSummary) -> f64 {
        match self {
            Metric::MeanPrice => summary.avg_price,
            Metric::Count => summary.count as f64,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::MeanPrice => "Average price ($)",
            Metric::Count => "Listings",
        }
    }
}

/// Final ordering of a scene's aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    AscendingMean,
    DescendingCount,
    /// The grouping key's fixed order (Monday..Sunday for weekdays).
    Canonical,
}

// ---------------------------------------------------------------------------
// GroupSummary – one aggregate entry
// ---------------------------------------------------------------------------

/// Per-key summary of the records sharing that key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub avg_price: f64,
    pub count: usize,
    /// Brand group of the first record seen for this key. Manufacturers map
    /// to exactly one group in the source data, so this is representative.
    pub category: Option<String>,
    /// Rank in the key's canonical order, when it has one.
    pub rank: Option<usize>,
}

struct Accumulator<'a> {
    sum: f64,
    count: usize,
    first_group: &'a str,
}

/// Group `records` by `key`, computing mean price and count per group.
///
/// Records without a value for `key` are skipped. Output is in key order;
/// callers apply a [`SortPolicy`] afterwards.
pub fn aggregate(records: &[CarRecord], key: GroupKey) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();

    for record in records {
        let Some(k) = key.key_of(record) else {
            continue;
        };
        let acc = groups.entry(k).or_insert_with(|| Accumulator {
            sum: 0.0,
            count: 0,
            first_group: record.brand_group.as_str(),
        });
        acc.sum += record.price;
        acc.count += 1;
    }

    groups
        .into_iter()
        .map(|(k, acc)| GroupSummary {
            key: k.to_string(),
            avg_price: acc.sum / acc.count as f64,
            count: acc.count,
            category: match key {
                GroupKey::Weekday => None,
                GroupKey::Manufacturer | GroupKey::BrandGroup => {
                    Some(acc.first_group.to_string())
                }
            },
            rank: key.canonical_rank(k),
        })
        .collect()
}

/// Stable sort of an aggregate according to `policy`.
pub fn sort_summaries(summaries: &mut [GroupSummary], policy: SortPolicy) {
    match policy {
        SortPolicy::AscendingMean => {
            summaries.sort_by(|a, b| a.avg_price.total_cmp(&b.avg_price));
        }
        SortPolicy::DescendingCount => {
            summaries.sort_by(|a, b| b.count.cmp(&a.count));
        }
        SortPolicy::Canonical => {
            // Keys without a rank go last, keeping their relative order.
            summaries.sort_by(|a, b| match (a.rank, b.rank) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        }
    }
}

/// Aggregate and sort in one step.
pub fn summarize(records: &[CarRecord], key: GroupKey, policy: SortPolicy) -> Vec<GroupSummary> {
    let mut summaries = aggregate(records, key);
    sort_summaries(&mut summaries, policy);
    summaries
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample() -> Vec<CarRecord> {
        vec![
            CarRecord::new("toyota", "Japan", 10_000.0),
            CarRecord::new("toyota", "Japan", 20_000.0),
            CarRecord::new("bmw", "Germany", 30_000.0),
        ]
    }

    #[test]
    fn brand_aggregate_matches_worked_example() {
        let out = summarize(&sample(), GroupKey::Manufacturer, SortPolicy::AscendingMean);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].key, "toyota");
        assert_eq!(out[0].avg_price, 15_000.0);
        assert_eq!(out[0].count, 2);
        assert_eq!(out[0].category.as_deref(), Some("Japan"));
        assert_eq!(out[1].key, "bmw");
        assert_eq!(out[1].avg_price, 30_000.0);
        assert_eq!(out[1].count, 1);
        assert_eq!(out[1].category.as_deref(), Some("Germany"));
    }

    #[test]
    fn descending_count_puts_busiest_brand_first() {
        let out = summarize(&sample(), GroupKey::Manufacturer, SortPolicy::DescendingCount);
        let keys: Vec<&str> = out.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["toyota", "bmw"]);
    }

    #[test]
    fn weekday_order_is_canonical_not_alphabetical() {
        let records = vec![
            CarRecord::new("a", "USA", 5_000.0).with_weekday(Weekday::Sunday),
            CarRecord::new("a", "USA", 5_000.0).with_weekday(Weekday::Friday),
            CarRecord::new("a", "USA", 5_000.0).with_weekday(Weekday::Monday),
            CarRecord::new("a", "USA", 5_000.0).with_weekday(Weekday::Wednesday),
            CarRecord::new("a", "USA", 5_000.0),
        ];
        let out = summarize(&records, GroupKey::Weekday, SortPolicy::Canonical);
        let keys: Vec<&str> = out.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["Monday", "Wednesday", "Friday", "Sunday"]);
        assert!(out.iter().all(|s| s.category.is_none()));
    }

    #[test]
    fn records_without_weekday_are_skipped() {
        let out = aggregate(&sample(), GroupKey::Weekday);
        assert!(out.is_empty());
    }

    #[test]
    fn brand_group_key_is_its_own_category() {
        let out = aggregate(&sample(), GroupKey::BrandGroup);
        assert!(out.iter().all(|s| s.category.as_deref() == Some(s.key.as_str())));
    }

    #[test]
    fn metric_reads_the_right_field() {
        let out = aggregate(&sample(), GroupKey::Manufacturer);
        let toyota = out.iter().find(|s| s.key == "toyota").unwrap();
        assert_eq!(Metric::MeanPrice.value(toyota), 15_000.0);
        assert_eq!(Metric::Count.value(toyota), 2.0);
    }

    fn arb_records() -> impl Strategy<Value = Vec<CarRecord>> {
        let brand = prop::sample::select(vec!["toyota", "bmw", "ford", "kia", "volvo"]);
        prop::collection::vec((brand, 1_001.0f64..99_999.0), 1..200).prop_map(|rows| {
            rows.into_iter()
                .map(|(b, p)| CarRecord::new(b, "Group", p))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn groups_partition_the_records(records in arb_records()) {
            let out = aggregate(&records, GroupKey::Manufacturer);
            let total: usize = out.iter().map(|s| s.count).sum();
            prop_assert_eq!(total, records.len());

            for summary in &out {
                let members: Vec<f64> = records
                    .iter()
                    .filter(|r| r.manufacturer == summary.key)
                    .map(|r| r.price)
                    .collect();
                prop_assert_eq!(members.len(), summary.count);
                let mean = members.iter().sum::<f64>() / members.len() as f64;
                prop_assert!((mean - summary.avg_price).abs() <= 1e-6 * mean.abs());
            }
        }

        #[test]
        fn ascending_mean_is_sorted(records in arb_records()) {
            let out = summarize(&records, GroupKey::Manufacturer, SortPolicy::AscendingMean);
            for pair in out.windows(2) {
                prop_assert!(pair[0].avg_price <= pair[1].avg_price);
            }
        }

        #[test]
        fn descending_count_is_sorted(records in arb_records()) {
            let out = summarize(&records, GroupKey::Manufacturer, SortPolicy::DescendingCount);
            for pair in out.windows(2) {
                prop_assert!(pair[0].count >= pair[1].count);
            }
        }
    }
}
