use crate::data::aggregate::{GroupKey, GroupSummary, Metric, summarize};
use crate::data::model::CarDataset;
use crate::story::annotation::{PlacedAnnotation, place_annotations};
use crate::story::scene::{MarkKind, SceneDescriptor};

// ---------------------------------------------------------------------------
// Scales
// ---------------------------------------------------------------------------

/// Ticks aimed for when rounding the value axis.
const NICE_TICKS: f64 = 10.0;

/// Round `max` up to a tick boundary the way d3's `linear().nice()` does
/// for a domain starting at zero: re-derive the tick step from the widened
/// domain until it settles.
pub fn nice_max(max: f64) -> f64 {
    if !(max.is_finite() && max > 0.0) {
        return 1.0;
    }
    let mut stop = max;
    let mut previous = None;
    for _ in 0..10 {
        let step = tick_increment(stop);
        if previous == Some(step) {
            break;
        }
        stop = if step > 0.0 {
            (stop / step).ceil() * step
        } else {
            (stop * -step).ceil() / -step
        };
        previous = Some(step);
    }
    stop
}

/// Tick step for `[0, stop]`. Steps below one come back negated as their
/// reciprocal so rounding stays exact.
fn tick_increment(stop: f64) -> f64 {
    let raw_step = stop / NICE_TICKS;
    let power = raw_step.log10().floor() as i32;
    let error = raw_step / 10f64.powi(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    if power >= 0 {
        factor * 10f64.powi(power)
    } else {
        -10f64.powi(-power) / factor
    }
}

/// Square-root scale from `[0, domain_max]` onto a pixel radius range.
#[derive(Debug, Clone, Copy)]
pub struct SqrtScale {
    domain_max: f64,
    range: (f32, f32),
}

impl SqrtScale {
    pub fn new(domain_max: f64, range: (f32, f32)) -> Self {
        Self { domain_max, range }
    }

    pub fn apply(&self, value: f64) -> f32 {
        let (lo, hi) = self.range;
        if self.domain_max <= 0.0 {
            return lo;
        }
        let t = (value.max(0.0) / self.domain_max).sqrt() as f32;
        lo + (hi - lo) * t
    }
}

/// Categorical axis: entry `i` is centred at `x = i`.
#[derive(Debug, Clone, Copy)]
pub struct BandScale {
    pub padding: f64,
}

impl BandScale {
    pub fn bandwidth(&self) -> f64 {
        1.0 - self.padding
    }

    /// Index of the band containing `x`, if any.
    pub fn band_at(&self, x: f64, len: usize) -> Option<usize> {
        let idx = x.round();
        if idx < 0.0 || idx >= len as f64 || (x - idx).abs() > self.bandwidth() / 2.0 {
            return None;
        }
        Some(idx as usize)
    }
}

const BAND: BandScale = BandScale { padding: 0.2 };
const RADIUS_RANGE: (f32, f32) = (4.0, 20.0);

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// `12345.6` → `"12,346"`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_price(value: f64) -> String {
    format!("${}", format_thousands(value))
}

pub fn format_metric(metric: Metric, value: f64) -> String {
    match metric {
        Metric::MeanPrice => format_price(value),
        Metric::Count => format_thousands(value),
    }
}

// ---------------------------------------------------------------------------
// Chart model – the output of rendering one scene
// ---------------------------------------------------------------------------

/// One visual mark, already positioned on both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub x: f64,
    pub value: f64,
    /// Pixel radius for point marks.
    pub radius: f32,
    pub summary: GroupSummary,
}

impl Mark {
    pub fn category(&self) -> Option<&str> {
        self.summary.category.as_deref()
    }

    /// Tooltip lines for this mark.
    pub fn tooltip(&self) -> Vec<String> {
        let mut lines = vec![
            self.summary.key.clone(),
            format!("Avg. Price: {}", format_price(self.summary.avg_price)),
            format!("Listings: {}", format_thousands(self.summary.count as f64)),
        ];
        if let Some(category) = self.category() {
            lines.push(format!("Country: {category}"));
        }
        lines
    }
}

/// Everything the plot needs to draw a scene.
#[derive(Debug, Clone)]
pub struct ChartModel {
    pub title: String,
    pub subtitle: Option<String>,
    pub group_by: GroupKey,
    pub metric: Metric,
    pub mark_kind: MarkKind,
    pub marks: Vec<Mark>,
    /// Top of the value axis after rounding.
    pub y_max: f64,
    pub annotations: Vec<PlacedAnnotation>,
    /// Brand groups present in this scene, in first-seen order.
    pub categories: Vec<String>,
    pub summary: bool,
}

impl ChartModel {
    pub fn bar_width(&self) -> f64 {
        BAND.bandwidth()
    }

    pub fn key_at(&self, x: f64) -> Option<&str> {
        let idx = x.round();
        if idx < 0.0 {
            return None;
        }
        self.marks.get(idx as usize).map(|m| m.summary.key.as_str())
    }

    /// Bar under a plot-space position.
    pub fn bar_at(&self, x: f64, y: f64) -> Option<usize> {
        let idx = BAND.band_at(x, self.marks.len())?;
        let value = self.marks[idx].value;
        (y >= 0.0 && y <= value).then_some(idx)
    }
}

/// Aggregate, sort, scale and annotate one scene.
pub fn render_scene(scene: &SceneDescriptor, dataset: &CarDataset) -> ChartModel {
    let summaries = summarize(&dataset.records, scene.group_by, scene.sort);

    let value_max = summaries
        .iter()
        .map(|s| scene.metric.value(s))
        .fold(0.0, f64::max);
    let y_max = nice_max(value_max);
    let count_max = summaries.iter().map(|s| s.count).max().unwrap_or(0);
    let radius = SqrtScale::new(count_max as f64, RADIUS_RANGE);

    let annotations = place_annotations(&scene.annotations, &summaries, scene.metric, y_max);

    let mut categories: Vec<String> = Vec::new();
    for s in &summaries {
        if let Some(c) = &s.category {
            if !categories.contains(c) {
                categories.push(c.clone());
            }
        }
    }

    let marks = summaries
        .into_iter()
        .enumerate()
        .map(|(i, summary)| Mark {
            x: i as f64,
            value: scene.metric.value(&summary),
            radius: radius.apply(summary.count as f64),
            summary,
        })
        .collect::<Vec<_>>();

    log::debug!(
        "rendered '{}': {} marks, {} annotations, y_max {y_max}",
        scene.title,
        marks.len(),
        annotations.len()
    );

    ChartModel {
        title: scene.title.clone(),
        subtitle: scene.subtitle.clone(),
        group_by: scene.group_by,
        metric: scene.metric,
        mark_kind: scene.mark,
        marks,
        y_max,
        annotations,
        categories,
        summary: scene.summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::SortPolicy;
    use crate::data::model::CarRecord;
    use crate::story::annotation::{Annotation, AnnotationTarget};

    fn dataset() -> CarDataset {
        CarDataset::from_records(vec![
            CarRecord::new("toyota", "Japan", 10_000.0),
            CarRecord::new("toyota", "Japan", 20_000.0),
            CarRecord::new("bmw", "Germany", 30_000.0),
        ])
    }

    #[test]
    fn nice_max_rounds_like_d3() {
        assert_eq!(nice_max(30_000.0), 30_000.0);
        assert_eq!(nice_max(27_350.0), 28_000.0);
        assert_eq!(nice_max(0.93), 1.0);
        assert_eq!(nice_max(87.0), 90.0);
        assert_eq!(nice_max(0.0), 1.0);
    }

    #[test]
    fn nice_max_repeats_until_step_settles() {
        // 31,600 first rounds to 32,000, whose own step is 5,000.
        assert_eq!(nice_max(31_600.0), 35_000.0);
        assert_eq!(nice_max(9.4), 10.0);
    }

    #[test]
    fn sqrt_scale_maps_domain_to_radius_range() {
        let scale = SqrtScale::new(100.0, (4.0, 20.0));
        assert_eq!(scale.apply(0.0), 4.0);
        assert_eq!(scale.apply(100.0), 20.0);
        assert_eq!(scale.apply(25.0), 12.0);
        assert_eq!(SqrtScale::new(0.0, (4.0, 20.0)).apply(5.0), 4.0);
    }

    #[test]
    fn band_lookup_respects_padding() {
        assert_eq!(BAND.band_at(1.1, 3), Some(1));
        assert_eq!(BAND.band_at(1.45, 3), None);
        assert_eq!(BAND.band_at(-0.3, 3), Some(0));
        assert_eq!(BAND.band_at(3.0, 3), None);
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(15_000.0), "15,000");
        assert_eq!(format_thousands(1_234_567.4), "1,234,567");
        assert_eq!(format_thousands(-4_200.0), "-4,200");
        assert_eq!(format_price(15_000.0), "$15,000");
    }

    #[test]
    fn brand_price_scene_places_marks_in_sorted_order() {
        let scene = SceneDescriptor::new(
            "Brands",
            GroupKey::Manufacturer,
            Metric::MeanPrice,
            SortPolicy::AscendingMean,
            MarkKind::Point,
        )
        .annotate(Annotation::new(AnnotationTarget::Key("bmw".into()), "{key}"));
        let chart = render_scene(&scene, &dataset());

        let keys: Vec<&str> = chart.marks.iter().map(|m| m.summary.key.as_str()).collect();
        assert_eq!(keys, vec!["toyota", "bmw"]);
        assert_eq!(chart.marks[1].x, 1.0);
        assert_eq!(chart.marks[1].value, 30_000.0);
        assert!((chart.marks[1].radius - (4.0 + 16.0 * 0.5f32.sqrt())).abs() < 1e-4);
        assert_eq!(chart.marks[0].radius, 20.0);
        assert_eq!(chart.y_max, 30_000.0);
        assert_eq!(chart.categories, vec!["Japan", "Germany"]);
        assert_eq!(chart.annotations[0].anchor, [1.0, 30_000.0]);
        assert_eq!(chart.key_at(0.2), Some("toyota"));
    }

    #[test]
    fn bar_hit_test_checks_height() {
        let scene = SceneDescriptor::new(
            "Counts",
            GroupKey::Manufacturer,
            Metric::Count,
            SortPolicy::DescendingCount,
            MarkKind::Bar,
        );
        let chart = render_scene(&scene, &dataset());
        assert_eq!(chart.bar_at(0.0, 1.5), Some(0));
        assert_eq!(chart.bar_at(1.0, 1.5), None);
        assert_eq!(chart.bar_at(1.0, 0.5), Some(1));
    }

    #[test]
    fn tooltip_lists_all_fields() {
        let scene = SceneDescriptor::new(
            "Brands",
            GroupKey::Manufacturer,
            Metric::MeanPrice,
            SortPolicy::AscendingMean,
            MarkKind::Point,
        );
        let chart = render_scene(&scene, &dataset());
        assert_eq!(
            chart.marks[0].tooltip(),
            vec!["toyota", "Avg. Price: $15,000", "Listings: 2", "Country: Japan"]
        );
    }

    #[test]
    fn empty_dataset_renders_an_empty_chart() {
        let scene = SceneDescriptor::new(
            "Weekdays",
            GroupKey::Weekday,
            Metric::MeanPrice,
            SortPolicy::Canonical,
            MarkKind::Bar,
        );
        let chart = render_scene(&scene, &CarDataset::default());
        assert!(chart.marks.is_empty());
        assert_eq!(chart.y_max, 1.0);
    }
}
