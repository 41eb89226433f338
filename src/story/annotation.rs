use serde::{Deserialize, Serialize};

use crate::chart::format_metric;
use crate::data::aggregate::{GroupSummary, Metric};

/// Which aggregate entry a callout points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationTarget {
    /// A named key such as `"bmw"` or `"Sunday"` (case-insensitive).
    Key(String),
    /// The entry with the largest metric value.
    Highest,
    /// The entry with the smallest metric value.
    Lowest,
}

/// An authored callout: text plus a connector to one data point.
///
/// `text` may contain `{key}` and `{value}`, filled from the targeted
/// entry. `offset` moves the label away from its anchor: x in band units,
/// y as a fraction of the value axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub target: AnnotationTarget,
    pub text: String,
    #[serde(default = "default_offset")]
    pub offset: [f64; 2],
}

fn default_offset() -> [f64; 2] {
    [0.0, 0.12]
}

impl Annotation {
    pub fn new(target: AnnotationTarget, text: &str) -> Self {
        Self {
            target,
            text: text.to_string(),
            offset: default_offset(),
        }
    }

    pub fn offset(mut self, dx: f64, dy: f64) -> Self {
        self.offset = [dx, dy];
        self
    }
}

/// A callout positioned in plot coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedAnnotation {
    pub text: String,
    /// The data point the connector ends at.
    pub anchor: [f64; 2],
    pub label: [f64; 2],
}

/// Index of the entry an annotation targets, if present.
fn target_index(target: &AnnotationTarget, entries: &[GroupSummary], metric: Metric) -> Option<usize> {
    let by_value = |a: &(usize, &GroupSummary), b: &(usize, &GroupSummary)| {
        metric.value(a.1).total_cmp(&metric.value(b.1))
    };
    match target {
        AnnotationTarget::Key(key) => entries
            .iter()
            .position(|e| e.key.eq_ignore_ascii_case(key)),
        AnnotationTarget::Highest => entries.iter().enumerate().max_by(by_value).map(|(i, _)| i),
        AnnotationTarget::Lowest => entries.iter().enumerate().min_by(by_value).map(|(i, _)| i),
    }
}

/// Position each annotation against the sorted aggregate.
///
/// `entries[i]` is drawn at x = `i`. Annotations whose target is missing
/// from the aggregate are skipped with a warning.
pub fn place_annotations(
    annotations: &[Annotation],
    entries: &[GroupSummary],
    metric: Metric,
    y_max: f64,
) -> Vec<PlacedAnnotation> {
    annotations
        .iter()
        .filter_map(|annotation| {
            let Some(idx) = target_index(&annotation.target, entries, metric) else {
                log::warn!(
                    "skipping annotation {:?}: target {:?} not in this scene's data",
                    annotation.text,
                    annotation.target
                );
                return None;
            };
            let entry = &entries[idx];
            let value = metric.value(entry);
            let anchor = [idx as f64, value];
            let label = [
                anchor[0] + annotation.offset[0],
                anchor[1] + annotation.offset[1] * y_max,
            ];
            let text = annotation
                .text
                .replace("{key}", &entry.key)
                .replace("{value}", &format_metric(metric, value));
            Some(PlacedAnnotation { text, anchor, label })
        })
        .collect()
}
