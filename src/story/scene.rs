use serde::{Deserialize, Serialize};

use crate::data::aggregate::{GroupKey, Metric, SortPolicy};

use super::annotation::Annotation;

/// How each aggregate entry is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    /// A circle sized by listing count.
    Point,
    /// A bar whose height is the metric value.
    Bar,
}

/// One scene of the story, interpreted by the generic chart renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub group_by: GroupKey,
    pub metric: Metric,
    pub sort: SortPolicy,
    pub mark: MarkKind,
    /// Summary scenes hide the scene title label and show the aggregate
    /// as a table under the chart.
    #[serde(default)]
    pub summary: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl SceneDescriptor {
    pub fn new(title: &str, group_by: GroupKey, metric: Metric, sort: SortPolicy, mark: MarkKind) -> Self {
        Self {
            title: title.to_string(),
            subtitle: None,
            group_by,
            metric,
            sort,
            mark,
            summary: false,
            annotations: Vec::new(),
        }
    }

    pub fn subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = Some(subtitle.to_string());
        self
    }

    pub fn summary(mut self) -> Self {
        self.summary = true;
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// The label shown above the chart; summary scenes have none.
    pub fn title_label(&self) -> Option<&str> {
        (!self.summary).then_some(self.title.as_str())
    }
}
