/// Story configuration: the ordered scenes, the palette and the intro.
///
/// A story is plain data. The built-in one reproduces the used-car
/// walkthrough; any other can be supplied as JSON with `--story`.
pub mod annotation;
pub mod navigation;
pub mod scene;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::parse_hex;
use crate::data::aggregate::{GroupKey, Metric, SortPolicy};
use crate::data::loader::LoadOptions;
use crate::data::model::PriceRange;

use annotation::{Annotation, AnnotationTarget};
use scene::{MarkKind, SceneDescriptor};

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("reading story file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing story JSON")]
    Parse(#[from] serde_json::Error),
    #[error("story has no scenes")]
    NoScenes,
    #[error("invalid colour '{0}'")]
    InvalidColor(String),
    #[error("palette lists category '{0}' twice")]
    DuplicateCategory(String),
    #[error("scene {scene} sorts canonically but {key:?} has no fixed order")]
    IncompatibleSort { scene: usize, key: GroupKey },
    #[error("price range ({min}, {max}) is empty")]
    InvalidPriceRange { min: f64, max: f64 },
}

/// One palette entry: brand group name and `#rrggbb` colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryColor {
    pub name: String,
    pub color: String,
}

impl CategoryColor {
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

/// Text shown before the first scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroConfig {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryConfig {
    pub title: String,
    #[serde(default)]
    pub intro: Option<IntroConfig>,
    pub palette: Vec<CategoryColor>,
    /// Colour for marks that carry no brand group (weekday scenes).
    #[serde(default = "default_neutral")]
    pub neutral_color: String,
    /// Brand group given to rows that have none.
    #[serde(default = "default_fallback")]
    pub fallback_category: String,
    #[serde(default)]
    pub price_range: PriceRange,
    pub scenes: Vec<SceneDescriptor>,
}

fn default_neutral() -> String {
    "#4682b4".to_string()
}

fn default_fallback() -> String {
    "Other".to_string()
}

impl Default for StoryConfig {
    fn default() -> Self {
        builtin()
    }
}

impl StoryConfig {
    /// Read, parse and validate a JSON story file.
    pub fn from_path(path: &Path) -> Result<Self, StoryError> {
        let text = std::fs::read_to_string(path).map_err(|source| StoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, StoryError> {
        let story: StoryConfig = serde_json::from_str(text)?;
        story.validate()?;
        Ok(story)
    }

    pub fn to_json(&self) -> Result<String, StoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), StoryError> {
        if self.scenes.is_empty() {
            return Err(StoryError::NoScenes);
        }
        if !(self.price_range.min < self.price_range.max) {
            return Err(StoryError::InvalidPriceRange {
                min: self.price_range.min,
                max: self.price_range.max,
            });
        }

        parse_hex(&self.neutral_color)?;
        let mut seen = BTreeSet::new();
        for entry in &self.palette {
            parse_hex(&entry.color)?;
            if !seen.insert(entry.name.as_str()) {
                return Err(StoryError::DuplicateCategory(entry.name.clone()));
            }
        }

        for (i, scene) in self.scenes.iter().enumerate() {
            let has_order = scene.group_by == GroupKey::Weekday;
            if scene.sort == SortPolicy::Canonical && !has_order {
                return Err(StoryError::IncompatibleSort {
                    scene: i,
                    key: scene.group_by,
                });
            }
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            price_range: self.price_range,
            fallback_group: self.fallback_category.clone(),
        }
    }
}

/// The used-car walkthrough: brands by price, brands by volume, the
/// weekday effect, then a country-group summary.
pub fn builtin() -> StoryConfig {
    let palette = [
        ("USA", "#1f77b4"),
        ("Germany", "#d62728"),
        ("Japan", "#2ca02c"),
        ("Korea", "#ff7f0e"),
        ("UK", "#9467bd"),
        ("Italy", "#8c564b"),
        ("Other", "#7f7f7f"),
        ("Sweden", "#17becf"),
    ]
    .into_iter()
    .map(|(name, color)| CategoryColor::new(name, color))
    .collect();

    let scenes = vec![
        SceneDescriptor::new(
            "Average Used Car Price by Brand",
            GroupKey::Manufacturer,
            Metric::MeanPrice,
            SortPolicy::AscendingMean,
            MarkKind::Point,
        )
        .subtitle("Colored by country group, sized by number of listings")
        .annotate(
            Annotation::new(AnnotationTarget::Highest, "{key} leads at {value}")
                .offset(-3.0, 0.08),
        )
        .annotate(
            Annotation::new(AnnotationTarget::Lowest, "Cheapest on average: {key}")
                .offset(1.5, 0.25),
        ),
        SceneDescriptor::new(
            "Number of Listings by Brand",
            GroupKey::Manufacturer,
            Metric::Count,
            SortPolicy::DescendingCount,
            MarkKind::Bar,
        )
        .subtitle("Which brands dominate the used market")
        .annotate(
            Annotation::new(AnnotationTarget::Highest, "{key}: {value} listings")
                .offset(2.5, 0.05),
        ),
        SceneDescriptor::new(
            "Average Price by Weekday Listed",
            GroupKey::Weekday,
            Metric::MeanPrice,
            SortPolicy::Canonical,
            MarkKind::Bar,
        )
        .annotate(
            Annotation::new(AnnotationTarget::Highest, "{key} has the highest price")
                .offset(-1.5, 0.1),
        ),
        SceneDescriptor::new(
            "Listings by Weekday",
            GroupKey::Weekday,
            Metric::Count,
            SortPolicy::Canonical,
            MarkKind::Bar,
        )
        .annotate(
            Annotation::new(AnnotationTarget::Lowest, "Fewest listings on {key}")
                .offset(-1.0, 0.3),
        ),
        SceneDescriptor::new(
            "Average Price by Country Group",
            GroupKey::BrandGroup,
            Metric::MeanPrice,
            SortPolicy::AscendingMean,
            MarkKind::Bar,
        )
        .summary(),
    ];

    StoryConfig {
        title: "What Drives Used Car Prices?".to_string(),
        intro: Some(IntroConfig {
            heading: "What Drives Used Car Prices?".to_string(),
            body: "A short walk through thousands of used-car listings: which brands \
                   cost the most, which ones flood the market, and whether the day a \
                   car is listed changes what sellers ask. Hover any mark for details \
                   and click a legend entry to highlight one country group."
                .to_string(),
        }),
        palette,
        neutral_color: default_neutral(),
        fallback_category: default_fallback(),
        price_range: PriceRange::default(),
        scenes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_story_is_valid() {
        let story = builtin();
        story.validate().unwrap();
        assert_eq!(story.scenes.len(), 5);
        assert!(story.intro.is_some());
        assert!(story.palette.iter().any(|c| c.name == "Other"));
        assert!(story.scenes.last().unwrap().summary);
    }

    #[test]
    fn builtin_story_survives_json() {
        let story = builtin();
        let json = story.to_json().unwrap();
        let parsed = StoryConfig::from_json(&json).unwrap();
        assert_eq!(parsed.palette, story.palette);
        assert_eq!(parsed.intro, story.intro);
        let titles: Vec<&str> = parsed.scenes.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles[2], "Average Price by Weekday Listed");
        assert_eq!(parsed.scenes[2].sort, SortPolicy::Canonical);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r##"{
            "title": "Brands",
            "palette": [{"name": "Japan", "color": "#2ca02c"}],
            "scenes": [{
                "title": "By brand",
                "group_by": "manufacturer",
                "metric": "mean_price",
                "sort": "ascending_mean",
                "mark": "point",
                "annotations": [{"target": {"key": "bmw"}, "text": "BMW"}]
            }]
        }"##;
        let story = StoryConfig::from_json(json).unwrap();
        assert!(story.intro.is_none());
        assert_eq!(story.fallback_category, "Other");
        assert_eq!(story.price_range, PriceRange::default());
        assert_eq!(
            story.scenes[0].annotations[0].target,
            AnnotationTarget::Key("bmw".into())
        );
    }

    #[test]
    fn rejects_empty_scene_list() {
        let mut story = builtin();
        story.scenes.clear();
        assert!(matches!(story.validate(), Err(StoryError::NoScenes)));
    }

    #[test]
    fn rejects_canonical_sort_on_brands() {
        let mut story = builtin();
        story.scenes[0].sort = SortPolicy::Canonical;
        assert!(matches!(
            story.validate(),
            Err(StoryError::IncompatibleSort { scene: 0, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_and_malformed_palette_entries() {
        let mut story = builtin();
        story.palette.push(CategoryColor::new("Japan", "#000000"));
        assert!(matches!(story.validate(), Err(StoryError::DuplicateCategory(_))));

        let mut story = builtin();
        story.palette[0].color = "blue-ish".to_string();
        assert!(matches!(story.validate(), Err(StoryError::InvalidColor(_))));
    }

    #[test]
    fn rejects_inverted_price_range() {
        let mut story = builtin();
        story.price_range = PriceRange { min: 5.0, max: 1.0 };
        assert!(matches!(story.validate(), Err(StoryError::InvalidPriceRange { .. })));
    }

    #[test]
    fn missing_story_file_reports_path() {
        let err = StoryConfig::from_path(Path::new("/no/such/story.json")).unwrap_err();
        assert!(err.to_string().contains("/no/such/story.json"));
    }
}
