use std::path::PathBuf;

use crate::chart::{ChartModel, render_scene};
use crate::color::{ColorMap, parse_hex};
use crate::data::filter::CategoryFilter;
use crate::data::model::CarDataset;
use crate::story::navigation::{SceneController, ScenePosition, Transition};
use crate::story::scene::SceneDescriptor;
use crate::story::{StoryConfig, StoryError};

// ---------------------------------------------------------------------------
// Load status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// Nothing requested yet.
    Idle,
    Loading(PathBuf),
    Ready,
    Failed(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub story: StoryConfig,

    /// Loaded dataset (None until a load completes).
    pub dataset: Option<CarDataset>,

    pub load_status: LoadStatus,

    pub controller: SceneController,

    /// Pinned / hovered brand group.
    pub filter: CategoryFilter,

    /// Brand group colours for the current story and dataset.
    pub color_map: Option<ColorMap>,

    /// The rendered current scene. Cleared on every transition and rebuilt
    /// exactly once for the new position.
    pub chart: Option<ChartModel>,

    pub show_annotations: bool,

    /// Set by a transition; the central panel scrolls to top and clears it.
    pub scroll_to_top: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Number of scene renders performed so far.
    pub render_count: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(StoryConfig::default())
    }
}

impl AppState {
    pub fn new(story: StoryConfig) -> Self {
        let controller = SceneController::new(story.scenes.len(), story.intro.is_some());
        Self {
            story,
            dataset: None,
            load_status: LoadStatus::Idle,
            controller,
            filter: CategoryFilter::default(),
            color_map: None,
            chart: None,
            show_annotations: true,
            scroll_to_top: false,
            status_message: None,
            render_count: 0,
        }
    }

    /// Mark a load as in flight. Rendering waits until it completes.
    pub fn begin_load(&mut self, path: PathBuf) {
        self.load_status = LoadStatus::Loading(path);
        self.status_message = None;
    }

    /// Ingest a newly loaded dataset and render the current position.
    pub fn set_dataset(&mut self, dataset: CarDataset) {
        self.dataset = Some(dataset);
        self.load_status = LoadStatus::Ready;
        self.status_message = None;
        self.rebuild_color_map();
        self.filter.clear();
        self.render_current();
    }

    /// Record a failed load; the previous dataset, if any, is dropped.
    pub fn fail_load(&mut self, message: String) {
        self.dataset = None;
        self.chart = None;
        self.load_status = LoadStatus::Failed(message.clone());
        self.status_message = Some(format!("Error: {message}"));
    }

    /// Swap in another story and restart from its first position.
    ///
    /// The new story's price window is applied to the records in memory at
    /// once. When its load options differ from the old story's and the
    /// dataset came from a file, that file is returned so the caller can
    /// reload it; rows the old window rejected may now be accepted.
    pub fn set_story(&mut self, story: StoryConfig) -> Option<PathBuf> {
        let options_changed = story.load_options() != self.story.load_options();
        self.controller = SceneController::new(story.scenes.len(), story.intro.is_some());
        self.story = story;
        self.filter.clear();

        let mut reload = None;
        if options_changed {
            if let Some(ds) = &mut self.dataset {
                ds.retain_price_range(&self.story.price_range);
                reload = ds.source.clone();
            }
        }

        self.rebuild_color_map();
        self.render_current();
        self.scroll_to_top = true;
        reload
    }

    fn rebuild_color_map(&mut self) {
        let Some(ds) = &self.dataset else {
            self.color_map = None;
            return;
        };
        let built = parse_hex(&self.story.neutral_color)
            .and_then(|neutral| ColorMap::new(&self.story.palette, &ds.brand_groups, neutral));
        match built {
            Ok(map) => self.color_map = Some(map),
            Err(e) => self.report_story_error(&e),
        }
    }

    pub fn report_story_error(&mut self, err: &StoryError) {
        log::error!("story configuration: {err}");
        self.status_message = Some(format!("Story error: {err}"));
    }

    // -- navigation --

    pub fn start(&mut self) {
        let t = self.controller.start();
        self.apply(t);
    }

    pub fn next(&mut self) {
        let t = self.controller.next();
        self.apply(t);
    }

    pub fn prev(&mut self) {
        let t = self.controller.prev();
        self.apply(t);
    }

    pub fn jump(&mut self, scene: usize) {
        let t = self.controller.jump(scene);
        self.apply(t);
    }

    /// Clear the surface and redraw for the new position.
    fn apply(&mut self, transition: Option<Transition>) {
        if transition.is_none() {
            return;
        }
        self.chart = None;
        self.filter.clear();
        self.render_current();
        self.scroll_to_top = true;
    }

    fn render_current(&mut self) {
        self.chart = None;
        let (Some(scene), Some(ds)) = (self.current_scene(), &self.dataset) else {
            return;
        };
        let chart = render_scene(scene, ds);
        self.chart = Some(chart);
        self.render_count += 1;
    }

    pub fn current_scene(&self) -> Option<&SceneDescriptor> {
        self.controller
            .position()
            .scene()
            .and_then(|k| self.story.scenes.get(k))
    }

    /// Text for the title label: `None` on the intro and on summary scenes.
    pub fn title_label(&self) -> Option<String> {
        let ScenePosition::Scene(k) = self.controller.position() else {
            return None;
        };
        let scene = self.current_scene()?;
        scene.title_label().map(|title| {
            format!("Scene {} of {}: {title}", k + 1, self.controller.scene_count())
        })
    }

    // -- legend / hover --

    pub fn toggle_category(&mut self, category: &str) {
        self.filter.toggle(category);
    }

    pub fn set_hovered_category(&mut self, category: Option<&str>) {
        self.filter.set_hovered(category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CarRecord, Weekday};

    fn dataset() -> CarDataset {
        CarDataset::from_records(vec![
            CarRecord::new("toyota", "Japan", 10_000.0).with_weekday(Weekday::Monday),
            CarRecord::new("toyota", "Japan", 20_000.0).with_weekday(Weekday::Sunday),
            CarRecord::new("bmw", "Germany", 30_000.0).with_weekday(Weekday::Sunday),
        ])
    }

    #[test]
    fn nothing_renders_before_data_arrives() {
        let mut state = AppState::default();
        state.start();
        assert_eq!(state.controller.position(), ScenePosition::Scene(0));
        assert!(state.chart.is_none());
        assert_eq!(state.render_count, 0);

        state.set_dataset(dataset());
        assert!(state.chart.is_some());
        assert_eq!(state.render_count, 1);
    }

    #[test]
    fn intro_renders_no_chart() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        assert_eq!(state.controller.position(), ScenePosition::Intro);
        assert!(state.chart.is_none());
        assert!(state.title_label().is_none());
    }

    #[test]
    fn each_transition_renders_once() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.start();
        state.next();
        state.next();
        state.prev();
        assert_eq!(state.controller.position(), ScenePosition::Scene(1));
        assert_eq!(state.render_count, 4);
        assert_eq!(state.chart.as_ref().unwrap().title, "Number of Listings by Brand");
    }

    #[test]
    fn clamped_actions_do_not_rerender() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.prev();
        assert_eq!(state.render_count, 0);
        state.jump(4);
        state.next();
        assert_eq!(state.render_count, 1);
        assert!(!state.controller.can_next());
    }

    #[test]
    fn transition_clears_filter_and_requests_scroll() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.start();
        state.toggle_category("Japan");
        state.scroll_to_top = false;
        state.next();
        assert_eq!(state.filter.active(), None);
        assert!(state.scroll_to_top);
    }

    #[test]
    fn summary_scene_has_no_title_label() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.jump(0);
        assert_eq!(
            state.title_label().as_deref(),
            Some("Scene 1 of 5: Average Used Car Price by Brand")
        );
        state.jump(4);
        assert!(state.chart.as_ref().unwrap().summary);
        assert!(state.title_label().is_none());
    }

    #[test]
    fn failed_load_is_visible() {
        let mut state = AppState::default();
        state.begin_load(PathBuf::from("missing.csv"));
        state.fail_load("opening CSV: No such file".to_string());
        assert!(matches!(state.load_status, LoadStatus::Failed(_)));
        assert!(state.status_message.as_deref().unwrap().contains("No such file"));
        assert!(state.chart.is_none());
    }

    fn narrow_story() -> StoryConfig {
        let mut story = StoryConfig::default();
        story.intro = None;
        story.price_range.max = 50_000.0;
        story
    }

    #[test]
    fn story_swap_applies_new_price_window() {
        let mut state = AppState::default();
        state.set_dataset(CarDataset::from_records(vec![
            CarRecord::new("toyota", "Japan", 5_000.0),
            CarRecord::new("bmw", "Germany", 60_000.0),
        ]));

        let reload = state.set_story(narrow_story());

        assert_eq!(reload, None);
        assert_eq!(state.controller.position(), ScenePosition::Scene(0));
        let keys: Vec<&str> = state
            .chart
            .as_ref()
            .unwrap()
            .marks
            .iter()
            .map(|m| m.summary.key.as_str())
            .collect();
        assert_eq!(keys, ["toyota"]);
    }

    #[test]
    fn story_swap_requests_reload_of_file_backed_data() {
        let mut state = AppState::default();
        let mut ds = dataset();
        ds.source = Some(PathBuf::from("data/used_cars_cleaned.csv"));
        state.set_dataset(ds);

        assert_eq!(state.set_story(StoryConfig::default()), None);
        assert_eq!(
            state.set_story(narrow_story()),
            Some(PathBuf::from("data/used_cars_cleaned.csv"))
        );
    }

    #[test]
    fn colour_map_covers_observed_groups() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        let map = state.color_map.as_ref().unwrap();
        assert_ne!(map.color_for(Some("Japan")), map.color_for(Some("Germany")));
    }
}
