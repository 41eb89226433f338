pub mod panels;
pub mod plot;
pub mod table;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, LoadStatus};
use crate::story::navigation::ScenePosition;

use panels::UiAction;

/// Mark colour used when no colour map is available yet.
pub const NEUTRAL_FALLBACK: Color32 = Color32::from_rgb(0x46, 0x82, 0xb4);

/// Render the central panel for whatever position the story is at.
pub fn central(ui: &mut Ui, state: &mut AppState) -> Option<UiAction> {
    if state.load_status != LoadStatus::Ready {
        return panels::load_status(ui, &state.load_status);
    }

    match state.controller.position() {
        ScenePosition::Intro => panels::intro(ui, state),
        ScenePosition::Scene(k) => scene_view(ui, state, k),
    }
    None
}

fn scene_view(ui: &mut Ui, state: &mut AppState, scene: usize) {
    let mut scroll = ScrollArea::vertical().auto_shrink([false, false]);
    if std::mem::take(&mut state.scroll_to_top) {
        scroll = scroll.vertical_scroll_offset(0.0);
    }

    scroll.show(ui, |ui: &mut Ui| {
        let Some(chart) = &state.chart else {
            ui.label("Nothing to draw for this scene.");
            return;
        };

        ui.vertical_centered(|ui: &mut Ui| {
            ui.heading(RichText::new(&chart.title).strong());
            if let Some(subtitle) = &chart.subtitle {
                ui.label(RichText::new(subtitle).italics());
            }
        });
        ui.add_space(8.0);

        if chart.marks.is_empty() {
            ui.label("No listings carry the attribute this scene groups by.");
            return;
        }

        plot::scene_plot(
            ui,
            scene,
            chart,
            &state.filter,
            state.color_map.as_ref(),
            state.show_annotations,
        );

        if chart.summary {
            ui.add_space(12.0);
            egui::CollapsingHeader::new("Summary table")
                .default_open(true)
                .show(ui, |ui: &mut Ui| table::summary_table(ui, chart));
        }
    });
}
