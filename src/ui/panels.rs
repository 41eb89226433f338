use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, LoadStatus};
use crate::story::navigation::ScenePosition;

/// Requests the panels hand back to the app shell.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    OpenData(PathBuf),
    OpenStory(PathBuf),
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, navigation controls and title label.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) -> Option<UiAction> {
    let mut action = None;

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data…").clicked() {
                action = open_data_dialog().map(UiAction::OpenData);
                ui.close_menu();
            }
            if ui.button("Open story…").clicked() {
                action = open_story_dialog().map(UiAction::OpenStory);
                ui.close_menu();
            }
        });

        ui.separator();

        let ready = state.load_status == LoadStatus::Ready;
        let ctl = state.controller.clone();
        if ui
            .add_visible(ready && ctl.can_start(), egui::Button::new("Start ▶"))
            .clicked()
        {
            state.start();
        }
        if ui
            .add_visible(ready && ctl.can_prev(), egui::Button::new("◀ Previous"))
            .clicked()
        {
            state.prev();
        }
        if ui
            .add_visible(ready && ctl.can_next(), egui::Button::new("Next ▶"))
            .clicked()
        {
            state.next();
        }

        ui.separator();

        if let Some(label) = state.title_label() {
            ui.label(RichText::new(label).strong());
            ui.separator();
        }

        if ui
            .selectable_label(state.show_annotations, "Annotations")
            .clicked()
        {
            state.show_annotations = !state.show_annotations;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    action
}

// ---------------------------------------------------------------------------
// Left side panel – legend, scene list, dataset summary
// ---------------------------------------------------------------------------

/// Render the left panel. Hovering a legend entry previews its dimming;
/// clicking it pins the category.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading(&state.story.title);
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            legend(ui, state);
            ui.separator();
            scene_list(ui, state);
            ui.separator();
            dataset_summary(ui, state);
        });
}

fn legend(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Country group");

    let (Some(color_map), Some(chart)) = (&state.color_map, &state.chart) else {
        ui.label("No chart on screen.");
        return;
    };
    if chart.categories.is_empty() {
        ui.label("This scene is not grouped by country.");
        return;
    }

    // Clone what we need so we can mutate state after the loop.
    let entries: Vec<(String, Color32)> = color_map
        .legend_entries()
        .into_iter()
        .filter(|(name, _)| chart.categories.contains(name))
        .collect();
    let active = state.filter.active().map(str::to_string);

    let mut clicked = None;
    for (name, color) in &entries {
        ui.horizontal(|ui: &mut Ui| {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
            ui.painter().circle_filled(rect.center(), 6.0, *color);

            let is_active = active.as_deref() == Some(name.as_str());
            let response = ui.selectable_label(is_active, name);
            if response.hovered() {
                state.set_hovered_category(Some(name.as_str()));
            }
            if response.clicked() {
                clicked = Some(name.clone());
            }
        });
    }

    if let Some(name) = clicked {
        state.toggle_category(&name);
    }
    if let Some(active) = state.filter.active() {
        ui.small(format!("Highlighting {active}; click again to clear."));
    }
}

fn scene_list(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Scenes");
    if state.load_status != LoadStatus::Ready {
        return;
    }
    let current = state.controller.position();
    let mut jump_to = None;
    for (i, scene) in state.story.scenes.iter().enumerate() {
        let selected = current == ScenePosition::Scene(i);
        if ui
            .selectable_label(selected, format!("{}. {}", i + 1, scene.title))
            .clicked()
        {
            jump_to = Some(i);
        }
    }
    if let Some(i) = jump_to {
        state.jump(i);
    }
}

fn dataset_summary(ui: &mut Ui, state: &AppState) {
    ui.strong("Dataset");
    let Some(ds) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };
    if let Some(name) = ds.source.as_ref().and_then(|p| p.file_name()) {
        ui.label(name.to_string_lossy().into_owned());
    }
    ui.label(format!("{} listings", ds.len()));
    if ds.rejected_total() > 0 {
        ui.label(format!("{} rows dropped", ds.rejected_total()))
            .on_hover_ui(|ui: &mut Ui| {
                for (kind, n) in &ds.rejected {
                    ui.label(format!("{kind}: {n}"));
                }
            });
    }
}

// ---------------------------------------------------------------------------
// Intro / status screens
// ---------------------------------------------------------------------------

/// The page shown before the first scene.
pub fn intro(ui: &mut Ui, state: &mut AppState) {
    let Some(intro) = state.story.intro.clone() else {
        return;
    };
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(60.0);
        ui.heading(RichText::new(intro.heading).size(28.0));
        ui.add_space(16.0);
        ui.label(RichText::new(intro.body).size(16.0));
        ui.add_space(24.0);
        if ui.button(RichText::new("Start ▶").size(18.0)).clicked() {
            state.start();
        }
    });
}

/// Spinner or error message while no dataset is usable.
pub fn load_status(ui: &mut Ui, status: &LoadStatus) -> Option<UiAction> {
    let mut action = None;
    ui.centered_and_justified(|ui: &mut Ui| match status {
        LoadStatus::Idle => {
            ui.heading("Open a listings file to begin  (File → Open data…)");
        }
        LoadStatus::Loading(path) => {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.spinner();
                ui.label(format!("Loading {}…", path.display()));
            });
        }
        LoadStatus::Failed(msg) => {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.colored_label(Color32::RED, format!("Could not load listings: {msg}"));
                if ui.button("Open another file…").clicked() {
                    action = open_data_dialog().map(UiAction::OpenData);
                }
            });
        }
        LoadStatus::Ready => {}
    });
    action
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_data_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open used-car listings")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}

pub fn open_story_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open story configuration")
        .add_filter("JSON", &["json"])
        .pick_file()
}
