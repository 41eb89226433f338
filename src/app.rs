use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::thread;

use eframe::egui;

use crate::data::loader::load_file;
use crate::data::model::CarDataset;
use crate::state::AppState;
use crate::story::StoryConfig;
use crate::ui::{self, panels, panels::UiAction};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct UsedCarStoryApp {
    pub state: AppState,
    /// Pending background load, polled once per frame.
    loader: Option<Receiver<anyhow::Result<CarDataset>>>,
}

impl UsedCarStoryApp {
    pub fn new(cc: &eframe::CreationContext<'_>, story: StoryConfig, data_path: PathBuf) -> Self {
        let mut app = Self {
            state: AppState::new(story),
            loader: None,
        };
        app.spawn_load(data_path, &cc.egui_ctx);
        app
    }

    /// Read `path` on a worker thread; the result arrives via `poll_loader`.
    fn spawn_load(&mut self, path: PathBuf, ctx: &egui::Context) {
        let (tx, rx) = channel();
        let options = self.state.story.load_options();
        let ctx = ctx.clone();

        self.state.begin_load(path.clone());
        thread::spawn(move || {
            tx.send(load_file(&path, &options)).ok();
            ctx.request_repaint();
        });
        self.loader = Some(rx);
    }

    fn poll_loader(&mut self) {
        let Some(rx) = &self.loader else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(dataset)) => {
                self.state.set_dataset(dataset);
                self.loader = None;
            }
            Ok(Err(e)) => {
                log::error!("Failed to load file: {e:#}");
                self.state.fail_load(format!("{e:#}"));
                self.loader = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                log::error!("loader thread exited without a result");
                self.state.fail_load("loader thread exited without a result".to_string());
                self.loader = None;
            }
        }
    }

    fn handle(&mut self, action: UiAction, ctx: &egui::Context) {
        match action {
            UiAction::OpenData(path) => self.spawn_load(path, ctx),
            UiAction::OpenStory(path) => match StoryConfig::from_path(&path) {
                Ok(story) => {
                    log::info!("Loaded story '{}' from {}", story.title, path.display());
                    if let Some(source) = self.state.set_story(story) {
                        log::info!("Story changed load options; reloading {}", source.display());
                        self.spawn_load(source, ctx);
                    }
                }
                Err(e) => self.state.report_story_error(&e),
            },
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (next, prev, start) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::Enter) || i.key_pressed(egui::Key::Space),
            )
        });
        if next {
            self.state.next();
        }
        if prev {
            self.state.prev();
        }
        if start {
            self.state.start();
        }
    }
}

impl eframe::App for UsedCarStoryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader();
        self.handle_keys(ctx);

        // Hover is re-established by whichever widget is under the pointer.
        self.state.set_hovered_category(None);

        let mut actions = Vec::new();

        // ---- Top panel: menu bar and navigation ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            actions.extend(panels::top_bar(ui, &mut self.state));
        });

        // ---- Left side panel: legend and scene list ----
        egui::SidePanel::left("legend_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: current scene ----
        egui::CentralPanel::default().show(ctx, |ui| {
            actions.extend(ui::central(ui, &mut self.state));
        });

        for action in actions {
            self.handle(action, ctx);
        }
    }
}
