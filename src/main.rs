mod app;
mod chart;
mod color;
mod data;
mod state;
mod story;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::UsedCarStoryApp;
use clap::Parser;
use eframe::egui;
use story::StoryConfig;

/// Scene-by-scene walkthrough of used-car listing prices.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Listings file (.csv, .json or .parquet).
    #[arg(long, default_value = "data/used_cars_cleaned.csv")]
    data: PathBuf,

    /// Story configuration (JSON). Defaults to the built-in story.
    #[arg(long)]
    story: Option<PathBuf>,

    /// Print the story as JSON and exit.
    #[arg(long)]
    print_story: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let story = match &cli.story {
        Some(path) => StoryConfig::from_path(path)
            .with_context(|| format!("loading story {}", path.display()))?,
        None => StoryConfig::default(),
    };

    if cli.print_story {
        println!("{}", story.to_json()?);
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let title = story.title.clone();
    let data = cli.data;
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(UsedCarStoryApp::new(cc, story, data)))),
    )
    .map_err(|e| anyhow::anyhow!("running the viewer: {e}"))
}
