use std::path::PathBuf;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use scenes_core::{load_settings, settings::load_settings_from};
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::ScenesApp;

#[derive(Debug, Parser)]
#[command(name = "scenes", about = "Click-through scene slideshow")]
struct Args {
    /// SQLite database backing the namespaced local store.
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    namespace: Option<String>,
    /// Settings file; defaults to scenes.toml in the working directory.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = match &args.config {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    };
    if let Some(database_url) = args.database_url {
        settings.database_url = database_url;
    }
    if let Some(namespace) = args.namespace {
        settings.namespace = namespace;
    }
    tracing::info!(
        database_url = %settings.database_url,
        namespace = %settings.namespace,
        "starting scenes desktop"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Scenes")
            .with_inner_size([720.0, 480.0])
            .with_min_inner_size([420.0, 320.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Scenes",
        options,
        Box::new(|_cc| Ok(Box::new(ScenesApp::new(cmd_tx, ui_rx)))),
    )
}
