// src/main.rs
mod app;
mod ui;

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use eframe::egui;
use tracing::info;

use pinch_wall::config::WallConfig;
use pinch_wall::detector::DetectionWorker;
use pinch_wall::session::Session;
use pinch_wall::simulation::SimulatedHands;

const SIDE_PANEL_WIDTH: f32 = 340.0;

#[derive(Parser, Debug)]
#[command(name = "pinch_wall", about = "Pinch-to-rotate video wall")]
struct Cli {
    /// JSON config file (default: platform config dir, then built-in defaults)
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = WallConfig::load_or_default(cli.config.as_deref());
    let display = config.video.display;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start detection runtime")?;
    let source = SimulatedHands::new(2);
    let worker = DetectionWorker::new(Box::new(source), runtime.handle().clone());
    let session = Session::new(config).context("Invalid configuration")?;
    info!("Pinch Wall session {}", session.id());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([display.width as f32 + SIDE_PANEL_WIDTH, display.height as f32])
            .with_min_inner_size([480.0, 360.0]),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        "Pinch Wall",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(app::PinchWallApp::new(cc, session, worker, runtime))
        }),
    )
    .map_err(|e| anyhow!("Error running application: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_optional() {
        assert!(Cli::try_parse_from(["pinch_wall"]).unwrap().config.is_none());
        let cli = Cli::try_parse_from(["pinch_wall", "wall.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("wall.json")));
    }
}
