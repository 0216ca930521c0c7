// src/bin/headless.rs - Runs the wall without a window and prints the final grid
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use image::RgbaImage;
use serde::Serialize;
use tracing::info;

use pinch_wall::config::WallConfig;
use pinch_wall::coords::Space;
use pinch_wall::detector::{DetectionDispatch, DetectionWorker, InlineDispatch};
use pinch_wall::frame_loop::FrameLoop;
use pinch_wall::grid::GridFrame;
use pinch_wall::schedule::ManualClock;
use pinch_wall::session::{Session, SessionSummary};
use pinch_wall::simulation::SimulatedHands;

#[derive(Parser, Debug)]
#[command(name = "headless", about = "Run the pinch wall without a window")]
struct Options {
    /// Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Simulated frame rate
    #[arg(long, default_value_t = 60.0, value_parser = positive_fps)]
    fps: f64,

    /// Hands produced by the simulated source
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=2))]
    hands: u8,

    /// Run detection on the calling thread instead of the tokio worker
    #[arg(long)]
    inline: bool,

    /// JSON config file (default: platform config dir, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn positive_fps(raw: &str) -> Result<f64, String> {
    let fps: f64 = raw.parse().map_err(|e| format!("{}", e))?;
    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(format!("must be positive, got {}", fps))
    }
}

#[derive(Serialize)]
struct Report {
    session: SessionSummary,
    frames: u64,
    skipped_detections: u64,
    failed_detections: usize,
    grid: GridFrame,
}

fn run<D: DetectionDispatch>(
    session: Session,
    dispatch: D,
    options: &Options,
    settle: Duration,
) -> Report {
    let clock = ManualClock::new();
    let step = Duration::from_secs_f64(1.0 / options.fps);
    let mut frame_loop = FrameLoop::new(session, clock.clone(), dispatch);

    let capture = frame_loop.session().mapper().resolution(Space::Capture);
    let frame = RgbaImage::new(capture.width, capture.height);
    let mut failures = 0;

    for _ in 0..options.frames {
        clock.advance(step);
        let report = frame_loop.tick(&frame);
        failures += report.failures;
        for event in report.events {
            info!(
                "t={:.3}s slot {} pinched at ({:.0}, {:.0}) -> {:?}",
                event.at.as_secs_f64(),
                event.slot,
                event.midpoint.x,
                event.midpoint.y,
                event.cell
            );
        }
        if !settle.is_zero() {
            std::thread::sleep(settle);
        }
    }

    let session = frame_loop.session();
    Report {
        session: session.summary(),
        frames: options.frames,
        skipped_detections: frame_loop.scheduler().skipped(),
        failed_detections: failures,
        grid: session.grid_frame(),
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let options = Options::parse();
    let config =
        WallConfig::load(options.config.as_deref()).context("Failed to load configuration")?;
    let session = Session::new(config).context("Invalid configuration")?;
    let source = Box::new(SimulatedHands::new(options.hands as usize));
    info!(
        "Headless run: {} frames at {} fps, {} detection",
        options.frames,
        options.fps,
        if options.inline { "inline" } else { "worker" }
    );

    let report = if options.inline {
        run(session, InlineDispatch::new(source), &options, Duration::ZERO)
    } else {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start detection runtime")?;
        let worker = DetectionWorker::new(source, runtime.handle().clone());
        // Give the blocking pool a moment per frame so results land on time.
        run(session, worker, &options, Duration::from_millis(1))
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
