// src/app.rs
use std::collections::VecDeque;

use chrono::{DateTime, Local};
use eframe::egui;
use image::RgbaImage;
use tokio::runtime::Runtime;
use tracing::info;

use pinch_wall::coords::{Resolution, Space};
use pinch_wall::detector::DetectionWorker;
use pinch_wall::frame_loop::FrameLoop;
use pinch_wall::schedule::SystemClock;
use pinch_wall::session::{PinchEvent, Session};

use crate::ui::{self, Theme};

const EVENT_LOG_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    WallOnly,
    WithPanel,
}

pub struct PinchWallApp {
    frame_loop: FrameLoop<SystemClock, DetectionWorker>,
    // The worker's blocking tasks run here; dropping it stops detection.
    _runtime: Runtime,
    capture: RgbaImage,

    view_mode: ViewMode,
    show_debug: bool,
    theme: Theme,

    events: VecDeque<(DateTime<Local>, PinchEvent)>,
}

impl PinchWallApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        session: Session,
        worker: DetectionWorker,
        runtime: Runtime,
    ) -> Self {
        let capture = session.mapper().resolution(Space::Capture);
        let capture = RgbaImage::from_pixel(
            capture.width,
            capture.height,
            image::Rgba([24, 24, 28, 255]),
        );

        Self {
            frame_loop: FrameLoop::new(session, SystemClock::new(), worker),
            _runtime: runtime,
            capture,
            view_mode: ViewMode::WithPanel,
            show_debug: false,
            theme: Theme::default(),
            events: VecDeque::with_capacity(EVENT_LOG_LEN),
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (debug, panel, reset) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::D),
                i.key_pressed(egui::Key::H),
                i.key_pressed(egui::Key::R),
            )
        });

        if debug {
            self.show_debug = !self.show_debug;
        }
        if panel {
            self.view_mode = match self.view_mode {
                ViewMode::WallOnly => ViewMode::WithPanel,
                ViewMode::WithPanel => ViewMode::WallOnly,
            };
        }
        if reset {
            info!("Reset requested from keyboard");
            self.frame_loop.reset();
            self.events.clear();
        }
    }

    fn render_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("signals")
            .resizable(false)
            .default_width(340.0)
            .show(ctx, |ui| {
                ui.add_space(10.0);
                ui.heading("Hand Signals");
                ui::signal_table(ui, self.frame_loop.session(), &self.theme);

                ui.separator();
                ui.heading("Detection");
                let scheduler = self.frame_loop.scheduler();
                ui.label(format!("Frames: {}", scheduler.frame_count()));
                ui.label(format!("Skipped while busy: {}", scheduler.skipped()));
                ui.label(format!(
                    "In flight: {}",
                    scheduler
                        .in_flight()
                        .map_or("none".to_string(), |id| format!("#{}", id.sequence))
                ));

                ui.separator();
                ui.heading("Recent Pinches");
                for (at, event) in self.events.iter().rev() {
                    let target = event
                        .cell
                        .map_or("off wall".to_string(), |c| format!("cell ({}, {})", c.row, c.col));
                    ui.colored_label(
                        self.theme.slots[event.slot],
                        format!("{}  slot {} -> {}", at.format("%H:%M:%S%.3f"), event.slot, target),
                    );
                }

                ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                    ui.label(
                        egui::RichText::new("D debug  ·  H panel  ·  R reset")
                            .color(self.theme.text_secondary),
                    );
                });
            });
    }

    fn render_wall(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.surface))
            .show(ctx, |ui| {
                let rect = ui.available_rect_before_wrap();
                let display =
                    Resolution::new(rect.width().round() as u32, rect.height().round() as u32);
                if let Ok(display) = display {
                    self.frame_loop.resize(Space::Display, display);
                }

                let report = self.frame_loop.tick(&self.capture);
                for event in report.events {
                    if self.events.len() == EVENT_LOG_LEN {
                        self.events.pop_front();
                    }
                    self.events.push_back((Local::now(), event));
                }

                let session = self.frame_loop.session();
                let painter = ui.painter_at(rect);
                ui::draw_wall(&painter, rect, &session.grid_frame(), &self.theme);
                ui::draw_hands(&painter, rect, session, &self.theme, self.show_debug);

                if self.show_debug {
                    painter.text(
                        rect.left_top() + egui::vec2(10.0, 10.0),
                        egui::Align2::LEFT_TOP,
                        format!(
                            "session {}  dt {:.1} ms",
                            session.id(),
                            report.dt.as_secs_f64() * 1000.0
                        ),
                        egui::FontId::monospace(12.0),
                        self.theme.text_primary,
                    );
                }
            });
    }
}

impl eframe::App for PinchWallApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        if self.view_mode == ViewMode::WithPanel {
            self.render_side_panel(ctx);
        }
        // Resize is applied inside, before the frame is processed.
        self.render_wall(ctx);

        // Request repaint for continuous updates
        ctx.request_repaint();
    }
}
