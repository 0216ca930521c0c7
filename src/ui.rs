// src/ui.rs - Painting the wall, hand indicators and the signal table
use eframe::egui::{self, Color32, Pos2, Rect, Shape, Stroke, Vec2};
use egui_extras::{Column, TableBuilder};

use pinch_wall::coords::{CoordinateMapper, Space};
use pinch_wall::grid::{CellFrame, GridFrame};
use pinch_wall::keypoints::{Keypoint, SKELETON};
use pinch_wall::session::{Session, SlotContext};
use pinch_wall::slots::MAX_HANDS;

#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color32,
    pub surface: Color32,
    pub cell_stroke: Color32,
    pub marker: Color32,
    pub flash: Color32,
    pub slots: [Color32; MAX_HANDS],
    pub pinching: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(20, 20, 25),
            surface: Color32::from_rgb(30, 30, 35),
            cell_stroke: Color32::from_rgb(200, 200, 200),
            marker: Color32::from_rgb(20, 20, 25),
            flash: Color32::WHITE,
            slots: [Color32::from_rgb(70, 130, 240), Color32::from_rgb(255, 152, 0)],
            pinching: Color32::from_rgb(76, 175, 80),
            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(200, 200, 200),
        }
    }
}

impl Theme {
    /// Checkerboard fill so neighbouring cells stay distinguishable.
    fn cell_fill(&self, cell: &CellFrame) -> Color32 {
        let palette = [
            Color32::from_rgb(96, 125, 139),
            Color32::from_rgb(121, 85, 72),
            Color32::from_rgb(0, 150, 136),
            Color32::from_rgb(156, 39, 176),
        ];
        palette[(cell.row * 2 + cell.col) % palette.len()]
    }
}

/// Display-space pixel to screen position inside `rect`.
fn to_screen(rect: Rect, p: Keypoint) -> Pos2 {
    Pos2::new(rect.left() + p.x as f32, rect.top() + p.y as f32)
}

fn rotate_about(point: Pos2, centre: Pos2, radians: f32) -> Pos2 {
    let (sin, cos) = radians.sin_cos();
    let d = point - centre;
    centre + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
}

pub fn draw_wall(painter: &egui::Painter, rect: Rect, frame: &GridFrame, theme: &Theme) {
    painter.rect_filled(rect, egui::Rounding::same(4.0), theme.background);
    for cell in &frame.cells {
        draw_cell(painter, rect, cell, theme);
    }
}

fn draw_cell(painter: &egui::Painter, rect: Rect, cell: &CellFrame, theme: &Theme) {
    let min = Pos2::new(
        rect.left() + (cell.x * rect.width() as f64) as f32,
        rect.top() + (cell.y * rect.height() as f64) as f32,
    );
    let size = Vec2::new(
        (cell.width * rect.width() as f64) as f32,
        (cell.height * rect.height() as f64) as f32,
    );
    let cell_rect = Rect::from_min_size(min, size).shrink(2.0);
    let centre = cell_rect.center();
    let angle = cell.rotation_radians as f32;

    let corners = [
        cell_rect.left_top(),
        cell_rect.right_top(),
        cell_rect.right_bottom(),
        cell_rect.left_bottom(),
    ]
    .map(|p| rotate_about(p, centre, angle));
    painter.add(Shape::convex_polygon(
        corners.to_vec(),
        theme.cell_fill(cell),
        Stroke::new(1.0, theme.cell_stroke),
    ));

    // Notch on the top edge shows which way the cell faces.
    let notch = [
        Pos2::new(centre.x - size.x * 0.12, cell_rect.top() + 2.0),
        Pos2::new(centre.x + size.x * 0.12, cell_rect.top() + 2.0),
        Pos2::new(centre.x, cell_rect.top() + size.y * 0.2),
    ]
    .map(|p| rotate_about(p, centre, angle));
    painter.add(Shape::convex_polygon(notch.to_vec(), theme.marker, Stroke::NONE));

    if cell.flash_alpha > 0 {
        let [r, g, b, _] = theme.flash.to_array();
        painter.add(Shape::convex_polygon(
            corners.to_vec(),
            Color32::from_rgba_unmultiplied(r, g, b, cell.flash_alpha),
            Stroke::NONE,
        ));
    }
}

/// Pinch midpoint per slot, plus skeleton, threshold ring and readouts
/// when `debug` is set.
pub fn draw_hands(
    painter: &egui::Painter,
    rect: Rect,
    session: &Session,
    theme: &Theme,
    debug: bool,
) {
    let mapper = session.mapper();
    for (slot, context) in session.slots().iter().enumerate() {
        let Some(hand) = context.observation() else {
            continue;
        };
        let colour = theme.slots[slot];
        let midpoint = to_screen(rect, mapper.to_display(hand.pinch_midpoint(), Space::Processing));

        if debug {
            draw_skeleton(painter, rect, mapper, hand.keypoints(), colour);
            draw_readout(painter, midpoint, slot, context, mapper, theme);
        }

        let fill = if context.tracker().is_active() {
            theme.pinching
        } else {
            colour
        };
        painter.circle_filled(midpoint, 8.0, fill);
        painter.circle_stroke(midpoint, 10.0, Stroke::new(2.0, theme.text_primary));
    }
}

fn draw_skeleton(
    painter: &egui::Painter,
    rect: Rect,
    mapper: &CoordinateMapper,
    keypoints: &[Keypoint],
    colour: Color32,
) {
    let points: Vec<Pos2> = keypoints
        .iter()
        .map(|p| to_screen(rect, mapper.to_display(*p, Space::Processing)))
        .collect();

    for (a, b) in SKELETON {
        painter.line_segment([points[a], points[b]], Stroke::new(2.0, colour));
    }
    for p in &points {
        painter.circle_filled(*p, 3.0, colour);
    }
}

fn draw_readout(
    painter: &egui::Painter,
    midpoint: Pos2,
    slot: usize,
    context: &SlotContext,
    mapper: &CoordinateMapper,
    theme: &Theme,
) {
    let (Some(smoothed), Some(threshold)) = (context.smoothed(), context.threshold()) else {
        return;
    };
    let radius = mapper.convert_length(threshold, Space::Processing, Space::Display) as f32;
    painter.circle_stroke(midpoint, radius, Stroke::new(1.0, theme.text_secondary));
    painter.text(
        midpoint + Vec2::new(radius + 6.0, 0.0),
        egui::Align2::LEFT_CENTER,
        format!(
            "#{} d={:.1} t={:.1} s={:.1}",
            slot, smoothed.pinch_distance, threshold, smoothed.hand_size
        ),
        egui::FontId::monospace(12.0),
        theme.text_primary,
    );
}

/// Per-slot signal table for the side panel.
pub fn signal_table(ui: &mut egui::Ui, session: &Session, theme: &Theme) {
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .columns(Column::remainder(), 5)
        .header(20.0, |mut header| {
            for title in ["Slot", "Size", "Pinch", "Thresh", "Phase", "Last cell"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for (slot, context) in session.slots().iter().enumerate() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.colored_label(theme.slots[slot], format!("{}", slot));
                    });
                    let smoothed = context.smoothed();
                    row.col(|ui| {
                        ui.label(smoothed.map_or("-".into(), |s| format!("{:.1}", s.hand_size)));
                    });
                    row.col(|ui| {
                        ui.label(
                            smoothed.map_or("-".into(), |s| format!("{:.1}", s.pinch_distance)),
                        );
                    });
                    row.col(|ui| {
                        ui.label(context.threshold().map_or("-".into(), |t| format!("{:.1}", t)));
                    });
                    row.col(|ui| {
                        if context.tracker().is_active() {
                            ui.colored_label(theme.pinching, "pinch");
                        } else {
                            ui.label("idle");
                        }
                    });
                    row.col(|ui| {
                        ui.label(
                            context
                                .tracker()
                                .last_cell()
                                .map_or("-".into(), |c| format!("({}, {})", c.row, c.col)),
                        );
                    });
                });
            }
        });
}
