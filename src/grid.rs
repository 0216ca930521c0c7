// src/grid.rs - Rotating cell wall driven by pinch-start events
use std::time::Duration;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GridConfig;
use crate::coords::Resolution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
}

impl CellIndex {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Which way a pinch turns the cell it lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinPolicy {
    /// Every pinch adds `+step`.
    Uniform,
    /// Slot 0 turns by `-step`, any other slot by `+step`.
    BySlot,
}

impl SpinPolicy {
    pub fn delta(&self, step_degrees: f64, slot: usize) -> f64 {
        match self {
            SpinPolicy::Uniform => step_degrees,
            SpinPolicy::BySlot if slot == 0 => -step_degrees,
            SpinPolicy::BySlot => step_degrees,
        }
    }
}

/// Placement of the wall in display pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub rows: usize,
    pub cols: usize,
    pub origin: Point2<f64>,
    pub cell_size: f64,
    pub gap: f64,
    /// Count columns right-to-left, for a mirrored overlay.
    pub mirror_columns: bool,
}

impl GridLayout {
    pub fn new(rows: usize, cols: usize, origin: Point2<f64>, cell_size: f64) -> Self {
        Self {
            rows,
            cols,
            origin,
            cell_size,
            gap: 0.0,
            mirror_columns: false,
        }
    }

    /// Square cells as large as fit between the margins, centred horizontally.
    pub fn fit(display: Resolution, config: &GridConfig) -> Self {
        let width = display.width as f64;
        let height = display.height as f64;
        let rows = config.rows.max(1);
        let cols = config.cols.max(1);
        let gap = config.gap.max(0.0);

        let mut top = config.top_margin;
        let mut available_height = height - config.top_margin - config.bottom_margin;
        if available_height <= 0.0 {
            // Window too short for the margins, use all of it.
            top = 0.0;
            available_height = height;
        }

        let by_width = (width - gap * (cols - 1) as f64) / cols as f64;
        let by_height = (available_height - gap * (rows - 1) as f64) / rows as f64;
        let cell_size = by_width.min(by_height).max(1.0);

        let total_width = cell_size * cols as f64 + gap * (cols - 1) as f64;
        Self {
            rows,
            cols,
            origin: Point2::new((width - total_width) / 2.0, top),
            cell_size,
            gap,
            mirror_columns: config.mirror_columns,
        }
    }

    fn pitch(&self) -> f64 {
        self.cell_size + self.gap
    }

    /// Floor-based lookup: a point on a shared edge belongs to the cell that
    /// starts there. Points before the origin or past the last cell map to
    /// `None`.
    pub fn cell_at(&self, point: Point2<f64>) -> Option<CellIndex> {
        let pitch = self.pitch();
        let col = ((point.x - self.origin.x) / pitch).floor();
        let row = ((point.y - self.origin.y) / pitch).floor();

        if !col.is_finite() || !row.is_finite() {
            return None;
        }
        if col < 0.0 || row < 0.0 || col >= self.cols as f64 || row >= self.rows as f64 {
            return None;
        }

        let col = col as usize;
        let col = if self.mirror_columns {
            self.cols - 1 - col
        } else {
            col
        };
        Some(CellIndex::new(row as usize, col))
    }

    /// Top-left corner of a cell in display pixels.
    pub fn cell_origin(&self, cell: CellIndex) -> Point2<f64> {
        let drawn_col = if self.mirror_columns {
            self.cols - 1 - cell.col
        } else {
            cell.col
        };
        Point2::new(
            self.origin.x + drawn_col as f64 * self.pitch(),
            self.origin.y + cell.row as f64 * self.pitch(),
        )
    }

    pub fn contains(&self, cell: CellIndex) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridCell {
    rotation_degrees: f64,
    cumulative_degrees: f64,
    flash_remaining: Duration,
}

impl GridCell {
    /// Net orientation in `[0, 360)`.
    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    /// Total absolute rotation ever applied.
    pub fn cumulative_degrees(&self) -> f64 {
        self.cumulative_degrees
    }

    pub fn flash_remaining(&self) -> Duration {
        self.flash_remaining
    }

    fn rotate(&mut self, delta_degrees: f64, flash: Duration) {
        self.rotation_degrees = (self.rotation_degrees + delta_degrees).rem_euclid(360.0);
        self.cumulative_degrees += delta_degrees.abs();
        self.flash_remaining = flash;
    }

    fn tick(&mut self, dt: Duration) {
        self.flash_remaining = self.flash_remaining.saturating_sub(dt);
    }
}

/// Per-cell parameters handed to the renderer. Position and size are
/// fractions of the display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellFrame {
    pub row: usize,
    pub col: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_degrees: f64,
    pub rotation_radians: f64,
    pub cumulative_degrees: f64,
    pub flash_alpha: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridFrame {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<CellFrame>,
}

#[derive(Debug, Clone)]
pub struct GridEngine {
    config: GridConfig,
    layout: GridLayout,
    cells: Vec<GridCell>,
}

impl GridEngine {
    pub fn new(config: GridConfig, display: Resolution) -> Self {
        let layout = GridLayout::fit(display, &config);
        Self::with_layout(config, layout)
    }

    /// Uses an explicit layout instead of fitting one to the display.
    pub fn with_layout(config: GridConfig, layout: GridLayout) -> Self {
        let cells = vec![GridCell::default(); layout.rows * layout.cols];
        Self {
            config,
            layout,
            cells,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Refits the layout to a new display size; cell state is kept.
    pub fn relayout(&mut self, display: Resolution) {
        let layout = GridLayout::fit(display, &self.config);
        debug!(
            "Grid relayout: origin ({:.1}, {:.1}), cell {:.1}px",
            layout.origin.x, layout.origin.y, layout.cell_size
        );
        self.layout = layout;
    }

    fn offset(&self, cell: CellIndex) -> Option<usize> {
        if self.layout.contains(cell) {
            Some(cell.row * self.layout.cols + cell.col)
        } else {
            None
        }
    }

    pub fn cell(&self, cell: CellIndex) -> Option<&GridCell> {
        self.offset(cell).map(|i| &self.cells[i])
    }

    pub fn cell_at(&self, point: Point2<f64>) -> Option<CellIndex> {
        self.layout.cell_at(point)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.config.flash_ms)
    }

    /// Applies one rotation step to the cell under `point` (display pixels).
    /// Points outside the wall are ignored.
    pub fn on_pinch_start(&mut self, point: Point2<f64>, slot: usize) -> Option<CellIndex> {
        let cell = self.layout.cell_at(point)?;
        let delta = self.config.spin.delta(self.config.step_degrees, slot);
        self.rotate_cell(cell, delta);
        Some(cell)
    }

    pub fn rotate_cell(&mut self, cell: CellIndex, delta_degrees: f64) -> bool {
        let flash = self.flash_duration();
        match self.offset(cell) {
            Some(i) => {
                self.cells[i].rotate(delta_degrees, flash);
                info!(
                    "Cell ({}, {}) rotated by {:+.0}° to {:.0}°",
                    cell.row, cell.col, delta_degrees, self.cells[i].rotation_degrees
                );
                true
            }
            None => false,
        }
    }

    /// Counts flash timers down by the elapsed frame time.
    pub fn tick(&mut self, dt: Duration) {
        for cell in &mut self.cells {
            cell.tick(dt);
        }
    }

    pub fn flash_alpha(&self, cell: CellIndex) -> u8 {
        let Some(state) = self.cell(cell) else {
            return 0;
        };
        let duration = self.flash_duration();
        if duration.is_zero() {
            return 0;
        }
        let fraction = state.flash_remaining.as_secs_f64() / duration.as_secs_f64();
        (self.config.flash_peak_alpha as f64 * fraction.clamp(0.0, 1.0)).round() as u8
    }

    pub fn frame(&self, display: Resolution) -> GridFrame {
        let width = display.width as f64;
        let height = display.height as f64;
        let mut cells = Vec::with_capacity(self.cells.len());

        for row in 0..self.layout.rows {
            for col in 0..self.layout.cols {
                let index = CellIndex::new(row, col);
                let origin = self.layout.cell_origin(index);
                let state = &self.cells[row * self.layout.cols + col];
                cells.push(CellFrame {
                    row,
                    col,
                    x: origin.x / width,
                    y: origin.y / height,
                    width: self.layout.cell_size / width,
                    height: self.layout.cell_size / height,
                    rotation_degrees: state.rotation_degrees,
                    rotation_radians: state.rotation_degrees.to_radians(),
                    cumulative_degrees: state.cumulative_degrees,
                    flash_alpha: self.flash_alpha(index),
                });
            }
        }

        GridFrame {
            rows: self.layout.rows,
            cols: self.layout.cols,
            cells,
        }
    }

    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            *cell = GridCell::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_4x4() -> GridEngine {
        let layout = GridLayout::new(4, 4, Point2::origin(), 100.0);
        GridEngine::with_layout(GridConfig::default(), layout)
    }

    #[test]
    fn lookup_uses_floor_per_axis() {
        let layout = GridLayout::new(4, 4, Point2::origin(), 100.0);
        assert_eq!(
            layout.cell_at(Point2::new(150.0, 250.0)),
            Some(CellIndex::new(2, 1))
        );
        assert_eq!(layout.cell_at(Point2::new(-5.0, 50.0)), None);
    }

    #[test]
    fn shared_edge_goes_to_the_cell_starting_there() {
        let layout = GridLayout::new(4, 4, Point2::origin(), 100.0);
        assert_eq!(
            layout.cell_at(Point2::new(100.0, 0.0)),
            Some(CellIndex::new(0, 1))
        );
        assert_eq!(
            layout.cell_at(Point2::new(399.999, 399.999)),
            Some(CellIndex::new(3, 3))
        );
        assert_eq!(layout.cell_at(Point2::new(400.0, 10.0)), None);
        assert_eq!(layout.cell_at(Point2::new(10.0, 400.0)), None);
    }

    #[test]
    fn lookup_is_repeatable() {
        let layout = GridLayout::new(4, 4, Point2::new(240.0, 40.0), 120.0);
        let p = Point2::new(517.3, 289.9);
        let first = layout.cell_at(p);
        for _ in 0..10 {
            assert_eq!(layout.cell_at(p), first);
        }
    }

    #[test]
    fn mirrored_columns_count_from_the_right() {
        let mut layout = GridLayout::new(2, 4, Point2::origin(), 10.0);
        layout.mirror_columns = true;
        let cell = layout.cell_at(Point2::new(5.0, 5.0)).unwrap();
        assert_eq!(cell, CellIndex::new(0, 3));
        assert_eq!(layout.cell_origin(cell), Point2::new(0.0, 0.0));
    }

    #[test]
    fn gaps_belong_to_the_preceding_cell() {
        let mut layout = GridLayout::new(2, 2, Point2::origin(), 10.0);
        layout.gap = 2.0;
        assert_eq!(layout.cell_at(Point2::new(11.0, 0.0)), Some(CellIndex::new(0, 0)));
        assert_eq!(layout.cell_at(Point2::new(12.0, 0.0)), Some(CellIndex::new(0, 1)));
    }

    #[test]
    fn fit_centres_square_grid_between_margins() {
        let layout = GridLayout::fit(Resolution::new_unchecked(960, 720), &GridConfig::default());
        assert_eq!(layout.cell_size, 120.0);
        assert_eq!(layout.origin, Point2::new(240.0, 40.0));
    }

    #[test]
    fn fit_survives_tiny_windows() {
        let layout = GridLayout::fit(Resolution::new_unchecked(100, 100), &GridConfig::default());
        assert_eq!(layout.origin.y, 0.0);
        assert_eq!(layout.cell_size, 25.0);
    }

    #[test]
    fn repeated_pinches_accumulate_exactly() {
        let mut engine = engine_4x4();
        let cell = CellIndex::new(1, 2);
        for n in 1..=11u32 {
            assert_eq!(engine.on_pinch_start(Point2::new(250.0, 150.0), 0), Some(cell));
            let state = engine.cell(cell).unwrap();
            assert_eq!(state.rotation_degrees(), (n as f64 * 90.0) % 360.0);
            assert_eq!(state.cumulative_degrees(), n as f64 * 90.0);
        }
    }

    #[test]
    fn by_slot_spin_turns_both_ways() {
        let mut config = GridConfig::default();
        config.spin = SpinPolicy::BySlot;
        let layout = GridLayout::new(4, 4, Point2::origin(), 100.0);
        let mut engine = GridEngine::with_layout(config, layout);
        let p = Point2::new(50.0, 50.0);
        let cell = CellIndex::new(0, 0);

        engine.on_pinch_start(p, 0);
        assert_eq!(engine.cell(cell).unwrap().rotation_degrees(), 270.0);
        engine.on_pinch_start(p, 1);
        engine.on_pinch_start(p, 1);
        assert_eq!(engine.cell(cell).unwrap().rotation_degrees(), 90.0);
        assert_eq!(engine.cell(cell).unwrap().cumulative_degrees(), 270.0);
    }

    #[test]
    fn pinch_outside_the_wall_changes_nothing() {
        let mut engine = engine_4x4();
        let before = engine.frame(Resolution::new_unchecked(400, 400));
        assert_eq!(engine.on_pinch_start(Point2::new(-5.0, 50.0), 0), None);
        assert_eq!(engine.frame(Resolution::new_unchecked(400, 400)), before);
    }

    #[test]
    fn flash_timer_floors_at_zero() {
        let mut engine = engine_4x4();
        let cell = engine.on_pinch_start(Point2::new(10.0, 10.0), 0).unwrap();
        assert_eq!(engine.cell(cell).unwrap().flash_remaining(), Duration::from_millis(200));
        assert_eq!(engine.flash_alpha(cell), 200);

        engine.tick(Duration::from_millis(150));
        assert_eq!(engine.cell(cell).unwrap().flash_remaining(), Duration::from_millis(50));
        assert_eq!(engine.flash_alpha(cell), 50);

        engine.tick(Duration::from_millis(150));
        engine.tick(Duration::from_millis(150));
        assert_eq!(engine.cell(cell).unwrap().flash_remaining(), Duration::ZERO);
        assert_eq!(engine.flash_alpha(cell), 0);

        engine.on_pinch_start(Point2::new(10.0, 10.0), 0);
        assert_eq!(engine.cell(cell).unwrap().flash_remaining(), Duration::from_millis(200));
    }

    #[test]
    fn frame_reports_normalized_geometry() {
        let mut engine = engine_4x4();
        engine.on_pinch_start(Point2::new(150.0, 250.0), 0);
        let frame = engine.frame(Resolution::new_unchecked(800, 400));

        assert_eq!(frame.cells.len(), 16);
        let cell = frame.cells.iter().find(|c| c.row == 2 && c.col == 1).unwrap();
        assert_eq!(cell.x, 100.0 / 800.0);
        assert_eq!(cell.y, 200.0 / 400.0);
        assert_eq!(cell.width, 100.0 / 800.0);
        assert_eq!(cell.rotation_degrees, 90.0);
        assert!((cell.rotation_radians - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn relayout_keeps_cell_state() {
        let mut engine =
            GridEngine::new(GridConfig::default(), Resolution::new_unchecked(960, 720));
        let cell = engine.on_pinch_start(Point2::new(250.0, 50.0), 0).unwrap();
        engine.relayout(Resolution::new_unchecked(480, 360));
        assert_eq!(engine.cell(cell).unwrap().rotation_degrees(), 90.0);
        assert_ne!(engine.layout().cell_size, 120.0);
    }
}
