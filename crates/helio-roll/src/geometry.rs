//! Mapping between musical space (key, beat, length) and roll pixels

use helio_core::{BEATS_PER_BAR, NUM_KEYS};

pub const MIN_ROW_HEIGHT: i32 = 6;
pub const MAX_ROW_HEIGHT: i32 = 30;
pub const DEFAULT_ROW_HEIGHT: i32 = MIN_ROW_HEIGHT + 5;

/// Height of the bar ruler above the rows
pub const HEADER_HEIGHT: f32 = 40.0;

pub const MIN_BAR_WIDTH: f32 = 16.0;
pub const MAX_BAR_WIDTH: f32 = 384.0;
pub const DEFAULT_BAR_WIDTH: f32 = 96.0;

/// Vertical wheel factors below this are treated as noise
const Y_ZOOM_THRESHOLD: f32 = 0.005;
const X_ZOOM_THRESHOLD: f32 = 0.005;

/// Extra rows kept around a zoomed-to key range
const ZOOM_AREA_MARGIN: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in roll content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanning two corners given in any order
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Bounds {
        Bounds::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

/// Visible part of the roll: scroll position and size, in content pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn area(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }
}

/// Coordinate mapping and zoom state of a piano roll.
///
/// Horizontally the roll spans `first_bar..last_bar` at `bar_width` pixels
/// per bar. Vertically it has a header followed by one row per key, key 0
/// at the bottom.
#[derive(Debug, Clone)]
pub struct RollGeometry {
    bar_width: f32,
    first_bar: f32,
    last_bar: f32,
    row_height: i32,
    num_rows: i32,
    height: f32,
    viewport: Viewport,
}

impl Default for RollGeometry {
    fn default() -> Self {
        Self::new()
    }
}

impl RollGeometry {
    pub fn new() -> Self {
        let mut geometry = Self {
            bar_width: DEFAULT_BAR_WIDTH,
            first_bar: 0.0,
            last_bar: 8.0,
            row_height: MIN_ROW_HEIGHT,
            num_rows: NUM_KEYS,
            height: 0.0,
            viewport: Viewport {
                x: 0.0,
                y: 0.0,
                width: 800.0,
                height: 480.0,
            },
        };
        geometry.height = geometry.content_height();
        geometry.set_row_height(DEFAULT_ROW_HEIGHT);
        geometry
    }

    fn content_height(&self) -> f32 {
        HEADER_HEIGHT + (self.num_rows * self.row_height) as f32
    }

    pub fn row_height(&self) -> i32 {
        self.row_height
    }

    pub fn num_rows(&self) -> i32 {
        self.num_rows
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn width(&self) -> f32 {
        (self.last_bar - self.first_bar) * self.bar_width
    }

    pub fn bar_width(&self) -> f32 {
        self.bar_width
    }

    pub fn first_bar(&self) -> f32 {
        self.first_bar
    }

    pub fn last_bar(&self) -> f32 {
        self.last_bar
    }

    pub fn first_beat(&self) -> f32 {
        self.first_bar * BEATS_PER_BAR
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    // ------------------------------------------------------------------
    // Musical -> pixels
    // ------------------------------------------------------------------

    /// Pixel rectangle of an event; one pixel of gutter is left between rows
    pub fn pixel_bounds(&self, key: i32, beat: f32, length: f32) -> Bounds {
        debug_assert!((-NUM_KEYS..=NUM_KEYS).contains(&key));
        let start_offset_beat = self.first_beat() as f64;
        let x = self.bar_width as f64 * (beat as f64 - start_offset_beat) / BEATS_PER_BAR as f64;
        let w = self.bar_width * length / BEATS_PER_BAR;
        let y = self.y_position_by_key(key);
        Bounds::new(x as f32, y + 1.0, w, (self.row_height - 1) as f32)
    }

    /// Top of the row of `key`
    pub fn y_position_by_key(&self, key: i32) -> f32 {
        (self.height - self.row_height as f32) - (key * self.row_height) as f32
    }

    pub fn x_position_by_beat(&self, beat: f32) -> f32 {
        (beat / BEATS_PER_BAR - self.first_bar) * self.bar_width
    }

    pub fn x_position_by_bar(&self, bar: f32) -> f32 {
        (bar - self.first_bar) * self.bar_width
    }

    // ------------------------------------------------------------------
    // Pixels -> musical
    // ------------------------------------------------------------------

    /// Key of the row under `y`, clamped to the existing rows
    pub fn key_at_y(&self, y: f32) -> i32 {
        let key = ((self.height - y) / self.row_height as f32).floor() as i32;
        key.clamp(0, self.num_rows - 1)
    }

    pub fn beat_at_x(&self, x: f32) -> f32 {
        self.first_beat() + x / self.bar_width * BEATS_PER_BAR
    }

    pub fn bar_at_x(&self, x: f32) -> f32 {
        self.first_bar + x / self.bar_width
    }

    /// Grid step in beats for the current horizontal zoom
    pub fn snap_beats(&self) -> f32 {
        let pixels_per_beat = self.bar_width / BEATS_PER_BAR;
        if pixels_per_beat >= 160.0 {
            0.125
        } else if pixels_per_beat >= 40.0 {
            0.25
        } else if pixels_per_beat >= 20.0 {
            0.5
        } else {
            1.0
        }
    }

    /// Beat under `x`, snapped down to the grid
    pub fn floor_beat_at_x(&self, x: f32) -> f32 {
        let snap = self.snap_beats();
        (self.beat_at_x(x) / snap).floor() * snap
    }

    /// Beat under `x`, snapped to the nearest grid line
    pub fn round_beat_at_x(&self, x: f32) -> f32 {
        let snap = self.snap_beats();
        (self.beat_at_x(x) / snap).round() * snap
    }

    // ------------------------------------------------------------------
    // Size and scrolling
    // ------------------------------------------------------------------

    /// Clamp and apply a row height. Returns false when nothing changed.
    pub fn set_row_height(&mut self, row_height: i32) -> bool {
        if row_height == self.row_height {
            return false;
        }
        let clamped = row_height.clamp(MIN_ROW_HEIGHT, MAX_ROW_HEIGHT);
        if clamped == self.row_height {
            return false;
        }
        self.row_height = clamped;
        self.height = self.content_height();
        self.clamp_view_position();
        true
    }

    pub fn set_bar_width(&mut self, bar_width: f32) -> bool {
        let clamped = bar_width.clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);
        if clamped == self.bar_width {
            return false;
        }
        self.bar_width = clamped;
        self.clamp_view_position();
        true
    }

    pub fn set_bar_range(&mut self, first_bar: f32, last_bar: f32) -> bool {
        let last_bar = last_bar.max(first_bar + 1.0);
        if first_bar == self.first_bar && last_bar == self.last_bar {
            return false;
        }
        self.first_bar = first_bar;
        self.last_bar = last_bar;
        self.clamp_view_position();
        true
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) -> bool {
        if width == self.viewport.width && height == self.viewport.height {
            return false;
        }
        self.viewport.width = width.max(1.0);
        self.viewport.height = height.max(1.0);
        self.clamp_view_position();
        true
    }

    pub fn set_view_position(&mut self, x: f32, y: f32) {
        self.viewport.x = x;
        self.viewport.y = y;
        self.clamp_view_position();
    }

    fn clamp_view_position(&mut self) {
        let max_x = (self.width() - self.viewport.width).max(0.0);
        let max_y = (self.height - self.viewport.height).max(0.0);
        self.viewport.x = self.viewport.x.clamp(0.0, max_x);
        self.viewport.y = self.viewport.y.clamp(0.0, max_y);
    }

    /// Beat range currently on screen
    pub fn visible_beat_range(&self) -> (f32, f32) {
        (
            self.beat_at_x(self.viewport.x),
            self.beat_at_x(self.viewport.x + self.viewport.width),
        )
    }

    // ------------------------------------------------------------------
    // Zoom
    // ------------------------------------------------------------------

    /// Wheel/pinch zoom around `origin` (relative to the viewport).
    ///
    /// Vertically the row height moves by one pixel per call; a change that
    /// would make the rows shorter than the viewport is rejected. Returns
    /// true when anything changed.
    pub fn zoom_relative(&mut self, origin: Point, factor: Point) -> bool {
        let mut changed = false;

        if factor.y.abs() > Y_ZOOM_THRESHOLD {
            let old_view_y = self.viewport.y;
            let absolute_origin_y = old_view_y + origin.y;
            let old_height = self.height;

            let mut new_row_height = self.row_height;
            if factor.y < -Y_ZOOM_THRESHOLD {
                new_row_height -= 1;
            }
            if factor.y > Y_ZOOM_THRESHOLD {
                new_row_height += 1;
            }

            let estimated_height = (new_row_height * self.num_rows) as f32;
            if estimated_height < self.viewport.height
                || !(MIN_ROW_HEIGHT..=MAX_ROW_HEIGHT).contains(&new_row_height)
            {
                new_row_height = self.row_height;
            }

            if self.set_row_height(new_row_height) {
                let new_view_y = absolute_origin_y * self.height / old_height - origin.y;
                self.set_view_position(self.viewport.x, (new_view_y + 0.5).floor());
                changed = true;
            }
        }

        if factor.x.abs() > X_ZOOM_THRESHOLD {
            let absolute_origin_x = self.viewport.x + origin.x;
            let old_width = self.width();
            if self.set_bar_width(self.bar_width * (1.0 + factor.x)) {
                let new_view_x = absolute_origin_x * self.width() / old_width - origin.x;
                self.set_view_position(new_view_x, self.viewport.y);
                changed = true;
            }
        }

        changed
    }

    /// Zoom so that a `zoom` fraction of the content is visible on each axis
    pub fn zoom_absolute(&mut self, zoom: Point) -> bool {
        let mut changed = false;

        if zoom.y > 0.0 {
            let new_height = (self.num_rows * MAX_ROW_HEIGHT) as f32 * zoom.y;
            let rows_on_new_screen = new_height / MAX_ROW_HEIGHT as f32;
            let new_row_height = (self.viewport.height / rows_on_new_screen + 0.5).floor();
            changed |= self.set_row_height(new_row_height as i32);
        }

        if zoom.x > 0.0 {
            let bars_on_screen = (self.last_bar - self.first_bar) * zoom.x;
            changed |= self.set_bar_width(self.viewport.width / bars_on_screen);
        }

        changed
    }

    /// Fraction of the content height that is visible
    pub fn zoom_factor_y(&self) -> f32 {
        self.viewport.height / self.height
    }

    pub fn zoom_factor_x(&self) -> f32 {
        self.viewport.width / self.width()
    }

    /// Fit `min_key..=max_key` plus a margin into the viewport height and
    /// scroll to it; fit the beat range horizontally
    pub fn zoom_to_area(&mut self, min_key: i32, max_key: i32, min_beat: f32, max_beat: f32) {
        debug_assert!(min_key >= 0);
        debug_assert!(max_key > min_key);

        let num_keys_to_fit = (max_key - min_key + ZOOM_AREA_MARGIN) as f32;
        self.set_row_height((self.viewport.height / num_keys_to_fit) as i32);

        let beats = (max_beat - min_beat).max(f32::EPSILON);
        self.set_bar_width(self.viewport.width * BEATS_PER_BAR / beats);

        // Half of the margin above the highest key
        let top_key = max_key + ZOOM_AREA_MARGIN / 2;
        self.set_view_position(self.x_position_by_beat(min_beat), self.y_position_by_key(top_key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_bounds() {
        let mut g = RollGeometry::new();
        g.set_row_height(10);
        g.set_bar_width(100.0);
        let height = HEADER_HEIGHT + 1280.0;
        assert_eq!(g.height(), height);

        let b = g.pixel_bounds(0, 0.0, 4.0);
        assert_eq!(b, Bounds::new(0.0, height - 10.0 + 1.0, 100.0, 9.0));

        let b = g.pixel_bounds(60, 2.0, 1.0);
        assert_eq!(b.x, 50.0);
        assert_eq!(b.w, 25.0);
        assert_eq!(b.y, height - 10.0 - 600.0 + 1.0);
    }

    #[test]
    fn test_pixel_bounds_follow_first_bar() {
        let mut g = RollGeometry::new();
        g.set_bar_width(100.0);
        g.set_bar_range(2.0, 10.0);
        assert_eq!(g.pixel_bounds(0, 8.0, 1.0).x, 0.0);
        assert_eq!(g.pixel_bounds(0, 12.0, 1.0).x, 100.0);
    }

    #[test]
    fn test_key_and_beat_inverse() {
        let mut g = RollGeometry::new();
        g.set_row_height(10);
        g.set_bar_width(128.0);
        for key in [0, 1, 60, 127] {
            let b = g.pixel_bounds(key, 0.0, 1.0);
            assert_eq!(g.key_at_y(b.y + b.h / 2.0), key);
        }
        assert_eq!(g.key_at_y(-100.0), 127);
        assert_eq!(g.key_at_y(g.height() + 100.0), 0);
        assert_eq!(g.beat_at_x(64.0), 2.0);
        assert_eq!(g.floor_beat_at_x(70.0), 2.0);
    }

    #[test]
    fn test_set_row_height_clamps() {
        let mut g = RollGeometry::new();
        assert!(g.set_row_height(1000));
        assert_eq!(g.row_height(), MAX_ROW_HEIGHT);
        assert!(g.set_row_height(-5));
        assert_eq!(g.row_height(), MIN_ROW_HEIGHT);
        assert_eq!(g.height(), HEADER_HEIGHT + (128 * MIN_ROW_HEIGHT) as f32);
    }

    #[test]
    fn test_set_row_height_same_value_is_noop() {
        let mut g = RollGeometry::new();
        let current = g.row_height();
        assert!(!g.set_row_height(current));
        // Clamped to the current value: still no resize
        g.set_row_height(MAX_ROW_HEIGHT);
        assert!(!g.set_row_height(MAX_ROW_HEIGHT + 10));
    }

    #[test]
    fn test_zoom_relative_steps_one_row() {
        let mut g = RollGeometry::new();
        g.set_viewport_size(800.0, 400.0);
        g.set_row_height(10);

        assert!(g.zoom_relative(Point::new(0.0, 200.0), Point::new(0.0, 0.5)));
        assert_eq!(g.row_height(), 11);
        assert!(g.zoom_relative(Point::new(0.0, 200.0), Point::new(0.0, -0.5)));
        assert_eq!(g.row_height(), 10);
        assert!(!g.zoom_relative(Point::new(0.0, 200.0), Point::new(0.0, 0.001)));
        assert_eq!(g.row_height(), 10);
    }

    #[test]
    fn test_zoom_relative_keeps_content_taller_than_view() {
        let mut g = RollGeometry::new();
        g.set_row_height(8);
        // 128 rows * 7px = 896 < 900: shrinking is refused
        g.set_viewport_size(800.0, 900.0);
        assert!(!g.zoom_relative(Point::default(), Point::new(0.0, -1.0)));
        assert_eq!(g.row_height(), 8);
    }

    #[test]
    fn test_zoom_to_area_fits_keys() {
        let mut g = RollGeometry::new();
        g.set_viewport_size(800.0, 400.0);
        g.zoom_to_area(60, 72, 0.0, 8.0);

        assert!(g.row_height() as f32 <= 400.0 / (72 - 60 + 2) as f32);
        assert_eq!(g.row_height(), 28);
        let top = g.viewport().y;
        assert!(g.y_position_by_key(72) >= top);
        assert!(g.y_position_by_key(60) + g.row_height() as f32 <= top + 400.0);
        assert_eq!(g.bar_width(), 384.0);
    }

    #[test]
    fn test_zoom_absolute() {
        let mut g = RollGeometry::new();
        g.set_viewport_size(800.0, 640.0);
        // Half of the rows on screen: 64 rows in 640px
        g.zoom_absolute(Point::new(0.0, 0.5));
        assert_eq!(g.row_height(), 10);
        assert!((g.zoom_factor_y() - 640.0 / g.height()).abs() < f32::EPSILON);
    }
}
