use tracelane_core::layout::{Point, Rect};
use tracelane_core::Viewport;

const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 8.0;

/// Pan/zoom state of the lane view, in scene units.
#[derive(Debug, Clone)]
pub struct Camera {
    center: Point,
    zoom: f64,
    /// Visible size in terminal cells at zoom 1.0
    cells: (f64, f64),
    highlighted: Option<Rect>,
    home: Point,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Point::default(),
            zoom: 1.0,
            cells: (80.0, 24.0),
            highlighted: None,
            home: Point::default(),
        }
    }
}

impl Camera {
    /// Frame a freshly loaded scene: left edge of its bounds, vertically centred
    pub fn frame(&mut self, bounds: Option<Rect>) {
        self.home = match bounds {
            Some(b) => Point::new(b.x + self.cells.0 / 2.0, b.center().y),
            None => Point::default(),
        };
        self.highlighted = None;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.center = self.home;
        self.zoom = 1.0;
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Record the drawable area, in cells, for the next frame
    pub fn set_cells(&mut self, width: u16, height: u16) {
        self.cells = (f64::from(width.max(1)), f64::from(height.max(1)));
    }

    fn half_extent(&self) -> (f64, f64) {
        (
            self.cells.0 / (2.0 * self.zoom),
            self.cells.1 / (2.0 * self.zoom),
        )
    }

    pub fn x_bounds(&self) -> (f64, f64) {
        let (hw, _) = self.half_extent();
        (self.center.x - hw, self.center.x + hw)
    }

    /// Scene y range shown, top first
    pub fn y_bounds(&self) -> (f64, f64) {
        let (_, hh) = self.half_extent();
        (self.center.y - hh, self.center.y + hh)
    }

    /// Scene point under a cell offset from the top-left of the drawable area
    pub fn scene_point(&self, column: u16, row: u16) -> Point {
        let (left, _) = self.x_bounds();
        let (top, _) = self.y_bounds();
        Point::new(
            left + (f64::from(column) + 0.5) / self.zoom,
            top + (f64::from(row) + 0.5) / self.zoom,
        )
    }

    pub fn highlighted(&self) -> Option<Rect> {
        self.highlighted
    }
}

impl Viewport for Camera {
    fn center(&self) -> Point {
        self.center
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        self.center.x += dx / self.zoom;
        self.center.y += dy / self.zoom;
    }

    fn center_on(&mut self, point: Point) {
        self.center = point;
    }

    fn highlight(&mut self, rect: Option<Rect>) {
        self.highlighted = rect;
    }
}
