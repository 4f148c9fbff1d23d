use anyhow::{Context, Result};
use std::sync::Arc;
use tracelane_core::color::Hsv;
use tracelane_core::config::LayoutConfig;
use tracelane_core::layout::{Point, Rect, Renderer, Size, StrokeStyle};
use tracelane_core::{Event, JsonEventLog, Navigator, Scene, SceneStore, Step, Viewport};

/// Renderer that sizes labels one unit per character and line, and keeps
/// every call it receives.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub measured: Vec<String>,
    pub placed: Vec<(usize, Rect, Hsv)>,
    pub edges: Vec<(Point, Point)>,
    pub lines: Vec<(f64, StrokeStyle)>,
}

impl Renderer for RecordingRenderer {
    fn measure(&mut self, label: &str) -> Size {
        self.measured.push(label.to_string());
        let width = label.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        Size::new(width.max(1) as f64, label.lines().count().max(1) as f64)
    }

    fn place(&mut self, index: usize, rect: Rect, color: Hsv) {
        self.placed.push((index, rect, color));
    }

    fn draw_edge(&mut self, from: Point, to: Point) {
        self.edges.push((from, to));
    }

    fn draw_line(&mut self, x: f64, _top: f64, _bottom: f64, style: StrokeStyle) {
        self.lines.push((x, style));
    }
}

/// Viewport that only remembers where it was told to look
#[derive(Debug, Default)]
pub struct ScriptedView {
    pub center: Point,
    pub highlighted: Option<Rect>,
    pub pans: Vec<(f64, f64)>,
}

impl Viewport for ScriptedView {
    fn center(&self) -> Point {
        self.center
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        self.pans.push((dx, dy));
        self.center.x += dx;
        self.center.y += dy;
    }

    fn center_on(&mut self, point: Point) {
        self.center = point;
    }

    fn highlight(&mut self, rect: Option<Rect>) {
        self.highlighted = rect;
    }
}

pub const PAN_STEP: f64 = 5.0;

/// A loaded scene with a navigator and view wired to it
pub struct TestScene {
    store: SceneStore,
    config: LayoutConfig,
    pub scene: Arc<Scene>,
    pub renderer: RecordingRenderer,
    pub navigator: Navigator,
    pub view: ScriptedView,
}

impl TestScene {
    pub fn from_events(events: Vec<Event>) -> Self {
        let mut store = SceneStore::new();
        let config = LayoutConfig::default();
        let mut renderer = RecordingRenderer::default();
        let scene = store.replace(events, &mut renderer, &config);
        let mut navigator = Navigator::new(PAN_STEP);
        navigator.bind(&scene);

        Self {
            store,
            config,
            scene,
            renderer,
            navigator,
            view: ScriptedView::default(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut this = Self::from_events(Vec::new());
        this.reload(text)?;
        Ok(this)
    }

    /// Load a new log into the same store. The navigator is left bound to
    /// the previous scene so callers can observe how it resyncs.
    pub fn reload(&mut self, text: &str) -> Result<Arc<Scene>> {
        let mut renderer = RecordingRenderer::default();
        let scene = self
            .store
            .load(&JsonEventLog::from_text(text), &mut renderer, &self.config)
            .context("loading test log")?;
        self.scene = Arc::clone(&scene);
        self.renderer = renderer;
        Ok(scene)
    }

    pub fn current(&self) -> Option<Arc<Scene>> {
        self.store.current()
    }

    pub fn selected(&self) -> Option<usize> {
        self.navigator.selected()
    }

    pub fn select(&mut self, index: usize) -> Option<usize> {
        self.navigator.select(&self.scene, &mut self.view, index);
        self.selected()
    }

    pub fn step(&mut self, step: Step) -> Option<usize> {
        self.navigator.move_step(&self.scene, &mut self.view, step);
        self.selected()
    }

    pub fn parent(&mut self) -> Option<usize> {
        self.navigator.move_to_parent(&self.scene, &mut self.view);
        self.selected()
    }

    pub fn child(&mut self) -> Option<usize> {
        self.navigator
            .move_to_child_same_pid(&self.scene, &mut self.view);
        self.selected()
    }

    pub fn next_failure(&mut self) -> Option<usize> {
        self.navigator.next_failure(&self.scene, &mut self.view);
        self.selected()
    }
}
