use super::camera::Camera;
use ratatui::{
    layout::Rect as Area,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine, Rectangle},
        Block, Borders,
    },
    Frame,
};
use tracelane_core::color::Hsv;
use tracelane_core::layout::{Point, Rect, Renderer, Size, StrokeStyle};
use tracelane_core::Scene;

/// A node box as reported by the layout engine
#[derive(Debug, Clone)]
pub struct PlacedNode {
    pub index: usize,
    pub rect: Rect,
    pub color: Hsv,
}

#[derive(Debug, Clone)]
pub struct GuideLine {
    pub x: f64,
    pub top: f64,
    pub bottom: f64,
    pub style: StrokeStyle,
}

/// Everything the layout engine asked to draw, kept for redraws
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<(Point, Point)>,
    pub lines: Vec<GuideLine>,
}

/// Renderer measuring labels in terminal cells.
///
/// A label is as wide as its longest line and as tall as its line count,
/// plus one cell of border on every side.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    display: DisplayList,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_display(self) -> DisplayList {
        self.display
    }
}

impl Renderer for TerminalRenderer {
    fn measure(&mut self, label: &str) -> Size {
        let width = label.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let height = label.lines().count().max(1);
        Size::new(width as f64 + 2.0, height as f64 + 2.0)
    }

    fn place(&mut self, index: usize, rect: Rect, color: Hsv) {
        self.display.nodes.push(PlacedNode { index, rect, color });
    }

    fn draw_edge(&mut self, from: Point, to: Point) {
        self.display.edges.push((from, to));
    }

    fn draw_line(&mut self, x: f64, top: f64, bottom: f64, style: StrokeStyle) {
        self.display.lines.push(GuideLine {
            x,
            top,
            bottom,
            style,
        });
    }
}

pub fn to_color(hsv: Hsv) -> Color {
    let (r, g, b) = hsv.to_rgb();
    Color::Rgb(r, g, b)
}

/// Draw the lane view of a scene through the camera
pub fn render_scene(
    f: &mut Frame,
    area: Area,
    scene: &Scene,
    display: &DisplayList,
    camera: &Camera,
    selected: Option<usize>,
) {
    let (left, right) = camera.x_bounds();
    let (top, bottom) = camera.y_bounds();
    let forest = scene.forest();
    let bad: Vec<usize> = scene.layout().bad_nodes().iter().map(|n| n.index).collect();

    let title = format!(
        "🛤  Lanes [{} events, {} lanes, {} failures] zoom {:.2}",
        scene.len(),
        scene.layout().lane_count(),
        bad.len(),
        camera.zoom()
    );

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        // the canvas y axis points up, scene y points down
        .x_bounds([left, right])
        .y_bounds([-bottom, -top])
        .paint(|ctx| {
            for line in &display.lines {
                let color = match line.style {
                    StrokeStyle::Gridline => Color::DarkGray,
                    StrokeStyle::Divider => Color::Magenta,
                };
                ctx.draw(&CanvasLine {
                    x1: line.x,
                    y1: -line.top,
                    x2: line.x,
                    y2: -line.bottom,
                    color,
                });
            }

            for (from, to) in &display.edges {
                ctx.draw(&CanvasLine {
                    x1: from.x,
                    y1: -from.y,
                    x2: to.x,
                    y2: -to.y,
                    color: Color::Gray,
                });
            }

            ctx.layer();

            for node in &display.nodes {
                let is_selected = selected == Some(node.index);
                let is_bad = bad.contains(&node.index);
                let border = match (is_selected, is_bad) {
                    (true, _) => Color::Yellow,
                    (false, true) => Color::Red,
                    (false, false) => to_color(node.color),
                };
                draw_box(ctx, &node.rect, border);

                let mut style = Style::default().fg(to_color(node.color));
                if is_selected {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if let Some(graph_node) = forest.node(node.index) {
                    for (row, text) in graph_node.event.label().lines().enumerate() {
                        ctx.print(
                            node.rect.x + 1.0,
                            -(node.rect.y + 1.0 + row as f64),
                            Span::styled(text.to_string(), style),
                        );
                    }
                }
            }

            if let Some(rect) = camera.highlighted() {
                draw_box(ctx, &rect, Color::Yellow);
            }
        });

    f.render_widget(canvas, area);
}

fn draw_box(ctx: &mut Context<'_>, rect: &Rect, color: Color) {
    ctx.draw(&Rectangle {
        x: rect.x,
        y: -rect.bottom(),
        width: rect.width,
        height: rect.height,
        color,
    });
}
