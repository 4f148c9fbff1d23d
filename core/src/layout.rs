use crate::color::{color_for, Category, Hsv};
use crate::config::LayoutConfig;
use crate::error::LayoutFault;
use crate::event::{is_failing, Event};
use crate::tree::Forest;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis aligned box; `y` grows downwards so higher lanes have smaller `y`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.x + self.width, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStyle {
    Gridline,
    Divider,
}

/// Drawing surface the layout engine measures against and reports to
pub trait Renderer {
    /// Rendered footprint of a node label
    fn measure(&mut self, label: &str) -> Size;

    /// Final box and fill color for a node
    fn place(&mut self, index: usize, rect: Rect, color: Hsv);

    /// Connector from a child's top-left corner to its parent's top-right corner
    fn draw_edge(&mut self, _from: Point, _to: Point) {}

    fn draw_line(&mut self, _x: f64, _top: f64, _bottom: f64, _style: StrokeStyle) {}
}

/// Handle to a node of one particular scene build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub generation: u64,
    pub index: usize,
}

/// Positions and decorations computed for one forest
#[derive(Debug, Clone, Default)]
pub struct Layout {
    generation: u64,
    rects: Vec<Option<Rect>>,
    order: Vec<usize>,
    lanes: HashMap<u64, usize>,
    lane_height: f64,
    meta_y: f64,
    gridlines: Vec<f64>,
    dividers: Vec<f64>,
    bad_nodes: Vec<NodeRef>,
    fault: Option<LayoutFault>,
}

impl Layout {
    /// Traverse the forest smallest `event_index` first and assign every node
    /// an x slot and a lane.
    pub fn compute(
        forest: &Forest,
        renderer: &mut dyn Renderer,
        config: &LayoutConfig,
        generation: u64,
    ) -> Self {
        let margin = config.margin;
        let nodes = forest.nodes();
        let footprints: Vec<Size> = nodes
            .iter()
            .map(|node| renderer.measure(&node.event.label()))
            .collect();
        let tallest = footprints.iter().map(|s| s.height).fold(0.0, f64::max);
        let lane_height = config.min_lane_height.max(tallest) + 2.0 * margin;

        let mut layout = Layout {
            generation,
            rects: vec![None; nodes.len()],
            lane_height,
            meta_y: lane_height,
            ..Layout::default()
        };

        let mut queue = BinaryHeap::new();
        // The table's first entry is the first root
        if let Some(first) = nodes.first() {
            queue.push(Reverse((first.event_index, 0)));
        }

        let mut x_pos = margin;
        let mut last_index: Option<usize> = None;

        while let Some(Reverse((event_index, idx))) = queue.pop() {
            let expected = last_index.map_or(0, |last| last + 1);
            if event_index != expected {
                layout.fault = Some(LayoutFault::OutOfOrder {
                    expected,
                    found: event_index,
                });
                break;
            }

            let node = &nodes[idx];
            let size = footprints[idx];
            let failing = is_failing(&node.event);

            let (y, category) = match node.pid() {
                None => {
                    layout.gridlines.push(x_pos + size.width / 2.0);
                    let category = match &node.event {
                        Event::Config { .. } => Category::Config,
                        Event::Binary(_) => Category::Binary,
                        _ if failing => Category::Failure,
                        _ => Category::Meta,
                    };
                    (layout.meta_y, category)
                }
                Some(pid) => {
                    let next_lane = layout.lanes.len();
                    let lane = *layout.lanes.entry(pid).or_insert(next_lane);
                    let category = if failing {
                        Category::Failure
                    } else {
                        Category::Lane(lane)
                    };
                    (-(lane as f64) * lane_height, category)
                }
            };

            let rect = Rect::new(Point::new(x_pos, y), size);
            layout.rects[idx] = Some(rect);
            layout.order.push(idx);
            renderer.place(idx, rect, color_for(category));

            // Edges and failure targets belong to lane nodes only
            if node.pid().is_some() {
                if let Some(parent_rect) = node.parent.and_then(|p| layout.rect(p)) {
                    renderer.draw_edge(rect.top_left(), parent_rect.top_right());
                }
                if failing {
                    layout.bad_nodes.push(NodeRef {
                        generation,
                        index: idx,
                    });
                }
            }

            x_pos += size.width + margin;
            last_index = Some(event_index);
            for &child in &node.children {
                if let Some(child_node) = nodes.get(child) {
                    queue.push(Reverse((child_node.event_index, child)));
                }
            }
        }

        if layout.fault.is_none() && layout.order.len() < nodes.len() {
            layout.fault = Some(LayoutFault::Unreachable {
                visited: layout.order.len(),
                total: nodes.len(),
            });
        }

        for &marker in forest.markers() {
            let slot = if marker == nodes.len() && layout.fault.is_none() {
                Some(x_pos)
            } else {
                layout.rect(marker).map(|r| r.x)
            };
            if let Some(x) = slot {
                layout.dividers.push(x - margin / 2.0);
            }
        }

        let (top, bottom) = layout.vertical_extent();
        for &x in &layout.gridlines {
            renderer.draw_line(x, top, bottom, StrokeStyle::Gridline);
        }
        for &x in &layout.dividers {
            renderer.draw_line(x, top, bottom, StrokeStyle::Divider);
        }

        match &layout.fault {
            Some(fault) => tracing::error!(%fault, "layout aborted"),
            None => tracing::debug!(
                nodes = layout.order.len(),
                lanes = layout.lanes.len(),
                bad_nodes = layout.bad_nodes.len(),
                "layout complete"
            ),
        }

        layout
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn rect(&self, index: usize) -> Option<Rect> {
        self.rects.get(index).copied().flatten()
    }

    /// Table indices in the order the traversal placed them
    pub fn visit_order(&self) -> &[usize] {
        &self.order
    }

    pub fn lane_of(&self, pid: u64) -> Option<usize> {
        self.lanes.get(&pid).copied()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn lane_height(&self) -> f64 {
        self.lane_height
    }

    /// Top of the row pid-less nodes are placed on
    pub fn meta_row_y(&self) -> f64 {
        self.meta_y
    }

    pub fn gridlines(&self) -> &[f64] {
        &self.gridlines
    }

    pub fn dividers(&self) -> &[f64] {
        &self.dividers
    }

    pub fn bad_nodes(&self) -> &[NodeRef] {
        &self.bad_nodes
    }

    pub fn fault(&self) -> Option<&LayoutFault> {
        self.fault.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.fault.is_none()
    }

    /// From the top of the highest lane to the bottom of the meta row
    pub fn vertical_extent(&self) -> (f64, f64) {
        let top = -(self.lanes.len().saturating_sub(1) as f64) * self.lane_height;
        (top, self.meta_y + self.lane_height)
    }

    /// Box around every placed node
    pub fn bounds(&self) -> Option<Rect> {
        self.rects
            .iter()
            .flatten()
            .copied()
            .reduce(|acc, r| acc.union(&r))
    }

    /// Node whose box contains `point`
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.rects
            .iter()
            .position(|rect| rect.map_or(false, |r| r.contains(point)))
    }
}
