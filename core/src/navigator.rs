use crate::layout::{NodeRef, Point, Rect};
use crate::scene::Scene;

/// What the navigator needs from the view showing a scene
pub trait Viewport {
    /// Scene coordinate currently at the middle of the view
    fn center(&self) -> Point;

    /// Move the view by a scene-space offset
    fn pan(&mut self, dx: f64, dy: f64);

    fn center_on(&mut self, point: Point);

    /// Outline the given box, or drop the outline
    fn highlight(&mut self, rect: Option<Rect>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Back,
    Forward,
}

impl Step {
    fn sign(self) -> f64 {
        match self {
            Step::Back => -1.0,
            Step::Forward => 1.0,
        }
    }
}

/// Selection state over the nodes of the current scene.
///
/// Every operation takes the scene it should act on. When that scene is a
/// different build from the one the selection was made in, the selection and
/// the cached failure list are dropped before the operation runs.
#[derive(Debug, Clone)]
pub struct Navigator {
    selected: Option<usize>,
    generation: Option<u64>,
    failures: Vec<NodeRef>,
    pan_step: f64,
}

impl Navigator {
    pub fn new(pan_step: f64) -> Self {
        Self {
            selected: None,
            generation: None,
            failures: Vec::new(),
            pan_step,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Start navigating a freshly loaded scene
    pub fn bind(&mut self, scene: &Scene) {
        self.selected = None;
        self.generation = Some(scene.generation());
        self.failures = scene.layout().bad_nodes().to_vec();
    }

    fn sync(&mut self, scene: &Scene) {
        if self.generation != Some(scene.generation()) {
            self.bind(scene);
        }
    }

    pub fn select(&mut self, scene: &Scene, view: &mut dyn Viewport, index: usize) {
        self.sync(scene);
        if index < scene.len() {
            self.selected = Some(index);
            self.show(scene, view);
        }
    }

    pub fn deselect(&mut self, view: &mut dyn Viewport) {
        self.selected = None;
        view.highlight(None);
    }

    /// Outline a node without changing the selection
    pub fn highlight(&self, scene: &Scene, view: &mut dyn Viewport, index: usize) {
        view.highlight(scene.layout().rect(index));
    }

    /// Step to the neighbouring event, or pan when nothing is selected
    pub fn move_step(&mut self, scene: &Scene, view: &mut dyn Viewport, step: Step) {
        self.sync(scene);
        let Some(current) = self.selected else {
            view.pan(step.sign() * self.pan_step, 0.0);
            return;
        };

        let target = match step {
            Step::Back => current.checked_sub(1),
            Step::Forward => Some(current + 1).filter(|&next| next < scene.len()),
        };
        if let Some(target) = target {
            self.selected = Some(target);
            self.show(scene, view);
        }
    }

    pub fn move_to_parent(&mut self, scene: &Scene, view: &mut dyn Viewport) {
        self.sync(scene);
        let Some(current) = self.selected else {
            return;
        };
        self.selected = scene.forest().node(current).and_then(|node| node.parent);
        self.show(scene, view);
    }

    /// Descend into the child continuing this pid, else the earliest child
    pub fn move_to_child_same_pid(&mut self, scene: &Scene, view: &mut dyn Viewport) {
        self.sync(scene);
        let Some(current) = self.selected else {
            return;
        };
        let forest = scene.forest();
        self.selected = forest.node(current).and_then(|node| {
            let pid = node.pid();
            node.children
                .iter()
                .copied()
                .find(|&child| pid.is_some() && forest.node(child).and_then(|c| c.pid()) == pid)
                .or_else(|| node.children.iter().copied().min())
                .filter(|&child| child < scene.len())
        });
        self.show(scene, view);
    }

    /// Select the first failing node to the right of the view centre
    pub fn next_failure(&mut self, scene: &Scene, view: &mut dyn Viewport) {
        self.sync(scene);
        self.failures.retain(|node| scene.resolve(*node).is_some());

        let center_x = view.center().x;
        let layout = scene.layout();
        let next = self.failures.iter().find(|node| {
            layout
                .rect(node.index)
                .map_or(false, |rect| rect.x > center_x)
        });
        if let Some(node) = next {
            self.selected = Some(node.index);
            self.show(scene, view);
        }
    }

    fn show(&self, scene: &Scene, view: &mut dyn Viewport) {
        let rect = self.selected.and_then(|index| scene.layout().rect(index));
        if let Some(rect) = rect {
            view.center_on(rect.center());
        }
        view.highlight(rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Hsv;
    use crate::config::LayoutConfig;
    use crate::event::{Event, TraceEvent};
    use crate::layout::{Renderer, Size};
    use crate::scene::SceneStore;

    struct UnitRenderer;

    impl Renderer for UnitRenderer {
        fn measure(&mut self, _label: &str) -> Size {
            Size::new(4.0, 1.0)
        }

        fn place(&mut self, _index: usize, _rect: Rect, _color: Hsv) {}
    }

    #[derive(Default)]
    struct TestView {
        center: Point,
        highlighted: Option<Rect>,
        pans: Vec<(f64, f64)>,
    }

    impl Viewport for TestView {
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

    fn scene(events: Vec<Event>) -> std::sync::Arc<Scene> {
        SceneStore::new().replace(events, &mut UnitRenderer, &LayoutConfig::default())
    }

    fn forked() -> Vec<Event> {
        vec![
            Event::binary("t1"),
            TraceEvent::new("fork").with_pid(1).with_child(2).into(),
            TraceEvent::new("child").with_pid(2).into(),
            TraceEvent::new("wait").with_pid(1).into(),
            TraceEvent::new("exit").with_pid(2).with_return_code(1).into(),
            TraceEvent::new("exit").with_pid(1).with_return_code(0).into(),
        ]
    }

    #[test]
    fn step_pans_without_selection() {
        let scene = scene(forked());
        let mut nav = Navigator::new(5.0);
        let mut view = TestView::default();

        nav.move_step(&scene, &mut view, Step::Forward);
        nav.move_step(&scene, &mut view, Step::Back);
        assert_eq!(view.pans, vec![(5.0, 0.0), (-5.0, 0.0)]);
        assert_eq!(nav.selected(), None);
    }

    #[test]
    fn step_clamps_at_bounds() {
        let scene = scene(forked());
        let mut nav = Navigator::new(5.0);
        let mut view = TestView::default();

        nav.select(&scene, &mut view, 0);
        nav.move_step(&scene, &mut view, Step::Back);
        assert_eq!(nav.selected(), Some(0));

        nav.select(&scene, &mut view, 5);
        nav.move_step(&scene, &mut view, Step::Forward);
        assert_eq!(nav.selected(), Some(5));
        nav.move_step(&scene, &mut view, Step::Back);
        assert_eq!(nav.selected(), Some(4));
        assert_eq!(view.highlighted, scene.layout().rect(4));
    }

    #[test]
    fn select_out_of_range_is_ignored() {
        let scene = scene(forked());
        let mut nav = Navigator::new(5.0);
        let mut view = TestView::default();

        nav.select(&scene, &mut view, 99);
        assert_eq!(nav.selected(), None);
    }

    #[test]
    fn parent_and_child_moves() {
        let scene = scene(forked());
        let mut nav = Navigator::new(5.0);
        let mut view = TestView::default();

        // fork node has children [2, 3]; 3 shares pid 1
        nav.select(&scene, &mut view, 1);
        nav.move_to_child_same_pid(&scene, &mut view);
        assert_eq!(nav.selected(), Some(3));

        nav.move_to_parent(&scene, &mut view);
        assert_eq!(nav.selected(), Some(1));
        nav.move_to_parent(&scene, &mut view);
        assert_eq!(nav.selected(), Some(0));
        nav.move_to_parent(&scene, &mut view);
        assert_eq!(nav.selected(), None);
        assert_eq!(view.highlighted, None);
    }

    #[test]
    fn child_move_falls_back_to_smallest_child() {
        let scene = scene(forked());
        let mut nav = Navigator::new(5.0);
        let mut view = TestView::default();

        // the binary has no pid so its only trace child is taken
        nav.select(&scene, &mut view, 0);
        nav.move_to_child_same_pid(&scene, &mut view);
        assert_eq!(nav.selected(), Some(1));

        // a returned node has no children
        nav.select(&scene, &mut view, 5);
        nav.move_to_child_same_pid(&scene, &mut view);
        assert_eq!(nav.selected(), None);
    }

    #[test]
    fn next_failure_walks_right_then_stops() {
        let scene = scene(vec![
            TraceEvent::new("a").with_pid(1).with_return_code(1).into(),
            TraceEvent::new("b").with_pid(1).into(),
            TraceEvent::new("c").with_pid(2).with_return_code(3).into(),
        ]);
        let mut nav = Navigator::new(5.0);
        let mut view = TestView::default();
        nav.bind(&scene);

        nav.next_failure(&scene, &mut view);
        assert_eq!(nav.selected(), Some(0));
        nav.next_failure(&scene, &mut view);
        assert_eq!(nav.selected(), Some(2));
        nav.next_failure(&scene, &mut view);
        assert_eq!(nav.selected(), Some(2));
    }

    #[test]
    fn new_scene_drops_selection() {
        let mut store = SceneStore::new();
        let config = LayoutConfig::default();
        let first = store.replace(forked(), &mut UnitRenderer, &config);
        let mut nav = Navigator::new(5.0);
        let mut view = TestView::default();
        nav.select(&first, &mut view, 3);

        let second = store.replace(vec![Event::config("only")], &mut UnitRenderer, &config);
        nav.move_step(&second, &mut view, Step::Forward);
        assert_eq!(nav.selected(), None);
        nav.next_failure(&second, &mut view);
        assert_eq!(nav.selected(), None);
    }

    #[test]
    fn empty_scene_is_a_no_op() {
        let scene = scene(Vec::new());
        let mut nav = Navigator::new(5.0);
        let mut view = TestView::default();

        nav.select(&scene, &mut view, 0);
        nav.move_step(&scene, &mut view, Step::Forward);
        nav.move_to_parent(&scene, &mut view);
        nav.next_failure(&scene, &mut view);
        assert_eq!(nav.selected(), None);
    }
}
