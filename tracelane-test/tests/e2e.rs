use anyhow::Result;
use tracelane::tui::{canvas::TerminalRenderer, keys::Command, tree_view, App};
use tracelane_core::color::{color_for, Category};
use tracelane_core::config::LayoutConfig;
use tracelane_core::layout::{Layout, StrokeStyle};
use tracelane_core::tree::{Forest, Node};
use tracelane_core::{Config, Event, JsonEventLog, LayoutFault, SceneStore, Step, Viewport};
use tracelane_test::fixtures::{
    fork_fixture, pid_reuse_events, single_chain_fixture, two_binaries_fixture, LogFixture,
};
use tracelane_test::harness::{TestScene, PAN_STEP};

fn parents(test: &TestScene) -> Vec<Option<usize>> {
    test.scene.forest().nodes().iter().map(|n| n.parent).collect()
}

fn check_fixture(fixture: &LogFixture) -> Result<TestScene> {
    let test = TestScene::from_json(&fixture.text())?;
    let summary = test.scene.summary();

    assert_eq!(summary.nodes, fixture.expected_nodes);
    assert_eq!(summary.lanes, fixture.expected_lanes);
    assert_eq!(summary.failures, fixture.expected_failures);
    assert_eq!(summary.fault, None);
    assert_eq!(parents(&test), fixture.expected_parents);
    Ok(test)
}

#[test]
fn single_chain_log() -> Result<()> {
    let test = check_fixture(&single_chain_fixture())?;
    let layout = test.scene.layout();

    assert_eq!(layout.lane_of(1), Some(0));
    assert_eq!(layout.bad_nodes()[0].index, 3);
    assert_eq!(test.renderer.placed[3].2, color_for(Category::Failure));
    assert_eq!(test.renderer.placed[2].2, color_for(Category::Lane(0)));

    // config and binary sit on the meta row, each with a gridline
    assert_eq!(layout.rect(0).map(|r| r.y), Some(layout.meta_row_y()));
    assert_eq!(layout.gridlines().len(), 2);
    Ok(())
}

#[test]
fn fork_log_resolves_child_to_fork() -> Result<()> {
    let test = check_fixture(&fork_fixture())?;
    let scene = &test.scene;
    let layout = scene.layout();

    assert_eq!(scene.forest().node(1).map(|n| n.children.clone()), Some(vec![2, 4]));
    assert_eq!(layout.lane_of(1), Some(0));
    assert_eq!(layout.lane_of(2), Some(1));
    assert_eq!(layout.rect(2).map(|r| r.y), Some(-layout.lane_height()));

    // binary path is reduced to its file name without a project root
    assert_eq!(test.renderer.measured[0], "forker-1f2e");
    assert!(test.renderer.measured[3].contains("SIGSEGV"));
    assert!(test.renderer.measured[3].contains("addr: 0xbeef"));

    // every trace links to a placed parent
    assert_eq!(test.renderer.edges.len(), 5);

    let dividers: Vec<f64> = test
        .renderer
        .lines
        .iter()
        .filter(|(_, style)| *style == StrokeStyle::Divider)
        .map(|(x, _)| *x)
        .collect();
    let marker_x = layout.rect(4).map(|r| r.x - LayoutConfig::default().margin / 2.0);
    assert_eq!(dividers.first().copied(), marker_x);
    Ok(())
}

#[test]
fn markers_and_unknown_tags() -> Result<()> {
    let test = check_fixture(&two_binaries_fixture())?;
    let forest = test.scene.forest();

    assert_eq!(forest.markers(), &[4]);
    assert_eq!(test.scene.layout().dividers().len(), 1);
    assert!(matches!(forest.node(4).map(|n| &n.event), Some(Event::Binary(b)) if b.should_panic));
    Ok(())
}

#[test]
fn pid_reuse_follows_open_chain() {
    let test = TestScene::from_events(pid_reuse_events());

    // the exited call is skipped, the earlier open one is continued
    assert_eq!(parents(&test), vec![None, Some(0), Some(1), Some(1), Some(3)]);
    assert_eq!(test.scene.layout().lane_count(), 1);
    assert_eq!(test.scene.summary().failures, 1);
}

#[test]
fn navigation_over_fork() -> Result<()> {
    let mut test = TestScene::from_json(&fork_fixture().text())?;

    assert_eq!(test.next_failure(), Some(3));
    assert_eq!(test.view.highlighted, test.scene.layout().rect(3));
    assert_eq!(test.parent(), Some(2));
    assert_eq!(test.parent(), Some(1));
    assert_eq!(test.child(), Some(4));
    assert_eq!(test.step(Step::Forward), Some(5));
    assert_eq!(test.step(Step::Forward), Some(5));
    assert_eq!(test.parent(), Some(4));

    // no failure right of the last node
    assert_eq!(test.next_failure(), Some(4));
    Ok(())
}

#[test]
fn reload_resets_navigation() -> Result<()> {
    let mut test = TestScene::from_json(&fork_fixture().text())?;
    test.select(2);
    let first = test.scene.generation();

    test.reload(&two_binaries_fixture().text())?;
    assert!(test.scene.generation() > first);

    // selection from the old build is dropped, so the step pans instead
    assert_eq!(test.step(Step::Forward), None);
    assert_eq!(test.view.pans.last(), Some(&(PAN_STEP, 0.0)));
    Ok(())
}

#[test]
fn failed_reload_keeps_previous_scene() -> Result<()> {
    let mut test = TestScene::from_json(&fork_fixture().text())?;
    let generation = test.scene.generation();

    assert!(test.reload("{\"events\": [").is_err());
    assert!(test.reload("{\"frames\": []}").is_err());
    assert_eq!(test.current().map(|s| s.generation()), Some(generation));
    Ok(())
}

#[test]
fn inconsistent_table_faults() {
    let nodes = vec![
        Node {
            event_index: 0,
            event: Event::config("a"),
            parent: None,
            children: vec![2],
        },
        Node {
            event_index: 1,
            event: Event::config("b"),
            parent: Some(2),
            children: vec![],
        },
        Node {
            event_index: 2,
            event: Event::config("c"),
            parent: Some(0),
            children: vec![1],
        },
    ];
    let forest = Forest::from_parts(nodes, Vec::new());
    let mut renderer = TerminalRenderer::new();
    let layout = Layout::compute(&forest, &mut renderer, &LayoutConfig::default(), 7);

    assert_eq!(
        layout.fault(),
        Some(&LayoutFault::OutOfOrder {
            expected: 1,
            found: 2
        })
    );
    assert_eq!(layout.visit_order(), &[0]);
    assert_eq!(renderer.into_display().nodes.len(), 1);
}

#[test]
fn terminal_scene_and_tree_listing() -> Result<()> {
    let source = JsonEventLog::from_text(fork_fixture().text());
    let mut renderer = TerminalRenderer::new();
    let scene = SceneStore::new().load(&source, &mut renderer, &LayoutConfig::default())?;
    let display = renderer.into_display();

    assert_eq!(display.nodes.len(), scene.len());
    let lines: Vec<String> = tree_view::build_tree(scene.forest())
        .iter()
        .map(tree_view::format_line)
        .collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "#0 binary forker-1f2e");
    assert!(lines[1].ends_with("fork [2]"));
    Ok(())
}

#[test]
fn viewer_app_drives_scene() {
    let mut app = App::new(Config::default(), JsonEventLog::from_text(fork_fixture().text()));
    app.reload();
    assert_eq!(app.status(), "Loaded 6 events | 2 lanes | 1 failures | 1 markers");

    let start = app.camera().center();
    assert!(app.apply(Command::Step(Step::Forward)));
    assert_eq!(app.selected(), None);
    assert_eq!(app.camera().center().x, start.x + Config::default().viewer.pan_step);

    assert!(app.apply(Command::ZoomOut));
    assert_eq!(app.camera().zoom(), 0.75);
    assert!(!app.apply(Command::Quit));
}
