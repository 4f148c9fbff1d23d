pub mod camera;
pub mod canvas;
pub mod keys;
pub mod tree_view;

use anyhow::Result;
use camera::Camera;
use canvas::{DisplayList, TerminalRenderer};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use keys::Command;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use tracelane_core::{Config, JsonEventLog, Navigator, Scene, SceneStore, Viewport};
use tree_view::TreeLine;

pub struct App {
    config: Config,
    source: JsonEventLog,
    store: SceneStore,
    scene: Option<Arc<Scene>>,
    display: DisplayList,
    tree_lines: Vec<TreeLine>,
    bad_nodes: HashSet<usize>,
    navigator: Navigator,
    camera: Camera,
    status_message: String,
    show_help: bool,
    show_tree: bool,
    // Inner area of the lane canvas from the last frame, for mouse hits
    canvas_area: Rect,
}

impl App {
    pub fn new(config: Config, source: JsonEventLog) -> Self {
        let navigator = Navigator::new(config.viewer.pan_step);
        let show_tree = config.viewer.show_tree;
        Self {
            config,
            source,
            store: SceneStore::new(),
            scene: None,
            display: DisplayList::default(),
            tree_lines: Vec::new(),
            bad_nodes: HashSet::new(),
            navigator,
            camera: Camera::default(),
            status_message: "No event log loaded".to_string(),
            show_help: false,
            show_tree,
            canvas_area: Rect::default(),
        }
    }

    /// Read the event log again and swap in the new scene. On failure the
    /// previous scene stays on screen.
    pub fn reload(&mut self) {
        let mut renderer = TerminalRenderer::new();
        match self
            .store
            .load(&self.source, &mut renderer, &self.config.layout)
        {
            Ok(scene) => {
                self.display = renderer.into_display();
                self.tree_lines = tree_view::build_tree(scene.forest());
                self.bad_nodes = scene
                    .layout()
                    .bad_nodes()
                    .iter()
                    .map(|node| node.index)
                    .collect();
                self.navigator.bind(&scene);
                self.camera.frame(scene.layout().bounds());

                let summary = scene.summary();
                self.status_message = match &summary.fault {
                    Some(fault) => format!("⚠️  Layout fault: {}", fault),
                    None => format!(
                        "Loaded {} events | {} lanes | {} failures | {} markers",
                        summary.nodes, summary.lanes, summary.failures, summary.markers
                    ),
                };
                tracing::info!(
                    generation = scene.generation(),
                    nodes = summary.nodes,
                    "scene loaded"
                );
                self.scene = Some(scene);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load event log");
                self.status_message = format!("❌ Failed to load: {}", e);
            }
        }
    }

    pub fn scene(&self) -> Option<&Arc<Scene>> {
        self.scene.as_ref()
    }

    pub fn selected(&self) -> Option<usize> {
        self.navigator.selected()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn status(&self) -> &str {
        &self.status_message
    }

    /// Apply a viewer command; returns false when the viewer should exit
    pub fn apply(&mut self, command: Command) -> bool {
        let step = self.config.viewer.pan_step;
        match command {
            Command::Quit => return false,
            Command::ToggleHelp => self.show_help = !self.show_help,
            Command::ToggleTree => self.show_tree = !self.show_tree,
            Command::Reload => self.reload(),
            Command::ResetView => self.camera.reset(),
            Command::PanUp => self.camera.pan(0.0, -step),
            Command::PanDown => self.camera.pan(0.0, step),
            Command::ZoomIn => self.camera.zoom_by(self.config.viewer.zoom_in),
            Command::ZoomOut => self.camera.zoom_by(self.config.viewer.zoom_out),
            Command::Deselect => self.navigator.deselect(&mut self.camera),
            Command::Step(direction) => self.with_scene(|nav, scene, cam| {
                nav.move_step(scene, cam, direction)
            }),
            Command::Parent => {
                self.with_scene(|nav, scene, cam| nav.move_to_parent(scene, cam))
            }
            Command::ChildSamePid => {
                self.with_scene(|nav, scene, cam| nav.move_to_child_same_pid(scene, cam))
            }
            Command::NextFailure => {
                self.with_scene(|nav, scene, cam| nav.next_failure(scene, cam))
            }
        }
        true
    }

    fn with_scene<F>(&mut self, action: F)
    where
        F: FnOnce(&mut Navigator, &Scene, &mut Camera),
    {
        if let Some(scene) = &self.scene {
            action(&mut self.navigator, scene, &mut self.camera);
        }
    }

    /// Scene node drawn under a terminal cell
    fn node_at(&self, scene: &Scene, column: u16, row: u16) -> Option<usize> {
        let area = self.canvas_area;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        if !inside {
            return None;
        }
        let point = self.camera.scene_point(column - area.x, row - area.y);
        scene.layout().hit_test(point)
    }

    /// Select whatever is drawn under a terminal cell
    pub fn click(&mut self, column: u16, row: u16) {
        let Some(scene) = self.scene.clone() else {
            return;
        };
        match self.node_at(&scene, column, row) {
            Some(index) => self.navigator.select(&scene, &mut self.camera, index),
            None => self.navigator.deselect(&mut self.camera),
        }
    }

    /// Outline the node under the pointer while nothing is selected
    pub fn hover(&mut self, column: u16, row: u16) {
        if self.navigator.selected().is_some() {
            return;
        }
        let Some(scene) = self.scene.clone() else {
            return;
        };
        match self.node_at(&scene, column, row) {
            Some(index) => self.navigator.highlight(&scene, &mut self.camera, index),
            None => self.camera.highlight(None),
        }
    }

    fn selection_detail(&self) -> String {
        let Some(scene) = &self.scene else {
            return String::new();
        };
        let Some(node) = self
            .navigator
            .selected()
            .and_then(|index| scene.forest().node(index))
        else {
            return "←/→ pan, click or f to select".to_string();
        };

        let parent = node
            .parent
            .map_or_else(|| "-".to_string(), |p| format!("#{}", p));
        let lane = node
            .pid()
            .and_then(|pid| scene.layout().lane_of(pid))
            .map_or_else(|| "meta".to_string(), |lane| lane.to_string());
        format!(
            "#{} {} | parent {} | lane {} | {}",
            node.event_index,
            node.event.kind_name(),
            parent,
            lane,
            tree_view::short_label(&node.event)
        )
    }
}

pub fn launch_tui(config: Config, source: JsonEventLog) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, source);
    app.reload();

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if app.show_help {
                    // When help is showing, only allow closing it
                    if matches!(
                        keys::command_for(key),
                        Some(Command::ToggleHelp | Command::Deselect)
                    ) {
                        app.show_help = false;
                    }
                    continue;
                }
                if let Some(command) = keys::command_for(key) {
                    if !app.apply(command) {
                        return Ok(());
                    }
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(_button) => app.click(mouse.column, mouse.row),
                MouseEventKind::Moved => app.hover(mouse.column, mouse.row),
                MouseEventKind::ScrollDown => {
                    app.apply(Command::ZoomOut);
                }
                MouseEventKind::ScrollUp => {
                    app.apply(Command::ZoomIn);
                }
                _ => {}
            },
            _ => {}
        }
    }
}

fn render_help_modal(f: &mut Frame) {
    let area = f.size();
    let modal_area = Rect {
        x: area.width / 6,
        y: area.height / 6,
        width: area.width * 2 / 3,
        height: area.height * 2 / 3,
    };

    let help_content = "\
Navigation
  ←/→          step selection, or pan when nothing is selected
  ctrl+←       jump to parent
  ctrl+→       jump to child (same pid first)
  ↑/↓          pan vertically
  f            next failure right of centre
  esc          clear selection
  click        select node under cursor

View
  +/-          zoom in/out (mouse wheel too)
  r            reset view
  t            toggle event tree
  l            reload event log

  ?            toggle help
  q            quit";

    f.render_widget(Clear, modal_area);

    let help_widget = Paragraph::new(help_content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("📖 Help")
                .style(Style::default().bg(Color::Black).fg(Color::Cyan)),
        )
        .style(Style::default().bg(Color::Black).fg(Color::White))
        .wrap(Wrap { trim: false });

    f.render_widget(help_widget, modal_area);
}

fn ui(f: &mut Frame, app: &mut App) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(size);

    let source_name = app
        .source
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string());
    let header = Paragraph::new(format!("🔎 Tracelane | {} | {}", source_name, app.status_message))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let main_chunks = if app.show_tree {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(chunks[1])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(chunks[1])
    };
    let canvas_chunk = main_chunks[main_chunks.len() - 1];

    // Borders take one cell on each side
    app.canvas_area = Rect {
        x: canvas_chunk.x + 1,
        y: canvas_chunk.y + 1,
        width: canvas_chunk.width.saturating_sub(2),
        height: canvas_chunk.height.saturating_sub(2),
    };
    app.camera
        .set_cells(app.canvas_area.width, app.canvas_area.height);

    match &app.scene {
        Some(scene) => {
            if app.show_tree {
                tree_view::render_tree_view(
                    f,
                    main_chunks[0],
                    &app.tree_lines,
                    app.navigator.selected(),
                    &app.bad_nodes,
                );
            }
            canvas::render_scene(
                f,
                canvas_chunk,
                scene,
                &app.display,
                &app.camera,
                app.navigator.selected(),
            );
        }
        None => {
            let empty = Paragraph::new("No scene loaded. Press 'l' to retry, 'q' to quit.")
                .block(Block::default().borders(Borders::ALL).title("🛤  Lanes"));
            f.render_widget(empty, chunks[1]);
        }
    }

    let footer = Paragraph::new(app.selection_detail())
        .block(Block::default().borders(Borders::ALL).title("Selection [? help]"));
    f.render_widget(footer, chunks[2]);

    if app.show_help {
        render_help_modal(f);
    }
}
