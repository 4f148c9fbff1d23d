use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use std::collections::HashSet;
use tracelane_core::event::Event;
use tracelane_core::tree::Forest;

// Deeper levels keep the indentation of this one
const MAX_INDENT_DEPTH: usize = 16;

/// One row of the forest listing
#[derive(Clone, Debug)]
pub struct TreeLine {
    pub index: usize,
    pub prefix: String,
    pub text: String,
    pub children_count: usize,
}

/// One-line description of an event for listings
pub fn short_label(event: &Event) -> String {
    match event {
        Event::Config { name } => format!("config {}", name),
        Event::Binary(bin) => format!("binary {}", bin.path),
        Event::Trace(trace) => {
            let mut text = match trace.pid {
                Some(pid) => format!("pid {}: {}", pid, trace.description),
                None => trace.description.clone(),
            };
            if let Some(signal) = trace.signal {
                text.push_str(&format!(" [{}]", signal));
            }
            if let Some(ret) = trace.return_code {
                text.push_str(&format!(" => {}", ret));
            }
            text
        }
        Event::Marker => "marker".to_string(),
    }
}

/// Flatten the forest depth first with box-drawing prefixes.
///
/// Uses an explicit stack because fallback chains nest one level per event.
pub fn build_tree(forest: &Forest) -> Vec<TreeLine> {
    struct Pending {
        index: usize,
        depth: usize,
        is_last: bool,
        parent_prefix: String,
    }

    let mut lines = Vec::with_capacity(forest.len());
    let roots = forest.roots();
    let mut stack: Vec<Pending> = roots
        .iter()
        .enumerate()
        .rev()
        .map(|(i, &index)| Pending {
            index,
            depth: 0,
            is_last: i == roots.len() - 1,
            parent_prefix: String::new(),
        })
        .collect();
    let mut seen = HashSet::new();

    while let Some(item) = stack.pop() {
        let Some(node) = forest.node(item.index) else {
            continue;
        };
        if !seen.insert(item.index) {
            continue;
        }

        let mut prefix = item.parent_prefix.clone();
        if item.depth > 0 {
            prefix.push_str(if item.is_last { "└── " } else { "├── " });
        }

        let child_prefix = if item.depth == 0 || item.depth >= MAX_INDENT_DEPTH {
            item.parent_prefix.clone()
        } else if item.is_last {
            format!("{}    ", item.parent_prefix)
        } else {
            format!("{}│   ", item.parent_prefix)
        };

        lines.push(TreeLine {
            index: item.index,
            prefix,
            text: short_label(&node.event),
            children_count: node.children.len(),
        });

        let count = node.children.len();
        for (i, &child) in node.children.iter().enumerate().rev() {
            stack.push(Pending {
                index: child,
                depth: item.depth + 1,
                is_last: i == count - 1,
                parent_prefix: child_prefix.clone(),
            });
        }
    }

    lines
}

pub fn format_line(line: &TreeLine) -> String {
    let children_indicator = if line.children_count > 1 {
        format!(" [{}]", line.children_count)
    } else {
        String::new()
    };
    format!(
        "{}#{} {}{}",
        line.prefix, line.index, line.text, children_indicator
    )
}

/// Render the tree view
pub fn render_tree_view(
    f: &mut Frame,
    area: Rect,
    lines: &[TreeLine],
    selected: Option<usize>,
    bad_nodes: &HashSet<usize>,
) {
    let items: Vec<ListItem> = lines
        .iter()
        .map(|line| {
            let is_selected = selected == Some(line.index);
            let is_bad = bad_nodes.contains(&line.index);

            let style = match (is_selected, is_bad) {
                (true, true) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                (true, false) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                (false, true) => Style::default().fg(Color::Red),
                (false, false) => Style::default(),
            };

            ListItem::new(format_line(line)).style(style)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title("🌳 Event Tree [ctrl+←/→]");

    let mut state = ListState::default();
    state.select(selected.and_then(|index| lines.iter().position(|l| l.index == index)));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut state);
}
