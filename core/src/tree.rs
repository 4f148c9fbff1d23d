use crate::event::{child_of, is_marker, is_terminal, pid_of, Event};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};

/// Node in the reconstructed execution forest
#[derive(Debug, Clone)]
pub struct Node {
    pub event_index: usize,
    pub event: Event,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl Node {
    pub fn pid(&self) -> Option<u64> {
        pid_of(&self.event)
    }
}

/// Node table plus the root set and marker positions of one event log.
///
/// Nodes live in a single table addressed by `event_index`; parent and
/// child links are indices into that table.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<Node>,
    roots: Vec<usize>,
    markers: Vec<usize>,
}

impl Forest {
    /// Rebuild the forest from an ordered event log.
    ///
    /// Markers consume no node; each one records how many nodes existed when
    /// it was seen. Traces attach to the most recent still-open node with the
    /// same pid, or to the node that forked their pid. Everything else hangs
    /// off the node directly before it.
    pub fn build<I>(events: I) -> Self
    where
        I: IntoIterator<Item = Event>,
    {
        let mut forest = Forest::default();

        for event in events {
            if is_marker(&event) {
                forest.markers.push(forest.nodes.len());
                continue;
            }

            let event_index = forest.nodes.len();
            let parent = forest
                .find_trace_parent(&event)
                .or_else(|| event_index.checked_sub(1));

            match parent {
                Some(parent_idx) => forest.nodes[parent_idx].children.push(event_index),
                None => forest.roots.push(event_index),
            }

            forest.nodes.push(Node {
                event_index,
                event,
                parent,
                children: Vec::new(),
            });
        }

        tracing::debug!(
            nodes = forest.nodes.len(),
            roots = forest.roots.len(),
            markers = forest.markers.len(),
            "built execution forest"
        );

        forest
    }

    /// Reverse scan for the most recent open call chain the event continues.
    fn find_trace_parent(&self, event: &Event) -> Option<usize> {
        let pid = event.as_trace()?.pid?;
        self.nodes
            .iter()
            .rev()
            .filter(|candidate| !is_terminal(&candidate.event))
            .find(|candidate| {
                pid_of(&candidate.event) == Some(pid) || child_of(&candidate.event) == Some(pid)
            })
            .map(|candidate| candidate.event_index)
    }

    /// Assemble a forest from prebuilt nodes without checking consistency.
    /// The layout engine reports any disorder this introduces.
    pub fn from_parts(nodes: Vec<Node>, markers: Vec<usize>) -> Self {
        let roots = nodes
            .iter()
            .filter(|n| n.parent.is_none())
            .map(|n| n.event_index)
            .collect();
        Self {
            nodes,
            roots,
            markers,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn markers(&self) -> &[usize] {
        &self.markers
    }

    /// Walk from a node's parent up to its root
    pub fn ancestors(&self, index: usize) -> Ancestors<'_> {
        Ancestors {
            forest: self,
            next: self.node(index).and_then(|n| n.parent),
            remaining: self.nodes.len(),
        }
    }

    pub fn depth(&self, index: usize) -> usize {
        self.ancestors(index).count()
    }

    /// Export the parent -> child edges as a petgraph graph whose node
    /// indices match the table indices.
    pub fn to_graph(&self) -> DiGraph<usize, ()> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.nodes.len());
        for node in &self.nodes {
            graph.add_node(node.event_index);
        }
        for node in &self.nodes {
            for &child in &node.children {
                if child < self.nodes.len() {
                    graph.add_edge(NodeIndex::new(node.event_index), NodeIndex::new(child), ());
                }
            }
        }
        graph
    }

    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.to_graph())
    }
}

pub struct Ancestors<'a> {
    forest: &'a Forest,
    next: Option<usize>,
    // Bounds the walk on hand-assembled tables that contain a cycle.
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let node = self.forest.node(self.next?)?;
        self.next = node.parent;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TraceEvent;

    fn trace(pid: u64, description: &str) -> TraceEvent {
        TraceEvent::new(description).with_pid(pid)
    }

    #[test]
    fn config_binary_trace_chain() {
        let forest = Forest::build(vec![
            Event::config("debug"),
            Event::binary("t1"),
            trace(1, "start").into(),
            trace(1, "end").with_return_code(1).into(),
        ]);

        assert_eq!(forest.len(), 4);
        assert_eq!(forest.roots(), &[0]);
        assert_eq!(forest.node(1).unwrap().parent, Some(0));
        assert_eq!(forest.node(2).unwrap().parent, Some(1));
        assert_eq!(forest.node(3).unwrap().parent, Some(2));
        assert_eq!(forest.node(2).unwrap().children, vec![3]);
    }

    #[test]
    fn child_pid_attaches_to_fork() {
        let forest = Forest::build(vec![
            Event::binary("t1"),
            trace(1, "fork").with_child(2).into(),
            trace(1, "wait").into(),
            trace(2, "child runs").into(),
        ]);

        // pid 1's wait is the newest open pid-1 node but does not name pid 2
        assert_eq!(forest.node(3).unwrap().parent, Some(1));
        assert_eq!(forest.node(2).unwrap().parent, Some(1));
    }

    #[test]
    fn terminal_nodes_do_not_accept_children() {
        let forest = Forest::build(vec![
            Event::binary("t1"),
            trace(7, "open").into(),
            trace(7, "exit").with_return_code(0).into(),
            trace(7, "reused").into(),
        ]);

        // node 2 returned, so the scan falls through to node 1
        assert_eq!(forest.node(3).unwrap().parent, Some(1));
    }

    #[test]
    fn interleaved_pids_pick_most_recent_match() {
        let forest = Forest::build(vec![
            trace(1, "a").into(),
            trace(2, "b").into(),
            trace(1, "c").into(),
            trace(2, "d").into(),
        ]);

        assert_eq!(forest.node(1).unwrap().parent, Some(0));
        assert_eq!(forest.node(2).unwrap().parent, Some(0));
        assert_eq!(forest.node(3).unwrap().parent, Some(1));
    }

    #[test]
    fn pidless_trace_uses_fallback_chain() {
        let forest = Forest::build(vec![trace(1, "a").into(), TraceEvent::new("no pid").into()]);
        assert_eq!(forest.node(1).unwrap().parent, Some(0));
    }

    #[test]
    fn markers_consume_no_index() {
        let forest = Forest::build(vec![
            Event::Marker,
            Event::config("debug"),
            Event::Marker,
            Event::binary("t1"),
            Event::Marker,
        ]);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest.markers(), &[0, 1, 2]);
        let indices: Vec<usize> = forest.nodes().iter().map(|n| n.event_index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        let forest = Forest::build(Vec::new());
        assert!(forest.is_empty());
        assert!(forest.roots().is_empty());
        assert!(!forest.has_cycles());
    }

    #[test]
    fn ancestors_walk_to_root() {
        let forest = Forest::build(vec![
            Event::config("debug"),
            Event::binary("t1"),
            trace(1, "start").into(),
        ]);

        let chain: Vec<usize> = forest.ancestors(2).map(|n| n.event_index).collect();
        assert_eq!(chain, vec![1, 0]);
        assert_eq!(forest.depth(0), 0);
        assert!(!forest.has_cycles());
    }

    #[test]
    fn hand_built_cycle_is_detected() {
        let nodes = vec![
            Node {
                event_index: 0,
                event: Event::config("a"),
                parent: Some(1),
                children: vec![1],
            },
            Node {
                event_index: 1,
                event: Event::config("b"),
                parent: Some(0),
                children: vec![0],
            },
        ];
        let forest = Forest::from_parts(nodes, Vec::new());
        assert!(forest.has_cycles());
        assert_eq!(forest.ancestors(0).count(), 2);
    }
}
