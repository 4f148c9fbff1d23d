use crate::config::LayoutConfig;
use crate::error::LoadResult;
use crate::event::Event;
use crate::layout::{Layout, NodeRef, Renderer};
use crate::source::EventSource;
use crate::tree::{Forest, Node};
use serde::Serialize;
use std::sync::Arc;

/// One loaded event log: its forest and the layout computed for it.
/// Never mutated after construction; a reload produces a new scene.
#[derive(Debug)]
pub struct Scene {
    generation: u64,
    forest: Forest,
    layout: Layout,
}

impl Scene {
    pub fn build<I>(
        events: I,
        renderer: &mut dyn Renderer,
        config: &LayoutConfig,
        generation: u64,
    ) -> Self
    where
        I: IntoIterator<Item = Event>,
    {
        let forest = Forest::build(events);
        let layout = Layout::compute(&forest, renderer, config, generation);
        Self {
            generation,
            forest,
            layout,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.forest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// Resolve a handle, ignoring handles from other builds
    pub fn resolve(&self, node: NodeRef) -> Option<&Node> {
        if node.generation != self.generation {
            return None;
        }
        self.forest.node(node.index)
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            nodes: self.forest.len(),
            roots: self.forest.roots().len(),
            lanes: self.layout.lane_count(),
            markers: self.forest.markers().len(),
            failures: self.layout.bad_nodes().len(),
            fault: self.layout.fault().map(|f| f.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    pub nodes: usize,
    pub roots: usize,
    pub lanes: usize,
    pub markers: usize,
    pub failures: usize,
    pub fault: Option<String>,
}

/// Holds the current scene and swaps in a freshly built one on each load
#[derive(Debug, Default)]
pub struct SceneStore {
    current: Option<Arc<Scene>>,
    next_generation: u64,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Scene>> {
        self.current.clone()
    }

    /// Build a scene from already parsed events and make it current
    pub fn replace<I>(
        &mut self,
        events: I,
        renderer: &mut dyn Renderer,
        config: &LayoutConfig,
    ) -> Arc<Scene>
    where
        I: IntoIterator<Item = Event>,
    {
        self.next_generation += 1;
        let scene = Arc::new(Scene::build(events, renderer, config, self.next_generation));
        self.current = Some(Arc::clone(&scene));
        scene
    }

    /// Read the source and swap in the new scene. A source that fails to
    /// load leaves the current scene untouched.
    pub fn load(
        &mut self,
        source: &dyn EventSource,
        renderer: &mut dyn Renderer,
        config: &LayoutConfig,
    ) -> LoadResult<Arc<Scene>> {
        let events = source.events()?;
        Ok(self.replace(events, renderer, config))
    }
}
