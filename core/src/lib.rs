pub mod color;
pub mod config;
pub mod error;
pub mod event;
pub mod layout;
pub mod navigator;
pub mod scene;
pub mod source;
pub mod tree;

pub use config::Config;
pub use error::{LayoutFault, LoadError};
pub use event::{Event, Signal, TraceEvent};
pub use layout::{Layout, Renderer};
pub use navigator::{Navigator, Step, Viewport};
pub use scene::{Scene, SceneStore};
pub use source::{EventSource, JsonEventLog};
pub use tree::Forest;
