mod component;
mod render;
pub mod scale;
mod simulation;
mod state;

pub use component::KnowledgeGraphCanvas;
pub use simulation::{LayoutParameters, LayoutPoint, Simulation};
pub use state::{DragState, KnowledgeGraphState, PanState, ViewTransform};
