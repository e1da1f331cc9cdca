pub mod render_tree;
pub mod types;

pub use render_tree::{NodeId, NodeKind, RenderNode, RenderPage, RenderTree};
pub use types::{
    BoundingBox, Comment, Element, ElementState, Page, SemanticType, Stats,
    UnknownSemanticType,
};
