//! Positioned-text tree produced by the conversion layer
//!
//! The tree is an arena: nodes live in one `Vec` and refer to each other by
//! index. The model builder only ever reads it (or writes assigned element IDs
//! back onto it) and never keeps references into it.

use crate::types::{BoundingBox, ElementState};
use serde::{Deserialize, Serialize};

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Page container; never text-bearing itself
    Page,
    /// Text run, line or block
    Text,
    /// Images, vector paths, wrappers without text semantics
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub kind: NodeKind,
    /// Full text content of the node, including text held by its descendants
    pub text: String,
    pub page: u32,
    /// Absolute position in the rendered document
    pub bounds: BoundingBox,
    /// Page-relative position, when the conversion layer already annotated it
    #[serde(default)]
    pub page_bounds: Option<BoundingBox>,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    /// Element ID written back by an earlier build
    #[serde(default)]
    pub element_id: Option<String>,
    /// State markers written back by the mutation layer
    #[serde(default)]
    pub markers: ElementState,
}

impl RenderNode {
    pub fn text(page: u32, text: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            kind: NodeKind::Text,
            text: text.into(),
            page,
            bounds,
            page_bounds: None,
            parent: None,
            children: Vec::new(),
            element_id: None,
            markers: ElementState::empty(),
        }
    }

    pub fn is_text_bearing(&self) -> bool {
        self.kind == NodeKind::Text
    }

    pub fn with_page_bounds(mut self, bounds: BoundingBox) -> Self {
        self.page_bounds = Some(bounds);
        self
    }

    pub fn with_markers(mut self, markers: ElementState) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_element_id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPage {
    pub page_num: u32,
    pub width: f64,
    pub height: f64,
    /// Absolute origin of the page in the rendered document
    pub origin_x: f64,
    pub origin_y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderTree {
    #[serde(default)]
    pub document_id: Option<String>,
    pub pages: Vec<RenderPage>,
    pub nodes: Vec<RenderNode>,
}

impl RenderTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    pub fn add_page(&mut self, page_num: u32, width: f64, height: f64, origin_x: f64, origin_y: f64) {
        self.pages.push(RenderPage {
            page_num,
            width,
            height,
            origin_x,
            origin_y,
        });
    }

    /// Append a node, linking it under `parent` when given
    pub fn add_node(&mut self, parent: Option<NodeId>, mut node: RenderNode) -> NodeId {
        let id = self.nodes.len();
        node.parent = parent;
        self.nodes.push(node);
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                parent_node.children.push(id);
            }
        }
        id
    }

    /// Shorthand for a text node with absolute bounds
    pub fn add_text(
        &mut self,
        parent: Option<NodeId>,
        page: u32,
        text: &str,
        bounds: BoundingBox,
    ) -> NodeId {
        self.add_node(parent, RenderNode::text(page, text, bounds))
    }

    pub fn node(&self, id: NodeId) -> Option<&RenderNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut RenderNode> {
        self.nodes.get_mut(id)
    }

    pub fn page(&self, page_num: u32) -> Option<&RenderPage> {
        self.pages.iter().find(|p| p.page_num == page_num)
    }

    /// Immediate children that carry text
    pub fn text_children(&self, id: NodeId) -> impl Iterator<Item = &RenderNode> + '_ {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |child| self.nodes.get(*child))
            .filter(|child| child.is_text_bearing())
    }

    /// Node IDs in document order: pre-order from each root, roots in arena order.
    ///
    /// Each node is emitted at most once. Deserialized trees may list a node
    /// under several parents, contain cycles or point past the arena; repeats
    /// and dangling indices are skipped.
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = Vec::new();

        for root in (0..self.nodes.len()).filter(|i| self.nodes[*i].parent.is_none()) {
            stack.push(root);
            while let Some(id) = stack.pop() {
                let Some(node) = self.nodes.get(id) else {
                    continue;
                };
                if std::mem::replace(&mut visited[id], true) {
                    continue;
                }
                order.push(id);
                // Reverse so the first child is visited first
                stack.extend(node.children.iter().rev().copied());
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bbox() -> BoundingBox {
        BoundingBox::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_add_node_links_parent_and_child() {
        let mut tree = RenderTree::new();
        let parent = tree.add_text(None, 1, "Hello World", bbox());
        let child = tree.add_text(Some(parent), 1, "Hello", bbox());

        assert_eq!(tree.node(parent).unwrap().children, vec![child]);
        assert_eq!(tree.node(child).unwrap().parent, Some(parent));
    }

    #[test]
    fn test_document_order_is_preorder() {
        let mut tree = RenderTree::new();
        let a = tree.add_text(None, 1, "a", bbox());
        let b = tree.add_text(None, 1, "b", bbox());
        // Inserted after `b` but belongs under `a`
        let a1 = tree.add_text(Some(a), 1, "a1", bbox());
        let a2 = tree.add_text(Some(a), 1, "a2", bbox());

        assert_eq!(tree.document_order(), vec![a, a1, a2, b]);
    }

    #[test]
    fn test_document_order_survives_malformed_links() {
        let mut tree = RenderTree::new();
        let root = tree.add_text(None, 1, "root", bbox());
        let child = tree.add_text(Some(root), 1, "child", bbox());
        let grandchild = tree.add_text(Some(child), 1, "grandchild", bbox());
        // Listed twice, a dangling index, and two back-edges forming cycles
        tree.nodes[root].children.extend([child, 99]);
        tree.nodes[child].children.push(root);
        tree.nodes[grandchild].children.push(child);

        assert_eq!(tree.document_order(), vec![root, child, grandchild]);
    }

    #[test]
    fn test_document_order_of_rootless_cycle_is_empty() {
        let json = r#"{
            "pages": [],
            "nodes": [
                {"kind": "text", "text": "a", "page": 1,
                 "bounds": {"x": 0.0, "y": 0.0, "width": 1.0, "height": 1.0},
                 "parent": 1, "children": [1]},
                {"kind": "text", "text": "b", "page": 1,
                 "bounds": {"x": 0.0, "y": 0.0, "width": 1.0, "height": 1.0},
                 "parent": 0, "children": [0]}
            ]
        }"#;
        let tree: RenderTree = serde_json::from_str(json).unwrap();
        assert!(tree.document_order().is_empty());
    }

    #[test]
    fn test_text_children_skip_non_text_nodes() {
        let mut tree = RenderTree::new();
        let parent = tree.add_text(None, 1, "caption", bbox());
        let mut image = RenderNode::text(1, "", bbox());
        image.kind = NodeKind::Other;
        tree.add_node(Some(parent), image);
        tree.add_text(Some(parent), 1, "caption", bbox());

        assert_eq!(tree.text_children(parent).count(), 1);
    }
}
