//! Builds a [`Gdsm`] from the converted document's render tree
//!
//! The render tree is over-granular: a line node and the span nodes inside it
//! carry the same text. The coverage test keeps a node only when its children
//! don't already account for its text, so every piece of text ends up in
//! exactly one canonical element.

use crate::classifier::{classify, Classification};
use crate::config::GdsmConfig;
use crate::model::Gdsm;
use shared_types::{Element, ElementState, NodeId, Page, RenderTree};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use uuid::Uuid;

/// Collapse every whitespace run to one space and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format an element ID, e.g. `p2-el-7`
pub fn element_id(page: u32, n: u64) -> String {
    format!("p{}-el-{}", page, n)
}

/// Split `p<page>-el-<n>` into its page and sequence number
pub fn parse_element_id(id: &str) -> Option<(u32, u64)> {
    let (page, n) = id.strip_prefix('p')?.split_once("-el-")?;
    Some((page.parse().ok()?, n.parse().ok()?))
}

/// Coverage test for a single text-bearing node.
///
/// Only immediate text-bearing children are consulted, and only for their
/// text content, so the answer does not depend on whether those children
/// survive themselves.
pub fn is_redundant(tree: &RenderTree, node_id: NodeId) -> bool {
    let Some(node) = tree.node(node_id) else {
        return false;
    };

    let mut children = tree.text_children(node_id).peekable();
    if children.peek().is_none() {
        return false;
    }

    let covered: String = children.map(|child| child.text.as_str()).collect();
    normalize_whitespace(&node.text) == normalize_whitespace(&covered)
}

/// Text-bearing nodes that survive deduplication, in document order
pub fn canonical_nodes(tree: &RenderTree) -> Vec<NodeId> {
    tree.document_order()
        .into_iter()
        .filter(|id| tree.node(*id).is_some_and(|n| n.is_text_bearing()))
        .filter(|id| !is_redundant(tree, *id))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    config: GdsmConfig,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GdsmConfig) -> Self {
        Self { config }
    }

    /// Build a model without touching the tree
    pub fn build(&self, tree: &RenderTree) -> Gdsm {
        let planned = self.materialize(tree);
        self.assemble(tree, planned)
    }

    /// Build a model and write each element's ID back onto its node, so a
    /// later build of the same tree reproduces the same IDs
    pub fn build_and_annotate(&self, tree: &mut RenderTree) -> Gdsm {
        let planned = self.materialize(tree);
        for (node_id, element) in &planned {
            if let Some(node) = tree.node_mut(*node_id) {
                node.element_id = Some(element.id.clone());
            }
        }
        self.assemble(tree, planned)
    }

    fn materialize(&self, tree: &RenderTree) -> Vec<(NodeId, Element)> {
        let survivors = canonical_nodes(tree);
        let candidate_count = tree.nodes.iter().filter(|n| n.is_text_bearing()).count();

        let mut next_n = first_free_numbers(tree);
        let mut taken: HashSet<String> = HashSet::new();
        let mut planned = Vec::with_capacity(survivors.len());
        let mut skipped_empty = 0usize;

        for node_id in survivors {
            let Some(node) = tree.node(node_id) else {
                continue;
            };

            let markers = node.markers;
            let text = if markers.intersects(ElementState::REDACTED | ElementState::DELETED) {
                String::new()
            } else {
                normalize_whitespace(&node.text)
            };

            if text.is_empty() && markers.is_empty() {
                skipped_empty += 1;
                continue;
            }

            let reusable = node.element_id.as_ref().filter(|id| {
                !taken.contains(*id)
                    && parse_element_id(id).map(|(page, _)| page) == Some(node.page)
            });
            let id = match reusable {
                Some(existing) => existing.clone(),
                None => {
                    let n = next_n.entry(node.page).or_insert(0);
                    let id = element_id(node.page, *n);
                    *n += 1;
                    id
                }
            };
            taken.insert(id.clone());

            let bbox = node.page_bounds.unwrap_or_else(|| match tree.page(node.page) {
                Some(page) => node.bounds.relative_to(page.origin_x, page.origin_y),
                None => node.bounds,
            });

            let Classification {
                semantic_type,
                entities,
            } = if text.is_empty() {
                Classification::default()
            } else {
                classify(&text)
            };

            let mut element = Element::new(id, node.page, text, bbox);
            element.state = markers;
            element.semantic_type = semantic_type;
            element.entities = entities;
            planned.push((node_id, element));
        }

        debug!(
            candidates = candidate_count,
            kept = planned.len(),
            skipped_empty,
            "Deduplicated render tree"
        );

        planned
    }

    fn assemble(&self, tree: &RenderTree, planned: Vec<(NodeId, Element)>) -> Gdsm {
        let document_id = tree.document_id.clone().unwrap_or_else(|| {
            format!("{}-{}", self.config.document_id_prefix, Uuid::new_v4())
        });

        let pages: Vec<Page> = tree
            .pages
            .iter()
            .map(|p| Page {
                page_num: p.page_num,
                width: p.width,
                height: p.height,
                element_count: 0,
            })
            .collect();

        let elements: Vec<Element> = planned.into_iter().map(|(_, element)| element).collect();
        let gdsm = Gdsm::from_elements(document_id, pages, elements, self.config.clone());

        info!(
            document_id = %gdsm.document_id(),
            pages = gdsm.pages().len(),
            elements = gdsm.element_count(),
            "Built document model"
        );

        gdsm
    }
}

/// Per page, the first sequence number not used by any ID already on the tree
fn first_free_numbers(tree: &RenderTree) -> HashMap<u32, u64> {
    let mut next = HashMap::new();
    for (page, n) in tree
        .nodes
        .iter()
        .filter_map(|node| node.element_id.as_deref())
        .filter_map(parse_element_id)
    {
        let slot = next.entry(page).or_insert(0);
        *slot = (*slot).max(n + 1);
    }
    next
}

/// Build with the default configuration
pub fn build(tree: &RenderTree) -> Gdsm {
    ModelBuilder::new().build(tree)
}
