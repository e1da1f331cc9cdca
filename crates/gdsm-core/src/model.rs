//! The Global Document Structure Model
//!
//! Elements live once in `elements_by_id`; `elements_by_page` holds their IDs
//! per page in document order. Deleted elements are soft-deleted: they keep
//! their slot in both indices and only the query layer hides them.

use crate::classifier::detect_primary_type;
use crate::config::GdsmConfig;
use crate::text_index::{split_words, TextIndex};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use shared_types::{Element, Page, SemanticType, Stats};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone)]
pub struct Gdsm {
    pub(crate) document_id: String,
    pub(crate) version: u64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) last_modified_at: DateTime<Utc>,
    pub(crate) pages: Vec<Page>,
    pub(crate) elements_by_id: HashMap<String, Element>,
    pub(crate) elements_by_page: BTreeMap<u32, Vec<String>>,
    pub(crate) text_index: TextIndex,
    pub(crate) stats: Stats,
    pub(crate) config: GdsmConfig,
    pub(crate) next_comment_id: u64,
}

impl Gdsm {
    /// Assemble a model from materialized elements in document order.
    ///
    /// Builds the page index and text index and computes the initial stats.
    /// Page element counts are recomputed from `elements`.
    pub fn from_elements(
        document_id: impl Into<String>,
        mut pages: Vec<Page>,
        elements: Vec<Element>,
        config: GdsmConfig,
    ) -> Self {
        let now = Utc::now();
        let text_index = TextIndex::from_elements(&elements);

        let mut elements_by_page: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        let mut elements_by_id = HashMap::with_capacity(elements.len());
        for element in elements {
            elements_by_page
                .entry(element.page)
                .or_default()
                .push(element.id.clone());
            elements_by_id.insert(element.id.clone(), element);
        }

        for page_num in elements_by_page.keys() {
            if !pages.iter().any(|p| p.page_num == *page_num) {
                pages.push(Page {
                    page_num: *page_num,
                    width: 0.0,
                    height: 0.0,
                    element_count: 0,
                });
            }
        }
        pages.sort_by_key(|p| p.page_num);
        for page in &mut pages {
            page.element_count = elements_by_page
                .get(&page.page_num)
                .map(Vec::len)
                .unwrap_or(0);
        }

        let mut model = Self {
            document_id: document_id.into(),
            version: 0,
            created_at: now,
            last_modified_at: now,
            pages,
            elements_by_id,
            elements_by_page,
            text_index,
            stats: Stats::default(),
            config,
            next_comment_id: 1,
        };
        model.recompute_stats();
        model
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Incremented on every successful mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_modified_at(&self) -> DateTime<Utc> {
        self.last_modified_at
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn text_index(&self) -> &TextIndex {
        &self.text_index
    }

    pub fn config(&self) -> &GdsmConfig {
        &self.config
    }

    pub fn element_count(&self) -> usize {
        self.elements_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements_by_id.is_empty()
    }

    pub fn get_element(&self, id: &str) -> Option<&Element> {
        self.elements_by_id.get(id)
    }

    /// All elements on a page in document order, deleted ones included
    pub fn elements_on_page(&self, page: u32) -> Vec<&Element> {
        self.elements_by_page
            .get(&page)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.elements_by_id.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every element in document order (page, then position within page)
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.elements_by_page
            .values()
            .flatten()
            .filter_map(|id| self.elements_by_id.get(id))
    }

    /// Visible elements whose stored (or freshly detected) type matches
    pub fn find_by_semantic_type(&self, semantic_type: SemanticType) -> Vec<&Element> {
        self.elements()
            .filter(|e| e.is_visible())
            .filter(|e| effective_type(e) == Some(semantic_type))
            .collect()
    }

    /// Visible elements whose current text matches the pattern
    pub fn find_by_pattern(&self, pattern: &Regex) -> Vec<&Element> {
        self.elements()
            .filter(|e| e.is_visible() && pattern.is_match(&e.text))
            .collect()
    }

    /// Visible elements containing the fragment, case-insensitively.
    ///
    /// Bigram lookup narrows the candidates; each one is then checked by
    /// substring so bigram collisions ("ab" + "ba" vs "aba") never leak through.
    pub fn find_by_fragment(&self, fragment: &str) -> Vec<&Element> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        // Fragments with no two-character run carry no bigrams to look up
        let indexed = split_words(&needle)
            .iter()
            .any(|w| w.chars().count() >= 2);
        let candidates = self.text_index.search_partial(&needle);
        self.elements()
            .filter(|e| e.is_visible())
            .filter(|e| !indexed || candidates.contains(&e.id))
            .filter(|e| e.text.to_lowercase().contains(&needle))
            .collect()
    }

    /// Overview for prompting the agent layer
    pub fn summary(&self) -> DocumentSummary {
        let mut semantic_types = BTreeMap::new();
        for element in self.elements().filter(|e| e.is_visible()) {
            if let Some(t) = element.semantic_type {
                *semantic_types.entry(t).or_insert(0) += 1;
            }
        }

        DocumentSummary {
            document_id: self.document_id.clone(),
            version: self.version,
            page_count: self.pages.len(),
            stats: self.stats,
            semantic_types,
        }
    }

    /// Full recount; never maintained incrementally
    pub(crate) fn recompute_stats(&mut self) {
        self.stats = Stats::from_elements(self.elements_by_id.values());
    }
}

/// Stored semantic type, falling back to classifying the current text
pub(crate) fn effective_type(element: &Element) -> Option<SemanticType> {
    element
        .semantic_type
        .or_else(|| detect_primary_type(&element.text))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub version: u64,
    pub page_count: usize,
    pub stats: Stats,
    pub semantic_types: BTreeMap<SemanticType, usize>,
}

impl fmt::Display for DocumentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Document {} (v{}): {} pages, {} elements",
            self.document_id, self.version, self.page_count, self.stats.total
        )?;
        writeln!(
            f,
            "redacted={} highlighted={} modified={} commented={} deleted={}",
            self.stats.redacted,
            self.stats.highlighted,
            self.stats.modified,
            self.stats.commented,
            self.stats.deleted
        )?;
        if !self.semantic_types.is_empty() {
            let types: Vec<String> = self
                .semantic_types
                .iter()
                .map(|(t, n)| format!("{}={}", t, n))
                .collect();
            write!(f, "types: {}", types.join(" "))?;
        }
        Ok(())
    }
}
