//! Tiered queries over a document model
//!
//! Filters run cheapest first so expensive ones see as few candidates as
//! possible:
//!
//! 1. page (per-page index)
//! 2. state flags (deleted elements are always dropped)
//! 3. exact word (text index, then re-verified per candidate)
//! 4. regex pattern (linear scan)
//! 5. semantic type (stored classification, else re-classified)
//! 6. free-text semantic query (not resolved here; emits a digest for an LLM)
//! 7. limit
//!
//! The scanner never makes fuzzy or semantic judgments itself.

use crate::model::{effective_type, Gdsm};
use crate::text_index::{contains_exact_word, split_words, MIN_WORD_LEN};
use regex::Regex;
use serde::{Deserialize, Serialize};
use shared_types::{Element, SemanticType};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanQuery {
    pub page: Option<u32>,
    pub exclude_redacted: bool,
    pub only_highlighted: bool,
    pub exact_word: Option<String>,
    pub pattern: Option<String>,
    pub semantic_type: Option<SemanticType>,
    pub semantic_query: Option<String>,
    pub limit: Option<usize>,
}

impl Default for ScanQuery {
    fn default() -> Self {
        Self {
            page: None,
            exclude_redacted: true,
            only_highlighted: false,
            exact_word: None,
            pattern: None,
            semantic_type: None,
            semantic_query: None,
            limit: None,
        }
    }
}

impl ScanQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn include_redacted(mut self) -> Self {
        self.exclude_redacted = false;
        self
    }

    pub fn only_highlighted(mut self) -> Self {
        self.only_highlighted = true;
        self
    }

    pub fn with_word(mut self, word: &str) -> Self {
        self.exact_word = Some(word.to_string());
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn with_semantic_type(mut self, semantic_type: SemanticType) -> Self {
        self.semantic_type = Some(semantic_type);
        self
    }

    pub fn with_semantic_query(mut self, query: &str) -> Self {
        self.semantic_query = Some(query.to_string());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Which tier decided the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Exact filters only; the result can be acted on directly
    Index,
    /// A regex decided membership
    Pattern,
    /// Candidates still need judgment by an external model
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub elements: Vec<Element>,
    pub matched_count: usize,
    pub query_type: QueryType,
    /// Line-per-candidate digest, present for semantic queries
    pub compact_representation: Option<String>,
}

enum TextMatcher {
    Regex(Regex),
    Literal(String),
}

impl TextMatcher {
    /// Invalid regexes degrade to a literal substring match
    fn compile(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => TextMatcher::Regex(re),
            Err(err) => {
                warn!(pattern, error = %err, "Invalid scan pattern, matching literally");
                TextMatcher::Literal(pattern.to_string())
            }
        }
    }

    fn is_match(&self, text: &str) -> bool {
        match self {
            TextMatcher::Regex(re) => re.is_match(text),
            TextMatcher::Literal(literal) => text.contains(literal.as_str()),
        }
    }
}

/// Truncate to `limit` characters, marking the cut
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let kept: String = text.chars().take(limit).collect();
        format!("{}...", kept)
    }
}

/// One line per element: `[id|page|flags|type] text`
pub fn compact_digest<'a>(elements: impl IntoIterator<Item = &'a Element>, text_limit: usize) -> String {
    elements
        .into_iter()
        .map(|e| {
            format!(
                "[{}|{}|{}|{}] {}",
                e.id,
                e.page,
                e.flag_string(),
                e.semantic_type.map(|t| t.as_str()).unwrap_or("-"),
                truncate_chars(&e.text, text_limit)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl Gdsm {
    pub fn scan(&self, query: &ScanQuery) -> ScanResult {
        let mut query_type = QueryType::Index;

        // 1. page
        let mut candidates: Vec<&Element> = match query.page {
            Some(page) => self.elements_on_page(page),
            None => self.elements().collect(),
        };

        // 2. state
        candidates.retain(|e| {
            !e.is_deleted()
                && !(query.exclude_redacted && e.is_redacted())
                && (!query.only_highlighted || e.is_highlighted())
        });

        // 3. exact word
        if let Some(word) = non_blank(&query.exact_word) {
            let tokens = split_words(word);
            if let [token] = tokens.as_slice() {
                if token.chars().count() >= MIN_WORD_LEN {
                    let hits = self.text_index.search_word(token);
                    candidates.retain(|e| hits.contains(&e.id));
                }
            }
            candidates.retain(|e| contains_exact_word(&e.text, word));
        }

        // 4. pattern
        if let Some(pattern) = non_blank(&query.pattern) {
            let matcher = TextMatcher::compile(pattern);
            candidates.retain(|e| matcher.is_match(&e.text));
            query_type = QueryType::Pattern;
        }

        // 5. semantic type
        if let Some(semantic_type) = query.semantic_type {
            candidates.retain(|e| effective_type(e) == Some(semantic_type));
        }

        // 6. semantic query
        let compact_representation = non_blank(&query.semantic_query).map(|_| {
            query_type = QueryType::Semantic;
            compact_digest(candidates.iter().copied(), self.config.digest_text_limit)
        });

        // 7. limit
        if let Some(limit) = query.limit.or(self.config.default_scan_limit) {
            candidates.truncate(limit);
        }

        let elements: Vec<Element> = candidates.into_iter().cloned().collect();

        debug!(
            document_id = %self.document_id,
            query_type = ?query_type,
            matched = elements.len(),
            "Scan complete"
        );

        ScanResult {
            matched_count: elements.len(),
            elements,
            query_type,
            compact_representation,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::mutation::Mutation;
    use pretty_assertions::assert_eq;
    use shared_types::{BoundingBox, RenderTree};

    fn model() -> Gdsm {
        let mut tree = RenderTree::new();
        let rows = [
            (1, "The French language"),
            (1, "Francophone community"),
            (1, "Contact: a@b.com"),
            (2, "French fries, $4.50"),
            (2, "Call 555-123-4567"),
        ];
        for (i, (page, text)) in rows.iter().enumerate() {
            tree.add_text(None, *page, text, BoundingBox::new(0.0, i as f64 * 20.0, 100.0, 12.0));
        }
        build(&tree)
    }

    fn ids(result: &ScanResult) -> Vec<&str> {
        result.elements.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_default_scan_returns_everything_in_order() {
        let result = model().scan(&ScanQuery::new());
        assert_eq!(result.matched_count, 5);
        assert_eq!(result.query_type, QueryType::Index);
        assert_eq!(result.compact_representation, None);
    }

    #[test]
    fn test_page_filter() {
        let result = model().scan(&ScanQuery::new().on_page(2));
        assert_eq!(ids(&result), vec!["p2-el-0", "p2-el-1"]);
        assert!(model().scan(&ScanQuery::new().on_page(7)).elements.is_empty());
    }

    #[test]
    fn test_exact_word_is_whole_token() {
        let result = model().scan(&ScanQuery::new().with_word("French"));
        assert_eq!(ids(&result), vec!["p1-el-0", "p2-el-0"]);
        assert_eq!(result.query_type, QueryType::Index);
    }

    #[test]
    fn test_exact_word_respects_earlier_filters() {
        let result = model().scan(&ScanQuery::new().on_page(1).with_word("french"));
        assert_eq!(ids(&result), vec!["p1-el-0"]);
    }

    #[test]
    fn test_pattern_filter() {
        let result = model().scan(&ScanQuery::new().with_pattern(r"\$\d+\.\d{2}"));
        assert_eq!(ids(&result), vec!["p2-el-0"]);
        assert_eq!(result.query_type, QueryType::Pattern);
    }

    #[test]
    fn test_invalid_pattern_matches_literally() {
        let mut tree = RenderTree::new();
        tree.add_text(None, 1, "See section (a", BoundingBox::default());
        tree.add_text(None, 1, "Section a", BoundingBox::new(0.0, 20.0, 10.0, 10.0));
        let gdsm = build(&tree);

        let result = gdsm.scan(&ScanQuery::new().with_pattern("(a"));
        assert_eq!(ids(&result), vec!["p1-el-0"]);
        assert_eq!(result.query_type, QueryType::Pattern);
    }

    #[test]
    fn test_semantic_type_filter() {
        let result = model().scan(&ScanQuery::new().with_semantic_type(SemanticType::Phone));
        assert_eq!(ids(&result), vec!["p2-el-1"]);
    }

    #[test]
    fn test_state_filters() {
        let mut gdsm = model();
        gdsm.apply_mutation(&Mutation::redact("p1-el-2"));
        gdsm.apply_mutation(&Mutation::highlight("p1-el-0"));
        gdsm.apply_mutation(&Mutation::highlight("p2-el-1"));
        gdsm.apply_mutation(&Mutation::delete("p2-el-1"));

        assert_eq!(gdsm.scan(&ScanQuery::new()).matched_count, 3);
        assert_eq!(gdsm.scan(&ScanQuery::new().include_redacted()).matched_count, 4);
        let highlighted = gdsm.scan(&ScanQuery::new().only_highlighted().include_redacted());
        // Deleted elements never come back, highlighted or not
        assert_eq!(ids(&highlighted), vec!["p1-el-0"]);
    }

    #[test]
    fn test_semantic_query_emits_digest() {
        let gdsm = model();
        let result = gdsm.scan(&ScanQuery::new().on_page(1).with_semantic_query("anything about languages"));

        assert_eq!(result.query_type, QueryType::Semantic);
        assert_eq!(result.matched_count, 3);
        let digest = result.compact_representation.unwrap();
        let lines: Vec<&str> = digest.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "[p1-el-2|1|-|email] Contact: a@b.com");
    }

    #[test]
    fn test_digest_truncates_text() {
        let mut el = Element::new("p1-el-0", 1, "x".repeat(250), BoundingBox::default());
        el.state = shared_types::ElementState::HIGHLIGHTED;
        let digest = compact_digest([&el], 200);
        assert_eq!(digest, format!("[p1-el-0|1|H|-] {}...", "x".repeat(200)));
    }

    #[test]
    fn test_limit_truncates_in_order() {
        let result = model().scan(&ScanQuery::new().with_limit(2));
        assert_eq!(ids(&result), vec!["p1-el-0", "p1-el-1"]);
        assert_eq!(result.matched_count, 2);
    }

    #[test]
    fn test_query_from_json_defaults_to_excluding_redacted() {
        let query: ScanQuery = serde_json::from_str(r#"{"semantic_type":"email"}"#).unwrap();
        assert!(query.exclude_redacted);
        assert_eq!(query.semantic_type, Some(SemanticType::Email));
    }
}
