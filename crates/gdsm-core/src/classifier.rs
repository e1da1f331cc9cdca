//! Semantic classification of element text
//!
//! Pure functions over the rule table in [`crate::patterns`]. Rules are not
//! exclusive: a line can hold an email and a phone number at once. The
//! primary type is the first rule in priority order that matches.

use crate::patterns::RULES;
use serde::{Deserialize, Serialize};
use shared_types::SemanticType;
use std::collections::HashSet;

/// Classifier output stored on an element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub semantic_type: Option<SemanticType>,
    pub entities: Option<Vec<String>>,
}

/// Best-fit category: the first matching rule in priority order
pub fn detect_primary_type(text: &str) -> Option<SemanticType> {
    if text.trim().is_empty() {
        return None;
    }
    RULES
        .iter()
        .find(|rule| rule.is_match(text))
        .map(|rule| rule.semantic_type)
}

/// Every category with at least one match, in priority order
pub fn detect_all_types(text: &str) -> Vec<SemanticType> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    RULES
        .iter()
        .filter(|rule| rule.is_match(text))
        .map(|rule| rule.semantic_type)
        .collect()
}

/// Matched substrings tagged with the category that found them.
///
/// Deduplicated by exact string value; when two rules match the same
/// substring the higher-priority rule keeps it.
pub fn extract_typed_entities(text: &str) -> Vec<(SemanticType, String)> {
    let mut seen = HashSet::new();
    let mut entities = Vec::new();

    if text.trim().is_empty() {
        return entities;
    }

    for rule in RULES.iter() {
        for found in rule.find_all(text) {
            if seen.insert(found) {
                entities.push((rule.semantic_type, found.to_string()));
            }
        }
    }

    entities
}

/// Matched substrings across all categories, deduplicated
pub fn extract_entities(text: &str) -> Vec<String> {
    extract_typed_entities(text)
        .into_iter()
        .map(|(_, value)| value)
        .collect()
}

/// Primary type plus entity list, in the shape elements store them
pub fn classify(text: &str) -> Classification {
    let entities = extract_entities(text);
    Classification {
        semantic_type: detect_primary_type(text),
        entities: if entities.is_empty() {
            None
        } else {
            Some(entities)
        },
    }
}
