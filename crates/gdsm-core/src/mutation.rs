//! State-changing operations on single elements
//!
//! Each operation captures the element's pre-edit text once (`original_text`),
//! keeps the text index in step with the element's text, bumps the model
//! version and recounts stats. A redacted or deleted element keeps empty,
//! unindexed text for as long as either flag is set. The pre-mutation fields come back to the caller
//! so an undo can be replayed with [`Gdsm::restore`].

use crate::classifier::{classify, Classification};
use crate::error::GdsmError;
use crate::model::Gdsm;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared_types::{Comment, Element, ElementState};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    Redact {
        element_id: String,
    },
    Highlight {
        element_id: String,
    },
    SetText {
        element_id: String,
        #[serde(default)]
        text: Option<String>,
    },
    AddComment {
        element_id: String,
        #[serde(default)]
        text: Option<String>,
    },
    Delete {
        element_id: String,
    },
    RemoveHighlight {
        element_id: String,
    },
    RemoveComment {
        element_id: String,
    },
}

impl Mutation {
    pub fn redact(element_id: &str) -> Self {
        Mutation::Redact {
            element_id: element_id.to_string(),
        }
    }

    pub fn highlight(element_id: &str) -> Self {
        Mutation::Highlight {
            element_id: element_id.to_string(),
        }
    }

    pub fn set_text(element_id: &str, text: &str) -> Self {
        Mutation::SetText {
            element_id: element_id.to_string(),
            text: Some(text.to_string()),
        }
    }

    pub fn add_comment(element_id: &str, text: &str) -> Self {
        Mutation::AddComment {
            element_id: element_id.to_string(),
            text: Some(text.to_string()),
        }
    }

    pub fn delete(element_id: &str) -> Self {
        Mutation::Delete {
            element_id: element_id.to_string(),
        }
    }

    pub fn remove_highlight(element_id: &str) -> Self {
        Mutation::RemoveHighlight {
            element_id: element_id.to_string(),
        }
    }

    pub fn remove_comment(element_id: &str) -> Self {
        Mutation::RemoveComment {
            element_id: element_id.to_string(),
        }
    }

    pub fn element_id(&self) -> &str {
        match self {
            Mutation::Redact { element_id }
            | Mutation::Highlight { element_id }
            | Mutation::SetText { element_id, .. }
            | Mutation::AddComment { element_id, .. }
            | Mutation::Delete { element_id }
            | Mutation::RemoveHighlight { element_id }
            | Mutation::RemoveComment { element_id } => element_id,
        }
    }

    /// Wire name of the operation
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Redact { .. } => "redact",
            Mutation::Highlight { .. } => "highlight",
            Mutation::SetText { .. } => "set_text",
            Mutation::AddComment { .. } => "add_comment",
            Mutation::Delete { .. } => "delete",
            Mutation::RemoveHighlight { .. } => "remove_highlight",
            Mutation::RemoveComment { .. } => "remove_comment",
        }
    }

    /// Reject payloads missing a required field
    fn validate(&self) -> Result<(), GdsmError> {
        match self {
            Mutation::SetText { text: None, .. } => Err(GdsmError::MalformedOperation(
                "set_text requires text".to_string(),
            )),
            Mutation::AddComment { text, .. }
                if text.as_deref().map(str::trim).unwrap_or("").is_empty() =>
            {
                Err(GdsmError::MalformedOperation(
                    "add_comment requires non-empty text".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Element fields as they were before a mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousState {
    pub text: String,
    pub state: ElementState,
    pub original_text: Option<String>,
    pub comment: Option<Comment>,
}

impl PreviousState {
    fn capture(element: &Element) -> Self {
        Self {
            text: element.text.clone(),
            state: element.state,
            original_text: element.original_text.clone(),
            comment: element.comment.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResult {
    pub success: bool,
    pub element_id: String,
    pub previous_state: Option<PreviousState>,
    pub error: Option<String>,
}

fn set_classification(element: &mut Element, classification: Classification) {
    element.semantic_type = classification.semantic_type;
    element.entities = classification.entities;
}

/// Flags under which an element's text is forced empty
const BLANKING: ElementState = ElementState::REDACTED.union(ElementState::DELETED);

fn is_blanked(state: ElementState) -> bool {
    state.intersects(BLANKING)
}

fn blank(element: &mut Element) {
    element.text.clear();
    set_classification(element, Classification::default());
}

impl Gdsm {
    /// Apply a mutation, reporting failure as a value
    pub fn apply_mutation(&mut self, mutation: &Mutation) -> MutationResult {
        let element_id = mutation.element_id().to_string();
        match self.try_apply(mutation) {
            Ok(previous) => MutationResult {
                success: true,
                element_id,
                previous_state: Some(previous),
                error: None,
            },
            Err(err) => {
                warn!(op = mutation.kind(), element_id = %element_id, error = %err, "Mutation rejected");
                MutationResult {
                    success: false,
                    element_id,
                    previous_state: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    /// Apply mutations in order; a failed one does not stop the rest
    pub fn apply_mutations<'a>(
        &mut self,
        mutations: impl IntoIterator<Item = &'a Mutation>,
    ) -> Vec<MutationResult> {
        mutations
            .into_iter()
            .map(|mutation| self.apply_mutation(mutation))
            .collect()
    }

    /// Apply a mutation, returning the pre-mutation snapshot
    pub fn try_apply(&mut self, mutation: &Mutation) -> Result<PreviousState, GdsmError> {
        mutation.validate()?;

        let comment_id = match mutation {
            Mutation::AddComment { .. } => Some(format!("comment-{}", self.next_comment_id)),
            _ => None,
        };

        let Gdsm {
            elements_by_id,
            text_index,
            ..
        } = &mut *self;

        let id = mutation.element_id();
        let element = elements_by_id
            .get_mut(id)
            .ok_or_else(|| GdsmError::NotFound(id.to_string()))?;

        let before = element.clone();
        let previous = PreviousState::capture(&before);
        if element.original_text.is_none() {
            element.original_text = Some(element.text.clone());
        }

        match mutation {
            Mutation::Redact { .. } => {
                element.state.insert(ElementState::REDACTED);
                blank(element);
                text_index.update(&before, element);
            }
            Mutation::Highlight { .. } => {
                element.state.insert(ElementState::HIGHLIGHTED);
            }
            Mutation::SetText { text, .. } => {
                element.state.insert(ElementState::MODIFIED);
                if is_blanked(element.state) {
                    debug!(element_id = %id, "Element is redacted or deleted, text stays empty");
                } else {
                    element.text = text.clone().unwrap_or_default();
                    set_classification(element, classify(&element.text));
                    text_index.update(&before, element);
                }
            }
            Mutation::AddComment { text, .. } => {
                element.state.insert(ElementState::COMMENTED);
                element.comment = Some(Comment {
                    id: comment_id.unwrap_or_default(),
                    text: text.clone().unwrap_or_default(),
                    timestamp: Utc::now(),
                });
            }
            Mutation::Delete { .. } => {
                element.state.insert(ElementState::DELETED);
                blank(element);
                text_index.remove(&before);
            }
            Mutation::RemoveHighlight { .. } => {
                element.state.remove(ElementState::HIGHLIGHTED);
            }
            Mutation::RemoveComment { .. } => {
                element.state.remove(ElementState::COMMENTED);
                element.comment = None;
            }
        }

        if matches!(mutation, Mutation::AddComment { .. }) {
            self.next_comment_id += 1;
        }
        self.commit();

        debug!(
            op = mutation.kind(),
            element_id = %id,
            version = self.version,
            "Applied mutation"
        );

        Ok(previous)
    }

    /// Put an element back to a captured snapshot.
    ///
    /// Text, state flags and comment come from the snapshot; semantic type and
    /// entities are recomputed. A snapshot carrying `REDACTED` or `DELETED`
    /// restores empty text whatever its `text` field holds. `original_text`
    /// stays write-once: it is captured here if it never was, and otherwise
    /// left alone.
    pub fn restore(&mut self, element_id: &str, previous: &PreviousState) -> Result<(), GdsmError> {
        let Gdsm {
            elements_by_id,
            text_index,
            ..
        } = &mut *self;

        let element = elements_by_id
            .get_mut(element_id)
            .ok_or_else(|| GdsmError::NotFound(element_id.to_string()))?;

        if element.original_text.is_none() {
            element.original_text = Some(element.text.clone());
        }

        let restored_text = if is_blanked(previous.state) {
            String::new()
        } else {
            previous.text.clone()
        };
        let before = element.clone();
        element.text = restored_text;
        element.state = previous.state;
        element.comment = previous.comment.clone();
        let classification = if element.text.is_empty() {
            Classification::default()
        } else {
            classify(&element.text)
        };
        set_classification(element, classification);
        text_index.update(&before, element);

        self.commit();
        debug!(element_id = %element_id, version = self.version, "Restored element");
        Ok(())
    }

    fn commit(&mut self) {
        self.version += 1;
        self.last_modified_at = Utc::now();
        self.recompute_stats();
    }
}
