//! GDSM - Global Document Structure Model for the PDF editor
//!
//! Turns the converted document's render tree into a flat, page-indexed model
//! of canonical text elements, and exposes:
//! - Semantic classification of element text (`classifier`, `patterns`)
//! - Word and character-bigram indices (`text_index`)
//! - Tiered scanning: page / state / exact word / regex / semantic type, with a
//!   compact digest for free-text queries an LLM has to resolve (`scanner`)
//! - Atomic, index-consistent mutations (`mutation`)
//!
//! The model lives for one editing session and is never persisted.

pub mod builder;
pub mod classifier;
pub mod config;
pub mod error;
pub mod model;
pub mod mutation;
pub mod patterns;
pub mod scanner;
pub mod session;
pub mod text_index;

pub use builder::ModelBuilder;
pub use classifier::{
    classify, detect_all_types, detect_primary_type, extract_entities, extract_typed_entities,
    Classification,
};
pub use config::GdsmConfig;
pub use error::GdsmError;
pub use model::{DocumentSummary, Gdsm};
pub use mutation::{Mutation, MutationResult, PreviousState};
pub use scanner::{compact_digest, QueryType, ScanQuery, ScanResult};
pub use session::SharedGdsm;
pub use text_index::TextIndex;

pub use shared_types::{
    BoundingBox, Comment, Element, ElementState, Page, RenderNode, RenderTree, SemanticType, Stats,
};

/// Build a model from a render tree with the default configuration
pub fn build(tree: &RenderTree) -> Gdsm {
    builder::build(tree)
}

pub fn scan(gdsm: &Gdsm, query: &ScanQuery) -> ScanResult {
    gdsm.scan(query)
}

pub fn apply_mutation(gdsm: &mut Gdsm, mutation: &Mutation) -> MutationResult {
    gdsm.apply_mutation(mutation)
}
