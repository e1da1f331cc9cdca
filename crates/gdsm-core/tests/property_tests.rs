//! Property-based tests for gdsm-core
//!
//! Random documents under random mutation sequences must keep the text index,
//! the stats and the write-once original text consistent.

use gdsm_core::text_index::{contains_exact_word, tokenize};
use gdsm_core::{build, BoundingBox, Gdsm, Mutation, RenderTree, ScanQuery, Stats};
use proptest::prelude::*;

// ============================================================
// Strategies
// ============================================================

/// Short lines drawn from a small vocabulary so mutations collide on words
fn line() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("french"),
            Just("language"),
            Just("Buyer"),
            Just("a@b.com"),
            Just("$300"),
            Just("x"),
            Just("community"),
            Just("2024-01-15"),
        ],
        1..6,
    )
    .prop_map(|words| words.join(" "))
}

fn document() -> impl Strategy<Value = Vec<(u32, String)>> {
    prop::collection::vec((1u32..4, line()), 1..12)
}

/// (operation selector, element slot, replacement text)
fn operations() -> impl Strategy<Value = Vec<(u8, usize, String)>> {
    prop::collection::vec((0u8..7, 0usize..16, line()), 0..25)
}

fn build_document(rows: &[(u32, String)]) -> Gdsm {
    let mut tree = RenderTree::new();
    for (i, (page, text)) in rows.iter().enumerate() {
        tree.add_text(None, *page, text, BoundingBox::new(0.0, i as f64 * 14.0, 100.0, 12.0));
    }
    build(&tree)
}

fn to_mutation(op: u8, id: &str, text: &str) -> Mutation {
    match op {
        0 => Mutation::redact(id),
        1 => Mutation::highlight(id),
        2 => Mutation::set_text(id, text),
        3 => Mutation::add_comment(id, text),
        4 => Mutation::delete(id),
        5 => Mutation::remove_highlight(id),
        _ => Mutation::remove_comment(id),
    }
}

fn recount(gdsm: &Gdsm) -> Stats {
    Stats::from_elements(gdsm.elements())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ============================================================
    // Index consistency
    // ============================================================

    #[test]
    fn index_tracks_text_after_mutations(rows in document(), ops in operations()) {
        let mut gdsm = build_document(&rows);
        let ids: Vec<String> = gdsm.elements().map(|e| e.id.clone()).collect();

        for (op, slot, text) in &ops {
            let id = &ids[slot % ids.len()];
            gdsm.apply_mutation(&to_mutation(*op, id, text));
        }

        for element in gdsm.elements() {
            // Generated lines are never empty, so only the blanking flags empty a text
            let blanked = element.is_redacted() || element.is_deleted();
            prop_assert_eq!(element.text.is_empty(), blanked);
            prop_assert!(gdsm.text_index().covers(element));
            if element.text.is_empty() {
                prop_assert!(gdsm.text_index().is_unreferenced(&element.id));
            }
            for word in tokenize(&element.text) {
                prop_assert!(gdsm.text_index().search_word(&word).contains(&element.id));
            }
        }

        // No stale entries: every indexed hit still holds the word
        for word in ["french", "language", "buyer", "community", "300"] {
            for id in gdsm.text_index().search_word(word) {
                let element = gdsm.get_element(&id).unwrap();
                prop_assert!(contains_exact_word(&element.text, word));
            }
        }
    }

    // ============================================================
    // Stats
    // ============================================================

    #[test]
    fn stats_equal_a_full_recount(rows in document(), ops in operations()) {
        let mut gdsm = build_document(&rows);
        let ids: Vec<String> = gdsm.elements().map(|e| e.id.clone()).collect();
        let total = ids.len();

        for (op, slot, text) in &ops {
            let id = &ids[slot % ids.len()];
            gdsm.apply_mutation(&to_mutation(*op, id, text));
            prop_assert_eq!(gdsm.stats(), recount(&gdsm));
        }

        prop_assert_eq!(gdsm.stats().total, total);
    }

    // ============================================================
    // Original text
    // ============================================================

    #[test]
    fn original_text_is_captured_once(rows in document(), ops in operations()) {
        let mut gdsm = build_document(&rows);
        let ids: Vec<String> = gdsm.elements().map(|e| e.id.clone()).collect();
        let initial: Vec<String> = gdsm.elements().map(|e| e.text.clone()).collect();

        for (op, slot, text) in &ops {
            let id = &ids[slot % ids.len()];
            gdsm.apply_mutation(&to_mutation(*op, id, text));
        }

        for (id, text) in ids.iter().zip(&initial) {
            let element = gdsm.get_element(id).unwrap();
            if let Some(original) = &element.original_text {
                prop_assert_eq!(original, text);
            }
        }
    }

    // ============================================================
    // Scanning
    // ============================================================

    #[test]
    fn scans_never_return_deleted_elements(rows in document(), ops in operations()) {
        let mut gdsm = build_document(&rows);
        let ids: Vec<String> = gdsm.elements().map(|e| e.id.clone()).collect();

        for (op, slot, text) in &ops {
            let id = &ids[slot % ids.len()];
            gdsm.apply_mutation(&to_mutation(*op, id, text));
        }

        let everything = gdsm.scan(&ScanQuery::new().include_redacted());
        prop_assert!(everything.elements.iter().all(|e| !e.is_deleted()));
        prop_assert_eq!(everything.matched_count, everything.elements.len());

        let default_scan = gdsm.scan(&ScanQuery::new());
        prop_assert!(default_scan.elements.iter().all(|e| !e.is_redacted()));
    }

    #[test]
    fn building_is_deterministic(rows in document()) {
        let first = build_document(&rows);
        let second = build_document(&rows);
        let a: Vec<(String, String)> = first.elements().map(|e| (e.id.clone(), e.text.clone())).collect();
        let b: Vec<(String, String)> = second.elements().map(|e| (e.id.clone(), e.text.clone())).collect();
        prop_assert_eq!(a, b);
    }
}
