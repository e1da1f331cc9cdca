//! Inverted word index and character-bigram index over element text
//!
//! Invariant: for every element with non-empty text, each indexable word of
//! that text maps to the element's ID in `words`, and each bigram of each such
//! word maps to it in `bigrams`. Text changes go through [`TextIndex::update`],
//! which retracts every old entry before adding the new ones.

use shared_types::Element;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Shortest word (in characters) that gets indexed
pub const MIN_WORD_LEN: usize = 2;

/// Lower-case and trim a token
pub fn normalize_token(token: &str) -> String {
    token.trim().to_lowercase()
}

/// Every run of letter/number code points, lower-cased, regardless of length
pub fn split_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Indexable words: letter/number runs of at least [`MIN_WORD_LEN`] characters
pub fn tokenize(text: &str) -> Vec<String> {
    split_words(text)
        .into_iter()
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .collect()
}

/// Overlapping two-character substrings of a word
pub fn bigrams(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .windows(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect()
}

/// Whole-token match: "French" is in "the French language" but not in
/// "Francophone community". A multi-word `word` must appear as a contiguous
/// token sequence.
pub fn contains_exact_word(text: &str, word: &str) -> bool {
    let needle = split_words(&normalize_token(word));
    if needle.is_empty() {
        return false;
    }
    let haystack = split_words(text);
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}

/// Words and bigrams contributed by one text, deduplicated
fn index_keys(text: &str) -> (BTreeSet<String>, BTreeSet<String>) {
    let words: BTreeSet<String> = tokenize(text).into_iter().collect();
    let grams = words.iter().flat_map(|w| bigrams(w)).collect();
    (words, grams)
}

fn insert_id(map: &mut HashMap<String, HashSet<String>>, key: String, id: &str) {
    map.entry(key).or_default().insert(id.to_string());
}

fn retract_id(map: &mut HashMap<String, HashSet<String>>, key: &str, id: &str) {
    if let Some(ids) = map.get_mut(key) {
        ids.remove(id);
        if ids.is_empty() {
            map.remove(key);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    words: HashMap<String, HashSet<String>>,
    bigrams: HashMap<String, HashSet<String>>,
}

impl TextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over a set of elements
    pub fn from_elements<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Self {
        let mut index = Self::new();
        for element in elements {
            index.add(element);
        }
        index
    }

    pub fn add(&mut self, element: &Element) {
        self.add_text(&element.id, &element.text);
    }

    /// Exact inverse of [`TextIndex::add`]; keys left without IDs are dropped
    pub fn remove(&mut self, element: &Element) {
        self.remove_text(&element.id, &element.text);
    }

    /// Retract `old` completely, then add `new`
    pub fn update(&mut self, old: &Element, new: &Element) {
        self.remove(old);
        self.add(new);
    }

    pub fn add_text(&mut self, id: &str, text: &str) {
        let (words, grams) = index_keys(text);
        for word in words {
            insert_id(&mut self.words, word, id);
        }
        for gram in grams {
            insert_id(&mut self.bigrams, gram, id);
        }
    }

    pub fn remove_text(&mut self, id: &str, text: &str) {
        let (words, grams) = index_keys(text);
        for word in &words {
            retract_id(&mut self.words, word, id);
        }
        for gram in &grams {
            retract_id(&mut self.bigrams, gram, id);
        }
    }

    /// IDs of elements containing the word; empty when unknown
    pub fn search_word(&self, word: &str) -> HashSet<String> {
        self.words
            .get(&normalize_token(word))
            .cloned()
            .unwrap_or_default()
    }

    /// IDs of elements holding every bigram of the fragment
    pub fn search_partial(&self, fragment: &str) -> HashSet<String> {
        let grams: BTreeSet<String> = split_words(fragment)
            .iter()
            .flat_map(|w| bigrams(w))
            .collect();

        let mut grams = grams.iter();
        let Some(first) = grams.next() else {
            return HashSet::new();
        };

        let mut result = match self.bigrams.get(first) {
            Some(ids) => ids.clone(),
            None => return HashSet::new(),
        };

        for gram in grams {
            match self.bigrams.get(gram) {
                Some(ids) => result.retain(|id| ids.contains(id)),
                None => return HashSet::new(),
            }
            if result.is_empty() {
                break;
            }
        }

        result
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn bigram_count(&self) -> usize {
        self.bigrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// True when the element's words and bigrams are all present for its ID
    pub fn covers(&self, element: &Element) -> bool {
        let (words, grams) = index_keys(&element.text);
        words
            .iter()
            .all(|w| self.words.get(w).is_some_and(|ids| ids.contains(&element.id)))
            && grams
                .iter()
                .all(|g| self.bigrams.get(g).is_some_and(|ids| ids.contains(&element.id)))
    }

    /// True when no word or bigram entry refers to the ID
    pub fn is_unreferenced(&self, id: &str) -> bool {
        self.words.values().all(|ids| !ids.contains(id))
            && self.bigrams.values().all(|ids| !ids.contains(id))
    }
}
