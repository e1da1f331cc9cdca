//! Thread-safe handle over one document model
//!
//! Scans take the read lock; mutations take the write lock, so every
//! mutation (including its index update and stats recount) is atomic with
//! respect to concurrent scans.

use crate::model::Gdsm;
use crate::mutation::{Mutation, MutationResult};
use crate::scanner::{ScanQuery, ScanResult};
use shared_types::Stats;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone)]
pub struct SharedGdsm {
    inner: Arc<RwLock<Gdsm>>,
}

impl SharedGdsm {
    pub fn new(gdsm: Gdsm) -> Self {
        Self {
            inner: Arc::new(RwLock::new(gdsm)),
        }
    }

    /// Run a closure against the model under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&Gdsm) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run a closure against the model under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut Gdsm) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn scan(&self, query: &ScanQuery) -> ScanResult {
        self.read(|gdsm| gdsm.scan(query))
    }

    pub fn apply_mutation(&self, mutation: &Mutation) -> MutationResult {
        self.write(|gdsm| gdsm.apply_mutation(mutation))
    }

    /// The whole batch runs under one write lock
    pub fn apply_mutations(&self, mutations: &[Mutation]) -> Vec<MutationResult> {
        self.write(|gdsm| gdsm.apply_mutations(mutations))
    }

    pub fn stats(&self) -> Stats {
        self.read(Gdsm::stats)
    }

    pub fn version(&self) -> u64 {
        self.read(Gdsm::version)
    }
}

impl From<Gdsm> for SharedGdsm {
    fn from(gdsm: Gdsm) -> Self {
        Self::new(gdsm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use pretty_assertions::assert_eq;
    use shared_types::{BoundingBox, RenderTree};
    use std::thread;

    fn shared(count: usize) -> SharedGdsm {
        let mut tree = RenderTree::new();
        for i in 0..count {
            tree.add_text(
                None,
                1,
                &format!("Line {} text", i),
                BoundingBox::new(0.0, i as f64 * 20.0, 100.0, 12.0),
            );
        }
        SharedGdsm::from(build(&tree))
    }

    #[test]
    fn test_clones_share_the_model() {
        let a = shared(2);
        let b = a.clone();
        a.apply_mutation(&Mutation::highlight("p1-el-0"));
        assert_eq!(b.stats().highlighted, 1);
        assert_eq!(b.version(), 1);
    }

    #[test]
    fn test_concurrent_mutations_and_scans() {
        let session = shared(8);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let session = session.clone();
                thread::spawn(move || {
                    let id = format!("p1-el-{}", i);
                    assert!(session.apply_mutation(&Mutation::redact(&id)).success);
                    session.scan(&ScanQuery::new().include_redacted()).matched_count
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 8);
        }

        assert_eq!(session.stats().redacted, 8);
        assert_eq!(session.version(), 8);
        assert_eq!(session.scan(&ScanQuery::new()).matched_count, 0);
        assert!(session.read(|gdsm| gdsm.text_index().is_empty()));
    }

    #[test]
    fn test_batch_under_one_lock() {
        let session = shared(3);
        let results = session.apply_mutations(&[
            Mutation::delete("p1-el-0"),
            Mutation::set_text("p1-el-1", "Rewritten line"),
        ]);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(session.version(), 2);
        assert_eq!(session.scan(&ScanQuery::new().with_word("rewritten")).matched_count, 1);
    }
}
