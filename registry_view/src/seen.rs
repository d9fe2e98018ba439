//! Approximate set of sub-key names already listed
//!
//! While a directory is listed, each sub-key name is recorded here so a
//! value of the same name can be given the value suffix. Membership is
//! probabilistic: a hit may be a hash collision and must be confirmed
//! against the store. A miss is always exact.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const TABLE_BITS: usize = 8192;
const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-size bitset keyed by a hash of the case-folded name
#[derive(Debug, Clone)]
pub struct SeenNames {
    table: Box<[u64; TABLE_BITS / WORD_BITS]>,
}

impl SeenNames {
    /// Creates an empty set
    pub fn new() -> Self {
        Self {
            table: Box::new([0; TABLE_BITS / WORD_BITS]),
        }
    }

    fn slot(name: &str) -> (usize, u64) {
        let mut hasher = DefaultHasher::new();
        name.to_lowercase().hash(&mut hasher);
        let bit = (hasher.finish() as usize) % TABLE_BITS;
        (bit / WORD_BITS, 1u64 << (bit % WORD_BITS))
    }

    /// Records a name
    pub fn insert(&mut self, name: &str) {
        let (word, mask) = Self::slot(name);
        self.table[word] |= mask;
    }

    /// Returns true if the name may have been recorded
    pub fn may_contain(&self, name: &str) -> bool {
        let (word, mask) = Self::slot(name);
        self.table[word] & mask != 0
    }

    /// Forgets every name
    pub fn clear(&mut self) {
        self.table.fill(0);
    }
}

impl Default for SeenNames {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_false_negatives() {
        let mut seen = SeenNames::new();
        let names: Vec<String> = (0..500).map(|i| format!("Key{}", i)).collect();
        for name in &names {
            seen.insert(name);
        }
        for name in &names {
            assert!(seen.may_contain(name));
        }
    }

    #[test]
    fn test_case_folded() {
        let mut seen = SeenNames::new();
        seen.insert("Environment");
        assert!(seen.may_contain("ENVIRONMENT"));
        assert!(seen.may_contain("environment"));
    }

    #[test]
    fn test_clear() {
        let mut seen = SeenNames::new();
        seen.insert("Run");
        seen.clear();
        assert!(!seen.may_contain("Run"));
    }

    #[test]
    fn test_empty_set_misses() {
        let seen = SeenNames::default();
        assert!(!seen.may_contain("anything"));
    }
}
