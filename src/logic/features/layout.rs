//! Feature Layout - Session Feature Definition
//!
//! The feature columns and their order are fixed when the dataset is loaded
//! and stay fixed for the whole session. The reconstruction model expects
//! exactly this arity.
//!
//! A CRC32 over the ordered names identifies the layout, so a replayed
//! history can be checked against the layout of the current dataset.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE LAYOUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLayout {
    names: Vec<String>,
    hash: u32,
}

impl FeatureLayout {
    pub fn new(names: Vec<String>) -> Self {
        let hash = compute_layout_hash(&names);
        Self { names, hash }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Get feature index by name (O(n) but features are few)
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn feature_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn validate(&self, other: &FeatureLayout) -> Result<(), LayoutMismatchError> {
        if self.hash != other.hash || self.len() != other.len() {
            return Err(LayoutMismatchError {
                expected_hash: self.hash,
                expected_count: self.len(),
                actual_hash: other.hash,
                actual_count: other.len(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 of the ordered feature names, NUL separated
pub fn compute_layout_hash(names: &[String]) -> u32 {
    let mut hasher = Hasher::new();

    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMismatchError {
    pub expected_hash: u32,
    pub expected_count: usize,
    pub actual_hash: u32,
    pub actual_count: usize,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Feature layout mismatch: expected {} features (hash: {:08x}), got {} (hash: {:08x})",
            self.expected_count, self.expected_hash, self.actual_count, self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(names: &[&str]) -> FeatureLayout {
        FeatureLayout::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_layout_hash_consistency() {
        assert_eq!(layout(&["a", "b"]).hash(), layout(&["a", "b"]).hash());
    }

    #[test]
    fn test_layout_hash_depends_on_order() {
        assert_ne!(layout(&["a", "b"]).hash(), layout(&["b", "a"]).hash());
        // Separator keeps "ab" + "c" apart from "a" + "bc"
        assert_ne!(layout(&["ab", "c"]).hash(), layout(&["a", "bc"]).hash());
    }

    #[test]
    fn test_validate() {
        let current = layout(&["presion", "caudal"]);
        assert!(current.validate(&layout(&["presion", "caudal"])).is_ok());

        let err = current.validate(&layout(&["presion"])).unwrap_err();
        assert_eq!(err.expected_count, 2);
        assert_eq!(err.actual_count, 1);
    }

    #[test]
    fn test_feature_index() {
        let l = layout(&["presion", "temp", "caudal"]);
        assert_eq!(l.feature_index("temp"), Some(1));
        assert_eq!(l.feature_index("nonexistent"), None);
        assert_eq!(l.feature_name(2), Some("caudal"));
        assert_eq!(l.feature_name(3), None);
    }
}
