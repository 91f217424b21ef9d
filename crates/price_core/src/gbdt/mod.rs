//! Deterministic GBDT regression engine
//!
//! - Integer-only inference: thresholds in feature units, leaves in cents,
//!   tree weights fixed-point at [`SCALE`]
//! - Canonical JSON serialization (sorted keys, compact) for stable hashing
//! - BLAKE3 model hashes for artifact integrity checks
//!
//! # Usage
//!
//! ```rust
//! use carprice_core::gbdt::{Model, Node, Tree, SCALE, PRICE_SCALE};
//!
//! let tree = Tree::new(
//!     vec![
//!         Node::internal(0, 0, 100_000, 1, 2),
//!         Node::leaf(1, 2_000 * PRICE_SCALE),
//!         Node::leaf(2, -2_000 * PRICE_SCALE),
//!     ],
//!     SCALE,
//! );
//! let model = Model::new(vec![tree], 15_000 * PRICE_SCALE, 1);
//!
//! assert_eq!(model.predict(&[50_000]).unwrap(), 17_000.0);
//! ```

pub mod model;
pub mod tree;

pub use model::{weighted_leaf, Model, ModelError, MODEL_VERSION, PRICE_SCALE, SCALE};
pub use tree::{Node, Tree};

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_canonical_json_roundtrip() {
        let tree = Tree::new(
            vec![
                Node::internal(0, 0, 50, 1, 2),
                Node::leaf(1, 100),
                Node::leaf(2, 200),
            ],
            SCALE,
        );
        let original = Model::new(vec![tree], 12_345, 1);

        let json = original.to_canonical_json().unwrap();
        let restored: Model = serde_json::from_str(&json).unwrap();

        assert_eq!(original, restored);
        assert_eq!(original.hash_hex().unwrap(), restored.hash_hex().unwrap());
        assert_eq!(
            original.try_score(&[30]).unwrap(),
            restored.try_score(&[30]).unwrap()
        );
    }

    #[test]
    fn test_bias_only_model() {
        let model = Model::new(vec![], 42, 3);
        assert_eq!(model.try_score(&[1, 2, 3]).unwrap(), 42);
        assert!(model.try_score(&[1, 2]).is_err());
    }
}
