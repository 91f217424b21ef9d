//! Regression tree structures
//!
//! Nodes are stored in a flat arena; children are referenced by index.
//! Thresholds and leaf values are integers: thresholds in feature units,
//! leaf values at the model's target scale.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// Internal nodes send a row left when `features[feature_idx] <= threshold`.
/// Leaf nodes have `feature_idx == -1` and carry `leaf`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Node {
    /// Position of this node in the arena
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Split threshold in feature units
    pub threshold: i64,

    /// Leaf value (Some for leaf nodes, None for internal nodes)
    pub leaf: Option<i64>,
}

impl Node {
    pub fn internal(id: i32, feature_idx: i32, threshold: i64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(id: i32, value: i64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,

    /// Ensemble weight, fixed-point at the model scale
    pub weight: i64,
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: i64) -> Self {
        Self { nodes, weight }
    }

    /// Walk the tree for one feature vector.
    ///
    /// Returns `None` when the structure is broken or a split references a
    /// feature outside the vector; callers surface that as an error.
    pub fn evaluate(&self, features: &[i64]) -> Option<i64> {
        let mut idx = 0usize;

        // A valid tree reaches a leaf in at most `nodes.len()` steps
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(idx)?;

            if node.is_leaf() {
                return node.leaf;
            }

            let value = *features.get(usize::try_from(node.feature_idx).ok()?)?;
            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            idx = usize::try_from(next).ok()?;
        }

        None
    }

    /// Highest feature index referenced by a split, if any
    pub fn max_feature_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf())
            .filter_map(|n| usize::try_from(n.feature_idx).ok())
            .max()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize, budget: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() && budget > 0 => {
                    let left = walk(nodes, node.left.max(0) as usize, budget - 1);
                    let right = walk(nodes, node.right.max(0) as usize, budget - 1);
                    1 + left.max(right)
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0, self.nodes.len())
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.leaf.is_none() {
                    return Err(format!("leaf node {i} has no leaf value"));
                }
                continue;
            }

            // Children must point forward so traversal always terminates
            for (side, child) in [("left", node.left), ("right", node.right)] {
                if child <= i as i32 || child as usize >= self.nodes.len() {
                    return Err(format!("node {i} has invalid {side} child: {child}"));
                }
            }

            if node.feature_idx < 0 {
                return Err(format!(
                    "internal node {i} has invalid feature index: {}",
                    node.feature_idx
                ));
            }
        }

        Ok(())
    }
}
