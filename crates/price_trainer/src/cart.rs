//! CART (Classification and Regression Tree) builder
//!
//! Deterministic exact-greedy regression tree construction using integer
//! arithmetic only. Each feature is scanned once per node over rows sorted
//! by value, accumulating gradient and hessian prefix sums.

use carprice_core::gbdt::{Node, Tree};

use crate::deterministic::SplitTieBreaker;

/// Hessian of a single row (squared error has a constant second derivative)
pub const UNIT_HESSIAN: i64 = 1000;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Upper bound on candidate thresholds evaluated per feature and node
    pub max_thresholds: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 7,
            min_samples_leaf: 1,
            max_thresholds: 64,
        }
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: i64,
    gain: i128,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: i64, gain: i128, node_id: usize) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold, node_id),
        }
    }

    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// A value boundary in the sorted scan: rows `<= threshold` go left
#[derive(Debug, Clone, Copy)]
struct Boundary {
    threshold: i64,
    left_count: usize,
    left_g: i128,
    left_h: i128,
}

/// Build a regression tree using exact-greedy CART
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<i64>],
    gradients: &'a [i64],
    hessians: &'a [i64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    /// Callers guarantee equal lengths and uniform row width.
    pub fn new(
        features: &'a [Vec<i64>],
        gradients: &'a [i64],
        hessians: &'a [i64],
        config: TreeConfig,
    ) -> Self {
        debug_assert_eq!(features.len(), gradients.len());
        debug_assert_eq!(features.len(), hessians.len());

        let feature_count = features.first().map(Vec::len).unwrap_or(0);

        Self {
            config,
            features,
            gradients,
            hessians,
            feature_count,
        }
    }

    /// Build a tree over `rows` with the given ensemble weight
    pub fn build(&self, rows: &[usize], weight: i64) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(rows, 0, &mut nodes);
        Tree::new(nodes, weight)
    }

    /// Recursively build tree nodes; returns the arena index of the subtree root
    fn build_node(&self, rows: &[usize], depth: usize, nodes: &mut Vec<Node>) -> i32 {
        let current = nodes.len();
        let id = current as i32;

        let split = if depth >= self.config.max_depth
            || rows.len() < 2 * self.config.min_samples_leaf.max(1)
        {
            None
        } else {
            self.find_best_split(rows, current)
        };

        let Some(split) = split else {
            nodes.push(Node::leaf(id, self.leaf_value(rows)));
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&row| self.features[row][split.feature_idx] <= split.threshold);

        // Reserve the parent slot so children land after it
        nodes.push(Node::internal(id, split.feature_idx as i32, split.threshold, -1, -1));

        let left = self.build_node(&left_rows, depth + 1, nodes);
        let right = self.build_node(&right_rows, depth + 1, nodes);

        nodes[current].left = left;
        nodes[current].right = right;

        id
    }

    /// Best positive-gain split over all features
    fn find_best_split(&self, rows: &[usize], node_id: usize) -> Option<SplitCandidate> {
        let (total_g, total_h) = self.sums(rows);
        let parent_score = score(total_g, total_h);
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut best: Option<SplitCandidate> = None;

        for feature_idx in 0..self.feature_count {
            for boundary in self.candidate_boundaries(rows, feature_idx) {
                let right_count = rows.len() - boundary.left_count;
                if boundary.left_count < min_leaf || right_count < min_leaf {
                    continue;
                }

                let gain = score(boundary.left_g, boundary.left_h)
                    + score(total_g - boundary.left_g, total_h - boundary.left_h)
                    - parent_score;
                if gain <= 0 {
                    continue;
                }

                let candidate = SplitCandidate::new(feature_idx, boundary.threshold, gain, node_id);
                best = match best {
                    Some(current) if !candidate.beats(&current) => Some(current),
                    _ => Some(candidate),
                };
            }
        }

        best
    }

    /// Prefix sums at every distinct value of `feature_idx` except the largest,
    /// thinned evenly to at most `max_thresholds` entries
    fn candidate_boundaries(&self, rows: &[usize], feature_idx: usize) -> Vec<Boundary> {
        let mut sorted: Vec<usize> = rows.to_vec();
        sorted.sort_by_key(|&row| (self.features[row][feature_idx], row));

        let mut boundaries = Vec::new();
        let mut left_g = 0i128;
        let mut left_h = 0i128;

        for (pos, pair) in sorted.windows(2).enumerate() {
            let row = pair[0];
            left_g += self.gradients[row] as i128;
            left_h += self.hessians[row] as i128;

            let value = self.features[row][feature_idx];
            if value != self.features[pair[1]][feature_idx] {
                boundaries.push(Boundary {
                    threshold: value,
                    left_count: pos + 1,
                    left_g,
                    left_h,
                });
            }
        }

        let limit = self.config.max_thresholds.max(1);
        if boundaries.len() <= limit {
            return boundaries;
        }

        let len = boundaries.len();
        (0..limit).map(|i| boundaries[i * len / limit]).collect()
    }

    fn sums(&self, rows: &[usize]) -> (i128, i128) {
        rows.iter().fold((0i128, 0i128), |(g, h), &row| {
            (g + self.gradients[row] as i128, h + self.hessians[row] as i128)
        })
    }

    /// Optimal leaf value `-G/H`, at target scale
    fn leaf_value(&self, rows: &[usize]) -> i64 {
        let (sum_g, sum_h) = self.sums(rows);
        if sum_h == 0 {
            return 0;
        }

        let value = -(sum_g * UNIT_HESSIAN as i128) / sum_h;
        value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

/// Split score `G²/H` (zero for an empty side)
fn score(g: i128, h: i128) -> i128 {
    if h <= 0 {
        return 0;
    }
    g.saturating_mul(g) / h
}
