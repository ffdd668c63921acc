//! Regression trees grown level by level on gradient statistics.
//!
//! # Split search
//!
//! Every feature keeps its rows presorted by value (missing values left
//! out). Growing one level scans each sorted column once, accumulating
//! gradient and hessian sums per open node, and scores a candidate split
//! between every pair of adjacent distinct values:
//!
//! `gain = ½ (G_L²/(H_L+λ) + G_R²/(H_R+λ) − G²/(H+λ)) − γ`
//!
//! Rows with a missing value are tried on both sides; the better side is
//! stored as the node's default direction.
//!
//! # Traversal
//!
//! - `x < threshold` goes left, otherwise right
//! - `NaN` follows `default_left`

use crate::config::BoosterConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A node of a [`RegressionTree`]. Children are indices into the node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        /// Direction taken by a missing value
        default_left: bool,
        /// Loss reduction achieved by this split
        gain: f64,
        left: usize,
        right: usize,
    },
}

/// One boosted tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Walk from the root to a leaf and return its (already shrunk) value.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                    ..
                } => {
                    let x = row.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if goes_left(x, *threshold, *default_left) {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

#[inline]
fn goes_left(x: f64, threshold: f64, default_left: bool) -> bool {
    if x.is_nan() { default_left } else { x < threshold }
}

/// Column-major copy of the training matrix plus, per feature, the row
/// indices that have a value, sorted ascending by that value.
pub(crate) struct SortedColumns {
    columns: Vec<Vec<f64>>,
    order: Vec<Vec<usize>>,
}

impl SortedColumns {
    pub(crate) fn new(rows: &[Vec<f64>], n_features: usize) -> Self {
        let columns: Vec<Vec<f64>> = (0..n_features)
            .into_par_iter()
            .map(|f| rows.iter().map(|row| row[f]).collect())
            .collect();
        let order = columns
            .par_iter()
            .map(|column| {
                let mut idx: Vec<usize> =
                    (0..column.len()).filter(|&r| !column[r].is_nan()).collect();
                // stable: equal values stay in row order
                idx.sort_by(|&a, &b| column[a].total_cmp(&column[b]));
                idx
            })
            .collect();
        Self { columns, order }
    }

    #[inline]
    fn value(&self, feature: usize, row: usize) -> f64 {
        self.columns[feature][row]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct GradStats {
    grad: f64,
    hess: f64,
}

impl GradStats {
    fn add(&mut self, grad: f64, hess: f64) {
        self.grad += grad;
        self.hess += hess;
    }

    fn plus(self, other: GradStats) -> GradStats {
        GradStats {
            grad: self.grad + other.grad,
            hess: self.hess + other.hess,
        }
    }

    fn minus(self, other: GradStats) -> GradStats {
        GradStats {
            grad: self.grad - other.grad,
            hess: self.hess - other.hess,
        }
    }

    // An empty node with no regularisation has nothing to weigh: 0, not NaN.
    fn score(&self, lambda: f64) -> f64 {
        let denominator = self.hess + lambda;
        if denominator > 0.0 {
            self.grad * self.grad / denominator
        } else {
            0.0
        }
    }

    fn weight(&self, lambda: f64) -> f64 {
        let denominator = self.hess + lambda;
        if denominator > 0.0 {
            -self.grad / denominator
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    default_left: bool,
    gain: f64,
    left: GradStats,
    right: GradStats,
}

/// Grows one tree per call against fixed presorted columns.
pub(crate) struct TreeGrower<'a> {
    columns: &'a SortedColumns,
    config: &'a BoosterConfig,
}

impl<'a> TreeGrower<'a> {
    pub(crate) fn new(columns: &'a SortedColumns, config: &'a BoosterConfig) -> Self {
        Self { columns, config }
    }

    /// Grow a tree on the rows flagged in `sampled`, considering only
    /// `features` (sorted ascending).
    pub(crate) fn grow(
        &self,
        grad: &[f64],
        hess: &[f64],
        sampled: &[bool],
        features: &[usize],
    ) -> RegressionTree {
        // Row -> index of its open node in `frontier`, None once it is in a final leaf
        let mut position: Vec<Option<usize>> =
            sampled.iter().map(|&s| s.then_some(0)).collect();

        let mut root = GradStats::default();
        for (r, _) in sampled.iter().enumerate().filter(|(_, s)| **s) {
            root.add(grad[r], hess[r]);
        }

        let mut nodes = vec![self.leaf(root)];
        let mut frontier: Vec<(usize, GradStats)> = vec![(0, root)];

        for _ in 0..self.config.max_depth {
            if frontier.is_empty() {
                break;
            }

            let best = self.find_splits(&position, grad, hess, features, &frontier);

            let mut next = Vec::new();
            // open-node index -> (split, index of its left child in `next`)
            let mut routes: Vec<Option<(SplitCandidate, usize)>> = vec![None; frontier.len()];
            for (k, split) in best.into_iter().enumerate() {
                let Some(split) = split else { continue };
                let left = nodes.len();
                nodes.push(self.leaf(split.left));
                let right = nodes.len();
                nodes.push(self.leaf(split.right));
                nodes[frontier[k].0] = Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    default_left: split.default_left,
                    gain: split.gain,
                    left,
                    right,
                };
                routes[k] = Some((split, next.len()));
                next.push((left, split.left));
                next.push((right, split.right));
            }

            for (r, slot) in position.iter_mut().enumerate() {
                *slot = slot.and_then(|k| routes[k]).map(|(split, left)| {
                    let x = self.columns.value(split.feature, r);
                    if goes_left(x, split.threshold, split.default_left) {
                        left
                    } else {
                        left + 1
                    }
                });
            }
            frontier = next;
        }

        RegressionTree::from_nodes(nodes)
    }

    fn leaf(&self, stats: GradStats) -> Node {
        Node::Leaf {
            value: stats.weight(self.config.lambda) * self.config.learning_rate,
        }
    }

    /// Best split per open node. Features are scanned in parallel and
    /// reduced in feature order, so ties go to the lower feature index.
    fn find_splits(
        &self,
        position: &[Option<usize>],
        grad: &[f64],
        hess: &[f64],
        features: &[usize],
        frontier: &[(usize, GradStats)],
    ) -> Vec<Option<SplitCandidate>> {
        let per_feature: Vec<Vec<Option<SplitCandidate>>> = features
            .par_iter()
            .map(|&f| self.scan_feature(f, position, grad, hess, frontier))
            .collect();

        let mut best: Vec<Option<SplitCandidate>> = vec![None; frontier.len()];
        for candidates in per_feature {
            for (slot, candidate) in best.iter_mut().zip(candidates) {
                if let Some(c) = candidate {
                    if slot.is_none_or(|b| c.gain > b.gain) {
                        *slot = Some(c);
                    }
                }
            }
        }
        best
    }

    fn scan_feature(
        &self,
        feature: usize,
        position: &[Option<usize>],
        grad: &[f64],
        hess: &[f64],
        frontier: &[(usize, GradStats)],
    ) -> Vec<Option<SplitCandidate>> {
        let order = &self.columns.order[feature];
        let n_open = frontier.len();

        let mut present = vec![GradStats::default(); n_open];
        for &r in order {
            if let Some(k) = position[r] {
                present[k].add(grad[r], hess[r]);
            }
        }

        let mut left = vec![GradStats::default(); n_open];
        let mut last: Vec<Option<f64>> = vec![None; n_open];
        let mut best: Vec<Option<SplitCandidate>> = vec![None; n_open];

        for &r in order {
            let Some(k) = position[r] else { continue };
            let x = self.columns.value(feature, r);
            if let Some(prev) = last[k] {
                if x > prev {
                    let mid = prev + (x - prev) / 2.0;
                    let threshold = if mid > prev { mid } else { x };
                    self.consider(
                        &mut best[k],
                        feature,
                        threshold,
                        left[k],
                        present[k],
                        frontier[k].1,
                    );
                }
            }
            left[k].add(grad[r], hess[r]);
            last[k] = Some(x);
        }

        // Present vs missing: every value goes left, missing goes right.
        // f64::MAX rather than infinity so the threshold survives JSON.
        for k in 0..n_open {
            if last[k].is_some() {
                let missing = frontier[k].1.minus(present[k]);
                if missing.hess > 0.0 {
                    self.try_candidate(
                        &mut best[k],
                        feature,
                        f64::MAX,
                        false,
                        present[k],
                        missing,
                    );
                }
            }
        }
        best
    }

    /// Score a threshold with the missing rows sent right, then left.
    fn consider(
        &self,
        best: &mut Option<SplitCandidate>,
        feature: usize,
        threshold: f64,
        left: GradStats,
        present: GradStats,
        total: GradStats,
    ) {
        self.try_candidate(best, feature, threshold, false, left, total.minus(left));

        let missing = total.minus(present);
        if missing.hess > 0.0 {
            self.try_candidate(
                best,
                feature,
                threshold,
                true,
                left.plus(missing),
                present.minus(left),
            );
        }
    }

    fn try_candidate(
        &self,
        best: &mut Option<SplitCandidate>,
        feature: usize,
        threshold: f64,
        default_left: bool,
        left: GradStats,
        right: GradStats,
    ) {
        let min_weight = self.config.min_child_weight;
        if left.hess < min_weight || right.hess < min_weight {
            return;
        }

        let lambda = self.config.lambda;
        let parent = left.plus(right);
        let gain = 0.5 * (left.score(lambda) + right.score(lambda) - parent.score(lambda))
            - self.config.gamma;
        if gain <= 0.0 {
            return;
        }

        if best.is_none_or(|b| gain > b.gain) {
            *best = Some(SplitCandidate {
                feature,
                threshold,
                default_left,
                gain,
                left,
                right,
            });
        }
    }
}
