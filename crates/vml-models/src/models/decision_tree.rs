//! Binary classification tree grown by exhaustive threshold search.
//!
//! Nodes are scored with the entropy of a majority classifier, summed over the
//! node's samples: `-sum_i p[t_i] * ln p[t_i]` where `p` is the node's class
//! distribution. A node with a single class scores 0. The split minimizing the
//! sum of both children's scores wins; no pruning, no minimum leaf size.
use crate::dataset::{check_labels_match, check_non_empty, check_point_dim, ClassLabels};
use crate::error::{Result, VmlError};
use crate::math::Array2;
use crate::models::model_trait::{Model, Prediction};

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Class distribution of the training samples that reached the leaf.
    Leaf(Vec<f64>),
    /// `x[feature] <= threshold` goes left, everything else right.
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn num_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 1,
            TreeNode::Split { left, right, .. } => left.num_leaves() + right.num_leaves(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecisionTree {
    num_classes: usize,
    dim: usize,
    root: Option<TreeNode>,
}

struct Builder<'a> {
    x: &'a Array2<f64>,
    labels: &'a [usize],
    num_classes: usize,
    num_features: usize,
}

impl Builder<'_> {
    fn class_distribution(&self, idx: &[usize]) -> Vec<f64> {
        let mut dist = vec![0.0; self.num_classes];
        for &i in idx {
            dist[self.labels[i]] += 1.0;
        }
        let n = idx.len() as f64;
        dist.iter_mut().for_each(|p| *p /= n);
        dist
    }

    fn majority_error(&self, idx: &[usize]) -> f64 {
        if idx.is_empty() {
            return 0.0;
        }
        let dist = self.class_distribution(idx);
        if dist.iter().any(|&p| p == 1.0) {
            return 0.0;
        }
        -idx
            .iter()
            .map(|&i| {
                let p = dist[self.labels[i]];
                p * p.ln()
            })
            .sum::<f64>()
    }

    fn partition(
        &self,
        idx: &[usize],
        feature: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        idx.iter()
            .copied()
            .partition(|&i| self.x[(i, feature)] <= threshold)
    }

    /// Best `(feature, threshold)` over every feature and every observed
    /// value; the first of equally good splits is kept.
    fn best_split(&self, idx: &[usize]) -> (usize, f64) {
        let mut best = (0, 0.0);
        let mut best_error = f64::INFINITY;
        for feature in 0..self.num_features {
            for &j in idx {
                let threshold = self.x[(j, feature)];
                let (left, right) = self.partition(idx, feature, threshold);
                let error = self.majority_error(&left) + self.majority_error(&right);
                if error < best_error {
                    best_error = error;
                    best = (feature, threshold);
                }
            }
        }
        best
    }

    /// A node whose best split leaves one side without samples becomes a leaf.
    fn build(&self, idx: &[usize], depth: usize) -> TreeNode {
        let dist = self.class_distribution(idx);
        if depth == 0 || self.majority_error(idx) == 0.0 {
            return TreeNode::Leaf(dist);
        }

        let (feature, threshold) = self.best_split(idx);
        let (left, right) = self.partition(idx, feature, threshold);
        if left.is_empty() || right.is_empty() {
            // no threshold separates these samples
            return TreeNode::Leaf(dist);
        }
        log::trace!(
            "tree split on feature {} at {} ({} | {})",
            feature,
            threshold,
            left.len(),
            right.len()
        );
        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(self.build(&left, depth - 1)),
            right: Box::new(self.build(&right, depth - 1)),
        }
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow a tree of depth at most `max_depth`, splitting only on the first
    /// `num_features` columns of `x`.
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        labels: &ClassLabels,
        max_depth: usize,
        num_features: usize,
    ) -> Result<()> {
        check_non_empty("DecisionTree::fit", x)?;
        check_labels_match("DecisionTree::fit", x, labels.len())?;
        if num_features == 0 || num_features > x.ncols() {
            return Err(VmlError::invalid(format!(
                "num_features must be in 1..={}, got {}",
                x.ncols(),
                num_features
            )));
        }

        let builder = Builder {
            x,
            labels: labels.labels(),
            num_classes: labels.num_classes(),
            num_features,
        };
        let all: Vec<usize> = (0..x.nrows()).collect();
        let root = builder.build(&all, max_depth);

        log::debug!(
            "decision tree grown: depth {}, {} leaves",
            root.depth(),
            root.num_leaves()
        );
        self.num_classes = labels.num_classes();
        self.dim = x.ncols();
        self.root = Some(root);
        Ok(())
    }

    fn root(&self) -> Result<&TreeNode> {
        self.root.as_ref().ok_or(VmlError::NotReady("decision tree"))
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn tree(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Class distribution stored at the leaf `x` falls into.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>> {
        let mut node = self.root()?;
        check_point_dim("DecisionTree::predict", self.dim, x)?;
        loop {
            match node {
                TreeNode::Leaf(p) => return Ok(p.clone()),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    /// Number of splits on the longest root-to-leaf path.
    pub fn depth(&self) -> Result<usize> {
        Ok(self.root()?.depth())
    }

    pub fn num_leaves(&self) -> Result<usize> {
        Ok(self.root()?.num_leaves())
    }
}

impl Model for DecisionTree {
    fn name(&self) -> &'static str {
        "decision_tree"
    }

    fn is_ready(&self) -> bool {
        self.root.is_some()
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.predict_proba(x).map(Prediction::Probabilities)
    }
}
