use crate::error::{PairCountError, Result};

/// A node of the tree, stored in the tree's arena.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// Number of points in this subtree.
    pub(crate) children: usize,
    pub(crate) kind: NodeKind,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    /// Contiguous half-open range into the tree's index permutation.
    Leaf { start: usize, end: usize },
    /// Split along `axis` at `split`; arena indices of the two halves.
    Inner {
        axis: usize,
        split: f64,
        less: usize,
        greater: usize,
    },
}

/// An immutable k-d tree over points in R^m.
///
/// Built by [`KdTreeBuilder`][crate::kdtree::KdTreeBuilder]. Holds the flat
/// row-major point data, the kd-sorted index permutation, the per-axis
/// bounds, and the node arena (root at position 0). No method mutates the
/// tree after construction.
#[derive(Debug, Clone)]
pub struct KdTree {
    pub(crate) dims: usize,
    pub(crate) data: Vec<f64>,
    pub(crate) indices: Vec<usize>,
    pub(crate) mins: Vec<f64>,
    pub(crate) maxes: Vec<f64>,
    pub(crate) boxsize: Option<Vec<f64>>,
    pub(crate) nodes: Vec<Node>,
}

impl KdTree {
    pub(crate) const ROOT: usize = 0;

    /// Dimensionality of the points in this tree.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of points in this tree.
    pub fn num_items(&self) -> usize {
        self.indices.len()
    }

    /// Whether this tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of nodes in the tree's arena.
    ///
    /// Per-node weight arrays passed to the weighted query must have
    /// exactly this length; see [`KdTree::build_weights`].
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The flat row-major point data, in insertion order.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Per-axis minima over all points.
    pub fn mins(&self) -> &[f64] {
        &self.mins
    }

    /// Per-axis maxima over all points.
    pub fn maxes(&self) -> &[f64] {
        &self.maxes
    }

    /// The periodic box lengths, if this tree was built with one.
    pub fn boxsize(&self) -> Option<&[f64]> {
        self.boxsize.as_deref()
    }

    /// Coordinates of the point with positional index `item`.
    #[inline]
    pub(crate) fn point(&self, item: usize) -> &[f64] {
        &self.data[item * self.dims..][..self.dims]
    }

    /// Aggregate per-point weights over every subtree.
    ///
    /// Returns one weight per node, indexed by node arena position: a
    /// leaf's weight is the sum of its points' weights, an inner node's
    /// the sum of its two children's. This is the supported way to produce
    /// the node-weight array consumed by
    /// [`count_neighbors_weighted`][crate::count::count_neighbors_weighted].
    pub fn build_weights(&self, weights: &[f64]) -> Result<Vec<f64>> {
        if weights.len() != self.num_items() {
            return Err(PairCountError::Precondition(format!(
                "Got {} weights for a tree of {} points.",
                weights.len(),
                self.num_items()
            )));
        }
        let mut node_weights = vec![0.0; self.nodes.len()];
        self.sum_weights(Self::ROOT, weights, &mut node_weights);
        Ok(node_weights)
    }

    fn sum_weights(&self, node: usize, weights: &[f64], out: &mut [f64]) -> f64 {
        let total = match self.nodes[node].kind {
            NodeKind::Leaf { start, end } => {
                self.indices[start..end].iter().map(|&i| weights[i]).sum()
            }
            NodeKind::Inner { less, greater, .. } => {
                self.sum_weights(less, weights, out) + self.sum_weights(greater, weights, out)
            }
        };
        out[node] = total;
        total
    }
}
