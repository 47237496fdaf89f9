use std::ops::AddAssign;

use num_traits::Zero;

use crate::kdtree::Node;

/// Per-point and per-node weights for one side of a weighted query.
///
/// `points` holds one weight per point, indexed by the point's positional
/// index; `nodes` holds the aggregate weight of every subtree, indexed by
/// node arena position, as produced by
/// [`KdTree::build_weights`][crate::kdtree::KdTree::build_weights].
#[derive(Debug, Clone, Copy)]
pub struct TreeWeights<'a> {
    pub points: &'a [f64],
    pub nodes: &'a [f64],
}

/// The optional weight bundles of both sides. A side without weights
/// contributes a factor of 1 per point and its subtree size per node.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WeightData<'a> {
    pub(crate) first: Option<TreeWeights<'a>>,
    pub(crate) second: Option<TreeWeights<'a>>,
}

/// Static weight dispatch: one traversal serves weighted and unweighted
/// queries by varying the policy and the result element type.
pub(crate) trait WeightPolicy {
    type Value: Copy + Zero + AddAssign;

    /// Aggregate weight of every pair between the two subtrees.
    fn node_weight(
        w: &WeightData<'_>,
        node1: usize,
        n1: &Node,
        node2: usize,
        n2: &Node,
    ) -> Self::Value;

    /// Weight of one specific pair of points, by positional index.
    fn pair_weight(w: &WeightData<'_>, i: usize, j: usize) -> Self::Value;
}

pub(crate) struct Unweighted;

impl WeightPolicy for Unweighted {
    type Value = u64;

    #[inline]
    fn node_weight(_w: &WeightData<'_>, _node1: usize, n1: &Node, _node2: usize, n2: &Node) -> u64 {
        n1.children as u64 * n2.children as u64
    }

    #[inline]
    fn pair_weight(_w: &WeightData<'_>, _i: usize, _j: usize) -> u64 {
        1
    }
}

pub(crate) struct Weighted;

impl WeightPolicy for Weighted {
    type Value = f64;

    #[inline]
    fn node_weight(w: &WeightData<'_>, node1: usize, n1: &Node, node2: usize, n2: &Node) -> f64 {
        let w1 = match &w.first {
            Some(tw) => tw.nodes[node1],
            None => n1.children as f64,
        };
        let w2 = match &w.second {
            Some(tw) => tw.nodes[node2],
            None => n2.children as f64,
        };
        w1 * w2
    }

    #[inline]
    fn pair_weight(w: &WeightData<'_>, i: usize, j: usize) -> f64 {
        let w1 = w.first.map_or(1.0, |tw| tw.points[i]);
        let w2 = w.second.map_or(1.0, |tw| tw.points[j]);
        w1 * w2
    }
}
