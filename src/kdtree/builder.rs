use crate::error::{PairCountError, Result};
use crate::kdtree::index::{KdTree, Node, NodeKind};

/// Default leaf size in [`KdTreeBuilder::new`].
pub const DEFAULT_LEAF_SIZE: usize = 16;

/// A builder to create a [`KdTree`].
#[derive(Debug)]
pub struct KdTreeBuilder {
    dims: usize,
    leaf_size: usize,
    boxsize: Option<Vec<f64>>,
    data: Vec<f64>,
}

impl KdTreeBuilder {
    /// Create a new builder for points of the provided dimensionality,
    /// with the default leaf size.
    pub fn new(dims: usize) -> Self {
        Self::new_with_leaf_size(dims, DEFAULT_LEAF_SIZE)
    }

    /// Create a new builder with the provided dimensionality and leaf size.
    pub fn new_with_leaf_size(dims: usize, leaf_size: usize) -> Self {
        assert!(dims >= 1, "dims must be at least 1");
        assert!(leaf_size >= 1, "leaf size must be at least 1");
        Self {
            dims,
            leaf_size,
            boxsize: None,
            data: Vec::new(),
        }
    }

    /// Make the tree periodic with the provided per-axis box lengths.
    ///
    /// An axis length of zero leaves that axis non-periodic. Every point
    /// must lie in `[0, boxsize)` along each periodic axis; `finish`
    /// reports a violation as an error.
    pub fn with_boxsize(mut self, boxsize: Vec<f64>) -> Self {
        self.boxsize = Some(boxsize);
        self
    }

    /// Add a point to the tree.
    ///
    /// This returns a positional index that provides a lookup back into the
    /// original data.
    ///
    /// ## Errors
    ///
    /// - If the point's arity does not match the builder's dimensionality.
    #[inline]
    pub fn add(&mut self, point: &[f64]) -> Result<usize> {
        if point.len() != self.dims {
            return Err(PairCountError::Precondition(format!(
                "Got a point of {} coordinates when expected {}.",
                point.len(),
                self.dims
            )));
        }
        let index = self.data.len() / self.dims;
        self.data.extend_from_slice(point);
        Ok(index)
    }

    /// Consume this builder, performing the sliding-midpoint build and
    /// generating a [`KdTree`] ready for queries.
    pub fn finish(self) -> Result<KdTree> {
        let dims = self.dims;
        let num_items = self.data.len() / dims;

        if let Some(boxsize) = &self.boxsize {
            validate_boxsize(&self.data, dims, boxsize)?;
        }

        let mut mins = vec![0.0; dims];
        let mut maxes = vec![0.0; dims];
        if num_items > 0 {
            mins.copy_from_slice(&self.data[..dims]);
            maxes.copy_from_slice(&self.data[..dims]);
            for item in 1..num_items {
                for axis in 0..dims {
                    let c = self.data[item * dims + axis];
                    if c < mins[axis] {
                        mins[axis] = c;
                    }
                    if c > maxes[axis] {
                        maxes[axis] = c;
                    }
                }
            }
        }

        let mut indices: Vec<usize> = (0..num_items).collect();
        let mut nodes = Vec::new();
        let ctx = BuildCtx {
            data: &self.data,
            dims,
            leaf_size: self.leaf_size,
        };
        build_node(&ctx, &mut nodes, &mut indices, 0);

        Ok(KdTree {
            dims,
            data: self.data,
            indices,
            mins,
            maxes,
            boxsize: self.boxsize,
            nodes,
        })
    }
}

fn validate_boxsize(data: &[f64], dims: usize, boxsize: &[f64]) -> Result<()> {
    if boxsize.len() != dims {
        return Err(PairCountError::Precondition(format!(
            "Got a boxsize of {} axes when expected {}.",
            boxsize.len(),
            dims
        )));
    }
    for &length in boxsize {
        if !(length >= 0.0) {
            return Err(PairCountError::Precondition(
                "Periodic box lengths must be non-negative.".to_string(),
            ));
        }
    }
    for (axis, &length) in boxsize.iter().enumerate() {
        if length == 0.0 {
            continue;
        }
        for point in data.chunks_exact(dims) {
            let c = point[axis];
            if !(0.0 <= c && c < length) {
                return Err(PairCountError::Precondition(format!(
                    "Coordinate {} outside the periodic box [0, {}) on axis {}.",
                    c, length, axis
                )));
            }
        }
    }
    Ok(())
}

struct BuildCtx<'a> {
    data: &'a [f64],
    dims: usize,
    leaf_size: usize,
}

impl BuildCtx<'_> {
    #[inline]
    fn coord(&self, item: usize, axis: usize) -> f64 {
        self.data[item * self.dims + axis]
    }
}

/// Recursively kd-sort `indices` (a window of the tree's permutation
/// starting at `offset`) and append the subtree's nodes to the arena,
/// returning the subtree root's arena position.
fn build_node(ctx: &BuildCtx, nodes: &mut Vec<Node>, indices: &mut [usize], offset: usize) -> usize {
    let n = indices.len();
    let index = nodes.len();

    if n <= ctx.leaf_size {
        nodes.push(Node {
            children: n,
            kind: NodeKind::Leaf {
                start: offset,
                end: offset + n,
            },
        });
        return index;
    }

    // bounds of this range, to pick the widest axis
    let mut mins = vec![f64::INFINITY; ctx.dims];
    let mut maxes = vec![f64::NEG_INFINITY; ctx.dims];
    for &item in indices.iter() {
        for axis in 0..ctx.dims {
            let c = ctx.coord(item, axis);
            if c < mins[axis] {
                mins[axis] = c;
            }
            if c > maxes[axis] {
                maxes[axis] = c;
            }
        }
    }
    let mut axis = 0;
    let mut spread = maxes[0] - mins[0];
    for k in 1..ctx.dims {
        if maxes[k] - mins[k] > spread {
            axis = k;
            spread = maxes[k] - mins[k];
        }
    }

    // all points coincide (or are unorderable); an oversized leaf beats an
    // unsplittable inner node
    if !(spread > 0.0) {
        nodes.push(Node {
            children: n,
            kind: NodeKind::Leaf {
                start: offset,
                end: offset + n,
            },
        });
        return index;
    }

    // sliding midpoint rule: split at the middle of the bounds, then slide
    // the plane onto the nearest point if a side would come up empty
    let mut split = 0.5 * (mins[axis] + maxes[axis]);
    let mut lt = partition_indices(indices, |item| ctx.coord(item, axis) < split);
    if lt == 0 {
        split = mins[axis];
        lt = partition_indices(indices, |item| ctx.coord(item, axis) <= split);
    } else if lt == n {
        split = maxes[axis];
        lt = partition_indices(indices, |item| ctx.coord(item, axis) < split);
    }
    debug_assert!(lt > 0 && lt < n);

    // reserve the arena slot so the children land after their parent
    nodes.push(Node {
        children: n,
        kind: NodeKind::Leaf {
            start: offset,
            end: offset,
        },
    });
    let (left, right) = indices.split_at_mut(lt);
    let less = build_node(ctx, nodes, left, offset);
    let greater = build_node(ctx, nodes, right, offset + lt);
    nodes[index].kind = NodeKind::Inner {
        axis,
        split,
        less,
        greater,
    };
    index
}

/// Move the items satisfying `keep_left` to the front, returning their
/// count.
#[inline]
fn partition_indices(indices: &mut [usize], keep_left: impl Fn(usize) -> bool) -> usize {
    let mut lt = 0;
    for i in 0..indices.len() {
        if keep_left(indices[i]) {
            indices.swap(lt, i);
            lt += 1;
        }
    }
    lt
}
