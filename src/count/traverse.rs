use std::ops::Range;

use num_traits::Zero;

use crate::count::search::first_ge;
use crate::count::weights::{WeightData, WeightPolicy};
use crate::error::{PairCountError, Result};
use crate::kdtree::{KdTree, NodeKind};
use crate::metric::MinMax;
use crate::rect::{RectRectTracker, Side};

/// Shared, read-only state of one counting query.
pub(crate) struct CountContext<'a, M: MinMax> {
    pub(crate) tree1: &'a KdTree,
    pub(crate) tree2: &'a KdTree,
    pub(crate) weights: WeightData<'a>,
    /// Radii in the metric's internal space, sorted ascending.
    pub(crate) r: &'a [f64],
    pub(crate) metric: &'a M,
    pub(crate) convolve_thresh: f64,
}

impl<M: MinMax> CountContext<'_, M> {
    /// One frame of the dual-tree descent over the node pair
    /// `(node1, node2)`, restricted to the radius window `[start, end)`.
    ///
    /// In cumulative mode (`convolve` false) `results` is the caller's
    /// full-length buffer and every credited pair adds to each radius
    /// covering it. In per-bin mode `results` is the nearest enclosing
    /// switch frame's bin buffer and every pair adds to exactly one bin;
    /// the switch frame convolves on the way out.
    pub(crate) fn traverse<W: WeightPolicy>(
        &self,
        start: usize,
        end: usize,
        results: &mut [W::Value],
        node1: usize,
        node2: usize,
        tracker: &mut RectRectTracker<'_, M>,
        convolve: bool,
    ) -> Result<()> {
        let n1 = &self.tree1.nodes[node1];
        let n2 = &self.tree2.nodes[node2];

        // Radii below min_distance were already credited at an ancestor;
        // radii at or above max_distance cover every pair in this node
        // pair outright.
        let old_end = end;
        let start = first_ge(tracker.min_distance(), self.r, start, end);
        let end = first_ge(tracker.max_distance(), self.r, start, end);

        if !convolve {
            let nw = W::node_weight(&self.weights, node1, n1, node2, n2);
            for slot in &mut results[end..old_end] {
                *slot += nw;
            }

            // Too many live bins for the per-radius brute force: count each
            // pair into a single bin below this frame instead, and restore
            // the cumulative form with one prefix sum on the way out.
            let pairs = n1.children as f64 * n2.children as f64;
            if (end - start) as f64 > self.convolve_thresh * pairs {
                let mut bins = zeroed::<W::Value>(end + 1)?;
                if end > start {
                    self.descend::<W>(start, end, &mut bins, node1, node2, tracker, true)?;
                    for l in start..end {
                        let below = bins[l];
                        bins[l + 1] += below;
                    }
                    for (slot, &bin) in results[start..end].iter_mut().zip(&bins[start..end]) {
                        *slot += bin;
                    }
                }
                return Ok(());
            }

            if end > start {
                self.descend::<W>(start, end, results, node1, node2, tracker, false)?;
            }
            return Ok(());
        }

        // Per-bin mode: a collapsed window means every pair in this node
        // pair lands in the same bin.
        if end == start {
            results[start] += W::node_weight(&self.weights, node1, n1, node2, n2);
            return Ok(());
        }
        self.descend::<W>(start, end, results, node1, node2, tracker, true)
    }

    fn descend<W: WeightPolicy>(
        &self,
        start: usize,
        end: usize,
        results: &mut [W::Value],
        node1: usize,
        node2: usize,
        tracker: &mut RectRectTracker<'_, M>,
        convolve: bool,
    ) -> Result<()> {
        let n1 = &self.tree1.nodes[node1];
        let n2 = &self.tree2.nodes[node2];
        match (&n1.kind, &n2.kind) {
            (
                &NodeKind::Leaf {
                    start: s1,
                    end: e1,
                },
                &NodeKind::Leaf {
                    start: s2,
                    end: e2,
                },
            ) => {
                self.brute_force::<W>(start, end, results, s1..e1, s2..e2, tracker, convolve);
                Ok(())
            }
            (
                NodeKind::Leaf { .. },
                &NodeKind::Inner {
                    axis,
                    split,
                    less,
                    greater,
                },
            ) => {
                tracker.push_less_of(Side::Second, axis, split);
                self.traverse::<W>(start, end, results, node1, less, tracker, convolve)?;
                tracker.pop();

                tracker.push_greater_of(Side::Second, axis, split);
                self.traverse::<W>(start, end, results, node1, greater, tracker, convolve)?;
                tracker.pop();
                Ok(())
            }
            (
                &NodeKind::Inner {
                    axis,
                    split,
                    less,
                    greater,
                },
                NodeKind::Leaf { .. },
            ) => {
                tracker.push_less_of(Side::First, axis, split);
                self.traverse::<W>(start, end, results, less, node2, tracker, convolve)?;
                tracker.pop();

                tracker.push_greater_of(Side::First, axis, split);
                self.traverse::<W>(start, end, results, greater, node2, tracker, convolve)?;
                tracker.pop();
                Ok(())
            }
            (
                &NodeKind::Inner {
                    axis: axis1,
                    split: split1,
                    less: less1,
                    greater: greater1,
                },
                &NodeKind::Inner {
                    axis: axis2,
                    split: split2,
                    less: less2,
                    greater: greater2,
                },
            ) => {
                tracker.push_less_of(Side::First, axis1, split1);
                tracker.push_less_of(Side::Second, axis2, split2);
                self.traverse::<W>(start, end, results, less1, less2, tracker, convolve)?;
                tracker.pop();

                tracker.push_greater_of(Side::Second, axis2, split2);
                self.traverse::<W>(start, end, results, less1, greater2, tracker, convolve)?;
                tracker.pop();
                tracker.pop();

                tracker.push_greater_of(Side::First, axis1, split1);
                tracker.push_less_of(Side::Second, axis2, split2);
                self.traverse::<W>(start, end, results, greater1, less2, tracker, convolve)?;
                tracker.pop();

                tracker.push_greater_of(Side::Second, axis2, split2);
                self.traverse::<W>(start, end, results, greater1, greater2, tracker, convolve)?;
                tracker.pop();
                tracker.pop();
                Ok(())
            }
        }
    }

    /// Brute force over the Cartesian product of two leaves.
    #[allow(clippy::too_many_arguments)]
    fn brute_force<W: WeightPolicy>(
        &self,
        start: usize,
        end: usize,
        results: &mut [W::Value],
        range1: Range<usize>,
        range2: Range<usize>,
        tracker: &RectRectTracker<'_, M>,
        convolve: bool,
    ) {
        let upper_bound = tracker.max_distance();
        for i in range1 {
            let pi = self.tree1.indices[i];
            let a = self.tree1.point(pi);
            for j in range2.clone() {
                let pj = self.tree2.indices[j];
                let b = self.tree2.point(pj);
                let d = self.metric.distance_p(a, b, upper_bound);
                if convolve {
                    // one bin per pair; pairs beyond the window's last
                    // radius fall into the absorbing slot at `end`
                    let l = first_ge(d, self.r, start, end);
                    results[l] += W::pair_weight(&self.weights, pi, pj);
                } else {
                    // testing d against every live radius beats collecting
                    // and sorting the pair distances
                    for l in start..end {
                        if d <= self.r[l] {
                            results[l] += W::pair_weight(&self.weights, pi, pj);
                        }
                    }
                }
            }
        }
    }
}

/// A zeroed per-bin buffer, allocated fallibly so exhaustion surfaces as
/// an error instead of an abort.
fn zeroed<V: Copy + Zero>(len: usize) -> Result<Vec<V>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| {
        PairCountError::Allocation(format!("per-bin buffer of {} entries", len))
    })?;
    buf.resize(len, V::zero());
    Ok(buf)
}
