//! Dual-tree radial pair counting.
//!
//! Given two built [`KdTree`]s and a sorted vector of query radii,
//! [`count_neighbors`] computes, for every radius, how many ordered pairs
//! of points (one from each tree) lie within that radius of each other;
//! [`count_neighbors_weighted`] computes the weighted sum instead. One
//! recursive descent over both trees serves every radius at once: node
//! pairs whose bounding rectangles are certainly within (or certainly
//! beyond) a radius are credited (or skipped) wholesale, and only the
//! undecided window of radii is carried further down.
//!
//! When that window is large relative to a node pair's size, the descent
//! switches from cumulative accumulation (one increment per radius per
//! pair) to per-bin accumulation (one increment per pair, plus a final
//! prefix sum); `convolve_thresh` tunes the crossover.
//!
//! ## Example
//!
//! ```
//! use paircount::{count_neighbors, KdTreeBuilder};
//!
//! let mut builder = KdTreeBuilder::new(2);
//! for p in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]] {
//!     builder.add(&p)?;
//! }
//! let tree = builder.finish()?;
//!
//! let r = [0.5, 1.0, 1.5, 2.0];
//! let mut counts = [0u64; 4];
//! count_neighbors(&tree, &tree, &r, &mut counts, 2.0, 1.0)?;
//! assert_eq!(counts, [4, 12, 16, 16]);
//! # Ok::<(), paircount::PairCountError>(())
//! ```

mod search;
mod traverse;
mod weights;

pub use search::{first_ge, first_gt};
pub use weights::TreeWeights;

use crate::error::{PairCountError, Result};
use crate::kdtree::KdTree;
use crate::metric::{Flat, MinMax, PInf, Pp, Wrapped, P1, P2};
use crate::rect::{RectRectTracker, Rectangle};
use traverse::CountContext;
use weights::{Unweighted, WeightData, WeightPolicy, Weighted};

/// Count, for every radius in `r`, the ordered pairs of points
/// `(i in a, j in b)` within Minkowski-p distance `r[l]` of each other.
///
/// `results` must have the same length as `r` and be zeroed by the caller;
/// the query only adds. `r` must be sorted ascending and non-negative;
/// `p` must be at least 1 (use `f64::INFINITY` for the sup norm);
/// `convolve_thresh` must be positive (1.0 is a reasonable default).
/// Periodic trees wrap distances; both trees must agree on
/// dimensionality and periodic box.
pub fn count_neighbors(
    a: &KdTree,
    b: &KdTree,
    r: &[f64],
    results: &mut [u64],
    p: f64,
    convolve_thresh: f64,
) -> Result<()> {
    validate(a, b, r, results.len(), p, convolve_thresh)?;
    dispatch::<Unweighted>(a, b, WeightData::default(), r, results, p, convolve_thresh)
}

/// Weighted variant of [`count_neighbors`]: every pair contributes the
/// product of its two point weights instead of 1.
///
/// A side passed as `None` contributes a factor of 1 per point. A side's
/// [`TreeWeights`] carries both the per-point weights and the per-node
/// aggregates from [`KdTree::build_weights`]; the node aggregates must be
/// consistent with the point weights for the counts to be meaningful.
#[allow(clippy::too_many_arguments)]
pub fn count_neighbors_weighted(
    a: &KdTree,
    b: &KdTree,
    a_weights: Option<TreeWeights<'_>>,
    b_weights: Option<TreeWeights<'_>>,
    r: &[f64],
    results: &mut [f64],
    p: f64,
    convolve_thresh: f64,
) -> Result<()> {
    validate(a, b, r, results.len(), p, convolve_thresh)?;
    validate_weights(a, a_weights, "first")?;
    validate_weights(b, b_weights, "second")?;
    let weights = WeightData {
        first: a_weights,
        second: b_weights,
    };
    dispatch::<Weighted>(a, b, weights, r, results, p, convolve_thresh)
}

fn validate(
    a: &KdTree,
    b: &KdTree,
    r: &[f64],
    results_len: usize,
    p: f64,
    convolve_thresh: f64,
) -> Result<()> {
    if a.dims() != b.dims() {
        return Err(PairCountError::Precondition(format!(
            "Trees of {} and {} dimensions cannot be counted against each other.",
            a.dims(),
            b.dims()
        )));
    }
    match (a.boxsize(), b.boxsize()) {
        (None, None) => {}
        (Some(ba), Some(bb)) if ba == bb => {}
        _ => {
            return Err(PairCountError::Precondition(
                "The two trees disagree on the periodic box.".to_string(),
            ))
        }
    }
    if results_len != r.len() {
        return Err(PairCountError::Precondition(format!(
            "Got {} result slots for {} radii.",
            results_len,
            r.len()
        )));
    }
    if !(p >= 1.0) {
        return Err(PairCountError::Precondition(format!(
            "Minkowski exponent must be at least 1 or infinite, got {}.",
            p
        )));
    }
    if !(convolve_thresh > 0.0) {
        return Err(PairCountError::Precondition(format!(
            "convolve_thresh must be positive, got {}.",
            convolve_thresh
        )));
    }
    if let Some(&first) = r.first() {
        if !(first >= 0.0) {
            return Err(PairCountError::Precondition(
                "Radii must be non-negative.".to_string(),
            ));
        }
    }
    if r.windows(2).any(|w| !(w[0] <= w[1])) {
        return Err(PairCountError::Precondition(
            "Radii must be sorted ascending.".to_string(),
        ));
    }
    Ok(())
}

fn validate_weights(tree: &KdTree, weights: Option<TreeWeights<'_>>, side: &str) -> Result<()> {
    if let Some(tw) = weights {
        if tw.points.len() != tree.num_items() {
            return Err(PairCountError::Precondition(format!(
                "Got {} point weights for the {} tree of {} points.",
                tw.points.len(),
                side,
                tree.num_items()
            )));
        }
        if tw.nodes.len() != tree.num_nodes() {
            return Err(PairCountError::Precondition(format!(
                "Got {} node weights for the {} tree of {} nodes.",
                tw.nodes.len(),
                side,
                tree.num_nodes()
            )));
        }
    }
    Ok(())
}

/// Radii converted into the metric's internal space.
fn powered(r: &[f64], p: f64) -> Vec<f64> {
    if p == 2.0 {
        r.iter().map(|&v| v * v).collect()
    } else if p == 1.0 || p.is_infinite() {
        r.to_vec()
    } else {
        r.iter().map(|&v| v.powf(p)).collect()
    }
}

/// Select the monomorphized traversal for (periodic?, p) and run it.
fn dispatch<W: WeightPolicy>(
    a: &KdTree,
    b: &KdTree,
    weights: WeightData<'_>,
    r: &[f64],
    results: &mut [W::Value],
    p: f64,
    convolve_thresh: f64,
) -> Result<()> {
    if a.is_empty() || b.is_empty() {
        return Ok(());
    }
    let rp = powered(r, p);
    match a.boxsize() {
        None => {
            if p == 2.0 {
                run::<_, W>(&P2(Flat), a, b, weights, &rp, results, convolve_thresh)
            } else if p == 1.0 {
                run::<_, W>(&P1(Flat), a, b, weights, &rp, results, convolve_thresh)
            } else if p.is_infinite() {
                run::<_, W>(&PInf(Flat), a, b, weights, &rp, results, convolve_thresh)
            } else {
                let metric = Pp { geom: Flat, p };
                run::<_, W>(&metric, a, b, weights, &rp, results, convolve_thresh)
            }
        }
        Some(boxsize) => {
            let geom = Wrapped::new(boxsize);
            if p == 2.0 {
                run::<_, W>(&P2(geom), a, b, weights, &rp, results, convolve_thresh)
            } else if p == 1.0 {
                run::<_, W>(&P1(geom), a, b, weights, &rp, results, convolve_thresh)
            } else if p.is_infinite() {
                run::<_, W>(&PInf(geom), a, b, weights, &rp, results, convolve_thresh)
            } else {
                let metric = Pp { geom, p };
                run::<_, W>(&metric, a, b, weights, &rp, results, convolve_thresh)
            }
        }
    }
}

fn run<M: MinMax, W: WeightPolicy>(
    metric: &M,
    a: &KdTree,
    b: &KdTree,
    weights: WeightData<'_>,
    r: &[f64],
    results: &mut [W::Value],
    convolve_thresh: f64,
) -> Result<()> {
    let rect1 = Rectangle::new(a.mins().to_vec(), a.maxes().to_vec());
    let rect2 = Rectangle::new(b.mins().to_vec(), b.maxes().to_vec());
    let mut tracker = RectRectTracker::new(metric, rect1, rect2);
    if !tracker.min_distance().is_finite() || !tracker.max_distance().is_finite() {
        return Err(PairCountError::Metric(
            "Non-finite distance bounds between the root rectangles.".to_string(),
        ));
    }
    let ctx = CountContext {
        tree1: a,
        tree2: b,
        weights,
        r,
        metric,
        convolve_thresh,
    };
    ctx.traverse::<W>(
        0,
        r.len(),
        results,
        KdTree::ROOT,
        KdTree::ROOT,
        &mut tracker,
        false,
    )
}
