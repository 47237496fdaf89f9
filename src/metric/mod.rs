//! Minkowski distance plug-ins for the counting queries.
//!
//! A metric works in an *internal space* chosen so that per-axis
//! contributions combine cheaply: the p-th power of the distance for
//! finite p, the plain coordinate-wise maximum for p = ∞. Radii are
//! converted into the same space once, by the driver, so the traversal
//! never takes a root.
//!
//! Implementations compose a norm ([`P1`], [`P2`], [`PInf`], [`Pp`]) with
//! an axis geometry ([`Flat`] or [`Wrapped`] for periodic boxes), giving
//! the eight monomorphized metrics the counting driver selects between.

mod minkowski;
mod periodic;

pub use minkowski::{AxisGeom, Flat, P1, P2, PInf, Pp};
pub use periodic::Wrapped;

use crate::rect::Rectangle;

/// Point-to-point distances and rectangle-to-rectangle distance bounds
/// under one metric.
///
/// Implementations are selected once per query and monomorphized into the
/// traversal; nothing dispatches dynamically in the brute-force loop.
pub trait MinMax {
    /// Whether axis contributions sum (finite p) or take the
    /// coordinate-wise max (p = ∞). Governs the tracker's O(1) updates.
    const AXES_ADD: bool;

    /// Distance between two points in the metric's internal space.
    ///
    /// May return any value greater than `upper_bound` as soon as the
    /// partial accumulation exceeds it; monotone per-axis accumulation
    /// makes the short-circuit safe.
    fn distance_p(&self, a: &[f64], b: &[f64], upper_bound: f64) -> f64;

    /// Min/max contribution of `axis` to the distance between two
    /// rectangles, in internal space.
    fn interval_p(&self, rect1: &Rectangle, rect2: &Rectangle, axis: usize) -> (f64, f64);

    /// Min/max distance between two rectangles, in internal space.
    fn rect_rect_p(&self, rect1: &Rectangle, rect2: &Rectangle) -> (f64, f64) {
        let mut min = 0.0;
        let mut max = 0.0;
        for axis in 0..rect1.dims() {
            let (lo, hi) = self.interval_p(rect1, rect2, axis);
            if Self::AXES_ADD {
                min += lo;
                max += hi;
            } else {
                min = f64::max(min, lo);
                max = f64::max(max, hi);
            }
        }
        (min, max)
    }
}
