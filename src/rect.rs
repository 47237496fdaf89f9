//! Axis-aligned rectangles and the rect–rect distance tracker driving the
//! dual-tree descent.

use tinyvec::TinyVec;

use crate::metric::MinMax;

/// An axis-aligned hyperrectangle in R^m.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    mins: Vec<f64>,
    maxes: Vec<f64>,
}

impl Rectangle {
    pub fn new(mins: Vec<f64>, maxes: Vec<f64>) -> Self {
        assert_eq!(mins.len(), maxes.len());
        Self { mins, maxes }
    }

    pub fn dims(&self) -> usize {
        self.mins.len()
    }

    #[inline]
    pub fn min(&self, axis: usize) -> f64 {
        self.mins[axis]
    }

    #[inline]
    pub fn max(&self, axis: usize) -> f64 {
        self.maxes[axis]
    }
}

/// Which of the two tracked rectangles a push applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    First,
    Second,
}

#[derive(Debug, Clone, Copy, Default)]
struct SavedFrame {
    side: Side,
    axis: usize,
    min_along: f64,
    max_along: f64,
    min_distance: f64,
    max_distance: f64,
}

/// Maintains the tightest known distance interval between two rectangles
/// as they are split during a dual-tree descent.
///
/// Every point pair drawn from the two current rectangles satisfies
/// `min_distance <= d <= max_distance` in the metric's internal space.
/// Pushes shrink one rectangle along one axis and must be popped in LIFO
/// order; `pop` restores the previous bounds and distances exactly.
#[derive(Debug)]
pub struct RectRectTracker<'a, M: MinMax> {
    metric: &'a M,
    rect1: Rectangle,
    rect2: Rectangle,
    min_distance: f64,
    max_distance: f64,
    // the stack follows the recursion depth, so it stays shallow
    stack: TinyVec<[SavedFrame; 16]>,
}

impl<'a, M: MinMax> RectRectTracker<'a, M> {
    /// The initial distance interval is derived from the rectangles
    /// themselves, not supplied by the caller.
    pub fn new(metric: &'a M, rect1: Rectangle, rect2: Rectangle) -> Self {
        let (min_distance, max_distance) = metric.rect_rect_p(&rect1, &rect2);
        Self {
            metric,
            rect1,
            rect2,
            min_distance,
            max_distance,
            stack: TinyVec::new(),
        }
    }

    #[inline]
    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }

    #[inline]
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Shrink `side` to the half below `split` along `axis`.
    pub fn push_less_of(&mut self, side: Side, axis: usize, split: f64) {
        self.push(side, axis, split, true);
    }

    /// Shrink `side` to the half above `split` along `axis`.
    pub fn push_greater_of(&mut self, side: Side, axis: usize, split: f64) {
        self.push(side, axis, split, false);
    }

    fn push(&mut self, side: Side, axis: usize, split: f64, less: bool) {
        let (min_along, max_along) = match side {
            Side::First => (self.rect1.mins[axis], self.rect1.maxes[axis]),
            Side::Second => (self.rect2.mins[axis], self.rect2.maxes[axis]),
        };
        self.stack.push(SavedFrame {
            side,
            axis,
            min_along,
            max_along,
            min_distance: self.min_distance,
            max_distance: self.max_distance,
        });

        // for additive norms, only this axis' contribution changes
        if M::AXES_ADD {
            let (lo, hi) = self.metric.interval_p(&self.rect1, &self.rect2, axis);
            self.min_distance -= lo;
            self.max_distance -= hi;
        }

        let rect = match side {
            Side::First => &mut self.rect1,
            Side::Second => &mut self.rect2,
        };
        if less {
            rect.maxes[axis] = split;
        } else {
            rect.mins[axis] = split;
        }

        if M::AXES_ADD {
            let (lo, hi) = self.metric.interval_p(&self.rect1, &self.rect2, axis);
            self.min_distance += lo;
            self.max_distance += hi;
        } else {
            // the sup norm can't be updated per axis
            let (lo, hi) = self.metric.rect_rect_p(&self.rect1, &self.rect2);
            self.min_distance = lo;
            self.max_distance = hi;
        }
    }

    /// Undo the most recent push.
    pub fn pop(&mut self) {
        let frame = self.stack.pop().expect("tracker stack underflow");
        let rect = match frame.side {
            Side::First => &mut self.rect1,
            Side::Second => &mut self.rect2,
        };
        rect.mins[frame.axis] = frame.min_along;
        rect.maxes[frame.axis] = frame.max_along;
        self.min_distance = frame.min_distance;
        self.max_distance = frame.max_distance;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::metric::{Flat, P2, PInf};

    fn unit_rects() -> (Rectangle, Rectangle) {
        (
            Rectangle::new(vec![0.0, 0.0], vec![1.0, 1.0]),
            Rectangle::new(vec![2.0, 0.0], vec![3.0, 1.0]),
        )
    }

    #[test]
    fn initial_distances_come_from_the_rectangles() {
        let metric = P2(Flat);
        let (r1, r2) = unit_rects();
        let tracker = RectRectTracker::new(&metric, r1, r2);
        assert_eq!(tracker.min_distance(), 1.0);
        assert_eq!(tracker.max_distance(), 10.0);
    }

    #[test]
    fn push_tightens_and_pop_restores() {
        let metric = P2(Flat);
        let (r1, r2) = unit_rects();
        let mut tracker = RectRectTracker::new(&metric, r1, r2);

        tracker.push_less_of(Side::Second, 0, 2.5);
        assert_eq!(tracker.min_distance(), 1.0);
        assert_eq!(tracker.max_distance(), 7.25);

        tracker.push_greater_of(Side::First, 0, 0.5);
        assert_eq!(tracker.min_distance(), 1.0);
        assert_eq!(tracker.max_distance(), 5.0);

        tracker.pop();
        assert_eq!(tracker.min_distance(), 1.0);
        assert_eq!(tracker.max_distance(), 7.25);

        tracker.pop();
        assert_eq!(tracker.min_distance(), 1.0);
        assert_eq!(tracker.max_distance(), 10.0);
    }

    #[test]
    fn sup_norm_recomputes_on_push() {
        let metric = PInf(Flat);
        let (r1, r2) = unit_rects();
        let mut tracker = RectRectTracker::new(&metric, r1, r2);
        assert_eq!(tracker.min_distance(), 1.0);
        assert_eq!(tracker.max_distance(), 3.0);

        tracker.push_less_of(Side::Second, 0, 2.5);
        assert_eq!(tracker.min_distance(), 1.0);
        assert_eq!(tracker.max_distance(), 2.5);
        tracker.pop();
        assert_eq!(tracker.max_distance(), 3.0);
    }

    #[test]
    fn bounds_contain_point_distances_through_a_descent() {
        let metric = P2(Flat);
        // points the rectangles were drawn around
        let first = [[0.2, 0.9], [0.8, 0.1]];
        let second = [[2.1, 0.5], [2.9, 0.95]];
        let (r1, r2) = unit_rects();
        let mut tracker = RectRectTracker::new(&metric, r1, r2);

        let check = |tracker: &RectRectTracker<'_, P2<Flat>>, pts2: &[[f64; 2]]| {
            for a in &first {
                for b in pts2 {
                    let d = metric.distance_p(a, b, f64::INFINITY);
                    assert!(tracker.min_distance() <= d + 1e-12);
                    assert!(d <= tracker.max_distance() + 1e-12);
                }
            }
        };

        check(&tracker, &second);
        // split the second rectangle at x = 2.5; both points of `second`
        // stay on their own side
        tracker.push_less_of(Side::Second, 0, 2.5);
        check(&tracker, &second[..1]);
        tracker.pop();
        tracker.push_greater_of(Side::Second, 0, 2.5);
        check(&tracker, &second[1..]);
        tracker.pop();
        check(&tracker, &second);
    }
}
