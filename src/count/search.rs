/// Index of the first radius in the window `r[start..end]` greater than or
/// equal to `v`, or `end` if there is none.
///
/// `r` must be sorted ascending within the window. An empty window returns
/// `start`.
#[inline]
pub fn first_ge(v: f64, r: &[f64], mut start: usize, mut end: usize) -> usize {
    if start >= end || v <= r[start] {
        return start;
    }
    while end > start + 1 {
        let mid = start + ((end - start) >> 1);
        if v <= r[mid] {
            end = mid;
        } else {
            start = mid;
        }
    }
    end
}

/// Index of the first radius in the window `r[start..end]` strictly
/// greater than `v`, or `end` if there is none.
#[inline]
pub fn first_gt(v: f64, r: &[f64], mut start: usize, mut end: usize) -> usize {
    if start >= end || v < r[start] {
        return start;
    }
    while end > start + 1 {
        let mid = start + ((end - start) >> 1);
        if v < r[mid] {
            end = mid;
        } else {
            start = mid;
        }
    }
    end
}
