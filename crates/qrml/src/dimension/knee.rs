//! Kneedle knee detection for convex, decreasing curves.
//!
//! Reference: Satopää, Albrecht, Irwin, Raghavan, "Finding a 'Kneedle' in a
//! Haystack" (2011). Only the offline variant is needed: the first knee wins.

/// Index of the first knee of the convex, decreasing curve `y(i)` sampled at
/// `x = 0, 1, …, n-1`, or `None` when the curve has no knee.
///
/// `s` is the sensitivity: the difference curve must drop by more than
/// `s · mean(Δx)` below a local maximum before that maximum counts as a knee.
pub fn knee_convex_decreasing(y: &[f64], s: f64) -> Option<usize> {
    let n = y.len();
    if n < 2 {
        return None;
    }
    let (lo, hi) = y
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = hi - lo;
    if !(span.is_finite() && span > 0.0) {
        return None;
    }
    let step = 1.0 / (n - 1) as f64;

    // Normalise to the unit square, flip so the curve is concave increasing,
    // then measure its lift over the diagonal.
    let diff: Vec<f64> = y
        .iter()
        .enumerate()
        .map(|(i, &v)| (1.0 - (v - lo) / span) - i as f64 * step)
        .collect();

    let at = |i: isize| diff[i.clamp(0, n as isize - 1) as usize];
    let is_max = |i: usize| {
        let i = i as isize;
        at(i) >= at(i - 1) && at(i) >= at(i + 1)
    };
    let is_min = |i: usize| {
        let i = i as isize;
        at(i) <= at(i - 1) && at(i) <= at(i + 1)
    };

    let first_max = (0..n).find(|&i| is_max(i))?;
    let mut threshold = 0.0;
    let mut threshold_index = first_max;
    for i in first_max..n - 1 {
        if is_max(i) {
            threshold = diff[i] - s * step;
            threshold_index = i;
        }
        if is_min(i) {
            threshold = 0.0;
        }
        if diff[i + 1] < threshold {
            return Some(threshold_index);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharp_drop_after_first_component() {
        let y = [0.9, 0.05, 0.03, 0.02];
        assert_eq!(knee_convex_decreasing(&y, 0.1), Some(1));
        assert_eq!(knee_convex_decreasing(&y, 1.0), Some(1));
    }

    #[test]
    fn drop_after_second_component() {
        let y = [0.6, 0.3, 0.05, 0.03, 0.02];
        assert_eq!(knee_convex_decreasing(&y, 1.0), Some(2));
    }

    #[test]
    fn no_knee_on_two_points_or_flat_curves() {
        assert_eq!(knee_convex_decreasing(&[0.6, 0.4], 0.1), None);
        assert_eq!(knee_convex_decreasing(&[0.5, 0.5, 0.5], 0.1), None);
        assert_eq!(knee_convex_decreasing(&[1.0], 0.1), None);
        assert_eq!(knee_convex_decreasing(&[], 0.1), None);
    }
}
