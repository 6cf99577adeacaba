//! Trailing-window maximum over a series.
//!
//! A window ending at position `i` covers `i + 1 - window ..= i`. Positions
//! without a full window, and windows holding a NaN, have no maximum.

use std::collections::VecDeque;

/// Rolling maximum over a trailing window of `window` elements.
///
/// Runs in O(n) with a monotonic deque of candidate positions: the front is
/// always the position of the current window's maximum.
///
/// # Returns
///
/// One entry per input value. `None` for the first `window - 1` positions and
/// for every window containing a NaN. A `window` of 0 yields all `None`.
///
/// # Example
///
/// ```
/// use kde_cluster::processors::rolling::rolling_max;
///
/// let out = rolling_max(&[1.0, 3.0, 2.0, 0.5], 2);
/// assert_eq!(out, vec![None, Some(3.0), Some(3.0), Some(2.0)]);
/// ```
pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    if window == 0 {
        return vec![None; n];
    }

    let mut out = Vec::with_capacity(n);
    let mut maxdq: VecDeque<usize> = VecDeque::with_capacity(window.min(n));
    // Position of the most recent NaN, if any is still relevant.
    let mut last_nan: Option<usize> = None;

    for (i, &v) in values.iter().enumerate() {
        let start = (i + 1).saturating_sub(window);

        while maxdq.front().is_some_and(|&front| front < start) {
            maxdq.pop_front();
        }

        if v.is_nan() {
            last_nan = Some(i);
        } else {
            while let Some(&idx) = maxdq.back() {
                if values[idx] <= v {
                    maxdq.pop_back();
                } else {
                    break;
                }
            }
            maxdq.push_back(i);
        }

        let full = i + 1 >= window;
        let has_nan = last_nan.is_some_and(|p| p >= start);

        if full && !has_nan {
            out.push(maxdq.front().map(|&idx| values[idx]));
        } else {
            out.push(None);
        }
    }

    out
}

/// Maximum over the first `window` values, ignoring NaN.
///
/// Covers all values when there are fewer than `window`. Returns `None` when
/// the prefix has no comparable value.
pub fn window_max(values: &[f64], window: usize) -> Option<f64> {
    values
        .iter()
        .take(window)
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct O(n * w) reference.
    fn naive_rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
        (0..values.len())
            .map(|i| {
                if window == 0 || i + 1 < window {
                    return None;
                }
                let slice = &values[i + 1 - window..=i];
                if slice.iter().any(|v| v.is_nan()) {
                    None
                } else {
                    slice.iter().copied().reduce(f64::max)
                }
            })
            .collect()
    }

    #[test]
    fn test_rolling_max_basic() {
        let values = [1.0, 5.0, 2.0, 4.0, 3.0, 0.0, 0.0];
        let out = rolling_max(&values, 3);
        assert_eq!(
            out,
            vec![None, None, Some(5.0), Some(5.0), Some(4.0), Some(4.0), Some(3.0)]
        );
    }

    #[test]
    fn test_rolling_max_window_one_is_identity() {
        let values = [0.3, -1.0, 7.5];
        let out = rolling_max(&values, 1);
        assert_eq!(out, vec![Some(0.3), Some(-1.0), Some(7.5)]);
    }

    #[test]
    fn test_rolling_max_window_longer_than_series() {
        let out = rolling_max(&[1.0, 2.0], 5);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn test_rolling_max_zero_window_and_empty() {
        assert_eq!(rolling_max(&[1.0, 2.0], 0), vec![None, None]);
        assert!(rolling_max(&[], 3).is_empty());
    }

    #[test]
    fn test_rolling_max_nan_blocks_its_windows() {
        let values = [1.0, f64::NAN, 2.0, 3.0, 1.0];
        let out = rolling_max(&values, 2);
        assert_eq!(out, vec![None, None, None, Some(3.0), Some(3.0)]);
    }

    #[test]
    fn test_rolling_max_matches_naive() {
        // Deterministic pseudo-random series with plateaus and ties.
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let values: Vec<f64> = (0..400)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state % 50) as f64 / 7.0
            })
            .collect();

        for window in [1, 2, 3, 7, 16, 64, 399, 400, 401] {
            assert_eq!(
                rolling_max(&values, window),
                naive_rolling_max(&values, window),
                "window = {window}"
            );
        }
    }

    #[test]
    fn test_window_max() {
        assert_eq!(window_max(&[1.0, 4.0, 2.0, 9.0], 3), Some(4.0));
        assert_eq!(window_max(&[1.0, 4.0], 10), Some(4.0));
        assert_eq!(window_max(&[f64::NAN, 2.0], 2), Some(2.0));
        assert_eq!(window_max(&[f64::NAN], 1), None);
        assert_eq!(window_max(&[], 3), None);
    }
}
