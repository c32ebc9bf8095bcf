//! Correction functions for a Gaussian truncated at the draw margin
//!
//! `v` is the additive correction to the mean and `w` the multiplicative
//! correction to the variance, both for unit variance. The "exceeds" pair covers
//! a decisive result (one-sided truncation) and the "within" pair a draw
//! (two-sided truncation). Arguments are the performance difference and draw
//! margin, both already divided by the joint standard deviation.

use crate::numerics::gaussian::{at, cumulative_to};

/// Denominators below this are treated as underflow
const UNDERFLOW_THRESHOLD: f64 = 2.222758749e-162;

pub fn v_exceeds_margin(perf_diff: f64, draw_margin: f64) -> f64 {
    let denom = cumulative_to(perf_diff - draw_margin);
    if denom < UNDERFLOW_THRESHOLD {
        return draw_margin - perf_diff;
    }
    at(perf_diff - draw_margin) / denom
}

pub fn w_exceeds_margin(perf_diff: f64, draw_margin: f64) -> f64 {
    let denom = cumulative_to(perf_diff - draw_margin);
    if denom < UNDERFLOW_THRESHOLD {
        return if perf_diff < 0.0 { 1.0 } else { 0.0 };
    }

    let v = v_exceeds_margin(perf_diff, draw_margin);
    v * (v + perf_diff - draw_margin)
}

pub fn v_within_margin(perf_diff: f64, draw_margin: f64) -> f64 {
    let perf_diff_abs = perf_diff.abs();
    let denom =
        cumulative_to(draw_margin - perf_diff_abs) - cumulative_to(-draw_margin - perf_diff_abs);
    if denom < UNDERFLOW_THRESHOLD {
        return if perf_diff < 0.0 {
            -perf_diff - draw_margin
        } else {
            -perf_diff + draw_margin
        };
    }

    let numerator = at(-draw_margin - perf_diff_abs) - at(draw_margin - perf_diff_abs);
    if perf_diff < 0.0 {
        -numerator / denom
    } else {
        numerator / denom
    }
}

pub fn w_within_margin(perf_diff: f64, draw_margin: f64) -> f64 {
    let perf_diff_abs = perf_diff.abs();
    let denom =
        cumulative_to(draw_margin - perf_diff_abs) - cumulative_to(-draw_margin - perf_diff_abs);
    if denom < UNDERFLOW_THRESHOLD {
        return 1.0;
    }

    let v = v_within_margin(perf_diff_abs, draw_margin);
    v * v
        + ((draw_margin - perf_diff_abs) * at(draw_margin - perf_diff_abs)
            - (-draw_margin - perf_diff_abs) * at(-draw_margin - perf_diff_abs))
            / denom
}

/// `v_exceeds_margin` with unscaled inputs and joint standard deviation `c`
pub fn v_exceeds_margin_scaled(perf_diff: f64, draw_margin: f64, c: f64) -> f64 {
    v_exceeds_margin(perf_diff / c, draw_margin / c)
}

pub fn w_exceeds_margin_scaled(perf_diff: f64, draw_margin: f64, c: f64) -> f64 {
    w_exceeds_margin(perf_diff / c, draw_margin / c)
}

pub fn v_within_margin_scaled(perf_diff: f64, draw_margin: f64, c: f64) -> f64 {
    v_within_margin(perf_diff / c, draw_margin / c)
}

pub fn w_within_margin_scaled(perf_diff: f64, draw_margin: f64, c: f64) -> f64 {
    w_within_margin(perf_diff / c, draw_margin / c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_exceeds_margin_even_match() {
        // φ(0)/Φ(0) = 2φ(0)
        let v = v_exceeds_margin(0.0, 0.0);
        assert_abs_diff_eq!(v, 0.7978845608, epsilon = 1e-9);
        assert_abs_diff_eq!(w_exceeds_margin(0.0, 0.0), v * v, epsilon = 1e-12);
    }

    #[test]
    fn test_exceeds_margin_underflow_guard() {
        // Massive upset: Φ(-40) underflows the guard
        assert_abs_diff_eq!(v_exceeds_margin(-40.0, 0.5), 40.5, epsilon = 1e-12);
        assert_eq!(w_exceeds_margin(-40.0, 0.5), 1.0);
    }

    #[test]
    fn test_exceeds_margin_expected_win_barely_moves() {
        assert!(v_exceeds_margin(10.0, 0.0) < 1e-10);
        assert!(w_exceeds_margin(10.0, 0.0) < 1e-10);
    }

    #[test]
    fn test_within_margin_symmetry() {
        let v_pos = v_within_margin(0.3, 0.5);
        let v_neg = v_within_margin(-0.3, 0.5);
        assert_abs_diff_eq!(v_pos, -v_neg, epsilon = 1e-12);
        // A draw pulls the favourite back, so the correction opposes the difference
        assert!(v_pos < 0.0);

        assert_abs_diff_eq!(v_within_margin(0.0, 0.5), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            w_within_margin(0.3, 0.5),
            w_within_margin(-0.3, 0.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_within_margin_bounds() {
        for d in [-2.0, -0.5, 0.0, 0.5, 2.0] {
            let w = w_within_margin(d, 0.2);
            assert!(w > 0.0 && w < 1.0, "w = {} for d = {}", w, d);
        }
        assert_eq!(w_within_margin(60.0, 0.1), 1.0);
        assert_abs_diff_eq!(v_within_margin(60.0, 0.1), -59.9, epsilon = 1e-12);
        assert_abs_diff_eq!(v_within_margin(-60.0, 0.1), 59.9, epsilon = 1e-12);
    }

    #[test]
    fn test_scaled_variants_divide_by_c() {
        assert_abs_diff_eq!(
            v_exceeds_margin_scaled(2.0, 1.0, 4.0),
            v_exceeds_margin(0.5, 0.25),
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            w_within_margin_scaled(2.0, 1.0, 4.0),
            w_within_margin(0.5, 0.25),
            epsilon = 1e-15
        );
    }
}
