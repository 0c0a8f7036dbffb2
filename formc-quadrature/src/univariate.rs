//! Gauss-Legendre rules on the intervals `[-1, 1]` and `[0, 1]`.

use crate::Rule;
use std::f64::consts::PI;

const MAX_NEWTON_ITERATIONS: usize = 100;

/// Evaluates the Legendre polynomial of degree `n` and its derivative at `x`.
///
/// The derivative formula is singular at |x| == 1, so `x` must lie in the open interval (-1, 1).
fn legendre(n: usize, x: f64) -> (f64, f64) {
    // (m + 1) P_{m + 1}(x) = (2m + 1) x P_m(x) - m P_{m - 1}(x)
    let mut current = 1.0;
    let mut previous = 0.0;
    for m in 0..n {
        let m = m as f64;
        let next = ((2.0 * m + 1.0) * x * current - m * previous) / (m + 1.0);
        previous = current;
        current = next;
    }

    // (x^2 - 1) P_n'(x) = n (x P_n(x) - P_{n - 1}(x))
    let derivative = n as f64 * (x * current - previous) / (x * x - 1.0);
    (current, derivative)
}

/// Gauss quadrature for the interval `[-1, 1]`.
///
/// Given `n` points, the rule integrates polynomials of degree up to `2n - 1` exactly. Points
/// are returned in ascending order.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    // Roots are symmetric about the origin, so only the non-negative half is computed
    let mut nodes = Vec::with_capacity(n);
    for i in 0..(n + 1) / 2 {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (p, dp) = legendre(n, x);
            let dx = -p / dp;
            x += dx;
            if dx.abs() <= 1e-15 {
                break;
            }
        }

        let (_, dp) = legendre(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        nodes.push((x, w));
        if 2 * i + 1 != n {
            nodes.push((-x, w));
        }
    }
    nodes.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (points, weights): (Vec<_>, Vec<_>) = nodes.into_iter().map(|(x, w)| ([x], w)).unzip();
    (weights, points)
}

/// Gauss quadrature for the unit interval `[0, 1]`.
pub fn gauss_unit_interval(num_points: usize) -> Rule<1> {
    let (weights, points) = gauss(num_points);
    (
        weights.into_iter().map(|w| 0.5 * w).collect(),
        points.into_iter().map(|[x]| [0.5 * (x + 1.0)]).collect(),
    )
}
