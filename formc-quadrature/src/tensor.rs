//! Tensor product Gauss rules on the unit square and the unit cube.

use crate::univariate::gauss_unit_interval;
use crate::Rule;

/// Gauss rule on `[0, 1]^D` with `n` points per dimension.
///
/// The last coordinate varies fastest. For `D == 0` the rule is a single point with unit weight.
pub fn tensor_gauss<const D: usize>(num_points_per_dim: usize) -> Rule<D> {
    let n = num_points_per_dim;
    let (weights1d, points1d) = gauss_unit_interval(n);
    let total = n.pow(D as u32);

    let mut weights = Vec::with_capacity(total);
    let mut points = Vec::with_capacity(total);
    for linear_index in 0..total {
        let mut point = [0.0; D];
        let mut weight = 1.0;
        let mut remainder = linear_index;
        for d in (0..D).rev() {
            let i = remainder % n;
            remainder /= n;
            point[d] = points1d[i][0];
            weight *= weights1d[i];
        }
        weights.push(weight);
        points.push(point);
    }

    (weights, points)
}

/// A Gauss rule for the reference quadrilateral `[0, 1]^2`.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule<2> {
    tensor_gauss(num_points_per_dim)
}

/// A Gauss rule for the reference hexahedron `[0, 1]^3`.
pub fn hexahedron_gauss(num_points_per_dim: usize) -> Rule<3> {
    tensor_gauss(num_points_per_dim)
}
