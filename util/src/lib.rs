use nalgebra::DMatrix;

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Values of the linear Lagrange basis functions on the reference simplex of dimension `dim`.
///
/// The basis function of vertex 0 is `1 - x_0 - ... - x_{dim-1}`, the one of vertex `i > 0` is
/// `x_{i-1}`. The result has one row per point and one column per basis function.
pub fn p1_values(dim: usize, points: &[Vec<f64>]) -> DMatrix<f64> {
    DMatrix::from_fn(points.len(), dim + 1, |p, i| {
        let x = &points[p];
        match i {
            0 => 1.0 - x.iter().sum::<f64>(),
            _ => x[i - 1],
        }
    })
}

/// Derivatives of the linear Lagrange basis functions in the given reference direction.
pub fn p1_derivatives(dim: usize, num_points: usize, direction: usize) -> DMatrix<f64> {
    DMatrix::from_fn(num_points, dim + 1, |_, i| match i {
        0 => -1.0,
        _ if i - 1 == direction => 1.0,
        _ => 0.0,
    })
}
