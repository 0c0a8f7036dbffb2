//! Rules on the reference triangle and the reference tetrahedron.
//!
//! The hand-picked rules follow Zienkiewicz and Taylor, Strang and Fix, and Keast
//! (Moderate-degree tetrahedral quadrature formulas, CMAME 55(3), 1986). The collapsed rules map
//! a tensor product Gauss rule on the unit square or cube onto the simplex.

use crate::univariate::gauss_unit_interval;
use crate::Rule;

/// Builds a rule from groups of points sharing a weight.
fn grouped<const D: usize>(groups: Vec<(f64, Vec<[f64; D]>)>) -> Rule<D> {
    let mut weights = Vec::new();
    let mut points = Vec::new();
    for (weight, group) in groups {
        weights.extend(std::iter::repeat(weight).take(group.len()));
        points.extend(group);
    }
    (weights, points)
}

/// A rule with few points on the reference triangle for degrees up to 6.
///
/// Returns `None` for higher degrees.
pub fn triangle_default(degree: usize) -> Option<Rule<2>> {
    let rule = match degree {
        0 | 1 => grouped(vec![(0.5, vec![[1.0 / 3.0, 1.0 / 3.0]])]),
        2 => grouped(vec![(
            1.0 / 6.0,
            vec![[1.0 / 6.0, 1.0 / 6.0], [1.0 / 6.0, 2.0 / 3.0], [2.0 / 3.0, 1.0 / 6.0]],
        )]),
        3 => grouped(vec![(
            1.0 / 12.0,
            vec![
                [0.659027622374092, 0.231933368553031],
                [0.659027622374092, 0.109039009072877],
                [0.231933368553031, 0.659027622374092],
                [0.231933368553031, 0.109039009072877],
                [0.109039009072877, 0.659027622374092],
                [0.109039009072877, 0.231933368553031],
            ],
        )]),
        4 => grouped(vec![
            (
                0.109951743655322 / 2.0,
                vec![
                    [0.816847572980459, 0.091576213509771],
                    [0.091576213509771, 0.816847572980459],
                    [0.091576213509771, 0.091576213509771],
                ],
            ),
            (
                0.223381589678011 / 2.0,
                vec![
                    [0.108103018168070, 0.445948490915965],
                    [0.445948490915965, 0.108103018168070],
                    [0.445948490915965, 0.445948490915965],
                ],
            ),
        ]),
        5 => grouped(vec![
            (0.225 / 2.0, vec![[1.0 / 3.0, 1.0 / 3.0]]),
            (
                0.12593918054482717 / 2.0,
                vec![
                    [0.79742698535308720, 0.10128650732345633],
                    [0.10128650732345633, 0.79742698535308720],
                    [0.10128650732345633, 0.10128650732345633],
                ],
            ),
            (
                0.13239415278850616 / 2.0,
                vec![
                    [0.05971587178976981, 0.47014206410511505],
                    [0.47014206410511505, 0.05971587178976981],
                    [0.47014206410511505, 0.47014206410511505],
                ],
            ),
        ]),
        6 => grouped(vec![
            (
                0.050844906370207 / 2.0,
                vec![
                    [0.873821971016996, 0.063089014491502],
                    [0.063089014491502, 0.873821971016996],
                    [0.063089014491502, 0.063089014491502],
                ],
            ),
            (
                0.116786275726379 / 2.0,
                vec![
                    [0.501426509658179, 0.249286745170910],
                    [0.249286745170910, 0.501426509658179],
                    [0.249286745170910, 0.249286745170910],
                ],
            ),
            (
                0.082851075618374 / 2.0,
                vec![
                    [0.636502499121399, 0.310352451033785],
                    [0.636502499121399, 0.053145049844816],
                    [0.310352451033785, 0.636502499121399],
                    [0.310352451033785, 0.053145049844816],
                    [0.053145049844816, 0.636502499121399],
                    [0.053145049844816, 0.310352451033785],
                ],
            ),
        ]),
        _ => return None,
    };
    Some(rule)
}

/// A rule with few points on the reference tetrahedron for degrees up to 6.
///
/// The degree 3 rule has a negative weight. Returns `None` for higher degrees.
pub fn tetrahedron_default(degree: usize) -> Option<Rule<3>> {
    let rule = match degree {
        0 | 1 => grouped(vec![(1.0 / 6.0, vec![[0.25, 0.25, 0.25]])]),
        2 => {
            let (a, b) = (0.585410196624969, 0.138196601125011);
            grouped(vec![(1.0 / 24.0, vec![[a, b, b], [b, a, b], [b, b, a], [b, b, b]])])
        }
        3 => {
            let (a, b) = (0.5, 1.0 / 6.0);
            grouped(vec![
                (-0.8 / 6.0, vec![[0.25, 0.25, 0.25]]),
                (0.45 / 6.0, vec![[a, b, b], [b, a, b], [b, b, a], [b, b, b]]),
            ])
        }
        4 => {
            let (a, b) = (0.6984197043243866, 0.1005267652252045);
            let (c, d) = (0.0568813795204234, 0.3143728734931922);
            grouped(vec![
                (
                    0.0190476190476190 / 6.0,
                    vec![
                        [0.0, 0.5, 0.5],
                        [0.5, 0.0, 0.5],
                        [0.5, 0.5, 0.0],
                        [0.5, 0.0, 0.0],
                        [0.0, 0.5, 0.0],
                        [0.0, 0.0, 0.5],
                    ],
                ),
                (0.0885898247429807 / 6.0, vec![[a, b, b], [b, b, b], [b, b, a], [b, a, b]]),
                (0.1328387466855907 / 6.0, vec![[c, d, d], [d, d, d], [d, d, c], [d, c, d]]),
            ])
        }
        5 => {
            let t = 1.0 / 3.0;
            let (a, b) = (0.7272727272727273, 0.0909090909090909);
            let (c, d) = (0.4334498464263357, 0.0665501535736643);
            grouped(vec![
                (0.1817020685825351 / 6.0, vec![[0.25, 0.25, 0.25]]),
                (0.0361607142857143 / 6.0, vec![[0.0, t, t], [t, t, t], [t, t, 0.0], [t, 0.0, t]]),
                (0.0698714945161738 / 6.0, vec![[a, b, b], [b, b, b], [b, b, a], [b, a, b]]),
                (
                    0.0656948493683187 / 6.0,
                    vec![[c, d, d], [d, c, d], [d, d, c], [d, c, c], [c, d, c], [c, c, d]],
                ),
            ])
        }
        6 => {
            let (a, b) = (0.3561913862225449, 0.2146028712591517);
            let (c, d) = (0.8779781243961660, 0.0406739585346113);
            let (e, f) = (0.0329863295731731, 0.3223378901422757);
            let (g, h, i) = (0.2696723314583159, 0.0636610018750175, 0.6030056647916491);
            grouped(vec![
                (0.0399227502581679 / 6.0, vec![[a, b, b], [b, b, b], [b, b, a], [b, a, b]]),
                (0.0100772110553207 / 6.0, vec![[c, d, d], [d, d, d], [d, d, c], [d, c, d]]),
                (0.0553571815436544 / 6.0, vec![[e, f, f], [f, f, f], [f, f, e], [f, e, f]]),
                (
                    0.0482142857142857 / 6.0,
                    vec![
                        [g, h, h],
                        [h, g, h],
                        [h, h, g],
                        [i, h, h],
                        [h, i, h],
                        [h, h, i],
                        [h, g, i],
                        [g, i, h],
                        [i, h, g],
                        [h, i, g],
                        [g, h, i],
                        [i, g, h],
                    ],
                ),
            ])
        }
        _ => return None,
    };
    Some(rule)
}

/// A collapsed Gauss rule on the reference triangle with `n` points per axis.
///
/// The unit square is mapped onto the triangle by `(u, v) -> (u (1 - v), v)`. The rule
/// integrates polynomials of degree up to `2n - 2` exactly.
pub fn triangle_collapsed_gauss(num_points_per_axis: usize) -> Rule<2> {
    let (weights1d, points1d) = gauss_unit_interval(num_points_per_axis);
    let mut weights = Vec::new();
    let mut points = Vec::new();
    for (&wu, &[u]) in weights1d.iter().zip(&points1d) {
        for (&wv, &[v]) in weights1d.iter().zip(&points1d) {
            weights.push(wu * wv * (1.0 - v));
            points.push([u * (1.0 - v), v]);
        }
    }
    (weights, points)
}

/// A collapsed Gauss rule on the reference tetrahedron with `n` points per axis.
///
/// The unit cube is mapped onto the tetrahedron by
/// `(u, v, w) -> (u (1 - v) (1 - w), v (1 - w), w)`. The rule integrates polynomials of degree
/// up to `2n - 3` exactly.
pub fn tetrahedron_collapsed_gauss(num_points_per_axis: usize) -> Rule<3> {
    let (weights1d, points1d) = gauss_unit_interval(num_points_per_axis);
    let rule1d = || weights1d.iter().zip(&points1d);
    let mut weights = Vec::new();
    let mut points = Vec::new();
    for (&wu, &[u]) in rule1d() {
        for (&wv, &[v]) in rule1d() {
            for (&ww, &[w]) in rule1d() {
                weights.push(wu * wv * ww * (1.0 - v) * (1.0 - w) * (1.0 - w));
                points.push([u * (1.0 - v) * (1.0 - w), v * (1.0 - w), w]);
            }
        }
    }
    (weights, points)
}
