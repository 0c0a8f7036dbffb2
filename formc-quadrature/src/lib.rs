//! Quadrature rules for the UFC reference cells.
//!
//! All rules are defined on the reference cells used by UFC:
//!
//! - interval: `[0, 1]`
//! - triangle: the simplex with vertices `(0, 0)`, `(1, 0)`, `(0, 1)`
//! - tetrahedron: the simplex with vertices `(0, 0, 0)`, `(1, 0, 0)`, `(0, 1, 0)`, `(0, 0, 1)`
//! - quadrilateral and hexahedron: the unit square and the unit cube
//!
//! Weights sum to the measure of the reference cell. The entry point for code generation is
//! [`create_quadrature`], which returns a rule that integrates polynomials of a requested degree
//! exactly.

use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod simplex;
pub mod tensor;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
    /// The name of a quadrature scheme was not recognized.
    UnknownScheme { name: String },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(
                    f,
                    "There is no quadrature rule satisfying the requirements available"
                )
            }
            Self::UnknownScheme { name } => write!(f, "Unknown quadrature scheme: {name}"),
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A rule whose dimension is only known at runtime.
pub type DynamicRule = (Vec<f64>, Vec<Vec<f64>>);

/// Rules requiring more points per axis than this are not provided.
pub const MAX_POINTS_PER_AXIS: usize = 32;

/// Reference cell shapes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Vertex,
    Interval,
    Triangle,
    Tetrahedron,
    Quadrilateral,
    Hexahedron,
}

impl Shape {
    pub fn dimension(&self) -> usize {
        match self {
            Self::Vertex => 0,
            Self::Interval => 1,
            Self::Triangle | Self::Quadrilateral => 2,
            Self::Tetrahedron | Self::Hexahedron => 3,
        }
    }
}

/// Selects how rules are constructed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// Hand-picked rules with few points on triangles and tetrahedra up to degree 6, the
    /// canonical scheme otherwise.
    #[default]
    Default,
    /// Gauss rules, collapsed onto simplices.
    Canonical,
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "canonical" => Ok(Self::Canonical),
            _ => Err(Error::UnknownScheme { name: s.to_string() }),
        }
    }
}

/// Creates a rule on the reference cell of `shape` that integrates polynomials of total degree
/// `degree` exactly.
pub fn create_quadrature(shape: Shape, degree: usize, scheme: Scheme) -> Result<DynamicRule, Error> {
    if scheme == Scheme::Default {
        match shape {
            Shape::Triangle => {
                if let Some(rule) = simplex::triangle_default(degree) {
                    return Ok(into_dynamic(rule));
                }
            }
            Shape::Tetrahedron => {
                if let Some(rule) = simplex::tetrahedron_default(degree) {
                    return Ok(into_dynamic(rule));
                }
            }
            _ => {}
        }
    }
    canonical_rule(shape, degree)
}

fn canonical_rule(shape: Shape, degree: usize) -> Result<DynamicRule, Error> {
    let per_axis = |num_points: usize| {
        if num_points > MAX_POINTS_PER_AXIS {
            Err(Error::NoRuleAvailable)
        } else {
            Ok(num_points)
        }
    };

    // The collapsed maps raise the degree along the collapsed axes
    let rule = match shape {
        Shape::Vertex => into_dynamic(tensor::tensor_gauss::<0>(1)),
        Shape::Interval => into_dynamic(tensor::tensor_gauss::<1>(per_axis((degree + 2) / 2)?)),
        Shape::Quadrilateral => into_dynamic(tensor::quadrilateral_gauss(per_axis((degree + 2) / 2)?)),
        Shape::Hexahedron => into_dynamic(tensor::hexahedron_gauss(per_axis((degree + 2) / 2)?)),
        Shape::Triangle => into_dynamic(simplex::triangle_collapsed_gauss(per_axis((degree + 3) / 2)?)),
        Shape::Tetrahedron => into_dynamic(simplex::tetrahedron_collapsed_gauss(per_axis((degree + 4) / 2)?)),
    };
    Ok(rule)
}

/// Converts a rule of static dimension into a [`DynamicRule`].
pub fn into_dynamic<const D: usize>(rule: Rule<D>) -> DynamicRule {
    let (weights, points) = rule;
    (weights, points.into_iter().map(|p| p.to_vec()).collect())
}

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, p)| w * f(p)).sum()
}
