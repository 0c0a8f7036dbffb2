//! Quadrature rules for the integration domains of a form.
//!
//! Rules are provided by `formc-quadrature`. This module selects the reference shape matching an
//! integration domain and maps facet points into the reference cell, which is what a tabulator
//! needs to evaluate basis functions for facet integrals.
use crate::element::CellType;
use crate::form::DomainType;

pub use formc_quadrature::{create_quadrature, DynamicRule, Error as QuadratureError, Scheme, Shape};

/// A rule of the given degree over the reference domain of an integral.
///
/// Cell integrals are integrated over the reference cell, facet integrals over the reference facet.
pub fn domain_quadrature(
    cell: CellType,
    domain_type: DomainType,
    degree: usize,
    scheme: Scheme,
) -> Result<DynamicRule, QuadratureError> {
    let shape = match domain_type {
        DomainType::Cell => cell.shape(),
        DomainType::ExteriorFacet | DomainType::InteriorFacet => cell.facet_shape(),
    };
    create_quadrature(shape, degree, scheme)
}

/// Vertices of the UFC reference simplex.
pub fn reference_vertices(cell: CellType) -> Option<Vec<Vec<f64>>> {
    let vertices = match cell {
        CellType::Interval => vec![vec![0.0], vec![1.0]],
        CellType::Triangle => vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        CellType::Tetrahedron => vec![
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ],
        CellType::Quadrilateral | CellType::Hexahedron => return None,
    };
    Some(vertices)
}

/// Maps points on the reference facet to the given facet of the reference simplex.
///
/// Facet `i` is the facet opposite to vertex `i`. Returns `None` for cells that are not simplices
/// or facets that do not exist.
pub fn map_facet_points(cell: CellType, facet: usize, points: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let vertices = reference_vertices(cell)?;
    if facet >= vertices.len() {
        return None;
    }
    let facet_vertices: Vec<&Vec<f64>> = vertices
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != facet)
        .map(|(_, v)| v)
        .collect();
    let (origin, rest) = facet_vertices.split_first()?;

    let mapped = points
        .iter()
        .map(|point| {
            (0..origin.len())
                .map(|d| {
                    let offset: f64 = point
                        .iter()
                        .zip(rest)
                        .map(|(x, v)| x * (v[d] - origin[d]))
                        .sum();
                    origin[d] + offset
                })
                .collect()
        })
        .collect();
    Some(mapped)
}
