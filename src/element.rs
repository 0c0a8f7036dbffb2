//! Finite element descriptions as seen by the code generator.
//!
//! The generator never evaluates basis functions itself. It only needs to know how elements are
//! laid out: their family (to decide whether derivatives can be mapped to the physical cell),
//! their cell, their value shape and their space dimension. The tabulated values are provided
//! separately, see [`Tabulation`](crate::form::Tabulation).
use formc_quadrature::Shape;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Reference cells.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellType {
    Interval,
    Triangle,
    Tetrahedron,
    Quadrilateral,
    Hexahedron,
}

impl CellType {
    pub fn geometric_dimension(&self) -> usize {
        match self {
            Self::Interval => 1,
            Self::Triangle | Self::Quadrilateral => 2,
            Self::Tetrahedron | Self::Hexahedron => 3,
        }
    }

    pub fn num_vertices(&self) -> usize {
        match self {
            Self::Interval => 2,
            Self::Triangle => 3,
            Self::Tetrahedron | Self::Quadrilateral => 4,
            Self::Hexahedron => 8,
        }
    }

    pub fn num_facets(&self) -> usize {
        match self {
            Self::Interval => 2,
            Self::Triangle => 3,
            Self::Tetrahedron | Self::Quadrilateral => 4,
            Self::Hexahedron => 6,
        }
    }

    pub fn is_simplex(&self) -> bool {
        matches!(self, Self::Interval | Self::Triangle | Self::Tetrahedron)
    }

    /// The shape of the cell itself.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Interval => Shape::Interval,
            Self::Triangle => Shape::Triangle,
            Self::Tetrahedron => Shape::Tetrahedron,
            Self::Quadrilateral => Shape::Quadrilateral,
            Self::Hexahedron => Shape::Hexahedron,
        }
    }

    /// The shape of the facets of the cell.
    pub fn facet_shape(&self) -> Shape {
        match self {
            Self::Interval => Shape::Vertex,
            Self::Triangle | Self::Quadrilateral => Shape::Interval,
            Self::Tetrahedron => Shape::Triangle,
            Self::Hexahedron => Shape::Quadrilateral,
        }
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interval => "interval",
            Self::Triangle => "triangle",
            Self::Tetrahedron => "tetrahedron",
            Self::Quadrilateral => "quadrilateral",
            Self::Hexahedron => "hexahedron",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Family {
    Lagrange,
    DiscontinuousLagrange,
    Quadrature,
    Mixed,
    Other(String),
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lagrange => write!(f, "Lagrange"),
            Self::DiscontinuousLagrange => write!(f, "Discontinuous Lagrange"),
            Self::Quadrature => write!(f, "Quadrature"),
            Self::Mixed => write!(f, "Mixed"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Index of an element in [`FormRepresentation::elements`](crate::form::FormRepresentation).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub usize);

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "element {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiniteElement {
    pub family: Family,
    pub cell: CellType,
    pub degree: usize,
    /// Empty for scalar elements.
    pub value_shape: Vec<usize>,
    pub space_dimension: usize,
    pub sub_elements: Vec<FiniteElement>,
}

impl FiniteElement {
    pub fn new(family: Family, cell: CellType, degree: usize, space_dimension: usize) -> Self {
        Self {
            family,
            cell,
            degree,
            value_shape: Vec::new(),
            space_dimension,
            sub_elements: Vec::new(),
        }
    }

    /// Continuous Lagrange element of the given degree.
    pub fn lagrange(cell: CellType, degree: usize) -> Self {
        Self::new(Family::Lagrange, cell, degree, polynomial_dimension(cell, degree))
    }

    pub fn discontinuous_lagrange(cell: CellType, degree: usize) -> Self {
        Self::new(
            Family::DiscontinuousLagrange,
            cell,
            degree,
            polynomial_dimension(cell, degree),
        )
    }

    /// Quadrature element with one degree of freedom per quadrature point.
    pub fn quadrature(cell: CellType, degree: usize, num_points: usize) -> Self {
        Self::new(Family::Quadrature, cell, degree, num_points)
    }

    /// A mixed element made of copies of `element`, one for each of the `dim` components.
    pub fn vector(element: FiniteElement, dim: usize) -> Self {
        Self::mixed(vec![element; dim])
    }

    /// A mixed element made of the given sub elements.
    ///
    /// The value shape is the sum of the value sizes of the sub elements.
    pub fn mixed(sub_elements: Vec<FiniteElement>) -> Self {
        let cell = sub_elements
            .first()
            .map(|e| e.cell)
            .unwrap_or(CellType::Triangle);
        let degree = sub_elements.iter().map(|e| e.degree).max().unwrap_or(0);
        let value_size = sub_elements.iter().map(|e| e.value_size()).sum();
        Self {
            family: Family::Mixed,
            cell,
            degree,
            value_shape: vec![value_size],
            space_dimension: sub_elements.iter().map(|e| e.space_dimension).sum(),
            sub_elements,
        }
    }

    pub fn value_size(&self) -> usize {
        self.value_shape.iter().product()
    }

    pub fn num_facets(&self) -> usize {
        self.cell.num_facets()
    }

    /// All nested sub elements, not including the element itself.
    pub fn extract_sub_elements(&self) -> Vec<&FiniteElement> {
        let mut elements = Vec::new();
        for sub in &self.sub_elements {
            elements.push(sub);
            elements.extend(sub.extract_sub_elements());
        }
        elements
    }

    /// Whether the element or any of its sub elements is a quadrature element.
    pub fn contains_quadrature_element(&self) -> bool {
        self.family == Family::Quadrature
            || self
                .extract_sub_elements()
                .iter()
                .any(|e| e.family == Family::Quadrature)
    }

    /// Whether reference derivatives of the element can be mapped with the inverse Jacobian.
    pub fn supports_derivatives(&self) -> bool {
        let affine = |family: &Family| matches!(family, Family::Lagrange | Family::DiscontinuousLagrange);
        match self.family {
            Family::Mixed => self
                .extract_sub_elements()
                .iter()
                .all(|e| affine(&e.family) || e.family == Family::Mixed),
            ref family => affine(family),
        }
    }
}

/// Dimension of the space of polynomials of the given degree on the cell.
fn polynomial_dimension(cell: CellType, degree: usize) -> usize {
    let d = cell.geometric_dimension();
    if cell.is_simplex() {
        // binomial(degree + d, d)
        (1..=d).fold(1, |acc, i| acc * (degree + i) / i)
    } else {
        (degree + 1).pow(d as u32)
    }
}
