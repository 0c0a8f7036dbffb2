//! Integrand syntax trees and the form representation handed to the generator.
use crate::element::{CellType, ElementId, FiniteElement};
use itertools::Itertools;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fmt::{Display, Formatter};

/// The kind of domain an integral is defined over.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DomainType {
    Cell,
    ExteriorFacet,
    InteriorFacet,
}

impl Display for DomainType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell => write!(f, "cell"),
            Self::ExteriorFacet => write!(f, "exterior facet"),
            Self::InteriorFacet => write!(f, "interior facet"),
        }
    }
}

/// Identifies a free index variable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Index {
    Fixed(usize),
    Free(IndexId),
}

impl Display for Index {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => write!(f, "{value}"),
            Self::Free(id) => write!(f, "i_{}", id.0),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Restriction {
    Plus,
    Minus,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MathFunction {
    Abs,
    Sqrt,
    Exp,
    Ln,
    Cos,
    Sin,
}

impl MathFunction {
    /// Name of the corresponding function of the C++ standard library.
    pub fn cpp_name(&self) -> &'static str {
        match self {
            Self::Abs => "std::abs",
            Self::Sqrt => "std::sqrt",
            Self::Exp => "std::exp",
            Self::Ln => "std::log",
            Self::Cos => "std::cos",
            Self::Sin => "std::sin",
        }
    }
}

/// A test (`-2` or `0`) or trial (`-1` or `1`) function.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argument {
    pub number: i32,
    pub element: ElementId,
}

/// A known function, expanded in the basis of its element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coefficient {
    pub number: usize,
    pub element: ElementId,
}

/// A cell-wise constant, stored in the coefficient array.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constant {
    pub number: usize,
    /// `None` for scalar constants, the number of components for vector constants.
    pub dimension: Option<usize>,
}

/// An integrand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormExpr {
    Sum(Vec<FormExpr>),
    Product(Vec<FormExpr>),
    Division(Box<FormExpr>, Box<FormExpr>),
    Power(Box<FormExpr>, Box<FormExpr>),
    MathFunction(MathFunction, Box<FormExpr>),
    Restricted(Restriction, Box<FormExpr>),
    IndexSum {
        summand: Box<FormExpr>,
        index: IndexId,
        dimension: usize,
    },
    Indexed(Box<FormExpr>, Vec<Index>),
    ComponentTensor(Box<FormExpr>, Vec<IndexId>),
    ListTensor(Vec<FormExpr>),
    SpatialDerivative(Box<FormExpr>, Index),
    Argument(Argument),
    Coefficient(Coefficient),
    Constant(Constant),
    FloatLiteral(f64),
    IntLiteral(i64),
    FacetNormal,
    /// The identity matrix of the given dimension.
    Identity(usize),
}

impl FormExpr {
    pub fn float(value: f64) -> Self {
        Self::FloatLiteral(value)
    }

    pub fn test_function(element: ElementId) -> Self {
        Self::Argument(Argument { number: 0, element })
    }

    pub fn trial_function(element: ElementId) -> Self {
        Self::Argument(Argument { number: 1, element })
    }

    pub fn coefficient(number: usize, element: ElementId) -> Self {
        Self::Coefficient(Coefficient { number, element })
    }

    pub fn constant(number: usize) -> Self {
        Self::Constant(Constant {
            number,
            dimension: None,
        })
    }

    pub fn vector_constant(number: usize, dimension: usize) -> Self {
        Self::Constant(Constant {
            number,
            dimension: Some(dimension),
        })
    }

    /// The derivative of `self` in the given spatial direction.
    pub fn dx(self, direction: usize) -> Self {
        Self::SpatialDerivative(Box::new(self), Index::Fixed(direction))
    }

    pub fn index(self, indices: impl IntoIterator<Item = Index>) -> Self {
        Self::Indexed(Box::new(self), indices.into_iter().collect())
    }

    /// The component with the given fixed index.
    pub fn component(self, component: usize) -> Self {
        self.index([Index::Fixed(component)])
    }

    pub fn restricted(self, restriction: Restriction) -> Self {
        Self::Restricted(restriction, Box::new(self))
    }

    pub fn apply(self, function: MathFunction) -> Self {
        Self::MathFunction(function, Box::new(self))
    }

    pub fn pow(self, exponent: FormExpr) -> Self {
        Self::Power(Box::new(self), Box::new(exponent))
    }

    pub fn index_sum(summand: FormExpr, index: IndexId, dimension: usize) -> Self {
        Self::IndexSum {
            summand: Box::new(summand),
            index,
            dimension,
        }
    }

    /// Whether the expression is a literal zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::FloatLiteral(v) => *v == 0.0,
            Self::IntLiteral(v) => *v == 0,
            _ => false,
        }
    }

    pub fn operands(&self) -> Vec<&FormExpr> {
        match self {
            Self::Sum(ops) | Self::Product(ops) | Self::ListTensor(ops) => ops.iter().collect(),
            Self::Division(a, b) | Self::Power(a, b) => vec![a.as_ref(), b.as_ref()],
            Self::MathFunction(_, a)
            | Self::Restricted(_, a)
            | Self::Indexed(a, _)
            | Self::ComponentTensor(a, _)
            | Self::SpatialDerivative(a, _) => vec![a.as_ref()],
            Self::IndexSum { summand, .. } => vec![summand.as_ref()],
            Self::Argument(_)
            | Self::Coefficient(_)
            | Self::Constant(_)
            | Self::FloatLiteral(_)
            | Self::IntLiteral(_)
            | Self::FacetNormal
            | Self::Identity(_) => Vec::new(),
        }
    }

    /// All arguments occurring in the expression, ordered by number.
    pub fn arguments(&self) -> Vec<Argument> {
        let mut arguments = BTreeMap::new();
        self.collect_arguments(&mut arguments);
        arguments.into_values().collect()
    }

    fn collect_arguments(&self, arguments: &mut BTreeMap<i32, Argument>) {
        match self {
            Self::Argument(argument) => {
                arguments.entry(argument.number).or_insert(*argument);
            }
            _ => {
                for op in self.operands() {
                    op.collect_arguments(arguments);
                }
            }
        }
    }

    /// All elements referenced by arguments and coefficients.
    pub fn elements(&self) -> BTreeSet<ElementId> {
        let mut elements = BTreeSet::new();
        self.collect_elements(&mut elements);
        elements
    }

    fn collect_elements(&self, elements: &mut BTreeSet<ElementId>) {
        match self {
            Self::Argument(a) => {
                elements.insert(a.element);
            }
            Self::Coefficient(c) => {
                elements.insert(c.element);
            }
            _ => {
                for op in self.operands() {
                    op.collect_elements(elements);
                }
            }
        }
    }
}

impl Display for FormExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sum(ops) => write!(f, "({})", ops.iter().join(" + ")),
            Self::Product(ops) => write!(f, "{}", ops.iter().join(" * ")),
            Self::Division(a, b) => write!(f, "{a} / {b}"),
            Self::Power(a, b) => write!(f, "{a}**{b}"),
            Self::MathFunction(func, a) => write!(f, "{}({a})", func.cpp_name().trim_start_matches("std::")),
            Self::Restricted(Restriction::Plus, a) => write!(f, "{a}('+')"),
            Self::Restricted(Restriction::Minus, a) => write!(f, "{a}('-')"),
            Self::IndexSum {
                summand,
                index,
                dimension,
            } => write!(f, "sum_{{i_{} < {dimension}}} {summand}", index.0),
            Self::Indexed(a, indices) => write!(f, "{a}[{}]", indices.iter().join(", ")),
            Self::ComponentTensor(a, indices) => write!(
                f,
                "{{ A | A_{{{}}} = {a} }}",
                indices.iter().map(|i| format!("i_{}", i.0)).join(", ")
            ),
            Self::ListTensor(ops) => write!(f, "[{}]", ops.iter().join(", ")),
            Self::SpatialDerivative(a, index) => write!(f, "d{a}/dx_{index}"),
            Self::Argument(a) => match a.number {
                -2 | 0 => write!(f, "v_{}", a.number),
                _ => write!(f, "u_{}", a.number),
            },
            Self::Coefficient(c) => write!(f, "w_{}", c.number),
            Self::Constant(c) => write!(f, "c_{}", c.number),
            Self::FloatLiteral(v) => write!(f, "{v:?}"),
            Self::IntLiteral(v) => write!(f, "{v}"),
            Self::FacetNormal => write!(f, "n"),
            Self::Identity(dim) => write!(f, "I_{dim}"),
        }
    }
}

macro_rules! impl_form_operator {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl std::ops::$trait for FormExpr {
            type Output = FormExpr;

            fn $method(self, rhs: FormExpr) -> FormExpr {
                match self {
                    FormExpr::$variant(mut ops) => {
                        ops.push(rhs);
                        FormExpr::$variant(ops)
                    }
                    lhs => FormExpr::$variant(vec![lhs, rhs]),
                }
            }
        }
    };
}

impl_form_operator!(Add, add, Sum);
impl_form_operator!(Mul, mul, Product);

impl std::ops::Div for FormExpr {
    type Output = FormExpr;

    fn div(self, rhs: FormExpr) -> FormExpr {
        FormExpr::Division(Box::new(self), Box::new(rhs))
    }
}

/// Identifies one tabulated table of an element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableKey {
    /// The facet the values were tabulated on, `None` for cell tables.
    pub facet: Option<usize>,
    /// The component for vector valued elements, `None` for scalar elements.
    pub component: Option<usize>,
    /// Number of reference derivatives in each direction.
    pub derivatives: Vec<usize>,
}

impl TableKey {
    pub fn new(facet: Option<usize>, component: Option<usize>, derivatives: Vec<usize>) -> Self {
        Self {
            facet,
            component,
            derivatives,
        }
    }

    /// Values of the basis functions themselves.
    pub fn values(facet: Option<usize>) -> Self {
        Self::new(facet, None, Vec::new())
    }
}

/// Tabulated reference values for all elements of one domain type.
///
/// Maps a number of quadrature points to the tables of each element. Every table has one row
/// per quadrature point and one column per local degree of freedom.
pub type Tabulation = BTreeMap<usize, BTreeMap<ElementId, BTreeMap<TableKey, DMatrix<f64>>>>;

pub type IntegralKey = (DomainType, usize);

/// Everything the generator needs to know about a form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormRepresentation {
    pub cell: CellType,
    pub elements: Vec<FiniteElement>,
    /// For each domain type and subdomain, the integrand for each number of quadrature points.
    pub integrals: BTreeMap<IntegralKey, BTreeMap<usize, FormExpr>>,
    pub psi_tables: BTreeMap<DomainType, Tabulation>,
    pub quadrature_weights: BTreeMap<DomainType, BTreeMap<usize, Vec<f64>>>,
}

impl FormRepresentation {
    pub fn new(cell: CellType, elements: Vec<FiniteElement>) -> Self {
        Self {
            cell,
            elements,
            integrals: BTreeMap::new(),
            psi_tables: BTreeMap::new(),
            quadrature_weights: BTreeMap::new(),
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&FiniteElement> {
        self.elements.get(id.0)
    }

    /// Adds an integrand evaluated with the given quadrature weights.
    ///
    /// Integrands added for the same subdomain and number of points are summed.
    pub fn add_integral(&mut self, domain_type: DomainType, subdomain: usize, weights: Vec<f64>, integrand: FormExpr) {
        let points = weights.len();
        self.quadrature_weights
            .entry(domain_type)
            .or_default()
            .insert(points, weights);
        let integrals = self.integrals.entry((domain_type, subdomain)).or_default();
        let integrand = match integrals.remove(&points) {
            Some(existing) => existing + integrand,
            None => integrand,
        };
        integrals.insert(points, integrand);
    }

    /// Adds a table of reference values of an element.
    pub fn add_table(&mut self, domain_type: DomainType, element: ElementId, key: TableKey, table: DMatrix<f64>) {
        let points = table.nrows();
        self.psi_tables
            .entry(domain_type)
            .or_default()
            .entry(points)
            .or_default()
            .entry(element)
            .or_default()
            .insert(key, table);
    }
}
