//! Errors raised while generating quadrature code.
use std::fmt;
use std::fmt::{Display, Formatter};

/// An error raised while compiling a form.
///
/// All errors are fatal: they indicate either a form that lies outside of the supported subset
/// or an inconsistency between the form and the tabulated data provided alongside it.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CompileError {
    /// A denominator is identically zero.
    DivisionByZero { numerator: String },
    /// The free indices of a term do not describe a valid element tensor entry.
    InvalidRank { key: String },
    /// The element tensor has rank three or higher.
    UnsupportedRank { rank: usize },
    UnsupportedConstruct { construct: String },
    /// Derivatives were requested for an element family without derivative support.
    UnsupportedDerivative { family: String },
    /// A denominator depends on the free argument indices.
    UnsupportedDenominator { denominator: String },
    TableNotFound { name: String },
    /// A component, index or derivative stack was not empty when it was expected to be.
    StackImbalance { stack: &'static str },
    /// No usable quadrature weights exist for the given number of points.
    NoWeights { points: usize },
    InvalidTable { name: String, reason: String },
    /// Two factors of a product bind the same argument.
    IndexCollision { key: String },
    UnboundIndex { index: String },
    /// A component tensor is accessed with the wrong number of components.
    ComponentMismatch { expected: usize, found: usize },
    GeometricDimensionMismatch { expected: usize, found: usize },
    InternalInconsistency { message: String },
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero { numerator } => write!(f, "Division by zero (numerator: {numerator})"),
            Self::InvalidRank { key } => write!(
                f,
                "Invalid free indices {key}: linear forms must be defined using test functions only \
                 and bilinear forms using exactly one test and one trial function"
            ),
            Self::UnsupportedRank { rank } => write!(
                f,
                "Only rank 0, 1 and 2 tensors are currently supported, got rank {rank}"
            ),
            Self::UnsupportedConstruct { construct } => write!(f, "Unsupported construct: {construct}"),
            Self::UnsupportedDerivative { family } => write!(
                f,
                "Derivatives are not supported for elements of family {family}"
            ),
            Self::UnsupportedDenominator { denominator } => write!(
                f,
                "Denominator must not depend on test or trial functions: {denominator}"
            ),
            Self::TableNotFound { name } => write!(f, "No tabulated values found for table {name}"),
            Self::StackImbalance { stack } => write!(f, "The {stack} stack is not empty"),
            Self::NoWeights { points } => write!(f, "No weights for quadrature rule with {points} points"),
            Self::InvalidTable { name, reason } => write!(f, "Invalid table {name}: {reason}"),
            Self::IndexCollision { key } => write!(f, "Colliding argument indices in product: {key}"),
            Self::UnboundIndex { index } => write!(f, "Index {index} is neither fixed nor bound"),
            Self::ComponentMismatch { expected, found } => write!(
                f,
                "Component tensor with {expected} indices accessed with {found} components"
            ),
            Self::GeometricDimensionMismatch { expected, found } => write!(
                f,
                "All terms must be defined on cells with the same geometric dimension \
                 (expected {expected}, found {found})"
            ),
            Self::InternalInconsistency { message } => write!(f, "Internal inconsistency: {message}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<formc_symbolics::Error> for CompileError {
    fn from(err: formc_symbolics::Error) -> Self {
        match err {
            formc_symbolics::Error::DivisionByZero { numerator } => Self::DivisionByZero { numerator },
            other => Self::InternalInconsistency {
                message: other.to_string(),
            },
        }
    }
}
