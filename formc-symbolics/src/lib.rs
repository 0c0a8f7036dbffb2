//! Symbolic expressions for generated quadrature code.
//!
//! Expressions are immutable trees built from five node kinds: floating point literals,
//! symbols, products, sums and fractions. The smart constructors ([`make_float`],
//! [`make_symbol`], [`make_product`], [`make_sum`], [`make_fraction`]) keep every node in a
//! canonical shape: nested products and sums are flattened, numeric coefficients are folded
//! and children are sorted, so that structurally equal expressions compare equal.
//!
//! On top of the canonical shape, [`Expr::expand`] computes a sum-of-products form and
//! [`Expr::reduce_ops`] factorizes an expanded sum by common factors in order to reduce the
//! number of floating point operations needed to evaluate it.
//!
//! ```
//! use formc_symbolics::{make_symbol, VarType};
//!
//! let x = make_symbol("x", VarType::Basis);
//! let y = make_symbol("y", VarType::Geometry);
//! let e = (&x + &y) * &x;
//! assert_eq!(e.expand().to_string(), "x*x + x*y");
//! ```

use std::fmt;
use std::fmt::{Display, Formatter};

mod constructors;
mod expand;
mod expr;
mod operators;

pub use constructors::*;
pub use expr::*;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A denominator evaluated to zero.
    DivisionByZero {
        /// The numerator of the offending division, rendered as code.
        numerator: String,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero { numerator } => {
                write!(f, "Division by zero (numerator: {numerator})")
            }
        }
    }
}

impl std::error::Error for Error {}
