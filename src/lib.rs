//! A quadrature code generator for multilinear finite element forms.
//!
//! `formc` lowers the integrand of a form, built from test and trial functions, coefficients,
//! constants and spatial derivatives, into code that computes the local element tensor of a cell
//! or facet by quadrature. The integrand is evaluated with tabulated values of the reference basis
//! functions, which are provided alongside the form in a [`FormRepresentation`](form::FormRepresentation).
//!
//! The pipeline is:
//!
//! 1. [`tables`]: tabulated basis values are deduplicated, snapped to zero and optionally
//!    compressed to their non-zero columns.
//! 2. [`normalize`]: index sums are expanded and derivatives are propagated to terminals.
//! 3. [`transformer`]: the integrand is visited and turned into symbolic expressions
//!    ([`formc_symbolics::Expr`]) for each entry of the element tensor.
//! 4. [`assembler`] and [`generator`]: the expressions are assembled into loop nests over
//!    quadrature points and degrees of freedom, together with the declarations they need.
//!
//! The result is a tree of [`code::Statement`]s which [`code::CodeFormatter`] renders as the C++
//! body of a UFC `tabulate_tensor` function.

pub mod assembler;
pub mod code;
pub mod element;
pub mod error;
pub mod form;
pub mod generator;
pub mod geometry;
pub mod normalize;
pub mod options;
pub mod quadrature;
pub mod tables;
pub mod transformer;

pub use error::CompileError;
pub use generator::{generate_form, generate_form_par};
pub use options::CompilerOptions;

pub extern crate formc_symbolics as symbolics;
pub extern crate nalgebra;
