//! Arithmetic between expressions.

use crate::constructors::{collapse, fraction_node, make_float, make_product, make_sum};
use crate::expr::Expr;
use crate::Error;
use itertools::Itertools;
use std::iter::once;

impl Expr {
    /// Adds two expressions.
    ///
    /// Like terms that differ only by their numeric coefficient are combined, so that
    /// `x + x == 2*x` and `2*x + 3*x == 5*x`. Fractions with the same denominator are
    /// combined into a single fraction. Anything else becomes a sum.
    pub fn plus(&self, other: &Expr) -> Expr {
        use Expr::*;
        if other.is_zero() {
            return self.clone();
        }
        if self.is_zero() {
            return other.clone();
        }
        match (self, other) {
            (Float(a), Float(b)) => make_float(a + b),
            (Symbol(_), Symbol(_)) if self == other => make_product([make_float(2.0), self.clone()]),
            (Product(p), Symbol(_)) if p.get_vrs() == std::slice::from_ref(other) => {
                like_terms(p.val + 1.0, p.get_vrs())
            }
            (Symbol(_), Product(p)) if p.get_vrs() == std::slice::from_ref(self) => {
                like_terms(p.val + 1.0, p.get_vrs())
            }
            (Product(a), Product(b)) if a.get_vrs() == b.get_vrs() => like_terms(a.val + b.val, a.get_vrs()),
            (Fraction(a), Fraction(b)) if a.denom == b.denom => {
                let num = a.num.plus(&b.num);
                if num.is_zero() {
                    make_float(0.0)
                } else {
                    fraction_node(num, a.denom.clone(), false)
                }
            }
            _ => make_sum([self.clone(), other.clone()]),
        }
    }

    /// Multiplies two expressions.
    ///
    /// Products of floats, symbols and products are flattened into one product. Sums are
    /// distributed over the other operand and fractions absorb the other operand into their
    /// numerator.
    pub fn times(&self, other: &Expr) -> Expr {
        use Expr::*;
        if self.is_zero() || other.is_zero() {
            return make_float(0.0);
        }
        match (self, other) {
            (Float(a), Float(b)) => make_float(a * b),
            (Float(a), _) if *a == 1.0 => other.clone(),
            (_, Float(b)) if *b == 1.0 => self.clone(),
            (Fraction(a), Fraction(b)) => fraction_node(a.num.times(&b.num), a.denom.times(&b.denom), false),
            (Fraction(a), _) => fraction_node(a.num.times(other), a.denom.clone(), false),
            (_, Fraction(_)) => other.times(self),
            (Sum(a), Sum(b)) => make_sum(
                a.vrs
                    .iter()
                    .cartesian_product(&b.vrs)
                    .map(|(u, v)| u.times(v)),
            ),
            (Sum(s), _) => make_sum(s.vrs.iter().map(|v| v.times(other))),
            (_, Sum(_)) => other.times(self),
            _ => make_product([self.clone(), other.clone()]),
        }
    }

    /// Divides `self` by `other`.
    ///
    /// Floats in the denominator are moved to the numerator and factors common to numerator and
    /// denominator cancel. Division by a sum is never simplified beyond building a fraction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DivisionByZero`] if `other` is zero.
    pub fn try_div(&self, other: &Expr) -> Result<Expr, Error> {
        if other.is_zero() {
            return Err(Error::DivisionByZero {
                numerator: self.to_string(),
            });
        }
        Ok(self.divide(other))
    }

    /// Division by a denominator known to be non-zero.
    pub(crate) fn divide(&self, other: &Expr) -> Expr {
        use Expr::*;
        if self.is_zero() {
            return make_float(0.0);
        }
        match (self, other) {
            (_, Float(b)) if *b == 1.0 => self.clone(),
            (Float(a), Float(b)) => make_float(a / b),
            (_, Float(b)) => self.times(&make_float(1.0 / b)),
            (Fraction(a), Fraction(b)) => a.num.times(&b.denom).divide(&a.denom.times(&b.num)),
            (Fraction(a), _) => a.num.divide(&a.denom.times(other)),
            (_, Sum(_)) => fraction_node(self.clone(), other.clone(), false),
            (_, Fraction(b)) => self.times(&b.denom).divide(&b.num),
            (Sum(s), _) => make_sum(s.vrs.iter().map(|v| v.divide(other))),
            _ => divide_factors(self, other),
        }
    }
}

fn like_terms(coefficient: f64, vars: &[Expr]) -> Expr {
    collapse(make_product(once(make_float(coefficient)).chain(vars.iter().cloned())))
}

fn factors(expr: &Expr) -> Vec<Expr> {
    match expr {
        Expr::Product(p) => p.vrs.clone(),
        _ => vec![expr.clone()],
    }
}

fn divide_factors(num: &Expr, denom: &Expr) -> Expr {
    let mut num_vars = factors(num);
    let mut denom_vars = Vec::new();
    let mut coefficient = 1.0;

    for d in factors(denom) {
        match d {
            Expr::Float(v) => coefficient /= v,
            _ => match num_vars.iter().position(|n| *n == d) {
                Some(pos) => {
                    num_vars.remove(pos);
                }
                None => denom_vars.push(d),
            },
        }
    }

    num_vars.push(make_float(coefficient));
    let num = collapse(make_product(num_vars));
    if denom_vars.is_empty() {
        num
    } else {
        fraction_node(num, collapse(make_product(denom_vars)), false)
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $inherent:ident) => {
        impl std::ops::$trait<&Expr> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                self.$inherent(rhs)
            }
        }

        impl std::ops::$trait<Expr> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                self.$inherent(&rhs)
            }
        }

        impl std::ops::$trait<&Expr> for Expr {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                Expr::$inherent(&self, rhs)
            }
        }

        impl std::ops::$trait<Expr> for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::$inherent(&self, &rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add, plus);
impl_binary_operator!(Mul, mul, times);
