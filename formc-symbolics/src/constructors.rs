//! Smart constructors that keep expressions in canonical shape.

use crate::expr::{Expr, Fraction, Product, Sum, Symbol, VarType};
use crate::Error;
use itertools::Itertools;
use std::sync::{Arc, OnceLock};

pub fn make_float(val: f64) -> Expr {
    // Normalizes negative zero
    Expr::Float(val + 0.0)
}

pub fn make_symbol(name: impl Into<String>, t: VarType) -> Expr {
    symbol_node(name.into(), t, None, 0)
}

/// Creates a symbol that abbreviates `base_expr`.
///
/// Evaluating the abbreviated expression is assumed to cost `base_ops` operations in addition
/// to the operations of `base_expr` itself. The kind of the symbol is lowered to the kind of
/// `base_expr` if the latter is lower.
pub fn make_symbol_with_base(name: impl Into<String>, t: VarType, base_expr: Expr, base_ops: usize) -> Expr {
    let t = t.min(base_expr.var_type());
    symbol_node(name.into(), t, Some(base_expr), base_ops)
}

fn symbol_node(name: String, t: VarType, base_expr: Option<Expr>, base_ops: usize) -> Expr {
    let repr = format!("Symbol('{}', {})", name, t.as_str());
    Expr::Symbol(Arc::new(Symbol {
        name,
        t,
        base_expr,
        base_ops,
        repr,
    }))
}

/// Creates a product of the given variables.
///
/// Nested products are flattened and all numeric factors are folded into a single coefficient,
/// which is dropped if it equals one. If any variable is zero, or no variables are given, the
/// result is the zero product `Product([0.0])`.
pub fn make_product<I>(variables: I) -> Expr
where
    I: IntoIterator<Item = Expr>,
{
    let mut vrs = Vec::new();
    let mut coefficient = 1.0;
    let mut plain = true;
    let mut any = false;

    for var in variables {
        any = true;
        if var.is_zero() {
            return zero_product();
        }
        match var {
            Expr::Float(v) => coefficient *= v,
            Expr::Product(ref p) => {
                plain &= p.plain;
                for v in &p.vrs {
                    match v {
                        Expr::Float(c) => coefficient *= c,
                        _ => vrs.push(v.clone()),
                    }
                }
            }
            Expr::Sum(_) | Expr::Fraction(_) => {
                plain = false;
                vrs.push(var);
            }
            Expr::Symbol(_) => vrs.push(var),
        }
    }

    if !any || coefficient == 0.0 {
        return zero_product();
    }
    if coefficient != 1.0 || vrs.is_empty() {
        vrs.push(make_float(coefficient));
    }
    vrs.sort();
    product_node(vrs, coefficient, plain)
}

fn zero_product() -> Expr {
    product_node(vec![make_float(0.0)], 0.0, true)
}

fn product_node(vrs: Vec<Expr>, val: f64, plain: bool) -> Expr {
    let t = min_var_type(&vrs);
    let repr = format!("Product([{}])", vrs.iter().map(|v| v.repr()).join(", "));
    Expr::Product(Arc::new(Product {
        vrs,
        val,
        t,
        repr,
        plain,
        expanded: OnceLock::new(),
    }))
}

/// Creates a sum of the given variables.
///
/// Nested sums are flattened, zero terms are dropped and all numeric terms are folded into a
/// single float, which is dropped if it is zero and other terms remain.
pub fn make_sum<I>(variables: I) -> Expr
where
    I: IntoIterator<Item = Expr>,
{
    let mut vrs = Vec::new();
    let mut constant = 0.0;

    for var in variables {
        match var {
            Expr::Float(v) => constant += v,
            Expr::Sum(ref s) => {
                for v in &s.vrs {
                    match v {
                        Expr::Float(c) => constant += c,
                        _ => vrs.push(v.clone()),
                    }
                }
            }
            _ if var.is_zero() => {}
            _ => vrs.push(var),
        }
    }

    if constant != 0.0 || vrs.is_empty() {
        vrs.push(make_float(constant));
    }
    vrs.sort();
    sum_node(vrs, false)
}

pub(crate) fn sum_node(vrs: Vec<Expr>, canonical: bool) -> Expr {
    let t = min_var_type(&vrs);
    let val = match vrs.as_slice() {
        [single] if single.is_zero() => 0.0,
        _ => 1.0,
    };
    let repr = format!("Sum([{}])", vrs.iter().map(|v| v.repr()).join(", "));
    Expr::Sum(Arc::new(Sum {
        vrs,
        val,
        t,
        repr,
        canonical,
        expanded: OnceLock::new(),
    }))
}

/// Creates the fraction `num / denom`.
///
/// A zero numerator gives `0.0` and a denominator of `1.0` gives the numerator.
///
/// # Errors
///
/// Returns [`Error::DivisionByZero`] if the denominator is zero.
pub fn make_fraction(num: Expr, denom: Expr) -> Result<Expr, Error> {
    if denom.is_zero() {
        return Err(Error::DivisionByZero {
            numerator: num.to_string(),
        });
    }
    if num.is_zero() {
        return Ok(make_float(0.0));
    }
    if denom.as_float() == Some(1.0) {
        return Ok(num);
    }
    Ok(fraction_node(num, denom, false))
}

pub(crate) fn fraction_node(num: Expr, denom: Expr, canonical: bool) -> Expr {
    let t = num.var_type().min(denom.var_type());
    let repr = format!("Fraction({}, {})", num.repr(), denom.repr());
    Expr::Fraction(Arc::new(Fraction {
        num,
        denom,
        t,
        repr,
        canonical,
        expanded: OnceLock::new(),
    }))
}

/// Replaces a product or sum with a single variable by that variable.
pub(crate) fn collapse(expr: Expr) -> Expr {
    match &expr {
        Expr::Product(p) if p.vrs.len() == 1 => p.vrs[0].clone(),
        Expr::Sum(s) if s.vrs.len() == 1 => s.vrs[0].clone(),
        _ => expr,
    }
}

fn min_var_type(vrs: &[Expr]) -> VarType {
    vrs.iter()
        .map(Expr::var_type)
        .min()
        .unwrap_or(VarType::Const)
}
