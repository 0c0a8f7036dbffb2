//! Rewrites an integrand into the restricted form understood by the quadrature transformer.
//!
//! Three passes are applied in order:
//!
//! 1. [`expand_indices`] replaces every index sum by an explicit sum over the fixed values of
//!    its index.
//! 2. [`expand_derivatives`] applies the rules of differentiation until spatial derivatives
//!    are only applied to arguments and coefficients.
//! 3. [`purge_list_tensors`] resolves list tensors and identities indexed by fixed indices.
use crate::error::CompileError;
use crate::form::{FormExpr, Index, IndexId, MathFunction};
use std::convert::Infallible;

pub fn normalize(expr: &FormExpr) -> Result<FormExpr, CompileError> {
    let expr = expand_indices(expr);
    let expr = expand_derivatives(&expr)?;
    purge_list_tensors(&expr)
}

/// Replaces index sums by sums over fixed index values.
pub fn expand_indices(expr: &FormExpr) -> FormExpr {
    match expr {
        FormExpr::IndexSum {
            summand,
            index,
            dimension,
        } => {
            let summand = expand_indices(summand);
            let terms = (0..*dimension)
                .map(|value| substitute(&summand, *index, value))
                .collect();
            sum(terms)
        }
        _ => map_operands(expr, expand_indices),
    }
}

/// Replaces the free index `id` by the fixed value `value`.
fn substitute(expr: &FormExpr, id: IndexId, value: usize) -> FormExpr {
    let replace = |index: &Index| match index {
        Index::Free(i) if *i == id => Index::Fixed(value),
        other => *other,
    };
    match expr {
        FormExpr::Indexed(a, indices) => FormExpr::Indexed(
            Box::new(substitute(a, id, value)),
            indices.iter().map(replace).collect(),
        ),
        FormExpr::SpatialDerivative(a, index) => {
            FormExpr::SpatialDerivative(Box::new(substitute(a, id, value)), replace(index))
        }
        // The component tensor binds its own indices
        FormExpr::ComponentTensor(_, bound) if bound.contains(&id) => expr.clone(),
        _ => map_operands(expr, |op| substitute(op, id, value)),
    }
}

/// Rebuilds `expr` with `f` applied to each of its operands.
fn map_operands(expr: &FormExpr, mut f: impl FnMut(&FormExpr) -> FormExpr) -> FormExpr {
    match try_map_operands(expr, |op| Ok::<_, Infallible>(f(op))) {
        Ok(mapped) => mapped,
        Err(never) => match never {},
    }
}

fn try_map_operands<E>(expr: &FormExpr, mut f: impl FnMut(&FormExpr) -> Result<FormExpr, E>) -> Result<FormExpr, E> {
    use FormExpr::*;
    Ok(match expr {
        Sum(ops) => Sum(ops.iter().map(&mut f).collect::<Result<_, _>>()?),
        Product(ops) => Product(ops.iter().map(&mut f).collect::<Result<_, _>>()?),
        ListTensor(ops) => ListTensor(ops.iter().map(&mut f).collect::<Result<_, _>>()?),
        Division(a, b) => Division(Box::new(f(a)?), Box::new(f(b)?)),
        Power(a, b) => Power(Box::new(f(a)?), Box::new(f(b)?)),
        MathFunction(func, a) => MathFunction(*func, Box::new(f(a)?)),
        Restricted(r, a) => Restricted(*r, Box::new(f(a)?)),
        IndexSum {
            summand,
            index,
            dimension,
        } => IndexSum {
            summand: Box::new(f(summand)?),
            index: *index,
            dimension: *dimension,
        },
        Indexed(a, indices) => Indexed(Box::new(f(a)?), indices.clone()),
        ComponentTensor(a, indices) => ComponentTensor(Box::new(f(a)?), indices.clone()),
        SpatialDerivative(a, index) => SpatialDerivative(Box::new(f(a)?), *index),
        Argument(_) | Coefficient(_) | Constant(_) | FloatLiteral(_) | IntLiteral(_) | FacetNormal | Identity(_) => {
            expr.clone()
        }
    })
}

/// Propagates spatial derivatives to the arguments and coefficients of the expression.
pub fn expand_derivatives(expr: &FormExpr) -> Result<FormExpr, CompileError> {
    match expr {
        FormExpr::SpatialDerivative(f, direction) => {
            let f = expand_derivatives(f)?;
            differentiate(&f, *direction)
        }
        _ => try_map_operands(expr, expand_derivatives),
    }
}

fn zero() -> FormExpr {
    FormExpr::FloatLiteral(0.0)
}

/// Sum of the given terms, dropping literal zeros.
fn sum(terms: Vec<FormExpr>) -> FormExpr {
    let mut terms: Vec<_> = terms.into_iter().filter(|t| !t.is_zero()).collect();
    match terms.len() {
        0 => zero(),
        1 => terms.remove(0),
        _ => FormExpr::Sum(terms),
    }
}

/// Product of the given factors, zero if any factor is a literal zero.
fn product(factors: Vec<FormExpr>) -> FormExpr {
    if factors.iter().any(FormExpr::is_zero) {
        return zero();
    }
    let mut factors: Vec<_> = factors
        .into_iter()
        .filter(|f| !matches!(f, FormExpr::FloatLiteral(v) if *v == 1.0))
        .collect();
    match factors.len() {
        0 => FormExpr::FloatLiteral(1.0),
        1 => factors.remove(0),
        _ => FormExpr::Product(factors),
    }
}

fn literal_value(expr: &FormExpr) -> Option<f64> {
    match expr {
        FormExpr::FloatLiteral(v) => Some(*v),
        FormExpr::IntLiteral(v) => Some(*v as f64),
        _ => None,
    }
}

/// The derivative of `f`, whose operands have already been expanded, in the given direction.
fn differentiate(f: &FormExpr, direction: Index) -> Result<FormExpr, CompileError> {
    let d = |g: &FormExpr| differentiate(g, direction);
    match f {
        FormExpr::Argument(_) | FormExpr::Coefficient(_) => {
            Ok(FormExpr::SpatialDerivative(Box::new(f.clone()), direction))
        }
        // Derivatives of terminals are kept as is, the transformer accumulates the directions
        FormExpr::SpatialDerivative(inner, _) if is_terminal_derivative(inner) => {
            Ok(FormExpr::SpatialDerivative(Box::new(f.clone()), direction))
        }
        FormExpr::Constant(_)
        | FormExpr::FloatLiteral(_)
        | FormExpr::IntLiteral(_)
        | FormExpr::Identity(_)
        | FormExpr::FacetNormal => Ok(zero()),
        FormExpr::Sum(ops) => Ok(sum(ops.iter().map(d).collect::<Result<_, _>>()?)),
        FormExpr::Product(ops) => {
            let mut terms = Vec::new();
            for (k, op) in ops.iter().enumerate() {
                let dop = d(op)?;
                if dop.is_zero() {
                    continue;
                }
                let mut factors = ops.clone();
                factors[k] = dop;
                terms.push(product(factors));
            }
            Ok(sum(terms))
        }
        FormExpr::Division(a, b) => {
            let da = d(a)?;
            let db = d(b)?;
            if db.is_zero() {
                return Ok(if da.is_zero() { zero() } else { da / b.as_ref().clone() });
            }
            // (a' b - a b') / b^2
            let numerator = sum(vec![
                product(vec![da, b.as_ref().clone()]),
                product(vec![FormExpr::FloatLiteral(-1.0), a.as_ref().clone(), db]),
            ]);
            if numerator.is_zero() {
                return Ok(zero());
            }
            Ok(numerator / product(vec![b.as_ref().clone(), b.as_ref().clone()]))
        }
        FormExpr::Power(base, exponent) => {
            let p = literal_value(exponent).ok_or_else(|| CompileError::UnsupportedConstruct {
                construct: format!("derivative of power with non-literal exponent: {f}"),
            })?;
            let dbase = d(base)?;
            if dbase.is_zero() || p == 0.0 {
                return Ok(zero());
            }
            let reduced = if p == 1.0 {
                FormExpr::FloatLiteral(1.0)
            } else {
                base.as_ref().clone().pow(FormExpr::FloatLiteral(p - 1.0))
            };
            Ok(product(vec![FormExpr::FloatLiteral(p), reduced, dbase]))
        }
        FormExpr::MathFunction(func, a) => {
            let da = d(a)?;
            if da.is_zero() {
                return Ok(zero());
            }
            let a = a.as_ref().clone();
            Ok(match func {
                MathFunction::Abs => {
                    return Err(CompileError::UnsupportedConstruct {
                        construct: format!("derivative of {f}"),
                    })
                }
                MathFunction::Sqrt => da / product(vec![FormExpr::FloatLiteral(2.0), f.clone()]),
                MathFunction::Exp => product(vec![f.clone(), da]),
                MathFunction::Ln => da / a,
                MathFunction::Cos => product(vec![FormExpr::FloatLiteral(-1.0), a.apply(MathFunction::Sin), da]),
                MathFunction::Sin => product(vec![a.apply(MathFunction::Cos), da]),
            })
        }
        FormExpr::Restricted(r, a) => {
            let da = d(a)?;
            Ok(if da.is_zero() { da } else { da.restricted(*r) })
        }
        FormExpr::Indexed(a, indices) => {
            if is_terminal_derivative(a) {
                return Ok(FormExpr::SpatialDerivative(Box::new(f.clone()), direction));
            }
            let da = d(a)?;
            Ok(if da.is_zero() { da } else { da.index(indices.iter().copied()) })
        }
        FormExpr::ComponentTensor(a, indices) => {
            let da = d(a)?;
            Ok(if da.is_zero() {
                da
            } else {
                FormExpr::ComponentTensor(Box::new(da), indices.clone())
            })
        }
        FormExpr::ListTensor(ops) => Ok(FormExpr::ListTensor(ops.iter().map(d).collect::<Result<_, _>>()?)),
        FormExpr::SpatialDerivative(..) | FormExpr::IndexSum { .. } => Err(CompileError::UnsupportedConstruct {
            construct: format!("derivative of unexpanded expression {f}"),
        }),
    }
}

/// Whether the expression is an argument or coefficient, possibly under derivatives, component
/// indices or restrictions.
fn is_terminal_derivative(expr: &FormExpr) -> bool {
    match expr {
        FormExpr::Argument(_) | FormExpr::Coefficient(_) => true,
        FormExpr::SpatialDerivative(inner, _) | FormExpr::Indexed(inner, _) | FormExpr::Restricted(_, inner) => {
            is_terminal_derivative(inner)
        }
        _ => false,
    }
}

/// Resolves list tensors and identities that are indexed by fixed indices.
pub fn purge_list_tensors(expr: &FormExpr) -> Result<FormExpr, CompileError> {
    let expr = try_map_operands(expr, purge_list_tensors)?;
    match expr {
        FormExpr::Indexed(ref tensor, ref indices) => match (tensor.as_ref(), indices.as_slice()) {
            (FormExpr::ListTensor(items), [Index::Fixed(k), rest @ ..]) => {
                let item = items.get(*k).ok_or_else(|| CompileError::UnsupportedConstruct {
                    construct: format!("component {k} of list tensor with {} items", items.len()),
                })?;
                if rest.is_empty() {
                    Ok(item.clone())
                } else {
                    purge_list_tensors(&FormExpr::Indexed(Box::new(item.clone()), rest.to_vec()))
                }
            }
            (FormExpr::Identity(_), [Index::Fixed(i), Index::Fixed(j)]) => {
                Ok(FormExpr::FloatLiteral(if i == j { 1.0 } else { 0.0 }))
            }
            _ => Ok(expr),
        },
        _ => Ok(expr),
    }
}
