//! Expansion, operation counting and factorization.

use crate::constructors::{collapse, fraction_node, make_float, make_product, make_sum, sum_node};
use crate::expr::{Expr, Fraction, Product, Sum, VarType};
use std::collections::BTreeMap;

impl Expr {
    /// Expands the expression into a canonical sum of products.
    ///
    /// The result of expanding a compound node is cached in the node, so repeated calls are
    /// cheap and return the same node. Expanding an already expanded expression is a no-op.
    pub fn expand(&self) -> Expr {
        match self {
            Self::Float(_) | Self::Symbol(_) => self.clone(),
            Self::Product(p) => {
                if p.vrs.len() == 1 {
                    p.vrs[0].expand()
                } else if p.plain {
                    self.clone()
                } else {
                    p.expanded.get_or_init(|| expand_product(p)).clone()
                }
            }
            Self::Sum(s) => {
                if s.canonical {
                    self.clone()
                } else {
                    s.expanded.get_or_init(|| expand_sum(s)).clone()
                }
            }
            Self::Fraction(f) => {
                if f.canonical {
                    self.clone()
                } else {
                    f.expanded.get_or_init(|| expand_fraction(f)).clone()
                }
            }
        }
    }

    /// Number of floating point operations needed to evaluate the expression as written.
    pub fn ops(&self) -> usize {
        match self {
            Self::Float(_) => 0,
            Self::Symbol(s) => s.base_ops + s.base_expr.as_ref().map_or(0, Expr::ops),
            Self::Product(p) => {
                let n = p.vrs.len();
                let mut ops = n - 1 + p.vrs.iter().map(Expr::ops).sum::<usize>();
                // A leading -1 is a negation
                if n > 1 && p.vrs[0].as_float() == Some(-1.0) {
                    ops -= 1;
                }
                ops
            }
            Self::Sum(s) => s.vrs.len() - 1 + s.vrs.iter().map(Expr::ops).sum::<usize>(),
            Self::Fraction(f) => 1 + f.num.ops() + f.denom.ops(),
        }
    }

    /// Splits the expression into the factor made of variables of kind `t` and the remainder.
    ///
    /// The product of the two parts always equals the expression. Returns `(None, self)` if no
    /// such factor exists and `(Some(self), 1.0)` if nothing remains.
    pub fn reduce_vartype(&self, t: VarType) -> (Option<Expr>, Expr) {
        match self {
            Self::Float(_) | Self::Symbol(_) => {
                if self.var_type() == t {
                    (Some(self.clone()), make_float(1.0))
                } else {
                    (None, self.clone())
                }
            }
            Self::Product(p) => {
                let (found, remains): (Vec<_>, Vec<_>) = p.vrs.iter().cloned().partition(|v| v.var_type() == t);
                if found.is_empty() {
                    (None, self.clone())
                } else if remains.is_empty() {
                    (Some(self.clone()), make_float(1.0))
                } else {
                    (Some(collapse(make_product(found))), collapse(make_product(remains)))
                }
            }
            Self::Sum(_) => {
                let mut terms = self.reduce_vartype_terms(t);
                match terms.as_slice() {
                    [(Some(_), _)] => terms.swap_remove(0),
                    _ => (None, self.clone()),
                }
            }
            Self::Fraction(f) => match f.num.reduce_vartype(t) {
                (Some(found), remain) => (Some(found), fraction_node(remain, f.denom.clone(), false)),
                (None, _) => (None, self.clone()),
            },
        }
    }

    /// Partitions every term of a sum with [`Expr::reduce_vartype`] and groups the remainders of
    /// terms sharing the same factor into a new sum.
    ///
    /// For anything but a sum, this returns the single partition of the expression itself.
    pub fn reduce_vartype_terms(&self, t: VarType) -> Vec<(Option<Expr>, Expr)> {
        match self {
            Self::Sum(s) => {
                let mut groups: BTreeMap<Option<Expr>, Vec<Expr>> = BTreeMap::new();
                for v in &s.vrs {
                    let (found, remain) = v.reduce_vartype(t);
                    groups.entry(found).or_default().push(remain);
                }
                groups
                    .into_iter()
                    .map(|(found, mut remains)| {
                        let remain = if remains.len() == 1 {
                            remains.swap_remove(0)
                        } else {
                            make_sum(remains)
                        };
                        (found, remain)
                    })
                    .collect()
            }
            _ => vec![self.reduce_vartype(t)],
        }
    }

    /// Expands the expression and, for sums, factorizes common factors of kind basis, `Ip`
    /// and geometry when doing so reduces the operation count.
    pub fn reduce_ops(&self) -> Expr {
        let expanded = self.expand();
        match expanded {
            Self::Sum(ref s) => factorize(&expanded, s.vrs.len()),
            _ => expanded,
        }
    }
}

fn factorize(sum: &Expr, num_terms: usize) -> Expr {
    let mut best = sum.clone();
    let mut best_ops = best.ops();

    for t in [VarType::Basis, VarType::Ip, VarType::Geometry] {
        let groups = sum.reduce_vartype_terms(t);
        if groups.len() == num_terms || groups.iter().all(|(found, _)| found.is_none()) {
            continue;
        }

        let terms = groups.into_iter().map(|(found, remain)| match found {
            Some(found) => collapse(make_product([found, remain.reduce_ops()])),
            None => remain.reduce_ops(),
        });
        let candidate = collapse(make_sum(terms));
        let ops = candidate.ops();
        if ops < best_ops {
            best = candidate;
            best_ops = ops;
        }
    }

    best
}

fn expand_product(p: &Product) -> Expr {
    let mut factors = Vec::new();
    let mut compound = Vec::new();
    for v in &p.vrs {
        match v.expand() {
            e @ (Expr::Float(_) | Expr::Symbol(_) | Expr::Product(_)) => factors.push(e),
            e => compound.push(e),
        }
    }

    let aggregate = (!factors.is_empty()).then(|| collapse(make_product(factors)));
    let result = aggregate
        .into_iter()
        .chain(compound)
        .reduce(|acc, e| acc.times(&e))
        .unwrap_or_else(|| make_float(1.0));

    match result {
        Expr::Sum(_) | Expr::Fraction(_) => result.expand(),
        _ => collapse(result),
    }
}

fn expand_sum(s: &Sum) -> Expr {
    let mut terms = Vec::new();
    for v in &s.vrs {
        match v.expand() {
            Expr::Sum(inner) => terms.extend(inner.vrs.iter().cloned()),
            e => terms.push(e),
        }
    }

    let mut constant = 0.0;
    let mut coefficients: BTreeMap<Expr, f64> = BTreeMap::new();
    let mut numerators: BTreeMap<Expr, Vec<Expr>> = BTreeMap::new();
    for term in terms {
        match term {
            Expr::Float(v) => constant += v,
            Expr::Product(ref p) => {
                let vars = p.get_vrs();
                match vars {
                    [] => constant += p.val,
                    [single] => *coefficients.entry(single.clone()).or_insert(0.0) += p.val,
                    _ => *coefficients.entry(make_product(vars.iter().cloned())).or_insert(0.0) += p.val,
                }
            }
            Expr::Fraction(ref f) => numerators
                .entry(f.denom.clone())
                .or_default()
                .push(f.num.clone()),
            Expr::Symbol(_) | Expr::Sum(_) => *coefficients.entry(term).or_insert(0.0) += 1.0,
        }
    }

    let mut vrs = Vec::new();
    for (key, coefficient) in coefficients {
        if coefficient == 1.0 {
            vrs.push(key);
        } else if coefficient != 0.0 {
            vrs.push(make_product([make_float(coefficient), key]));
        }
    }
    for (denom, mut nums) in numerators {
        let num = if nums.len() == 1 {
            nums.swap_remove(0)
        } else {
            make_sum(nums).expand()
        };
        if !num.is_zero() {
            vrs.push(fraction_node(num, denom, true));
        }
    }
    if constant != 0.0 {
        vrs.push(make_float(constant));
    }

    match vrs.len() {
        0 => make_float(0.0),
        1 => vrs.swap_remove(0),
        _ => {
            vrs.sort();
            sum_node(vrs, true)
        }
    }
}

fn expand_fraction(f: &Fraction) -> Expr {
    let num = f.num.expand();
    let denom = f.denom.expand();
    if num.is_zero() {
        return make_float(0.0);
    }
    if denom.is_zero() {
        // Degenerate, kept as written
        return fraction_node(num, denom, true);
    }
    canonicalize(num.divide(&denom))
}

fn canonicalize(expr: Expr) -> Expr {
    match expr {
        Expr::Fraction(ref f) if !f.canonical => fraction_node(f.num.expand(), f.denom.expand(), true),
        _ => expr.expand(),
    }
}
