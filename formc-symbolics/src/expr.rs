use itertools::Itertools;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// The kind of quantity a symbol stands for.
///
/// Kinds are ordered by how often the quantity changes inside the generated loops: constants
/// never change, geometry changes per cell, `Ip` quantities change per integration point and
/// basis function values change per integration point and per degree of freedom.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VarType {
    Const,
    Geometry,
    Ip,
    Basis,
}

impl VarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Const => "CONST",
            Self::Geometry => "GEO",
            Self::Ip => "IP",
            Self::Basis => "BASIS",
        }
    }
}

/// A symbolic expression.
///
/// Compound nodes are reference counted, so cloning an expression is cheap and expressions can be
/// shared freely between threads.
#[derive(Clone)]
pub enum Expr {
    Float(f64),
    Symbol(Arc<Symbol>),
    Product(Arc<Product>),
    Sum(Arc<Sum>),
    Fraction(Arc<Fraction>),
}

/// A named quantity, possibly abbreviating a more expensive expression.
#[derive(Debug)]
pub struct Symbol {
    pub(crate) name: String,
    pub(crate) t: VarType,
    pub(crate) base_expr: Option<Expr>,
    pub(crate) base_ops: usize,
    pub(crate) repr: String,
}

#[derive(Debug)]
pub struct Product {
    pub(crate) vrs: Vec<Expr>,
    pub(crate) val: f64,
    pub(crate) t: VarType,
    pub(crate) repr: String,
    // No variable is a sum or a fraction
    pub(crate) plain: bool,
    pub(crate) expanded: OnceLock<Expr>,
}

#[derive(Debug)]
pub struct Sum {
    pub(crate) vrs: Vec<Expr>,
    pub(crate) val: f64,
    pub(crate) t: VarType,
    pub(crate) repr: String,
    // Produced by expansion, expanding again is a no-op
    pub(crate) canonical: bool,
    pub(crate) expanded: OnceLock<Expr>,
}

#[derive(Debug)]
pub struct Fraction {
    pub(crate) num: Expr,
    pub(crate) denom: Expr,
    pub(crate) t: VarType,
    pub(crate) repr: String,
    pub(crate) canonical: bool,
    pub(crate) expanded: OnceLock<Expr>,
}

impl Symbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var_type(&self) -> VarType {
        self.t
    }

    /// The expression abbreviated by this symbol, if any.
    pub fn base_expr(&self) -> Option<&Expr> {
        self.base_expr.as_ref()
    }

    pub fn base_ops(&self) -> usize {
        self.base_ops
    }

    fn evaluate_base(&self, values: &dyn Fn(&str) -> Option<f64>) -> Option<f64> {
        let arg = self.base_expr.as_ref()?.evaluate(values)?;
        let function = self.name.strip_prefix("std::")?.split('(').next()?;
        match function {
            "sqrt" => Some(arg.sqrt()),
            "exp" => Some(arg.exp()),
            "log" => Some(arg.ln()),
            "cos" => Some(arg.cos()),
            "sin" => Some(arg.sin()),
            "abs" | "fabs" => Some(arg.abs()),
            _ => None,
        }
    }
}

impl Product {
    /// All variables, including the numeric coefficient if it differs from one.
    pub fn vars(&self) -> &[Expr] {
        &self.vrs
    }

    /// The aggregated numeric coefficient.
    pub fn coefficient(&self) -> f64 {
        self.val
    }

    /// The variables without the numeric coefficient.
    pub fn get_vrs(&self) -> &[Expr] {
        match self.vrs.first() {
            Some(Expr::Float(_)) => &self.vrs[1..],
            _ => &self.vrs,
        }
    }
}

impl Sum {
    pub fn vars(&self) -> &[Expr] {
        &self.vrs
    }
}

impl Fraction {
    pub fn numerator(&self) -> &Expr {
        &self.num
    }

    pub fn denominator(&self) -> &Expr {
        &self.denom
    }
}

impl Expr {
    /// Precedence used for sorting and for parenthesizing generated code.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Float(_) => 0,
            Self::Symbol(_) => 1,
            Self::Product(_) => 2,
            Self::Sum(_) => 3,
            Self::Fraction(_) => 4,
        }
    }

    /// The lowest kind among the quantities the expression depends on.
    pub fn var_type(&self) -> VarType {
        match self {
            Self::Float(_) => VarType::Const,
            Self::Symbol(s) => s.t,
            Self::Product(p) => p.t,
            Self::Sum(s) => s.t,
            Self::Fraction(f) => f.t,
        }
    }

    /// The numeric value associated with the node.
    ///
    /// For products this is the aggregated coefficient. Sums report `0.0` only when they are
    /// identically zero. Symbols report `1.0`.
    pub fn val(&self) -> f64 {
        match self {
            Self::Float(v) => *v,
            Self::Symbol(_) => 1.0,
            Self::Product(p) => p.val,
            Self::Sum(s) => s.val,
            Self::Fraction(f) => f.num.val(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.val() == 0.0
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Canonical representation used for equality, ordering and hashing.
    pub fn repr(&self) -> Cow<'_, str> {
        match self {
            Self::Float(v) => Cow::Owned(format!("FloatValue({})", format_float(*v))),
            Self::Symbol(s) => Cow::Borrowed(&s.repr),
            Self::Product(p) => Cow::Borrowed(&p.repr),
            Self::Sum(s) => Cow::Borrowed(&s.repr),
            Self::Fraction(f) => Cow::Borrowed(&f.repr),
        }
    }

    /// Evaluates the expression numerically.
    ///
    /// Symbols are looked up through `values`. A symbol abbreviating a math function call is
    /// evaluated through its base expression when its name is not bound. Returns `None` if
    /// some symbol could not be evaluated.
    pub fn evaluate(&self, values: &dyn Fn(&str) -> Option<f64>) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Symbol(s) => values(&s.name).or_else(|| s.evaluate_base(values)),
            Self::Product(p) => p
                .vrs
                .iter()
                .try_fold(1.0, |acc, v| Some(acc * v.evaluate(values)?)),
            Self::Sum(s) => s
                .vrs
                .iter()
                .try_fold(0.0, |acc, v| Some(acc + v.evaluate(values)?)),
            Self::Fraction(f) => Some(f.num.evaluate(values)? / f.denom.evaluate(values)?),
        }
    }

    fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Symbol(a), Self::Symbol(b)) => Arc::ptr_eq(a, b),
            (Self::Product(a), Self::Product(b)) => Arc::ptr_eq(a, b),
            (Self::Sum(a), Self::Sum(b)) => Arc::ptr_eq(a, b),
            (Self::Fraction(a), Self::Fraction(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Formats a floating point literal so that it reads back to the same value.
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Expr {}

impl PartialOrd for Expr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence()
            .cmp(&other.precedence())
            .then_with(|| self.repr().cmp(&other.repr()))
    }
}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.precedence().hash(state);
        self.repr().hash(state);
    }
}

impl Debug for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr())
    }
}

fn parenthesize(expr: &Expr, min_precedence: u8) -> String {
    if expr.precedence() >= min_precedence {
        format!("({expr})")
    } else {
        expr.to_string()
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{}", format_float(*v)),
            Self::Symbol(s) => write!(f, "{}", s.name),
            Self::Product(p) => {
                let mut vars: &[Expr] = &p.vrs;
                if vars.len() > 1 && vars[0].as_float() == Some(-1.0) {
                    write!(f, "-")?;
                    vars = &vars[1..];
                }
                let factors = vars.iter().map(|v| parenthesize(v, 3)).join("*");
                write!(f, "{factors}")
            }
            Self::Sum(s) => {
                for (i, v) in s.vrs.iter().enumerate() {
                    let term = v.to_string();
                    if i == 0 {
                        write!(f, "{term}")?;
                    } else if let Some(negated) = term.strip_prefix('-') {
                        write!(f, " - {negated}")?;
                    } else {
                        write!(f, " + {term}")?;
                    }
                }
                Ok(())
            }
            Self::Fraction(frac) => {
                write!(f, "{}/{}", parenthesize(&frac.num, 3), parenthesize(&frac.denom, 2))
            }
        }
    }
}
