use formc::code::{Statement, TabulateTensor};
use formc::element::{CellType, ElementId, FiniteElement};
use formc::form::{DomainType, FormExpr, FormRepresentation, TableKey};
use formc::quadrature::{map_facet_points, DynamicRule};
use nalgebra::DMatrix;
use std::collections::{BTreeMap, BTreeSet};
use std::iter::Peekable;
use util::{p1_derivatives, p1_values};

mod assembler;
mod geometry;
mod normalize;
mod transformer;

/// A one point rule at the centroid of the reference simplex.
pub fn centroid_rule(cell: CellType) -> DynamicRule {
    match cell {
        CellType::Interval => (vec![1.0], vec![vec![0.5]]),
        CellType::Triangle => (vec![0.5], vec![vec![1.0 / 3.0, 1.0 / 3.0]]),
        CellType::Tetrahedron => (vec![1.0 / 6.0], vec![vec![0.25, 0.25, 0.25]]),
        _ => panic!("no centroid rule for {cell}"),
    }
}

/// Values and first derivatives of the linear Lagrange basis at the given reference points.
pub fn p1_tables(dim: usize, points: &[Vec<f64>], facet: Option<usize>) -> Vec<(TableKey, DMatrix<f64>)> {
    let mut tables = vec![(TableKey::values(facet), p1_values(dim, points))];
    for direction in 0..dim {
        let mut derivatives = vec![0; dim];
        derivatives[direction] = 1;
        tables.push((
            TableKey::new(facet, None, derivatives),
            p1_derivatives(dim, points.len(), direction),
        ));
    }
    tables
}

/// Adds the tables of the linear Lagrange element with the given id for a domain type.
///
/// For facet integrals, `rule` is a rule on the reference facet.
pub fn add_p1_tables(form: &mut FormRepresentation, domain_type: DomainType, element: ElementId, rule: &DynamicRule) {
    let cell = form.cell;
    let dim = cell.geometric_dimension();
    match domain_type {
        DomainType::Cell => {
            for (key, table) in p1_tables(dim, &rule.1, None) {
                form.add_table(domain_type, element, key, table);
            }
        }
        DomainType::ExteriorFacet | DomainType::InteriorFacet => {
            for facet in 0..cell.num_facets() {
                let points = map_facet_points(cell, facet, &rule.1).expect("facet of a simplex");
                for (key, table) in p1_tables(dim, &points, Some(facet)) {
                    form.add_table(domain_type, element, key, table);
                }
            }
        }
    }
}

/// A form with a single linear Lagrange element and one integral over the given domain.
pub fn p1_form(cell: CellType, domain_type: DomainType, rule: &DynamicRule, integrand: FormExpr) -> FormRepresentation {
    let mut form = FormRepresentation::new(cell, vec![FiniteElement::lagrange(cell, 1)]);
    form.add_integral(domain_type, 0, rule.0.clone(), integrand);
    add_p1_tables(&mut form, domain_type, ElementId(0), rule);
    form
}

pub fn v() -> FormExpr {
    FormExpr::test_function(ElementId(0))
}

pub fn u() -> FormExpr {
    FormExpr::trial_function(ElementId(0))
}

pub fn f() -> FormExpr {
    FormExpr::coefficient(0, ElementId(0))
}

/// `sum_i dv/dx_i * du/dx_i`
pub fn stiffness(dim: usize) -> FormExpr {
    FormExpr::Sum((0..dim).map(|i| v().dx(i) * u().dx(i)).collect())
}

/// All `target += value` statements, searching nested loops and blocks.
pub fn add_assignments(statements: &[Statement]) -> Vec<(String, String)> {
    let mut assignments = Vec::new();
    for statement in statements {
        match statement {
            Statement::AddAssign { target, value } => assignments.push((target.clone(), value.clone())),
            Statement::Loop { body, .. } | Statement::Block(body) => assignments.extend(add_assignments(body)),
            _ => {}
        }
    }
    assignments
}

/// The `(index, end)` of all loops, outermost first.
pub fn loops(statements: &[Statement]) -> Vec<(String, usize)> {
    let mut loops = Vec::new();
    for statement in statements {
        match statement {
            Statement::Loop { index, end, body, .. } => {
                loops.push((index.clone(), *end));
                loops.extend(self::loops(body));
            }
            Statement::Block(body) => loops.extend(self::loops(body)),
            _ => {}
        }
    }
    loops
}

pub fn cell_body(code: &TabulateTensor) -> &[Statement] {
    match code {
        TabulateTensor::Cell(body) => body,
        other => panic!("expected cell code, got {other:?}"),
    }
}

/// Entries of the element tensor `A` targeted by the statements, found by running all loops.
///
/// With `reset` the plain assignments are collected, otherwise the `+=` accumulations.
pub fn element_tensor_entries(statements: &[Statement], reset: bool) -> BTreeSet<usize> {
    let mut entries = BTreeSet::new();
    collect_entries(statements, reset, &mut BTreeMap::new(), &mut entries);
    entries
}

fn collect_entries(
    statements: &[Statement],
    reset: bool,
    bindings: &mut BTreeMap<String, usize>,
    entries: &mut BTreeSet<usize>,
) {
    for statement in statements {
        match statement {
            Statement::Assign { target, .. } if reset => entries.extend(tensor_entry(target, bindings)),
            Statement::AddAssign { target, .. } if !reset => entries.extend(tensor_entry(target, bindings)),
            Statement::Loop { index, begin, end, body } => {
                for value in *begin..*end {
                    bindings.insert(index.clone(), value);
                    collect_entries(body, reset, bindings, entries);
                }
                bindings.remove(index);
            }
            Statement::Block(body) => collect_entries(body, reset, bindings, entries),
            _ => {}
        }
    }
}

/// Evaluates the index of an `A[...]` target made of integers, loop indices, `+`, `*` and parentheses.
fn tensor_entry(target: &str, bindings: &BTreeMap<String, usize>) -> Option<usize> {
    let index = target.strip_prefix("A[")?.strip_suffix(']')?;
    let mut tokens = Vec::new();
    let mut chars = index.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_alphanumeric() || c == '_' {
            let mut token = String::new();
            while let Some(&c) = chars.peek().filter(|c| c.is_alphanumeric() || **c == '_') {
                token.push(c);
                chars.next();
            }
            tokens.push(token);
        } else {
            tokens.push(c.to_string());
            chars.next();
        }
    }
    let mut tokens = tokens.into_iter().peekable();
    let value = eval_sum(&mut tokens, bindings);
    assert_eq!(tokens.next(), None, "trailing tokens in {target}");
    Some(value)
}

type Tokens = Peekable<std::vec::IntoIter<String>>;

fn eval_sum(tokens: &mut Tokens, bindings: &BTreeMap<String, usize>) -> usize {
    let mut value = eval_product(tokens, bindings);
    while tokens.next_if_eq("+").is_some() {
        value += eval_product(tokens, bindings);
    }
    value
}

fn eval_product(tokens: &mut Tokens, bindings: &BTreeMap<String, usize>) -> usize {
    let mut value = eval_factor(tokens, bindings);
    while tokens.next_if_eq("*").is_some() {
        value *= eval_factor(tokens, bindings);
    }
    value
}

fn eval_factor(tokens: &mut Tokens, bindings: &BTreeMap<String, usize>) -> usize {
    let token = tokens.next().expect("unexpected end of index");
    if token == "(" {
        let value = eval_sum(tokens, bindings);
        assert_eq!(tokens.next().as_deref(), Some(")"));
        value
    } else if let Ok(value) = token.parse() {
        value
    } else {
        *bindings
            .get(&token)
            .unwrap_or_else(|| panic!("{token} is not a loop index in scope"))
    }
}
