use super::{x, y, z};
use formc_symbolics::{make_float, make_fraction, make_product, make_sum, Expr};
use std::sync::Arc;

fn values(name: &str) -> Option<f64> {
    match name {
        "x" => Some(1.5),
        "y" => Some(-0.5),
        "z" => Some(2.0),
        _ => None,
    }
}

#[test]
fn expand_distributes_products_over_sums() {
    // (x + y) * (x - y) = x*x - y*y
    let a = make_sum([x(), y()]);
    let b = make_sum([x(), make_product([make_float(-1.0), y()])]);
    let e = make_product([a, b]);
    let expanded = e.expand();
    assert_eq!(expanded.to_string(), "-y*y + x*x");
    assert_eq!(expanded.evaluate(&values), e.evaluate(&values));
}

#[test]
fn opposite_terms_cancel() {
    let s = make_sum([x(), make_product([make_float(-1.0), x()])]);
    assert_eq!(s.expand(), make_float(0.0));
}

#[test]
fn like_terms_are_combined() {
    let s = make_sum([
        make_product([make_float(2.0), x(), y()]),
        make_product([make_float(3.0), y(), x()]),
        z(),
        z(),
    ]);
    assert_eq!(s.expand().to_string(), "2.0*z + 5.0*x*y");
}

#[test]
fn expansion_is_cached_and_idempotent() {
    let e = make_product([make_sum([x(), y()]), make_sum([x(), z()])]);
    let first = e.expand();
    let second = e.expand();
    assert!(matches!((&first, &second), (Expr::Sum(a), Expr::Sum(b)) if Arc::ptr_eq(a, b)));
    assert_eq!(first.expand(), first);
}

#[test]
fn single_variable_product_expands_to_the_variable() {
    let p = make_product([make_float(2.0), make_float(0.5), x()]);
    assert_eq!(p.expand(), x());
}

#[test]
fn fractions_with_equal_denominators_are_combined() {
    let a = make_fraction(x(), z()).unwrap();
    let b = make_fraction(y(), z()).unwrap();
    let e = make_sum([a, b]).expand();
    assert_eq!(e, make_fraction(make_sum([x(), y()]), z()).unwrap());
}

#[test]
fn fraction_numerator_is_distributed() {
    // (x*z + y*z)/z = x + y
    let num = make_sum([make_product([x(), z()]), make_product([y(), z()])]);
    let e = make_fraction(num, z()).unwrap().expand();
    assert_eq!(e, make_sum([x(), y()]));
}

#[test]
fn nested_fractions_are_flattened() {
    let inner = make_fraction(x(), y()).unwrap();
    let e = make_fraction(inner, z()).unwrap().expand();
    assert_eq!(e.to_string(), "x/(y*z)");
}
