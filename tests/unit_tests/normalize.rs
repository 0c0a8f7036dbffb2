use super::{f, u, v};
use formc::error::CompileError;
use formc::form::{FormExpr, Index, IndexId, MathFunction, Restriction};
use formc::normalize::{expand_derivatives, expand_indices, normalize, purge_list_tensors};

fn contains_index_sum(expr: &FormExpr) -> bool {
    matches!(expr, FormExpr::IndexSum { .. }) || expr.operands().into_iter().any(contains_index_sum)
}

#[test]
fn index_sums_are_expanded_and_list_tensors_purged() {
    let i = IndexId(0);
    let vector = FormExpr::ListTensor(vec![FormExpr::constant(0), FormExpr::constant(1)]);
    let summand = vector.clone().index([Index::Free(i)]) * vector.index([Index::Free(i)]);
    let integrand = FormExpr::index_sum(summand, i, 2) * v();

    let expanded = expand_indices(&integrand);
    assert!(!contains_index_sum(&expanded));

    let normalized = normalize(&integrand).unwrap();
    let expected = FormExpr::Product(vec![
        FormExpr::Sum(vec![
            FormExpr::Product(vec![FormExpr::constant(0), FormExpr::constant(0)]),
            FormExpr::Product(vec![FormExpr::constant(1), FormExpr::constant(1)]),
        ]),
        v(),
    ]);
    assert_eq!(normalized, expected);
}

#[test]
fn substitution_stops_at_component_tensors_binding_the_index() {
    let i = IndexId(3);
    let inner = FormExpr::ComponentTensor(Box::new(f().index([Index::Free(i)])), vec![i]);
    let integrand = FormExpr::index_sum(inner.index([Index::Free(i)]), i, 2);

    match expand_indices(&integrand) {
        FormExpr::Sum(terms) => {
            assert_eq!(terms.len(), 2);
            for (value, term) in terms.iter().enumerate() {
                let FormExpr::Indexed(tensor, indices) = term else {
                    panic!("expected indexed term, got {term}");
                };
                assert_eq!(indices, &vec![Index::Fixed(value)]);
                let FormExpr::ComponentTensor(operand, _) = tensor.as_ref() else {
                    panic!("expected component tensor, got {tensor}");
                };
                assert_eq!(operand.as_ref(), &f().index([Index::Free(i)]));
            }
        }
        other => panic!("expected sum, got {other}"),
    }
}

#[test]
fn derivatives_follow_the_product_rule() {
    let integrand = (f() * v()).dx(0);
    let expanded = expand_derivatives(&integrand).unwrap();
    let expected = FormExpr::Sum(vec![
        FormExpr::Product(vec![f().dx(0), v()]),
        FormExpr::Product(vec![f(), v().dx(0)]),
    ]);
    assert_eq!(expanded, expected);
}

#[test]
fn derivatives_of_constants_vanish() {
    let integrand = (FormExpr::constant(0) * v()).dx(1);
    let expanded = expand_derivatives(&integrand).unwrap();
    assert_eq!(expanded, FormExpr::Product(vec![FormExpr::constant(0), v().dx(1)]));

    let constant = (FormExpr::constant(0) + FormExpr::float(2.0)).dx(0);
    assert!(expand_derivatives(&constant).unwrap().is_zero());
}

#[test]
fn derivatives_follow_the_chain_rule() {
    let integrand = f().apply(MathFunction::Sin).dx(0);
    let expanded = expand_derivatives(&integrand).unwrap();
    assert_eq!(
        expanded,
        FormExpr::Product(vec![f().apply(MathFunction::Cos), f().dx(0)])
    );

    let power = f().pow(FormExpr::float(3.0)).dx(0);
    assert_eq!(
        expand_derivatives(&power).unwrap(),
        FormExpr::Product(vec![
            FormExpr::float(3.0),
            f().pow(FormExpr::float(2.0)),
            f().dx(0)
        ])
    );
}

#[test]
fn second_derivatives_stay_on_terminals() {
    let integrand = u().dx(0).dx(1);
    let expanded = expand_derivatives(&integrand).unwrap();
    assert_eq!(expanded, u().dx(0).dx(1));
}

#[test]
fn second_derivatives_of_components_stay_on_terminals() {
    let component = v().index([Index::Fixed(0)]).dx(0).dx(1);
    assert_eq!(expand_derivatives(&component).unwrap(), component);

    let restricted = v().restricted(Restriction::Plus).dx(0).dx(1);
    assert_eq!(
        expand_derivatives(&restricted).unwrap(),
        v().dx(0).dx(1).restricted(Restriction::Plus)
    );

    let restricted_component = f().restricted(Restriction::Minus).index([Index::Fixed(1)]).dx(1).dx(0);
    assert!(expand_derivatives(&restricted_component).is_ok());
}

#[test]
fn derivative_of_abs_is_unsupported() {
    let integrand = v().apply(MathFunction::Abs).dx(0);
    assert!(matches!(
        expand_derivatives(&integrand),
        Err(CompileError::UnsupportedConstruct { .. })
    ));
}

#[test]
fn identity_is_resolved_for_fixed_indices() {
    let identity = FormExpr::Identity(2);
    let diagonal = identity.clone().index([Index::Fixed(1), Index::Fixed(1)]);
    let off_diagonal = identity.index([Index::Fixed(0), Index::Fixed(1)]);
    assert_eq!(purge_list_tensors(&diagonal).unwrap(), FormExpr::float(1.0));
    assert_eq!(purge_list_tensors(&off_diagonal).unwrap(), FormExpr::float(0.0));
}

#[test]
fn out_of_range_list_tensor_components_are_rejected() {
    let vector = FormExpr::ListTensor(vec![f(), f()]).component(2);
    assert!(matches!(
        purge_list_tensors(&vector),
        Err(CompileError::UnsupportedConstruct { .. })
    ));
}
