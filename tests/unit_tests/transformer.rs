use super::{add_p1_tables, centroid_rule, f, p1_form, u, v};
use formc::element::{CellType, ElementId, FiniteElement};
use formc::error::CompileError;
use formc::form::{Argument, DomainType, FormExpr, FormRepresentation, Index, IndexId, MathFunction, Restriction};
use formc::geometry::UfcGeometry;
use formc::normalize::normalize;
use formc::options::CompilerOptions;
use formc::symbolics::Expr;
use formc::tables::TableRegistry;
use formc::transformer::{CodeMap, LoopIndex, QuadratureTransformer};
use std::collections::BTreeSet;

fn triangle_form(domain_type: DomainType) -> FormRepresentation {
    let rule = match domain_type {
        DomainType::Cell => centroid_rule(CellType::Triangle),
        _ => centroid_rule(CellType::Interval),
    };
    p1_form(CellType::Triangle, domain_type, &rule, v())
}

fn registry(form: &FormRepresentation, domain_type: DomainType, options: &CompilerOptions) -> TableRegistry {
    TableRegistry::new(&form.psi_tables[&domain_type], options).unwrap()
}

/// Visits the normalized integrand at the single point of the centroid rule.
fn visit(transformer: &mut QuadratureTransformer, integrand: &FormExpr) -> Result<CodeMap, CompileError> {
    transformer.update_points(1);
    transformer.visit(&normalize(integrand)?)
}

/// The value of a code map that does not depend on any argument.
fn scalar(code: &CodeMap) -> &Expr {
    assert_eq!(code.len(), 1);
    &code[&Vec::<LoopIndex>::new()]
}

/// Evaluates an expression with the centroid values of the linear Lagrange basis.
fn evaluate(expr: &Expr, values: &[(&str, f64)]) -> f64 {
    expr.evaluate(&|name| {
        values
            .iter()
            .find(|(symbol, _)| *symbol == name)
            .map(|(_, value)| *value)
    })
    .unwrap_or_else(|| panic!("could not evaluate {expr}"))
}

#[test]
fn mass_integrand_has_test_and_trial_indices() {
    let options = CompilerOptions::default();
    let form = triangle_form(DomainType::Cell);
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(None, None);

    let code = visit(&mut transformer, &(v() * u())).unwrap();
    assert_eq!(code.len(), 1);
    let (key, value) = code.iter().next().unwrap();
    let entries: Vec<_> = key.iter().map(|index| (index.argument, index.entry.as_str(), index.range)).collect();
    assert_eq!(entries, vec![(0, "j", 3), (1, "k", 3)]);
    assert_eq!(value.to_string(), "FE0[0][j]*FE0[0][k]");

    let third = 1.0 / 3.0;
    let mass = evaluate(value, &[("FE0[0][j]", third), ("FE0[0][k]", third)]);
    assert!((mass - 1.0 / 9.0).abs() < 1e-14);

    assert_eq!(transformer.used_psi_tables(), &BTreeSet::from(["FE0".to_string()]));
    assert_eq!(transformer.geometric_dimension(), Some(2));
    assert!(transformer.trans_set().is_empty());
}

#[test]
fn derivatives_are_mapped_with_the_inverse_jacobian() {
    let options = CompilerOptions::default();
    let form = triangle_form(DomainType::Cell);
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(None, None);

    let code = visit(&mut transformer, &v().dx(0)).unwrap();
    let value = &code.values().next().unwrap();
    let names = ["K_00", "K_10"].map(String::from);
    assert_eq!(transformer.trans_set(), &BTreeSet::from(names));

    let dv = evaluate(
        value,
        &[("K_00", 2.0), ("K_10", 3.0), ("FE0_D10[0][j]", -1.0), ("FE0_D01[0][j]", -1.0)],
    );
    assert_eq!(dv, -5.0);
}

#[test]
fn coefficient_products_are_cached() {
    let options = CompilerOptions::default();
    let form = triangle_form(DomainType::Cell);
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(None, None);

    let code = visit(&mut transformer, &(f() * f() * v())).unwrap();
    let functions = transformer.function_values();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].name, "F0");
    assert_eq!(functions[0].range, 3);
    assert_eq!(functions[0].value.to_string(), "FE0[0][r]*w[0][r]");
    assert_eq!(code.values().next().unwrap().to_string(), "F0*F0*FE0[0][j]");

    // A new quadrature loop caches anew but continues the numbering
    let code = visit(&mut transformer, &(f() * v())).unwrap();
    assert_eq!(transformer.function_values().len(), 1);
    assert_eq!(code.values().next().unwrap().to_string(), "F1*FE0[0][j]");

    // A new facet restarts the numbering
    transformer.update_facets(None, None);
    visit(&mut transformer, &(f() * v())).unwrap();
    assert_eq!(transformer.function_values()[0].name, "F0");
}

#[test]
fn constants_are_read_from_the_coefficient_array() {
    let options = CompilerOptions::default();
    let form = triangle_form(DomainType::Cell);
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);

    let code = visit(&mut transformer, &FormExpr::constant(2)).unwrap();
    assert_eq!(scalar(&code).to_string(), "w[2][0]");

    let code = visit(&mut transformer, &FormExpr::vector_constant(1, 2).component(1)).unwrap();
    assert_eq!(scalar(&code).to_string(), "w[1][1]");

    let error = visit(&mut transformer, &FormExpr::vector_constant(1, 2).component(2)).unwrap_err();
    assert!(matches!(error, CompileError::ComponentMismatch { expected: 2, .. }));
}

#[test]
fn powers_and_functions_of_coefficients() {
    let options = CompilerOptions::default();
    let form = triangle_form(DomainType::Cell);
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(None, None);

    let square = visit(&mut transformer, &f().pow(FormExpr::IntLiteral(2))).unwrap();
    assert_eq!(scalar(&square).to_string(), "F0*F0");

    let reciprocal = visit(&mut transformer, &f().pow(FormExpr::IntLiteral(-1))).unwrap();
    let value = evaluate(&scalar(&reciprocal), &[("F1", 4.0)]);
    assert_eq!(value, 0.25);

    let root = visit(&mut transformer, &f().pow(FormExpr::float(0.5))).unwrap();
    assert_eq!(scalar(&root).to_string(), "std::pow(F2, 0.5)");

    let sqrt = visit(&mut transformer, &f().apply(MathFunction::Sqrt)).unwrap();
    let sqrt = &scalar(&sqrt);
    assert_eq!(sqrt.to_string(), "std::sqrt(F3)");
    assert_eq!(evaluate(sqrt, &[("F3", 9.0)]), 3.0);

    let huge = visit(&mut transformer, &f().pow(FormExpr::IntLiteral(1_000_000))).unwrap();
    assert_eq!(scalar(&huge).to_string(), "std::pow(F4, 1000000.0)");

    let error = visit(&mut transformer, &f().pow(f())).unwrap_err();
    assert!(matches!(error, CompileError::UnsupportedConstruct { .. }));
}

#[test]
fn vanishing_factors_make_the_product_vanish() {
    let options = CompilerOptions::default();
    let form = triangle_form(DomainType::Cell);
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(None, None);
    transformer.update_points(1);

    let integrand = FormExpr::Product(vec![f(), FormExpr::Sum(Vec::new()), v()]);
    assert!(transformer.visit(&integrand).unwrap().is_empty());
}

#[test]
fn invalid_integrands_are_rejected() {
    let options = CompilerOptions::default();
    let form = triangle_form(DomainType::Cell);
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(None, None);

    let error = visit(&mut transformer, &(v() / u())).unwrap_err();
    assert!(matches!(error, CompileError::UnsupportedDenominator { .. }));

    let error = visit(&mut transformer, &(v() * v())).unwrap_err();
    assert!(matches!(error, CompileError::IndexCollision { .. }));

    let error = visit(&mut transformer, &(v() / FormExpr::float(0.0))).unwrap_err();
    assert!(matches!(error, CompileError::DivisionByZero { .. }));

    let unbound = FormExpr::ListTensor(vec![f(), f()]).index([Index::Free(IndexId(7))]);
    let error = visit(&mut transformer, &unbound).unwrap_err();
    assert!(matches!(error, CompileError::UnboundIndex { .. }));

    let tensor = FormExpr::ComponentTensor(Box::new(f()), vec![IndexId(0), IndexId(1)]);
    let error = visit(&mut transformer, &tensor.component(0)).unwrap_err();
    assert_eq!(error, CompileError::ComponentMismatch { expected: 2, found: 1 });

    let third = FormExpr::Argument(Argument {
        number: 2,
        element: ElementId(0),
    });
    let error = visit(&mut transformer, &third).unwrap_err();
    assert!(matches!(error, CompileError::UnsupportedConstruct { .. }));

    let error = visit(&mut transformer, &FormExpr::FacetNormal).unwrap_err();
    assert!(matches!(error, CompileError::UnsupportedConstruct { .. }));
}

#[test]
fn derivatives_of_quadrature_elements_are_unsupported() {
    let options = CompilerOptions::default();
    let cell = CellType::Triangle;
    let mut form = FormRepresentation::new(
        cell,
        vec![FiniteElement::lagrange(cell, 1), FiniteElement::quadrature(cell, 1, 1)],
    );
    add_p1_tables(&mut form, DomainType::Cell, ElementId(0), &centroid_rule(cell));
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);

    let q = FormExpr::coefficient(0, ElementId(1));
    let error = visit(&mut transformer, &(q.dx(0) * v())).unwrap_err();
    assert_eq!(
        error,
        CompileError::UnsupportedDerivative {
            family: "Quadrature".to_string()
        }
    );
}

#[test]
fn cells_must_share_the_geometric_dimension() {
    let options = CompilerOptions::default();
    let mut form = FormRepresentation::new(
        CellType::Triangle,
        vec![
            FiniteElement::lagrange(CellType::Triangle, 1),
            FiniteElement::lagrange(CellType::Interval, 1),
        ],
    );
    add_p1_tables(&mut form, DomainType::Cell, ElementId(0), &centroid_rule(CellType::Triangle));
    form.cell = CellType::Interval;
    add_p1_tables(&mut form, DomainType::Cell, ElementId(1), &centroid_rule(CellType::Interval));
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);

    let interval_trial = FormExpr::trial_function(ElementId(1));
    let error = visit(&mut transformer, &(v() * interval_trial)).unwrap_err();
    assert_eq!(
        error,
        CompileError::GeometricDimensionMismatch {
            expected: 2,
            found: 1
        }
    );
}

#[test]
fn restrictions_select_facets_and_offsets() {
    let options = CompilerOptions::default();
    let form = triangle_form(DomainType::InteriorFacet);
    let registry = registry(&form, DomainType::InteriorFacet, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(Some(0), Some(2));

    let integrand = v().restricted(Restriction::Plus) * u().dx(1).restricted(Restriction::Minus);
    let code = visit(&mut transformer, &integrand).unwrap();
    assert!(!code.is_empty());
    for key in code.keys() {
        assert_eq!(key[0].entry, "j");
        assert_eq!(key[0].space_dimension, 6);
        assert_eq!(key[1].entry, "(k + 3)");
        assert_eq!(key[1].space_dimension, 6);
    }
    let tables = transformer.used_psi_tables();
    assert!(tables.contains("FE0_f0"));
    // Derivative tables are the same on all facets
    assert!(tables.contains("FE0_f0_D10"));
    assert!(tables.contains("FE0_f0_D01"));
    assert!(transformer.trans_set().contains("K1_01"));
    assert!(transformer.trans_set().contains("K1_11"));

    let function = visit(&mut transformer, &(f().restricted(Restriction::Minus) * v().restricted(Restriction::Plus))).unwrap();
    assert!(!function.is_empty());
    assert_eq!(transformer.function_values()[0].value.to_string(), "FE0_f2[0][r]*w[0][r + 3]");
}

#[test]
fn reset_clears_the_state_of_the_previous_integral() {
    let options = CompilerOptions::default();
    let form = triangle_form(DomainType::Cell);
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(None, None);

    visit(&mut transformer, &(f() * v().dx(0))).unwrap();
    transformer.weight();
    transformer.scale_factor();
    assert!(!transformer.used_psi_tables().is_empty());
    assert!(transformer.used_weights().contains(&1));
    assert!(transformer.trans_set().contains("det"));

    transformer.reset().unwrap();
    assert!(transformer.used_psi_tables().is_empty());
    assert!(transformer.used_weights().is_empty());
    assert!(transformer.trans_set().is_empty());
    assert!(transformer.function_values().is_empty());
    assert_eq!(transformer.geometric_dimension(), None);
}

#[test]
fn failed_visits_leave_no_scopes_behind() {
    let options = CompilerOptions::default();
    let form = triangle_form(DomainType::Cell);
    let registry = registry(&form, DomainType::Cell, &options);
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);

    let failing = FormExpr::ListTensor(vec![f().dx(0) * FormExpr::FacetNormal]).component(0);
    let tensor = FormExpr::ComponentTensor(Box::new(failing), vec![IndexId(0)]);
    assert!(visit(&mut transformer, &tensor.index([Index::Fixed(0)])).is_err());
    assert!(transformer.reset().is_ok());
}
