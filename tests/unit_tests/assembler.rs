use super::{add_assignments, centroid_rule, loops, p1_form, u, v};
use formc::assembler::{element_tensor_entry, generate_code};
use formc::code::Statement;
use formc::element::CellType;
use formc::error::CompileError;
use formc::form::{DomainType, FormExpr};
use formc::geometry::UfcGeometry;
use formc::options::{CodeFormat, CompilerOptions};
use formc::tables::TableRegistry;
use formc::transformer::{LoopIndex, QuadratureTransformer};
use std::collections::BTreeSet;

fn loop_index(argument: i32, entry: &str) -> LoopIndex {
    LoopIndex {
        argument,
        entry: entry.to_string(),
        range: 3,
        space_dimension: 3,
    }
}

#[test]
fn element_tensor_entries_of_each_rank() {
    let format = CodeFormat::default();

    let (entry, loops) = element_tensor_entry(&[], &format).unwrap();
    assert_eq!(entry, "0");
    assert!(loops.is_empty());

    let (entry, loops) = element_tensor_entry(&[loop_index(0, "j")], &format).unwrap();
    assert_eq!(entry, "j");
    assert_eq!(loops, vec![("j".to_string(), 0, 3)]);

    let (entry, loops) = element_tensor_entry(&[loop_index(0, "j"), loop_index(1, "k")], &format).unwrap();
    assert_eq!(entry, "j*3 + k");
    assert_eq!(loops, vec![("j".to_string(), 0, 3), ("k".to_string(), 0, 3)]);

    // Negative numbers denote test and trial functions as well
    let (entry, _) = element_tensor_entry(&[loop_index(-2, "0"), loop_index(-1, "k")], &format).unwrap();
    assert_eq!(entry, "k");
}

#[test]
fn invalid_argument_combinations_are_rejected() {
    let format = CodeFormat::default();

    let error = element_tensor_entry(&[loop_index(1, "k")], &format).unwrap_err();
    assert_eq!(
        error,
        CompileError::InvalidRank {
            key: "(k)".to_string()
        }
    );

    let error = element_tensor_entry(&[loop_index(0, "j"), loop_index(0, "j")], &format).unwrap_err();
    assert!(matches!(error, CompileError::InvalidRank { .. }));

    let key = [loop_index(0, "j"), loop_index(1, "k"), loop_index(2, "l")];
    let error = element_tensor_entry(&key, &format).unwrap_err();
    assert_eq!(error, CompileError::UnsupportedRank { rank: 3 });
}

#[test]
fn mass_matrix_code_loops_over_both_arguments() {
    let options = CompilerOptions::default();
    let form = p1_form(CellType::Triangle, DomainType::Cell, &centroid_rule(CellType::Triangle), v() * u());
    let registry = TableRegistry::new(&form.psi_tables[&DomainType::Cell], &options).unwrap();
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(None, None);
    transformer.update_points(1);

    let (code, num_ops) = generate_code(&(v() * u()), &mut transformer).unwrap();
    assert_eq!(
        code[0],
        Statement::comment("Number of operations for primary indices: 36")
    );
    assert_eq!(loops(&code), vec![("j".to_string(), 3), ("k".to_string(), 3)]);
    assert_eq!(
        add_assignments(&code),
        vec![("A[j*3 + k]".to_string(), "FE0[0][j]*FE0[0][k]*W1*det".to_string())]
    );
    assert_eq!(num_ops, 36);
    assert_eq!(transformer.used_weights(), &BTreeSet::from([1]));
    assert!(transformer.trans_set().contains("det"));
}

#[test]
fn coefficients_are_accumulated_before_the_element_tensor() {
    let options = CompilerOptions::default();
    let integrand = FormExpr::coefficient(0, formc::element::ElementId(0)) * v();
    let form = p1_form(CellType::Triangle, DomainType::Cell, &centroid_rule(CellType::Triangle), integrand.clone());
    let registry = TableRegistry::new(&form.psi_tables[&DomainType::Cell], &options).unwrap();
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(None, None);
    transformer.update_points(1);

    let (code, num_ops) = generate_code(&integrand, &mut transformer).unwrap();
    assert_eq!(code[0], Statement::comment("Coefficient declarations"));
    assert_eq!(
        add_assignments(&code),
        vec![
            ("F0".to_string(), "FE0[0][r]*w[0][r]".to_string()),
            ("A[j]".to_string(), "F0*FE0[0][j]*W1*det".to_string()),
        ]
    );
    assert_eq!(loops(&code), vec![("r".to_string(), 3), ("j".to_string(), 3)]);
    // Two operations per function value term and four per entry
    assert_eq!(num_ops, 2 * 3 + 4 * 3);
}

#[test]
fn vanishing_integrands_produce_no_code() {
    let options = CompilerOptions::default();
    let form = p1_form(CellType::Triangle, DomainType::Cell, &centroid_rule(CellType::Triangle), v());
    let registry = TableRegistry::new(&form.psi_tables[&DomainType::Cell], &options).unwrap();
    let mut transformer = QuadratureTransformer::new(&options, &UfcGeometry, &form.elements, &registry);
    transformer.update_facets(None, None);
    transformer.update_points(1);

    let (code, num_ops) = generate_code(&(FormExpr::float(0.0) * v()), &mut transformer).unwrap();
    assert!(code.is_empty());
    assert_eq!(num_ops, 0);
    assert!(transformer.used_weights().is_empty());
}
