use formc::code::{Declaration, Initializer, Statement};
use formc::element::CellType;
use formc::error::CompileError;
use formc::form::{DomainType, Restriction};
use formc::geometry::{declared_names, remove_unused, Geometry, UfcGeometry};
use std::collections::BTreeSet;

fn used(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn declaration<'a>(statements: &'a [Statement], name: &str) -> &'a Declaration {
    statements
        .iter()
        .find_map(|s| match s {
            Statement::Declare(declaration) if declaration.name == name => Some(declaration),
            _ => None,
        })
        .unwrap_or_else(|| panic!("{name} is not declared"))
}

#[test]
fn transforms_are_named_after_the_restricted_cell() {
    assert_eq!(UfcGeometry.transform(0, 1, None), "K_01");
    assert_eq!(UfcGeometry.transform(1, 0, Some(Restriction::Plus)), "K0_10");
    assert_eq!(UfcGeometry.transform(0, 0, Some(Restriction::Minus)), "K1_00");
    assert_eq!(UfcGeometry.scale_factor(), "det");
}

#[test]
fn unused_declarations_and_sections_are_removed() {
    let jacobian = UfcGeometry.jacobian(CellType::Triangle, DomainType::Cell).unwrap();
    let code = remove_unused(jacobian, &used(&["K_01"]));

    let names = declared_names(&code);
    assert_eq!(
        names,
        BTreeSet::from(["x", "J_00", "J_01", "J_10", "J_11", "detJ", "K_01"])
    );
    assert!(!code.contains(&Statement::comment("Set scale factor")));
    assert_eq!(code.last(), Some(&Statement::Blank));

    assert!(remove_unused(UfcGeometry.jacobian(CellType::Triangle, DomainType::Cell).unwrap(), &used(&[])).is_empty());
}

#[test]
fn tetrahedron_inverse_uses_cofactors() {
    let jacobian = UfcGeometry.jacobian(CellType::Tetrahedron, DomainType::Cell).unwrap();
    let code = remove_unused(jacobian, &used(&["K_12"]));
    let names = declared_names(&code);

    for name in ["d_00", "d_10", "d_20", "d_21", "detJ"] {
        assert!(names.contains(name), "{name} is not declared");
    }
    assert!(!names.contains("d_11"));
    assert!(!names.contains("det"));

    assert_eq!(declaration(&code, "K_12").value, Initializer::Expr("d_21 / detJ".to_string()));
    assert_eq!(
        declaration(&code, "d_00").value,
        Initializer::Expr("J_11*J_22 - J_12*J_21".to_string())
    );
    assert_eq!(
        declaration(&code, "detJ").value,
        Initializer::Expr("J_00*d_00 + J_10*d_10 + J_20*d_20".to_string())
    );
}

#[test]
fn facet_scale_factors() {
    let code = remove_unused(
        UfcGeometry.jacobian(CellType::Tetrahedron, DomainType::ExteriorFacet).unwrap(),
        &used(&["det"]),
    );
    let names = declared_names(&code);
    for name in ["face_vertices", "v0", "v1", "v2", "a0", "a1", "a2", "det", "x"] {
        assert!(names.contains(name), "{name} is not declared");
    }
    assert!(!names.contains("detJ"));

    let code = remove_unused(
        UfcGeometry.jacobian(CellType::Interval, DomainType::ExteriorFacet).unwrap(),
        &used(&["det"]),
    );
    assert_eq!(declaration(&code, "det").value, Initializer::Float(1.0));

    let code = remove_unused(
        UfcGeometry.jacobian(CellType::Triangle, DomainType::InteriorFacet).unwrap(),
        &used(&["det", "K1_00"]),
    );
    let names = declared_names(&code);
    assert!(names.contains("x0"));
    assert!(names.contains("detJ1"));
    assert!(!names.contains("detJ0"));
    assert_eq!(declaration(&code, "dx0").value, Initializer::Expr("x0[v1][0] - x0[v0][0]".to_string()));
}

#[test]
fn only_simplices_are_supported() {
    for cell in [CellType::Quadrilateral, CellType::Hexahedron] {
        let error = UfcGeometry.jacobian(cell, DomainType::Cell).unwrap_err();
        assert!(matches!(error, CompileError::UnsupportedConstruct { .. }));
    }
}
