//! Geometric quantities referenced by generated code.
//!
//! Derivatives of reference basis functions are mapped to the physical cell with the entries of
//! the inverse Jacobian, and every contribution is scaled by a scale factor derived from the
//! Jacobian determinant. A [`Geometry`] provides the names of these quantities and the code
//! declaring them.
use crate::code::{identifiers, Declaration, Initializer, Statement, Storage, ValueType};
use crate::element::CellType;
use crate::error::CompileError;
use crate::form::{DomainType, Restriction};
use std::collections::BTreeSet;

pub trait Geometry: Sync {
    /// Name of the inverse Jacobian entry `d X_reference / d x_direction`.
    fn transform(&self, reference: usize, direction: usize, restriction: Option<Restriction>) -> String;

    /// Name of the factor mapping the reference integration domain to the physical one.
    fn scale_factor(&self) -> &str;

    /// Declarations of the Jacobian, its inverse and the scale factor.
    ///
    /// Statements are grouped in sections separated by blank lines, each starting with a comment.
    fn jacobian(&self, cell: CellType, domain: DomainType) -> Result<Vec<Statement>, CompileError>;
}

/// The geometry of affine simplex cells as laid out by UFC.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct UfcGeometry;

fn restriction_suffix(restriction: Option<Restriction>) -> &'static str {
    match restriction {
        None => "",
        Some(Restriction::Plus) => "0",
        Some(Restriction::Minus) => "1",
    }
}

impl Geometry for UfcGeometry {
    fn transform(&self, reference: usize, direction: usize, restriction: Option<Restriction>) -> String {
        format!("K{}_{reference}{direction}", restriction_suffix(restriction))
    }

    fn scale_factor(&self) -> &str {
        "det"
    }

    fn jacobian(&self, cell: CellType, domain: DomainType) -> Result<Vec<Statement>, CompileError> {
        if !cell.is_simplex() {
            return Err(CompileError::UnsupportedConstruct {
                construct: format!("Jacobian of {cell} cells"),
            });
        }
        let dim = cell.geometric_dimension();
        let mut code = Vec::new();

        match domain {
            DomainType::Cell | DomainType::ExteriorFacet => {
                code.extend(vertex_coordinates("x", "c"));
                code.extend(affine_map(dim, "x", ""));
            }
            DomainType::InteriorFacet => {
                code.extend(vertex_coordinates("x0", "c0"));
                code.extend(vertex_coordinates("x1", "c1"));
                code.extend(affine_map(dim, "x0", "0"));
                code.extend(affine_map(dim, "x1", "1"));
            }
        }

        match domain {
            DomainType::Cell => code.extend(section(
                "Set scale factor",
                vec![Declaration::const_double("det", "std::abs(detJ)")],
            )),
            DomainType::ExteriorFacet => code.extend(facet_scale_factor(dim, "x", "facet")),
            DomainType::InteriorFacet => code.extend(facet_scale_factor(dim, "x0", "facet0")),
        }
        Ok(code)
    }
}

fn section(comment: &str, declarations: Vec<Declaration>) -> Vec<Statement> {
    let mut code = vec![Statement::comment(comment)];
    code.extend(declarations.into_iter().map(Statement::Declare));
    code.push(Statement::Blank);
    code
}

fn vertex_coordinates(x: &str, cell: &str) -> Vec<Statement> {
    section(
        "Extract vertex coordinates",
        vec![Declaration::new(
            Storage::Const,
            ValueType::Coordinates,
            x,
            Initializer::Expr(format!("{cell}.coordinates")),
        )],
    )
}

/// Jacobian, determinant and inverse of the affine map from the reference cell.
fn affine_map(dim: usize, x: &str, suffix: &str) -> Vec<Statement> {
    let j = |i: usize, k: usize| format!("J{suffix}_{i}{k}");
    let k = |i: usize, l: usize| format!("K{suffix}_{i}{l}");
    let det_j = format!("detJ{suffix}");

    let jacobian = (0..dim)
        .flat_map(|i| (0..dim).map(move |l| (i, l)))
        .map(|(i, l)| Declaration::const_double(j(i, l), format!("{x}[{}][{i}] - {x}[0][{i}]", l + 1)))
        .collect();

    let mut code = section("Compute Jacobian of affine map from reference cell", jacobian);
    let determinant = |expr: String| Declaration::new(Storage::Local, ValueType::Double, &det_j, Initializer::Expr(expr));

    match dim {
        1 => {
            code.extend(section("Compute determinant of Jacobian", vec![determinant(j(0, 0))]));
            code.extend(section(
                "Compute inverse of Jacobian",
                vec![Declaration::const_double(k(0, 0), format!("1.0 / {det_j}"))],
            ));
        }
        2 => {
            code.extend(section(
                "Compute determinant of Jacobian",
                vec![determinant(format!(
                    "{}*{} - {}*{}",
                    j(0, 0),
                    j(1, 1),
                    j(0, 1),
                    j(1, 0)
                ))],
            ));
            code.extend(section(
                "Compute inverse of Jacobian",
                vec![
                    Declaration::const_double(k(0, 0), format!("{} / {det_j}", j(1, 1))),
                    Declaration::const_double(k(0, 1), format!("-{} / {det_j}", j(0, 1))),
                    Declaration::const_double(k(1, 0), format!("-{} / {det_j}", j(1, 0))),
                    Declaration::const_double(k(1, 1), format!("{} / {det_j}", j(0, 0))),
                ],
            ));
        }
        _ => {
            let d = |i: usize, l: usize| format!("d{suffix}_{i}{l}");
            // Cofactor of J_il
            let cofactor = |i: usize, l: usize| {
                let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
                let (l1, l2) = ((l + 1) % 3, (l + 2) % 3);
                format!("{}*{} - {}*{}", j(i1, l1), j(i2, l2), j(i1, l2), j(i2, l1))
            };
            let cofactors = (0..3)
                .flat_map(|i| (0..3).map(move |l| (i, l)))
                .map(|(i, l)| Declaration::const_double(d(i, l), cofactor(i, l)))
                .collect();
            code.extend(section("Compute sub determinants", cofactors));
            code.extend(section(
                "Compute determinant of Jacobian",
                vec![determinant(format!(
                    "{}*{} + {}*{} + {}*{}",
                    j(0, 0),
                    d(0, 0),
                    j(1, 0),
                    d(1, 0),
                    j(2, 0),
                    d(2, 0)
                ))],
            ));
            let inverse = (0..3)
                .flat_map(|i| (0..3).map(move |l| (i, l)))
                .map(|(i, l)| Declaration::const_double(k(i, l), format!("{} / {det_j}", d(l, i))))
                .collect();
            code.extend(section("Compute inverse of Jacobian", inverse));
        }
    }
    code
}

/// Scale factor of a facet integral: the measure of the facet relative to the reference facet.
fn facet_scale_factor(dim: usize, x: &str, facet: &str) -> Vec<Statement> {
    let vertex = |v: usize| {
        Declaration::new(
            Storage::Const,
            ValueType::UnsignedInt,
            format!("v{v}"),
            Initializer::Expr(format!("{}[{facet}][{v}]", if dim == 2 { "edge_vertices" } else { "face_vertices" })),
        )
    };

    match dim {
        1 => section(
            "The scale factor of a point is one",
            vec![Declaration::new(
                Storage::Const,
                ValueType::Double,
                "det",
                Initializer::Float(1.0),
            )],
        ),
        2 => {
            let mut code = section(
                "Vertices on edges",
                vec![Declaration::new(
                    Storage::Static,
                    ValueType::UnsignedInt,
                    "edge_vertices",
                    Initializer::IndexTable(vec![vec![1, 2], vec![0, 2], vec![0, 1]]),
                )],
            );
            code.extend(section("Get vertices", vec![vertex(0), vertex(1)]));
            code.extend(section(
                "Compute scale factor (length of edge scaled by length of reference interval)",
                vec![
                    Declaration::const_double("dx0", format!("{x}[v1][0] - {x}[v0][0]")),
                    Declaration::const_double("dx1", format!("{x}[v1][1] - {x}[v0][1]")),
                    Declaration::const_double("det", "std::sqrt(dx0*dx0 + dx1*dx1)"),
                ],
            ));
            code
        }
        _ => {
            let mut code = section(
                "Vertices on faces",
                vec![Declaration::new(
                    Storage::Static,
                    ValueType::UnsignedInt,
                    "face_vertices",
                    Initializer::IndexTable(vec![vec![1, 2, 3], vec![0, 2, 3], vec![0, 1, 3], vec![0, 1, 2]]),
                )],
            );
            code.extend(section("Get vertices", vec![vertex(0), vertex(1), vertex(2)]));
            // Components of the cross product of two edges of the face
            let component = |a: usize, b: usize| {
                format!(
                    "({x}[v0][{a}]*{x}[v1][{b}] + {x}[v0][{b}]*{x}[v2][{a}] + {x}[v1][{a}]*{x}[v2][{b}]) \
                     - ({x}[v2][{a}]*{x}[v1][{b}] + {x}[v2][{b}]*{x}[v0][{a}] + {x}[v1][{a}]*{x}[v0][{b}])"
                )
            };
            code.extend(section(
                "Compute scale factor (area of face scaled by area of reference triangle)",
                vec![
                    Declaration::const_double("a0", component(1, 2)),
                    Declaration::const_double("a1", component(2, 0)),
                    Declaration::const_double("a2", component(0, 1)),
                    Declaration::const_double("det", "std::sqrt(a0*a0 + a1*a1 + a2*a2)"),
                ],
            ));
            code
        }
    }
}

/// Removes declarations that are neither referenced by other declarations nor named in `used`.
///
/// Sections (runs of statements separated by blank lines) whose declarations are all removed
/// are dropped together with their comments.
pub fn remove_unused(statements: Vec<Statement>, used: &BTreeSet<String>) -> Vec<Statement> {
    let mut sections: Vec<Vec<Statement>> = statements
        .split(|s| *s == Statement::Blank)
        .filter(|section| !section.is_empty())
        .map(|section| section.to_vec())
        .collect();

    loop {
        let referenced: BTreeSet<&str> = sections
            .iter()
            .flatten()
            .filter_map(|s| match s {
                Statement::Declare(declaration) => Some(declaration.dependencies()),
                _ => None,
            })
            .flatten()
            .chain(used.iter().map(String::as_str))
            .collect();

        let unused: BTreeSet<String> = sections
            .iter()
            .flatten()
            .filter_map(|s| match s {
                Statement::Declare(declaration) if !referenced.contains(declaration.name.as_str()) => {
                    Some(declaration.name.clone())
                }
                _ => None,
            })
            .collect();

        if unused.is_empty() {
            break;
        }
        for section in &mut sections {
            section.retain(|s| !matches!(s, Statement::Declare(d) if unused.contains(&d.name)));
        }
    }

    sections
        .into_iter()
        .filter(|section| section.iter().any(|s| !matches!(s, Statement::Comment(_))))
        .flat_map(|mut section| {
            section.push(Statement::Blank);
            section
        })
        .collect()
}

/// Names declared by the statements.
pub fn declared_names(statements: &[Statement]) -> BTreeSet<&str> {
    statements
        .iter()
        .filter_map(|s| match s {
            Statement::Declare(declaration) => Some(declaration.name.as_str()),
            _ => None,
        })
        .collect()
}
