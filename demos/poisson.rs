//! Generates `tabulate_tensor` bodies for a Poisson problem with linear Lagrange elements on
//! triangles, with a Neumann boundary term.
//!
//! Pass `--json` to print the structured code instead of C++.
use eyre::eyre;
use formc::code::CodeFormatter;
use formc::element::{CellType, ElementId, FiniteElement};
use formc::form::{DomainType, FormExpr, FormRepresentation, TableKey};
use formc::quadrature::{domain_quadrature, map_facet_points, Scheme};
use formc::{generate_form, CompilerOptions};
use util::{p1_derivatives, p1_values};

fn add_p1_tables(form: &mut FormRepresentation, domain_type: DomainType, facet: Option<usize>, points: &[Vec<f64>]) {
    let dim = form.cell.geometric_dimension();
    let element = ElementId(0);
    form.add_table(domain_type, element, TableKey::values(facet), p1_values(dim, points));
    for direction in 0..dim {
        let mut derivatives = vec![0; dim];
        derivatives[direction] = 1;
        let table = p1_derivatives(dim, points.len(), direction);
        form.add_table(domain_type, element, TableKey::new(facet, None, derivatives), table);
    }
}

fn main() -> eyre::Result<()> {
    let json = std::env::args().any(|arg| arg == "--json");
    let cell = CellType::Triangle;
    let element = ElementId(0);
    let v = FormExpr::test_function(element);
    let u = FormExpr::trial_function(element);
    let f = FormExpr::coefficient(0, element);
    let g = FormExpr::coefficient(1, element);

    let mut form = FormRepresentation::new(cell, vec![FiniteElement::lagrange(cell, 1)]);

    let (weights, points) = domain_quadrature(cell, DomainType::Cell, 2, Scheme::Default)?;
    let stiffness = FormExpr::Sum((0..2).map(|i| v.clone().dx(i) * u.clone().dx(i)).collect());
    form.add_integral(DomainType::Cell, 0, weights.clone(), stiffness);
    form.add_integral(DomainType::Cell, 1, weights, f * v.clone());
    add_p1_tables(&mut form, DomainType::Cell, None, &points);

    let (weights, points) = domain_quadrature(cell, DomainType::ExteriorFacet, 2, Scheme::Default)?;
    form.add_integral(DomainType::ExteriorFacet, 0, weights, g * v);
    for facet in 0..cell.num_facets() {
        let points = map_facet_points(cell, facet, &points).ok_or_else(|| eyre!("no facet {facet} on {cell}"))?;
        add_p1_tables(&mut form, DomainType::ExteriorFacet, Some(facet), &points);
    }

    let options = CompilerOptions::optimized();
    let code = generate_form(&form, &options)?;
    let formatter = CodeFormatter::new(&options);
    for ((domain_type, subdomain), integral) in &code {
        if json {
            println!("{}", serde_json::to_string_pretty(integral)?);
        } else {
            println!("// tabulate_tensor of {domain_type} integral {subdomain} ({} operations)", integral.num_ops);
            println!("{}", formatter.format_tabulate_tensor(&integral.tabulate_tensor));
        }
    }
    Ok(())
}
