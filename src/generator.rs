//! Generation of the `tabulate_tensor` code of all integrals of a form.
use crate::assembler::generate_code;
use crate::code::{generate_loop, Declaration, Initializer, IntegralCode, Statement, Storage, TabulateTensor, ValueType};
use crate::error::CompileError;
use crate::form::{DomainType, FormExpr, FormRepresentation, IntegralKey, Tabulation};
use crate::geometry::{remove_unused, Geometry, UfcGeometry};
use crate::options::CompilerOptions;
use crate::tables::TableRegistry;
use crate::transformer::QuadratureTransformer;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Generated code for every integral of a form.
pub type FormCode = BTreeMap<IntegralKey, IntegralCode>;

/// Generates code for all integrals of the form with the UFC geometry of simplex cells.
pub fn generate_form(form: &FormRepresentation, options: &CompilerOptions) -> Result<FormCode, CompileError> {
    QuadratureGenerator::new(options, &UfcGeometry).generate_form(form)
}

/// Same as [`generate_form`], generating independent integrals in parallel.
pub fn generate_form_par(form: &FormRepresentation, options: &CompilerOptions) -> Result<FormCode, CompileError> {
    QuadratureGenerator::new(options, &UfcGeometry).generate_form_par(form)
}

pub struct QuadratureGenerator<'a> {
    options: &'a CompilerOptions,
    geometry: &'a dyn Geometry,
}

impl<'a> QuadratureGenerator<'a> {
    pub fn new(options: &'a CompilerOptions, geometry: &'a dyn Geometry) -> Self {
        Self { options, geometry }
    }

    /// Builds the table registry of every domain type with integrals.
    fn registries(&self, form: &FormRepresentation) -> Result<BTreeMap<DomainType, TableRegistry>, CompileError> {
        let empty = Tabulation::new();
        let mut registries = BTreeMap::new();
        for &(domain_type, _) in form.integrals.keys() {
            if !registries.contains_key(&domain_type) {
                let tabulation = form.psi_tables.get(&domain_type).unwrap_or(&empty);
                registries.insert(domain_type, TableRegistry::new(tabulation, self.options)?);
            }
        }
        Ok(registries)
    }

    pub fn generate_form(&self, form: &FormRepresentation) -> Result<FormCode, CompileError> {
        let registries = self.registries(form)?;
        let mut code = FormCode::new();
        for (domain_type, registry) in &registries {
            let mut transformer = QuadratureTransformer::new(self.options, self.geometry, &form.elements, registry);
            let integrals = form
                .integrals
                .iter()
                .filter(|((domain, _), _)| domain == domain_type);
            for (&key, integrands) in integrals {
                transformer.reset()?;
                code.insert(key, self.generate_integral(form, key, integrands, &mut transformer)?);
            }
        }
        Ok(code)
    }

    pub fn generate_form_par(&self, form: &FormRepresentation) -> Result<FormCode, CompileError> {
        let registries = self.registries(form)?;
        form.integrals
            .par_iter()
            .map(|(&key, integrands)| {
                let registry = registries
                    .get(&key.0)
                    .ok_or_else(|| CompileError::InternalInconsistency {
                        message: format!("no tables registered for {} integrals", key.0),
                    })?;
                let mut transformer = QuadratureTransformer::new(self.options, self.geometry, &form.elements, registry);
                let code = self.generate_integral(form, key, integrands, &mut transformer)?;
                Ok((key, code))
            })
            .collect()
    }

    /// Generates the code of the integral with the given key.
    ///
    /// `integrands` maps each number of quadrature points to the integrand evaluated with it.
    pub fn generate_integral(
        &self,
        form: &FormRepresentation,
        key: IntegralKey,
        integrands: &BTreeMap<usize, FormExpr>,
        transformer: &mut QuadratureTransformer,
    ) -> Result<IntegralCode, CompileError> {
        let (domain_type, subdomain) = key;
        info!("Generating code for {} integral {}", domain_type, subdomain);
        let num_facets = form.cell.num_facets();

        let (tabulate_tensor, num_ops) = match domain_type {
            DomainType::Cell => {
                transformer.update_facets(None, None);
                let (body, num_ops) = self.integral_body(integrands, transformer)?;
                let common = self.common_code(form, domain_type, integrands, transformer)?;
                (TabulateTensor::Cell(common.into_iter().chain(body).collect()), num_ops)
            }
            DomainType::ExteriorFacet => {
                let mut cases = Vec::with_capacity(num_facets);
                let mut num_ops = 0;
                for facet in 0..num_facets {
                    transformer.update_facets(Some(facet), None);
                    let (body, ops) = self.integral_body(integrands, transformer)?;
                    cases.push(body);
                    num_ops = num_ops.max(ops);
                }
                let common = self.common_code(form, domain_type, integrands, transformer)?;
                (TabulateTensor::ExteriorFacet { common, cases }, num_ops)
            }
            DomainType::InteriorFacet => {
                let mut cases = Vec::with_capacity(num_facets);
                let mut num_ops = 0;
                for facet0 in 0..num_facets {
                    let mut inner = Vec::with_capacity(num_facets);
                    for facet1 in 0..num_facets {
                        transformer.update_facets(Some(facet0), Some(facet1));
                        let (body, ops) = self.integral_body(integrands, transformer)?;
                        inner.push(body);
                        num_ops = num_ops.max(ops);
                    }
                    cases.push(inner);
                }
                let common = self.common_code(form, domain_type, integrands, transformer)?;
                (TabulateTensor::InteriorFacet { common, cases }, num_ops)
            }
        };

        if let Some(dim) = transformer.geometric_dimension() {
            let expected = form.cell.geometric_dimension();
            if dim != expected {
                return Err(CompileError::GeometricDimensionMismatch { expected, found: dim });
            }
        }
        info!(
            "Number of operations to compute {} integral {}: {}",
            domain_type, subdomain, num_ops
        );

        Ok(IntegralCode {
            tabulate_tensor,
            members: Vec::new(),
            num_ops,
        })
    }

    /// Quadrature loops over all integrands of one case.
    fn integral_body(
        &self,
        integrands: &BTreeMap<usize, FormExpr>,
        transformer: &mut QuadratureTransformer,
    ) -> Result<(Vec<Statement>, usize), CompileError> {
        let ip = &self.options.format.integration_points;
        let mut loops = Vec::new();
        let mut num_ops = 0;

        for (&points, integrand) in integrands {
            transformer.update_points(points);
            let (ip_code, ops) = generate_code(integrand, transformer)?;
            if ip_code.is_empty() {
                warn!("Integrand {} does not contribute to the element tensor", integrand);
                continue;
            }
            let ops = ops * points;
            debug!("Quadrature loop with {} points takes {} operations", points, ops);

            loops.push(Statement::comment(format!("Loop quadrature points for integral: {integrand}")));
            loops.push(Statement::comment(format!(
                "Number of operations to compute element tensor for following IP loop = {ops}"
            )));
            if points > 1 {
                loops.extend(generate_loop(ip_code, &[(ip.clone(), 0, points)]));
            } else {
                loops.push(Statement::comment("Only 1 integration point, omitting IP loop."));
                loops.extend(ip_code);
            }
            loops.push(Statement::Blank);
            num_ops += ops;
        }

        let mut body = vec![Statement::comment(format!(
            "Total number of operations to compute element tensor (from this point): {num_ops}"
        ))];
        body.push(Statement::Blank);
        body.extend(loops);
        Ok((body, num_ops))
    }

    /// Code shared by all cases: geometry, weights, tables and the reset of the element tensor.
    fn common_code(
        &self,
        form: &FormRepresentation,
        domain_type: DomainType,
        integrands: &BTreeMap<usize, FormExpr>,
        transformer: &QuadratureTransformer,
    ) -> Result<Vec<Statement>, CompileError> {
        let mut code = remove_unused(self.geometry.jacobian(form.cell, domain_type)?, transformer.trans_set());
        code.extend(self.weights(form, domain_type, transformer)?);
        code.extend(self.tables(transformer)?);
        code.extend(self.reset_element_tensor(form, domain_type, integrands)?);
        Ok(code)
    }

    fn weights(
        &self,
        form: &FormRepresentation,
        domain_type: DomainType,
        transformer: &QuadratureTransformer,
    ) -> Result<Vec<Statement>, CompileError> {
        let format = &self.options.format;
        let mut code = Vec::new();
        for &points in transformer.used_weights() {
            let weights = form
                .quadrature_weights
                .get(&domain_type)
                .and_then(|weights| weights.get(&points))
                .filter(|weights| weights.len() == points && weights.iter().any(|&w| w != 0.0))
                .ok_or(CompileError::NoWeights { points })?;

            let name = format!("{}{}", format.weight, points);
            let value = match weights.as_slice() {
                [weight] => Initializer::Float(*weight),
                _ => Initializer::Array(weights.clone()),
            };
            code.push(Statement::comment("Array of quadrature weights"));
            code.push(Statement::declare(Declaration::new(
                Storage::StaticConst,
                ValueType::Double,
                name,
                value,
            )));
            code.push(Statement::Blank);
        }
        Ok(code)
    }

    fn tables(&self, transformer: &QuadratureTransformer) -> Result<Vec<Statement>, CompileError> {
        let registry = transformer.registry();
        let mut code = Vec::new();

        if !transformer.used_psi_tables().is_empty() {
            code.push(Statement::comment("Values of basis functions at quadrature points"));
            for name in transformer.used_psi_tables() {
                let table = registry.table(name)?;
                let rows = table
                    .row_iter()
                    .map(|row| row.iter().copied().collect())
                    .collect();
                code.push(Statement::declare(Declaration::new(
                    Storage::StaticConst,
                    ValueType::Double,
                    name,
                    Initializer::Table(rows),
                )));
            }
            code.push(Statement::Blank);
        }

        for &id in transformer.used_nzcs() {
            let columns = registry
                .non_zero_columns(id)
                .ok_or_else(|| CompileError::InternalInconsistency {
                    message: format!("no non-zero columns with id {id}"),
                })?;
            code.push(Statement::comment("Array of non-zero columns"));
            code.push(Statement::declare(Declaration::new(
                Storage::StaticConst,
                ValueType::UnsignedInt,
                format!("{}{}", self.options.format.nonzero_columns, id),
                Initializer::Indices(columns.to_vec()),
            )));
            code.push(Statement::Blank);
        }
        Ok(code)
    }

    fn reset_element_tensor(
        &self,
        form: &FormRepresentation,
        domain_type: DomainType,
        integrands: &BTreeMap<usize, FormExpr>,
    ) -> Result<Vec<Statement>, CompileError> {
        let format = &self.options.format;
        let mut dimensions = BTreeMap::new();
        for argument in integrands.values().flat_map(FormExpr::arguments) {
            let element = form
                .element(argument.element)
                .ok_or_else(|| CompileError::InternalInconsistency {
                    message: format!("{} is not part of the form", argument.element),
                })?;
            let dimension = match domain_type {
                DomainType::InteriorFacet => 2 * element.space_dimension,
                _ => element.space_dimension,
            };
            dimensions.insert(argument.number, dimension);
        }
        let size: usize = dimensions.values().product();

        let reset = Statement::Assign {
            target: format!("{}[{}]", format.element_tensor, format.secondary_index),
            value: "0.0".to_string(),
        };
        let mut code = vec![Statement::comment("Reset values of the element tensor block")];
        if size == 1 {
            code.push(Statement::Assign {
                target: format!("{}[0]", format.element_tensor),
                value: "0.0".to_string(),
            });
        } else {
            code.extend(generate_loop(vec![reset], &[(format.secondary_index.clone(), 0, size)]));
        }
        code.push(Statement::Blank);
        Ok(code)
    }
}
