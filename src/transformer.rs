//! Lowering of integrands to the values of the element tensor at a quadrature point.
//!
//! The [`QuadratureTransformer`] visits a normalized integrand (see [`crate::normalize`]) and
//! returns a [`CodeMap`]: for every combination of argument loop indices, the symbolic value that
//! is to be accumulated into the element tensor. Terms that do not depend on any argument are
//! stored under the empty key.
//!
//! While visiting, the transformer records which tables, weights, non-zero column arrays and
//! geometric transforms are referenced, so that only those are declared in the generated code.
//! Products of coefficients and basis functions are cached: each distinct product is computed
//! once per quadrature point into a function value `F<n>`.
use crate::element::{ElementId, Family, FiniteElement};
use crate::error::CompileError;
use crate::form::{Argument, Coefficient, Constant, FormExpr, Index, IndexId, Restriction};
use crate::geometry::Geometry;
use crate::options::CompilerOptions;
use crate::tables::{table_name, TableInfo, TableRegistry};
use formc_symbolics::{make_float, make_product, make_sum, make_symbol, make_symbol_with_base, Expr, VarType};
use itertools::Itertools;
use log::debug;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Deref, DerefMut};

/// Integer powers up to this exponent are written out as products.
const MAX_EXPANDED_EXPONENT: usize = 16;

/// A loop over the degrees of freedom of an argument.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoopIndex {
    /// Number of the argument, `-2`/`0` for test and `-1`/`1` for trial functions.
    pub argument: i32,
    /// Maps the loop variable to a row or column of the element tensor.
    pub entry: String,
    /// Number of iterations of the loop.
    pub range: usize,
    /// Size of the element tensor along this argument.
    pub space_dimension: usize,
}

pub type CodeMap = BTreeMap<Vec<LoopIndex>, Expr>;

/// A cached product of a coefficient and basis function values.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub name: String,
    /// Value accumulated in each iteration of the loop over the secondary index.
    pub value: Expr,
    pub range: usize,
}

pub struct QuadratureTransformer<'a> {
    options: &'a CompilerOptions,
    geometry: &'a dyn Geometry,
    elements: &'a [FiniteElement],
    registry: &'a TableRegistry,

    used_psi_tables: BTreeSet<String>,
    used_nzcs: BTreeSet<usize>,
    used_weights: BTreeSet<usize>,
    trans_set: BTreeSet<String>,
    functions: FxHashMap<String, usize>,
    function_values: Vec<FunctionValue>,
    function_count: usize,
    geo_dim: Option<usize>,
    points: usize,
    facet0: Option<usize>,
    facet1: Option<usize>,
    restriction: Option<Restriction>,

    derivatives: Vec<usize>,
    components: Vec<usize>,
    index_values: Vec<(IndexId, usize)>,
}

impl<'a> QuadratureTransformer<'a> {
    pub fn new(
        options: &'a CompilerOptions,
        geometry: &'a dyn Geometry,
        elements: &'a [FiniteElement],
        registry: &'a TableRegistry,
    ) -> Self {
        Self {
            options,
            geometry,
            elements,
            registry,
            used_psi_tables: BTreeSet::new(),
            used_nzcs: BTreeSet::new(),
            used_weights: BTreeSet::new(),
            trans_set: BTreeSet::new(),
            functions: FxHashMap::default(),
            function_values: Vec::new(),
            function_count: 0,
            geo_dim: None,
            points: 0,
            facet0: None,
            facet1: None,
            restriction: None,
            derivatives: Vec::new(),
            components: Vec::new(),
            index_values: Vec::new(),
        }
    }

    /// Sets the facets of the next case. Function values are numbered from zero again.
    pub fn update_facets(&mut self, facet0: Option<usize>, facet1: Option<usize>) {
        self.facet0 = facet0;
        self.facet1 = facet1;
        self.functions.clear();
        self.function_values.clear();
        self.function_count = 0;
    }

    /// Sets the number of quadrature points of the next integrand.
    ///
    /// Function values are cached per quadrature loop, but their numbering continues.
    pub fn update_points(&mut self, points: usize) {
        self.points = points;
        self.functions.clear();
        self.function_values.clear();
    }

    /// Clears all state collected for the previous integral.
    pub fn reset(&mut self) -> Result<(), CompileError> {
        if !self.components.is_empty() {
            return Err(CompileError::StackImbalance { stack: "component" });
        }
        if !self.index_values.is_empty() {
            return Err(CompileError::StackImbalance { stack: "index value" });
        }
        if !self.derivatives.is_empty() {
            return Err(CompileError::StackImbalance { stack: "derivative" });
        }
        self.used_psi_tables.clear();
        self.used_nzcs.clear();
        self.used_weights.clear();
        self.trans_set.clear();
        self.functions.clear();
        self.function_values.clear();
        self.function_count = 0;
        self.geo_dim = None;
        self.points = 0;
        self.facet0 = None;
        self.facet1 = None;
        self.restriction = None;
        Ok(())
    }

    pub fn options(&self) -> &'a CompilerOptions {
        self.options
    }

    pub fn registry(&self) -> &'a TableRegistry {
        self.registry
    }

    pub fn points(&self) -> usize {
        self.points
    }

    /// Geometric dimension of the cells of all visited arguments and coefficients.
    pub fn geometric_dimension(&self) -> Option<usize> {
        self.geo_dim
    }

    /// Names of the unique tables referenced so far.
    pub fn used_psi_tables(&self) -> &BTreeSet<String> {
        &self.used_psi_tables
    }

    /// Numbers of the non-zero column arrays referenced so far.
    pub fn used_nzcs(&self) -> &BTreeSet<usize> {
        &self.used_nzcs
    }

    /// Point counts whose weights are referenced.
    pub fn used_weights(&self) -> &BTreeSet<usize> {
        &self.used_weights
    }

    /// Geometric quantities referenced so far.
    pub fn trans_set(&self) -> &BTreeSet<String> {
        &self.trans_set
    }

    /// Function values of the current quadrature loop, in order of creation.
    pub fn function_values(&self) -> &[FunctionValue] {
        &self.function_values
    }

    /// The quadrature weight at the current point, recording its use.
    pub fn weight(&mut self) -> Expr {
        self.used_weights.insert(self.points);
        let format = &self.options.format;
        let name = if self.points > 1 {
            format!("{}{}[{}]", format.weight, self.points, format.integration_points)
        } else {
            format!("{}{}", format.weight, self.points)
        };
        make_symbol(name, VarType::Ip)
    }

    /// The scale factor of the integral, recording its use.
    pub fn scale_factor(&mut self) -> Expr {
        let name = self.geometry.scale_factor().to_string();
        self.trans_set.insert(name.clone());
        make_symbol(name, VarType::Geometry)
    }

    pub fn visit(&mut self, expr: &FormExpr) -> Result<CodeMap, CompileError> {
        match expr {
            FormExpr::Sum(ops) => self.sum(ops),
            FormExpr::Product(ops) => self.product(ops),
            FormExpr::Division(numerator, denominator) => self.division(numerator, denominator),
            FormExpr::Power(base, exponent) => self.power(base, exponent),
            FormExpr::MathFunction(function, operand) => {
                let arg = self.visit_trivial(operand)?;
                let name = format!("{}({})", function.cpp_name(), arg);
                Ok(trivial(make_symbol_with_base(name, VarType::Ip, arg, 1)))
            }
            FormExpr::Restricted(restriction, operand) => self.restrict(*restriction).visit(operand),
            FormExpr::Indexed(operand, indices) => {
                let components = indices
                    .iter()
                    .map(|index| self.resolve(index))
                    .collect::<Result<Vec<_>, _>>()?;
                self.with_components(components, Vec::new()).visit(operand)
            }
            FormExpr::ComponentTensor(operand, indices) => {
                if self.components.len() != indices.len() {
                    return Err(CompileError::ComponentMismatch {
                        expected: indices.len(),
                        found: self.components.len(),
                    });
                }
                let bindings = indices.iter().copied().zip(self.components.iter().copied()).collect();
                self.with_components(Vec::new(), bindings).visit(operand)
            }
            FormExpr::SpatialDerivative(operand, index) => {
                let direction = self.resolve(index)?;
                self.differentiate(direction).visit(operand)
            }
            FormExpr::Argument(argument) => self.create_argument(argument),
            FormExpr::Coefficient(coefficient) => self.create_function(coefficient),
            FormExpr::Constant(constant) => self.create_constant(constant),
            FormExpr::FloatLiteral(value) => Ok(trivial(make_float(*value))),
            FormExpr::IntLiteral(value) => Ok(trivial(make_float(*value as f64))),
            FormExpr::IndexSum { .. } | FormExpr::ListTensor(_) | FormExpr::FacetNormal | FormExpr::Identity(_) => {
                Err(CompileError::UnsupportedConstruct {
                    construct: expr.to_string(),
                })
            }
        }
    }

    fn sum(&mut self, ops: &[FormExpr]) -> Result<CodeMap, CompileError> {
        let mut terms: BTreeMap<Vec<LoopIndex>, Vec<Expr>> = BTreeMap::new();
        for op in ops {
            for (key, value) in self.visit(op)? {
                terms.entry(key).or_default().push(value);
            }
        }
        Ok(terms
            .into_iter()
            .map(|(key, values)| (key, sum_of(values)))
            .collect())
    }

    fn product(&mut self, ops: &[FormExpr]) -> Result<CodeMap, CompileError> {
        let mut permute = Vec::new();
        let mut not_permute = Vec::new();
        for op in ops {
            let code = self.visit(op)?;
            if code.is_empty() {
                return Ok(CodeMap::new());
            }
            if code.keys().any(|key| !key.is_empty()) {
                permute.push(code);
            } else {
                not_permute.extend(code.into_values());
            }
        }

        let mut permutations: BTreeMap<Vec<LoopIndex>, Vec<Expr>> = BTreeMap::from([(Vec::new(), Vec::new())]);
        for code in permute {
            let mut next = BTreeMap::new();
            for (key0, values0) in &permutations {
                for (key1, value1) in &code {
                    let mut key: Vec<LoopIndex> = key0.iter().chain(key1).cloned().collect();
                    key.sort();
                    let collision = key.iter().map(|index| index.argument).duplicates().next().is_some();
                    if collision || next.contains_key(&key) {
                        return Err(CompileError::IndexCollision {
                            key: key.iter().map(|index| &index.entry).join(", "),
                        });
                    }
                    let mut values = values0.clone();
                    values.push(value1.clone());
                    next.insert(key, values);
                }
            }
            permutations = next;
        }

        Ok(permutations
            .into_iter()
            .map(|(key, mut values)| {
                values.extend(not_permute.iter().cloned());
                (key, product_of(values))
            })
            .collect())
    }

    fn division(&mut self, numerator: &FormExpr, denominator: &FormExpr) -> Result<CodeMap, CompileError> {
        let numerator_code = self.visit(numerator)?;
        let denominator_code = self.visit(denominator)?;
        let denominator = single_trivial(denominator_code).ok_or_else(|| CompileError::UnsupportedDenominator {
            denominator: denominator.to_string(),
        })?;
        numerator_code
            .into_iter()
            .map(|(key, value)| Ok((key, value.try_div(&denominator)?)))
            .collect()
    }

    fn power(&mut self, base: &FormExpr, exponent: &FormExpr) -> Result<CodeMap, CompileError> {
        let exponent = match exponent {
            FormExpr::FloatLiteral(value) => *value,
            FormExpr::IntLiteral(value) => *value as f64,
            _ => {
                return Err(CompileError::UnsupportedConstruct {
                    construct: format!("power with non-literal exponent {exponent}"),
                })
            }
        };
        let base = self.visit_trivial(base)?;

        let value = if exponent.fract() == 0.0 && exponent.abs() <= MAX_EXPANDED_EXPONENT as f64 {
            let n = exponent.abs() as usize;
            let value = if n == 0 {
                make_float(1.0)
            } else {
                product_of(vec![base; n])
            };
            if exponent < 0.0 {
                make_float(1.0).try_div(&value)?
            } else {
                value
            }
        } else {
            let name = format!("std::pow({}, {})", base, formc_symbolics::format_float(exponent));
            make_symbol_with_base(name, VarType::Ip, base, 1)
        };
        Ok(trivial(value))
    }

    /// Visits an operand that must not depend on any argument.
    fn visit_trivial(&mut self, operand: &FormExpr) -> Result<Expr, CompileError> {
        let code = self.visit(operand)?;
        single_trivial(code).ok_or_else(|| CompileError::UnsupportedConstruct {
            construct: format!("{operand} depends on test or trial functions"),
        })
    }

    fn resolve(&self, index: &Index) -> Result<usize, CompileError> {
        match index {
            Index::Fixed(value) => Ok(*value),
            Index::Free(id) => self
                .index_values
                .iter()
                .rev()
                .find(|(bound, _)| bound == id)
                .map(|(_, value)| *value)
                .ok_or_else(|| CompileError::UnboundIndex {
                    index: index.to_string(),
                }),
        }
    }

    fn restrict(&mut self, restriction: Restriction) -> RestrictionScope<'_, 'a> {
        let previous = self.restriction.replace(restriction);
        RestrictionScope {
            transformer: self,
            previous,
        }
    }

    fn with_components(&mut self, components: Vec<usize>, bindings: Vec<(IndexId, usize)>) -> ComponentScope<'_, 'a> {
        let previous = std::mem::replace(&mut self.components, components);
        let bound = self.index_values.len();
        self.index_values.extend(bindings);
        ComponentScope {
            transformer: self,
            previous,
            bound,
        }
    }

    fn differentiate(&mut self, direction: usize) -> DerivativeScope<'_, 'a> {
        let depth = self.derivatives.len();
        self.derivatives.push(direction);
        DerivativeScope {
            transformer: self,
            depth,
        }
    }

    fn element(&self, id: ElementId) -> Result<&'a FiniteElement, CompileError> {
        self.elements.get(id.0).ok_or_else(|| CompileError::InternalInconsistency {
            message: format!("{id} is not part of the form"),
        })
    }

    /// The component of the enclosing indexed expression, if any.
    fn component(&self) -> Result<Option<usize>, CompileError> {
        match self.components.as_slice() {
            [] => Ok(None),
            [component] => Ok(Some(*component)),
            _ => Err(CompileError::UnsupportedConstruct {
                construct: "tensor valued functions with more than one component index".to_string(),
            }),
        }
    }

    fn facet(&self) -> Option<usize> {
        match self.restriction {
            Some(Restriction::Minus) => self.facet1,
            _ => self.facet0,
        }
    }

    fn update_geometric_dimension(&mut self, element: &FiniteElement) -> Result<usize, CompileError> {
        let dim = element.cell.geometric_dimension();
        match self.geo_dim {
            Some(expected) if expected != dim => Err(CompileError::GeometricDimensionMismatch { expected, found: dim }),
            _ => {
                self.geo_dim = Some(dim);
                Ok(dim)
            }
        }
    }

    fn check_derivatives(element: &FiniteElement, derivatives: &[usize]) -> Result<(), CompileError> {
        if derivatives.is_empty() {
            return Ok(());
        }
        if element.contains_quadrature_element() {
            return Err(CompileError::UnsupportedDerivative {
                family: Family::Quadrature.to_string(),
            });
        }
        if !element.supports_derivatives() {
            return Err(CompileError::UnsupportedDerivative {
                family: element.family.to_string(),
            });
        }
        Ok(())
    }

    /// Row access into a table at the current quadrature point.
    fn ip_access(&self) -> &str {
        if self.points == 1 {
            "0"
        } else {
            &self.options.format.integration_points
        }
    }

    /// Maps a loop variable running over the columns of a table to a degree of freedom.
    fn dof_map(&mut self, info: &TableInfo, loop_index: &str) -> String {
        match &info.non_zeros {
            Some(nz) if nz.columns.len() == 1 => nz.columns[0].to_string(),
            Some(nz) => {
                self.used_nzcs.insert(nz.id);
                format!("{}{}[{}]", self.options.format.nonzero_columns, nz.id, loop_index)
            }
            None => loop_index.to_string(),
        }
    }

    fn transforms(&mut self, multi: &[usize], directions: &[usize]) -> Vec<Expr> {
        multi
            .iter()
            .zip(directions)
            .map(|(&reference, &direction)| {
                let name = self.geometry.transform(reference, direction, self.restriction);
                self.trans_set.insert(name.clone());
                make_symbol(name, VarType::Geometry)
            })
            .collect()
    }

    fn create_argument(&mut self, argument: &Argument) -> Result<CodeMap, CompileError> {
        let loop_index = self
            .options
            .format
            .argument_index(argument.number)
            .ok_or_else(|| CompileError::UnsupportedConstruct {
                construct: format!("argument with number {}", argument.number),
            })?
            .to_string();
        let element = self.element(argument.element)?;
        let derivatives = std::mem::take(&mut self.derivatives);
        Self::check_derivatives(element, &derivatives)?;
        let component = self.component()?;
        let facet = self.facet();
        let counter = self.registry.element_counter(self.points, argument.element)?;
        let geo_dim = self.update_geometric_dimension(element)?;

        let (offset, space_dimension) = match self.restriction {
            None => (None, element.space_dimension),
            Some(Restriction::Plus) => (None, 2 * element.space_dimension),
            Some(Restriction::Minus) => (Some(element.space_dimension), 2 * element.space_dimension),
        };

        let mut code: BTreeMap<Vec<LoopIndex>, Vec<Expr>> = BTreeMap::new();
        for (multi, counts) in derivative_multi_indices(geo_dim, derivatives.len()) {
            let name = table_name(counter, facet, component, &counts);
            let info = self.registry.lookup(&name)?;
            let range = self.registry.table(&info.name)?.ncols();
            let entry = with_offset(self.dof_map(info, &loop_index), offset);

            let basis = if info.zeros {
                make_float(0.0)
            } else if info.ones {
                make_float(1.0)
            } else {
                self.used_psi_tables.insert(info.name.clone());
                let access = format!("{}[{}][{}]", info.name, self.ip_access(), loop_index);
                make_symbol(access, VarType::Basis)
            };
            let transforms = self.transforms(&multi, &derivatives);

            let key = vec![LoopIndex {
                argument: argument.number,
                entry,
                range,
                space_dimension,
            }];
            code.entry(key)
                .or_default()
                .push(product_of(transforms.into_iter().chain([basis]).collect()));
        }

        Ok(code
            .into_iter()
            .map(|(key, values)| (key, sum_of(values)))
            .collect())
    }

    fn create_function(&mut self, coefficient: &Coefficient) -> Result<CodeMap, CompileError> {
        let format = &self.options.format;
        let loop_index = format.secondary_index.clone();
        let coefficients = format.coefficients.clone();
        let function_value = format.function_value.clone();

        let element = self.element(coefficient.element)?;
        let derivatives = std::mem::take(&mut self.derivatives);
        Self::check_derivatives(element, &derivatives)?;
        let component = self.component()?;
        let facet = self.facet();
        let counter = self.registry.element_counter(self.points, coefficient.element)?;
        let geo_dim = self.update_geometric_dimension(element)?;
        let offset = match self.restriction {
            Some(Restriction::Minus) => Some(element.space_dimension),
            _ => None,
        };

        let mut terms = Vec::new();
        for (multi, counts) in derivative_multi_indices(geo_dim, derivatives.len()) {
            let name = table_name(counter, facet, component, &counts);
            let info = self.registry.lookup(&name)?;
            if info.zeros {
                continue;
            }
            let range = self.registry.table(&info.name)?.ncols();

            let dof = self.dof_map(info, &loop_index);
            let dof = match offset {
                Some(offset) => match dof.parse::<usize>() {
                    Ok(column) => (column + offset).to_string(),
                    Err(_) => format!("{dof} + {offset}"),
                },
                None => dof,
            };
            let value = make_symbol(format!("{}[{}][{}]", coefficients, coefficient.number, dof), VarType::Geometry);

            let basis = if info.ones {
                None
            } else {
                self.used_psi_tables.insert(info.name.clone());
                let access = format!("{}[{}][{}]", info.name, self.ip_access(), loop_index);
                Some(make_symbol(access, VarType::Basis))
            };
            let transforms = self.transforms(&multi, &derivatives);
            let function_expr = product_of(transforms.into_iter().chain(basis).chain([value]).collect());

            let key = function_expr.to_string();
            let name = match self.functions.get(&key) {
                Some(&i) => {
                    let cached = &self.function_values[i];
                    if cached.range != range {
                        return Err(CompileError::InternalInconsistency {
                            message: format!(
                                "loop range {} of cached function value {} differs from {}",
                                cached.range, cached.name, range
                            ),
                        });
                    }
                    cached.name.clone()
                }
                None => {
                    let name = format!("{}{}", function_value, self.function_count);
                    self.function_count += 1;
                    debug!("New function value {} = {}", name, key);
                    self.functions.insert(key, self.function_values.len());
                    self.function_values.push(FunctionValue {
                        name: name.clone(),
                        value: function_expr,
                        range,
                    });
                    name
                }
            };
            terms.push(make_symbol(name, VarType::Ip));
        }

        Ok(trivial(sum_of(terms)))
    }

    fn create_constant(&mut self, constant: &Constant) -> Result<CodeMap, CompileError> {
        let component = match constant.dimension {
            None if self.components.is_empty() => 0,
            None => {
                return Err(CompileError::UnsupportedConstruct {
                    construct: format!("component of scalar constant {}", constant.number),
                })
            }
            Some(dimension) => match self.component()? {
                Some(component) if component < dimension => component,
                found => {
                    return Err(CompileError::ComponentMismatch {
                        expected: dimension,
                        found: found.map_or(0, |c| c + 1),
                    })
                }
            },
        };
        let name = format!("{}[{}][{}]", self.options.format.coefficients, constant.number, component);
        Ok(trivial(make_symbol(name, VarType::Geometry)))
    }
}

fn sum_of(mut terms: Vec<Expr>) -> Expr {
    if terms.len() == 1 {
        terms.swap_remove(0)
    } else {
        make_sum(terms)
    }
}

fn product_of(mut factors: Vec<Expr>) -> Expr {
    if factors.len() == 1 {
        factors.swap_remove(0)
    } else {
        make_product(factors)
    }
}

fn trivial(value: Expr) -> CodeMap {
    BTreeMap::from([(Vec::new(), value)])
}

/// The value of a code map that only holds a value for the empty key.
fn single_trivial(mut code: CodeMap) -> Option<Expr> {
    let value = code.remove(&Vec::<LoopIndex>::new())?;
    code.is_empty().then_some(value)
}

fn with_offset(entry: String, offset: Option<usize>) -> String {
    match offset {
        None => entry,
        Some(offset) => match entry.parse::<usize>() {
            Ok(column) => (column + offset).to_string(),
            Err(_) => format!("({entry} + {offset})"),
        },
    }
}

/// All reference directions for `n` derivatives in `dim` dimensions, together with the number
/// of derivatives in each direction.
///
/// The counts are empty when no derivatives are taken.
fn derivative_multi_indices(dim: usize, n: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    if n == 0 {
        return vec![(Vec::new(), Vec::new())];
    }
    (0..n)
        .map(|_| 0..dim)
        .multi_cartesian_product()
        .map(|multi| {
            let counts = (0..dim).map(|i| multi.iter().filter(|&&d| d == i).count()).collect();
            (multi, counts)
        })
        .collect()
}

/// Restores the previous restriction when dropped.
struct RestrictionScope<'t, 'a> {
    transformer: &'t mut QuadratureTransformer<'a>,
    previous: Option<Restriction>,
}

/// Restores the enclosing components and index bindings when dropped.
struct ComponentScope<'t, 'a> {
    transformer: &'t mut QuadratureTransformer<'a>,
    previous: Vec<usize>,
    bound: usize,
}

/// Pops the derivative direction when dropped, unless a terminal has consumed it.
struct DerivativeScope<'t, 'a> {
    transformer: &'t mut QuadratureTransformer<'a>,
    depth: usize,
}

impl Drop for RestrictionScope<'_, '_> {
    fn drop(&mut self) {
        self.transformer.restriction = self.previous;
    }
}

impl Drop for ComponentScope<'_, '_> {
    fn drop(&mut self) {
        self.transformer.components = std::mem::take(&mut self.previous);
        self.transformer.index_values.truncate(self.bound);
    }
}

impl Drop for DerivativeScope<'_, '_> {
    fn drop(&mut self) {
        self.transformer.derivatives.truncate(self.depth);
    }
}

macro_rules! impl_scope_deref {
    ($scope:ident) => {
        impl<'t, 'a> Deref for $scope<'t, 'a> {
            type Target = QuadratureTransformer<'a>;

            fn deref(&self) -> &Self::Target {
                &*self.transformer
            }
        }

        impl<'t, 'a> DerefMut for $scope<'t, 'a> {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut *self.transformer
            }
        }
    };
}

impl_scope_deref!(RestrictionScope);
impl_scope_deref!(ComponentScope);
impl_scope_deref!(DerivativeScope);
