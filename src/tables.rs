//! Registry of tabulated basis function values.
//!
//! The registry flattens the tabulated tables of one domain type, gives every table a unique
//! name and removes redundancy:
//!
//! - values with magnitude below `epsilon` are snapped to zero,
//! - tables with identical values are merged, the first name in sorted order being kept,
//! - with optimization enabled, tables that are zero in the same columns for every quadrature
//!   point are compressed to their non-zero columns, after which identical tables are merged
//!   once more,
//! - tables consisting only of zeros or only of ones are flagged, so that the code generator
//!   can omit them.
use crate::element::ElementId;
use crate::error::CompileError;
use crate::form::{TableKey, Tabulation};
use crate::options::CompilerOptions;
use itertools::Itertools;
use log::debug;
use nalgebra::DMatrix;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt::Write;

/// The columns of a compressed table that hold non-zero values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonZeroColumns {
    /// Number of the array holding the column indices in the generated code.
    pub id: usize,
    pub columns: Vec<usize>,
}

/// What the registry knows about a tabulated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    /// Name of the unique table holding the values.
    pub name: String,
    pub non_zeros: Option<NonZeroColumns>,
    /// All values are zero.
    pub zeros: bool,
    /// All values are one, possibly only after compression.
    pub ones: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRegistry {
    element_map: BTreeMap<usize, BTreeMap<ElementId, usize>>,
    name_map: BTreeMap<String, TableInfo>,
    tables: BTreeMap<String, DMatrix<f64>>,
}

/// Name of a table of the form `FE#_f#_C#_D###`.
///
/// `D` lists the number of derivatives in each spatial direction and is omitted when no
/// derivatives are taken, so that for a 3D element `D012` denotes `d^3/dy dz^2`.
pub fn table_name(counter: usize, facet: Option<usize>, component: Option<usize>, derivatives: &[usize]) -> String {
    let mut name = format!("FE{counter}");
    if let Some(facet) = facet {
        let _ = write!(name, "_f{facet}");
    }
    if let Some(component) = component {
        let _ = write!(name, "_C{component}");
    }
    if derivatives.iter().any(|&d| d > 0) {
        let _ = write!(name, "_D{}", derivatives.iter().join(""));
    }
    name
}

impl TableRegistry {
    pub fn new(tabulation: &Tabulation, options: &CompilerOptions) -> Result<Self, CompileError> {
        let (element_map, mut tables) = flatten_tables(tabulation)?;
        let epsilon = options.epsilon;

        for table in tables.values_mut() {
            table.apply(|v| {
                if v.abs() < epsilon {
                    *v = 0.0;
                }
            });
        }

        let (synonyms, representative) = unique_tables(&tables);
        tables.retain(|name, _| synonyms.contains_key(name));
        let ones: Vec<String> = tables
            .iter()
            .filter(|(_, t)| all_ones(t, epsilon))
            .map(|(name, _)| name.clone())
            .collect();

        let mut non_zero_columns = BTreeMap::new();
        if options.optimize {
            for (name, table) in tables.iter_mut() {
                if let Some(columns) = compressible_columns(table) {
                    let id = non_zero_columns.len();
                    debug!("Compressing table {} to columns {:?}", name, columns);
                    *table = table.select_columns(&columns);
                    non_zero_columns.insert(name.clone(), NonZeroColumns { id, columns });
                }
            }
        }

        let mut name_map: BTreeMap<String, TableInfo> = representative
            .iter()
            .map(|(name, rep)| {
                let table = &tables[rep];
                let info = TableInfo {
                    name: rep.clone(),
                    non_zeros: non_zero_columns.get(rep).cloned(),
                    zeros: table.iter().all(|&v| v == 0.0),
                    ones: ones.contains(rep),
                };
                (name.clone(), info)
            })
            .collect();

        if !non_zero_columns.is_empty() {
            // Compressed tables may have become identical
            let (synonyms, representative) = unique_tables(&tables);
            for info in name_map.values_mut() {
                info.name = representative[&info.name].clone();
            }
            tables.retain(|name, _| synonyms.contains_key(name));

            for (name, table) in &tables {
                if all_ones(table, epsilon) {
                    for info in name_map.values_mut().filter(|info| &info.name == name) {
                        info.ones = true;
                    }
                }
            }
        }
        debug!(
            "Registered {} tables, {} of which are unique",
            name_map.len(),
            tables.len()
        );

        Ok(Self {
            element_map,
            name_map,
            tables,
        })
    }

    /// The counter used in the table names of the element at the given number of points.
    pub fn element_counter(&self, points: usize, element: ElementId) -> Result<usize, CompileError> {
        self.element_map
            .get(&points)
            .and_then(|elements| elements.get(&element))
            .copied()
            .ok_or_else(|| CompileError::TableNotFound {
                name: format!("{element} at {points} points"),
            })
    }

    /// Looks up the table registered under the given original name.
    pub fn lookup(&self, name: &str) -> Result<&TableInfo, CompileError> {
        self.name_map
            .get(name)
            .ok_or_else(|| CompileError::TableNotFound { name: name.to_string() })
    }

    /// The values of the unique table with the given name.
    pub fn table(&self, name: &str) -> Result<&DMatrix<f64>, CompileError> {
        self.tables
            .get(name)
            .ok_or_else(|| CompileError::TableNotFound { name: name.to_string() })
    }

    pub fn name_map(&self) -> &BTreeMap<String, TableInfo> {
        &self.name_map
    }

    /// The unique tables, after compression.
    pub fn tables(&self) -> &BTreeMap<String, DMatrix<f64>> {
        &self.tables
    }

    /// The column list of the non-zero column array with the given number.
    pub fn non_zero_columns(&self, id: usize) -> Option<&[usize]> {
        self.name_map
            .values()
            .filter_map(|info| info.non_zeros.as_ref())
            .find(|nz| nz.id == id)
            .map(|nz| nz.columns.as_slice())
    }
}

type ElementMap = BTreeMap<usize, BTreeMap<ElementId, usize>>;

fn flatten_tables(tabulation: &Tabulation) -> Result<(ElementMap, BTreeMap<String, DMatrix<f64>>), CompileError> {
    let mut element_map = BTreeMap::new();
    let mut flat_tables = BTreeMap::new();
    let mut counter = 0;

    for (&points, elements) in tabulation {
        let counters = element_map.entry(points).or_insert_with(BTreeMap::new);
        for (&element, tables) in elements {
            counters.insert(element, counter);
            for (key, table) in tables {
                let TableKey {
                    facet,
                    component,
                    derivatives,
                } = key;
                let name = table_name(counter, *facet, *component, derivatives);
                if table.nrows() != points {
                    return Err(CompileError::InvalidTable {
                        name,
                        reason: format!("expected {} rows, found {}", points, table.nrows()),
                    });
                }
                if flat_tables.contains_key(&name) {
                    return Err(CompileError::InvalidTable {
                        name,
                        reason: "name is not unique".to_string(),
                    });
                }
                flat_tables.insert(name, table.clone());
            }
            counter += 1;
        }
    }

    Ok((element_map, flat_tables))
}

type TableContents = (usize, usize, Vec<OrderedFloat<f64>>);

fn contents(table: &DMatrix<f64>) -> TableContents {
    (
        table.nrows(),
        table.ncols(),
        table.iter().copied().map(OrderedFloat).collect(),
    )
}

/// Groups tables with identical values.
///
/// Returns a map from each representative to its synonyms (the representative itself not
/// included) and a map from every name to its representative.
fn unique_tables(tables: &BTreeMap<String, DMatrix<f64>>) -> (BTreeMap<String, Vec<String>>, BTreeMap<String, String>) {
    let mut groups: FxHashMap<TableContents, String> = FxHashMap::default();
    let mut synonyms: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut representative = BTreeMap::new();

    // Names are visited in sorted order, so the first name of each group is the representative
    for (name, table) in tables {
        let rep = groups.entry(contents(table)).or_insert_with(|| name.clone()).clone();
        let group = synonyms.entry(rep.clone()).or_default();
        if &rep != name {
            group.push(name.clone());
        }
        representative.insert(name.clone(), rep);
    }

    (synonyms, representative)
}

fn all_ones(table: &DMatrix<f64>, epsilon: f64) -> bool {
    table.iter().all(|v| (v - 1.0).abs() < epsilon)
}

/// The non-zero columns of a table, if it can be compressed to them.
///
/// Compression requires every row to be non-zero in exactly the same columns, and the columns
/// to form a proper, non-empty subset of all columns.
fn compressible_columns(table: &DMatrix<f64>) -> Option<Vec<usize>> {
    let non_zeros = |r: usize| -> Vec<usize> { (0..table.ncols()).filter(|&c| table[(r, c)] != 0.0).collect() };

    if table.nrows() == 0 {
        return None;
    }
    let columns = non_zeros(0);
    if columns.is_empty() || columns.len() == table.ncols() {
        return None;
    }
    for r in 1..table.nrows() {
        if non_zeros(r) != columns {
            return None;
        }
    }
    Some(columns)
}
