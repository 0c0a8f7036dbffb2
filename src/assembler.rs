//! Assembly of the code computing the element tensor contributions of one quadrature point.
use crate::code::{generate_loop, Declaration, Initializer, Statement, Storage, ValueType};
use crate::error::CompileError;
use crate::form::FormExpr;
use crate::normalize::normalize;
use crate::options::CodeFormat;
use crate::transformer::{FunctionValue, LoopIndex, QuadratureTransformer};
use formc_symbolics::make_product;
use log::debug;
use std::collections::BTreeMap;

/// A loop as `(index, begin, end)`.
pub type Loop = (String, usize, usize);

/// Generates the statements evaluated at each quadrature point of an integrand.
///
/// Returns the statements together with the number of operations they take per quadrature point.
/// The statements are empty if the integrand does not contribute to the element tensor.
pub fn generate_code(
    integrand: &FormExpr,
    transformer: &mut QuadratureTransformer,
) -> Result<(Vec<Statement>, usize), CompileError> {
    let integrand = normalize(integrand)?;
    let code_map = transformer.visit(&integrand)?;

    let values: Vec<_> = code_map
        .into_iter()
        .filter(|(_, value)| !value.is_zero())
        .collect();
    if values.is_empty() {
        return Ok((Vec::new(), 0));
    }

    let options = transformer.options();
    let format = &options.format;
    let weight = transformer.weight();
    let scale_factor = transformer.scale_factor();

    let mut groups: BTreeMap<Vec<Loop>, Vec<Statement>> = BTreeMap::new();
    let mut entry_ops = 0;
    for (key, value) in values {
        let (entry, loops) = element_tensor_entry(&key, format)?;
        let value = make_product([value, weight.clone(), scale_factor.clone()]);
        let value = if options.optimize { value.reduce_ops() } else { value };
        entry_ops += (value.ops() + 1) * loops.iter().map(|(_, begin, end)| end - begin).product::<usize>();
        groups.entry(loops).or_default().push(Statement::AddAssign {
            target: format!("{}[{}]", format.element_tensor, entry),
            value: value.to_string(),
        });
    }

    let (mut code, function_ops) = function_value_code(transformer.function_values(), format, options.optimize);
    let num_ops = function_ops + entry_ops;
    debug!(
        "Generated code for {} loop nests using {} operations per point",
        groups.len(),
        num_ops
    );

    code.push(Statement::comment(format!(
        "Number of operations for primary indices: {entry_ops}"
    )));
    for (loops, body) in groups {
        code.extend(generate_loop(body, &loops));
    }
    Ok((code, num_ops))
}

/// Declarations and accumulation loops of the cached function values.
fn function_value_code(function_values: &[FunctionValue], format: &CodeFormat, optimize: bool) -> (Vec<Statement>, usize) {
    let mut code = Vec::new();
    let mut num_ops = 0;
    if function_values.is_empty() {
        return (code, num_ops);
    }

    code.push(Statement::comment("Coefficient declarations"));
    code.extend(function_values.iter().map(|f| {
        Statement::declare(Declaration::new(
            Storage::Local,
            ValueType::Double,
            &f.name,
            Initializer::Float(0.0),
        ))
    }));
    code.push(Statement::Blank);

    let mut by_range: BTreeMap<usize, Vec<&FunctionValue>> = BTreeMap::new();
    for f in function_values {
        by_range.entry(f.range).or_default().push(f);
    }
    for (range, values) in by_range {
        let mut ops = 0;
        let body = values
            .into_iter()
            .map(|f| {
                let value = if optimize { f.value.reduce_ops() } else { f.value.clone() };
                ops += value.ops() + 1;
                Statement::AddAssign {
                    target: f.name.clone(),
                    value: value.to_string(),
                }
            })
            .collect();
        let ops = ops * range;
        code.push(Statement::comment(format!(
            "Total number of operations to compute function values = {ops}"
        )));
        code.extend(generate_loop(body, &[(format.secondary_index.clone(), 0, range)]));
        code.push(Statement::Blank);
        num_ops += ops;
    }
    (code, num_ops)
}

fn is_test_function(index: &LoopIndex) -> bool {
    matches!(index.argument, -2 | 0)
}

fn is_trial_function(index: &LoopIndex) -> bool {
    matches!(index.argument, -1 | 1)
}

/// The entry of the element tensor and the loops over the arguments for a key of the code map.
pub fn element_tensor_entry(key: &[LoopIndex], format: &CodeFormat) -> Result<(String, Vec<Loop>), CompileError> {
    let loop_over = |index: &LoopIndex| -> Result<Loop, CompileError> {
        let variable = format.argument_index(index.argument).ok_or_else(|| invalid_rank(key))?;
        Ok((variable.to_string(), 0, index.range))
    };

    match key {
        [] => Ok(("0".to_string(), Vec::new())),
        [test] if is_test_function(test) => Ok((test.entry.clone(), vec![loop_over(test)?])),
        [_] => Err(invalid_rank(key)),
        [a, b] => {
            let (test, trial) = match (a, b) {
                (a, b) if is_test_function(a) && is_trial_function(b) => (a, b),
                (a, b) if is_trial_function(a) && is_test_function(b) => (b, a),
                _ => return Err(invalid_rank(key)),
            };
            let entry = matrix_entry(&test.entry, trial.space_dimension, &trial.entry);
            Ok((entry, vec![loop_over(test)?, loop_over(trial)?]))
        }
        _ => Err(CompileError::UnsupportedRank { rank: key.len() }),
    }
}

fn invalid_rank(key: &[LoopIndex]) -> CompileError {
    let entries: Vec<_> = key.iter().map(|index| index.entry.as_str()).collect();
    CompileError::InvalidRank {
        key: format!("({})", entries.join(", ")),
    }
}

/// `row*columns + column`, folded where the operands are numbers.
fn matrix_entry(row: &str, columns: usize, column: &str) -> String {
    match (row.parse::<usize>(), column.parse::<usize>()) {
        (Ok(row), Ok(column)) => (row * columns + column).to_string(),
        (Ok(0), Err(_)) => column.to_string(),
        (Ok(row), Err(_)) => format!("{} + {}", row * columns, column),
        (Err(_), _) => format!("{row}*{columns} + {column}"),
    }
}
