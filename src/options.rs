//! Compiler configuration.
use serde::{Deserialize, Serialize};

/// Options controlling code generation.
///
/// Missing fields take their default values when deserializing, so a partial configuration
/// such as `{"optimize": true}` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Compress tables to their non-zero columns and factorize the generated expressions.
    pub optimize: bool,
    /// Number of significant digits used when writing floating point numbers.
    pub precision: usize,
    /// Tabulated values with magnitude below this threshold are treated as zero.
    pub epsilon: f64,
    pub format: CodeFormat,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            optimize: false,
            precision: 15,
            epsilon: 1e-14,
            format: CodeFormat::default(),
        }
    }
}

impl CompilerOptions {
    pub fn optimized() -> Self {
        Self {
            optimize: true,
            ..Self::default()
        }
    }
}

/// Names used for the variables of the generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeFormat {
    pub element_tensor: String,
    pub weight: String,
    pub coefficients: String,
    pub function_value: String,
    pub nonzero_columns: String,
    pub integration_points: String,
    pub first_free_index: String,
    pub second_free_index: String,
    pub secondary_index: String,
}

impl Default for CodeFormat {
    fn default() -> Self {
        Self {
            element_tensor: "A".to_string(),
            weight: "W".to_string(),
            coefficients: "w".to_string(),
            function_value: "F".to_string(),
            nonzero_columns: "nzc".to_string(),
            integration_points: "ip".to_string(),
            first_free_index: "j".to_string(),
            second_free_index: "k".to_string(),
            secondary_index: "r".to_string(),
        }
    }
}

impl CodeFormat {
    /// The loop variable associated with the argument with the given number.
    ///
    /// Test functions (`-2` or `0`) use the first free index and trial functions (`-1` or `1`)
    /// the second. Returns `None` for any other number.
    pub fn argument_index(&self, number: i32) -> Option<&str> {
        match number {
            -2 | 0 => Some(&self.first_free_index),
            -1 | 1 => Some(&self.second_free_index),
            _ => None,
        }
    }
}
