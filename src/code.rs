//! Structured representation of generated code and its rendering to C++.
//!
//! The generator never produces text directly. It builds a tree of [`Statement`]s, which an
//! output collaborator can inspect or serialize, and which [`CodeFormatter`] renders to the
//! C++ body of a UFC `tabulate_tensor` function.
use crate::options::CompilerOptions;
use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use std::fmt::Write;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Storage {
    Local,
    Const,
    Static,
    StaticConst,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum ValueType {
    Double,
    UnsignedInt,
    /// The UFC vertex coordinate array, `double * const *`.
    Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Initializer {
    /// A C++ expression.
    Expr(String),
    Float(f64),
    Array(Vec<f64>),
    /// A two-dimensional array given row by row.
    Table(Vec<Vec<f64>>),
    Indices(Vec<usize>),
    IndexTable(Vec<Vec<usize>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub storage: Storage,
    pub ty: ValueType,
    pub name: String,
    pub value: Initializer,
}

impl Declaration {
    pub fn new(storage: Storage, ty: ValueType, name: impl Into<String>, value: Initializer) -> Self {
        Self {
            storage,
            ty,
            name: name.into(),
            value,
        }
    }

    /// A `const double` initialized by the given expression.
    pub fn const_double(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self::new(Storage::Const, ValueType::Double, name, Initializer::Expr(expr.into()))
    }

    /// The identifiers the initializer refers to.
    pub fn dependencies(&self) -> Vec<&str> {
        match &self.value {
            Initializer::Expr(expr) => identifiers(expr).collect(),
            _ => Vec::new(),
        }
    }
}

/// Iterates over the C++ identifiers appearing in `code`.
pub fn identifiers(code: &str) -> impl Iterator<Item = &str> {
    code.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| token.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Blank,
    Comment(String),
    Declare(Declaration),
    Assign {
        target: String,
        value: String,
    },
    AddAssign {
        target: String,
        value: String,
    },
    Loop {
        index: String,
        begin: usize,
        end: usize,
        body: Vec<Statement>,
    },
    Block(Vec<Statement>),
}

impl Statement {
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    pub fn declare(declaration: Declaration) -> Self {
        Self::Declare(declaration)
    }
}

/// Wraps `body` in nested loops, the first loop being the outermost.
///
/// Each loop is given as `(index, begin, end)`. Without loops the body is returned as is.
pub fn generate_loop(body: Vec<Statement>, loops: &[(String, usize, usize)]) -> Vec<Statement> {
    loops.iter().rev().fold(body, |body, (index, begin, end)| {
        vec![Statement::Loop {
            index: index.clone(),
            begin: *begin,
            end: *end,
            body,
        }]
    })
}

/// The body of `tabulate_tensor` for one integral.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TabulateTensor {
    Cell(Vec<Statement>),
    /// Code shared by all facets, followed by one case per facet.
    ExteriorFacet {
        common: Vec<Statement>,
        cases: Vec<Vec<Statement>>,
    },
    /// Code shared by all facet pairs, followed by one case per pair, indexed as
    /// `cases[facet0][facet1]`.
    InteriorFacet {
        common: Vec<Statement>,
        cases: Vec<Vec<Vec<Statement>>>,
    },
}

/// Generated code of one integral.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegralCode {
    pub tabulate_tensor: TabulateTensor,
    /// Declarations for the body of the integral class. Quadrature code keeps all of its tables
    /// local to `tabulate_tensor`, so this is empty unless a caller adds to it.
    pub members: Vec<Statement>,
    /// Estimated number of floating point operations needed to compute the element tensor.
    pub num_ops: usize,
}

/// Renders statements to C++.
#[derive(Debug, Clone)]
pub struct CodeFormatter<'a> {
    options: &'a CompilerOptions,
    indent: usize,
}

impl<'a> CodeFormatter<'a> {
    pub fn new(options: &'a CompilerOptions) -> Self {
        Self { options, indent: 2 }
    }

    pub fn with_indent(self, indent: usize) -> Self {
        Self { indent, ..self }
    }

    /// Formats a floating point number with the configured number of significant digits.
    pub fn format_float(&self, value: f64) -> String {
        if value == 0.0 {
            return "0.0".to_string();
        }
        let digits = self.options.precision.max(1);
        let rounded: f64 = format!("{:.*e}", digits - 1, value)
            .parse()
            .unwrap_or(value);
        format!("{rounded:?}")
    }

    pub fn format_statements(&self, statements: &[Statement]) -> String {
        let mut out = String::new();
        // Writing to a string cannot fail
        let _ = self.write_statements(&mut out, statements, 0);
        out
    }

    pub fn format_tabulate_tensor(&self, code: &TabulateTensor) -> String {
        let mut out = String::new();
        let _ = self.write_tabulate_tensor(&mut out, code);
        out
    }

    pub fn write_tabulate_tensor<W: Write>(&self, out: &mut W, code: &TabulateTensor) -> fmt::Result {
        match code {
            TabulateTensor::Cell(body) => self.write_statements(out, body, 0),
            TabulateTensor::ExteriorFacet { common, cases } => {
                self.write_statements(out, common, 0)?;
                writeln!(out)?;
                writeln!(out, "// Switch for each of the facets")?;
                self.write_switch(out, "facet", cases, 0, |out, case, level| {
                    self.write_case(out, case, level)
                })
            }
            TabulateTensor::InteriorFacet { common, cases } => {
                self.write_statements(out, common, 0)?;
                writeln!(out)?;
                writeln!(out, "// Switch for each of the facet pairs")?;
                self.write_switch(out, "facet0", cases, 0, |out, inner, level| {
                    self.write_switch(out, "facet1", inner, level, |out, case, level| {
                        self.write_case(out, case, level)
                    })?;
                    writeln!(out, "{}break;", self.pad(level))
                })
            }
        }
    }

    fn write_switch<W: Write, T>(
        &self,
        out: &mut W,
        variable: &str,
        cases: &[T],
        level: usize,
        mut write_case: impl FnMut(&mut W, &T, usize) -> fmt::Result,
    ) -> fmt::Result {
        let pad = self.pad(level);
        writeln!(out, "{pad}switch ({variable})")?;
        writeln!(out, "{pad}{{")?;
        for (i, case) in cases.iter().enumerate() {
            writeln!(out, "{pad}case {i}:")?;
            write_case(out, case, level + 1)?;
        }
        writeln!(out, "{pad}}}")
    }

    fn write_case<W: Write>(&self, out: &mut W, body: &[Statement], level: usize) -> fmt::Result {
        let pad = self.pad(level);
        writeln!(out, "{pad}{{")?;
        self.write_statements(out, body, level + 1)?;
        writeln!(out, "{}break;", self.pad(level + 1))?;
        writeln!(out, "{pad}}}")
    }

    pub fn write_statements<W: Write>(&self, out: &mut W, statements: &[Statement], level: usize) -> fmt::Result {
        for statement in statements {
            self.write_statement(out, statement, level)?;
        }
        Ok(())
    }

    fn write_statement<W: Write>(&self, out: &mut W, statement: &Statement, level: usize) -> fmt::Result {
        let pad = self.pad(level);
        match statement {
            Statement::Blank => writeln!(out),
            Statement::Comment(text) => writeln!(out, "{pad}// {text}"),
            Statement::Declare(declaration) => self.write_declaration(out, declaration, level),
            Statement::Assign { target, value } => writeln!(out, "{pad}{target} = {value};"),
            Statement::AddAssign { target, value } => writeln!(out, "{pad}{target} += {value};"),
            Statement::Loop {
                index,
                begin,
                end,
                body,
            } => {
                writeln!(out, "{pad}for (unsigned int {index} = {begin}; {index} < {end}; {index}++)")?;
                writeln!(out, "{pad}{{")?;
                self.write_statements(out, body, level + 1)?;
                writeln!(out, "{pad}}}// end loop over '{index}'")
            }
            Statement::Block(body) => {
                writeln!(out, "{pad}{{")?;
                self.write_statements(out, body, level + 1)?;
                writeln!(out, "{pad}}}")
            }
        }
    }

    fn write_declaration<W: Write>(&self, out: &mut W, declaration: &Declaration, level: usize) -> fmt::Result {
        let pad = self.pad(level);
        let storage = match declaration.storage {
            Storage::Local => "",
            Storage::Const => "const ",
            Storage::Static => "static ",
            Storage::StaticConst => "static const ",
        };
        let ty = match declaration.ty {
            ValueType::Double => "double",
            ValueType::UnsignedInt => "unsigned int",
            ValueType::Coordinates => "double * const *",
        };
        let name = &declaration.name;
        let floats = |values: &[f64]| values.iter().map(|&v| self.format_float(v)).join(", ");
        let indices = |values: &[usize]| values.iter().join(", ");

        match &declaration.value {
            Initializer::Expr(expr) => writeln!(out, "{pad}{storage}{ty} {name} = {expr};"),
            Initializer::Float(value) => {
                writeln!(out, "{pad}{storage}{ty} {name} = {};", self.format_float(*value))
            }
            Initializer::Array(values) => {
                writeln!(out, "{pad}{storage}{ty} {name}[{}] = {{{}}};", values.len(), floats(values))
            }
            Initializer::Table(rows) => {
                let cols = rows.first().map_or(0, Vec::len);
                writeln!(out, "{pad}{storage}{ty} {name}[{}][{cols}] = \\", rows.len())?;
                let body = rows
                    .iter()
                    .map(|row| format!("{pad}{{{}}}", floats(row)))
                    .join(",\n");
                writeln!(out, "{pad}{{{}}};", body.trim_start())
            }
            Initializer::Indices(values) => {
                writeln!(out, "{pad}{storage}{ty} {name}[{}] = {{{}}};", values.len(), indices(values))
            }
            Initializer::IndexTable(rows) => {
                let cols = rows.first().map_or(0, Vec::len);
                let body = rows.iter().map(|row| format!("{{{}}}", indices(row))).join(", ");
                writeln!(out, "{pad}{storage}{ty} {name}[{}][{cols}] = {{{body}}};", rows.len())
            }
        }
    }

    fn pad(&self, level: usize) -> String {
        " ".repeat(level * self.indent)
    }
}
