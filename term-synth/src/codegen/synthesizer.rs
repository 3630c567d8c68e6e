//! Generation of skeleton data generator scripts from a schema.
//!
//! The output is a `dbldatagen`-style Python script: one `withColumn`
//! statement per field with placeholder attributes picked by the
//! [`TypeDefaultResolver`]. It is a first draft for a human to edit; nothing
//! here checks that the script runs.

use datafusion::arrow::datatypes::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

use super::rules::TypeDefaultResolver;
use crate::error::{Result, SynthError};
use crate::schema::{display_type, type_tag};

/// Builder name used when none is configured.
pub const DEFAULT_GENERATED_NAME: &str = "synthetic_data";

/// Row count used when none is configured.
pub const DEFAULT_ROWS: u64 = 100_000;

const INDENT: &str = "    ";

const HEADER: &[&str] = &[
    "# Data generator skeleton produced by term-synth from a dataset schema",
    "# Requires the dbldatagen package: `pip install dbldatagen`",
    "# Reference:",
    "#",
    "#   dbldatagen - [https://github.com/databrickslabs/dbldatagen]",
    "#",
];

const IMPORTS: &[&str] = &["import dbldatagen as dg", "import pyspark.sql.types"];

const STUB_NOTICE: &[&str] = &[
    "# Column definitions are placeholders only - edit them to produce realistic data",
    "#",
];

/// Parameters embedded into the generator builder statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Name given to the generated data generator
    pub name: String,
    /// Number of rows the generator will produce
    pub rows: u64,
    /// Whether the generator randomizes values
    pub random: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_GENERATED_NAME.to_string(),
            rows: DEFAULT_ROWS,
            random: true,
        }
    }
}

impl GeneratorConfig {
    /// Sets the generator name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the target row count.
    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows = rows;
        self
    }

    /// Sets whether generated values are randomized.
    pub fn with_random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }
}

/// Generated script text, one entry per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSpec {
    lines: Vec<String>,
    statement_count: usize,
}

impl GeneratedSpec {
    /// All lines in output order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The per-field generation statements, in schema order.
    pub fn statements(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|line| line.trim_start().starts_with(".withColumn("))
            .map(String::as_str)
            .collect()
    }

    /// Number of per-field statements.
    pub fn statement_count(&self) -> usize {
        self.statement_count
    }

    /// The script as a single newline-joined string.
    pub fn to_code(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for GeneratedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_code())
    }
}

/// Escapes a value for a single-quoted Python string literal.
fn python_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn python_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Walks a schema and emits generation statements.
#[derive(Debug, Clone, Default)]
pub struct CodeSynthesizer {
    resolver: TypeDefaultResolver,
}

impl CodeSynthesizer {
    /// Creates a synthesizer over the built-in type default rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a synthesizer with a custom resolver.
    pub fn with_resolver(resolver: TypeDefaultResolver) -> Self {
        Self { resolver }
    }

    /// The resolver used for field attributes.
    pub fn resolver(&self) -> &TypeDefaultResolver {
        &self.resolver
    }

    /// Generates a script for `schema`.
    ///
    /// Fails with [`SynthError::InvalidSchema`] if any field has an empty name.
    /// Output depends only on the schema, the configuration and the rule
    /// table.
    #[instrument(skip(self, schema), fields(fields = schema.fields().len(), name = %config.name))]
    pub fn synthesize(&self, schema: &Schema, config: &GeneratorConfig) -> Result<GeneratedSpec> {
        let mut lines: Vec<String> = HEADER.iter().map(|l| l.to_string()).collect();
        lines.extend(IMPORTS.iter().map(|l| l.to_string()));
        lines.extend(STUB_NOTICE.iter().map(|l| l.to_string()));

        lines.push("generation_spec = (".to_string());
        lines.push(format!("{INDENT}dg.DataGenerator(sparkSession=spark,"));
        lines.push(format!(
            "{INDENT}                 name='{}',",
            python_literal(&config.name)
        ));
        lines.push(format!("{INDENT}                 rows={},", config.rows));
        lines.push(format!(
            "{INDENT}                 random={},",
            python_bool(config.random)
        ));
        lines.push(format!("{INDENT}                 )"));

        let mut statement_count = 0;
        for (index, field) in schema.fields().iter().enumerate() {
            if field.name().is_empty() {
                return Err(SynthError::invalid_schema(format!(
                    "field at position {index} has no name"
                )));
            }

            let tag = type_tag(field.data_type());
            let attributes = self.resolver.defaults_for_type(&tag);
            lines.push(format!(
                "{INDENT}.withColumn('{}', '{}', {attributes})",
                python_literal(field.name()),
                python_literal(&display_type(&tag)),
            ));
            statement_count += 1;
        }
        lines.push(format!("{INDENT})"));

        debug!(statements = statement_count, "Generated data generator script");
        Ok(GeneratedSpec {
            lines,
            statement_count,
        })
    }
}

/// Generates a script from an optional schema.
///
/// A missing schema fails with [`SynthError::InvalidSchema`].
///
/// ```rust
/// use arrow::datatypes::{DataType, Field, Schema};
/// use term_synth::codegen::{script_data_generator_from_schema, GeneratorConfig};
///
/// let schema = Schema::new(vec![
///     Field::new("id", DataType::Int64, false),
///     Field::new("name", DataType::Utf8, true),
/// ]);
/// let spec =
///     script_data_generator_from_schema(Some(&schema), &GeneratorConfig::default()).unwrap();
/// assert_eq!(spec.statement_count(), 2);
///
/// assert!(script_data_generator_from_schema(None, &GeneratorConfig::default()).is_err());
/// ```
pub fn script_data_generator_from_schema(
    schema: Option<&Schema>,
    config: &GeneratorConfig,
) -> Result<GeneratedSpec> {
    let schema = schema.ok_or_else(|| {
        SynthError::invalid_schema("a schema is required to generate a data generator script")
    })?;
    CodeSynthesizer::new().synthesize(schema, config)
}
