//! Measure definitions and the composer that turns them into aggregations.
//!
//! A measure is a pure description of one statistic computed uniformly over
//! every field of a dataset. Composing a measure against a concrete field list
//! yields a [`ComposedMeasure`]: an ordered list of per-field expressions plus
//! one summary expression, ready for the engine to evaluate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SynthError};
use crate::schema::FieldDescriptor;
use crate::security::SqlSecurity;

/// Value reported for every field by `null_probability` on an empty dataset.
pub const EMPTY_DATASET_NULL_PROBABILITY: &str = "0.0";

/// Default number of result rows retrieved per measure.
pub const DEFAULT_ROW_LIMIT: usize = 1;

/// The built-in measures, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    /// Declared type per column and the column count
    Schema,
    /// Non-null count per column
    Count,
    /// Fraction of missing values per column, rounded to 2 decimals
    NullProbability,
    /// Distinct value count per column
    DistinctCount,
    /// Minimum value per column
    Min,
    /// Maximum value per column
    Max,
    /// Mean of numeric columns, from the engine's descriptive statistics
    Mean,
    /// Sample standard deviation of numeric columns, from the engine's descriptive statistics
    Stddev,
}

impl MeasureKind {
    /// All built-in measures in the order the summary pipeline computes them.
    pub const BUILTIN: [MeasureKind; 8] = [
        MeasureKind::Schema,
        MeasureKind::Count,
        MeasureKind::NullProbability,
        MeasureKind::DistinctCount,
        MeasureKind::Min,
        MeasureKind::Max,
        MeasureKind::Mean,
        MeasureKind::Stddev,
    ];

    /// The measure name as it appears in the summary table.
    pub fn name(self) -> &'static str {
        match self {
            MeasureKind::Schema => "schema",
            MeasureKind::Count => "count",
            MeasureKind::NullProbability => "null_probability",
            MeasureKind::DistinctCount => "distinct_count",
            MeasureKind::Min => "min",
            MeasureKind::Max => "max",
            MeasureKind::Mean => "mean",
            MeasureKind::Stddev => "stddev",
        }
    }

    /// Parses a measure name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::BUILTIN
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| SynthError::invalid_measure(name))
    }

    /// Whether the measure comes from the engine's descriptive statistics
    /// rather than composed expressions.
    pub fn is_descriptive(self) -> bool {
        self.descriptive_statistic().is_some()
    }

    /// The row label used by the engine's descriptive statistics, if any.
    pub fn descriptive_statistic(self) -> Option<&'static str> {
        match self {
            MeasureKind::Mean => Some("mean"),
            MeasureKind::Stddev => Some("std"),
            _ => None,
        }
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeasureKind {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Precomputed scalars that measures embed into their expressions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarContext {
    /// Total number of rows in the dataset
    pub row_count: u64,
    /// Number of distinct full rows in the dataset
    pub distinct_row_count: u64,
}

/// One output column of a composed measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldExpression {
    /// The dataset column this expression reports on
    pub column: String,
    /// SQL expression producing the stringified statistic
    pub expression: String,
    /// Whether the expression aggregates over the dataset rows
    pub aggregate: bool,
}

impl FieldExpression {
    fn aggregate(column: &str, expression: String) -> Self {
        Self {
            column: column.to_string(),
            expression,
            aggregate: true,
        }
    }

    fn literal(column: &str, value: &str) -> Self {
        Self {
            column: column.to_string(),
            expression: SqlSecurity::quote_literal(value),
            aggregate: false,
        }
    }

    fn null(column: &str) -> Self {
        Self {
            column: column.to_string(),
            expression: "CAST(NULL AS VARCHAR)".to_string(),
            aggregate: false,
        }
    }
}

/// A measure composed against a concrete field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMeasure {
    /// Measure name, written to the `measure` column
    pub name: String,
    /// SQL expression producing the `summary` column
    pub summary_expression: String,
    /// Per-field expressions in schema order
    pub field_expressions: Vec<FieldExpression>,
    /// Maximum number of result rows to keep
    pub row_limit: usize,
}

/// Output alias of the measure name column.
pub const MEASURE_ALIAS: &str = "measure_";
/// Output alias of the summary column.
pub const SUMMARY_ALIAS: &str = "summary_";

impl ComposedMeasure {
    /// Whether any expression aggregates over the dataset rows.
    pub fn is_aggregate(&self) -> bool {
        self.field_expressions.iter().any(|e| e.aggregate)
    }

    /// Column names in output order.
    pub fn columns(&self) -> Vec<&str> {
        self.field_expressions
            .iter()
            .map(|e| e.column.as_str())
            .collect()
    }

    /// Renders the aggregation as a single SQL statement against `table`.
    ///
    /// Output columns are aliased by position (`measure_`, `summary_`,
    /// `field_0`, ...) so dataset columns named `measure` or `summary` cannot
    /// collide. Measures without aggregates are rendered without a `FROM`
    /// clause and always produce exactly one row.
    pub fn to_sql(&self, table: &str) -> Result<String> {
        SqlSecurity::validate_identifier(table)?;

        let mut select = vec![
            format!(
                "{} AS {MEASURE_ALIAS}",
                SqlSecurity::quote_literal(&self.name)
            ),
            format!("{} AS {SUMMARY_ALIAS}", self.summary_expression),
        ];
        select.extend(
            self.field_expressions
                .iter()
                .enumerate()
                .map(|(i, e)| format!("{} AS field_{i}", e.expression)),
        );

        let from = if self.is_aggregate() {
            format!(" FROM {table}")
        } else {
            String::new()
        };

        Ok(format!(
            "SELECT {}{from} LIMIT {}",
            select.join(", "),
            self.row_limit.max(1)
        ))
    }
}

/// What the pipeline has to do to produce a measure's row.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurePlan {
    /// Evaluate a composed aggregation through the engine
    Aggregate(ComposedMeasure),
    /// Read the named row from the engine's descriptive statistics
    Describe(MeasureKind),
}

/// Builds per-field aggregation expressions for the built-in measures.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasureComposer;

impl MeasureComposer {
    /// Creates a new composer.
    pub fn new() -> Self {
        Self
    }

    /// Plans a measure by name.
    pub fn plan_by_name(
        &self,
        name: &str,
        fields: &[FieldDescriptor],
        scalars: &ScalarContext,
    ) -> Result<MeasurePlan> {
        self.plan(MeasureKind::from_name(name)?, fields, scalars)
    }

    /// Plans a measure.
    ///
    /// Descriptive measures (`mean`, `stddev`) are not composed from
    /// expressions; the plan defers them to the engine's statistics primitive.
    pub fn plan(
        &self,
        kind: MeasureKind,
        fields: &[FieldDescriptor],
        scalars: &ScalarContext,
    ) -> Result<MeasurePlan> {
        if kind.is_descriptive() {
            if fields.is_empty() {
                return Err(SynthError::empty_field_set(kind.name()));
            }
            return Ok(MeasurePlan::Describe(kind));
        }
        self.compose(kind, fields, scalars)
            .map(MeasurePlan::Aggregate)
    }

    /// Composes the expressions for an expression-based measure.
    ///
    /// Fails with [`SynthError::EmptyFieldSet`] when there are no fields and
    /// with [`SynthError::InvalidMeasure`] for descriptive measures.
    pub fn compose(
        &self,
        kind: MeasureKind,
        fields: &[FieldDescriptor],
        scalars: &ScalarContext,
    ) -> Result<ComposedMeasure> {
        if kind.is_descriptive() {
            return Err(SynthError::invalid_measure(format!(
                "{} is computed from descriptive statistics, not expressions",
                kind.name()
            )));
        }
        if fields.is_empty() {
            return Err(SynthError::empty_field_set(kind.name()));
        }

        let field_expressions = fields
            .iter()
            .map(|field| Self::field_expression(kind, field, scalars))
            .collect::<Result<Vec<_>>>()?;

        Ok(ComposedMeasure {
            name: kind.name().to_string(),
            summary_expression: Self::summary_expression(kind, fields, scalars),
            field_expressions,
            row_limit: DEFAULT_ROW_LIMIT,
        })
    }

    fn summary_expression(
        kind: MeasureKind,
        fields: &[FieldDescriptor],
        scalars: &ScalarContext,
    ) -> String {
        let summary = match kind {
            MeasureKind::Schema => {
                serde_json::json!({ "column_count": fields.len() }).to_string()
            }
            MeasureKind::Count => scalars.row_count.to_string(),
            MeasureKind::DistinctCount => scalars.distinct_row_count.to_string(),
            _ => String::new(),
        };
        SqlSecurity::quote_literal(&summary)
    }

    fn field_expression(
        kind: MeasureKind,
        field: &FieldDescriptor,
        scalars: &ScalarContext,
    ) -> Result<FieldExpression> {
        let name = field.name();

        let expression = match kind {
            MeasureKind::Schema => FieldExpression::literal(name, &field.display_type()),
            MeasureKind::Count => {
                let column = SqlSecurity::quote_identifier(name)?;
                FieldExpression::aggregate(name, format!("CAST(COUNT({column}) AS VARCHAR)"))
            }
            MeasureKind::NullProbability => {
                if scalars.row_count == 0 {
                    FieldExpression::literal(name, EMPTY_DATASET_NULL_PROBABILITY)
                } else {
                    let column = SqlSecurity::quote_identifier(name)?;
                    let total = scalars.row_count;
                    FieldExpression::aggregate(
                        name,
                        format!(
                            "CAST(ROUND(CAST({total} - COUNT({column}) AS DOUBLE) / {total}, 2) AS VARCHAR)"
                        ),
                    )
                }
            }
            MeasureKind::DistinctCount => {
                let column = SqlSecurity::quote_identifier(name)?;
                FieldExpression::aggregate(
                    name,
                    format!("CAST(COUNT(DISTINCT {column}) AS VARCHAR)"),
                )
            }
            MeasureKind::Min | MeasureKind::Max => {
                if field.family().is_orderable() {
                    let column = SqlSecurity::quote_identifier(name)?;
                    let function = if kind == MeasureKind::Min { "MIN" } else { "MAX" };
                    FieldExpression::aggregate(
                        name,
                        format!("CAST({function}({column}) AS VARCHAR)"),
                    )
                } else {
                    FieldExpression::null(name)
                }
            }
            MeasureKind::Mean | MeasureKind::Stddev => {
                return Err(SynthError::invalid_measure(kind.name()));
            }
        };

        Ok(expression)
    }
}
