//! Evaluation of composed measures and their union into one summary table.

use arrow::array::{Array, ArrayRef};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use tracing::{debug, instrument, warn};

use super::measures::{ComposedMeasure, MeasureKind};
use super::table::{SummaryRow, SummaryTable};
use crate::engine::SummaryEngine;
use crate::error::{Result, SynthError};
use crate::schema::FieldDescriptor;

/// Stringifies one cell; nulls become the empty string.
pub fn cell_to_string(array: &ArrayRef, row: usize) -> Result<String> {
    if array.is_null(row) {
        return Ok(String::new());
    }
    Ok(array_value_to_string(array.as_ref(), row)?)
}

/// Runs measures through an engine and appends their rows to a table.
///
/// Each call triggers exactly one engine evaluation.
pub struct SummaryAssembler<'a, E: ?Sized> {
    engine: &'a E,
}

impl<'a, E: SummaryEngine + ?Sized> SummaryAssembler<'a, E> {
    /// Creates an assembler over `engine`.
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Evaluates `measure` and appends up to `row_limit` result rows.
    ///
    /// Result columns are mapped by position onto
    /// `[measure, summary] ++ measure.columns()`. When `table` is `None` the
    /// measure's columns define the new table's layout.
    #[instrument(skip(self, table, measure), fields(measure = %measure.name))]
    pub async fn append_measure(
        &self,
        table: Option<SummaryTable>,
        measure: &ComposedMeasure,
    ) -> Result<SummaryTable> {
        let mut table = table.unwrap_or_else(|| SummaryTable::new(measure.columns()));
        let batches = self.engine.evaluate(measure).await?;
        let rows = Self::rows_from_batches(measure, &batches)?;

        debug!(rows = rows.len(), "Appending measure rows");
        table.append_rows(rows);
        Ok(table)
    }

    fn rows_from_batches(
        measure: &ComposedMeasure,
        batches: &[RecordBatch],
    ) -> Result<Vec<SummaryRow>> {
        let expected = measure.field_expressions.len() + 2;
        let limit = measure.row_limit.max(1);
        let mut rows = Vec::new();

        for batch in batches {
            if batch.num_columns() != expected {
                return Err(SynthError::engine_evaluation(
                    format!("measure '{}'", measure.name),
                    format!(
                        "expected {expected} result columns, engine returned {}",
                        batch.num_columns()
                    ),
                ));
            }

            for row in 0..batch.num_rows() {
                if rows.len() == limit {
                    return Ok(rows);
                }

                let mut summary_row = SummaryRow::new(
                    cell_to_string(batch.column(0), row)?,
                    cell_to_string(batch.column(1), row)?,
                );
                for (i, expr) in measure.field_expressions.iter().enumerate() {
                    summary_row
                        .values
                        .insert(expr.column.clone(), cell_to_string(batch.column(i + 2), row)?);
                }
                rows.push(summary_row);
            }
        }

        Ok(rows)
    }

    /// Appends one row per descriptive measure, all from a single `describe`
    /// call over the numeric fields.
    ///
    /// Non-numeric fields, and statistics the engine did not report, are left
    /// empty by the table's reconciliation.
    #[instrument(skip(self, table, kinds, fields), fields(measures = kinds.len()))]
    pub async fn append_descriptive(
        &self,
        mut table: SummaryTable,
        kinds: &[MeasureKind],
        fields: &[FieldDescriptor],
    ) -> Result<SummaryTable> {
        let numeric: Vec<String> = fields
            .iter()
            .filter(|f| f.family().is_numeric())
            .map(|f| f.name().to_string())
            .collect();

        if numeric.is_empty() {
            warn!("No numeric fields, descriptive measures will be empty");
            table.append_rows(kinds.iter().map(|k| SummaryRow::new(k.name(), "")));
            return Ok(table);
        }

        let batches = self.engine.describe(&numeric).await?;
        for kind in kinds {
            let Some(statistic) = kind.descriptive_statistic() else {
                return Err(SynthError::invalid_measure(kind.name()));
            };

            let row = match Self::find_statistic(&batches, statistic)? {
                Some((batch, index)) => {
                    let mut row = SummaryRow::new(kind.name(), "");
                    for (i, name) in numeric.iter().enumerate() {
                        if let Some(column) = batch.columns().get(i + 1) {
                            row.values
                                .insert(name.clone(), cell_to_string(column, index)?);
                        }
                    }
                    row
                }
                None => {
                    warn!(statistic, "Engine statistics did not include a row");
                    SummaryRow::new(kind.name(), "")
                }
            };
            table.append_row(row);
        }

        Ok(table)
    }

    fn find_statistic<'b>(
        batches: &'b [RecordBatch],
        statistic: &str,
    ) -> Result<Option<(&'b RecordBatch, usize)>> {
        for batch in batches {
            if batch.num_columns() == 0 {
                continue;
            }
            let labels = batch.column(0);
            for row in 0..batch.num_rows() {
                if cell_to_string(labels, row)? == statistic {
                    return Ok(Some((batch, row)));
                }
            }
        }
        Ok(None)
    }
}
