//! The long-format summary table.

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;

/// Name of the measure column.
pub const MEASURE_COLUMN: &str = "measure";
/// Name of the summary column.
pub const SUMMARY_COLUMN: &str = "summary";

/// One measure's results: a stringified value per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Measure name
    pub measure: String,
    /// Dataset-level summary for the measure, empty when not applicable
    pub summary: String,
    /// Field name to stringified value, in schema order
    pub values: IndexMap<String, String>,
}

impl SummaryRow {
    /// Creates a row without any field values.
    pub fn new(measure: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            measure: measure.into(),
            summary: summary.into(),
            values: IndexMap::new(),
        }
    }

    /// Adds a field value.
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// The value for `field`, if present.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }
}

/// Ordered measure rows over a fixed column layout of
/// `[measure, summary] ++ fields`.
///
/// Every appended row is reconciled to the table's field order: missing
/// fields are filled with the empty string and unknown fields are dropped, so
/// the column layout never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTable {
    fields: Vec<String>,
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Creates an empty table over the given field names.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// The dataset field names, in schema order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// All column names: `measure`, `summary`, then the fields.
    pub fn columns(&self) -> Vec<&str> {
        [MEASURE_COLUMN, SUMMARY_COLUMN]
            .into_iter()
            .chain(self.fields.iter().map(String::as_str))
            .collect()
    }

    /// The rows in append order.
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, reconciling it to the table's field order.
    pub fn append_row(&mut self, row: SummaryRow) {
        let SummaryRow {
            measure,
            summary,
            mut values,
        } = row;

        let mut reconciled = IndexMap::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = values.swap_remove(field).unwrap_or_default();
            reconciled.insert(field.clone(), value);
        }

        if !values.is_empty() {
            debug!(
                measure = %measure,
                dropped = ?values.keys().collect::<Vec<_>>(),
                "Dropping values for fields not in the summary table"
            );
        }

        self.rows.push(SummaryRow {
            measure,
            summary,
            values: reconciled,
        });
    }

    /// Appends several rows in order.
    pub fn append_rows(&mut self, rows: impl IntoIterator<Item = SummaryRow>) {
        for row in rows {
            self.append_row(row);
        }
    }

    /// Consuming variant of [`append_row`](Self::append_row).
    pub fn append(mut self, row: SummaryRow) -> Self {
        self.append_row(row);
        self
    }

    /// The first row for `measure`.
    pub fn row(&self, measure: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.measure == measure)
    }

    /// The value of `field` in the first row for `measure`.
    pub fn value(&self, measure: &str, field: &str) -> Option<&str> {
        self.row(measure).and_then(|r| r.value(field))
    }

    /// The cells of a row in column order.
    pub fn cells<'a>(&'a self, row: &'a SummaryRow) -> Vec<(&'a str, &'a str)> {
        let mut cells = Vec::with_capacity(self.fields.len() + 2);
        cells.push((MEASURE_COLUMN, row.measure.as_str()));
        cells.push((SUMMARY_COLUMN, row.summary.as_str()));
        for field in &self.fields {
            cells.push((field.as_str(), row.value(field).unwrap_or_default()));
        }
        cells
    }

    /// Converts the table to a record batch of nullable Utf8 columns.
    ///
    /// Field columns keep their dataset names; a dataset column literally
    /// named `measure` or `summary` produces a duplicate column name.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(
            self.columns()
                .into_iter()
                .map(|name| Field::new(name, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        ));

        let mut columns: Vec<ArrayRef> = Vec::with_capacity(self.fields.len() + 2);
        columns.push(Arc::new(StringArray::from_iter_values(
            self.rows.iter().map(|r| r.measure.as_str()),
        )));
        columns.push(Arc::new(StringArray::from_iter_values(
            self.rows.iter().map(|r| r.summary.as_str()),
        )));
        for field in &self.fields {
            columns.push(Arc::new(StringArray::from_iter_values(
                self.rows.iter().map(|r| r.value(field).unwrap_or_default()),
            )));
        }

        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns() {
        let table = SummaryTable::new(["id", "name"]);
        assert_eq!(table.columns(), vec!["measure", "summary", "id", "name"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_append_reconciles_field_order() {
        let mut table = SummaryTable::new(["id", "name", "score"]);
        table.append_row(
            SummaryRow::new("mean", "")
                .with_value("score", "2.5")
                .with_value("id", "1.5")
                .with_value("extra", "ignored"),
        );

        let row = &table.rows()[0];
        let keys: Vec<&str> = row.values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name", "score"]);
        assert_eq!(row.value("name"), Some(""));
        assert_eq!(row.value("extra"), None);
        assert_eq!(table.value("mean", "score"), Some("2.5"));
    }

    #[test]
    fn test_rows_keep_append_order() {
        let table = SummaryTable::new(["id"])
            .append(SummaryRow::new("schema", "{}").with_value("id", "bigint"))
            .append(SummaryRow::new("count", "4").with_value("id", "3"));

        let measures: Vec<&str> = table.rows().iter().map(|r| r.measure.as_str()).collect();
        assert_eq!(measures, vec!["schema", "count"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_cells() {
        let table =
            SummaryTable::new(["id"]).append(SummaryRow::new("count", "4").with_value("id", "3"));
        let cells = table.cells(&table.rows()[0]);
        assert_eq!(cells, vec![("measure", "count"), ("summary", "4"), ("id", "3")]);
    }

    #[test]
    fn test_to_record_batch() {
        let table = SummaryTable::new(["id", "name"])
            .append(SummaryRow::new("count", "4").with_value("id", "3").with_value("name", "4"))
            .append(SummaryRow::new("min", "").with_value("id", "1"));

        let batch = table.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 4);
        assert_eq!(batch.schema().field(2).name(), "id");

        let name = batch
            .column(3)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(name.value(0), "4");
        assert_eq!(name.value(1), "");
    }
}
