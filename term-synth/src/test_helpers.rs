//! Test fixtures: small in-memory tables registered on a fresh session.

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::prelude::SessionContext;
use std::sync::Arc;

use crate::summary::cell_to_string;

/// Registers a single nullable Int64 column named `value` as `table`.
pub async fn int_table_context(
    table: &str,
    values: Vec<Option<i64>>,
) -> Result<SessionContext, Box<dyn std::error::Error>> {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "value",
        DataType::Int64,
        true,
    )]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(Int64Array::from(values)) as ArrayRef],
    )?;

    let ctx = SessionContext::new();
    ctx.register_batch(table, batch)?;
    Ok(ctx)
}

/// Registers a four-row `id`/`name`/`score` table as `table`.
pub async fn users_context(table: &str) -> Result<SessionContext, Box<dyn std::error::Error>> {
    let ctx = SessionContext::new();
    ctx.register_batch(table, users_batch()?)?;
    Ok(ctx)
}

/// The batch behind [`users_context`].
pub fn users_batch() -> Result<RecordBatch, Box<dyn std::error::Error>> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4])) as ArrayRef,
            Arc::new(StringArray::from(vec![
                Some("alice"),
                Some("bob"),
                None,
                Some("alice"),
            ])),
            Arc::new(Float64Array::from(vec![
                Some(1.0),
                Some(2.0),
                Some(3.0),
                None,
            ])),
        ],
    )?;
    Ok(batch)
}

/// Reads the stringified cell at (`row`, `column`) across a batch sequence.
pub fn batch_value(batches: &[RecordBatch], row: usize, column: usize) -> Option<String> {
    let mut offset = row;
    for batch in batches {
        if offset < batch.num_rows() {
            return cell_to_string(batch.column(column), offset).ok();
        }
        offset -= batch.num_rows();
    }
    None
}
