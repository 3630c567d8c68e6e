//! Dataset profiling: measures, their evaluation, and the summary table.
//!
//! The pipeline runs the built-in measures in a fixed order
//! (`schema`, `count`, `null_probability`, `distinct_count`, `min`, `max`,
//! `mean`, `stddev`), issuing one engine evaluation per measure except for
//! `mean` and `stddev`, which share one call to the engine's descriptive
//! statistics. Every measure contributes one row to a [`SummaryTable`] whose
//! columns are `measure`, `summary` and then the dataset's fields.
//!
//! ## Example
//!
//! ```rust,no_run
//! use term_synth::summary::DataAnalyzer;
//! use datafusion::prelude::SessionContext;
//!
//! # async fn example(ctx: SessionContext) -> term_synth::Result<()> {
//! let analyzer = DataAnalyzer::for_table(ctx, "orders")?;
//! let table = analyzer.summarize_to_table().await?;
//!
//! assert_eq!(table.len(), 8);
//! println!("{:?}", table.value("null_probability", "customer_id"));
//! # Ok(())
//! # }
//! ```

mod analyzer;
mod assembler;
mod measures;
mod table;

pub use analyzer::{AnalyzerConfig, DataAnalyzer, DEFAULT_VIEW_NAME};
pub use assembler::{cell_to_string, SummaryAssembler};
pub use measures::{
    ComposedMeasure, FieldExpression, MeasureComposer, MeasureKind, MeasurePlan, ScalarContext,
    DEFAULT_ROW_LIMIT, EMPTY_DATASET_NULL_PROBABILITY, MEASURE_ALIAS, SUMMARY_ALIAS,
};
pub use table::{SummaryRow, SummaryTable, MEASURE_COLUMN, SUMMARY_COLUMN};
