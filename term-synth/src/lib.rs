//! # Term Synth - Dataset Profiling and Generator Scaffolding
//!
//! Term Synth profiles arbitrary tabular datasets on top of DataFusion and
//! drafts synthetic data generator scripts from their schemas. It works over
//! any number of columns of any type without knowing either in advance.
//!
//! ## Overview
//!
//! Two independent pipelines share the schema layer:
//!
//! - **Profiling** computes a fixed set of per-column measures (`schema`,
//!   `count`, `null_probability`, `distinct_count`, `min`, `max`, `mean`,
//!   `stddev`) and assembles them into one long-format [`summary::SummaryTable`]
//!   with a `measure` column, a `summary` column and one column per field.
//! - **Code synthesis** walks a schema and emits a skeleton
//!   [`dbldatagen`](https://github.com/databrickslabs/dbldatagen) script with
//!   one placeholder column definition per field. It needs only the schema,
//!   not the data.
//!
//! ## Quick Start
//!
//! ```rust
//! use term_synth::prelude::*;
//! use arrow::array::{Int64Array, StringArray};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use arrow::record_batch::RecordBatch;
//! use datafusion::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let schema = Arc::new(Schema::new(vec![
//!     Field::new("id", DataType::Int64, false),
//!     Field::new("name", DataType::Utf8, true),
//! ]));
//! let batch = RecordBatch::try_new(
//!     schema,
//!     vec![
//!         Arc::new(Int64Array::from(vec![1, 2, 3])),
//!         Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])),
//!     ],
//! )?;
//!
//! let ctx = SessionContext::new();
//! let analyzer = DataAnalyzer::from_dataframe(&ctx, ctx.read_batch(batch)?).await?;
//!
//! let table = analyzer.summarize_to_table().await?;
//! assert_eq!(table.value("count", "name"), Some("2"));
//!
//! println!("{}", analyzer.summarize().await?);
//! println!("{}", analyzer.script_data_generator(&GeneratorConfig::default()).await?);
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
//! ```
//!
//! ## Schema-only synthesis
//!
//! ```rust
//! use term_synth::codegen::{script_data_generator_from_schema, GeneratorConfig};
//! use arrow::datatypes::{DataType, Field, Schema};
//!
//! let schema = Schema::new(vec![
//!     Field::new("id", DataType::Int64, false),
//!     Field::new("name", DataType::Utf8, true),
//! ]);
//! let spec = script_data_generator_from_schema(Some(&schema), &GeneratorConfig::default())?;
//! assert_eq!(
//!     spec.statements(),
//!     vec![
//!         "    .withColumn('id', 'bigint', minValue=1, maxValue=1000000)",
//!         r"    .withColumn('name', 'string', template=r'\\w')",
//!     ]
//! );
//! # Ok::<(), term_synth::SynthError>(())
//! ```
//!
//! ## Engine access
//!
//! Every entry point takes its session or engine explicitly. The
//! [`engine::SummaryEngine`] trait is the boundary to the query engine;
//! wrap an engine in [`engine::TimeoutEngine`] to bound each call's latency.
//!
//! ## Logging
//!
//! Term Synth emits `tracing` events and spans. Use
//! [`logging::setup::init_logging`] or any subscriber of your own; SQL text is
//! only logged when [`logging::LogConfig::log_queries`] is on.

pub mod codegen;
pub mod engine;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod schema;
pub mod security;
pub mod summary;

#[cfg(test)]
pub mod test_helpers;

pub use error::{Result, SynthError};
