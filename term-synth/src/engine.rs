//! The boundary between the profiling pipeline and the query engine.
//!
//! [`SummaryEngine`] is everything the pipeline needs from a dataset: its
//! schema, row counts, evaluation of one composed aggregation, and the engine's
//! descriptive statistics. [`DataFusionEngine`] implements it over a table
//! registered in a DataFusion [`SessionContext`]; [`TimeoutEngine`] bounds the
//! latency of any other engine.

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::prelude::{ident, Expr, SessionContext};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{Result, SynthError};
use crate::log_query;
use crate::logging::{truncate_field, LogConfig};
use crate::security::SqlSecurity;
use crate::summary::ComposedMeasure;

/// Query engine operations used by the summary pipeline.
///
/// Every call evaluates against the engine once; implementations must not
/// cache results between calls.
#[async_trait]
pub trait SummaryEngine: Send + Sync {
    /// The dataset schema.
    async fn schema(&self) -> Result<SchemaRef>;

    /// Total number of rows.
    async fn row_count(&self) -> Result<u64>;

    /// Number of distinct full rows.
    async fn distinct_row_count(&self) -> Result<u64>;

    /// Evaluates one composed measure, returning at most `row_limit` rows laid
    /// out as `[measure, summary, field_0, ...]`.
    async fn evaluate(&self, measure: &ComposedMeasure) -> Result<Vec<RecordBatch>>;

    /// Runs the engine's descriptive statistics over `columns`.
    ///
    /// The result has a leading statistic-name column followed by one column
    /// per requested field, in request order, with rows such as `mean` and
    /// `std`. Result columns are positional; their names are not significant.
    async fn describe(&self, columns: &[String]) -> Result<Vec<RecordBatch>>;
}

/// [`SummaryEngine`] over a table registered in a DataFusion session.
#[derive(Clone)]
pub struct DataFusionEngine {
    ctx: SessionContext,
    table: String,
    log_config: LogConfig,
}

impl std::fmt::Debug for DataFusionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFusionEngine")
            .field("table", &self.table)
            .field("log_config", &self.log_config)
            .finish_non_exhaustive()
    }
}

impl DataFusionEngine {
    /// Creates an engine over `table`, which must already be registered in
    /// `ctx`.
    pub fn new(ctx: SessionContext, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        SqlSecurity::validate_identifier(&table)?;
        Ok(Self {
            ctx,
            table,
            log_config: LogConfig::default(),
        })
    }

    /// Sets the logging configuration.
    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// The logging configuration.
    pub fn log_config(&self) -> &LogConfig {
        &self.log_config
    }

    /// The session the table is registered in.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// The table being profiled.
    pub fn table(&self) -> &str {
        &self.table
    }

    async fn dataframe(&self) -> Result<datafusion::prelude::DataFrame> {
        self.ctx
            .table(self.table.as_str())
            .await
            .map_err(|e| SynthError::engine_evaluation(format!("table '{}'", self.table), e))
    }
}

#[async_trait]
impl SummaryEngine for DataFusionEngine {
    async fn schema(&self) -> Result<SchemaRef> {
        let df = self.dataframe().await?;
        Ok(df.schema().inner().clone())
    }

    #[instrument(skip(self), fields(table = %self.table))]
    async fn row_count(&self) -> Result<u64> {
        let count = self
            .dataframe()
            .await?
            .count()
            .await
            .map_err(|e| SynthError::engine_evaluation("row count", e))?;
        Ok(count as u64)
    }

    #[instrument(skip(self), fields(table = %self.table))]
    async fn distinct_row_count(&self) -> Result<u64> {
        let count = self
            .dataframe()
            .await?
            .distinct()
            .map_err(|e| SynthError::engine_evaluation("distinct row count", e))?
            .count()
            .await
            .map_err(|e| SynthError::engine_evaluation("distinct row count", e))?;
        Ok(count as u64)
    }

    #[instrument(skip(self, measure), fields(table = %self.table, measure = %measure.name))]
    async fn evaluate(&self, measure: &ComposedMeasure) -> Result<Vec<RecordBatch>> {
        let sql = measure.to_sql(&self.table)?;
        log_query!(
            self.log_config,
            sql = %truncate_field(&sql, self.log_config.max_field_length),
            "Evaluating measure"
        );

        let operation = || format!("measure '{}'", measure.name);
        let batches = self
            .ctx
            .sql(&sql)
            .await
            .map_err(|e| SynthError::engine_evaluation(operation(), e))?
            .collect()
            .await
            .map_err(|e| SynthError::engine_evaluation(operation(), e))?;

        debug!(
            rows = batches.iter().map(|b| b.num_rows()).sum::<usize>(),
            "Measure evaluated"
        );
        Ok(batches)
    }

    #[instrument(skip(self, columns), fields(table = %self.table, columns = columns.len()))]
    async fn describe(&self, columns: &[String]) -> Result<Vec<RecordBatch>> {
        // Positional aliases keep dataset names clear of the `describe` label column
        let projection: Vec<Expr> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| ident(name).alias(format!("field_{i}")))
            .collect();
        let described = self
            .dataframe()
            .await?
            .select(projection)
            .map_err(|e| SynthError::engine_evaluation("describe", e))?
            .describe()
            .await
            .map_err(|e| SynthError::engine_evaluation("describe", e))?;

        described
            .collect()
            .await
            .map_err(|e| SynthError::engine_evaluation("describe", e))
    }
}

/// Wraps an engine, bounding every call with a timeout.
///
/// An elapsed call fails with [`SynthError::EngineEvaluation`]; the inner
/// call is dropped, not retried.
#[derive(Debug, Clone)]
pub struct TimeoutEngine<E> {
    inner: E,
    timeout: Duration,
}

impl<E: SummaryEngine> TimeoutEngine<E> {
    /// Wraps `inner` with the given per-call timeout.
    pub fn new(inner: E, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The wrapped engine.
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// The per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(elapsed) => Err(SynthError::engine_evaluation(
                format!("{operation} (timed out after {:?})", self.timeout),
                elapsed,
            )),
        }
    }
}

#[async_trait]
impl<E: SummaryEngine> SummaryEngine for TimeoutEngine<E> {
    async fn schema(&self) -> Result<SchemaRef> {
        self.bounded("schema", self.inner.schema()).await
    }

    async fn row_count(&self) -> Result<u64> {
        self.bounded("row count", self.inner.row_count()).await
    }

    async fn distinct_row_count(&self) -> Result<u64> {
        self.bounded("distinct row count", self.inner.distinct_row_count())
            .await
    }

    async fn evaluate(&self, measure: &ComposedMeasure) -> Result<Vec<RecordBatch>> {
        let operation = format!("measure '{}'", measure.name);
        self.bounded(&operation, self.inner.evaluate(measure)).await
    }

    async fn describe(&self, columns: &[String]) -> Result<Vec<RecordBatch>> {
        self.bounded("describe", self.inner.describe(columns)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;
    use crate::summary::{MeasureComposer, MeasureKind, ScalarContext};
    use crate::test_helpers::{batch_value, int_table_context};

    #[tokio::test]
    async fn test_row_counts() {
        let ctx = int_table_context("data", vec![Some(1), Some(2), Some(2), None])
            .await
            .unwrap();
        let engine = DataFusionEngine::new(ctx, "data").unwrap();

        assert_eq!(engine.row_count().await.unwrap(), 4);
        assert_eq!(engine.distinct_row_count().await.unwrap(), 3);
        assert_eq!(engine.schema().await.unwrap().fields().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_rows_keep_nulls() {
        let ctx = int_table_context("data", vec![Some(1), None, None])
            .await
            .unwrap();
        let engine = DataFusionEngine::new(ctx, "data").unwrap();

        assert_eq!(engine.distinct_row_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_evaluate_measure() {
        let ctx = int_table_context("data", vec![Some(1), Some(2), Some(2), None])
            .await
            .unwrap();
        let engine = DataFusionEngine::new(ctx, "data").unwrap();
        let fields = vec![FieldDescriptor::new("value", "Int64")];
        let measure = MeasureComposer::new()
            .compose(
                MeasureKind::Count,
                &fields,
                &ScalarContext {
                    row_count: 4,
                    distinct_row_count: 3,
                },
            )
            .unwrap();

        let batches = engine.evaluate(&measure).await.unwrap();
        assert_eq!(batch_value(&batches, 0, 0).unwrap(), "count");
        assert_eq!(batch_value(&batches, 0, 1).unwrap(), "4");
        assert_eq!(batch_value(&batches, 0, 2).unwrap(), "3");
    }

    #[tokio::test]
    async fn test_missing_table_is_engine_failure() {
        let engine = DataFusionEngine::new(SessionContext::new(), "missing").unwrap();
        let err = engine.row_count().await.unwrap_err();
        assert!(err.is_engine_failure());
        assert!(err.to_string().contains("table 'missing'"));
    }

    #[test]
    fn test_rejects_invalid_table_name() {
        assert!(matches!(
            DataFusionEngine::new(SessionContext::new(), "bad name"),
            Err(SynthError::Security(_))
        ));
    }

    #[tokio::test]
    async fn test_describe_column_named_describe() {
        let ctx = int_table_context("data", vec![Some(1), Some(3)])
            .await
            .unwrap();
        ctx.sql(r#"CREATE VIEW labelled AS SELECT "value" AS "describe" FROM data"#)
            .await
            .unwrap();
        let engine = DataFusionEngine::new(ctx, "labelled").unwrap();

        let batches = engine.describe(&["describe".to_string()]).await.unwrap();
        let labels: Vec<String> = (0..batches[0].num_rows())
            .map(|row| batch_value(&batches, row, 0).unwrap())
            .collect();
        let mean = labels.iter().position(|l| l == "mean").unwrap();
        assert_eq!(batch_value(&batches, mean, 1).unwrap(), "2.0");
    }

    struct SlowEngine;

    #[async_trait]
    impl SummaryEngine for SlowEngine {
        async fn schema(&self) -> Result<SchemaRef> {
            Ok(std::sync::Arc::new(arrow::datatypes::Schema::empty()))
        }

        async fn row_count(&self) -> Result<u64> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(0)
        }

        async fn distinct_row_count(&self) -> Result<u64> {
            Ok(0)
        }

        async fn evaluate(&self, _measure: &ComposedMeasure) -> Result<Vec<RecordBatch>> {
            Ok(Vec::new())
        }

        async fn describe(&self, _columns: &[String]) -> Result<Vec<RecordBatch>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_timeout_engine() {
        let engine = TimeoutEngine::new(SlowEngine, Duration::from_millis(10));

        let err = engine.row_count().await.unwrap_err();
        assert!(err.is_engine_failure());
        assert!(err.to_string().contains("row count (timed out"));

        assert_eq!(engine.distinct_row_count().await.unwrap(), 0);
        assert_eq!(engine.timeout(), Duration::from_millis(10));
    }
}
