//! The end-to-end profiling pipeline over one dataset.

use datafusion::prelude::{DataFrame, SessionContext};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::assembler::SummaryAssembler;
use super::measures::{MeasureComposer, MeasureKind, MeasurePlan, ScalarContext};
use super::table::{SummaryRow, SummaryTable};
use crate::codegen::{CodeSynthesizer, GeneratedSpec, GeneratorConfig};
use crate::engine::{DataFusionEngine, SummaryEngine};
use crate::error::{Result, SynthError};
use crate::formatters::{HumanFormatter, SummaryFormatter};
use crate::log_data_op;
use crate::logging::LogConfig;
use crate::schema::{FieldDescriptor, SchemaIntrospector};
use crate::security::SqlSecurity;

/// View name the analysed dataframe is registered under.
pub const DEFAULT_VIEW_NAME: &str = "data_analysis_summary";

/// How a dataframe is exposed to the engine for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Name of the view registered for the analysed dataframe
    pub view_name: String,
    /// Whether to materialize the dataframe before the repeated scans
    pub cache_source: bool,
    /// Logging for view registration and engine queries
    pub log_config: LogConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            view_name: DEFAULT_VIEW_NAME.to_string(),
            cache_source: true,
            log_config: LogConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Sets the view name.
    pub fn with_view_name(mut self, view_name: impl Into<String>) -> Self {
        self.view_name = view_name.into();
        self
    }

    /// Sets whether the dataframe is cached before analysis.
    pub fn with_cache_source(mut self, cache_source: bool) -> Self {
        self.cache_source = cache_source;
        self
    }

    /// Sets the logging configuration.
    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }
}

/// Profiles a dataset and derives generator scripts from its schema.
///
/// # Examples
///
/// ```rust,no_run
/// use term_synth::prelude::*;
/// use datafusion::prelude::*;
///
/// # async fn example() -> term_synth::Result<()> {
/// let ctx = SessionContext::new();
/// let df = ctx.read_csv("data/users.csv", CsvReadOptions::new()).await?;
///
/// let analyzer = DataAnalyzer::from_dataframe(&ctx, df).await?;
/// println!("{}", analyzer.summarize().await?);
/// println!("{}", analyzer.script_data_generator(&GeneratorConfig::default()).await?);
/// # Ok(())
/// # }
/// ```
pub struct DataAnalyzer<E = DataFusionEngine> {
    engine: E,
}

impl DataAnalyzer<DataFusionEngine> {
    /// Registers `df` on `ctx` with the default [`AnalyzerConfig`] and
    /// analyses it.
    pub async fn from_dataframe(ctx: &SessionContext, df: DataFrame) -> Result<Self> {
        Self::from_dataframe_with_config(ctx, df, AnalyzerConfig::default()).await
    }

    /// Registers `df` on `ctx` as `config.view_name`, replacing any table of
    /// that name, and analyses it.
    #[instrument(skip(ctx, df), fields(view = %config.view_name, cache = config.cache_source))]
    pub async fn from_dataframe_with_config(
        ctx: &SessionContext,
        df: DataFrame,
        config: AnalyzerConfig,
    ) -> Result<Self> {
        SqlSecurity::validate_identifier(&config.view_name)?;
        let log_config = config.log_config;

        let df = if config.cache_source {
            log_data_op!(log_config, view = %config.view_name, "Caching dataframe for analysis");
            df.cache().await?
        } else {
            df
        };

        ctx.deregister_table(config.view_name.as_str())?;
        ctx.register_table(config.view_name.as_str(), df.into_view())?;
        log_data_op!(log_config, view = %config.view_name, "Registered analysis view");

        let engine = DataFusionEngine::new(ctx.clone(), config.view_name)?;
        Ok(Self::new(engine.with_log_config(log_config)))
    }

    /// Analyses a table already registered on `ctx`.
    pub fn for_table(ctx: SessionContext, table: impl Into<String>) -> Result<Self> {
        Ok(Self::new(DataFusionEngine::new(ctx, table)?))
    }

    /// Sets the logging configuration of the underlying engine.
    pub fn with_log_config(self, log_config: LogConfig) -> Self {
        Self::new(self.engine.with_log_config(log_config))
    }

    /// The summary table as a DataFusion dataframe of Utf8 columns.
    pub async fn summarize_to_dataframe(&self) -> Result<DataFrame> {
        let batch = self.summarize_to_table().await?.to_record_batch()?;
        Ok(self.engine.context().read_batch(batch)?)
    }
}

impl<E: SummaryEngine> DataAnalyzer<E> {
    /// Creates an analyzer over an engine.
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// The engine being analysed.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The dataset's field descriptors in schema order.
    pub async fn field_descriptors(&self) -> Result<Vec<FieldDescriptor>> {
        let schema = self.engine.schema().await?;
        Ok(SchemaIntrospector::field_descriptors(Some(schema.as_ref())))
    }

    /// One-line digest of the dataset schema, e.g. `Record(id bigint,name string)`.
    pub async fn summarize_fields(&self) -> Result<String> {
        let schema = self.engine.schema().await?;
        Ok(SchemaIntrospector::summarize_fields(Some(schema.as_ref())))
    }

    /// Computes every built-in measure, one row each, in pipeline order.
    ///
    /// Any engine failure aborts the whole summary.
    #[instrument(skip(self))]
    pub async fn summarize_to_table(&self) -> Result<SummaryTable> {
        let started = Instant::now();
        let fields = self.field_descriptors().await?;
        info!(fields = fields.len(), "Starting dataset summary");

        let scalars = if fields.is_empty() {
            ScalarContext::default()
        } else {
            ScalarContext {
                row_count: self.engine.row_count().await?,
                distinct_row_count: self.engine.distinct_row_count().await?,
            }
        };
        debug!(
            row_count = scalars.row_count,
            distinct_row_count = scalars.distinct_row_count,
            "Computed scalar context"
        );

        let composer = MeasureComposer::new();
        let assembler = SummaryAssembler::new(&self.engine);
        let mut table = SummaryTable::new(fields.iter().map(|f| f.name().to_string()));
        // Descriptive measures come last in the pipeline and share one engine call
        let mut descriptive = Vec::new();

        for kind in MeasureKind::BUILTIN {
            match composer.plan(kind, &fields, &scalars) {
                Ok(MeasurePlan::Aggregate(measure)) => {
                    debug!(measure = %kind, "Evaluating measure");
                    table = assembler.append_measure(Some(table), &measure).await?;
                }
                Ok(MeasurePlan::Describe(kind)) => descriptive.push(kind),
                Err(SynthError::EmptyFieldSet { measure }) => {
                    warn!(measure = %measure, "No fields to aggregate, appending an empty row");
                    table.append_row(SummaryRow::new(measure, ""));
                }
                Err(e) => return Err(e),
            }
        }

        if !descriptive.is_empty() {
            table = assembler
                .append_descriptive(table, &descriptive, &fields)
                .await?;
        }

        info!(
            rows = table.len(),
            columns = table.columns().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dataset summary complete"
        );
        Ok(table)
    }

    /// The summary rendered as text: a banner and one line per measure.
    pub async fn summarize(&self) -> Result<String> {
        let table = self.summarize_to_table().await?;
        HumanFormatter::new().format(&table)
    }

    /// Generates a data generator script from the dataset's schema.
    #[instrument(skip(self, config))]
    pub async fn script_data_generator(&self, config: &GeneratorConfig) -> Result<GeneratedSpec> {
        let schema = self.engine.schema().await?;
        CodeSynthesizer::new().synthesize(schema.as_ref(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{int_table_context, users_batch};

    #[tokio::test]
    async fn test_summarize_single_column() {
        let ctx = int_table_context("data", vec![Some(1), Some(2), Some(2), None])
            .await
            .unwrap();
        let analyzer = DataAnalyzer::for_table(ctx, "data").unwrap();
        let table = analyzer.summarize_to_table().await.unwrap();

        let measures: Vec<&str> = table.rows().iter().map(|r| r.measure.as_str()).collect();
        assert_eq!(
            measures,
            vec![
                "schema",
                "count",
                "null_probability",
                "distinct_count",
                "min",
                "max",
                "mean",
                "stddev"
            ]
        );
        assert_eq!(table.value("schema", "value"), Some("bigint"));
        assert_eq!(table.row("schema").unwrap().summary, r#"{"column_count":1}"#);
        assert_eq!(table.value("count", "value"), Some("3"));
        assert_eq!(table.value("distinct_count", "value"), Some("2"));
        assert_eq!(table.row("distinct_count").unwrap().summary, "3");
        assert_eq!(table.value("null_probability", "value"), Some("0.25"));
        assert_eq!(table.value("min", "value"), Some("1"));
        assert_eq!(table.value("max", "value"), Some("2"));
    }

    #[tokio::test]
    async fn test_from_dataframe_registers_view() {
        let ctx = SessionContext::new();
        let df = ctx.read_batch(users_batch().unwrap()).unwrap();

        let analyzer = DataAnalyzer::from_dataframe(&ctx, df).await.unwrap();
        assert_eq!(analyzer.engine().table(), DEFAULT_VIEW_NAME);
        assert!(ctx.table_exist(DEFAULT_VIEW_NAME).unwrap());

        // Re-registering the same view name replaces it
        let df = ctx.read_batch(users_batch().unwrap()).unwrap();
        let config = AnalyzerConfig::default().with_cache_source(false);
        assert!(DataAnalyzer::from_dataframe_with_config(&ctx, df, config)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_log_config_reaches_engine() {
        let ctx = SessionContext::new();
        let df = ctx.read_batch(users_batch().unwrap()).unwrap();
        let config = AnalyzerConfig::default()
            .with_cache_source(false)
            .with_log_config(LogConfig::verbose());

        let analyzer = DataAnalyzer::from_dataframe_with_config(&ctx, df, config)
            .await
            .unwrap();
        assert_eq!(analyzer.engine().log_config(), &LogConfig::verbose());

        let analyzer = DataAnalyzer::for_table(ctx, DEFAULT_VIEW_NAME)
            .unwrap()
            .with_log_config(LogConfig::production());
        assert_eq!(analyzer.engine().log_config(), &LogConfig::production());
        assert_eq!(analyzer.summarize_to_table().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_from_dataframe_rejects_bad_view_name() {
        let ctx = SessionContext::new();
        let df = ctx.read_batch(users_batch().unwrap()).unwrap();
        let config = AnalyzerConfig::default().with_view_name("bad view");

        assert!(matches!(
            DataAnalyzer::from_dataframe_with_config(&ctx, df, config).await,
            Err(SynthError::Security(_))
        ));
    }

    #[tokio::test]
    async fn test_summarize_fields_and_script() {
        let ctx = SessionContext::new();
        let df = ctx.read_batch(users_batch().unwrap()).unwrap();
        let analyzer = DataAnalyzer::from_dataframe(&ctx, df).await.unwrap();

        assert_eq!(
            analyzer.summarize_fields().await.unwrap(),
            "Record(id bigint,name string,score double)"
        );

        let spec = analyzer
            .script_data_generator(&GeneratorConfig::default().with_name("users"))
            .await
            .unwrap();
        assert_eq!(spec.statement_count(), 3);
        assert!(spec.to_code().contains("name='users',"));
    }

    #[tokio::test]
    async fn test_summarize_to_dataframe() {
        let ctx = SessionContext::new();
        let df = ctx.read_batch(users_batch().unwrap()).unwrap();
        let analyzer = DataAnalyzer::from_dataframe(&ctx, df).await.unwrap();

        let summary = analyzer.summarize_to_dataframe().await.unwrap();
        let columns: Vec<String> = summary
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(columns, vec!["measure", "summary", "id", "name", "score"]);
        assert_eq!(summary.count().await.unwrap(), 8);
    }
}
