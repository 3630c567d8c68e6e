//! Prelude for commonly used types and traits in term-synth.

pub use crate::codegen::{
    script_data_generator_from_schema, CodeSynthesizer, GeneratedSpec, GeneratorConfig,
    TypeDefaultResolver,
};
pub use crate::engine::{DataFusionEngine, SummaryEngine, TimeoutEngine};
pub use crate::error::{Result, SynthError};
pub use crate::formatters::{FormatterConfig, HumanFormatter, SummaryFormatter};
pub use crate::logging::LogConfig;
pub use crate::schema::{FieldDescriptor, SchemaIntrospector};
pub use crate::summary::{AnalyzerConfig, DataAnalyzer, SummaryRow, SummaryTable};
