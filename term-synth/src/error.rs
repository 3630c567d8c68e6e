//! Error types for the term-synth library.
//!
//! All fallible operations return [`SynthError`] through the crate-wide
//! [`Result`] alias. Engine failures (DataFusion, Arrow, timeouts) are folded
//! into [`SynthError::EngineEvaluation`] so callers can treat every failed
//! aggregation the same way.

use thiserror::Error;

/// The main error type for term-synth.
#[derive(Error, Debug)]
pub enum SynthError {
    /// A schema was missing or structurally unusable where one is required.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A measure name that the composer does not know about.
    #[error("Invalid measure: '{0}'")]
    InvalidMeasure(String),

    /// A measure was composed against a dataset without any fields.
    #[error("Measure '{measure}' has no fields to aggregate")]
    EmptyFieldSet {
        /// Name of the measure being composed
        measure: String,
    },

    /// The query engine failed to evaluate an aggregation.
    #[error("Engine failed to evaluate {operation}: {source}")]
    EngineEvaluation {
        /// The engine operation that failed (e.g. "measure 'count'")
        operation: String,
        /// Underlying engine error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Security-related error (rejected identifier, literal, etc).
    #[error("Security error: {0}")]
    Security(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A type alias for `Result<T, SynthError>`.
pub type Result<T> = std::result::Result<T, SynthError>;

impl SynthError {
    /// Creates an invalid schema error with the given message.
    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    /// Creates an invalid measure error for the given measure name.
    pub fn invalid_measure(name: impl Into<String>) -> Self {
        Self::InvalidMeasure(name.into())
    }

    /// Creates an empty field set error for the given measure name.
    pub fn empty_field_set(measure: impl Into<String>) -> Self {
        Self::EmptyFieldSet {
            measure: measure.into(),
        }
    }

    /// Wraps an engine failure, recording which operation was running.
    pub fn engine_evaluation(
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::EngineEvaluation {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Returns true if this error came from the query engine.
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, Self::EngineEvaluation { .. })
    }
}

impl From<datafusion::error::DataFusionError> for SynthError {
    fn from(err: datafusion::error::DataFusionError) -> Self {
        Self::engine_evaluation("query", err)
    }
}

impl From<arrow::error::ArrowError> for SynthError {
    fn from(err: arrow::error::ArrowError) -> Self {
        Self::engine_evaluation("arrow computation", err)
    }
}

impl From<serde_json::Error> for SynthError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
