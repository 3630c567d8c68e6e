//! Code synthesis: skeleton data generator scripts derived from a schema alone.

mod rules;
mod synthesizer;

pub use rules::{defaults_for_type, TypeDefaultResolver, TypeDefaultRule, FALLBACK_ATTRIBUTES};
pub use synthesizer::{
    script_data_generator_from_schema, CodeSynthesizer, GeneratedSpec, GeneratorConfig,
    DEFAULT_GENERATED_NAME, DEFAULT_ROWS,
};
