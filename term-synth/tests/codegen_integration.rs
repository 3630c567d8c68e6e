use arrow::datatypes::{DataType, Field, Fields, Schema, TimeUnit};
use std::sync::Arc;
use term_synth::codegen::{
    script_data_generator_from_schema, CodeSynthesizer, GeneratorConfig, TypeDefaultResolver,
    TypeDefaultRule,
};
use term_synth::SynthError;

fn record_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
    ])
}

#[test]
fn test_record_schema_statements() {
    let spec =
        script_data_generator_from_schema(Some(&record_schema()), &GeneratorConfig::default())
            .unwrap();

    let statements = spec.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].contains("'id'"));
    assert!(statements[0].contains("minValue=1, maxValue=1000000"));
    assert!(statements[1].contains("'name'"));
    assert!(statements[1].contains(r"template=r'\\w'"));
}

#[test]
fn test_full_script_layout() {
    let code =
        script_data_generator_from_schema(Some(&record_schema()), &GeneratorConfig::default())
            .unwrap()
            .to_code();
    let lines: Vec<&str> = code.lines().collect();

    let header_end = lines
        .iter()
        .position(|l| !l.starts_with('#'))
        .unwrap();
    assert!(header_end > 0);
    assert_eq!(lines[header_end], "import dbldatagen as dg");
    assert_eq!(lines[header_end + 1], "import pyspark.sql.types");

    let builder = lines
        .iter()
        .position(|l| *l == "generation_spec = (")
        .unwrap();
    assert_eq!(
        &lines[builder..],
        &[
            "generation_spec = (",
            "    dg.DataGenerator(sparkSession=spark,",
            "                     name='synthetic_data',",
            "                     rows=100000,",
            "                     random=True,",
            "                     )",
            "    .withColumn('id', 'bigint', minValue=1, maxValue=1000000)",
            r"    .withColumn('name', 'string', template=r'\\w')",
            "    )",
        ]
    );
}

#[test]
fn test_output_is_byte_identical_across_runs() {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("amount", DataType::Float32, true),
        Field::new("created", DataType::Timestamp(TimeUnit::Microsecond, None), true),
        Field::new("price", DataType::Decimal128(10, 2), true),
        Field::new(
            "tags",
            DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
            true,
        ),
    ]);
    let config = GeneratorConfig::default().with_name("orders").with_rows(10);

    let first = script_data_generator_from_schema(Some(&schema), &config)
        .unwrap()
        .to_code();
    let second = script_data_generator_from_schema(Some(&schema), &config)
        .unwrap()
        .to_code();
    assert_eq!(first, second);
}

#[test]
fn test_unrecognized_types_use_null_expression() {
    let schema = Schema::new(vec![
        Field::new("created", DataType::Timestamp(TimeUnit::Microsecond, None), true),
        Field::new("price", DataType::Decimal128(10, 2), true),
        Field::new(
            "address",
            DataType::Struct(Fields::from(vec![Field::new("city", DataType::Utf8, true)])),
            true,
        ),
    ]);
    let spec = script_data_generator_from_schema(Some(&schema), &GeneratorConfig::default())
        .unwrap();

    let statements = spec.statements();
    assert_eq!(
        statements[0],
        "    .withColumn('created', 'timestamp', expr='null')"
    );
    assert_eq!(
        statements[1],
        "    .withColumn('price', 'decimal(10,2)', expr='null')"
    );
    assert!(statements[2].starts_with("    .withColumn('address', 'Struct("));
    assert!(statements[2].ends_with(", expr='null')"));
}

#[test]
fn test_missing_schema_is_rejected() {
    let err = script_data_generator_from_schema(None, &GeneratorConfig::default()).unwrap_err();
    assert!(matches!(err, SynthError::InvalidSchema(_)));
}

#[test]
fn test_appended_rule() {
    let resolver = TypeDefaultResolver::new().with_rule(TypeDefaultRule::new(
        "temporal",
        ["Date32", "Timestamp(Microsecond, None)"],
        "begin='2020-01-01 00:00:00', end='2024-12-31 23:59:59'",
    ));
    let schema = Schema::new(vec![Field::new(
        "created",
        DataType::Timestamp(TimeUnit::Microsecond, None),
        true,
    )]);

    let spec = CodeSynthesizer::with_resolver(resolver)
        .synthesize(&schema, &GeneratorConfig::default())
        .unwrap();
    assert_eq!(
        spec.statements(),
        vec!["    .withColumn('created', 'timestamp', begin='2020-01-01 00:00:00', end='2024-12-31 23:59:59')"]
    );
}
