//! Schema introspection: ordered field descriptors and type tags.
//!
//! A type tag is the Arrow debug rendering of a column's [`DataType`]
//! (`Int64`, `Utf8`, `Timestamp(Nanosecond, None)`, ...). Everything
//! downstream (measure composition, type default rules, generated code) is
//! keyed on the tag so that synthesis can run from a bare list of
//! `(name, tag)` pairs without a live dataset.

use datafusion::arrow::datatypes::{DataType, Schema};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A column's name and declared type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    name: String,
    type_tag: String,
}

impl FieldDescriptor {
    /// Creates a descriptor from a name and a type tag.
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
        }
    }

    /// Creates a descriptor from an Arrow data type.
    pub fn from_data_type(name: impl Into<String>, data_type: &DataType) -> Self {
        Self::new(name, type_tag(data_type))
    }

    /// The column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type tag.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// The canonical display name of the declared type.
    pub fn display_type(&self) -> String {
        display_type(&self.type_tag)
    }

    /// The broad family of the declared type.
    pub fn family(&self) -> TypeFamily {
        TypeFamily::of(&self.type_tag)
    }
}

/// Renders the type tag for an Arrow data type.
pub fn type_tag(data_type: &DataType) -> String {
    format!("{data_type:?}")
}

/// Part of a tag before its parameter list: `Timestamp(Nanosecond, None)` -> `Timestamp`.
fn base_name(tag: &str) -> &str {
    tag.split('(').next().unwrap_or(tag).trim()
}

/// Tag to display alias, matched against the full tag first and then the base name.
const DISPLAY_ALIASES: &[(&str, &str)] = &[
    ("Null", "void"),
    ("Boolean", "boolean"),
    ("Int8", "tinyint"),
    ("Int16", "smallint"),
    ("Int32", "int"),
    ("Int64", "bigint"),
    ("UInt8", "tinyint"),
    ("UInt16", "smallint"),
    ("UInt32", "int"),
    ("UInt64", "bigint"),
    ("Float16", "float"),
    ("Float32", "float"),
    ("Float64", "double"),
    ("Utf8", "string"),
    ("LargeUtf8", "string"),
    ("Utf8View", "string"),
    ("Binary", "binary"),
    ("LargeBinary", "binary"),
    ("BinaryView", "binary"),
    ("Date32", "date"),
    ("Date64", "date"),
    ("Timestamp", "timestamp"),
];

/// Maps a type tag to its canonical display name.
///
/// Tags that are not in the canonicalization table pass through unchanged.
///
/// ```rust
/// use term_synth::schema::display_type;
///
/// assert_eq!(display_type("Int64"), "bigint");
/// assert_eq!(display_type("Timestamp(Microsecond, None)"), "timestamp");
/// assert_eq!(display_type("Decimal128(10, 2)"), "decimal(10,2)");
/// assert_eq!(display_type("Duration(Second)"), "Duration(Second)");
/// ```
pub fn display_type(tag: &str) -> String {
    if let Some((_, alias)) = DISPLAY_ALIASES.iter().find(|(t, _)| *t == tag) {
        return (*alias).to_string();
    }

    let base = base_name(tag);
    if base == "Decimal128" || base == "Decimal256" {
        let params: String = tag
            .find('(')
            .map_or("", |start| &tag[start..])
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        return format!("decimal{params}");
    }

    DISPLAY_ALIASES
        .iter()
        .find(|(t, _)| *t == base)
        .map(|(_, alias)| (*alias).to_string())
        .unwrap_or_else(|| tag.to_string())
}

/// Broad type families used when composing aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeFamily {
    /// Character data
    Text,
    /// Signed and unsigned integers
    Integer,
    /// Floating point numbers
    Floating,
    /// Fixed precision decimals
    Decimal,
    /// Booleans
    Boolean,
    /// Dates, times, timestamps, durations and intervals
    Temporal,
    /// Raw bytes
    Binary,
    /// Lists, structs, maps and unions
    Nested,
    /// Anything else (null, dictionary, extension types)
    Other,
}

impl TypeFamily {
    /// Classifies a type tag.
    pub fn of(tag: &str) -> Self {
        match base_name(tag) {
            "Utf8" | "LargeUtf8" | "Utf8View" => Self::Text,
            "Int8" | "Int16" | "Int32" | "Int64" | "UInt8" | "UInt16" | "UInt32" | "UInt64" => {
                Self::Integer
            }
            "Float16" | "Float32" | "Float64" => Self::Floating,
            "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => Self::Decimal,
            "Boolean" => Self::Boolean,
            "Date32" | "Date64" | "Time32" | "Time64" | "Timestamp" | "Duration" | "Interval" => {
                Self::Temporal
            }
            "Binary" | "LargeBinary" | "BinaryView" | "FixedSizeBinary" => Self::Binary,
            "List" | "LargeList" | "FixedSizeList" | "ListView" | "LargeListView" | "Struct"
            | "Map" | "Union" => Self::Nested,
            _ => Self::Other,
        }
    }

    /// Whether descriptive statistics (mean, stddev) apply.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Floating | Self::Decimal)
    }

    /// Whether min/max can be taken and rendered as text.
    pub fn is_orderable(self) -> bool {
        !matches!(self, Self::Binary | Self::Nested)
    }
}

/// Extracts ordered field descriptors from dataset schemas.
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Returns the schema's fields in declaration order.
    ///
    /// A missing schema yields an empty list. Fields that cannot be addressed
    /// as columns (empty names) are skipped rather than failing the whole
    /// introspection.
    pub fn field_descriptors(schema: Option<&Schema>) -> Vec<FieldDescriptor> {
        let Some(schema) = schema else {
            return Vec::new();
        };

        schema
            .fields()
            .iter()
            .filter_map(|field| {
                if field.name().is_empty() {
                    warn!(
                        data_type = ?field.data_type(),
                        "Skipping schema field without a name"
                    );
                    None
                } else {
                    Some(FieldDescriptor::from_data_type(
                        field.name(),
                        field.data_type(),
                    ))
                }
            })
            .collect()
    }

    /// Returns the addressable field names in declaration order.
    pub fn field_names(schema: Option<&Schema>) -> Vec<String> {
        Self::field_descriptors(schema)
            .into_iter()
            .map(|f| f.name)
            .collect()
    }

    /// One-line schema digest, e.g. `Record(id bigint,name string)`.
    ///
    /// Returns `"N/A"` when no schema is supplied.
    pub fn summarize_fields(schema: Option<&Schema>) -> String {
        if schema.is_none() {
            return "N/A".to_string();
        }

        let fields: Vec<String> = Self::field_descriptors(schema)
            .iter()
            .map(|f| format!("{} {}", f.name(), f.display_type()))
            .collect();
        format!("Record({})", fields.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::datatypes::{Field, Fields, TimeUnit};
    use std::sync::Arc;

    fn sample_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("score", DataType::Float64, true),
            Field::new(
                "updated_at",
                DataType::Timestamp(TimeUnit::Nanosecond, None),
                true,
            ),
        ])
    }

    #[test]
    fn test_field_descriptors_preserve_order() {
        let schema = sample_schema();
        let fields = SchemaIntrospector::field_descriptors(Some(&schema));

        let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["id", "name", "score", "updated_at"]);
        assert_eq!(fields[0].type_tag(), "Int64");
        assert_eq!(fields[1].type_tag(), "Utf8");
        assert_eq!(fields[3].family(), TypeFamily::Temporal);
    }

    #[test]
    fn test_missing_schema_is_empty() {
        assert!(SchemaIntrospector::field_descriptors(None).is_empty());
        assert_eq!(SchemaIntrospector::summarize_fields(None), "N/A");
    }

    #[test]
    fn test_unnamed_fields_are_skipped() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("", DataType::Utf8, true),
            Field::new("name", DataType::Utf8, true),
        ]);

        let names = SchemaIntrospector::field_names(Some(&schema));
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_summarize_fields() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]);
        assert_eq!(
            SchemaIntrospector::summarize_fields(Some(&schema)),
            "Record(id bigint,name string)"
        );
    }

    #[test]
    fn test_display_type_aliases() {
        assert_eq!(display_type("Int32"), "int");
        assert_eq!(display_type("Float32"), "float");
        assert_eq!(display_type("Utf8View"), "string");
        assert_eq!(display_type("Date32"), "date");
        assert_eq!(display_type("Decimal256(38, 10)"), "decimal(38,10)");
        assert_eq!(
            display_type("Timestamp(Millisecond, Some(\"UTC\"))"),
            "timestamp"
        );
        assert_eq!(display_type("SomethingNew"), "SomethingNew");
    }

    #[test]
    fn test_type_families() {
        assert_eq!(TypeFamily::of("Utf8"), TypeFamily::Text);
        assert_eq!(TypeFamily::of("UInt16"), TypeFamily::Integer);
        assert_eq!(TypeFamily::of("Decimal128(10, 2)"), TypeFamily::Decimal);
        assert_eq!(TypeFamily::of("Boolean"), TypeFamily::Boolean);
        assert_eq!(TypeFamily::of("Dictionary(Int32, Utf8)"), TypeFamily::Other);

        let list = type_tag(&DataType::List(Arc::new(Field::new(
            "item",
            DataType::Int32,
            true,
        ))));
        assert_eq!(TypeFamily::of(&list), TypeFamily::Nested);
        assert!(!TypeFamily::of(&list).is_orderable());

        let record = type_tag(&DataType::Struct(Fields::from(vec![Field::new(
            "a",
            DataType::Int32,
            true,
        )])));
        assert_eq!(TypeFamily::of(&record), TypeFamily::Nested);

        assert!(TypeFamily::Floating.is_numeric());
        assert!(!TypeFamily::Text.is_numeric());
        assert!(TypeFamily::Text.is_orderable());
        assert!(!TypeFamily::Binary.is_orderable());
    }
}
