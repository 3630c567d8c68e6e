//! SQL hardening for the queries term-synth builds at run time.
//!
//! Column names come from arbitrary dataset schemas, so they are always
//! quoted rather than pattern-checked. Table and view names are supplied by
//! the caller and must look like plain SQL identifiers.

use crate::error::{Result, SynthError};
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum accepted length of any identifier.
const MAX_IDENTIFIER_LENGTH: usize = 1024;

/// Maximum accepted length of a table or view name.
const MAX_TABLE_NAME_LENGTH: usize = 128;

/// SQL identifier validation and escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates a table or view name.
    ///
    /// # Examples
    /// ```rust
    /// use term_synth::security::SqlSecurity;
    ///
    /// assert!(SqlSecurity::validate_identifier("data_analysis_summary").is_ok());
    /// assert!(SqlSecurity::validate_identifier("schema.table").is_ok());
    /// assert!(SqlSecurity::validate_identifier("users; DROP TABLE users").is_err());
    /// ```
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(SynthError::Security(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > MAX_TABLE_NAME_LENGTH {
            return Err(SynthError::Security(format!(
                "SQL identifier too long (max {MAX_TABLE_NAME_LENGTH} characters)"
            )));
        }

        static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$")
                .expect("Hard-coded regex pattern should be valid")
        });

        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(SynthError::Security(format!(
                "Invalid SQL identifier format: '{identifier}'. Identifiers must start with a letter or underscore and contain only letters, numbers, underscores, and dots"
            )));
        }

        Ok(())
    }

    /// Quotes a column name for use in generated SQL.
    ///
    /// Any non-empty name is accepted; embedded double quotes are doubled.
    ///
    /// ```rust
    /// use term_synth::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::quote_identifier("Order Id").unwrap(), "\"Order Id\"");
    /// assert_eq!(SqlSecurity::quote_identifier("a\"b").unwrap(), "\"a\"\"b\"");
    /// ```
    pub fn quote_identifier(identifier: &str) -> Result<String> {
        if identifier.is_empty() {
            return Err(SynthError::Security(
                "SQL identifier cannot be empty".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LENGTH {
            return Err(SynthError::Security(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LENGTH} characters)"
            )));
        }

        if identifier.contains('\0') {
            return Err(SynthError::Security(
                "SQL identifier cannot contain null bytes".to_string(),
            ));
        }

        let escaped = identifier.replace('"', "\"\"");
        Ok(format!("\"{escaped}\""))
    }

    /// Renders a string as a single-quoted SQL literal.
    pub fn quote_literal(value: &str) -> String {
        let escaped = value.replace('\0', "").replace('\'', "''");
        format!("'{escaped}'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_table_names() {
        assert!(SqlSecurity::validate_identifier("data").is_ok());
        assert!(SqlSecurity::validate_identifier("_staging").is_ok());
        assert!(SqlSecurity::validate_identifier("public.orders").is_ok());
    }

    #[test]
    fn test_invalid_table_names() {
        assert!(SqlSecurity::validate_identifier("").is_err());
        assert!(SqlSecurity::validate_identifier("   ").is_err());
        assert!(SqlSecurity::validate_identifier(&"a".repeat(200)).is_err());
        assert!(SqlSecurity::validate_identifier("id; DROP TABLE").is_err());
        assert!(SqlSecurity::validate_identifier("col name").is_err());
        assert!(SqlSecurity::validate_identifier("123col").is_err());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(
            SqlSecurity::quote_identifier("customer_id").unwrap(),
            "\"customer_id\""
        );
        assert_eq!(
            SqlSecurity::quote_identifier("col\"with\"quotes").unwrap(),
            "\"col\"\"with\"\"quotes\""
        );
        assert!(SqlSecurity::quote_identifier("").is_err());
        assert!(SqlSecurity::quote_identifier("bad\0name").is_err());
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(SqlSecurity::quote_literal("bigint"), "'bigint'");
        assert_eq!(SqlSecurity::quote_literal("it's"), "'it''s'");
        assert_eq!(SqlSecurity::quote_literal(""), "''");
    }
}
