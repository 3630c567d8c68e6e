//! Rendering of summary tables as text, JSON or Markdown.
//!
//! # Examples
//!
//! ```rust
//! use term_synth::formatters::{HumanFormatter, SummaryFormatter};
//! use term_synth::summary::{SummaryRow, SummaryTable};
//!
//! let table = SummaryTable::new(["id"])
//!     .append(SummaryRow::new("count", "4").with_value("id", "3"));
//!
//! let output = HumanFormatter::new().format(&table).unwrap();
//! assert_eq!(output, "Data set summary\n================\nmeasure: count, summary: 4, id: 3");
//! ```

use serde::Serialize;

use crate::error::Result;
use crate::summary::{SummaryRow, SummaryTable};

/// First line of the human-readable banner.
pub const BANNER_TITLE: &str = "Data set summary";
/// Second line of the human-readable banner.
pub const BANNER_RULE: &str = "================";

/// Configuration options for formatting summary tables.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the banner (or heading) before the rows
    pub include_banner: bool,
    /// Separator between `column: value` pairs in human output
    pub separator: String,
    /// Maximum number of rows to output (None for all)
    pub max_rows: Option<usize>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_banner: true,
            separator: ", ".to_string(),
            max_rows: None,
        }
    }
}

impl FormatterConfig {
    /// Creates a configuration with rows only.
    pub fn minimal() -> Self {
        Self {
            include_banner: false,
            ..Self::default()
        }
    }

    /// Sets whether to include the banner.
    pub fn with_banner(mut self, include: bool) -> Self {
        self.include_banner = include;
        self
    }

    /// Sets the pair separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Sets the maximum number of rows to output.
    pub fn with_max_rows(mut self, max: usize) -> Self {
        self.max_rows = Some(max);
        self
    }

    fn rows<'a>(&self, table: &'a SummaryTable) -> &'a [SummaryRow] {
        let rows = table.rows();
        match self.max_rows {
            Some(max) if max < rows.len() => &rows[..max],
            _ => rows,
        }
    }
}

/// Trait for formatting summary tables into different output formats.
pub trait SummaryFormatter {
    /// Formats a summary table.
    fn format(&self, table: &SummaryTable) -> Result<String>;

    /// Formats a summary table with custom configuration.
    fn format_with_config(
        &self,
        table: &SummaryTable,
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(table)
    }
}

/// Plain text output: a two-line banner, then one `column: value` line per row.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    /// Creates a new human formatter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new human formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    /// Renders the table as lines.
    pub fn render(&self, table: &SummaryTable) -> Vec<String> {
        Self::render_with_config(table, &self.config)
    }

    fn render_with_config(table: &SummaryTable, config: &FormatterConfig) -> Vec<String> {
        let mut lines = Vec::with_capacity(table.len() + 2);
        if config.include_banner {
            lines.push(BANNER_TITLE.to_string());
            lines.push(BANNER_RULE.to_string());
        }

        for row in config.rows(table) {
            let pairs: Vec<String> = table
                .cells(row)
                .into_iter()
                .map(|(column, value)| format!("{column}: {value}"))
                .collect();
            lines.push(pairs.join(&config.separator));
        }
        lines
    }
}

impl SummaryFormatter for HumanFormatter {
    fn format(&self, table: &SummaryTable) -> Result<String> {
        self.format_with_config(table, &self.config)
    }

    fn format_with_config(
        &self,
        table: &SummaryTable,
        config: &FormatterConfig,
    ) -> Result<String> {
        Ok(Self::render_with_config(table, config).join("\n"))
    }
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    columns: Vec<&'a str>,
    rows: &'a [SummaryRow],
}

/// Formats summary tables as JSON: the column list and the rows.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    /// Creates a new JSON formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryFormatter for JsonFormatter {
    fn format(&self, table: &SummaryTable) -> Result<String> {
        self.format_with_config(table, &self.config)
    }

    fn format_with_config(
        &self,
        table: &SummaryTable,
        config: &FormatterConfig,
    ) -> Result<String> {
        let summary = JsonSummary {
            columns: table.columns(),
            rows: config.rows(table),
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&summary)?
        } else {
            serde_json::to_string(&summary)?
        };
        Ok(json)
    }
}

/// Formats summary tables as a Markdown table.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    /// Creates a new Markdown formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    /// Creates a new Markdown formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the heading level for the output.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn markdown_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

impl SummaryFormatter for MarkdownFormatter {
    fn format(&self, table: &SummaryTable) -> Result<String> {
        self.format_with_config(table, &self.config)
    }

    fn format_with_config(
        &self,
        table: &SummaryTable,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut lines = Vec::new();
        if config.include_banner {
            lines.push(format!(
                "{} {BANNER_TITLE}",
                "#".repeat(self.heading_level as usize)
            ));
            lines.push(String::new());
        }

        let columns = table.columns();
        lines.push(format!(
            "| {} |",
            columns
                .iter()
                .map(|c| markdown_cell(c))
                .collect::<Vec<_>>()
                .join(" | ")
        ));
        lines.push(format!("|{}", "---|".repeat(columns.len())));

        for row in config.rows(table) {
            let cells: Vec<String> = table
                .cells(row)
                .into_iter()
                .map(|(_, value)| markdown_cell(value))
                .collect();
            lines.push(format!("| {} |", cells.join(" | ")));
        }

        Ok(lines.join("\n"))
    }
}
