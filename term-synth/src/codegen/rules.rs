//! Type default rules: from a declared type tag to placeholder generation attributes.
//!
//! Rules are evaluated in priority order and the first rule whose match set
//! contains the tag wins. The table always ends with a catch-all, so every tag
//! resolves to an attribute string.
//!
//! ```rust
//! use term_synth::codegen::TypeDefaultResolver;
//!
//! let resolver = TypeDefaultResolver::new();
//! assert_eq!(resolver.defaults_for_type("Utf8"), r"template=r'\\w'");
//! assert_eq!(resolver.defaults_for_type("Int64"), "minValue=1, maxValue=1000000");
//! assert_eq!(resolver.defaults_for_type("Interval(DayTime)"), "expr='null'");
//! ```

use once_cell::sync::Lazy;
use serde::Serialize;
use std::borrow::Cow;
use tracing::debug;

/// Attributes emitted when no other rule matches.
pub const FALLBACK_ATTRIBUTES: &str = "expr='null'";

/// A static mapping from a set of type tags to a literal attribute string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDefaultRule {
    /// Rule name, used in logs
    pub name: Cow<'static, str>,
    /// Type tags this rule applies to. An empty set matches every tag.
    pub match_types: Cow<'static, [Cow<'static, str>]>,
    /// Attribute text inserted verbatim into the generated statement
    pub attributes: Cow<'static, str>,
}

impl TypeDefaultRule {
    /// Creates a rule matching the given tags.
    pub fn new<I, S>(name: impl Into<String>, match_types: I, attributes: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Cow::Owned(name.into()),
            match_types: Cow::Owned(
                match_types
                    .into_iter()
                    .map(|t| Cow::Owned(t.into()))
                    .collect(),
            ),
            attributes: Cow::Owned(attributes.into()),
        }
    }

    const fn fixed(
        name: &'static str,
        match_types: &'static [Cow<'static, str>],
        attributes: &'static str,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            match_types: Cow::Borrowed(match_types),
            attributes: Cow::Borrowed(attributes),
        }
    }

    /// Whether this rule applies to every tag.
    pub fn is_catch_all(&self) -> bool {
        self.match_types.is_empty()
    }

    /// Whether this rule applies to `tag`.
    pub fn matches(&self, tag: &str) -> bool {
        self.is_catch_all() || self.match_types.iter().any(|t| t == tag)
    }
}

const TEXT_TYPES: &[Cow<'static, str>] = &[
    Cow::Borrowed("Utf8"),
    Cow::Borrowed("LargeUtf8"),
    Cow::Borrowed("Utf8View"),
];
const INTEGER_TYPES: &[Cow<'static, str>] = &[Cow::Borrowed("Int32"), Cow::Borrowed("Int64")];
const FLOATING_TYPES: &[Cow<'static, str>] =
    &[Cow::Borrowed("Float32"), Cow::Borrowed("Float64")];

/// The built-in rules in priority order.
static DEFAULT_RULES: [TypeDefaultRule; 4] = [
    TypeDefaultRule::fixed("text", TEXT_TYPES, r"template=r'\\w'"),
    TypeDefaultRule::fixed("integer", INTEGER_TYPES, "minValue=1, maxValue=1000000"),
    TypeDefaultRule::fixed(
        "floating",
        FLOATING_TYPES,
        "minValue=1.0, maxValue=1000000.0, step=0.1",
    ),
    TypeDefaultRule::fixed("fallback", &[], FALLBACK_ATTRIBUTES),
];

static DEFAULT_RESOLVER: Lazy<TypeDefaultResolver> = Lazy::new(TypeDefaultResolver::new);

/// Resolves generation attributes for type tags from an ordered rule table.
#[derive(Debug, Clone)]
pub struct TypeDefaultResolver {
    rules: Cow<'static, [TypeDefaultRule]>,
}

impl TypeDefaultResolver {
    /// Creates a resolver over the built-in rules.
    pub fn new() -> Self {
        Self {
            rules: Cow::Borrowed(&DEFAULT_RULES[..]),
        }
    }

    /// The process-wide resolver over the built-in rules.
    pub fn shared() -> &'static TypeDefaultResolver {
        &DEFAULT_RESOLVER
    }

    /// Adds a rule ahead of the catch-all.
    ///
    /// Added rules keep lower priority than every rule already in the table.
    pub fn with_rule(mut self, rule: TypeDefaultRule) -> Self {
        let rules = self.rules.to_mut();
        let position = rules
            .iter()
            .position(TypeDefaultRule::is_catch_all)
            .unwrap_or(rules.len());
        rules.insert(position, rule);
        self
    }

    /// The rule table in evaluation order.
    pub fn rules(&self) -> &[TypeDefaultRule] {
        &self.rules
    }

    /// Returns the attribute string for `type_tag`. Never fails.
    pub fn defaults_for_type(&self, type_tag: &str) -> &str {
        match self.rules.iter().find(|rule| rule.matches(type_tag)) {
            Some(rule) => {
                debug!(type_tag, rule = %rule.name, "Resolved type default");
                &rule.attributes
            }
            None => FALLBACK_ATTRIBUTES,
        }
    }
}

impl Default for TypeDefaultResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves `type_tag` against the built-in rules.
pub fn defaults_for_type(type_tag: &str) -> &'static str {
    TypeDefaultResolver::shared().defaults_for_type(type_tag)
}
