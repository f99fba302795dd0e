//! Parameter filters.
//!
//! A parameter filter describes which values of one request parameter are
//! legitimate for a layer and therefore cacheable. Every filter carries a key
//! (the request parameter name), an optional default value, and a way to
//! decide whether a given value is legal.
//!
//! # Variants
//!
//! - [`StyleParameterFilter`]: the `STYLES` parameter. With no explicit style
//!   list it auto-discovers styles from the layer; with an explicit list it
//!   must first be bound to the layer's available styles.
//! - [`StringParameterFilter`]: a fixed list of legal strings.
//! - [`RegexParameterFilter`]: values matching a regular expression.
//! - [`IntegerParameterFilter`]: a fixed list of legal integers.

use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Key of the style filter.
pub const STYLES_KEY: &str = "STYLES";

/// Canonical form of a filter key, used for store lookups.
pub fn canonical_key(key: &str) -> String {
    key.to_ascii_uppercase()
}

// =============================================================================
// ParameterFilter
// =============================================================================

/// A parameter filter of any supported kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParameterFilter {
    Style(StyleParameterFilter),
    String(StringParameterFilter),
    Regex(RegexParameterFilter),
    Integer(IntegerParameterFilter),
}

impl ParameterFilter {
    /// The request parameter this filter applies to, in its declared casing.
    pub fn key(&self) -> &str {
        match self {
            ParameterFilter::Style(_) => STYLES_KEY,
            ParameterFilter::String(f) => &f.key,
            ParameterFilter::Regex(f) => &f.key,
            ParameterFilter::Integer(f) => &f.key,
        }
    }

    /// Value used when the request does not carry the parameter.
    pub fn default_value(&self) -> Option<&str> {
        match self {
            ParameterFilter::Style(f) => f.default_value.as_deref(),
            ParameterFilter::String(f) => f.default_value.as_deref(),
            ParameterFilter::Regex(f) => f.default_value.as_deref(),
            ParameterFilter::Integer(f) => f.default_value.as_deref(),
        }
    }

    /// Enumerable legal values, or `None` if the filter cannot enumerate them.
    pub fn legal_values(&self) -> Result<Option<Vec<String>>, FilterError> {
        match self {
            ParameterFilter::Style(f) => f.legal_values(),
            ParameterFilter::String(f) => Ok(Some(f.values.clone())),
            ParameterFilter::Regex(_) => Ok(None),
            ParameterFilter::Integer(f) => {
                Ok(Some(f.values.iter().map(|v| v.to_string()).collect()))
            }
        }
    }

    /// Check whether `value` is legal for this filter.
    pub fn applies(&self, value: &str) -> Result<bool, FilterError> {
        match self {
            ParameterFilter::Style(f) => f.applies(value),
            ParameterFilter::String(f) => Ok(f.values.iter().any(|v| v == value)),
            ParameterFilter::Regex(f) => f.applies(value),
            ParameterFilter::Integer(f) => Ok(value
                .trim()
                .parse::<i64>()
                .map(|n| f.values.contains(&n))
                .unwrap_or(false)),
        }
    }

    /// Resolve a request value to the value that should be cached.
    ///
    /// An absent or empty value resolves to the default value (or the empty
    /// string when there is none). Illegal values are rejected.
    pub fn apply(&self, value: Option<&str>) -> Result<String, FilterError> {
        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ => return Ok(self.default_value().unwrap_or_default().to_string()),
        };

        if self.applies(value)? {
            Ok(value.to_string())
        } else {
            Err(FilterError::IllegalValue {
                key: self.key().to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Check that the filter's own definition is usable.
    ///
    /// Only regex filters can be malformed: their pattern must compile.
    pub fn validate(&self) -> Result<(), FilterError> {
        match self {
            ParameterFilter::Regex(f) => f.compile().map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Returns the style filter if this is one.
    pub fn as_style(&self) -> Option<&StyleParameterFilter> {
        match self {
            ParameterFilter::Style(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_style_mut(&mut self) -> Option<&mut StyleParameterFilter> {
        match self {
            ParameterFilter::Style(f) => Some(f),
            _ => None,
        }
    }
}

impl From<StyleParameterFilter> for ParameterFilter {
    fn from(filter: StyleParameterFilter) -> Self {
        ParameterFilter::Style(filter)
    }
}

impl From<StringParameterFilter> for ParameterFilter {
    fn from(filter: StringParameterFilter) -> Self {
        ParameterFilter::String(filter)
    }
}

impl From<RegexParameterFilter> for ParameterFilter {
    fn from(filter: RegexParameterFilter) -> Self {
        ParameterFilter::Regex(filter)
    }
}

impl From<IntegerParameterFilter> for ParameterFilter {
    fn from(filter: IntegerParameterFilter) -> Self {
        ParameterFilter::Integer(filter)
    }
}

// =============================================================================
// Style Filter
// =============================================================================

/// Filter over the `STYLES` request parameter.
///
/// `explicit_styles == None` means "auto": every style the layer offers is
/// cacheable, and there is no enumerable list. `Some(vec![])` is an explicit
/// empty list and is not the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleParameterFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default, rename = "styles", skip_serializing_if = "Option::is_none")]
    pub explicit_styles: Option<Vec<String>>,

    /// Styles the layer currently offers. Bound at runtime, never persisted.
    #[serde(skip)]
    available_styles: Option<BTreeSet<String>>,
}

impl StyleParameterFilter {
    /// Create an auto-discovering style filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter restricted to the given styles.
    pub fn with_styles<I, S>(styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            explicit_styles: Some(styles.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Whether this filter auto-discovers styles.
    pub fn is_auto(&self) -> bool {
        self.explicit_styles.is_none()
    }

    /// Bind the filter to the styles the layer offers.
    pub fn bind_available_styles<I, S>(&mut self, styles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_styles = Some(styles.into_iter().map(Into::into).collect());
    }

    pub fn is_bound(&self) -> bool {
        self.available_styles.is_some()
    }

    /// Explicit styles that the layer actually offers, in declared order.
    ///
    /// Returns `None` for an auto filter. Fails if explicit styles are set
    /// but the filter has not been bound yet.
    pub fn legal_values(&self) -> Result<Option<Vec<String>>, FilterError> {
        let Some(explicit) = &self.explicit_styles else {
            return Ok(None);
        };
        let available = self.available()?;

        Ok(Some(
            explicit
                .iter()
                .filter(|s| available.contains(*s))
                .cloned()
                .collect(),
        ))
    }

    fn applies(&self, value: &str) -> Result<bool, FilterError> {
        match &self.explicit_styles {
            None => Ok(self
                .available_styles
                .as_ref()
                .map_or(true, |available| available.contains(value))),
            Some(_) => Ok(self
                .legal_values()?
                .is_some_and(|legal| legal.iter().any(|s| s == value))),
        }
    }

    fn available(&self) -> Result<&BTreeSet<String>, FilterError> {
        self.available_styles
            .as_ref()
            .ok_or_else(|| FilterError::InconsistentState {
                key: STYLES_KEY.to_string(),
            })
    }
}

// =============================================================================
// String, Regex and Integer Filters
// =============================================================================

/// Filter accepting a fixed list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringParameterFilter {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default)]
    pub values: Vec<String>,
}

impl StringParameterFilter {
    pub fn new<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            default_value: None,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}

/// Filter accepting values that fully match a regular expression.
///
/// The pattern is stored as text so the filter keeps value semantics; it is
/// compiled when a value is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexParameterFilter {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(rename = "regex")]
    pub pattern: String,

    #[serde(default)]
    pub case_insensitive: bool,
}

impl RegexParameterFilter {
    pub fn new(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default_value: None,
            pattern: pattern.into(),
            case_insensitive: false,
        }
    }

    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    fn compile(&self) -> Result<Regex, FilterError> {
        RegexBuilder::new(&format!("^(?:{})$", self.pattern))
            .case_insensitive(self.case_insensitive)
            .build()
            .map_err(|e| FilterError::InvalidPattern {
                key: self.key.clone(),
                message: e.to_string(),
            })
    }

    fn applies(&self, value: &str) -> Result<bool, FilterError> {
        Ok(self.compile()?.is_match(value))
    }
}

/// Filter accepting a fixed list of integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegerParameterFilter {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default)]
    pub values: Vec<i64>,
}

impl IntegerParameterFilter {
    pub fn new(key: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            key: key.into(),
            default_value: None,
            values: values.into_iter().collect(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
