//! Operators, their OData templates and per-type validity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// A comparison applied by one filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    Between,
}

/// Operators valid for string filters.
pub const STRING_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equal,
    FilterOperator::NotEqual,
    FilterOperator::Contains,
    FilterOperator::NotContains,
    FilterOperator::StartsWith,
    FilterOperator::EndsWith,
    FilterOperator::IsEmpty,
    FilterOperator::IsNotEmpty,
];

/// Operators valid for numeric and date filters.
pub const ORDERED_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equal,
    FilterOperator::NotEqual,
    FilterOperator::GreaterThan,
    FilterOperator::GreaterThanOrEqual,
    FilterOperator::LessThan,
    FilterOperator::LessThanOrEqual,
    FilterOperator::Between,
    FilterOperator::IsEmpty,
    FilterOperator::IsNotEmpty,
];

/// Operators valid for enumerated (multi-select) filters.
pub const ENUMERATED_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equal,
    FilterOperator::NotEqual,
    FilterOperator::IsEmpty,
    FilterOperator::IsNotEmpty,
];

impl FilterOperator {
    /// The OData template; `{0}` is the property path, `{1}` and `{2}` literals.
    pub fn template(self) -> &'static str {
        match self {
            FilterOperator::Equal => "{0} eq {1}",
            FilterOperator::NotEqual => "{0} ne {1}",
            FilterOperator::GreaterThan => "{0} gt {1}",
            FilterOperator::GreaterThanOrEqual => "{0} ge {1}",
            FilterOperator::LessThan => "{0} lt {1}",
            FilterOperator::LessThanOrEqual => "{0} le {1}",
            FilterOperator::Contains => "contains({0},{1})",
            FilterOperator::NotContains => "not contains({0},{1})",
            FilterOperator::StartsWith => "startswith({0},{1})",
            FilterOperator::EndsWith => "endswith({0},{1})",
            FilterOperator::IsEmpty => "{0} eq null",
            FilterOperator::IsNotEmpty => "{0} ne null",
            FilterOperator::Between => "({0} ge {1} and {0} le {2})",
        }
    }

    /// Returns true for operators that need no value.
    pub fn is_nullary(self) -> bool {
        matches!(self, FilterOperator::IsEmpty | FilterOperator::IsNotEmpty)
    }

    /// The short keyword used in textual filter expressions.
    pub fn keyword(self) -> &'static str {
        match self {
            FilterOperator::Equal => "eq",
            FilterOperator::NotEqual => "ne",
            FilterOperator::GreaterThan => "gt",
            FilterOperator::GreaterThanOrEqual => "ge",
            FilterOperator::LessThan => "lt",
            FilterOperator::LessThanOrEqual => "le",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "notcontains",
            FilterOperator::StartsWith => "startswith",
            FilterOperator::EndsWith => "endswith",
            FilterOperator::IsEmpty => "isempty",
            FilterOperator::IsNotEmpty => "isnotempty",
            FilterOperator::Between => "between",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for FilterOperator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.to_ascii_lowercase().as_str() {
            "eq" | "=" | "==" => FilterOperator::Equal,
            "ne" | "!=" | "<>" => FilterOperator::NotEqual,
            "gt" | ">" => FilterOperator::GreaterThan,
            "ge" | ">=" => FilterOperator::GreaterThanOrEqual,
            "lt" | "<" => FilterOperator::LessThan,
            "le" | "<=" => FilterOperator::LessThanOrEqual,
            "contains" => FilterOperator::Contains,
            "notcontains" => FilterOperator::NotContains,
            "startswith" => FilterOperator::StartsWith,
            "endswith" => FilterOperator::EndsWith,
            "isempty" => FilterOperator::IsEmpty,
            "isnotempty" => FilterOperator::IsNotEmpty,
            "between" => FilterOperator::Between,
            _ => return Err(FilterError::unknown_operator(s)),
        };
        Ok(op)
    }
}

/// How a date filter interprets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateOperator {
    /// Compare against `value` with the filter's operator.
    #[default]
    Exact,
    /// Within the last `unit_value` units up to now.
    Last,
    /// Within the next `unit_value` units from now.
    Next,
    /// Between the bounds of `range`.
    Range,
}

/// Unit for relative date filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    Minute,
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl FromStr for TimeUnit {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.to_ascii_lowercase().trim_end_matches('s') {
            "minute" | "min" => TimeUnit::Minute,
            "hour" | "h" => TimeUnit::Hour,
            "day" | "d" => TimeUnit::Day,
            "week" | "w" => TimeUnit::Week,
            "month" => TimeUnit::Month,
            "year" | "y" => TimeUnit::Year,
            _ => return Err(FilterError::InvalidTimeUnit { unit: s.to_string() }),
        };
        Ok(unit)
    }
}

/// How the clauses of a filter collection are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    /// The separator placed between clauses.
    pub fn separator(self) -> &'static str {
        match self {
            Combinator::And => " and ",
            Combinator::Or => " or ",
        }
    }
}
