//! Error types for filter expressions and filter models.

use thiserror::Error;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while parsing filter expressions or editing filter models.
///
/// Compiling a filter collection never fails; these errors only surface
/// from the textual parser and from rejected operator changes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter expression is empty.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// An unexpected token was encountered during parsing.
    #[error("unexpected token: {token}")]
    UnexpectedToken {
        /// The unexpected token that was encountered.
        token: String,
    },

    /// An unexpected end of input was encountered.
    #[error("unexpected end of expression")]
    UnexpectedEndOfInput,

    /// The lexer found a character it cannot tokenize.
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter {
        /// The character that could not be tokenized.
        character: char,
        /// Byte offset of the character.
        position: usize,
    },

    /// A quoted string was not terminated.
    #[error("unterminated string starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// An unclosed parenthesis was found.
    #[error("unclosed parenthesis")]
    UnclosedParenthesis,

    /// An operator keyword was not recognized.
    #[error("unknown operator: {operator}")]
    UnknownOperator {
        /// The unrecognized operator.
        operator: String,
    },

    /// The operator is not valid for the filter's value type.
    #[error("operator '{operator}' is not supported for {kind} filters")]
    UnsupportedOperator {
        /// The rejected operator keyword.
        operator: String,
        /// The filter kind that rejected it.
        kind: &'static str,
    },

    /// Clauses were joined with both `and` and `or`.
    #[error("cannot mix 'and' and 'or' in one expression")]
    MixedCombinators,

    /// Two `and`-joined clauses share a field and operator. Filters with the
    /// same field and operator are OR-ed when compiled.
    #[error("cannot join two '{operator}' clauses on {field} with 'and'")]
    RepeatedClause {
        /// The repeated field.
        field: String,
        /// The repeated operator keyword.
        operator: String,
    },

    /// A literal could not be interpreted.
    #[error("invalid literal: {value}")]
    InvalidLiteral {
        /// The offending literal text.
        value: String,
    },

    /// A relative date unit was not recognized.
    #[error("invalid time unit: {unit}")]
    InvalidTimeUnit {
        /// The unrecognized unit.
        unit: String,
    },
}

impl FilterError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>) -> Self {
        FilterError::UnexpectedToken {
            token: token.into(),
        }
    }

    /// Creates an unknown operator error.
    pub fn unknown_operator(operator: impl Into<String>) -> Self {
        FilterError::UnknownOperator {
            operator: operator.into(),
        }
    }

    /// Creates an unsupported operator error.
    pub fn unsupported_operator(operator: impl std::fmt::Display, kind: &'static str) -> Self {
        FilterError::UnsupportedOperator {
            operator: operator.to_string(),
            kind,
        }
    }

    /// Creates an invalid literal error.
    pub fn invalid_literal(value: impl Into<String>) -> Self {
        FilterError::InvalidLiteral {
            value: value.into(),
        }
    }
}
