//! Textual filter expressions.
//!
//! Lets a command line or saved view describe filters as text instead of
//! building [`FilterModel`](crate::model::FilterModel)s by hand. Parsing
//! produces a [`FilterCollection`](crate::model::FilterCollection) that the
//! compiler turns into a `$filter` clause.
//!
//! # Supported Syntax
//!
//! ## Comparisons
//! - `Age ge 18`, `Age >= 18` - numeric comparison
//! - `Name eq 'Ann'` - string comparison; quotes escape by doubling (`'O''Neil'`)
//! - `HiredOn gt 2024-01-31` - date comparison
//! - `Active eq true` - boolean selection
//! - `Manager eq null`, `Manager ne null` - emptiness checks
//!
//! ## String Functions
//! - `contains`, `not contains` / `notcontains`, `startswith`, `endswith`
//!
//! ## Ranges and Sets
//! - `Age between 18 and 30`, `HiredOn between 2024-01-01 and 2024-06-30`
//! - `Level in ('Junior', 'Senior')`, `Level not in (...)`
//! - `HiredOn last 7 days`, `DueOn next 2 months`
//! - `Notes isempty`, `Notes isnotempty`
//!
//! ## Combinators
//! - `and` or `or` between clauses; a single expression uses only one
//!
//! # Example
//!
//! ```
//! use odata_filter::expr::FilterParser;
//! use odata_filter::model::Combinator;
//!
//! let filters = FilterParser::parse("City eq 'Oslo' or City eq 'Bergen'").unwrap();
//! assert_eq!(filters.len(), 2);
//! assert_eq!(filters.combinator(), Combinator::Or);
//! ```

mod lexer;
mod parser;

pub use lexer::{Lexer, PositionedToken, Token};
pub use parser::{parse_sorts, FilterParser};

#[cfg(test)]
mod tests;
