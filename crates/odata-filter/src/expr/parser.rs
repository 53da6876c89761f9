//! Recursive descent parser for filter expressions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::lexer::{Lexer, PositionedToken, Token};
use crate::error::{FilterError, FilterResult};
use crate::model::{
    Combinator, FilterCollection, FilterKind, FilterModel, FilterOperator, Literal, TimeUnit,
};
use crate::sort::SortDefinition;

/// Parser for textual filter expressions.
///
/// Each clause names a field, an operator and its operands. Clauses are
/// joined by a single combinator; mixing `and` and `or` is rejected because
/// a filter collection has exactly one.
///
/// # Grammar
///
/// ```text
/// expression ::= clause (("and" | "or") clause)*
/// clause     ::= field comparison
/// comparison ::= op literal
///              | "between" literal "and" literal
///              | "isempty" | "isnotempty"
///              | ["not"] "in" "(" literal ("," literal)* ")"
///              | "not" "contains" literal
///              | ("last" | "next") integer unit
/// op         ::= "eq" | "ne" | "gt" | "ge" | "lt" | "le"
///              | "=" | "==" | "!=" | "<>" | ">" | ">=" | "<" | "<="
///              | "contains" | "notcontains" | "startswith" | "endswith"
/// literal    ::= quoted | number | "true" | "false" | "null" | date | guid | word
/// ```
///
/// # Example
///
/// ```
/// use odata_filter::compiler::FilterCompiler;
/// use odata_filter::expr::FilterParser;
///
/// let filters = FilterParser::parse("Email endswith 'yahoo.com' and Age between 18 and 30").unwrap();
/// assert_eq!(
///     FilterCompiler::new().compile(&filters),
///     "endswith(Email,'yahoo.com') and (Age ge 18 and Age le 30)"
/// );
/// ```
pub struct FilterParser {
    tokens: Vec<PositionedToken>,
    position: usize,
}

/// A literal as written, before it is bound to a filter kind.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Text(String),
    Number(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Null,
}

impl Value {
    fn classify(word: &str) -> Self {
        if word.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if word.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }
        if word.eq_ignore_ascii_case("null") {
            return Value::Null;
        }
        let numeric_start = word
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
        if numeric_start {
            if let Ok(n) = word.parse::<f64>() {
                return Value::Number(n);
            }
        }
        if let Ok(guid) = Uuid::try_parse(word) {
            if word.len() == 36 {
                return Value::Guid(guid);
            }
        }
        if let Some(dt) = odata_client::datetime::parse(word) {
            return Value::DateTime(dt);
        }
        Value::Text(word.to_string())
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "string",
            Value::Number(_) => "numeric",
            Value::Boolean(_) => "boolean",
            Value::DateTime(_) => "date",
            Value::Guid(_) => "guid",
            Value::Null => "null",
        }
    }

    fn into_literal(self) -> Literal {
        match self {
            Value::Text(s) => Literal::String(s),
            Value::Number(n) => Literal::Number(n),
            Value::Boolean(b) => Literal::Boolean(b),
            Value::DateTime(dt) => Literal::DateTime(dt),
            Value::Guid(g) => Literal::Guid(g),
            Value::Null => Literal::Null,
        }
    }
}

impl FilterParser {
    /// Parses a filter expression into a filter collection.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::EmptyExpression` for blank input,
    /// `FilterError::MixedCombinators` when both `and` and `or` join clauses,
    /// `FilterError::RepeatedClause` when `and` joins two clauses with the same
    /// field and operator (other than `ne`),
    /// and token, operator or literal errors for malformed clauses.
    pub fn parse(input: &str) -> FilterResult<FilterCollection> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        let tokens = Lexer::new(trimmed).tokenize()?;
        if tokens.is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        let mut parser = Self { tokens, position: 0 };
        parser.parse_expression()
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> FilterResult<Token> {
        let token = self
            .tokens
            .get(self.position)
            .map(|t| t.token.clone())
            .ok_or(FilterError::UnexpectedEndOfInput)?;
        self.position += 1;
        Ok(token)
    }

    /// Consumes the keyword or fails.
    fn expect_keyword(&mut self, keyword: &str) -> FilterResult<()> {
        let token = self.advance()?;
        if token.is_keyword(keyword) {
            Ok(())
        } else {
            Err(FilterError::unexpected_token(token.describe()))
        }
    }

    fn expect(&mut self, expected: Token) -> FilterResult<()> {
        let token = self.advance()?;
        if token == expected {
            Ok(())
        } else {
            Err(FilterError::unexpected_token(token.describe()))
        }
    }

    /// Parses `clause (combinator clause)*`.
    fn parse_expression(&mut self) -> FilterResult<FilterCollection> {
        let mut clauses = vec![self.parse_clause()?];
        let mut combinator: Option<Combinator> = None;

        while self.peek().is_some() {
            let token = self.advance()?;
            let next = if token.is_keyword("and") {
                Combinator::And
            } else if token.is_keyword("or") {
                Combinator::Or
            } else {
                return Err(FilterError::unexpected_token(token.describe()));
            };
            match combinator {
                Some(current) if current != next => return Err(FilterError::MixedCombinators),
                _ => combinator = Some(next),
            }
            clauses.push(self.parse_clause()?);
        }

        let combinator = combinator.unwrap_or_default();
        if combinator == Combinator::And {
            clauses = fold_conjunction(clauses)?;
        }

        let mut collection = FilterCollection::new().with_combinator(combinator);
        for clause in clauses {
            collection.add(clause);
        }
        Ok(collection)
    }

    /// Parses `field comparison`.
    fn parse_clause(&mut self) -> FilterResult<FilterModel> {
        let field = match self.advance()? {
            Token::Word(w) => w,
            other => return Err(FilterError::unexpected_token(other.describe())),
        };

        match self.advance()? {
            Token::Symbol(symbol) => {
                let operator = symbol.parse::<FilterOperator>()?;
                let value = self.parse_literal()?;
                comparison(field, operator, value)
            }
            Token::Word(word) => match word.to_ascii_lowercase().as_str() {
                "isempty" => FilterModel::string(field, FilterOperator::IsEmpty, ""),
                "isnotempty" => FilterModel::string(field, FilterOperator::IsNotEmpty, ""),
                "between" => {
                    let low = self.parse_literal()?;
                    self.expect_keyword("and")?;
                    let high = self.parse_literal()?;
                    between(field, low, high)
                }
                "in" => {
                    let values = self.parse_list()?;
                    FilterModel::enumerated(field, FilterOperator::Equal, values)
                }
                "not" => match self.advance()? {
                    t if t.is_keyword("in") => {
                        let values = self.parse_list()?;
                        FilterModel::enumerated(field, FilterOperator::NotEqual, values)
                    }
                    t if t.is_keyword("contains") => {
                        let value = self.parse_literal()?;
                        comparison(field, FilterOperator::NotContains, value)
                    }
                    other => Err(FilterError::unexpected_token(other.describe())),
                },
                "last" | "next" => {
                    let (amount, unit) = self.parse_relative()?;
                    if word.eq_ignore_ascii_case("last") {
                        Ok(FilterModel::date_last(field, amount, unit))
                    } else {
                        Ok(FilterModel::date_next(field, amount, unit))
                    }
                }
                _ => {
                    let operator = word.parse::<FilterOperator>()?;
                    if operator == FilterOperator::Between || operator.is_nullary() {
                        return Err(FilterError::unexpected_token(word));
                    }
                    let value = self.parse_literal()?;
                    comparison(field, operator, value)
                }
            },
            other => Err(FilterError::unexpected_token(other.describe())),
        }
    }

    fn parse_literal(&mut self) -> FilterResult<Value> {
        match self.advance()? {
            Token::Quoted(s) => Ok(Value::Text(s)),
            Token::Word(w) => Ok(Value::classify(&w)),
            other => Err(FilterError::unexpected_token(other.describe())),
        }
    }

    /// Parses `"(" literal ("," literal)* ")"`.
    fn parse_list(&mut self) -> FilterResult<Vec<Literal>> {
        self.expect(Token::OpenParen)?;
        let mut values = vec![self.parse_literal()?.into_literal()];
        loop {
            match self.advance().map_err(|_| FilterError::UnclosedParenthesis)? {
                Token::Comma => values.push(self.parse_literal()?.into_literal()),
                Token::CloseParen => return Ok(values),
                other => return Err(FilterError::unexpected_token(other.describe())),
            }
        }
    }

    /// Parses `integer unit`.
    fn parse_relative(&mut self) -> FilterResult<(u32, TimeUnit)> {
        let amount = match self.advance()? {
            Token::Word(w) => w.parse::<u32>().map_err(|_| FilterError::invalid_literal(w))?,
            other => return Err(FilterError::unexpected_token(other.describe())),
        };
        let unit = match self.advance()? {
            Token::Word(w) => w.parse::<TimeUnit>()?,
            other => return Err(FilterError::unexpected_token(other.describe())),
        };
        Ok((amount, unit))
    }
}

/// Binds a single-operand comparison to the filter kind its literal implies.
fn comparison(field: String, operator: FilterOperator, value: Value) -> FilterResult<FilterModel> {
    let text_only = matches!(
        operator,
        FilterOperator::Contains
            | FilterOperator::NotContains
            | FilterOperator::StartsWith
            | FilterOperator::EndsWith
    );

    match value {
        Value::Text(s) => FilterModel::string(field, operator, s),
        Value::Number(n) if !text_only => FilterModel::numeric(field, operator, n),
        Value::DateTime(dt) if !text_only => FilterModel::date(field, operator, dt),
        Value::Boolean(b) if !text_only => {
            FilterModel::enumerated(field, operator, [Literal::Boolean(b)])
        }
        Value::Guid(g) if !text_only => {
            FilterModel::enumerated(field, operator, [Literal::Guid(g)])
        }
        Value::Null => match operator {
            FilterOperator::Equal => FilterModel::string(field, FilterOperator::IsEmpty, ""),
            FilterOperator::NotEqual => FilterModel::string(field, FilterOperator::IsNotEmpty, ""),
            _ => Err(FilterError::unsupported_operator(operator, "null")),
        },
        other => Err(FilterError::unsupported_operator(operator, other.kind())),
    }
}

/// Keeps `and` semantics for clauses the compiler would OR together.
///
/// Repeated `ne` clauses on one field merge into a single none-of filter;
/// exact duplicates are dropped. Any other repeated field and operator is
/// rejected.
fn fold_conjunction(clauses: Vec<FilterModel>) -> FilterResult<Vec<FilterModel>> {
    let mut folded: Vec<FilterModel> = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let operator = clause.operator();
        let position = folded
            .iter()
            .position(|f| f.field == clause.field && f.operator() == operator);
        let Some(index) = position else {
            folded.push(clause);
            continue;
        };
        let existing = &mut folded[index];

        if existing.kind() == clause.kind() {
            continue;
        }
        if operator != FilterOperator::NotEqual {
            return Err(FilterError::RepeatedClause {
                field: clause.field,
                operator: operator.to_string(),
            });
        }

        let mut values = excluded_values(existing);
        values.extend(excluded_values(&clause));
        let field = existing.field.clone();
        *existing = FilterModel::enumerated(field, FilterOperator::NotEqual, values)?;
    }
    Ok(folded)
}

/// The values a `ne` filter excludes.
fn excluded_values(filter: &FilterModel) -> Vec<Literal> {
    match filter.kind() {
        FilterKind::String(f) => f.value.clone().map(Literal::String).into_iter().collect(),
        FilterKind::Numeric(f) => f.value.map(Literal::Number).into_iter().collect(),
        FilterKind::Date(f) => f.value.map(Literal::DateTime).into_iter().collect(),
        FilterKind::Enumerated(f) => f.selected().to_vec(),
    }
}

fn between(field: String, low: Value, high: Value) -> FilterResult<FilterModel> {
    match (low, high) {
        (Value::Number(low), Value::Number(high)) => Ok(FilterModel::between(field, low, high)),
        (Value::DateTime(start), Value::DateTime(end)) => {
            Ok(FilterModel::date_range(field, Some(start), Some(end)))
        }
        (low, high) => Err(FilterError::invalid_literal(format!(
            "{} and {}",
            low.into_literal(),
            high.into_literal()
        ))),
    }
}

/// Parses sort specifications such as `"Name desc, Age"`.
///
/// Each item is a field optionally followed by `asc` or `desc`; items may be
/// split across several specs. Indexes follow the order given.
///
/// ```
/// use odata_filter::expr::parse_sorts;
/// use odata_filter::sort::SortCompiler;
///
/// let sorts = parse_sorts(&["Age", "Name desc"]).unwrap();
/// assert_eq!(SortCompiler::new().compile(&sorts), "Age,Name desc");
/// ```
pub fn parse_sorts<S: AsRef<str>>(specs: &[S]) -> FilterResult<Vec<SortDefinition>> {
    let mut sorts = Vec::new();
    for item in specs.iter().flat_map(|s| s.as_ref().split(',')) {
        let mut words = item.split_whitespace();
        let Some(field) = words.next() else {
            continue;
        };
        let descending = match words.next() {
            None => false,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => false,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => true,
            Some(other) => return Err(FilterError::unexpected_token(other)),
        };
        if let Some(extra) = words.next() {
            return Err(FilterError::unexpected_token(extra));
        }
        let index = sorts.len() as u32;
        sorts.push(SortDefinition {
            field: field.to_string(),
            index,
            descending,
        });
    }
    Ok(sorts)
}
