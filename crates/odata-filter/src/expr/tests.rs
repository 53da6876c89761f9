//! Tests for the filter expression parser.

use super::*;
use crate::compiler::FilterCompiler;
use crate::error::FilterError;
use crate::model::{Combinator, DateOperator, FilterKind, FilterOperator, Literal, TimeUnit};
use chrono::{DateTime, TimeZone, Utc};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn compile(input: &str) -> String {
    let filters = FilterParser::parse(input).unwrap();
    FilterCompiler::at(now()).compile(&filters)
}

// ==================== Comparison Tests ====================

#[test]
fn test_parse_numeric_comparison() {
    let filters = FilterParser::parse("Age ge 18").unwrap();
    let filter = filters.iter().next().unwrap();
    assert_eq!(filter.field, "Age");
    assert_eq!(filter.operator(), FilterOperator::GreaterThanOrEqual);
    assert!(matches!(filter.kind(), FilterKind::Numeric(n) if n.value == Some(18.0)));
}

#[test]
fn test_parse_symbols_match_keywords() {
    assert_eq!(compile("Age >= 18"), "Age ge 18");
    assert_eq!(compile("Age<65"), "Age lt 65");
    assert_eq!(compile("Name = 'Ann'"), "Name eq 'Ann'");
    assert_eq!(compile("Name <> 'Ann'"), "Name ne 'Ann'");
    assert_eq!(compile("Name != 'Ann'"), "Name ne 'Ann'");
}

#[test]
fn test_parse_keywords_case_insensitive() {
    assert_eq!(compile("Age GE 18"), "Age ge 18");
    assert_eq!(compile("Name StartsWith 'A'"), "startswith(Name,'A')");
}

#[test]
fn test_parse_bare_word_is_string() {
    assert_eq!(compile("Status eq Active"), "Status eq 'Active'");
}

#[test]
fn test_parse_quoted_number_stays_string() {
    assert_eq!(compile("Code eq '042'"), "Code eq '042'");
}

#[test]
fn test_parse_escaped_quote() {
    assert_eq!(compile("Name eq 'O''Neil'"), "Name eq 'O''Neil'");
}

#[test]
fn test_parse_boolean() {
    let filters = FilterParser::parse("IsDeleted eq false").unwrap();
    let filter = filters.iter().next().unwrap();
    assert!(matches!(
        filter.kind(),
        FilterKind::Enumerated(e) if e.selected() == [Literal::Boolean(false)]
    ));
    assert_eq!(compile("IsDeleted eq false"), "IsDeleted eq false");
}

#[test]
fn test_parse_date() {
    assert_eq!(compile("HiredOn gt 2024-01-31"), "HiredOn gt 2024-01-31T00:00:00Z");
    assert_eq!(
        compile("HiredOn le 2024-01-31T10:00:00+02:00"),
        "HiredOn le 2024-01-31T08:00:00Z"
    );
}

#[test]
fn test_parse_guid() {
    assert_eq!(
        compile("OwnerId eq 3f2504e0-4f89-11d3-9a0c-0305e82c3301"),
        "OwnerId eq 3f2504e0-4f89-11d3-9a0c-0305e82c3301"
    );
}

#[test]
fn test_parse_null_comparisons() {
    assert_eq!(compile("Manager eq null"), "Manager eq null");
    assert_eq!(compile("Manager ne null"), "Manager ne null");
    assert_eq!(compile("Notes isempty"), "Notes eq null");
    assert_eq!(compile("Notes isnotempty"), "Notes ne null");
}

// ==================== String Function Tests ====================

#[test]
fn test_parse_string_functions() {
    assert_eq!(compile("Email endswith 'yahoo.com'"), "endswith(Email,'yahoo.com')");
    assert_eq!(compile("Name contains 'nn'"), "contains(Name,'nn')");
    assert_eq!(compile("Name notcontains 'nn'"), "not contains(Name,'nn')");
    assert_eq!(compile("Name not contains 'nn'"), "not contains(Name,'nn')");
}

#[test]
fn test_parse_string_function_with_number_rejected() {
    assert_eq!(
        FilterParser::parse("Name contains 12"),
        Err(FilterError::UnsupportedOperator {
            operator: "contains".into(),
            kind: "numeric"
        })
    );
}

#[test]
fn test_parse_ordered_string_rejected() {
    assert!(matches!(
        FilterParser::parse("Name gt 'A'"),
        Err(FilterError::UnsupportedOperator { kind: "string", .. })
    ));
}

// ==================== Range and Set Tests ====================

#[test]
fn test_parse_numeric_between() {
    assert_eq!(compile("Age between 18 and 30"), "(Age ge 18 and Age le 30)");
}

#[test]
fn test_parse_date_between() {
    let filters = FilterParser::parse("HiredOn between 2024-01-01 and 2024-06-30").unwrap();
    let filter = filters.iter().next().unwrap();
    assert!(matches!(
        filter.kind(),
        FilterKind::Date(d) if d.date_operator == DateOperator::Range
    ));
    assert_eq!(
        FilterCompiler::at(now()).compile(&filters),
        "(HiredOn ge 2024-01-01T00:00:00Z and HiredOn le 2024-06-30T00:00:00Z)"
    );
}

#[test]
fn test_parse_between_mixed_types_rejected() {
    assert_eq!(
        FilterParser::parse("Age between 18 and 'x'"),
        Err(FilterError::InvalidLiteral {
            value: "18 and 'x'".into()
        })
    );
}

#[test]
fn test_parse_in_list() {
    assert_eq!(
        compile("Level in ('Junior', 'Senior')"),
        "(Level eq 'Junior' or Level eq 'Senior')"
    );
    assert_eq!(
        compile("Level not in ('Junior', 'Senior')"),
        "(Level ne 'Junior' and Level ne 'Senior')"
    );
    assert_eq!(compile("Stock in (3)"), "Stock eq 3");
}

#[test]
fn test_parse_unclosed_list() {
    assert_eq!(
        FilterParser::parse("Level in ('Junior'"),
        Err(FilterError::UnclosedParenthesis)
    );
}

#[test]
fn test_parse_relative_dates() {
    assert_eq!(
        compile("HiredOn last 7 days"),
        "(HiredOn ge 2024-06-08T12:00:00Z and HiredOn le 2024-06-15T12:00:00Z)"
    );
    assert_eq!(
        compile("DueOn next 2 months"),
        "(DueOn ge 2024-06-15T12:00:00Z and DueOn le 2024-08-15T12:00:00Z)"
    );
}

#[test]
fn test_parse_relative_date_unit() {
    let filters = FilterParser::parse("At last 3 hours").unwrap();
    let filter = filters.iter().next().unwrap();
    assert!(matches!(
        filter.kind(),
        FilterKind::Date(d) if d.time_unit == TimeUnit::Hour && d.unit_value == Some(3)
    ));
}

#[test]
fn test_parse_relative_date_errors() {
    assert_eq!(
        FilterParser::parse("At last x days"),
        Err(FilterError::InvalidLiteral { value: "x".into() })
    );
    assert_eq!(
        FilterParser::parse("At last 3 fortnights"),
        Err(FilterError::InvalidTimeUnit {
            unit: "fortnights".into()
        })
    );
}

// ==================== Combinator Tests ====================

#[test]
fn test_parse_and() {
    let filters = FilterParser::parse("Age gt 18 and Age lt 65").unwrap();
    assert_eq!(filters.len(), 2);
    assert_eq!(filters.combinator(), Combinator::And);
    assert_eq!(FilterCompiler::at(now()).compile(&filters), "Age gt 18 and Age lt 65");
}

#[test]
fn test_parse_or() {
    let filters = FilterParser::parse("Active eq true or Age eq 40").unwrap();
    assert_eq!(filters.combinator(), Combinator::Or);
    assert_eq!(FilterCompiler::at(now()).compile(&filters), "Active eq true or Age eq 40");
}

#[test]
fn test_parse_mixed_combinators_rejected() {
    assert_eq!(
        FilterParser::parse("A eq 1 and B eq 2 or C eq 3"),
        Err(FilterError::MixedCombinators)
    );
}

#[test]
fn test_parse_between_inside_conjunction() {
    assert_eq!(
        compile("Email endswith 'yahoo.com' and Age between 18 and 30"),
        "endswith(Email,'yahoo.com') and (Age ge 18 and Age le 30)"
    );
}

#[test]
fn test_parse_repeated_not_equal_under_and_excludes_all() {
    let filters = FilterParser::parse("Name ne 'a' and Name ne 'b'").unwrap();
    assert_eq!(filters.len(), 1);
    assert_eq!(
        FilterCompiler::at(now()).compile(&filters),
        "(Name ne 'a' and Name ne 'b')"
    );
}

#[test]
fn test_parse_repeated_not_equal_merges_with_not_in() {
    assert_eq!(
        compile("Age ne 18 and Status not in (1, 2) and Age ne 21 and Status ne 3"),
        "(Age ne 18 and Age ne 21) and (Status ne 1 and Status ne 2 and Status ne 3)"
    );
}

#[test]
fn test_parse_repeated_not_equal_under_or_stays_or() {
    assert_eq!(compile("Name ne 'a' or Name ne 'b'"), "(Name ne 'a' or Name ne 'b')");
}

#[test]
fn test_parse_duplicate_clause_under_and_is_dropped() {
    let filters = FilterParser::parse("Age gt 18 and Age gt 18").unwrap();
    assert_eq!(filters.len(), 1);
    assert_eq!(FilterCompiler::at(now()).compile(&filters), "Age gt 18");
}

#[test]
fn test_parse_repeated_operator_under_and_rejected() {
    assert_eq!(
        FilterParser::parse("Age gt 18 and Age gt 30"),
        Err(FilterError::RepeatedClause {
            field: "Age".into(),
            operator: "gt".into()
        })
    );
    assert!(matches!(
        FilterParser::parse("Name contains 'a' and Name contains 'b'"),
        Err(FilterError::RepeatedClause { .. })
    ));
}

// ==================== Error Tests ====================

#[test]
fn test_parse_empty() {
    assert_eq!(FilterParser::parse(""), Err(FilterError::EmptyExpression));
    assert_eq!(FilterParser::parse("   "), Err(FilterError::EmptyExpression));
}

#[test]
fn test_parse_missing_value() {
    assert_eq!(FilterParser::parse("Age ge"), Err(FilterError::UnexpectedEndOfInput));
    assert_eq!(FilterParser::parse("Age"), Err(FilterError::UnexpectedEndOfInput));
}

#[test]
fn test_parse_unknown_operator() {
    assert_eq!(
        FilterParser::parse("Age like 3"),
        Err(FilterError::UnknownOperator {
            operator: "like".into()
        })
    );
}

#[test]
fn test_parse_trailing_garbage() {
    assert_eq!(
        FilterParser::parse("Age ge 18 30"),
        Err(FilterError::unexpected_token("30"))
    );
}

#[test]
fn test_parse_leading_paren_rejected() {
    assert_eq!(
        FilterParser::parse("(Age ge 18)"),
        Err(FilterError::unexpected_token("("))
    );
}

// ==================== Sort Tests ====================

#[test]
fn test_parse_sorts() {
    let sorts = parse_sorts(&["Name desc, Age"]).unwrap();
    assert_eq!(sorts.len(), 2);
    assert_eq!(sorts[0].field, "Name");
    assert!(sorts[0].descending);
    assert_eq!(sorts[0].index, 0);
    assert_eq!(sorts[1].field, "Age");
    assert!(!sorts[1].descending);
    assert_eq!(sorts[1].index, 1);
}

#[test]
fn test_parse_sorts_skips_blank_items() {
    let sorts = parse_sorts(&["", "Age ASC,", " "]).unwrap();
    assert_eq!(sorts.len(), 1);
    assert!(!sorts[0].descending);
}

#[test]
fn test_parse_sorts_rejects_bad_direction() {
    assert_eq!(
        parse_sorts(&["Name sideways"]),
        Err(FilterError::unexpected_token("sideways"))
    );
    assert_eq!(
        parse_sorts(&["Name desc extra"]),
        Err(FilterError::unexpected_token("extra"))
    );
}
