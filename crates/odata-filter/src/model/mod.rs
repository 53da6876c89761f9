//! Per-field filter state.
//!
//! A [`FilterModel`] is the live state of one filter condition: the field it
//! applies to, the operator and a value payload shaped by the field's type
//! ([`FilterKind`]). Models are edited in place and compiled by
//! [`FilterCompiler`](crate::compiler::FilterCompiler).
//!
//! The operator always belongs to the set valid for the model's kind;
//! constructors and [`FilterModel::set_operator`] reject anything else.

mod collection;
mod literal;
mod operator;

pub use collection::FilterCollection;
pub use literal::{format_datetime, format_number, quote, Literal};
pub use operator::{
    Combinator, DateOperator, FilterOperator, TimeUnit, ENUMERATED_OPERATORS, ORDERED_OPERATORS,
    STRING_OPERATORS,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::columns::Column;
use crate::descriptor::SemanticType;
use crate::error::{FilterError, FilterResult};

/// Presentation options carried alongside a filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiOptions {
    pub label: Option<String>,
}

/// Payload of a string filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringFilter {
    pub value: Option<String>,
}

/// Payload of a numeric filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericFilter {
    pub value: Option<f64>,
    /// Upper bound when the operator is `Between`.
    pub secondary_value: Option<f64>,
}

/// Bounds of a date range; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Payload of a date filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateFilter {
    pub value: Option<DateTime<Utc>>,
    pub date_operator: DateOperator,
    pub time_unit: TimeUnit,
    /// Number of `time_unit`s for `Last` and `Next`.
    pub unit_value: Option<u32>,
    /// Bounds for `Range` mode and the `Between` operator.
    pub range: DateRange,
}

/// Payload of a multi-select filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumFilter {
    selected: Vec<Literal>,
}

impl EnumFilter {
    pub fn new(values: impl IntoIterator<Item = Literal>) -> Self {
        let mut filter = Self::default();
        for value in values {
            filter.select(value);
        }
        filter
    }

    /// Adds a value; already selected values are ignored.
    pub fn select(&mut self, value: Literal) {
        if !self.selected.contains(&value) {
            self.selected.push(value);
        }
    }

    pub fn deselect(&mut self, value: &Literal) {
        self.selected.retain(|v| v != value);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Selected values in selection order.
    pub fn selected(&self) -> &[Literal] {
        &self.selected
    }
}

/// Type-specific payload of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterKind {
    String(StringFilter),
    Numeric(NumericFilter),
    Date(DateFilter),
    Enumerated(EnumFilter),
}

impl FilterKind {
    /// Operators this kind accepts.
    pub fn allowed_operators(&self) -> &'static [FilterOperator] {
        match self {
            FilterKind::String(_) => STRING_OPERATORS,
            FilterKind::Numeric(_) | FilterKind::Date(_) => ORDERED_OPERATORS,
            FilterKind::Enumerated(_) => ENUMERATED_OPERATORS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::String(_) => "string",
            FilterKind::Numeric(_) => "numeric",
            FilterKind::Date(_) => "date",
            FilterKind::Enumerated(_) => "enumerated",
        }
    }

    /// Empty payload seeded for a column of `value_type`.
    pub fn for_type(value_type: SemanticType) -> Self {
        match value_type {
            SemanticType::String | SemanticType::Complex => {
                FilterKind::String(StringFilter::default())
            }
            SemanticType::Numeric => FilterKind::Numeric(NumericFilter::default()),
            SemanticType::Date => FilterKind::Date(DateFilter::default()),
            SemanticType::Boolean | SemanticType::Enumeration => {
                FilterKind::Enumerated(EnumFilter::default())
            }
        }
    }

    /// Operator a fresh filter of `value_type` starts with.
    pub fn default_operator(value_type: SemanticType) -> FilterOperator {
        match value_type {
            SemanticType::String | SemanticType::Complex => FilterOperator::Contains,
            _ => FilterOperator::Equal,
        }
    }
}

/// One active filter condition on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterModel {
    /// Stable identity within a collection.
    pub id: Uuid,
    /// Declared field or property path.
    pub field: String,
    /// Concrete property name, preferred over `field` when it is usable.
    pub property: Option<String>,
    /// Bypasses debouncing when edited.
    pub is_immediate: bool,
    pub ui: UiOptions,
    operator: FilterOperator,
    kind: FilterKind,
}

impl FilterModel {
    /// Creates a filter, validating `operator` against `kind`.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        kind: FilterKind,
    ) -> FilterResult<Self> {
        ensure_allowed(&kind, operator)?;
        Ok(Self {
            id: Uuid::new_v4(),
            field: field.into(),
            property: None,
            is_immediate: false,
            ui: UiOptions::default(),
            operator,
            kind,
        })
    }

    /// A string comparison. An empty value leaves the filter inert.
    pub fn string(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> FilterResult<Self> {
        let value = value.into();
        let value = (!value.is_empty()).then_some(value);
        Self::new(field, operator, FilterKind::String(StringFilter { value }))
    }

    /// A numeric comparison.
    pub fn numeric(
        field: impl Into<String>,
        operator: FilterOperator,
        value: f64,
    ) -> FilterResult<Self> {
        Self::new(
            field,
            operator,
            FilterKind::Numeric(NumericFilter {
                value: Some(value),
                secondary_value: None,
            }),
        )
    }

    /// A numeric `Between`, inclusive on both ends.
    pub fn between(field: impl Into<String>, low: f64, high: f64) -> Self {
        Self::from_parts(
            field,
            FilterOperator::Between,
            FilterKind::Numeric(NumericFilter {
                value: Some(low),
                secondary_value: Some(high),
            }),
        )
    }

    /// A date comparison against a fixed instant.
    pub fn date(
        field: impl Into<String>,
        operator: FilterOperator,
        value: DateTime<Utc>,
    ) -> FilterResult<Self> {
        Self::new(
            field,
            operator,
            FilterKind::Date(DateFilter {
                value: Some(value),
                ..DateFilter::default()
            }),
        )
    }

    /// Dates within the last `amount` units up to now.
    pub fn date_last(field: impl Into<String>, amount: u32, unit: TimeUnit) -> Self {
        Self::relative_date(field, DateOperator::Last, amount, unit)
    }

    /// Dates within the next `amount` units from now.
    pub fn date_next(field: impl Into<String>, amount: u32, unit: TimeUnit) -> Self {
        Self::relative_date(field, DateOperator::Next, amount, unit)
    }

    /// Dates between two bounds; an open side is left unconstrained.
    pub fn date_range(
        field: impl Into<String>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Self::from_parts(
            field,
            FilterOperator::Between,
            FilterKind::Date(DateFilter {
                date_operator: DateOperator::Range,
                range: DateRange { start, end },
                ..DateFilter::default()
            }),
        )
    }

    /// A multi-select filter. `Equal` matches any value, `NotEqual` none.
    pub fn enumerated<I, V>(
        field: impl Into<String>,
        operator: FilterOperator,
        values: I,
    ) -> FilterResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Literal>,
    {
        let filter = EnumFilter::new(values.into_iter().map(Into::into));
        Self::new(field, operator, FilterKind::Enumerated(filter))
    }

    /// A boolean equality, modeled as a single-value selection.
    pub fn boolean(field: impl Into<String>, value: bool) -> Self {
        Self::from_parts(
            field,
            FilterOperator::Equal,
            FilterKind::Enumerated(EnumFilter::new([Literal::Boolean(value)])),
        )
    }

    /// An empty filter seeded from a column with the type's default operator.
    pub fn for_column(column: &Column) -> Self {
        let mut model = Self::from_parts(
            column.name.clone(),
            FilterKind::default_operator(column.value_type),
            FilterKind::for_type(column.value_type),
        );
        model.property = Some(column.field.clone());
        model.ui.label = Some(column.label.clone());
        model
    }

    fn relative_date(
        field: impl Into<String>,
        mode: DateOperator,
        amount: u32,
        unit: TimeUnit,
    ) -> Self {
        Self::from_parts(
            field,
            FilterOperator::Between,
            FilterKind::Date(DateFilter {
                date_operator: mode,
                time_unit: unit,
                unit_value: Some(amount),
                ..DateFilter::default()
            }),
        )
    }

    // Callers guarantee `operator` is valid for `kind`.
    fn from_parts(field: impl Into<String>, operator: FilterOperator, kind: FilterKind) -> Self {
        debug_assert!(kind.allowed_operators().contains(&operator));
        Self {
            id: Uuid::new_v4(),
            field: field.into(),
            property: None,
            is_immediate: false,
            ui: UiOptions::default(),
            operator,
            kind,
        }
    }

    /// Sets the concrete property name.
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Marks the filter as applied without debouncing.
    pub fn immediate(mut self) -> Self {
        self.is_immediate = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.ui.label = Some(label.into());
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// Changes the operator, keeping the value.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnsupportedOperator`] when the operator is not
    /// valid for this filter's kind; the filter is left unchanged.
    pub fn set_operator(&mut self, operator: FilterOperator) -> FilterResult<()> {
        ensure_allowed(&self.kind, operator)?;
        self.operator = operator;
        Ok(())
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    pub fn as_string_mut(&mut self) -> Option<&mut StringFilter> {
        match &mut self.kind {
            FilterKind::String(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_numeric_mut(&mut self) -> Option<&mut NumericFilter> {
        match &mut self.kind {
            FilterKind::Numeric(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_date_mut(&mut self) -> Option<&mut DateFilter> {
        match &mut self.kind {
            FilterKind::Date(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_enumerated_mut(&mut self) -> Option<&mut EnumFilter> {
        match &mut self.kind {
            FilterKind::Enumerated(f) => Some(f),
            _ => None,
        }
    }

    /// Returns true when the filter has no usable value and its operator
    /// needs one. Inert filters are skipped by the compiler.
    pub fn is_inert(&self) -> bool {
        if self.operator.is_nullary() {
            return false;
        }
        match &self.kind {
            FilterKind::String(f) => f.value.as_deref().map_or(true, str::is_empty),
            FilterKind::Numeric(f) => {
                let usable = |v: Option<f64>| v.is_some_and(f64::is_finite);
                if self.operator == FilterOperator::Between {
                    !usable(f.value) && !usable(f.secondary_value)
                } else {
                    !usable(f.value)
                }
            }
            FilterKind::Date(f) => match f.date_operator {
                DateOperator::Last | DateOperator::Next => f.unit_value.map_or(true, |n| n == 0),
                DateOperator::Range => f.range.is_open(),
                DateOperator::Exact if self.operator == FilterOperator::Between => {
                    f.range.is_open()
                }
                DateOperator::Exact => f.value.is_none(),
            },
            FilterKind::Enumerated(f) => f.selected.iter().all(Literal::is_blank),
        }
    }
}

fn ensure_allowed(kind: &FilterKind, operator: FilterOperator) -> FilterResult<()> {
    if kind.allowed_operators().contains(&operator) {
        Ok(())
    } else {
        Err(FilterError::unsupported_operator(operator, kind.name()))
    }
}
