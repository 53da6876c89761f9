//! Compiles filter collections into OData `$filter` expressions.
//!
//! Compilation never fails. Inert filters are skipped, filters sharing a
//! property path and operator are OR-ed into one group (duplicate fragments
//! collapse), and groups are joined with the collection's combinator.
//!
//! # Example
//!
//! ```
//! use odata_filter::compiler::FilterCompiler;
//! use odata_filter::model::{FilterCollection, FilterModel, FilterOperator};
//!
//! let mut filters = FilterCollection::new();
//! filters.add(FilterModel::string("Email", FilterOperator::EndsWith, "yahoo.com").unwrap());
//! filters.add(FilterModel::boolean("IsDeleted", false));
//!
//! let clause = FilterCompiler::new().compile(&filters);
//! assert_eq!(clause, "endswith(Email,'yahoo.com') and IsDeleted eq false");
//! ```

use chrono::{DateTime, Months, TimeDelta, Utc};
use odata_client::localizer::format_template;
use uuid::Uuid;

use crate::columns::PathResolver;
use crate::model::{
    format_datetime, format_number, quote, Combinator, DateOperator, FilterCollection, FilterKind,
    FilterModel, FilterOperator, TimeUnit,
};

/// Turns filter models into a `$filter` clause.
///
/// The compiler captures "now" when it is created, so relative date filters
/// compile to the same clause every time the same compiler is used.
#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler<'a> {
    now: DateTime<Utc>,
    resolver: Option<&'a PathResolver>,
}

impl Default for FilterCompiler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> FilterCompiler<'a> {
    /// Creates a compiler anchored at the current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Creates a compiler anchored at `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now, resolver: None }
    }

    /// Maps declared field names through `resolver` when a filter carries
    /// no usable property name.
    pub fn with_resolver(mut self, resolver: &'a PathResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Compiles a collection. An empty result means no `$filter`.
    pub fn compile(&self, filters: &FilterCollection) -> String {
        self.compile_filters(filters.iter(), filters.combinator())
    }

    /// Compiles filters in order, joining groups with `combinator`.
    pub fn compile_filters<'f, I>(&self, filters: I, combinator: Combinator) -> String
    where
        I: IntoIterator<Item = &'f FilterModel>,
    {
        let mut groups: Vec<Group> = Vec::new();

        for filter in filters {
            let Some(fragment) = self.render(filter) else {
                tracing::trace!(
                    field = %filter.field,
                    operator = %filter.operator(),
                    "skipping inert filter"
                );
                continue;
            };
            let path = self.effective_path(filter);
            let operator = filter.operator();

            match groups.iter_mut().find(|g| g.path == path && g.operator == operator) {
                Some(group) => {
                    if !group.fragments.contains(&fragment) {
                        group.fragments.push(fragment);
                    }
                }
                None => groups.push(Group {
                    path,
                    operator,
                    fragments: vec![fragment],
                }),
            }
        }

        groups
            .into_iter()
            .map(Group::into_clause)
            .collect::<Vec<_>>()
            .join(combinator.separator())
    }

    /// Renders one filter, or `None` when it contributes nothing.
    pub fn render(&self, filter: &FilterModel) -> Option<String> {
        if filter.is_inert() {
            return None;
        }

        let path = self.effective_path(filter);
        let operator = filter.operator();
        if operator.is_nullary() {
            return Some(format_template(operator.template(), &[path.as_str()]));
        }

        match filter.kind() {
            FilterKind::String(f) => {
                let value = f.value.as_deref()?;
                Some(apply(operator, &path, &quote(value)))
            }
            FilterKind::Numeric(f) => {
                let finite = |v: Option<f64>| v.filter(|n| n.is_finite()).map(format_number);
                if operator == FilterOperator::Between {
                    bounds(&path, finite(f.value), finite(f.secondary_value))
                } else {
                    finite(f.value).map(|v| apply(operator, &path, &v))
                }
            }
            FilterKind::Date(f) => {
                let format = |v: Option<DateTime<Utc>>| v.as_ref().map(format_datetime);
                match f.date_operator {
                    DateOperator::Last => {
                        let start = offset(self.now, f.time_unit, f.unit_value?, false)?;
                        bounds(&path, format(Some(start)), format(Some(self.now)))
                    }
                    DateOperator::Next => {
                        let end = offset(self.now, f.time_unit, f.unit_value?, true)?;
                        bounds(&path, format(Some(self.now)), format(Some(end)))
                    }
                    DateOperator::Range => {
                        bounds(&path, format(f.range.start), format(f.range.end))
                    }
                    DateOperator::Exact if operator == FilterOperator::Between => {
                        bounds(&path, format(f.range.start), format(f.range.end))
                    }
                    DateOperator::Exact => format(f.value).map(|v| apply(operator, &path, &v)),
                }
            }
            FilterKind::Enumerated(f) => {
                // Equal matches any selected value, NotEqual none of them
                let (comparison, joiner) = match operator {
                    FilterOperator::NotEqual => (FilterOperator::NotEqual, " and "),
                    _ => (FilterOperator::Equal, " or "),
                };
                let mut parts: Vec<String> = f
                    .selected()
                    .iter()
                    .filter(|v| !v.is_blank())
                    .map(|v| apply(comparison, &path, &v.render()))
                    .collect();
                match parts.len() {
                    0 => None,
                    1 => parts.pop(),
                    _ => Some(format!("({})", parts.join(joiner))),
                }
            }
        }
    }

    /// The property path a filter compiles against.
    pub fn effective_path(&self, filter: &FilterModel) -> String {
        effective_path(&filter.field, filter.property.as_deref(), self.resolver)
    }
}

/// Resolves the path used in expressions for a declared field.
///
/// A field containing a GUID segment is used as is. Otherwise a concrete
/// `property` (not an identifier and not a GUID) wins, then the resolver's
/// mapping, then the field itself.
pub fn effective_path(
    field: &str,
    property: Option<&str>,
    resolver: Option<&PathResolver>,
) -> String {
    if has_guid_segment(field) {
        return field.to_string();
    }
    if let Some(property) = property.filter(|p| is_concrete_property(p)) {
        return property.to_string();
    }
    if let Some(path) = resolver.and_then(|r| r.resolve(field)) {
        return path.to_string();
    }
    field.to_string()
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['.', '/'])
}

fn has_guid_segment(path: &str) -> bool {
    segments(path).any(|s| Uuid::try_parse(s).is_ok())
}

fn is_concrete_property(property: &str) -> bool {
    !property.trim().is_empty()
        && !has_guid_segment(property)
        && !segments(property).last().is_some_and(|s| s.eq_ignore_ascii_case("id"))
}

struct Group {
    path: String,
    operator: FilterOperator,
    fragments: Vec<String>,
}

impl Group {
    fn into_clause(mut self) -> String {
        if self.fragments.len() == 1 {
            return self.fragments.remove(0);
        }
        format!("({})", self.fragments.join(" or "))
    }
}

fn apply(operator: FilterOperator, path: &str, value: &str) -> String {
    format_template(operator.template(), &[path, value])
}

/// Renders an inclusive range; a missing bound leaves that side open.
fn bounds(path: &str, low: Option<String>, high: Option<String>) -> Option<String> {
    match (low, high) {
        (Some(low), Some(high)) => Some(format_template(
            FilterOperator::Between.template(),
            &[path, low.as_str(), high.as_str()],
        )),
        (Some(low), None) => Some(apply(FilterOperator::GreaterThanOrEqual, path, &low)),
        (None, Some(high)) => Some(apply(FilterOperator::LessThanOrEqual, path, &high)),
        (None, None) => None,
    }
}

/// Moves `now` by `amount` units; `None` on overflow.
fn offset(now: DateTime<Utc>, unit: TimeUnit, amount: u32, forward: bool) -> Option<DateTime<Utc>> {
    let delta = match unit {
        TimeUnit::Month => return shift_months(now, amount, forward),
        TimeUnit::Year => return shift_months(now, amount.checked_mul(12)?, forward),
        TimeUnit::Minute => TimeDelta::try_minutes(amount.into())?,
        TimeUnit::Hour => TimeDelta::try_hours(amount.into())?,
        TimeUnit::Day => TimeDelta::try_days(amount.into())?,
        TimeUnit::Week => TimeDelta::try_weeks(amount.into())?,
    };
    if forward {
        now.checked_add_signed(delta)
    } else {
        now.checked_sub_signed(delta)
    }
}

fn shift_months(now: DateTime<Utc>, months: u32, forward: bool) -> Option<DateTime<Utc>> {
    if forward {
        now.checked_add_months(Months::new(months))
    } else {
        now.checked_sub_months(Months::new(months))
    }
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
