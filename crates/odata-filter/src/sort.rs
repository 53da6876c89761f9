//! Sort definitions and `$orderby` compilation.

use serde::{Deserialize, Serialize};

use crate::columns::PathResolver;
use crate::compiler::effective_path;

/// One sort key. Lower `index` sorts first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDefinition {
    pub field: String,
    pub index: u32,
    pub descending: bool,
}

impl SortDefinition {
    pub fn ascending(field: impl Into<String>, index: u32) -> Self {
        Self {
            field: field.into(),
            index,
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>, index: u32) -> Self {
        Self {
            field: field.into(),
            index,
            descending: true,
        }
    }
}

/// Turns sort definitions into an `$orderby` clause.
///
/// ```
/// use odata_filter::sort::{SortCompiler, SortDefinition};
///
/// let sorts = [SortDefinition::descending("Name", 1), SortDefinition::ascending("Age", 0)];
/// assert_eq!(SortCompiler::new().compile(&sorts), "Age,Name desc");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SortCompiler<'a> {
    resolver: Option<&'a PathResolver>,
}

impl<'a> SortCompiler<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the same field-to-path mapping as filter compilation.
    pub fn with_resolver(mut self, resolver: &'a PathResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Compiles in ascending `index` order; equal indexes keep input order.
    pub fn compile(&self, sorts: &[SortDefinition]) -> String {
        let mut ordered: Vec<&SortDefinition> = sorts
            .iter()
            .filter(|s| !s.field.trim().is_empty())
            .collect();
        ordered.sort_by_key(|s| s.index);

        ordered
            .into_iter()
            .map(|s| {
                let path = effective_path(s.field.trim(), None, self.resolver);
                if s.descending {
                    format!("{path} desc")
                } else {
                    path
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_by_index() {
        let sorts = vec![
            SortDefinition::descending("Name", 1),
            SortDefinition::ascending("Age", 0),
        ];
        assert_eq!(SortCompiler::new().compile(&sorts), "Age,Name desc");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let sorts = vec![
            SortDefinition::ascending("B", 1),
            SortDefinition::ascending("A", 1),
            SortDefinition::ascending("C", 0),
        ];
        assert_eq!(SortCompiler::new().compile(&sorts), "C,B,A");
    }

    #[test]
    fn test_order_is_independent_of_insertion() {
        let forward = vec![
            SortDefinition::ascending("A", 0),
            SortDefinition::ascending("B", 1),
            SortDefinition::descending("C", 2),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        let compiler = SortCompiler::new();
        assert_eq!(compiler.compile(&forward), compiler.compile(&reversed));
    }

    #[test]
    fn test_empty_sorts() {
        assert_eq!(SortCompiler::new().compile(&[]), "");
        assert_eq!(SortCompiler::new().compile(&[SortDefinition::ascending(" ", 0)]), "");
    }

    #[test]
    fn test_resolver_maps_complex_fields() {
        let mut resolver = PathResolver::new();
        resolver.insert("Department", "Department.Title");
        let sorts = vec![SortDefinition::descending("Department", 0)];
        assert_eq!(
            SortCompiler::new().with_resolver(&resolver).compile(&sorts),
            "Department.Title desc"
        );
    }
}
