//! List columns derived from field descriptors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::{FieldDescriptor, SemanticType};

/// One list/grid column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Declared field name.
    pub name: String,
    /// Human-readable header.
    pub label: String,
    /// Property path used in query expressions.
    pub field: String,
    pub is_complex: bool,
    /// Type of the value behind `field`.
    pub value_type: SemanticType,
    pub filterable: bool,
    pub sortable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

/// Builds columns in field declaration order.
///
/// ```
/// use odata_filter::columns::generate_columns;
/// use odata_filter::descriptor::{FieldDescriptor, SemanticType};
///
/// let fields = vec![FieldDescriptor {
///     name: "HiredOn".into(),
///     property_path: "HiredOn".into(),
///     semantic_type: SemanticType::Date,
///     value_type: SemanticType::Date,
///     filterable: true,
///     sortable: true,
///     complex_child_field: None,
///     choices: vec![],
/// }];
/// let columns = generate_columns(&fields);
/// assert_eq!(columns[0].label, "Hired On");
/// ```
pub fn generate_columns(fields: &[FieldDescriptor]) -> Vec<Column> {
    fields
        .iter()
        .map(|f| Column {
            name: f.name.clone(),
            label: humanize(&f.name),
            field: f.property_path.clone(),
            is_complex: f.is_complex(),
            value_type: f.value_type,
            filterable: f.filterable,
            sortable: f.sortable,
            choices: f.choices.clone(),
        })
        .collect()
}

/// Splits a PascalCase or camelCase name into words.
pub fn humanize(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c == '_' {
            label.push(' ');
            prev = Some(' ');
            continue;
        }
        if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            label.push(' ');
        }
        label.push(c);
        prev = Some(c);
    }
    label
}

/// Maps declared field names to the paths their columns resolved to.
///
/// Filters and sorts name fields the way users see them; this keeps both
/// compilers on the same `Parent.Child` path for complex fields.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    paths: HashMap<String, String>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a resolver from generated columns.
    pub fn from_columns(columns: &[Column]) -> Self {
        let mut resolver = Self::new();
        for column in columns {
            resolver.insert(&column.name, &column.field);
        }
        resolver
    }

    /// Adds or replaces one mapping. Names match case-insensitively.
    pub fn insert(&mut self, name: &str, path: &str) {
        self.paths.insert(name.to_lowercase(), path.to_string());
    }

    /// Returns the resolved path for `name`, if known.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.paths.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{resolve_fields, EntityDescriptor, FieldDef, ResolveOptions, ValueKind};

    static TEAM: EntityDescriptor = EntityDescriptor::new(
        "Team",
        &[
            FieldDef::new("Id", ValueKind::Integer),
            FieldDef::new("Name", ValueKind::String),
        ],
    );

    static PLAYER: EntityDescriptor = EntityDescriptor::new(
        "Player",
        &[
            FieldDef::new("Id", ValueKind::Guid),
            FieldDef::new("FullName", ValueKind::String),
            FieldDef::new("Team", ValueKind::Object(&TEAM)),
            FieldDef::new("JerseyNo", ValueKind::Integer).not_sortable(),
        ],
    );

    #[test]
    fn test_columns_follow_declaration_order() {
        let columns = generate_columns(&resolve_fields(&PLAYER, &ResolveOptions::default()));
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["FullName", "Team", "JerseyNo"]);
    }

    #[test]
    fn test_complex_column_uses_joined_path() {
        let columns = generate_columns(&resolve_fields(&PLAYER, &ResolveOptions::default()));
        let team = &columns[1];
        assert!(team.is_complex);
        assert_eq!(team.field, "Team.Name");
        assert_eq!(team.label, "Team");
        assert_eq!(team.value_type, SemanticType::String);
        assert!(!columns[2].sortable);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let fields = resolve_fields(&PLAYER, &ResolveOptions::default());
        assert_eq!(generate_columns(&fields), generate_columns(&fields));
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("FullName"), "Full Name");
        assert_eq!(humanize("isDeleted"), "is Deleted");
        assert_eq!(humanize("URL"), "URL");
        assert_eq!(humanize("Line2Total"), "Line2 Total");
        assert_eq!(humanize("created_at"), "created at");
    }

    #[test]
    fn test_path_resolver() {
        let columns = generate_columns(&resolve_fields(&PLAYER, &ResolveOptions::default()));
        let resolver = PathResolver::from_columns(&columns);
        assert_eq!(resolver.resolve("team"), Some("Team.Name"));
        assert_eq!(resolver.resolve("FullName"), Some("FullName"));
        assert_eq!(resolver.resolve("Unknown"), None);
        assert_eq!(resolver.len(), 3);
    }
}
