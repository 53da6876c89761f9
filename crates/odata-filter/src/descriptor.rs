//! Static field tables and the descriptor resolver.
//!
//! Entities declare their fields once in a `static` [`EntityDescriptor`].
//! [`resolve_fields`] turns that table into [`FieldDescriptor`]s: it drops
//! bookkeeping fields, classifies each field's semantic type and resolves a
//! readable child for complex (object-valued) fields.
//!
//! # Example
//!
//! ```
//! use odata_filter::descriptor::*;
//!
//! static COUNTRY: EntityDescriptor = EntityDescriptor::new(
//!     "Country",
//!     &[FieldDef::new("Id", ValueKind::Integer), FieldDef::new("Name", ValueKind::String)],
//! );
//!
//! static CUSTOMER: EntityDescriptor = EntityDescriptor::new(
//!     "Customer",
//!     &[
//!         FieldDef::new("Id", ValueKind::Guid),
//!         FieldDef::new("Email", ValueKind::String),
//!         FieldDef::new("Country", ValueKind::Object(&COUNTRY)),
//!     ],
//! );
//!
//! let fields = resolve_fields(&CUSTOMER, &ResolveOptions::default());
//! assert_eq!(fields.len(), 2);
//! assert_eq!(fields[1].property_path, "Country.Name");
//! assert_eq!(fields[1].semantic_type, SemanticType::Complex);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Bookkeeping fields excluded unless explicitly requested: identifier,
/// soft-delete flag and revision counter.
pub const SYSTEM_FIELDS: &[&str] = &["Id", "IsDeleted", "Version"];

/// Child field names tried, in order, when a complex field has no display hint.
pub const PREFERRED_CHILD_FIELDS: &[&str] =
    &["Name", "Title", "DisplayName", "Description", "Code"];

/// The filter-relevant classification of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    /// Free text (also GUIDs).
    String,
    /// Integers and decimals.
    Numeric,
    /// `true`/`false`.
    Boolean,
    /// Dates and timestamps.
    Date,
    /// One of a fixed set of values.
    Enumeration,
    /// A nested object.
    Complex,
}

/// The declared storage type of a field.
#[derive(Debug, Clone, Copy)]
pub enum ValueKind {
    String,
    Guid,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Date,
    /// An enumeration with its allowed values.
    Enum(&'static [&'static str]),
    /// A nested entity.
    Object(&'static EntityDescriptor),
}

impl ValueKind {
    /// Classifies the kind.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            ValueKind::String | ValueKind::Guid => SemanticType::String,
            ValueKind::Integer | ValueKind::Decimal => SemanticType::Numeric,
            ValueKind::Boolean => SemanticType::Boolean,
            ValueKind::DateTime | ValueKind::Date => SemanticType::Date,
            ValueKind::Enum(_) => SemanticType::Enumeration,
            ValueKind::Object(_) => SemanticType::Complex,
        }
    }

    /// Returns true for everything except nested objects.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, ValueKind::Object(_))
    }
}

/// One declared field of an entity.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: ValueKind,
    pub filterable: bool,
    pub sortable: bool,
    /// Preferred child field for complex fields.
    pub display_field: Option<&'static str>,
}

impl FieldDef {
    /// Declares a filterable, sortable field.
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            filterable: true,
            sortable: true,
            display_field: None,
        }
    }

    /// Marks the field as not filterable.
    pub const fn not_filterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    /// Marks the field as not sortable.
    pub const fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Names the child field shown for a complex field.
    pub const fn display(mut self, child: &'static str) -> Self {
        self.display_field = Some(child);
        self
    }
}

/// The declared field table of an entity type.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub fields: &'static [FieldDef],
}

impl EntityDescriptor {
    pub const fn new(name: &'static str, fields: &'static [FieldDef]) -> Self {
        Self { name, fields }
    }

    /// Finds a field by name, ignoring case.
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// Implemented by row types that carry a static field table.
pub trait Entity {
    fn descriptor() -> &'static EntityDescriptor;
}

/// A resolved field, ready to seed columns and filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Declared field name.
    pub name: String,
    /// Path used in query expressions (`Parent.Child` for resolved complex fields).
    pub property_path: String,
    pub semantic_type: SemanticType,
    /// Type used to filter the property path; differs from `semantic_type`
    /// only for complex fields.
    pub value_type: SemanticType,
    pub filterable: bool,
    pub sortable: bool,
    /// Resolved child of a complex field.
    pub complex_child_field: Option<String>,
    /// Allowed values of enumeration fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl FieldDescriptor {
    /// Returns true for nested object fields.
    pub fn is_complex(&self) -> bool {
        self.semantic_type == SemanticType::Complex
    }
}

/// Controls which fields [`resolve_fields`] returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions<'a> {
    /// Keep identifier, soft-delete and revision fields.
    pub include_system: bool,
    /// Additional field names to drop (case-insensitive).
    pub exclude: &'a [&'a str],
}

impl<'a> ResolveOptions<'a> {
    /// Drops the given names in addition to system fields.
    pub fn excluding(exclude: &'a [&'a str]) -> Self {
        Self {
            include_system: false,
            exclude,
        }
    }

    fn is_excluded(&self, name: &str) -> bool {
        let system = !self.include_system
            && SYSTEM_FIELDS.iter().any(|s| s.eq_ignore_ascii_case(name));
        system || self.exclude.iter().any(|e| e.eq_ignore_ascii_case(name))
    }
}

/// Resolves an entity's declared fields in declaration order.
///
/// Never fails: a complex field whose readable child cannot be found keeps
/// its own name as property path.
pub fn resolve_fields(
    entity: &EntityDescriptor,
    options: &ResolveOptions<'_>,
) -> Vec<FieldDescriptor> {
    entity
        .fields
        .iter()
        .filter(|f| !options.is_excluded(f.name))
        .map(resolve_field)
        .collect()
}

/// Resolves the fields of `E` with default options.
pub fn resolve<E: Entity>() -> Vec<FieldDescriptor> {
    resolve_fields(E::descriptor(), &ResolveOptions::default())
}

fn resolve_field(def: &FieldDef) -> FieldDescriptor {
    let semantic_type = def.kind.semantic_type();

    let (property_path, value_type, child) = match def.kind {
        ValueKind::Object(child_entity) => match complex_child(def, child_entity) {
            Some(child) => (
                format!("{}.{}", def.name, child.name),
                child.kind.semantic_type(),
                Some(child.name.to_string()),
            ),
            None => (def.name.to_string(), SemanticType::String, None),
        },
        _ => (def.name.to_string(), semantic_type, None),
    };

    let choices = match def.kind {
        ValueKind::Enum(values) => values.iter().map(|v| v.to_string()).collect(),
        _ => Vec::new(),
    };

    FieldDescriptor {
        name: def.name.to_string(),
        property_path,
        semantic_type,
        value_type,
        filterable: def.filterable,
        sortable: def.sortable,
        complex_child_field: child,
        choices,
    }
}

/// Picks the readable child of a complex field: the declared hint when it
/// exists and is primitive, else the first preferred name present.
fn complex_child(
    def: &FieldDef,
    child_entity: &'static EntityDescriptor,
) -> Option<&'static FieldDef> {
    let primitive = |name: &str| child_entity.field(name).filter(|f| f.kind.is_primitive());

    def.display_field
        .and_then(primitive)
        .or_else(|| PREFERRED_CHILD_FIELDS.iter().find_map(|name| primitive(*name)))
}

/// Per-type cache of resolved descriptors.
///
/// Resolution is deterministic, so results can be shared between every list
/// showing the same entity type. Entries are keyed by the descriptor's
/// address; two statics with the same name stay separate.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: Mutex<HashMap<usize, Arc<[FieldDescriptor]>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the default-option descriptors for `entity`, resolving once.
    pub fn get(&self, entity: &'static EntityDescriptor) -> Arc<[FieldDescriptor]> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(std::ptr::from_ref(entity) as usize)
            .or_insert_with(|| resolve_fields(entity, &ResolveOptions::default()).into())
            .clone()
    }

    /// Number of cached entity types.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
