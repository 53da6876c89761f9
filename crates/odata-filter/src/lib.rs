//! Filter, sort and column model for OData list surfaces.
//!
//! Typed filter models compile to a `$filter` clause, sort definitions to an
//! `$orderby` clause, and a [`ListController`](controller::ListController)
//! ties both to an [`odata_client::client::ODataClient`] with debounced,
//! cancellable reloads.
//!
//! # Example
//!
//! ```
//! use odata_filter::compiler::FilterCompiler;
//! use odata_filter::model::{FilterCollection, FilterModel, FilterOperator};
//!
//! let mut filters = FilterCollection::new();
//! filters.add(FilterModel::boolean("IsDeleted", false));
//! filters.add(FilterModel::string("Email", FilterOperator::EndsWith, "yahoo.com").unwrap());
//!
//! assert_eq!(
//!     FilterCompiler::new().compile(&filters),
//!     "IsDeleted eq false and endswith(Email,'yahoo.com')"
//! );
//! ```

pub mod columns;
pub mod compiler;
pub mod controller;
pub mod debounce;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod expr;
pub mod model;
pub mod sort;

pub use columns::{generate_columns, Column, PathResolver};
pub use compiler::FilterCompiler;
pub use controller::{ListController, ListControllerBuilder, ListUpdate};
pub use error::{FilterError, FilterResult};
pub use events::{AppEvent, EventBus};
pub use model::{Combinator, FilterCollection, FilterModel, FilterOperator, Literal};
pub use sort::{SortCompiler, SortDefinition};
