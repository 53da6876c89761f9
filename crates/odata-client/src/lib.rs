//! Typed OData v4 query executor.
//!
//! Builds collection URLs from system query options, performs the GET and
//! decodes the `{count, value}` envelope into typed rows.
//!
//! # Quick Start
//!
//! For convenient imports, use the prelude:
//!
//! ```
//! use odata_client::prelude::*;
//! ```
//!
//! This re-exports [`ODataClient`](client::ODataClient), the error types,
//! [`QueryOptions`](query::QueryOptions) and
//! [`QueryEnvelope`](envelope::QueryEnvelope).

pub mod client;
pub mod datetime;
pub mod envelope;
pub mod error;
pub mod hooks;
pub mod localizer;
pub mod prelude;
pub mod query;
pub mod settings;

pub use tokio_util::sync::CancellationToken;
