//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```
//! use odata_client::prelude::*;
//!
//! // Now you have access to:
//! // - ODataClient, ODataClientBuilder (executor)
//! // - Error, HookStage, Result (error handling)
//! // - QueryOptions, QueryEnvelope (request and response)
//! // - QueryHooks, HookOutcome (interception)
//! // - Localizer, SettingsProvider (collaborators)
//! ```

// Executor
pub use crate::client::{ODataClient, ODataClientBuilder};

// Error types
pub use crate::error::{Error, HookStage, Result};

// Request and response
pub use crate::envelope::{decode_envelope, QueryEnvelope};
pub use crate::query::{build_url, QueryOptions};

// Hooks
pub use crate::hooks::{HookOutcome, NoHooks, QueryHooks};

// Collaborators
pub use crate::localizer::{DefaultLocalizer, Localizer};
pub use crate::settings::{resolve_base_address, SettingsProvider, StaticSettings};

pub use tokio_util::sync::CancellationToken;
