//! Interception points around a query round trip.

use reqwest::{Request, StatusCode};

/// What a hook wants the executor to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookOutcome {
    /// Proceed normally.
    #[default]
    Continue,
    /// The hook took care of the call; stop and report it as handled.
    Handled,
}

impl HookOutcome {
    /// Returns true for [`HookOutcome::Handled`].
    pub fn is_handled(self) -> bool {
        self == HookOutcome::Handled
    }
}

/// Callbacks invoked by the executor at each stage of a query.
///
/// Every method defaults to [`HookOutcome::Continue`], so implementors only
/// override the stages they care about. `before_request` receives the request
/// mutably and may attach headers such as credentials.
pub trait QueryHooks: Send + Sync {
    /// Runs before the request is sent.
    fn before_request(&self, _request: &mut Request) -> HookOutcome {
        HookOutcome::Continue
    }

    /// Runs after a response arrived and its body was read.
    fn after_response(&self, _status: StatusCode, _body: &str) -> HookOutcome {
        HookOutcome::Continue
    }

    /// Runs after a successful decode, before the caller sees the envelope.
    fn on_result(&self, _count: Option<i64>, _rows: usize) -> HookOutcome {
        HookOutcome::Continue
    }
}

/// Hooks that never intervene.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl QueryHooks for NoHooks {}

/// Attaches a fixed header to every outgoing request.
#[derive(Debug, Clone)]
pub struct HeaderHook {
    name: reqwest::header::HeaderName,
    value: reqwest::header::HeaderValue,
}

impl HeaderHook {
    /// Creates a hook inserting `name: value`.
    pub fn new(name: reqwest::header::HeaderName, value: reqwest::header::HeaderValue) -> Self {
        Self { name, value }
    }
}

impl QueryHooks for HeaderHook {
    fn before_request(&self, request: &mut Request) -> HookOutcome {
        request
            .headers_mut()
            .insert(self.name.clone(), self.value.clone());
        HookOutcome::Continue
    }
}
