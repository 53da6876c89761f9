//! Per-list query state and reload orchestration.
//!
//! A [`ListController`] owns one list's filters, sorts and paging. Edits are
//! coalesced by a [`Debouncer`] before the list reloads; filters marked
//! immediate skip the delay. Every reload takes a new sequence number and
//! cancels the request it supersedes, so only the latest result is applied.
//!
//! # Example
//!
//! ```no_run
//! use odata_client::prelude::*;
//! use odata_filter::controller::ListController;
//! use odata_filter::model::{FilterModel, FilterOperator};
//!
//! # async fn example() -> odata_client::error::Result<()> {
//! let client = ODataClient::new("https://services.example.com/odata")?;
//! let controller = ListController::<serde_json::Value>::builder(client, "People")
//!     .page_size(20)
//!     .with_count(true)
//!     .build();
//!
//! controller.add_filter(FilterModel::string("LastName", FilterOperator::StartsWith, "Sm").unwrap());
//! if let Some(page) = controller.reload().await? {
//!     println!("{} of {:?}", page.len(), page.count);
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use odata_client::client::ODataClient;
use odata_client::envelope::QueryEnvelope;
use odata_client::error::Result;
use odata_client::localizer::{DefaultLocalizer, Localizer};
use odata_client::query::QueryOptions;
use odata_client::settings::{resolve_base_address, SettingsProvider};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::columns::{Column, PathResolver};
use crate::compiler::FilterCompiler;
use crate::debounce::{Debouncer, DEFAULT_DEBOUNCE};
use crate::events::{AppEvent, EventBus};
use crate::model::{Combinator, FilterCollection, FilterModel};
use crate::sort::{SortCompiler, SortDefinition};

/// The latest outcome published by a controller.
#[derive(Debug)]
pub enum ListUpdate<T> {
    /// Nothing has loaded yet.
    Idle,
    /// A reload completed.
    Loaded {
        sequence: u64,
        envelope: Arc<QueryEnvelope<T>>,
    },
    /// A reload failed. Cancellations and hook vetoes are not published.
    Failed {
        sequence: u64,
        /// Localization key of the error.
        key: &'static str,
        /// Localized, user-facing message.
        message: String,
        status: Option<u16>,
    },
}

impl<T> Clone for ListUpdate<T> {
    fn clone(&self) -> Self {
        match self {
            ListUpdate::Idle => ListUpdate::Idle,
            ListUpdate::Loaded { sequence, envelope } => ListUpdate::Loaded {
                sequence: *sequence,
                envelope: Arc::clone(envelope),
            },
            ListUpdate::Failed {
                sequence,
                key,
                message,
                status,
            } => ListUpdate::Failed {
                sequence: *sequence,
                key: *key,
                message: message.clone(),
                status: *status,
            },
        }
    }
}

impl<T> ListUpdate<T> {
    /// The loaded page, if this update carries one.
    pub fn envelope(&self) -> Option<&Arc<QueryEnvelope<T>>> {
        match self {
            ListUpdate::Loaded { envelope, .. } => Some(envelope),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct QueryState {
    filters: FilterCollection,
    sorts: Vec<SortDefinition>,
    page: u32,
    page_size: Option<u32>,
    count: bool,
    expand: Vec<String>,
}

struct Shared<T> {
    client: ODataClient,
    entity_set: String,
    base_url: Option<String>,
    resolver: PathResolver,
    state: Mutex<QueryState>,
    sequence: AtomicU64,
    /// Token of the latest reload, tagged with its sequence number.
    in_flight: Mutex<Option<(u64, CancellationToken)>>,
    updates: watch::Sender<ListUpdate<T>>,
    events: Option<EventBus>,
    localizer: Arc<dyn Localizer>,
    disposed: AtomicBool,
}

impl<T> Shared<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn state(&self) -> MutexGuard<'_, QueryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_flight(&self) -> MutexGuard<'_, Option<(u64, CancellationToken)>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn compiled_options(&self) -> QueryOptions {
        let state = self.state();
        let filter = FilterCompiler::new()
            .with_resolver(&self.resolver)
            .compile(&state.filters);
        let order_by = SortCompiler::new()
            .with_resolver(&self.resolver)
            .compile(&state.sorts);

        let mut options = QueryOptions::new()
            .filter(filter)
            .order_by(order_by)
            .with_count(state.count);
        if let Some(size) = state.page_size {
            options = options.top(size).skip(state.page.saturating_mul(size));
        }
        for property in &state.expand {
            options = options.expand(property.clone());
        }
        options
    }

    async fn reload(&self) -> Result<Option<Arc<QueryEnvelope<T>>>> {
        if self.disposed.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some((_, previous)) = self.in_flight().replace((sequence, token.clone())) {
            previous.cancel();
            debug!(entity_set = %self.entity_set, sequence, "cancelled superseded query");
        }

        let options = self.compiled_options();
        let base_url = self.base_url.as_deref().unwrap_or(self.client.base_url());
        let result = self
            .client
            .execute_at::<T>(base_url, &self.entity_set, &options, &token)
            .await;

        let superseded = self.sequence.load(Ordering::SeqCst) != sequence;
        if superseded || self.disposed.load(Ordering::SeqCst) {
            debug!(entity_set = %self.entity_set, sequence, "discarding stale result");
            return Ok(None);
        }
        {
            let mut in_flight = self.in_flight();
            if in_flight.as_ref().is_some_and(|(s, _)| *s == sequence) {
                in_flight.take();
            }
        }

        match result {
            Ok(envelope) => {
                let envelope = Arc::new(envelope);
                if let Some(events) = &self.events {
                    events.publish(AppEvent::DataBound {
                        entity_set: self.entity_set.clone(),
                        count: envelope.count,
                        rows: envelope.len(),
                    });
                }
                self.updates.send_replace(ListUpdate::Loaded {
                    sequence,
                    envelope: Arc::clone(&envelope),
                });
                Ok(Some(envelope))
            }
            Err(error) => {
                if !error.is_silent() {
                    self.updates.send_replace(ListUpdate::Failed {
                        sequence,
                        key: error.localization_key(),
                        message: error.localized(self.localizer.as_ref()),
                        status: error.status(),
                    });
                }
                Err(error)
            }
        }
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        if let Some((_, token)) = self.in_flight().take() {
            token.cancel();
        }
    }
}

/// Builder for a [`ListController`].
pub struct ListControllerBuilder<T> {
    client: ODataClient,
    entity_set: String,
    base_url: Option<String>,
    resolver: PathResolver,
    state: QueryState,
    delay: Duration,
    events: Option<EventBus>,
    localizer: Arc<dyn Localizer>,
    _rows: std::marker::PhantomData<fn() -> T>,
}

impl<T> ListControllerBuilder<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn new(client: ODataClient, entity_set: impl Into<String>) -> Self {
        Self {
            client,
            entity_set: entity_set.into(),
            base_url: None,
            resolver: PathResolver::new(),
            state: QueryState {
                count: true,
                ..QueryState::default()
            },
            delay: DEFAULT_DEBOUNCE,
            events: None,
            localizer: Arc::new(DefaultLocalizer),
            _rows: std::marker::PhantomData,
        }
    }

    /// Resolves filter and sort fields through the given columns.
    pub fn columns(mut self, columns: &[Column]) -> Self {
        self.resolver = PathResolver::from_columns(columns);
        self
    }

    pub fn resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Queries an explicit service root instead of the client's default.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Takes the service root and page size from settings. `backend` selects
    /// an alternate address when one is registered under that key.
    pub fn settings(mut self, settings: &dyn SettingsProvider, backend: Option<&str>) -> Self {
        self.base_url = Some(resolve_base_address(settings, backend).to_string());
        if let Some(size) = settings.page_size() {
            self.state.page_size = Some(size);
        }
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.state.page_size = Some(size);
        self
    }

    /// Requests the total count with every page. On by default; pages
    /// without a count are rejected by the executor.
    pub fn with_count(mut self, count: bool) -> Self {
        self.state.count = count;
        self
    }

    pub fn expand(mut self, property: impl Into<String>) -> Self {
        self.state.expand.push(property.into());
        self
    }

    pub fn sorts(mut self, sorts: Vec<SortDefinition>) -> Self {
        self.state.sorts = sorts;
        self
    }

    pub fn filters(mut self, filters: FilterCollection) -> Self {
        self.state.filters = filters;
        self
    }

    /// Delay used to coalesce edits.
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn build(self) -> ListController<T> {
        let (updates, _) = watch::channel(ListUpdate::Idle);
        ListController {
            shared: Arc::new(Shared {
                client: self.client,
                entity_set: self.entity_set,
                base_url: self.base_url,
                resolver: self.resolver,
                state: Mutex::new(self.state),
                sequence: AtomicU64::new(0),
                in_flight: Mutex::new(None),
                updates,
                events: self.events,
                localizer: self.localizer,
                disposed: AtomicBool::new(false),
            }),
            debouncer: Debouncer::new(),
            delay: self.delay,
        }
    }
}

/// Query state and reload orchestration for one list.
///
/// Edit methods take `&self`; the controller can be shared behind an `Arc`.
/// Dropping it cancels pending and in-flight work.
pub struct ListController<T> {
    shared: Arc<Shared<T>>,
    debouncer: Debouncer,
    delay: Duration,
}

impl<T> ListController<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    pub fn builder(client: ODataClient, entity_set: impl Into<String>) -> ListControllerBuilder<T> {
        ListControllerBuilder::new(client, entity_set)
    }

    pub fn entity_set(&self) -> &str {
        &self.shared.entity_set
    }

    /// Compiles the current state into query options.
    pub fn compiled_options(&self) -> QueryOptions {
        self.shared.compiled_options()
    }

    /// Reloads now, cancelling any earlier reload.
    ///
    /// Returns `Ok(None)` when a newer reload started before this one
    /// finished, or when the controller is disposed.
    ///
    /// # Errors
    ///
    /// Returns the executor's error; non-silent errors are also published
    /// as [`ListUpdate::Failed`].
    pub async fn reload(&self) -> Result<Option<Arc<QueryEnvelope<T>>>> {
        self.shared.reload().await
    }

    /// Reloads after the debounce delay, superseding earlier scheduled reloads.
    /// Results are published to [`subscribe`](Self::subscribe) receivers.
    pub fn schedule_reload(&self) {
        self.schedule(self.delay);
    }

    fn schedule(&self, delay: Duration) {
        let shared = Arc::clone(&self.shared);
        self.debouncer.debounce(delay, async move {
            if let Err(error) = shared.reload().await {
                debug!(entity_set = %shared.entity_set, error = %error, "scheduled reload failed");
            }
        });
    }

    fn trigger(&self, immediate: bool) {
        if immediate {
            self.schedule(Duration::ZERO);
        } else {
            self.schedule_reload();
        }
    }

    fn filters_changed(&self, immediate: bool) {
        let ids: Vec<Uuid> = {
            let mut state = self.shared.state();
            state.page = 0;
            state.filters.iter().map(|f| f.id).collect()
        };
        if let Some(events) = &self.shared.events {
            events.publish(AppEvent::FiltersChanged {
                entity_set: self.shared.entity_set.clone(),
                filter_ids: ids,
            });
        }
        self.trigger(immediate);
    }

    /// Adds or replaces a filter and schedules a reload.
    pub fn add_filter(&self, filter: FilterModel) {
        let immediate = filter.is_immediate;
        self.shared.state().filters.add(filter);
        self.filters_changed(immediate);
    }

    /// Edits a filter in place. Returns false when no filter has `id`.
    pub fn update_filter(&self, id: Uuid, edit: impl FnOnce(&mut FilterModel)) -> bool {
        let immediate = {
            let mut state = self.shared.state();
            let Some(filter) = state.filters.get_mut(id) else {
                return false;
            };
            edit(filter);
            filter.is_immediate
        };
        self.filters_changed(immediate);
        true
    }

    pub fn remove_filter(&self, id: Uuid) -> Option<FilterModel> {
        let removed = self.shared.state().filters.remove(id)?;
        self.filters_changed(removed.is_immediate);
        Some(removed)
    }

    pub fn clear_filters(&self) {
        self.shared.state().filters.clear();
        self.filters_changed(false);
    }

    pub fn set_combinator(&self, combinator: Combinator) {
        self.shared.state().filters.set_combinator(combinator);
        self.filters_changed(false);
    }

    /// A snapshot of the current filters.
    pub fn filters(&self) -> FilterCollection {
        self.shared.state().filters.clone()
    }

    pub fn set_sorts(&self, sorts: Vec<SortDefinition>) {
        self.shared.state().sorts = sorts;
        self.schedule_reload();
    }

    pub fn sorts(&self) -> Vec<SortDefinition> {
        self.shared.state().sorts.clone()
    }

    /// Moves to a zero-based page and reloads without delay.
    pub fn set_page(&self, page: u32) {
        self.shared.state().page = page;
        self.trigger(true);
    }

    pub fn page(&self) -> u32 {
        self.shared.state().page
    }

    /// Changes the page size, returns to the first page and reloads.
    pub fn set_page_size(&self, size: Option<u32>) {
        {
            let mut state = self.shared.state();
            state.page_size = size;
            state.page = 0;
        }
        self.trigger(true);
    }

    /// Receives every published [`ListUpdate`].
    pub fn subscribe(&self) -> watch::Receiver<ListUpdate<T>> {
        self.shared.updates.subscribe()
    }

    /// The most recently published update.
    pub fn current(&self) -> ListUpdate<T> {
        self.shared.updates.borrow().clone()
    }

    /// Cancels the pending reload and the in-flight request; later edits
    /// no longer reload.
    pub fn dispose(&self) {
        self.debouncer.dispose();
        self.shared.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::SeqCst)
    }
}

impl<T> Drop for ListController<T> {
    fn drop(&mut self) {
        self.debouncer.dispose();
        self.shared.disposed.store(true, Ordering::SeqCst);
        let in_flight = self
            .shared
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((_, token)) = in_flight {
            token.cancel();
        }
    }
}

impl<T> fmt::Debug for ListController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListController")
            .field("entity_set", &self.shared.entity_set)
            .field("base_url", &self.shared.base_url)
            .field("sequence", &self.shared.sequence.load(Ordering::SeqCst))
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilterOperator;

    fn controller() -> ListController<serde_json::Value> {
        let client = ODataClient::new("http://localhost:1/odata").unwrap();
        ListController::builder(client, "People")
            .page_size(10)
            .with_count(true)
            .build()
    }

    #[tokio::test]
    async fn test_compiled_options_reflect_state() {
        let controller = controller();
        controller.add_filter(FilterModel::boolean("IsDeleted", false));
        controller.set_sorts(vec![
            SortDefinition::descending("Name", 1),
            SortDefinition::ascending("Age", 0),
        ]);
        controller.set_page(2);

        let options = controller.compiled_options();
        assert_eq!(options.filter, "IsDeleted eq false");
        assert_eq!(options.order_by, "Age,Name desc");
        assert_eq!(options.top, Some(10));
        assert_eq!(options.skip, Some(20));
        assert!(options.count);
        controller.dispose();
    }

    #[tokio::test]
    async fn test_count_is_requested_by_default() {
        let client = ODataClient::new("http://localhost:1/odata").unwrap();
        let controller = ListController::<serde_json::Value>::builder(client, "People").build();
        assert!(controller.compiled_options().count);
        controller.dispose();
    }

    #[tokio::test]
    async fn test_filter_edits_reset_page() {
        let controller = controller();
        controller.set_page(3);
        controller.add_filter(FilterModel::string("Name", FilterOperator::Contains, "a").unwrap());
        assert_eq!(controller.page(), 0);
        controller.dispose();
    }

    #[tokio::test]
    async fn test_update_unknown_filter_returns_false() {
        let controller = controller();
        assert!(!controller.update_filter(Uuid::new_v4(), |_| {}));
        controller.dispose();
    }

    #[tokio::test]
    async fn test_update_filter_edits_in_place() {
        let controller = controller();
        let filter = FilterModel::string("Name", FilterOperator::Contains, "a").unwrap();
        let id = filter.id;
        controller.add_filter(filter);

        assert!(controller.update_filter(id, |f| {
            f.set_operator(FilterOperator::StartsWith).unwrap();
        }));
        assert_eq!(controller.compiled_options().filter, "startswith(Name,'a')");
        controller.dispose();
    }

    #[tokio::test]
    async fn test_disposed_controller_does_not_reload() {
        let controller = controller();
        controller.dispose();
        assert!(controller.is_disposed());
        assert!(controller.reload().await.unwrap().is_none());
        assert!(matches!(controller.current(), ListUpdate::Idle));
    }

    #[test]
    fn test_list_update_clone_shares_envelope() {
        let update: ListUpdate<u8> = ListUpdate::Loaded {
            sequence: 1,
            envelope: Arc::new(QueryEnvelope::new(Some(1), vec![7])),
        };
        let clone = update.clone();
        assert!(Arc::ptr_eq(update.envelope().unwrap(), clone.envelope().unwrap()));
    }
}
