//! HTTP executor for OData collection queries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Request, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::envelope::{decode_envelope, QueryEnvelope};
use crate::error::{Error, HookStage, Result};
use crate::hooks::{NoHooks, QueryHooks};
use crate::query::{build_url, QueryOptions};
use crate::settings::{resolve_base_address, SettingsProvider};

/// Default request timeout in seconds.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds.
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Builder for configuring an [`ODataClient`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use odata_client::client::ODataClientBuilder;
///
/// let client = ODataClientBuilder::new("https://services.example.com/odata")
///     .request_timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// assert_eq!(client.base_url(), "https://services.example.com/odata");
/// ```
pub struct ODataClientBuilder {
    base_url: String,
    request_timeout: Duration,
    connect_timeout: Duration,
    hooks: Arc<dyn QueryHooks>,
    http_client: Option<reqwest::Client>,
}

impl ODataClientBuilder {
    /// Creates a builder for the given service root.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            hooks: Arc::new(NoHooks),
            http_client: None,
        }
    }

    /// Creates a builder whose service root comes from settings.
    ///
    /// `backend` selects an alternate address; unknown keys use the default.
    pub fn from_settings(settings: &dyn SettingsProvider, backend: Option<&str>) -> Self {
        Self::new(resolve_base_address(settings, backend))
    }

    /// Overrides the service root.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the total request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Installs request/response/result hooks.
    pub fn hooks(mut self, hooks: Arc<dyn QueryHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Reuses an existing HTTP client; timeouts on this builder are then ignored.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn build(self) -> Result<ODataClient> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(self.request_timeout)
                .connect_timeout(self.connect_timeout)
                .build()?,
        };

        Ok(ODataClient {
            http_client,
            base_url: self.base_url,
            hooks: self.hooks,
        })
    }
}

/// Stateless executor for typed OData collection queries.
///
/// Cloning is cheap and clones share the connection pool, so one client can
/// serve any number of concurrent lists; each call carries its own
/// [`CancellationToken`].
#[derive(Clone)]
pub struct ODataClient {
    http_client: reqwest::Client,
    base_url: String,
    hooks: Arc<dyn QueryHooks>,
}

impl ODataClient {
    /// Creates a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        ODataClientBuilder::new(base_url).build()
    }

    /// Returns a builder for custom configuration.
    pub fn builder(base_url: impl Into<String>) -> ODataClientBuilder {
        ODataClientBuilder::new(base_url)
    }

    /// Returns the default service root.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a reference to the underlying HTTP client.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Queries `entity_set` on the default service root.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        entity_set: &str,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<QueryEnvelope<T>> {
        self.execute_at(&self.base_url, entity_set, options, cancel)
            .await
    }

    /// Queries `entity_set` on an explicit service root.
    ///
    /// The pipeline is: build URL, `before_request` hook, GET, read body,
    /// `after_response` hook, status check, decode, `on_result` hook. A hook
    /// returning [`HookOutcome::Handled`](crate::hooks::HookOutcome::Handled)
    /// ends the call with [`Error::Handled`].
    ///
    /// # Errors
    ///
    /// - [`Error::DataReadStatus`] for non-success responses
    /// - [`Error::DataParse`] when the body is not a valid envelope
    /// - [`Error::DataReadEmpty`] when the response carries no count
    /// - [`Error::Cancelled`] when `cancel` fires before the response is read
    pub async fn execute_at<T: DeserializeOwned>(
        &self,
        base_url: &str,
        entity_set: &str,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<QueryEnvelope<T>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let url = build_url(base_url, entity_set, options)?;
        debug!(%url, "executing OData query");

        let mut request = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json")
            .build()?;

        if self.hooks.before_request(&mut request).is_handled() {
            debug!("query handled by request hook");
            return Err(Error::Handled {
                stage: HookStage::Request,
            });
        }

        let (status, body) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("query cancelled while in flight");
                return Err(Error::Cancelled);
            }
            response = self.send(request) => response?,
        };
        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        if self.hooks.after_response(status, &body).is_handled() {
            debug!("query handled by response hook");
            return Err(Error::Handled {
                stage: HookStage::Response,
            });
        }

        if !status.is_success() {
            return Err(Error::DataReadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let envelope = decode_envelope::<T>(&body).inspect_err(|e| {
            warn!(error = %e, "could not decode query envelope");
        })?;

        if self
            .hooks
            .on_result(envelope.count, envelope.len())
            .is_handled()
        {
            debug!("query handled by result hook");
            return Err(Error::Handled {
                stage: HookStage::Result,
            });
        }

        Ok(envelope)
    }

    /// Sends the request and reads the whole body as text.
    async fn send(&self, request: Request) -> Result<(StatusCode, String)> {
        let response = self.http_client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

impl fmt::Debug for ODataClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ODataClient")
            .field("base_url", &self.base_url)
            .field("http_client", &self.http_client)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
