//! The single entry point the transport calls.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as Json;
use tracing::{debug, info_span, warn};

use crate::config::EmulatorConfig;
use crate::error::{ApiError, ApiResult};
use crate::id::{IdAllocator, RequestId};
use crate::params::RequestParams;
use crate::query::UnknownFilterPolicy;
use crate::storage::SharedStore;

use super::handler::{ActionContext, ActionHandler};
use super::policy::{AccessPolicy, AllowAll, DenyList};
use super::registry::{ActionRegistry, ActionState};
use super::response::{ActionResponse, ErrorResponse};

/// Routes action names to handlers over one shared store.
///
/// The store lock is held for the whole handler invocation. Dispatch of an
/// unregistered name fails before the lock is taken.
///
/// # Examples
///
/// ```
/// use computesim::{ActionContext, ApiResult, Dispatcher, RequestParams, ResponseBody, SharedStore};
///
/// fn ping(_ctx: &mut ActionContext<'_>, _params: &RequestParams) -> ApiResult<ResponseBody> {
///     Ok(ResponseBody::new().with("return", true))
/// }
///
/// let mut dispatcher = Dispatcher::new(SharedStore::default());
/// dispatcher.register("Ping", ping);
///
/// let response = dispatcher.dispatch("Ping", &RequestParams::new()).unwrap();
/// assert_eq!(response.to_json()["return"], true);
/// assert!(dispatcher.dispatch("Pong", &RequestParams::new()).is_err());
/// ```
pub struct Dispatcher {
    registry: ActionRegistry,
    store: SharedStore,
    policy: Arc<dyn AccessPolicy>,
    ids: IdAllocator,
    region: String,
    unknown_filters: UnknownFilterPolicy,
}

impl Dispatcher {
    /// Dispatcher over `store` with default settings and every action permitted.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        let defaults = EmulatorConfig::default();
        Self {
            registry: ActionRegistry::new(),
            store,
            policy: Arc::new(AllowAll),
            ids: IdAllocator::new(),
            region: defaults.region,
            unknown_filters: defaults.unknown_filters,
        }
    }

    /// Dispatcher over a fresh store built from `config`.
    #[must_use]
    pub fn from_config(config: &EmulatorConfig) -> Self {
        let mut dispatcher = Self::new(SharedStore::new(config.build_store()));
        dispatcher.ids = config.id_allocator();
        dispatcher.region.clone_from(&config.region);
        dispatcher.unknown_filters = config.unknown_filters;
        if !config.denied_actions.is_empty() {
            dispatcher.policy = Arc::new(config.denied_actions.iter().cloned().collect::<DenyList>());
        }
        dispatcher
    }

    /// Replaces the access policy consulted for dry runs.
    #[must_use]
    pub fn with_policy(mut self, policy: impl AccessPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Sets the region reported to handlers.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets how queries treat unsupported filter names.
    #[must_use]
    pub fn with_unknown_filters(mut self, policy: UnknownFilterPolicy) -> Self {
        self.unknown_filters = policy;
        self
    }

    /// Registers a handler, returning the one it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl ActionHandler + 'static,
    ) -> Option<Arc<dyn ActionHandler>> {
        self.registry.register(name, handler)
    }

    /// Registered action names, sorted.
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Returns true if a handler is registered under `name`.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Lifecycle state of the action registered under `name`.
    #[must_use]
    pub fn action_state(&self, name: &str) -> ActionState {
        self.registry.state(name)
    }

    /// Handle to the store this dispatcher serves.
    #[must_use]
    pub const fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Region this dispatcher simulates.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Invokes the handler registered for `action`.
    ///
    /// # Errors
    /// - `UnsupportedAction`: nothing is registered under `action`
    /// - anything the handler reports, unchanged
    pub fn dispatch(&self, action: &str, params: &RequestParams) -> ApiResult<ActionResponse> {
        let request_id = self.ids.allocate_request_id();
        self.dispatch_as(action, params, request_id)
    }

    /// Like [`Dispatcher::dispatch`], rendering either outcome for the wire:
    /// `(http status, JSON body)`.
    pub fn dispatch_envelope(&self, action: &str, params: &RequestParams) -> (u16, Json) {
        let request_id = self.ids.allocate_request_id();
        match self.dispatch_as(action, params, request_id) {
            Ok(response) => (200, response.to_json()),
            Err(err) => {
                let envelope = ErrorResponse::new(&err, request_id);
                (envelope.status, envelope.to_json())
            }
        }
    }

    fn dispatch_as(&self, action: &str, params: &RequestParams, request_id: RequestId) -> ApiResult<ActionResponse> {
        let span = info_span!("dispatch", action, request_id = %request_id);
        let _entered = span.enter();

        let Some(handler) = self.registry.checkout(action) else {
            warn!("unsupported action");
            return Err(ApiError::UnsupportedAction {
                action: action.to_string(),
            });
        };
        let permitted = self.policy.is_permitted(action);

        let mut guard = self.store.lock();
        let mut ctx = ActionContext::new(action, request_id, &mut **guard)
            .with_region(&self.region)
            .with_permission(permitted)
            .with_unknown_filters(self.unknown_filters);

        match handler.handle(&mut ctx, params) {
            Ok(body) => {
                debug!("handled");
                Ok(ActionResponse { request_id, body })
            }
            Err(err) if err.is_dry_run_outcome() => {
                debug!(code = %err.code(), "dry run");
                Err(err)
            }
            Err(err) => {
                if err.is_retryable() || err.http_status() >= 500 {
                    warn!(code = %err.code(), error = %err, "handler failed");
                } else {
                    debug!(code = %err.code(), error = %err, "request rejected");
                }
                Err(err)
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(SharedStore::default())
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("store", &self.store)
            .field("policy", &self.policy)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
