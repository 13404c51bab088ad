//! Action handlers and the context they run in.

use crate::dryrun::dry_run_guard;
use crate::error::{ApiError, ApiResult};
use crate::id::{AccountId, RequestId};
use crate::params::RequestParams;
use crate::query::{FilterRegistry, Page, PageBounds, Query, UnknownFilterPolicy};
use crate::resource::{Resource, ResourceBuilder, ResourceKind};
use crate::storage::{ResourceMut, ResourceStore};

use super::response::ResponseBody;

/// A domain handler for one action.
///
/// Handlers validate their own parameters, call
/// [`ActionContext::dry_run_guard`] before their first mutation, and order
/// multi-resource writes so the most consequential one happens last.
///
/// Any `Fn(&mut ActionContext<'_>, &RequestParams) -> ApiResult<ResponseBody>`
/// is a handler.
pub trait ActionHandler: Send + Sync {
    fn handle(&self, ctx: &mut ActionContext<'_>, params: &RequestParams) -> ApiResult<ResponseBody>;
}

impl<F> ActionHandler for F
where
    F: Fn(&mut ActionContext<'_>, &RequestParams) -> ApiResult<ResponseBody> + Send + Sync,
{
    fn handle(&self, ctx: &mut ActionContext<'_>, params: &RequestParams) -> ApiResult<ResponseBody> {
        self(ctx, params)
    }
}

/// Everything a handler may touch during one invocation.
///
/// The store reference is only valid while the dispatcher holds the store
/// lock, so a handler's reads and writes never interleave with another
/// request.
pub struct ActionContext<'a> {
    action: &'a str,
    request_id: RequestId,
    region: &'a str,
    permitted: bool,
    unknown_filters: UnknownFilterPolicy,
    store: &'a mut dyn ResourceStore,
}

impl<'a> ActionContext<'a> {
    /// Context for calling a handler outside a dispatcher (tests, tools).
    #[must_use]
    pub fn new(action: &'a str, request_id: RequestId, store: &'a mut dyn ResourceStore) -> Self {
        Self {
            action,
            request_id,
            region: "us-east-1",
            permitted: true,
            unknown_filters: UnknownFilterPolicy::Reject,
            store,
        }
    }

    /// Sets the region reported to the handler.
    #[must_use]
    pub fn with_region(mut self, region: &'a str) -> Self {
        self.region = region;
        self
    }

    /// Sets whether the caller holds permission for this action.
    #[must_use]
    pub fn with_permission(mut self, permitted: bool) -> Self {
        self.permitted = permitted;
        self
    }

    /// Sets how queries treat unsupported filter names.
    #[must_use]
    pub fn with_unknown_filters(mut self, policy: UnknownFilterPolicy) -> Self {
        self.unknown_filters = policy;
        self
    }

    /// Name of the action being handled.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action
    }

    /// Id of the request being handled.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Region the request targets.
    #[must_use]
    pub fn region(&self) -> &str {
        self.region
    }

    /// Whether the simulated principal may perform this action.
    #[must_use]
    pub fn is_permitted(&self) -> bool {
        self.permitted
    }

    /// Account that owns the store.
    #[must_use]
    pub fn account_id(&self) -> &AccountId {
        self.store.account_id()
    }

    /// Read access to the store.
    #[must_use]
    pub fn store(&self) -> &dyn ResourceStore {
        &*self.store
    }

    /// Write access to the store.
    pub fn store_mut(&mut self) -> &mut dyn ResourceStore {
        &mut *self.store
    }

    /// Reads `DryRun` and applies [`dry_run_guard`] with this action's
    /// permission.
    ///
    /// # Errors
    /// - `DryRunOperation` / `UnauthorizedOperation`: `DryRun=true`
    /// - `Parameter`: `DryRun` is not a boolean
    pub fn dry_run_guard(&self, params: &RequestParams) -> ApiResult<()> {
        dry_run_guard(params.dry_run()?, self.permitted)
    }

    /// Builder for a new resource with a fresh id and this account as owner.
    pub fn new_resource(&mut self, kind: ResourceKind) -> ResourceBuilder {
        let id = self.store.fresh_id(&kind);
        let owner = self.store.account_id().clone();
        Resource::builder(kind).id(id).owner(owner)
    }

    /// Stores a resource, returning the one it replaced.
    ///
    /// # Errors
    /// - `Storage`: the id was retired
    pub fn put(&mut self, resource: Resource) -> ApiResult<Option<Resource>> {
        Ok(self.store.put(resource)?)
    }

    /// Removes a resource of `kind`.
    ///
    /// # Errors
    /// - `NotFound`: no live resource of `kind` has this id
    pub fn remove(&mut self, kind: &ResourceKind, id: &str) -> ApiResult<Resource> {
        self.require(kind, id)?;
        self.store
            .remove(id)
            .ok_or_else(|| ApiError::not_found(kind.clone(), id))
    }

    /// Looks up a resource of `kind`.
    ///
    /// # Errors
    /// - `NotFound`: absent, or present under another kind
    pub fn require(&self, kind: &ResourceKind, id: &str) -> ApiResult<&Resource> {
        self.store
            .get(id)
            .filter(|r| r.kind() == kind)
            .ok_or_else(|| ApiError::not_found(kind.clone(), id))
    }

    /// Mutable variant of [`ActionContext::require`].
    ///
    /// # Errors
    /// - `NotFound`: absent, or present under another kind
    pub fn require_mut(&mut self, kind: &ResourceKind, id: &str) -> ApiResult<ResourceMut<'_>> {
        self.require(kind, id)?;
        self.store
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found(kind.clone(), id))
    }

    /// Resolves an id one resource holds for another, naming the referenced
    /// kind in the NotFound.
    ///
    /// # Errors
    /// - `NotFound`: the referenced resource does not exist
    pub fn resolve_reference(&self, kind: &ResourceKind, id: &str) -> ApiResult<&Resource> {
        self.store
            .resolve_cross_reference(id)
            .filter(|r| r.kind() == kind)
            .ok_or_else(|| ApiError::not_found(kind.clone(), id))
    }

    /// Runs `Filter.N.*`, `MaxResults` and `NextToken` from `params` over
    /// every resource of `kind`.
    ///
    /// # Errors
    /// - `Parameter`: malformed filter or paging parameters
    /// - `InvalidToken`: the continuation token is not a decimal offset
    pub fn query(
        &self,
        kind: &ResourceKind,
        registry: &FilterRegistry<Resource>,
        params: &RequestParams,
        bounds: PageBounds,
    ) -> ApiResult<Page<&Resource>> {
        let filters = params.filters()?;
        let page = params.page_request()?;
        Query::new(registry)
            .bounds(bounds)
            .unknown_filters(self.unknown_filters)
            .run(self.store.get_typed(kind), &filters, &page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdAllocator;
    use crate::storage::InMemoryResourceStore;

    fn _assert_action_handler_object_safe(_: &dyn ActionHandler) {}

    fn create_volume(ctx: &mut ActionContext<'_>, params: &RequestParams) -> ApiResult<ResponseBody> {
        let size = params
            .get_i64("Size")?
            .ok_or_else(|| crate::error::ParameterError::missing("Size"))?;
        ctx.dry_run_guard(params)?;
        let volume = ctx
            .new_resource(ResourceKind::Volume)
            .attribute("size", size)
            .attribute("availabilityZone", "us-east-1a")
            .attribute("state", "available")
            .build()?;
        let id = volume.id().to_string();
        ctx.put(volume)?;
        Ok(ResponseBody::new().with("volumeId", id))
    }

    #[test]
    fn test_fn_is_handler() {
        let mut store = InMemoryResourceStore::new();
        let rid = IdAllocator::new().allocate_request_id();
        let mut ctx = ActionContext::new("CreateVolume", rid, &mut store);

        let body = create_volume.handle(&mut ctx, &RequestParams::new().with("Size", "8")).unwrap();
        let id = body.get("volumeId").and_then(|v| v.as_str()).unwrap().to_string();
        assert!(id.starts_with("vol-"));
        assert!(ctx.require(&ResourceKind::Volume, &id).is_ok());
    }

    #[test]
    fn test_dry_run_leaves_store_untouched() {
        let mut store = InMemoryResourceStore::new();
        let rid = IdAllocator::new().allocate_request_id();
        let params = RequestParams::new().with("Size", "8").with("DryRun", "true");

        let mut ctx = ActionContext::new("CreateVolume", rid, &mut store);
        assert!(matches!(create_volume(&mut ctx, &params), Err(ApiError::DryRunOperation)));

        let mut ctx = ActionContext::new("CreateVolume", rid, &mut store).with_permission(false);
        assert!(matches!(create_volume(&mut ctx, &params), Err(ApiError::UnauthorizedOperation)));

        assert!(store.is_empty());
    }

    #[test]
    fn test_validation_precedes_dry_run() {
        let mut store = InMemoryResourceStore::new();
        let rid = IdAllocator::new().allocate_request_id();
        let mut ctx = ActionContext::new("CreateVolume", rid, &mut store);
        let err = create_volume(&mut ctx, &RequestParams::new().with("DryRun", "true")).unwrap_err();
        assert!(err.is_parameter());
    }

    #[test]
    fn test_require_checks_kind() {
        let mut store = InMemoryResourceStore::new();
        let rid = IdAllocator::new().allocate_request_id();
        let mut ctx = ActionContext::new("CreateVolume", rid, &mut store);
        let body = create_volume(&mut ctx, &RequestParams::new().with("Size", "1")).unwrap();
        let id = body.get("volumeId").and_then(|v| v.as_str()).unwrap().to_string();

        let err = ctx.require(&ResourceKind::Snapshot, &id).unwrap_err();
        assert_eq!(err.code(), "InvalidSnapshot.NotFound");
        let err = ctx.resolve_reference(&ResourceKind::Volume, "vol-missing").unwrap_err();
        assert_eq!(err.code(), "InvalidVolume.NotFound");

        ctx.require_mut(&ResourceKind::Volume, &id).unwrap().set_attribute("state", "in-use");
        assert_eq!(ctx.require(&ResourceKind::Volume, &id).unwrap().str_attribute("state"), Some("in-use"));

        ctx.remove(&ResourceKind::Volume, &id).unwrap();
        assert!(ctx.remove(&ResourceKind::Volume, &id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_query_reads_filter_params() {
        let mut store = InMemoryResourceStore::new();
        let rid = IdAllocator::new().allocate_request_id();
        let mut ctx = ActionContext::new("DescribeVolumes", rid, &mut store);
        for size in ["8", "16", "8"] {
            create_volume(&mut ctx, &RequestParams::new().with("Size", size)).unwrap();
        }

        let registry = FilterRegistry::with_resource_defaults().attribute(
            "size",
            "size",
            crate::query::MatchMode::Exact,
        );
        let params = RequestParams::new()
            .with("Filter.1.Name", "size")
            .with("Filter.1.Value.1", "8");
        let page = ctx
            .query(&ResourceKind::Volume, &registry, &params, PageBounds::default())
            .unwrap();
        assert_eq!(page.len(), 2);
        assert!(page.next_token.is_none());
    }
}
