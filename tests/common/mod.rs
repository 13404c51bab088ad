//! Sample domain handlers built only on the public core interface.

#![allow(dead_code)]

use computesim::dispatch::ResponseBody;
use computesim::query::{Filter, FilterRegistry, MatchMode, PageBounds, Query};
use computesim::{
    ActionContext, ApiResult, Dispatcher, EmulatorConfig, ParameterError, RequestParams, Resource,
    ResourceId, ResourceKind, Value,
};
use serde_json::Value as Json;

pub fn instance_filters() -> FilterRegistry<Resource> {
    FilterRegistry::with_resource_defaults()
        .id_filter("instance-id")
        .attribute("instance-type", "instanceType", MatchMode::Glob)
        .attribute("image-id", "imageId", MatchMode::Exact)
        .attribute("instance-state-name", "state", MatchMode::Exact)
}

pub fn snapshot_filters() -> FilterRegistry<Resource> {
    FilterRegistry::with_resource_defaults()
        .id_filter("snapshot-id")
        .attribute("volume-id", "volumeId", MatchMode::Exact)
        .attribute("status", "state", MatchMode::Exact)
}

fn tags_for(params: &RequestParams, resource_type: &str) -> ApiResult<Vec<(String, String)>> {
    Ok(params
        .tag_specifications()?
        .into_iter()
        .filter(|spec| spec.resource_type.as_deref().map_or(true, |t| t == resource_type))
        .flat_map(|spec| spec.tags)
        .collect())
}

fn required_ids(params: &RequestParams, name: &str) -> ApiResult<Vec<String>> {
    let ids = params.string_list(name)?;
    if ids.is_empty() {
        return Err(ParameterError::missing(format!("{name}.1")).into());
    }
    Ok(ids)
}

pub fn run_instances(ctx: &mut ActionContext<'_>, params: &RequestParams) -> ApiResult<ResponseBody> {
    let image_id = params.require("ImageId")?.to_string();
    let instance_type = params.get("InstanceType").unwrap_or("m1.small").to_string();
    let min = params.get_i64("MinCount")?.unwrap_or(1);
    let max = params.get_i64("MaxCount")?.unwrap_or(min);
    if min < 1 || max < min {
        return Err(ParameterError::invalid_value("MaxCount", max.to_string(), "must be at least MinCount").into());
    }
    let tags = tags_for(params, "instance")?;

    ctx.dry_run_guard(params)?;

    let mut instances = Vec::new();
    for _ in 0..max {
        let instance = ctx
            .new_resource(ResourceKind::Instance)
            .attribute("imageId", image_id.as_str())
            .attribute("instanceType", instance_type.as_str())
            .attribute("state", "running")
            .tags(tags.clone())
            .build()?;
        instances.push(instance.to_json("instanceId"));
        ctx.put(instance)?;
    }
    Ok(ResponseBody::new()
        .with("ownerId", ctx.account_id().to_string())
        .with("instancesSet", Json::Array(instances)))
}

pub fn describe_instances(ctx: &mut ActionContext<'_>, params: &RequestParams) -> ApiResult<ResponseBody> {
    let ids = params.string_list("InstanceId")?;
    for id in &ids {
        ctx.require(&ResourceKind::Instance, id)?;
    }
    let mut filters = params.filters()?;
    if !ids.is_empty() {
        filters.push(Filter::new("instance-id", ids));
    }

    let registry = instance_filters();
    let page = Query::new(&registry)
        .bounds(PageBounds::DESCRIBE)
        .run(ctx.store().get_typed(&ResourceKind::Instance), &filters, &params.page_request()?)?;
    Ok(ResponseBody::new().with_page("instancesSet", page.map(|r| r.to_json("instanceId"))))
}

pub fn terminate_instances(ctx: &mut ActionContext<'_>, params: &RequestParams) -> ApiResult<ResponseBody> {
    let ids = required_ids(params, "InstanceId")?;
    for id in &ids {
        ctx.require(&ResourceKind::Instance, id)?;
    }

    ctx.dry_run_guard(params)?;

    let mut changes = Vec::new();
    for id in &ids {
        let attached: Vec<ResourceId> = ctx
            .store()
            .get_typed(&ResourceKind::Volume)
            .iter()
            .filter(|v| v.reference("attachedTo").is_some_and(|r| r.as_str() == id.as_str()))
            .map(|v| v.id().clone())
            .collect();
        for volume_id in attached {
            let mut volume = ctx.require_mut(&ResourceKind::Volume, volume_id.as_str())?;
            volume.remove_attribute("attachedTo");
            volume.set_attribute("state", "available");
        }
        // The instance goes last.
        let instance = ctx.remove(&ResourceKind::Instance, id)?;
        changes.push(serde_json::json!({
            "instanceId": id,
            "previousState": instance.str_attribute("state"),
            "currentState": "terminated",
        }));
    }
    Ok(ResponseBody::new().with("instancesSet", Json::Array(changes)))
}

pub fn create_volume(ctx: &mut ActionContext<'_>, params: &RequestParams) -> ApiResult<ResponseBody> {
    let size = params
        .get_i64("Size")?
        .ok_or_else(|| ParameterError::missing("Size"))?;
    let zone = params.require("AvailabilityZone")?.to_string();
    let attach_to = match params.get("InstanceId") {
        Some(id) => Some(ctx.resolve_reference(&ResourceKind::Instance, id)?.id().clone()),
        None => None,
    };

    ctx.dry_run_guard(params)?;

    let mut builder = ctx
        .new_resource(ResourceKind::Volume)
        .attribute("size", size)
        .attribute("availabilityZone", zone)
        .tags(tags_for(params, "volume")?);
    builder = match attach_to {
        Some(instance_id) => builder
            .attribute("attachedTo", Value::Reference(instance_id))
            .attribute("state", "in-use"),
        None => builder.attribute("state", "available"),
    };
    let volume = builder.build()?;
    let body = ResponseBody::new().with("volumeId", volume.id().to_string());
    ctx.put(volume)?;
    Ok(body)
}

pub fn create_snapshot(ctx: &mut ActionContext<'_>, params: &RequestParams) -> ApiResult<ResponseBody> {
    let volume_id = ctx
        .resolve_reference(&ResourceKind::Volume, params.require("VolumeId")?)?
        .id()
        .clone();
    let tags = tags_for(params, "snapshot")?;

    ctx.dry_run_guard(params)?;

    let mut builder = ctx
        .new_resource(ResourceKind::Snapshot)
        .attribute("volumeId", Value::Reference(volume_id))
        .attribute("state", "completed")
        .tags(tags);
    if let Some(description) = params.get("Description") {
        builder = builder.attribute("description", description);
    }
    let snapshot = builder.build()?;
    let body = ResponseBody::new().with("snapshotId", snapshot.id().to_string());
    ctx.put(snapshot)?;
    Ok(body)
}

pub fn describe_snapshots(ctx: &mut ActionContext<'_>, params: &RequestParams) -> ApiResult<ResponseBody> {
    let page = ctx.query(&ResourceKind::Snapshot, &snapshot_filters(), params, PageBounds::DESCRIBE)?;
    Ok(ResponseBody::new().with_page("snapshotSet", page.map(|r| r.to_json("snapshotId"))))
}

pub fn register_all(dispatcher: &mut Dispatcher) {
    dispatcher.register("RunInstances", run_instances);
    dispatcher.register("DescribeInstances", describe_instances);
    dispatcher.register("TerminateInstances", terminate_instances);
    dispatcher.register("CreateVolume", create_volume);
    dispatcher.register("CreateSnapshot", create_snapshot);
    dispatcher.register("DescribeSnapshots", describe_snapshots);
}

pub fn dispatcher() -> Dispatcher {
    dispatcher_with(&EmulatorConfig::default())
}

pub fn dispatcher_with(config: &EmulatorConfig) -> Dispatcher {
    let mut dispatcher = Dispatcher::from_config(config);
    register_all(&mut dispatcher);
    dispatcher
}

pub fn params(pairs: &[(&str, &str)]) -> RequestParams {
    pairs.iter().copied().collect()
}

/// Runs `count` instances and returns their ids in creation order.
pub fn run(dispatcher: &Dispatcher, count: usize, instance_type: &str) -> Vec<String> {
    let count = count.to_string();
    let response = dispatcher
        .dispatch(
            "RunInstances",
            &params(&[
                ("ImageId", "ami-12345678"),
                ("InstanceType", instance_type),
                ("MinCount", count.as_str()),
                ("MaxCount", count.as_str()),
            ]),
        )
        .unwrap();
    ids(&response.body, "instancesSet", "instanceId")
}

pub fn ids(body: &ResponseBody, set: &str, field: &str) -> Vec<String> {
    body.get(set)
        .and_then(Json::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item[field].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn typed_len(dispatcher: &Dispatcher, kind: &ResourceKind) -> usize {
    dispatcher
        .store()
        .with(|store| store.get_typed(kind).len())
}
