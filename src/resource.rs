//! Simulated resources and their per-kind schemas.
//!
//! Every stored entity is a [`Resource`]: an opaque id, a [`ResourceKind`]
//! tag, the owning account, tags, and an open attribute set. Each kind
//! enumerates its id prefix, the wire code of its NotFound error and the
//! attributes a resource of that kind must carry. Attribute lookups return
//! `None` for absent attributes.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParameterError;
use crate::id::{AccountId, ResourceId};
use crate::value::{format_timestamp, Value};

/// Classification of simulated resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Instance,
    Volume,
    Snapshot,
    Image,
    KeyPair,
    SecurityGroup,
    Vpc,
    Subnet,
    VpcPeeringConnection,
    CapacityReservation,
    CapacityReservationFleet,
    Fleet,
    LaunchTemplate,
    NetworkInsightsPath,
    NetworkInsightsAnalysis,
    TransitGateway,
    TransitGatewayAttachment,
    TransitGatewayRouteTable,
    /// A kind not enumerated above; the name doubles as id prefix.
    Custom(String),
}

impl ResourceKind {
    /// Prefix of ids allocated for this kind.
    #[must_use]
    pub fn id_prefix(&self) -> &str {
        match self {
            Self::Instance => "i",
            Self::Volume => "vol",
            Self::Snapshot => "snap",
            Self::Image => "ami",
            Self::KeyPair => "key",
            Self::SecurityGroup => "sg",
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::VpcPeeringConnection => "pcx",
            Self::CapacityReservation => "cr",
            Self::CapacityReservationFleet => "crf",
            Self::Fleet => "fleet",
            Self::LaunchTemplate => "lt",
            Self::NetworkInsightsPath => "nip",
            Self::NetworkInsightsAnalysis => "nia",
            Self::TransitGateway => "tgw",
            Self::TransitGatewayAttachment => "tgw-attach",
            Self::TransitGatewayRouteTable => "tgw-rtb",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Wire code of the NotFound error for this kind.
    #[must_use]
    pub fn not_found_code(&self) -> String {
        let code = match self {
            Self::Instance => "InvalidInstanceID.NotFound",
            Self::Volume => "InvalidVolume.NotFound",
            Self::Snapshot => "InvalidSnapshot.NotFound",
            Self::Image => "InvalidAMIID.NotFound",
            Self::KeyPair => "InvalidKeyPair.NotFound",
            Self::SecurityGroup => "InvalidGroup.NotFound",
            Self::Vpc => "InvalidVpcID.NotFound",
            Self::Subnet => "InvalidSubnetID.NotFound",
            Self::VpcPeeringConnection => "InvalidVpcPeeringConnectionID.NotFound",
            Self::CapacityReservation => "InvalidCapacityReservationId.NotFound",
            Self::CapacityReservationFleet => "InvalidCapacityReservationFleetId.NotFound",
            Self::Fleet => "InvalidFleetId.NotFound",
            Self::LaunchTemplate => "InvalidLaunchTemplateId.NotFound",
            Self::NetworkInsightsPath => "InvalidNetworkInsightsPathId.NotFound",
            Self::NetworkInsightsAnalysis => "InvalidNetworkInsightsAnalysisId.NotFound",
            Self::TransitGateway => "InvalidTransitGatewayID.NotFound",
            Self::TransitGatewayAttachment => "InvalidTransitGatewayAttachmentID.NotFound",
            Self::TransitGatewayRouteTable => "InvalidRouteTableID.NotFound",
            Self::Custom(name) => return format!("Invalid{name}Id.NotFound"),
        };
        code.to_string()
    }

    /// Attributes every resource of this kind must carry (non-null).
    #[must_use]
    pub const fn required_attributes(&self) -> &'static [&'static str] {
        match self {
            Self::Instance => &["instanceType", "imageId", "state"],
            Self::Volume => &["size", "availabilityZone", "state"],
            Self::Snapshot => &["volumeId", "state"],
            Self::Image => &["name", "state"],
            Self::KeyPair => &["keyName"],
            Self::SecurityGroup => &["groupName", "description"],
            Self::Vpc => &["cidrBlock", "state"],
            Self::Subnet => &["vpcId", "cidrBlock"],
            Self::VpcPeeringConnection => &["requesterVpcId", "accepterVpcId", "status"],
            Self::CapacityReservation => &[
                "instanceType",
                "instancePlatform",
                "availabilityZone",
                "totalInstanceCount",
                "state",
            ],
            Self::CapacityReservationFleet => &["totalTargetCapacity", "state"],
            Self::Fleet => &["type", "fleetState"],
            Self::LaunchTemplate => &["launchTemplateName"],
            Self::NetworkInsightsPath => &["source", "protocol"],
            Self::NetworkInsightsAnalysis => &["networkInsightsPathId", "status"],
            Self::TransitGateway => &["state"],
            Self::TransitGatewayAttachment => &["transitGatewayId", "resourceType", "state"],
            Self::TransitGatewayRouteTable => &["transitGatewayId", "state"],
            Self::Custom(_) => &[],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Instance => "instance",
            Self::Volume => "volume",
            Self::Snapshot => "snapshot",
            Self::Image => "image",
            Self::KeyPair => "key-pair",
            Self::SecurityGroup => "security-group",
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::VpcPeeringConnection => "vpc-peering-connection",
            Self::CapacityReservation => "capacity-reservation",
            Self::CapacityReservationFleet => "capacity-reservation-fleet",
            Self::Fleet => "fleet",
            Self::LaunchTemplate => "launch-template",
            Self::NetworkInsightsPath => "network-insights-path",
            Self::NetworkInsightsAnalysis => "network-insights-analysis",
            Self::TransitGateway => "transit-gateway",
            Self::TransitGatewayAttachment => "transit-gateway-attachment",
            Self::TransitGatewayRouteTable => "transit-gateway-route-table",
            Self::Custom(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

/// A stored simulated entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    kind: ResourceKind,
    /// Owning account.
    pub owner_id: AccountId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    tags: BTreeMap<String, String>,
    attributes: BTreeMap<String, Value>,
}

impl Resource {
    /// Starts building a resource of the given kind.
    #[must_use]
    pub fn builder(kind: ResourceKind) -> ResourceBuilder {
        ResourceBuilder::new(kind)
    }

    /// Resource id.
    #[must_use]
    pub const fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Resource kind.
    #[must_use]
    pub const fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Looks up an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Looks up a string or reference attribute as text.
    #[must_use]
    pub fn str_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(Value::as_str)
    }

    /// Looks up the id another resource is referenced by.
    ///
    /// Plain string attributes holding an id are accepted too.
    #[must_use]
    pub fn reference(&self, name: &str) -> Option<ResourceId> {
        match self.attribute(name)? {
            Value::Reference(id) => Some(id.clone()),
            Value::String(s) => Some(ResourceId::new(s.clone())),
            _ => None,
        }
    }

    /// Sets an attribute, returning the previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(name.into(), value.into())
    }

    /// Removes an attribute, returning the previous value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// Iterates attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Value of tag `key`.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Sets a tag, returning the previous value.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.tags.insert(key.into(), value.into())
    }

    /// Removes a tag, returning its value.
    pub fn remove_tag(&mut self, key: &str) -> Option<String> {
        self.tags.remove(key)
    }

    /// Iterates tags in key order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Renders the resource as a response item.
    ///
    /// `id_field` names the id per the target API (`instanceId`, `volumeId`, ...).
    /// Tags render as `tagSet` when present.
    #[must_use]
    pub fn to_json(&self, id_field: &str) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        out.insert(id_field.to_string(), self.id.to_string().into());
        out.insert("ownerId".to_string(), self.owner_id.to_string().into());
        out.insert("createTime".to_string(), format_timestamp(&self.created_at).into());
        for (k, v) in &self.attributes {
            out.insert(k.clone(), v.to_json());
        }
        if !self.tags.is_empty() {
            let tags = self
                .tags
                .iter()
                .map(|(k, v)| serde_json::json!({ "key": k, "value": v }))
                .collect();
            out.insert("tagSet".to_string(), serde_json::Value::Array(tags));
        }
        serde_json::Value::Object(out)
    }
}

/// Builder for [`Resource`], validating the kind's required attributes.
///
/// # Examples
///
/// ```
/// use computesim::{AccountId, Resource, ResourceId, ResourceKind};
///
/// let volume = Resource::builder(ResourceKind::Volume)
///     .id(ResourceId::new("vol-1"))
///     .owner(AccountId::default())
///     .attribute("size", 8)
///     .attribute("availabilityZone", "us-east-1a")
///     .attribute("state", "available")
///     .build()
///     .unwrap();
/// assert_eq!(volume.str_attribute("state"), Some("available"));
/// ```
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    kind: ResourceKind,
    id: Option<ResourceId>,
    owner_id: Option<AccountId>,
    created_at: Option<DateTime<Utc>>,
    tags: BTreeMap<String, String>,
    attributes: BTreeMap<String, Value>,
}

impl ResourceBuilder {
    fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            id: None,
            owner_id: None,
            created_at: None,
            tags: BTreeMap::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set the id (required).
    #[must_use]
    pub fn id(mut self, id: ResourceId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the owning account (required).
    #[must_use]
    pub fn owner(mut self, owner: AccountId) -> Self {
        self.owner_id = Some(owner);
        self
    }

    /// Set the creation time (default: now).
    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds tags in iteration order.
    #[must_use]
    pub fn tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Build the resource.
    ///
    /// Returns `ParameterError::MissingParameter` if the id or owner is unset and
    /// `ParameterError::MissingAttribute` if a required attribute is absent or null.
    pub fn build(self) -> Result<Resource, ParameterError> {
        let id = self.id.ok_or_else(|| ParameterError::missing("id"))?;
        let owner_id = self.owner_id.ok_or_else(|| ParameterError::missing("ownerId"))?;

        for required in self.kind.required_attributes() {
            let present = self
                .attributes
                .get(*required)
                .is_some_and(|v| !v.is_null());
            if !present {
                return Err(ParameterError::MissingAttribute {
                    kind: self.kind.to_string(),
                    attribute: (*required).to_string(),
                });
            }
        }

        Ok(Resource {
            id,
            kind: self.kind,
            owner_id,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            tags: self.tags,
            attributes: self.attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume() -> ResourceBuilder {
        Resource::builder(ResourceKind::Volume)
            .id(ResourceId::new("vol-1"))
            .owner(AccountId::default())
            .attribute("size", 8)
            .attribute("availabilityZone", "us-east-1a")
            .attribute("state", "available")
    }

    #[test]
    fn test_build_ok() {
        let r = volume().tag("Name", "data").build().unwrap();
        assert_eq!(r.kind(), &ResourceKind::Volume);
        assert_eq!(r.tag("Name"), Some("data"));
        assert_eq!(r.attribute("size").and_then(Value::as_int), Some(8));
        assert!(r.attribute("iops").is_none());
    }

    #[test]
    fn test_missing_required_attribute() {
        let err = volume().attribute("state", Value::Null).build().unwrap_err();
        assert_eq!(
            err,
            ParameterError::MissingAttribute {
                kind: "volume".to_string(),
                attribute: "state".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_id() {
        let err = Resource::builder(ResourceKind::Custom("widget".to_string()))
            .owner(AccountId::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, ParameterError::MissingParameter { .. }));
    }

    #[test]
    fn test_custom_kind_schema() {
        let kind = ResourceKind::Custom("Widget".to_string());
        assert_eq!(kind.id_prefix(), "Widget");
        assert_eq!(kind.not_found_code(), "InvalidWidgetId.NotFound");
        assert!(kind.required_attributes().is_empty());
    }

    #[test]
    fn test_reference_accepts_string() {
        let snap = Resource::builder(ResourceKind::Snapshot)
            .id(ResourceId::new("snap-1"))
            .owner(AccountId::default())
            .attribute("volumeId", "vol-1")
            .attribute("state", "completed")
            .build()
            .unwrap();
        assert_eq!(snap.reference("volumeId"), Some(ResourceId::new("vol-1")));
    }

    #[test]
    fn test_to_json_shape() {
        let r = volume().tag("team", "core").build().unwrap();
        let json = r.to_json("volumeId");
        assert_eq!(json["volumeId"], "vol-1");
        assert_eq!(json["size"], 8);
        assert_eq!(json["tagSet"][0]["key"], "team");
        assert_eq!(json["ownerId"], "123456789012");
    }
}
