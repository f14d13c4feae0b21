use k8s_openapi::api::core::v1::SecretKeySelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    cf_client::CloudflareClient,
    managed::{DeletionPolicy, ManagedStatus, managed_resource},
};

use super::{reconcile::External, settings::ZoneSettings};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[cfg_attr(test, derive(Default))]
#[kube(kind = "Zone", group = "cloudflare.com", version = "v1alpha1", namespaced)]
#[kube(status = "ZoneStatus", shortname = "zone")]
#[kube(printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#)]
#[kube(printcolumn = r#"{"name":"Synced","type":"boolean","jsonPath":".status.synced"}"#)]
#[kube(printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.atProvider.status"}"#)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSpec {
    pub for_provider: ZoneParameters,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret_ref: Option<SecretKeySelector>,
}

pub type ZoneStatus = ManagedStatus<ZoneObservation>;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    #[default]
    Full,
    Partial,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Full => "full",
            ZoneType::Partial => "partial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full" => Some(ZoneType::Full),
            "partial" => Some(ZoneType::Partial),
            _ => None,
        }
    }
}

fn default_zone_type() -> Option<ZoneType> {
    Some(ZoneType::Full)
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneParameters {
    /// Domain name of the zone, cannot be changed after creation
    pub name: String,
    /// Account the zone is created in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Scan for existing DNS records on creation
    #[serde(default)]
    pub jump_start: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub settings: ZoneSettings,
    #[serde(rename = "type", default = "default_zone_type")]
    pub zone_type: Option<ZoneType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vanity_name_servers: Option<Vec<String>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    pub development_mode: i64,
    pub name_servers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub original_name_servers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_registrar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_dns_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_pending: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub paused: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<String>,
}

managed_resource!(
    Zone,
    ZoneParameters,
    ZoneObservation,
    "zones.cloudflare.com",
    External<CloudflareClient>
);
