use k8s_openapi::api::core::v1::SecretKeySelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    cf_client::CloudflareClient,
    managed::{DeletionPolicy, ManagedStatus, managed_resource},
};

use super::reconcile::External;

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[cfg_attr(test, derive(Default))]
#[kube(kind = "Filter", group = "cloudflare.com", version = "v1alpha1", namespaced)]
#[kube(status = "FilterStatus")]
#[kube(printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#)]
#[kube(printcolumn = r#"{"name":"Synced","type":"boolean","jsonPath":".status.synced"}"#)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub for_provider: FilterParameters,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret_ref: Option<SecretKeySelector>,
}

pub type FilterStatus = ManagedStatus<FilterObservation>;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterParameters {
    /// Firewall rules language expression
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterObservation {
    /// Short reference tag of the filter
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

managed_resource!(
    Filter,
    FilterParameters,
    FilterObservation,
    "filters.cloudflare.com",
    External<CloudflareClient>
);
