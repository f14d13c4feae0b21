use k8s_openapi::api::core::v1::SecretKeySelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    cf_client::CloudflareClient,
    managed::{DeletionPolicy, ManagedStatus, managed_resource},
};

use super::reconcile::External;

/// The fallback origin of a SaaS zone, at most one per zone
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[cfg_attr(test, derive(Default))]
#[kube(
    kind = "FallbackOrigin",
    group = "cloudflare.com",
    version = "v1alpha1",
    namespaced
)]
#[kube(status = "FallbackOriginStatus")]
#[kube(printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#)]
#[kube(printcolumn = r#"{"name":"Synced","type":"boolean","jsonPath":".status.synced"}"#)]
#[kube(printcolumn = r#"{"name":"Origin","type":"string","jsonPath":".spec.forProvider.origin"}"#)]
#[serde(rename_all = "camelCase")]
pub struct FallbackOriginSpec {
    pub for_provider: FallbackOriginParameters,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret_ref: Option<SecretKeySelector>,
}

pub type FallbackOriginStatus = ManagedStatus<FallbackOriginObservation>;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FallbackOriginParameters {
    /// Hostname custom hostnames are routed to unless they name their own origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FallbackOriginObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

managed_resource!(
    FallbackOrigin,
    FallbackOriginParameters,
    FallbackOriginObservation,
    "fallbackorigins.cloudflare.com",
    External<CloudflareClient>
);
