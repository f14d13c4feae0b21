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
#[kube(
    kind = "WorkerRoute",
    group = "cloudflare.com",
    version = "v1alpha1",
    namespaced
)]
#[kube(status = "RouteStatus")]
#[kube(printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#)]
#[kube(printcolumn = r#"{"name":"Synced","type":"boolean","jsonPath":".status.synced"}"#)]
#[kube(printcolumn = r#"{"name":"Pattern","type":"string","jsonPath":".spec.forProvider.pattern"}"#)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRouteSpec {
    pub for_provider: RouteParameters,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret_ref: Option<SecretKeySelector>,
}

pub type RouteStatus = ManagedStatus<RouteObservation>;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteParameters {
    /// URL pattern, e.g. `example.com/api/*`
    pub pattern: String,
    /// Worker script to run; unset disables Workers on matching requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct RouteObservation {}

managed_resource!(
    WorkerRoute,
    RouteParameters,
    RouteObservation,
    "workerroutes.cloudflare.com",
    External<CloudflareClient>
);
