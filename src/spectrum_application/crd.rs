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
    kind = "SpectrumApplication",
    group = "cloudflare.com",
    version = "v1alpha1",
    namespaced
)]
#[kube(status = "ApplicationStatus")]
#[kube(printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#)]
#[kube(printcolumn = r#"{"name":"Synced","type":"boolean","jsonPath":".status.synced"}"#)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumApplicationSpec {
    pub for_provider: ApplicationParameters,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret_ref: Option<SecretKeySelector>,
}

pub type ApplicationStatus = ManagedStatus<ApplicationObservation>;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationParameters {
    /// Edge port and protocol, e.g. `tcp/22`
    pub protocol: String,
    pub dns: ApplicationDns,
    /// Origin addresses, e.g. `tcp://192.0.2.1:22`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_direct: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_port: Option<ApplicationOriginPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_dns: Option<ApplicationOriginDns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_firewall: Option<bool>,
    /// One of `off`, `v1`, `v2` or `simple`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_ips: Option<ApplicationEdgeIps>,
    /// One of `off`, `flexible`, `full` or `strict`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<String>,
    /// One of `direct`, `http` or `https`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argo_smart_routing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct ApplicationDns {
    /// `CNAME` or `ADDRESS`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub dns_type: Option<String>,
    pub name: String,
}

/// A single origin port, or an inclusive `start`..`end` range
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct ApplicationOriginPort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u16>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct ApplicationOriginDns {
    pub name: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct ApplicationEdgeIps {
    /// `dynamic` or `static`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ips_type: Option<String>,
    /// `all`, `ipv4` or `ipv6`, dynamic edge IPs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<String>,
    /// Static edge IPs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<String>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,
}

managed_resource!(
    SpectrumApplication,
    ApplicationParameters,
    ApplicationObservation,
    "spectrumapplications.cloudflare.com",
    External<CloudflareClient>
);
