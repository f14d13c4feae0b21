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
    kind = "CustomHostname",
    group = "cloudflare.com",
    version = "v1alpha1",
    namespaced
)]
#[kube(status = "CustomHostnameStatus")]
#[kube(printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#)]
#[kube(printcolumn = r#"{"name":"Synced","type":"boolean","jsonPath":".status.synced"}"#)]
#[kube(printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.atProvider.status"}"#)]
#[serde(rename_all = "camelCase")]
pub struct CustomHostnameSpec {
    pub for_provider: CustomHostnameParameters,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret_ref: Option<SecretKeySelector>,
}

pub type CustomHostnameStatus = ManagedStatus<CustomHostnameObservation>;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomHostnameParameters {
    /// The hostname served for the SaaS customer, immutable once created
    pub hostname: String,
    /// Origin to route this hostname to instead of the zone's fallback origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_origin_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<CustomHostnameSslParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomHostnameSslParameters {
    /// Domain control validation method: `http`, `txt` or `email`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Only `dv` is supported
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ssl_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<CustomHostnameSslSettings>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomHostnameSslSettings {
    /// `on` or `off`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http2: Option<String>,
    /// `on` or `off`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls13: Option<String>,
    /// `1.0`, `1.1`, `1.2` or `1.3`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_tls_version: Option<String>,
    /// Allowed cipher suites, in BoringSSL format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphers: Option<Vec<String>>,
    /// `on` or `off`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_hints: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomHostnameObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership_verification: Option<OwnershipVerification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership_verification_http: Option<OwnershipVerificationHttp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<SslObservation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// DNS record proving ownership of the hostname
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct OwnershipVerification {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub verification_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// HTTP file proving ownership of the hostname
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipVerificationHttp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_body: Option<String>,
}

/// Certificate issuance progress
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SslObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txt_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txt_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,
}

managed_resource!(
    CustomHostname,
    CustomHostnameParameters,
    CustomHostnameObservation,
    "customhostnames.cloudflare.com",
    External<CloudflareClient>
);
