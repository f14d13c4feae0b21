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
    kind = "DNSRecord",
    group = "cloudflare.com",
    version = "v1alpha1",
    namespaced
)]
#[kube(status = "RecordStatus", shortname = "dns")]
#[kube(printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#)]
#[kube(printcolumn = r#"{"name":"Synced","type":"boolean","jsonPath":".status.synced"}"#)]
#[serde(rename_all = "camelCase")]
pub struct DNSRecordSpec {
    pub for_provider: RecordParameters,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret_ref: Option<SecretKeySelector>,
}

pub type RecordStatus = ManagedStatus<RecordObservation>;

/// Record types accepted by the DNS API
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordType {
    #[default]
    A,
    AAAA,
    CAA,
    CERT,
    CNAME,
    DNSKEY,
    DS,
    HTTPS,
    LOC,
    MX,
    NAPTR,
    NS,
    PTR,
    SMIMEA,
    SPF,
    SRV,
    SSHFP,
    SVCB,
    TLSA,
    TXT,
    URI,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::CAA => "CAA",
            RecordType::CERT => "CERT",
            RecordType::CNAME => "CNAME",
            RecordType::DNSKEY => "DNSKEY",
            RecordType::DS => "DS",
            RecordType::HTTPS => "HTTPS",
            RecordType::LOC => "LOC",
            RecordType::MX => "MX",
            RecordType::NAPTR => "NAPTR",
            RecordType::NS => "NS",
            RecordType::PTR => "PTR",
            RecordType::SMIMEA => "SMIMEA",
            RecordType::SPF => "SPF",
            RecordType::SRV => "SRV",
            RecordType::SSHFP => "SSHFP",
            RecordType::SVCB => "SVCB",
            RecordType::TLSA => "TLSA",
            RecordType::TXT => "TXT",
            RecordType::URI => "URI",
        }
    }

    /// Parse the type string returned by the API, `None` for types we don't model
    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_ascii_uppercase())).ok()
    }
}

fn default_record_type() -> Option<RecordType> {
    Some(RecordType::A)
}

fn default_ttl() -> Option<i64> {
    Some(1)
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordParameters {
    #[serde(rename = "type", default = "default_record_type")]
    pub record_type: Option<RecordType>,
    /// Record name, either relative to the zone, fully qualified, or `@` for the apex
    pub name: String,
    pub content: String,
    /// Time to live in seconds, 1 means automatic
    #[serde(default = "default_ttl")]
    pub ttl: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    /// Required for MX, SRV and URI records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    /// ID of the zone the record lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordObservation {
    pub proxiable: bool,
    /// Fully qualified record name
    pub fqdn: String,
    /// Name of the zone
    pub zone: String,
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,
}

managed_resource!(
    DNSRecord,
    RecordParameters,
    RecordObservation,
    "dnsrecords.cloudflare.com",
    External<CloudflareClient>
);
