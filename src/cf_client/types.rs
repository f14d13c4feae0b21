//! Wire representations of the Cloudflare objects this operator manages.
//!
//! Only the fields the operator reads or writes are modelled; anything else in
//! a response is ignored on decode.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub development_mode: i64,
    #[serde(default)]
    pub name_servers: Vec<String>,
    #[serde(default)]
    pub original_name_servers: Option<Vec<String>>,
    #[serde(default)]
    pub original_registrar: Option<String>,
    #[serde(default)]
    pub original_dnshost: Option<String>,
    #[serde(default)]
    pub vanity_name_servers: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default, rename = "type")]
    pub zone_type: Option<String>,
    #[serde(default)]
    pub account: Option<ZoneAccount>,
    #[serde(default)]
    pub plan: Option<ZonePlan>,
    #[serde(default)]
    pub plan_pending: Option<ZonePlan>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ZoneAccount {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ZonePlan {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct CreateZone {
    pub name: String,
    pub jump_start: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountRef>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<String>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct AccountRef {
    pub id: String,
}

/// Body of `PATCH /zones/{id}`; Cloudflare accepts one property per request.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct EditZone {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vanity_name_servers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanRef>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct PlanRef {
    pub id: String,
}

/// One entry of `GET /zones/{id}/settings`
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ZoneSetting {
    pub id: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub editable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,
}

/// One entry of the `items` array sent to `PATCH /zones/{id}/settings`
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ZoneSettingItem {
    pub id: String,
    pub value: Value,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct EditZoneSettings {
    pub items: Vec<ZoneSettingItem>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct DnsRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub ttl: i64,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub proxiable: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub zone_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct DnsRecordRequest {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub expression: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct FirewallRule {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    pub filter: FilterRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<String>,
}

/// Rules embed their filter; on write only the ID is needed.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct FilterRef {
    pub id: String,
    #[serde(default, skip_serializing)]
    pub expression: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct SpectrumApplication {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub protocol: String,
    pub dns: SpectrumApplicationDns,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origin_direct: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_port: Option<OriginPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_dns: Option<SpectrumApplicationOriginDns>,
    #[serde(default)]
    pub ip_firewall: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub proxy_protocol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tls: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub traffic_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_ips: Option<SpectrumApplicationEdgeIps>,
    #[serde(default)]
    pub argo_smart_routing: bool,
    #[serde(default, skip_serializing)]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing)]
    pub modified_on: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct SpectrumApplicationDns {
    #[serde(rename = "type")]
    pub dns_type: String,
    pub name: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct SpectrumApplicationOriginDns {
    pub name: String,
}

/// Either a single port or a `"start-end"` range
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum OriginPort {
    Port(u16),
    Range(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct SpectrumApplicationEdgeIps {
    #[serde(rename = "type")]
    pub ips_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<IpAddr>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct CustomHostname {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_origin_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<CustomHostnameSsl>,
    #[serde(default, skip_serializing)]
    pub status: Option<String>,
    #[serde(default, skip_serializing)]
    pub verification_errors: Vec<String>,
    #[serde(default, skip_serializing)]
    pub ownership_verification: Option<OwnershipVerification>,
    #[serde(default, skip_serializing)]
    pub ownership_verification_http: Option<OwnershipVerificationHttp>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct CustomHostnameSsl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ssl_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<CustomHostnameSslSettings>,
    #[serde(default, skip_serializing)]
    pub status: Option<String>,
    #[serde(default, skip_serializing)]
    pub validation_errors: Vec<ValidationError>,
    #[serde(default, skip_serializing)]
    pub http_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub http_body: Option<String>,
    #[serde(default, skip_serializing)]
    pub txt_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub txt_value: Option<String>,
    #[serde(default, skip_serializing)]
    pub cname_target: Option<String>,
    #[serde(default, skip_serializing)]
    pub cname: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct CustomHostnameSslSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http2: Option<String>,
    #[serde(default, rename = "tls_1_3", skip_serializing_if = "Option::is_none")]
    pub tls13: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_tls_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_hints: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ValidationError {
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct OwnershipVerification {
    #[serde(default, rename = "type")]
    pub verification_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct OwnershipVerificationHttp {
    #[serde(default)]
    pub http_url: Option<String>,
    #[serde(default)]
    pub http_body: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct FallbackOrigin {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default, skip_serializing)]
    pub status: Option<String>,
    #[serde(default, skip_serializing)]
    pub errors: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct WorkerRoute {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}
