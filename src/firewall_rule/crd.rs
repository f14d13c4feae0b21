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
#[kube(kind = "FirewallRule", group = "cloudflare.com", version = "v1alpha1", namespaced)]
#[kube(status = "RuleStatus")]
#[kube(printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#)]
#[kube(printcolumn = r#"{"name":"Synced","type":"boolean","jsonPath":".status.synced"}"#)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleSpec {
    pub for_provider: RuleParameters,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret_ref: Option<SecretKeySelector>,
}

pub type RuleStatus = ManagedStatus<RuleObservation>;

/// What happens to a request matching the rule's filter
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    #[default]
    Block,
    Challenge,
    JsChallenge,
    ManagedChallenge,
    Allow,
    Log,
    Bypass,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Block => "block",
            RuleAction::Challenge => "challenge",
            RuleAction::JsChallenge => "js_challenge",
            RuleAction::ManagedChallenge => "managed_challenge",
            RuleAction::Allow => "allow",
            RuleAction::Log => "log",
            RuleAction::Bypass => "bypass",
        }
    }
}

/// Security products a `bypass` rule skips
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Product {
    ZoneLockdown,
    UaBlock,
    Bic,
    Hot,
    SecurityLevel,
    RateLimit,
    Waf,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::ZoneLockdown => "zoneLockdown",
            Product::UaBlock => "uaBlock",
            Product::Bic => "bic",
            Product::Hot => "hot",
            Product::SecurityLevel => "securityLevel",
            Product::RateLimit => "rateLimit",
            Product::Waf => "waf",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleParameters {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ID of the filter the rule matches on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleObservation {
    /// Expression of the filter the rule is attached to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
}

managed_resource!(
    FirewallRule,
    RuleParameters,
    RuleObservation,
    "firewallrules.cloudflare.com",
    External<CloudflareClient>
);
