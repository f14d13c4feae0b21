use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{
    Error, Result,
    cf_client::{self, CloudflareClient, FilterRef, FirewallRule},
};

use super::crd::{Product, RuleObservation, RuleParameters};

/// Cloudflare error code for an unknown firewall rule
const RULE_NOT_FOUND: u32 = 10007;

/// The firewall rule endpoints used by the rule controller
#[async_trait]
pub trait RuleClient: Send + Sync {
    async fn firewall_rule(&self, zone_id: &str, rule_id: &str) -> cf_client::Result<FirewallRule>;
    /// Batch create, one result per rule sent
    async fn create_firewall_rules(
        &self,
        zone_id: &str,
        rules: &[FirewallRule],
    ) -> cf_client::Result<Vec<FirewallRule>>;
    async fn update_firewall_rule(
        &self,
        zone_id: &str,
        rule_id: &str,
        rule: &FirewallRule,
    ) -> cf_client::Result<FirewallRule>;
    async fn delete_firewall_rule(&self, zone_id: &str, rule_id: &str) -> cf_client::Result<()>;
}

#[async_trait]
impl RuleClient for CloudflareClient {
    async fn firewall_rule(&self, zone_id: &str, rule_id: &str) -> cf_client::Result<FirewallRule> {
        self.get(&format!("/zones/{zone_id}/firewall/rules/{rule_id}"))
            .await
    }

    async fn create_firewall_rules(
        &self,
        zone_id: &str,
        rules: &[FirewallRule],
    ) -> cf_client::Result<Vec<FirewallRule>> {
        self.post(&format!("/zones/{zone_id}/firewall/rules"), rules).await
    }

    async fn update_firewall_rule(
        &self,
        zone_id: &str,
        rule_id: &str,
        rule: &FirewallRule,
    ) -> cf_client::Result<FirewallRule> {
        self.put(&format!("/zones/{zone_id}/firewall/rules/{rule_id}"), rule)
            .await
    }

    async fn delete_firewall_rule(&self, zone_id: &str, rule_id: &str) -> cf_client::Result<()> {
        self.delete(&format!("/zones/{zone_id}/firewall/rules/{rule_id}"))
            .await
    }
}

pub fn is_rule_not_found(err: &cf_client::Error) -> bool {
    err.is_not_found(&[RULE_NOT_FOUND])
}

pub fn generate_observation(rule: &FirewallRule) -> RuleObservation {
    RuleObservation {
        filter_expression: Some(rule.filter.expression.clone()).filter(|e| !e.is_empty()),
    }
}

pub fn late_initialize(spec: Option<&mut RuleParameters>, rule: &FirewallRule) -> bool {
    let Some(spec) = spec else {
        return false;
    };
    let mut changed = false;
    if spec.bypass_products.is_none() && !rule.products.is_empty() {
        spec.bypass_products = Some(rule.products.iter().filter_map(|p| Product::parse(p)).collect());
        changed = true;
    }
    if spec.description.is_none() && !rule.description.is_empty() {
        spec.description = Some(rule.description.clone());
        changed = true;
    }
    if spec.filter.is_none() && !rule.filter.id.is_empty() {
        spec.filter = Some(rule.filter.id.clone());
        changed = true;
    }
    if spec.paused.is_none() {
        spec.paused = Some(rule.paused);
        changed = true;
    }
    if spec.priority.is_none() && rule.priority.is_some() {
        spec.priority = rule.priority;
        changed = true;
    }
    changed
}

/// Products this provider does not model are left to the remote side.
fn unknown_product(product: &str) -> bool {
    Product::parse(product).is_none()
}

fn same_products(wanted: &[Product], have: &[String]) -> bool {
    let wanted: BTreeSet<&str> = wanted.iter().map(Product::as_str).collect();
    let have: BTreeSet<&str> = have.iter().map(String::as_str).filter(|p| !unknown_product(p)).collect();
    wanted == have
}

pub fn up_to_date(spec: Option<&RuleParameters>, rule: &FirewallRule) -> bool {
    let Some(spec) = spec else {
        return true;
    };
    spec.action.as_str() == rule.action
        && spec
            .bypass_products
            .as_ref()
            .is_none_or(|p| same_products(p, &rule.products))
        && spec.description.as_ref().is_none_or(|d| *d == rule.description)
        && spec.filter.as_ref().is_none_or(|f| *f == rule.filter.id)
        && spec.paused.is_none_or(|p| p == rule.paused)
        && (spec.priority.is_none() || spec.priority == rule.priority)
}

/// Apply the set parameters on top of a rule
fn merge(spec: &RuleParameters, mut rule: FirewallRule) -> FirewallRule {
    rule.action = spec.action.as_str().to_string();
    if let Some(products) = &spec.bypass_products {
        let unknown = rule.products.into_iter().filter(|p| unknown_product(p));
        rule.products = products.iter().map(|p| p.as_str().to_string()).chain(unknown).collect();
    }
    if let Some(description) = &spec.description {
        rule.description = description.clone();
    }
    if let Some(filter) = &spec.filter {
        rule.filter = FilterRef {
            id: filter.clone(),
            expression: String::new(),
        };
    }
    if let Some(paused) = spec.paused {
        rule.paused = paused;
    }
    if spec.priority.is_some() {
        rule.priority = spec.priority;
    }
    rule
}

/// Create one rule through the batch endpoint; anything but exactly one result is an error.
pub async fn create_rule<C: RuleClient + ?Sized>(client: &C, spec: &RuleParameters) -> Result<FirewallRule> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    if spec.filter.is_none() {
        return Err(Error::NoFilter);
    }
    let mut created = client
        .create_firewall_rules(zone, &[merge(spec, FirewallRule::default())])
        .await
        .map_err(|e| Error::cloudflare("cannot create firewall rule", e))?;
    if created.len() != 1 {
        return Err(Error::RuleCreateCount(created.len()));
    }
    Ok(created.remove(0))
}

/// Read the current rule, apply the set parameters and write it back
pub async fn update_rule<C: RuleClient + ?Sized>(client: &C, rule_id: &str, spec: &RuleParameters) -> Result<()> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    let current = client
        .firewall_rule(zone, rule_id)
        .await
        .map_err(|e| Error::cloudflare("cannot get firewall rule", e))?;
    client
        .update_firewall_rule(zone, rule_id, &merge(spec, current))
        .await
        .map_err(|e| Error::cloudflare("cannot update firewall rule", e))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::firewall_rule::RuleAction;

    fn remote() -> FirewallRule {
        FirewallRule {
            id: "r-1".into(),
            paused: false,
            description: String::new(),
            action: "bypass".into(),
            priority: Some(10),
            filter: FilterRef {
                id: "f-1".into(),
                expression: "ip.src eq 192.0.2.1".into(),
            },
            products: vec!["waf".into(), "zoneLockdown".into()],
        }
    }

    fn params() -> RuleParameters {
        RuleParameters {
            action: RuleAction::Bypass,
            bypass_products: Some(vec![Product::ZoneLockdown, Product::Waf]),
            filter: Some("f-1".into()),
            zone: Some("zone-id".into()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_spec_is_up_to_date_and_never_late_initialized() {
        assert!(up_to_date(None, &remote()));
        assert!(!late_initialize(None, &remote()));
    }

    #[test]
    fn products_compare_as_a_set() {
        assert!(up_to_date(Some(&params()), &remote()));
        let mut spec = params();
        spec.bypass_products = Some(vec![Product::Waf]);
        assert!(!up_to_date(Some(&spec), &remote()));
    }

    #[test]
    fn action_and_priority_drift() {
        let mut spec = params();
        spec.action = RuleAction::Block;
        assert!(!up_to_date(Some(&spec), &remote()));

        let mut spec = params();
        spec.priority = Some(1);
        assert!(!up_to_date(Some(&spec), &remote()));
    }

    #[test]
    fn late_initialize_fills_unset_fields() {
        let mut spec = RuleParameters {
            action: RuleAction::Bypass,
            ..Default::default()
        };
        assert!(late_initialize(Some(&mut spec), &remote()));
        assert_eq!(spec.filter.as_deref(), Some("f-1"));
        assert_eq!(spec.priority, Some(10));
        assert_eq!(spec.bypass_products, Some(vec![Product::Waf, Product::ZoneLockdown]));
        assert_eq!(spec.description, None);
        assert!(!late_initialize(Some(&mut spec), &remote()));
    }

    #[test]
    fn unmodelled_remote_products_are_kept_and_ignored() {
        let mut rule = remote();
        rule.products = vec!["waf".into(), "newProduct".into()];
        let mut spec = RuleParameters {
            action: RuleAction::Bypass,
            ..Default::default()
        };
        assert!(late_initialize(Some(&mut spec), &rule));
        assert_eq!(spec.bypass_products, Some(vec![Product::Waf]));
        assert!(up_to_date(Some(&spec), &rule));

        spec.bypass_products = Some(vec![Product::Waf, Product::ZoneLockdown]);
        assert!(!up_to_date(Some(&spec), &rule));
        let merged = merge(&spec, rule);
        assert_eq!(merged.products, vec!["waf", "zoneLockdown", "newProduct"]);
        assert!(up_to_date(Some(&spec), &merged));
    }

    #[test]
    fn observation_carries_filter_expression() {
        assert_eq!(
            generate_observation(&remote()).filter_expression.as_deref(),
            Some("ip.src eq 192.0.2.1")
        );
    }
}
