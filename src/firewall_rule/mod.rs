//! Firewall rules, an action applied to requests matching a filter.

mod client;
mod crd;
mod reconcile;

pub use client::{
    RuleClient, create_rule, generate_observation, is_rule_not_found, late_initialize, up_to_date, update_rule,
};
pub use crd::{FirewallRule, FirewallRuleSpec, Product, RuleAction, RuleObservation, RuleParameters, RuleStatus};
pub use reconcile::External;
