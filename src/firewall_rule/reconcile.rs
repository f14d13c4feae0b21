use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, Result,
    managed::{ExternalClient, ExternalObservation, ManagedResource},
};

use super::{
    client::{RuleClient, create_rule, generate_observation, is_rule_not_found, late_initialize, up_to_date, update_rule},
    crd::FirewallRule,
};

/// Binds a [`FirewallRule`] to the Cloudflare firewall rule API
pub struct External<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> External<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: RuleClient + ?Sized + 'static> ExternalClient<FirewallRule> for External<C> {
    async fn observe(&self, mg: &mut FirewallRule) -> Result<ExternalObservation> {
        let Some(id) = mg.external_name().map(str::to_string) else {
            return Ok(ExternalObservation::absent());
        };
        let zone = mg.spec.for_provider.zone.clone().ok_or(Error::NoZone)?;

        let rule = match self.client.firewall_rule(&zone, &id).await {
            Ok(rule) => rule,
            Err(e) if is_rule_not_found(&e) => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(Error::cloudflare("cannot get firewall rule", e)),
        };

        mg.set_observation(generate_observation(&rule));
        let late_initialized = late_initialize(Some(&mut mg.spec.for_provider), &rule);
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date(Some(&mg.spec.for_provider), &rule),
            resource_late_initialized: late_initialized,
        })
    }

    async fn create(&self, mg: &mut FirewallRule) -> Result<()> {
        let rule = create_rule(self.client.as_ref(), &mg.spec.for_provider).await?;
        mg.set_external_name(&rule.id);
        mg.set_observation(generate_observation(&rule));
        Ok(())
    }

    async fn update(&self, mg: &mut FirewallRule) -> Result<()> {
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        update_rule(self.client.as_ref(), id, &mg.spec.for_provider).await
    }

    async fn delete(&self, mg: &FirewallRule) -> Result<()> {
        let zone = mg.spec.for_provider.zone.as_deref().ok_or(Error::NoZone)?;
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        match self.client.delete_firewall_rule(zone, id).await {
            Err(e) if !is_rule_not_found(&e) => Err(Error::cloudflare("cannot delete firewall rule", e)),
            _ => Ok(()),
        }
    }
}
