use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, Result,
    managed::{ExternalClient, ExternalObservation, ManagedResource},
};

use super::{
    client::{
        CustomHostnameClient, create_custom_hostname, generate_observation, is_custom_hostname_not_found,
        late_initialize, up_to_date, update_custom_hostname,
    },
    crd::CustomHostname,
};

/// Binds a [`CustomHostname`] to the Cloudflare for SaaS API
pub struct External<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> External<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: CustomHostnameClient + ?Sized + 'static> ExternalClient<CustomHostname> for External<C> {
    async fn observe(&self, mg: &mut CustomHostname) -> Result<ExternalObservation> {
        let Some(id) = mg.external_name().map(str::to_string) else {
            return Ok(ExternalObservation::absent());
        };
        let zone = mg.spec.for_provider.zone.clone().ok_or(Error::NoZone)?;

        let ch = match self.client.custom_hostname(&zone, &id).await {
            Ok(ch) => ch,
            Err(e) if is_custom_hostname_not_found(&e) => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(Error::cloudflare("cannot get custom hostname", e)),
        };

        mg.set_observation(generate_observation(&ch));
        let late_initialized = late_initialize(Some(&mut mg.spec.for_provider), &ch);
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date(Some(&mg.spec.for_provider), &ch),
            resource_late_initialized: late_initialized,
        })
    }

    async fn create(&self, mg: &mut CustomHostname) -> Result<()> {
        let ch = create_custom_hostname(self.client.as_ref(), &mg.spec.for_provider).await?;
        mg.set_external_name(&ch.id);
        mg.set_observation(generate_observation(&ch));
        Ok(())
    }

    async fn update(&self, mg: &mut CustomHostname) -> Result<()> {
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        update_custom_hostname(self.client.as_ref(), id, &mg.spec.for_provider).await
    }

    async fn delete(&self, mg: &CustomHostname) -> Result<()> {
        let zone = mg.spec.for_provider.zone.as_deref().ok_or(Error::NoZone)?;
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        match self.client.delete_custom_hostname(zone, id).await {
            Err(e) if !is_custom_hostname_not_found(&e) => Err(Error::cloudflare("cannot delete custom hostname", e)),
            _ => Ok(()),
        }
    }
}
