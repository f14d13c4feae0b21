use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, Result,
    managed::{ExternalClient, ExternalObservation, ManagedResource},
};

use super::{
    client::{
        ZoneClient, create_zone, generate_observation, is_zone_not_found, late_initialize, load_settings,
        up_to_date, update_zone,
    },
    crd::Zone,
};

/// Binds a [`Zone`] to the Cloudflare zone API; the external name is the zone ID
pub struct External<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> External<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ZoneClient + ?Sized + 'static> ExternalClient<Zone> for External<C> {
    async fn observe(&self, mg: &mut Zone) -> Result<ExternalObservation> {
        let Some(id) = mg.external_name().map(str::to_string) else {
            return Ok(ExternalObservation::absent());
        };

        let zone = match self.client.zone_details(&id).await {
            Ok(zone) => zone,
            Err(e) if is_zone_not_found(&e) => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(Error::cloudflare("cannot get zone", e)),
        };
        let current = load_settings(self.client.as_ref(), &id).await?;

        mg.set_observation(generate_observation(&zone));
        let late_initialized = late_initialize(Some(&mut mg.spec.for_provider), &zone, &current);
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date(Some(&mg.spec.for_provider), &zone, &current),
            resource_late_initialized: late_initialized,
        })
    }

    async fn create(&self, mg: &mut Zone) -> Result<()> {
        let zone = create_zone(self.client.as_ref(), &mg.spec.for_provider).await?;
        mg.set_external_name(&zone.id);
        mg.set_observation(generate_observation(&zone));
        Ok(())
    }

    async fn update(&self, mg: &mut Zone) -> Result<()> {
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        update_zone(self.client.as_ref(), id, &mg.spec.for_provider).await
    }

    async fn delete(&self, mg: &Zone) -> Result<()> {
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        match self.client.delete_zone(id).await {
            Err(e) if !is_zone_not_found(&e) => Err(Error::cloudflare("cannot delete zone", e)),
            _ => Ok(()),
        }
    }
}
