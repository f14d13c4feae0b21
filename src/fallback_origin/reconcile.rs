use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, Result,
    managed::{ExternalClient, ExternalObservation, ManagedResource},
};

use super::{
    client::{
        FallbackOriginClient, create_fallback_origin, generate_observation, is_fallback_origin_not_found,
        late_initialize, up_to_date, update_fallback_origin,
    },
    crd::FallbackOrigin,
};

/// Binds a [`FallbackOrigin`] to its zone's fallback origin; the external name is the zone ID
pub struct External<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> External<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: FallbackOriginClient + ?Sized + 'static> ExternalClient<FallbackOrigin> for External<C> {
    async fn observe(&self, mg: &mut FallbackOrigin) -> Result<ExternalObservation> {
        if mg.external_name().is_none() {
            return Ok(ExternalObservation::absent());
        }
        let zone = mg.spec.for_provider.zone.clone().ok_or(Error::NoZone)?;

        let fo = match self.client.fallback_origin(&zone).await {
            Ok(fo) if fo.origin.as_deref().is_some_and(|o| !o.is_empty()) => fo,
            Ok(_) => return Ok(ExternalObservation::absent()),
            Err(e) if is_fallback_origin_not_found(&e) => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(Error::cloudflare("cannot get fallback origin", e)),
        };

        mg.set_observation(generate_observation(&fo));
        let late_initialized = late_initialize(Some(&mut mg.spec.for_provider), &fo);
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date(Some(&mg.spec.for_provider), &fo),
            resource_late_initialized: late_initialized,
        })
    }

    async fn create(&self, mg: &mut FallbackOrigin) -> Result<()> {
        let fo = create_fallback_origin(self.client.as_ref(), &mg.spec.for_provider).await?;
        let zone = mg.spec.for_provider.zone.clone().ok_or(Error::NoZone)?;
        mg.set_external_name(&zone);
        mg.set_observation(generate_observation(&fo));
        Ok(())
    }

    async fn update(&self, mg: &mut FallbackOrigin) -> Result<()> {
        mg.external_name().ok_or(Error::NotCreated)?;
        update_fallback_origin(self.client.as_ref(), &mg.spec.for_provider).await
    }

    async fn delete(&self, mg: &FallbackOrigin) -> Result<()> {
        let zone = mg.spec.for_provider.zone.as_deref().ok_or(Error::NoZone)?;
        mg.external_name().ok_or(Error::NotCreated)?;
        match self.client.delete_fallback_origin(zone).await {
            Err(e) if !is_fallback_origin_not_found(&e) => Err(Error::cloudflare("cannot delete fallback origin", e)),
            _ => Ok(()),
        }
    }
}
