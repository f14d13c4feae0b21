use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, Result,
    managed::{ExternalClient, ExternalObservation, ManagedResource},
};

use super::{
    client::{
        ApplicationClient, create_application, generate_observation, is_application_not_found, late_initialize,
        up_to_date, update_application,
    },
    crd::SpectrumApplication,
};

/// Binds a [`SpectrumApplication`] to the Cloudflare Spectrum API
pub struct External<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> External<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ApplicationClient + ?Sized + 'static> ExternalClient<SpectrumApplication> for External<C> {
    async fn observe(&self, mg: &mut SpectrumApplication) -> Result<ExternalObservation> {
        let Some(id) = mg.external_name().map(str::to_string) else {
            return Ok(ExternalObservation::absent());
        };
        let zone = mg.spec.for_provider.zone.clone().ok_or(Error::NoZone)?;

        let app = match self.client.spectrum_application(&zone, &id).await {
            Ok(app) => app,
            Err(e) if is_application_not_found(&e) => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(Error::cloudflare("cannot get spectrum application", e)),
        };

        mg.set_observation(generate_observation(&app));
        let late_initialized = late_initialize(Some(&mut mg.spec.for_provider), &app);
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date(Some(&mg.spec.for_provider), &app),
            resource_late_initialized: late_initialized,
        })
    }

    async fn create(&self, mg: &mut SpectrumApplication) -> Result<()> {
        let app = create_application(self.client.as_ref(), &mg.spec.for_provider).await?;
        mg.set_external_name(&app.id);
        mg.set_observation(generate_observation(&app));
        Ok(())
    }

    async fn update(&self, mg: &mut SpectrumApplication) -> Result<()> {
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        update_application(self.client.as_ref(), id, &mg.spec.for_provider).await
    }

    async fn delete(&self, mg: &SpectrumApplication) -> Result<()> {
        let zone = mg.spec.for_provider.zone.as_deref().ok_or(Error::NoZone)?;
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        match self.client.delete_spectrum_application(zone, id).await {
            Err(e) if !is_application_not_found(&e) => {
                Err(Error::cloudflare("cannot delete spectrum application", e))
            }
            _ => Ok(()),
        }
    }
}
