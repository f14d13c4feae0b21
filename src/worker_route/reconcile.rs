use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, Result,
    managed::{ExternalClient, ExternalObservation, ManagedResource},
};

use super::{
    client::{RouteClient, create_route, generate_observation, is_route_not_found, late_initialize, up_to_date, update_route},
    crd::WorkerRoute,
};

/// Binds a [`WorkerRoute`] to the Cloudflare Workers routes API
pub struct External<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> External<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: RouteClient + ?Sized + 'static> ExternalClient<WorkerRoute> for External<C> {
    async fn observe(&self, mg: &mut WorkerRoute) -> Result<ExternalObservation> {
        let Some(id) = mg.external_name().map(str::to_string) else {
            return Ok(ExternalObservation::absent());
        };
        let zone = mg.spec.for_provider.zone.clone().ok_or(Error::NoZone)?;

        let route = match self.client.worker_route(&zone, &id).await {
            Ok(route) => route,
            Err(e) if is_route_not_found(&e) => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(Error::cloudflare("cannot get worker route", e)),
        };

        mg.set_observation(generate_observation(&route));
        let late_initialized = late_initialize(Some(&mut mg.spec.for_provider), &route);
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date(Some(&mg.spec.for_provider), &route),
            resource_late_initialized: late_initialized,
        })
    }

    async fn create(&self, mg: &mut WorkerRoute) -> Result<()> {
        let route = create_route(self.client.as_ref(), &mg.spec.for_provider).await?;
        mg.set_external_name(&route.id);
        mg.set_observation(generate_observation(&route));
        Ok(())
    }

    async fn update(&self, mg: &mut WorkerRoute) -> Result<()> {
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        update_route(self.client.as_ref(), id, &mg.spec.for_provider).await
    }

    async fn delete(&self, mg: &WorkerRoute) -> Result<()> {
        let zone = mg.spec.for_provider.zone.as_deref().ok_or(Error::NoZone)?;
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        match self.client.delete_worker_route(zone, id).await {
            Err(e) if !is_route_not_found(&e) => Err(Error::cloudflare("cannot delete worker route", e)),
            _ => Ok(()),
        }
    }
}
