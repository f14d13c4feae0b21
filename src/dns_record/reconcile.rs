use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, Result,
    managed::{ExternalClient, ExternalObservation, ManagedResource},
};

use super::{
    client::{RecordClient, create_record, generate_observation, is_record_not_found, late_initialize, up_to_date, update_record},
    crd::DNSRecord,
};

/// Binds a [`DNSRecord`] to the Cloudflare DNS API
pub struct External<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> External<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: RecordClient + ?Sized + 'static> ExternalClient<DNSRecord> for External<C> {
    async fn observe(&self, mg: &mut DNSRecord) -> Result<ExternalObservation> {
        // no external name means the record was never created
        let Some(id) = mg.external_name().map(str::to_string) else {
            return Ok(ExternalObservation::absent());
        };
        let zone = mg.spec.for_provider.zone.clone().ok_or(Error::NoZone)?;

        let record = match self.client.dns_record(&zone, &id).await {
            Ok(record) => record,
            Err(e) if is_record_not_found(&e) => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(Error::cloudflare("cannot get DNS record", e)),
        };

        mg.set_observation(generate_observation(&record));
        let late_initialized = late_initialize(Some(&mut mg.spec.for_provider), &record);
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date(Some(&mg.spec.for_provider), &record),
            resource_late_initialized: late_initialized,
        })
    }

    async fn create(&self, mg: &mut DNSRecord) -> Result<()> {
        let record = create_record(self.client.as_ref(), &mg.spec.for_provider).await?;
        mg.set_external_name(&record.id);
        mg.set_observation(generate_observation(&record));
        Ok(())
    }

    async fn update(&self, mg: &mut DNSRecord) -> Result<()> {
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        update_record(self.client.as_ref(), id, &mg.spec.for_provider).await
    }

    async fn delete(&self, mg: &DNSRecord) -> Result<()> {
        let zone = mg.spec.for_provider.zone.as_deref().ok_or(Error::NoZone)?;
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        match self.client.delete_dns_record(zone, id).await {
            Err(e) if !is_record_not_found(&e) => Err(Error::cloudflare("cannot delete DNS record", e)),
            _ => Ok(()),
        }
    }
}
