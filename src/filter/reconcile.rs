use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, Result,
    managed::{ExternalClient, ExternalObservation, ManagedResource},
};

use super::{
    client::{FilterClient, create_filter, generate_observation, is_filter_not_found, late_initialize, up_to_date, update_filter},
    crd::Filter,
};

/// Binds a [`Filter`] to the Cloudflare firewall filter API
pub struct External<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> External<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: FilterClient + ?Sized + 'static> ExternalClient<Filter> for External<C> {
    async fn observe(&self, mg: &mut Filter) -> Result<ExternalObservation> {
        let Some(id) = mg.external_name().map(str::to_string) else {
            return Ok(ExternalObservation::absent());
        };
        let zone = mg.spec.for_provider.zone.clone().ok_or(Error::NoZone)?;

        let filter = match self.client.filter(&zone, &id).await {
            Ok(filter) => filter,
            Err(e) if is_filter_not_found(&e) => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(Error::cloudflare("cannot get filter", e)),
        };

        mg.set_observation(generate_observation(&filter));
        let late_initialized = late_initialize(Some(&mut mg.spec.for_provider), &filter);
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date(Some(&mg.spec.for_provider), &filter),
            resource_late_initialized: late_initialized,
        })
    }

    async fn create(&self, mg: &mut Filter) -> Result<()> {
        let filter = create_filter(self.client.as_ref(), &mg.spec.for_provider).await?;
        mg.set_external_name(&filter.id);
        mg.set_observation(generate_observation(&filter));
        Ok(())
    }

    async fn update(&self, mg: &mut Filter) -> Result<()> {
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        update_filter(self.client.as_ref(), id, &mg.spec.for_provider).await
    }

    async fn delete(&self, mg: &Filter) -> Result<()> {
        let zone = mg.spec.for_provider.zone.as_deref().ok_or(Error::NoZone)?;
        let id = mg.external_name().ok_or(Error::NotCreated)?;
        match self.client.delete_filter(zone, id).await {
            Err(e) if !is_filter_not_found(&e) => Err(Error::cloudflare("cannot delete filter", e)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        cf_client::{self, ResponseInfo},
        filter::{FilterParameters, FilterSpec},
    };
    use std::sync::Mutex;

    /// Returns `batch` copies of the sent filter on create
    struct MockFilters {
        remote: Mutex<Option<cf_client::Filter>>,
        written: Mutex<Vec<cf_client::Filter>>,
        batch: usize,
        calls: Mutex<usize>,
    }

    fn mock(remote: Option<cf_client::Filter>, batch: usize) -> Arc<MockFilters> {
        Arc::new(MockFilters {
            remote: Mutex::new(remote),
            written: Mutex::new(vec![]),
            batch,
            calls: Mutex::new(0),
        })
    }

    fn not_found() -> cf_client::Error {
        cf_client::Error::Api {
            status: 404,
            errors: vec![ResponseInfo {
                code: 10007,
                message: "not found".into(),
            }],
        }
    }

    #[async_trait]
    impl FilterClient for MockFilters {
        async fn filter(&self, _zone: &str, _id: &str) -> cf_client::Result<cf_client::Filter> {
            *self.calls.lock().unwrap() += 1;
            self.remote.lock().unwrap().clone().ok_or_else(not_found)
        }

        async fn create_filters(
            &self,
            _zone: &str,
            filters: &[cf_client::Filter],
        ) -> cf_client::Result<Vec<cf_client::Filter>> {
            *self.calls.lock().unwrap() += 1;
            let created = cf_client::Filter {
                id: "f-new".into(),
                ..filters[0].clone()
            };
            Ok(vec![created; self.batch])
        }

        async fn update_filter(
            &self,
            _zone: &str,
            _id: &str,
            filter: &cf_client::Filter,
        ) -> cf_client::Result<cf_client::Filter> {
            *self.calls.lock().unwrap() += 1;
            self.written.lock().unwrap().push(filter.clone());
            Ok(filter.clone())
        }

        async fn delete_filter(&self, _zone: &str, _id: &str) -> cf_client::Result<()> {
            *self.calls.lock().unwrap() += 1;
            Err(not_found())
        }
    }

    fn doc(external_name: Option<&str>) -> Filter {
        let mut filter = Filter::new("block", FilterSpec {
            for_provider: FilterParameters {
                expression: "ip.src eq 192.0.2.1".into(),
                description: None,
                paused: Some(true),
                zone: Some("zone-id".into()),
            },
            ..Default::default()
        });
        if let Some(name) = external_name {
            filter.set_external_name(name);
        }
        filter
    }

    fn remote() -> cf_client::Filter {
        cf_client::Filter {
            id: "f-1".into(),
            expression: "ip.src eq 192.0.2.1".into(),
            paused: false,
            description: "from the dashboard".into(),
            reference: "FIL-1".into(),
        }
    }

    #[tokio::test]
    async fn observe_without_external_name_makes_no_calls() {
        let client = mock(Some(remote()), 1);
        let obs = External::new(client.clone()).observe(&mut doc(None)).await.unwrap();
        assert!(!obs.resource_exists);
        assert_eq!(*client.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn observe_missing_filter_is_absent() {
        let obs = External::new(mock(None, 1))
            .observe(&mut doc(Some("f-1")))
            .await
            .unwrap();
        assert!(!obs.resource_exists);
    }

    #[tokio::test]
    async fn observe_detects_drift_and_late_initializes() {
        let mut filter = doc(Some("f-1"));
        let obs = External::new(mock(Some(remote()), 1))
            .observe(&mut filter)
            .await
            .unwrap();
        assert!(obs.resource_exists);
        assert!(!obs.resource_up_to_date);
        assert!(obs.resource_late_initialized);
        assert_eq!(filter.spec.for_provider.description.as_deref(), Some("from the dashboard"));
    }

    #[tokio::test]
    async fn create_single_filter() {
        let mut filter = doc(None);
        External::new(mock(None, 1)).create(&mut filter).await.unwrap();
        assert_eq!(filter.external_name(), Some("f-new"));
    }

    #[tokio::test]
    async fn create_with_unexpected_result_count_fails() {
        for batch in [0, 2] {
            let mut filter = doc(None);
            let err = External::new(mock(None, batch))
                .create(&mut filter)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::FilterCreateCount(n) if n == batch));
            assert_eq!(filter.external_name(), None);
        }
    }

    #[tokio::test]
    async fn update_merges_onto_current_filter() {
        let client = mock(Some(remote()), 1);
        External::new(client.clone())
            .update(&mut doc(Some("f-1")))
            .await
            .unwrap();
        let written = client.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].paused);
        assert_eq!(written[0].description, "from the dashboard");
        assert_eq!(written[0].reference, "FIL-1");
    }

    #[tokio::test]
    async fn delete_of_missing_filter_succeeds() {
        External::new(mock(None, 1)).delete(&doc(Some("f-1"))).await.unwrap();
    }
}
