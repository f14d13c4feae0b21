use async_trait::async_trait;

use crate::{
    Error, Result,
    cf_client::{self, CloudflareClient, Filter},
};

use super::crd::{FilterObservation, FilterParameters};

/// Cloudflare error code for an unknown filter
const FILTER_NOT_FOUND: u32 = 10007;

/// The firewall filter endpoints used by the filter controller
#[async_trait]
pub trait FilterClient: Send + Sync {
    async fn filter(&self, zone_id: &str, filter_id: &str) -> cf_client::Result<Filter>;
    /// Batch create, one result per filter sent
    async fn create_filters(&self, zone_id: &str, filters: &[Filter]) -> cf_client::Result<Vec<Filter>>;
    async fn update_filter(&self, zone_id: &str, filter_id: &str, filter: &Filter) -> cf_client::Result<Filter>;
    async fn delete_filter(&self, zone_id: &str, filter_id: &str) -> cf_client::Result<()>;
}

#[async_trait]
impl FilterClient for CloudflareClient {
    async fn filter(&self, zone_id: &str, filter_id: &str) -> cf_client::Result<Filter> {
        self.get(&format!("/zones/{zone_id}/filters/{filter_id}")).await
    }

    async fn create_filters(&self, zone_id: &str, filters: &[Filter]) -> cf_client::Result<Vec<Filter>> {
        self.post(&format!("/zones/{zone_id}/filters"), filters).await
    }

    async fn update_filter(&self, zone_id: &str, filter_id: &str, filter: &Filter) -> cf_client::Result<Filter> {
        self.put(&format!("/zones/{zone_id}/filters/{filter_id}"), filter)
            .await
    }

    async fn delete_filter(&self, zone_id: &str, filter_id: &str) -> cf_client::Result<()> {
        self.delete(&format!("/zones/{zone_id}/filters/{filter_id}"))
            .await
    }
}

pub fn is_filter_not_found(err: &cf_client::Error) -> bool {
    err.is_not_found(&[FILTER_NOT_FOUND])
}

pub fn generate_observation(filter: &Filter) -> FilterObservation {
    FilterObservation {
        reference: Some(filter.reference.clone()).filter(|r| !r.is_empty()),
    }
}

pub fn late_initialize(spec: Option<&mut FilterParameters>, filter: &Filter) -> bool {
    let Some(spec) = spec else {
        return false;
    };
    let mut changed = false;
    if spec.description.is_none() && !filter.description.is_empty() {
        spec.description = Some(filter.description.clone());
        changed = true;
    }
    if spec.paused.is_none() {
        spec.paused = Some(filter.paused);
        changed = true;
    }
    changed
}

pub fn up_to_date(spec: Option<&FilterParameters>, filter: &Filter) -> bool {
    let Some(spec) = spec else {
        return true;
    };
    spec.expression == filter.expression
        && spec.description.as_ref().is_none_or(|d| *d == filter.description)
        && spec.paused.is_none_or(|p| p == filter.paused)
}

/// Apply the set parameters on top of a filter
fn merge(spec: &FilterParameters, mut filter: Filter) -> Filter {
    filter.expression = spec.expression.clone();
    if let Some(description) = &spec.description {
        filter.description = description.clone();
    }
    if let Some(paused) = spec.paused {
        filter.paused = paused;
    }
    filter
}

/// Create one filter through the batch endpoint; anything but exactly one result is an error.
pub async fn create_filter<C: FilterClient + ?Sized>(client: &C, spec: &FilterParameters) -> Result<Filter> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    let mut created = client
        .create_filters(zone, &[merge(spec, Filter::default())])
        .await
        .map_err(|e| Error::cloudflare("cannot create filter", e))?;
    if created.len() != 1 {
        return Err(Error::FilterCreateCount(created.len()));
    }
    Ok(created.remove(0))
}

/// Read the current filter, apply the set parameters and write it back
pub async fn update_filter<C: FilterClient + ?Sized>(
    client: &C,
    filter_id: &str,
    spec: &FilterParameters,
) -> Result<()> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    let current = client
        .filter(zone, filter_id)
        .await
        .map_err(|e| Error::cloudflare("cannot get filter", e))?;
    client
        .update_filter(zone, filter_id, &merge(spec, current))
        .await
        .map_err(|e| Error::cloudflare("cannot update filter", e))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn remote() -> Filter {
        Filter {
            id: "f-1".into(),
            expression: "ip.src eq 192.0.2.1".into(),
            paused: false,
            description: "block bad host".into(),
            reference: "FIL-1".into(),
        }
    }

    fn params() -> FilterParameters {
        FilterParameters {
            expression: "ip.src eq 192.0.2.1".into(),
            description: None,
            paused: None,
            zone: Some("zone-id".into()),
        }
    }

    #[test]
    fn missing_spec_is_up_to_date_and_never_late_initialized() {
        assert!(up_to_date(None, &remote()));
        assert!(!late_initialize(None, &remote()));
    }

    #[test]
    fn drift_on_set_fields_only() {
        assert!(up_to_date(Some(&params()), &remote()));

        let mut spec = params();
        spec.paused = Some(true);
        assert!(!up_to_date(Some(&spec), &remote()));

        let mut spec = params();
        spec.expression = "ip.src eq 192.0.2.2".into();
        assert!(!up_to_date(Some(&spec), &remote()));
    }

    #[test]
    fn late_initialize_keeps_user_values() {
        let mut spec = params();
        spec.description = Some("mine".into());
        assert!(late_initialize(Some(&mut spec), &remote()));
        assert_eq!(spec.description.as_deref(), Some("mine"));
        assert_eq!(spec.paused, Some(false));
        assert!(!late_initialize(Some(&mut spec), &remote()));
    }

    #[test]
    fn merge_keeps_unmodelled_remote_fields() {
        let mut spec = params();
        spec.paused = Some(true);
        let merged = merge(&spec, remote());
        assert_eq!(merged.reference, "FIL-1");
        assert_eq!(merged.description, "block bad host");
        assert!(merged.paused);
    }

    #[test]
    fn observation_hides_empty_ref() {
        let mut filter = remote();
        assert_eq!(generate_observation(&filter).reference.as_deref(), Some("FIL-1"));
        filter.reference.clear();
        assert_eq!(generate_observation(&filter).reference, None);
    }
}
