use async_trait::async_trait;

use crate::{
    Error, Result,
    cf_client::{self, CloudflareClient, FallbackOrigin},
};

use super::crd::{FallbackOriginObservation, FallbackOriginParameters};

/// Cloudflare error code for a zone without a fallback origin
const FALLBACK_ORIGIN_NOT_FOUND: u32 = 1551;

/// The fallback origin endpoints used by the fallback origin controller
#[async_trait]
pub trait FallbackOriginClient: Send + Sync {
    async fn fallback_origin(&self, zone_id: &str) -> cf_client::Result<FallbackOrigin>;
    /// Sets the origin, creating it when the zone has none
    async fn update_fallback_origin(&self, zone_id: &str, origin: &FallbackOrigin) -> cf_client::Result<FallbackOrigin>;
    async fn delete_fallback_origin(&self, zone_id: &str) -> cf_client::Result<()>;
}

#[async_trait]
impl FallbackOriginClient for CloudflareClient {
    async fn fallback_origin(&self, zone_id: &str) -> cf_client::Result<FallbackOrigin> {
        self.get(&format!("/zones/{zone_id}/custom_hostnames/fallback_origin"))
            .await
    }

    async fn update_fallback_origin(&self, zone_id: &str, origin: &FallbackOrigin) -> cf_client::Result<FallbackOrigin> {
        self.put(&format!("/zones/{zone_id}/custom_hostnames/fallback_origin"), origin)
            .await
    }

    async fn delete_fallback_origin(&self, zone_id: &str) -> cf_client::Result<()> {
        self.delete(&format!("/zones/{zone_id}/custom_hostnames/fallback_origin"))
            .await
    }
}

pub fn is_fallback_origin_not_found(err: &cf_client::Error) -> bool {
    err.is_not_found(&[FALLBACK_ORIGIN_NOT_FOUND])
}

pub fn generate_observation(fo: &FallbackOrigin) -> FallbackOriginObservation {
    FallbackOriginObservation {
        status: fo.status.clone(),
        errors: fo.errors.clone(),
    }
}

pub fn late_initialize(spec: Option<&mut FallbackOriginParameters>, fo: &FallbackOrigin) -> bool {
    let Some(spec) = spec else {
        return false;
    };
    if spec.origin.is_none() && fo.origin.is_some() {
        spec.origin = fo.origin.clone();
        return true;
    }
    false
}

pub fn up_to_date(spec: Option<&FallbackOriginParameters>, fo: &FallbackOrigin) -> bool {
    let Some(spec) = spec else {
        return true;
    };
    spec.origin.is_none() || spec.origin == fo.origin
}

async fn put_origin<C: FallbackOriginClient + ?Sized>(
    client: &C,
    spec: &FallbackOriginParameters,
    context: &'static str,
) -> Result<FallbackOrigin> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    let origin = spec.origin.clone().ok_or(Error::NoOrigin)?;
    client
        .update_fallback_origin(zone, &FallbackOrigin {
            origin: Some(origin),
            ..Default::default()
        })
        .await
        .map_err(|e| Error::cloudflare(context, e))
}

pub async fn create_fallback_origin<C: FallbackOriginClient + ?Sized>(
    client: &C,
    spec: &FallbackOriginParameters,
) -> Result<FallbackOrigin> {
    put_origin(client, spec, "cannot create fallback origin").await
}

pub async fn update_fallback_origin<C: FallbackOriginClient + ?Sized>(
    client: &C,
    spec: &FallbackOriginParameters,
) -> Result<()> {
    put_origin(client, spec, "cannot update fallback origin").await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn remote() -> FallbackOrigin {
        FallbackOrigin {
            origin: Some("fallback.example.com".into()),
            status: Some("active".into()),
            errors: vec![],
        }
    }

    #[test]
    fn missing_spec_is_up_to_date_and_never_late_initialized() {
        assert!(up_to_date(None, &remote()));
        assert!(!late_initialize(None, &remote()));
    }

    #[test]
    fn late_initialize_only_fills_unset_origin() {
        let mut spec = FallbackOriginParameters::default();
        assert!(late_initialize(Some(&mut spec), &remote()));
        assert_eq!(spec.origin.as_deref(), Some("fallback.example.com"));

        let mut spec = FallbackOriginParameters {
            origin: Some("mine.example.com".into()),
            zone: None,
        };
        assert!(!late_initialize(Some(&mut spec), &remote()));
        assert_eq!(spec.origin.as_deref(), Some("mine.example.com"));
        assert!(!up_to_date(Some(&spec), &remote()));
    }
}
