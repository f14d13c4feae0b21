use async_trait::async_trait;

use crate::{
    Error, Result,
    cf_client::{self, CloudflareClient, WorkerRoute},
};

use super::crd::{RouteObservation, RouteParameters};

/// Cloudflare error code for an unknown worker route
const ROUTE_NOT_FOUND: u32 = 10005;

/// The Workers route endpoints used by the route controller
#[async_trait]
pub trait RouteClient: Send + Sync {
    async fn worker_route(&self, zone_id: &str, route_id: &str) -> cf_client::Result<WorkerRoute>;
    async fn create_worker_route(&self, zone_id: &str, route: &WorkerRoute) -> cf_client::Result<WorkerRoute>;
    async fn update_worker_route(
        &self,
        zone_id: &str,
        route_id: &str,
        route: &WorkerRoute,
    ) -> cf_client::Result<WorkerRoute>;
    async fn delete_worker_route(&self, zone_id: &str, route_id: &str) -> cf_client::Result<()>;
}

#[async_trait]
impl RouteClient for CloudflareClient {
    async fn worker_route(&self, zone_id: &str, route_id: &str) -> cf_client::Result<WorkerRoute> {
        self.get(&format!("/zones/{zone_id}/workers/routes/{route_id}"))
            .await
    }

    async fn create_worker_route(&self, zone_id: &str, route: &WorkerRoute) -> cf_client::Result<WorkerRoute> {
        self.post(&format!("/zones/{zone_id}/workers/routes"), route).await
    }

    async fn update_worker_route(
        &self,
        zone_id: &str,
        route_id: &str,
        route: &WorkerRoute,
    ) -> cf_client::Result<WorkerRoute> {
        self.put(&format!("/zones/{zone_id}/workers/routes/{route_id}"), route)
            .await
    }

    async fn delete_worker_route(&self, zone_id: &str, route_id: &str) -> cf_client::Result<()> {
        self.delete(&format!("/zones/{zone_id}/workers/routes/{route_id}"))
            .await
    }
}

pub fn is_route_not_found(err: &cf_client::Error) -> bool {
    err.is_not_found(&[ROUTE_NOT_FOUND])
}

pub fn generate_observation(_route: &WorkerRoute) -> RouteObservation {
    RouteObservation {}
}

pub fn late_initialize(spec: Option<&mut RouteParameters>, route: &WorkerRoute) -> bool {
    let Some(spec) = spec else {
        return false;
    };
    if spec.script.is_none() && route.script.is_some() {
        spec.script = route.script.clone();
        return true;
    }
    false
}

pub fn up_to_date(spec: Option<&RouteParameters>, route: &WorkerRoute) -> bool {
    let Some(spec) = spec else {
        return true;
    };
    spec.pattern == route.pattern && (spec.script.is_none() || spec.script == route.script)
}

fn request(spec: &RouteParameters) -> WorkerRoute {
    WorkerRoute {
        id: String::new(),
        pattern: spec.pattern.clone(),
        script: spec.script.clone(),
    }
}

pub async fn create_route<C: RouteClient + ?Sized>(client: &C, spec: &RouteParameters) -> Result<WorkerRoute> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    client
        .create_worker_route(zone, &request(spec))
        .await
        .map_err(|e| Error::cloudflare("cannot create worker route", e))
}

pub async fn update_route<C: RouteClient + ?Sized>(client: &C, route_id: &str, spec: &RouteParameters) -> Result<()> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    client
        .update_worker_route(zone, route_id, &request(spec))
        .await
        .map_err(|e| Error::cloudflare("cannot update worker route", e))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn remote() -> WorkerRoute {
        WorkerRoute {
            id: "route-1".into(),
            pattern: "example.com/api/*".into(),
            script: Some("api-worker".into()),
        }
    }

    fn params() -> RouteParameters {
        RouteParameters {
            pattern: "example.com/api/*".into(),
            script: None,
            zone: Some("zone-id".into()),
        }
    }

    #[test]
    fn missing_spec_is_up_to_date_and_never_late_initialized() {
        assert!(up_to_date(None, &remote()));
        assert!(!late_initialize(None, &remote()));
    }

    #[test]
    fn pattern_and_script_drift() {
        assert!(up_to_date(Some(&params()), &remote()));

        let mut spec = params();
        spec.pattern = "example.com/*".into();
        assert!(!up_to_date(Some(&spec), &remote()));

        let mut spec = params();
        spec.script = Some("other-worker".into());
        assert!(!up_to_date(Some(&spec), &remote()));
    }

    #[test]
    fn late_initialize_fills_script() {
        let mut spec = params();
        assert!(late_initialize(Some(&mut spec), &remote()));
        assert_eq!(spec.script.as_deref(), Some("api-worker"));
        assert!(!late_initialize(Some(&mut spec), &remote()));
    }
}
