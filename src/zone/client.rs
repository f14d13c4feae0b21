use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    Error, Result,
    cf_client::{
        self, AccountRef, CloudflareClient, CreateZone, EditZone, EditZoneSettings, PlanRef, Zone, ZoneSetting,
    },
};

use super::{
    crd::{ZoneObservation, ZoneParameters, ZoneType},
    settings::{
        ZoneSettingsMap, get_changed_settings, late_initialize_settings, settings_map_to_zone, settings_to_map,
        zone_to_settings_map,
    },
};

/// Cloudflare error codes for an unknown or invalid zone identifier
const ZONE_NOT_FOUND: &[u32] = &[1001, 7003];

/// The zone endpoints used by the zone controller
#[async_trait]
pub trait ZoneClient: Send + Sync {
    async fn zone_details(&self, zone_id: &str) -> cf_client::Result<Zone>;
    async fn create_zone(&self, zone: &CreateZone) -> cf_client::Result<Zone>;
    async fn edit_zone(&self, zone_id: &str, edit: &EditZone) -> cf_client::Result<Zone>;
    async fn delete_zone(&self, zone_id: &str) -> cf_client::Result<()>;
    async fn zone_settings(&self, zone_id: &str) -> cf_client::Result<Vec<ZoneSetting>>;
    async fn update_zone_settings(
        &self,
        zone_id: &str,
        settings: &EditZoneSettings,
    ) -> cf_client::Result<Vec<ZoneSetting>>;
}

#[async_trait]
impl ZoneClient for CloudflareClient {
    async fn zone_details(&self, zone_id: &str) -> cf_client::Result<Zone> {
        self.get(&format!("/zones/{zone_id}")).await
    }

    async fn create_zone(&self, zone: &CreateZone) -> cf_client::Result<Zone> {
        self.post("/zones", zone).await
    }

    async fn edit_zone(&self, zone_id: &str, edit: &EditZone) -> cf_client::Result<Zone> {
        self.patch(&format!("/zones/{zone_id}"), edit).await
    }

    async fn delete_zone(&self, zone_id: &str) -> cf_client::Result<()> {
        self.delete(&format!("/zones/{zone_id}")).await
    }

    async fn zone_settings(&self, zone_id: &str) -> cf_client::Result<Vec<ZoneSetting>> {
        self.get(&format!("/zones/{zone_id}/settings")).await
    }

    async fn update_zone_settings(
        &self,
        zone_id: &str,
        settings: &EditZoneSettings,
    ) -> cf_client::Result<Vec<ZoneSetting>> {
        self.patch(&format!("/zones/{zone_id}/settings"), settings).await
    }
}

pub fn is_zone_not_found(err: &cf_client::Error) -> bool {
    err.is_not_found(ZONE_NOT_FOUND)
}

pub fn generate_observation(zone: &Zone) -> ZoneObservation {
    ZoneObservation {
        account_id: zone.account.as_ref().map(|a| a.id.clone()),
        account_name: zone.account.as_ref().and_then(|a| a.name.clone()),
        development_mode: zone.development_mode,
        name_servers: zone.name_servers.clone(),
        original_name_servers: zone.original_name_servers.clone().unwrap_or_default(),
        original_registrar: zone.original_registrar.clone(),
        original_dns_host: zone.original_dnshost.clone(),
        plan: zone.plan.as_ref().map(|p| p.id.clone()),
        plan_pending: zone.plan_pending.as_ref().map(|p| p.id.clone()),
        status: zone.status.clone(),
        paused: zone.paused,
        zone_type: zone.zone_type.clone(),
    }
}

/// Fill unset parameters, settings included, from the remote zone.
pub fn late_initialize(spec: Option<&mut ZoneParameters>, zone: &Zone, current: &ZoneSettingsMap) -> bool {
    let Some(spec) = spec else {
        return false;
    };
    let mut changed = false;
    if spec.account_id.is_none() {
        if let Some(account) = &zone.account {
            spec.account_id = Some(account.id.clone());
            changed = true;
        }
    }
    if spec.paused.is_none() {
        spec.paused = Some(zone.paused);
        changed = true;
    }
    if spec.plan_id.is_none() {
        if let Some(plan) = &zone.plan {
            spec.plan_id = Some(plan.id.clone());
            changed = true;
        }
    }
    if spec.zone_type.is_none() {
        if let Some(t) = zone.zone_type.as_deref().and_then(ZoneType::parse) {
            spec.zone_type = Some(t);
            changed = true;
        }
    }
    if spec.vanity_name_servers.is_none() {
        if let Some(ns) = &zone.vanity_name_servers {
            spec.vanity_name_servers = Some(ns.clone());
            changed = true;
        }
    }

    let mut desired = zone_to_settings_map(&spec.settings);
    if late_initialize_settings(current, &mut desired) {
        // only settings the structured object can hold count as initialized
        let merged = settings_map_to_zone(&desired);
        if merged != spec.settings {
            spec.settings = merged;
            changed = true;
        }
    }
    changed
}

/// Plan the zone is on, or will be on once a pending change applies
fn effective_plan(zone: &Zone) -> Option<&str> {
    zone.plan_pending
        .as_ref()
        .or(zone.plan.as_ref())
        .map(|p| p.id.as_str())
}

fn same_name_servers(wanted: &[String], have: Option<&Vec<String>>) -> bool {
    let wanted: BTreeSet<&str> = wanted.iter().map(String::as_str).collect();
    let have: BTreeSet<&str> = have.into_iter().flatten().map(String::as_str).collect();
    wanted == have
}

/// Whether every parameter the user set matches the remote zone and its settings
pub fn up_to_date(spec: Option<&ZoneParameters>, zone: &Zone, current: &ZoneSettingsMap) -> bool {
    let Some(spec) = spec else {
        return true;
    };
    if spec.paused.is_some_and(|p| p != zone.paused) {
        return false;
    }
    if let Some(plan) = &spec.plan_id {
        if effective_plan(zone) != Some(plan.as_str()) {
            return false;
        }
    }
    if let Some(ns) = &spec.vanity_name_servers {
        if !same_name_servers(ns, zone.vanity_name_servers.as_ref()) {
            return false;
        }
    }
    get_changed_settings(current, &zone_to_settings_map(&spec.settings)).is_empty()
}

/// Editable settings of a zone, floats normalized
pub async fn load_settings<C: ZoneClient + ?Sized>(client: &C, zone_id: &str) -> Result<ZoneSettingsMap> {
    let settings = client
        .zone_settings(zone_id)
        .await
        .map_err(|e| Error::cloudflare("cannot get zone settings", e))?;
    Ok(settings_to_map(settings))
}

pub async fn create_zone<C: ZoneClient + ?Sized>(client: &C, spec: &ZoneParameters) -> Result<Zone> {
    let request = CreateZone {
        name: spec.name.clone(),
        jump_start: spec.jump_start,
        account: spec.account_id.clone().map(|id| AccountRef { id }),
        zone_type: Some(spec.zone_type.unwrap_or_default().as_str().to_string()),
    };
    client
        .create_zone(&request)
        .await
        .map_err(|e| Error::cloudflare("cannot create zone", e))
}

/// Push the changed zone properties and settings; unchanged ones are not sent.
pub async fn update_zone<C: ZoneClient + ?Sized>(client: &C, zone_id: &str, spec: &ZoneParameters) -> Result<()> {
    let zone = client
        .zone_details(zone_id)
        .await
        .map_err(|e| Error::cloudflare("cannot get zone", e))?;

    // the zone edit endpoint takes one property per request
    if let Some(paused) = spec.paused.filter(|p| *p != zone.paused) {
        let edit = EditZone {
            paused: Some(paused),
            ..Default::default()
        };
        client
            .edit_zone(zone_id, &edit)
            .await
            .map_err(|e| Error::cloudflare("cannot update zone paused", e))?;
    }
    if let Some(ns) = &spec.vanity_name_servers {
        if !same_name_servers(ns, zone.vanity_name_servers.as_ref()) {
            let edit = EditZone {
                vanity_name_servers: Some(ns.clone()),
                ..Default::default()
            };
            client
                .edit_zone(zone_id, &edit)
                .await
                .map_err(|e| Error::cloudflare("cannot update zone vanity name servers", e))?;
        }
    }
    if let Some(plan) = &spec.plan_id {
        if effective_plan(&zone) != Some(plan.as_str()) {
            let edit = EditZone {
                plan: Some(PlanRef { id: plan.clone() }),
                ..Default::default()
            };
            client
                .edit_zone(zone_id, &edit)
                .await
                .map_err(|e| Error::cloudflare("cannot update zone plan", e))?;
        }
    }

    let current = load_settings(client, zone_id).await?;
    let items = get_changed_settings(&current, &zone_to_settings_map(&spec.settings));
    if items.is_empty() {
        return Ok(());
    }
    debug!(zone_id, changed = items.len(), "updating zone settings");
    client
        .update_zone_settings(zone_id, &EditZoneSettings { items })
        .await
        .map_err(|e| Error::cloudflare("cannot update zone settings", e))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        cf_client::{ZoneAccount, ZonePlan},
        zone::settings::{SecurityHeaderSettings, StrictTransportSecurity, ZoneSettings, setting_id},
    };
    use serde_json::json;

    fn remote() -> Zone {
        Zone {
            id: "zone-id".into(),
            name: "example.com".into(),
            name_servers: vec!["ada.ns.cloudflare.com".into()],
            status: Some("active".into()),
            paused: false,
            zone_type: Some("full".into()),
            account: Some(ZoneAccount {
                id: "acc".into(),
                name: Some("Ops".into()),
            }),
            plan: Some(ZonePlan {
                id: "free".into(),
                name: Some("Free Website".into()),
            }),
            ..Default::default()
        }
    }

    fn current() -> ZoneSettingsMap {
        let mut map = ZoneSettingsMap::new();
        map.insert(setting_id::IPV6.into(), json!("on"));
        map.insert(setting_id::EDGE_CACHE_TTL.into(), json!(7200));
        map
    }

    #[test]
    fn missing_spec_is_up_to_date_and_never_late_initialized() {
        assert!(up_to_date(None, &remote(), &current()));
        assert!(!late_initialize(None, &remote(), &current()));
    }

    #[test]
    fn late_initialize_backfills_properties_and_settings() {
        let mut spec = ZoneParameters {
            name: "example.com".into(),
            paused: Some(true),
            settings: ZoneSettings {
                ipv6: Some("off".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(late_initialize(Some(&mut spec), &remote(), &current()));
        assert_eq!(spec.account_id.as_deref(), Some("acc"));
        assert_eq!(spec.plan_id.as_deref(), Some("free"));
        assert_eq!(spec.zone_type, Some(ZoneType::Full));
        // user intent wins
        assert_eq!(spec.paused, Some(true));
        assert_eq!(spec.settings.ipv6.as_deref(), Some("off"));
        assert_eq!(spec.settings.edge_cache_ttl, Some(7200));

        assert!(!late_initialize(Some(&mut spec), &remote(), &current()));
    }

    #[test]
    fn settings_drift_is_detected() {
        let mut spec = ZoneParameters {
            name: "example.com".into(),
            ..Default::default()
        };
        assert!(up_to_date(Some(&spec), &remote(), &current()));

        spec.settings.ipv6 = Some("off".into());
        assert!(!up_to_date(Some(&spec), &remote(), &current()));
    }

    #[test]
    fn late_initialized_mobile_redirect_converges() {
        let mut current = current();
        current.insert(
            setting_id::MOBILE_REDIRECT.into(),
            json!({ "status": "off", "mobile_subdomain": null, "strip_uri": false }),
        );
        let mut spec = ZoneParameters {
            name: "example.com".into(),
            ..Default::default()
        };
        assert!(late_initialize(Some(&mut spec), &remote(), &current));
        assert!(up_to_date(Some(&spec), &remote(), &current));
        assert!(!late_initialize(Some(&mut spec), &remote(), &current));
        assert!(up_to_date(Some(&spec), &remote(), &current));
    }

    #[test]
    fn pending_plan_counts_as_applied() {
        let mut zone = remote();
        zone.plan_pending = Some(ZonePlan {
            id: "pro".into(),
            name: None,
        });
        let spec = ZoneParameters {
            name: "example.com".into(),
            plan_id: Some("pro".into()),
            ..Default::default()
        };
        assert!(up_to_date(Some(&spec), &zone, &current()));
    }

    #[test]
    fn vanity_name_servers_are_compared_as_a_set() {
        let mut zone = remote();
        zone.vanity_name_servers = Some(vec!["ns1.example.com".into(), "ns2.example.com".into()]);
        let mut spec = ZoneParameters {
            name: "example.com".into(),
            vanity_name_servers: Some(vec!["ns2.example.com".into(), "ns1.example.com".into()]),
            ..Default::default()
        };
        assert!(up_to_date(Some(&spec), &zone, &current()));
        spec.vanity_name_servers = Some(vec!["ns3.example.com".into()]);
        assert!(!up_to_date(Some(&spec), &zone, &current()));
    }

    #[test]
    fn nested_settings_compare_after_normalization() {
        let mut current = current();
        current.insert(
            setting_id::SECURITY_HEADER.into(),
            json!({ "strict_transport_security": { "enabled": true, "max_age": 86400 } }),
        );
        let spec = ZoneParameters {
            name: "example.com".into(),
            settings: ZoneSettings {
                security_header: Some(SecurityHeaderSettings {
                    strict_transport_security: Some(StrictTransportSecurity {
                        enabled: Some(true),
                        max_age: Some(86400),
                        ..Default::default()
                    }),
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(up_to_date(Some(&spec), &remote(), &current));
    }

    #[test]
    fn observation_projects_remote_fields() {
        let obs = generate_observation(&remote());
        assert_eq!(obs.account_name.as_deref(), Some("Ops"));
        assert_eq!(obs.plan.as_deref(), Some("free"));
        assert_eq!(obs.status.as_deref(), Some("active"));
    }

    #[test]
    fn invalid_zone_identifier_is_not_found() {
        let err = cf_client::Error::Api {
            status: 400,
            errors: vec![cf_client::ResponseInfo {
                code: 7003,
                message: "Could not route to /zones/nope".into(),
            }],
        };
        assert!(is_zone_not_found(&err));
    }
}
