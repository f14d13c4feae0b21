use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{
    Error, Result,
    cf_client::{self, CloudflareClient, CustomHostname, CustomHostnameSsl},
};

use super::crd::{
    CustomHostnameObservation, CustomHostnameParameters, CustomHostnameSslParameters, CustomHostnameSslSettings,
    OwnershipVerification, OwnershipVerificationHttp, SslObservation,
};

/// Cloudflare error code for an unknown custom hostname
const CUSTOM_HOSTNAME_NOT_FOUND: u32 = 1436;

/// The custom hostname endpoints used by the custom hostname controller
#[async_trait]
pub trait CustomHostnameClient: Send + Sync {
    async fn custom_hostname(&self, zone_id: &str, hostname_id: &str) -> cf_client::Result<CustomHostname>;
    async fn create_custom_hostname(
        &self,
        zone_id: &str,
        hostname: &CustomHostname,
    ) -> cf_client::Result<CustomHostname>;
    async fn update_custom_hostname(
        &self,
        zone_id: &str,
        hostname_id: &str,
        hostname: &CustomHostname,
    ) -> cf_client::Result<CustomHostname>;
    async fn delete_custom_hostname(&self, zone_id: &str, hostname_id: &str) -> cf_client::Result<()>;
}

#[async_trait]
impl CustomHostnameClient for CloudflareClient {
    async fn custom_hostname(&self, zone_id: &str, hostname_id: &str) -> cf_client::Result<CustomHostname> {
        self.get(&format!("/zones/{zone_id}/custom_hostnames/{hostname_id}"))
            .await
    }

    async fn create_custom_hostname(
        &self,
        zone_id: &str,
        hostname: &CustomHostname,
    ) -> cf_client::Result<CustomHostname> {
        self.post(&format!("/zones/{zone_id}/custom_hostnames"), hostname)
            .await
    }

    async fn update_custom_hostname(
        &self,
        zone_id: &str,
        hostname_id: &str,
        hostname: &CustomHostname,
    ) -> cf_client::Result<CustomHostname> {
        self.patch(&format!("/zones/{zone_id}/custom_hostnames/{hostname_id}"), hostname)
            .await
    }

    async fn delete_custom_hostname(&self, zone_id: &str, hostname_id: &str) -> cf_client::Result<()> {
        self.delete(&format!("/zones/{zone_id}/custom_hostnames/{hostname_id}"))
            .await
    }
}

pub fn is_custom_hostname_not_found(err: &cf_client::Error) -> bool {
    err.is_not_found(&[CUSTOM_HOSTNAME_NOT_FOUND])
}

pub fn generate_observation(ch: &CustomHostname) -> CustomHostnameObservation {
    CustomHostnameObservation {
        status: ch.status.clone(),
        verification_errors: ch.verification_errors.clone(),
        ownership_verification: ch.ownership_verification.as_ref().map(|ov| OwnershipVerification {
            verification_type: ov.verification_type.clone(),
            name: ov.name.clone(),
            value: ov.value.clone(),
        }),
        ownership_verification_http: ch
            .ownership_verification_http
            .as_ref()
            .map(|ov| OwnershipVerificationHttp {
                http_url: ov.http_url.clone(),
                http_body: ov.http_body.clone(),
            }),
        ssl: ch.ssl.as_ref().map(|ssl| SslObservation {
            status: ssl.status.clone(),
            validation_errors: ssl.validation_errors.iter().map(|e| e.message.clone()).collect(),
            http_url: ssl.http_url.clone(),
            http_body: ssl.http_body.clone(),
            txt_name: ssl.txt_name.clone(),
            txt_value: ssl.txt_value.clone(),
            cname_target: ssl.cname_target.clone(),
            cname: ssl.cname.clone(),
        }),
        created_at: ch.created_at.clone(),
    }
}

/// Fill `field` from `remote` when unset, reporting whether it changed
fn fill<T: Clone>(field: &mut Option<T>, remote: Option<&T>) -> bool {
    match (field.is_none(), remote) {
        (true, Some(value)) => {
            *field = Some(value.clone());
            true
        }
        _ => false,
    }
}

fn late_initialize_settings(spec: &mut CustomHostnameSslSettings, remote: &cf_client::CustomHostnameSslSettings) -> bool {
    [
        fill(&mut spec.http2, remote.http2.as_ref()),
        fill(&mut spec.tls13, remote.tls13.as_ref()),
        fill(&mut spec.min_tls_version, remote.min_tls_version.as_ref()),
        fill(&mut spec.ciphers, remote.ciphers.as_ref()),
        fill(&mut spec.early_hints, remote.early_hints.as_ref()),
    ]
    .contains(&true)
}

fn late_initialize_ssl(spec: &mut CustomHostnameSslParameters, remote: &CustomHostnameSsl) -> bool {
    let mut changed = [
        fill(&mut spec.method, remote.method.as_ref()),
        fill(&mut spec.ssl_type, remote.ssl_type.as_ref()),
        fill(&mut spec.wildcard, remote.wildcard.as_ref()),
    ]
    .contains(&true);
    if let Some(remote_settings) = &remote.settings {
        let settings = spec.settings.get_or_insert_with(|| {
            changed = true;
            CustomHostnameSslSettings::default()
        });
        changed |= late_initialize_settings(settings, remote_settings);
    }
    changed
}

pub fn late_initialize(spec: Option<&mut CustomHostnameParameters>, ch: &CustomHostname) -> bool {
    let Some(spec) = spec else {
        return false;
    };
    let mut changed = fill(&mut spec.custom_origin_server, ch.custom_origin_server.as_ref());
    if let Some(remote_ssl) = &ch.ssl {
        let ssl = spec.ssl.get_or_insert_with(|| {
            changed = true;
            CustomHostnameSslParameters::default()
        });
        changed |= late_initialize_ssl(ssl, remote_ssl);
    }
    changed
}

/// Compare only when set
fn same_if_set<T: PartialEq>(wanted: &Option<T>, have: &Option<T>) -> bool {
    wanted.is_none() || wanted == have
}

fn same_ciphers(wanted: &[String], have: Option<&Vec<String>>) -> bool {
    let wanted: BTreeSet<&str> = wanted.iter().map(String::as_str).collect();
    let have: BTreeSet<&str> = have.into_iter().flatten().map(String::as_str).collect();
    wanted == have
}

fn settings_up_to_date(spec: &CustomHostnameSslSettings, remote: Option<&cf_client::CustomHostnameSslSettings>) -> bool {
    let default = cf_client::CustomHostnameSslSettings::default();
    let remote = remote.unwrap_or(&default);
    same_if_set(&spec.http2, &remote.http2)
        && same_if_set(&spec.tls13, &remote.tls13)
        && same_if_set(&spec.min_tls_version, &remote.min_tls_version)
        && same_if_set(&spec.early_hints, &remote.early_hints)
        && spec
            .ciphers
            .as_ref()
            .is_none_or(|c| same_ciphers(c, remote.ciphers.as_ref()))
}

fn ssl_up_to_date(spec: &CustomHostnameSslParameters, remote: Option<&CustomHostnameSsl>) -> bool {
    let default = CustomHostnameSsl::default();
    let remote = remote.unwrap_or(&default);
    same_if_set(&spec.method, &remote.method)
        && same_if_set(&spec.ssl_type, &remote.ssl_type)
        && same_if_set(&spec.wildcard, &remote.wildcard)
        && spec
            .settings
            .as_ref()
            .is_none_or(|s| settings_up_to_date(s, remote.settings.as_ref()))
}

pub fn up_to_date(spec: Option<&CustomHostnameParameters>, ch: &CustomHostname) -> bool {
    let Some(spec) = spec else {
        return true;
    };
    same_if_set(&spec.custom_origin_server, &ch.custom_origin_server)
        && spec.ssl.as_ref().is_none_or(|ssl| ssl_up_to_date(ssl, ch.ssl.as_ref()))
}

fn request(spec: &CustomHostnameParameters) -> CustomHostname {
    CustomHostname {
        hostname: spec.hostname.clone(),
        custom_origin_server: spec.custom_origin_server.clone(),
        ssl: spec.ssl.as_ref().map(|ssl| CustomHostnameSsl {
            method: ssl.method.clone(),
            ssl_type: ssl.ssl_type.clone(),
            wildcard: ssl.wildcard,
            settings: ssl.settings.as_ref().map(|s| cf_client::CustomHostnameSslSettings {
                http2: s.http2.clone(),
                tls13: s.tls13.clone(),
                min_tls_version: s.min_tls_version.clone(),
                ciphers: s.ciphers.clone(),
                early_hints: s.early_hints.clone(),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub async fn create_custom_hostname<C: CustomHostnameClient + ?Sized>(
    client: &C,
    spec: &CustomHostnameParameters,
) -> Result<CustomHostname> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    client
        .create_custom_hostname(zone, &request(spec))
        .await
        .map_err(|e| Error::cloudflare("cannot create custom hostname", e))
}

pub async fn update_custom_hostname<C: CustomHostnameClient + ?Sized>(
    client: &C,
    hostname_id: &str,
    spec: &CustomHostnameParameters,
) -> Result<()> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    client
        .update_custom_hostname(zone, hostname_id, &request(spec))
        .await
        .map_err(|e| Error::cloudflare("cannot update custom hostname", e))?;
    Ok(())
}
