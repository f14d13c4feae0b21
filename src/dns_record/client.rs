use async_trait::async_trait;

use crate::{
    Error, Result,
    cf_client::{self, CloudflareClient, DnsRecord, DnsRecordRequest},
};

use super::crd::{RecordObservation, RecordParameters, RecordType};

/// Cloudflare error code for a record that does not exist
const RECORD_NOT_FOUND: u32 = 81044;

/// The DNS record endpoints used by the record controller
#[async_trait]
pub trait RecordClient: Send + Sync {
    async fn dns_record(&self, zone_id: &str, record_id: &str) -> cf_client::Result<DnsRecord>;
    async fn create_dns_record(&self, zone_id: &str, record: &DnsRecordRequest) -> cf_client::Result<DnsRecord>;
    async fn update_dns_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecordRequest,
    ) -> cf_client::Result<DnsRecord>;
    async fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> cf_client::Result<()>;
}

#[async_trait]
impl RecordClient for CloudflareClient {
    async fn dns_record(&self, zone_id: &str, record_id: &str) -> cf_client::Result<DnsRecord> {
        self.get(&format!("/zones/{zone_id}/dns_records/{record_id}")).await
    }

    async fn create_dns_record(&self, zone_id: &str, record: &DnsRecordRequest) -> cf_client::Result<DnsRecord> {
        self.post(&format!("/zones/{zone_id}/dns_records"), record).await
    }

    async fn update_dns_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecordRequest,
    ) -> cf_client::Result<DnsRecord> {
        self.patch(&format!("/zones/{zone_id}/dns_records/{record_id}"), record)
            .await
    }

    async fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> cf_client::Result<()> {
        self.delete(&format!("/zones/{zone_id}/dns_records/{record_id}"))
            .await
    }
}

pub fn is_record_not_found(err: &cf_client::Error) -> bool {
    err.is_not_found(&[RECORD_NOT_FOUND])
}

pub fn generate_observation(record: &DnsRecord) -> RecordObservation {
    RecordObservation {
        proxiable: record.proxiable,
        fqdn: record.name.clone(),
        zone: record.zone_name.clone(),
        locked: record.locked,
        created_on: record.created_on.clone(),
        modified_on: record.modified_on.clone(),
    }
}

/// Fill unset parameters from the remote record; returns whether anything changed.
pub fn late_initialize(spec: Option<&mut RecordParameters>, record: &DnsRecord) -> bool {
    let Some(spec) = spec else {
        return false;
    };
    let mut changed = false;
    if spec.record_type.is_none() {
        if let Some(t) = RecordType::parse(&record.record_type) {
            spec.record_type = Some(t);
            changed = true;
        }
    }
    if spec.ttl.is_none() {
        spec.ttl = Some(record.ttl);
        changed = true;
    }
    if spec.proxied.is_none() {
        spec.proxied = Some(record.proxied);
        changed = true;
    }
    if spec.priority.is_none() && record.priority.is_some() {
        spec.priority = record.priority;
        changed = true;
    }
    changed
}

/// Whether every parameter the user set matches the remote record
pub fn up_to_date(spec: Option<&RecordParameters>, record: &DnsRecord) -> bool {
    let Some(spec) = spec else {
        return true;
    };
    if fqdn(&spec.name, &record.zone_name) != record.name.to_ascii_lowercase() {
        return false;
    }
    if spec.content != record.content {
        return false;
    }
    if let Some(t) = spec.record_type {
        if !t.as_str().eq_ignore_ascii_case(&record.record_type) {
            return false;
        }
    }
    if spec.ttl.is_some_and(|ttl| ttl != record.ttl) {
        return false;
    }
    if spec.proxied.is_some_and(|p| p != record.proxied) {
        return false;
    }
    if spec.priority.is_some() && spec.priority != record.priority {
        return false;
    }
    true
}

/// Qualify a record name with its zone the way the API reports it
fn fqdn(name: &str, zone: &str) -> String {
    let name = name.trim_end_matches('.').to_ascii_lowercase();
    let zone = zone.trim_end_matches('.').to_ascii_lowercase();
    if zone.is_empty() {
        return name;
    }
    if name == "@" || name == zone {
        return zone;
    }
    if name.ends_with(&format!(".{zone}")) {
        return name;
    }
    format!("{name}.{zone}")
}

fn request(spec: &RecordParameters) -> DnsRecordRequest {
    DnsRecordRequest {
        record_type: spec.record_type.unwrap_or_default().as_str().to_string(),
        name: spec.name.clone(),
        content: spec.content.clone(),
        ttl: spec.ttl.unwrap_or(1),
        proxied: spec.proxied,
        priority: spec.priority,
    }
}

pub async fn create_record<C: RecordClient + ?Sized>(client: &C, spec: &RecordParameters) -> Result<DnsRecord> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    client
        .create_dns_record(zone, &request(spec))
        .await
        .map_err(|e| Error::cloudflare("cannot create DNS record", e))
}

pub async fn update_record<C: RecordClient + ?Sized>(
    client: &C,
    record_id: &str,
    spec: &RecordParameters,
) -> Result<()> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    client
        .update_dns_record(zone, record_id, &request(spec))
        .await
        .map_err(|e| Error::cloudflare("cannot update DNS record", e))?;
    Ok(())
}
