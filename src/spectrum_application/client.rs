use std::{collections::BTreeSet, net::IpAddr};

use async_trait::async_trait;

use crate::{
    Error, Result,
    cf_client::{
        self, CloudflareClient, OriginPort, SpectrumApplication, SpectrumApplicationDns, SpectrumApplicationEdgeIps,
        SpectrumApplicationOriginDns,
    },
};

use super::crd::{
    ApplicationDns, ApplicationEdgeIps, ApplicationObservation, ApplicationOriginDns, ApplicationOriginPort,
    ApplicationParameters,
};

/// Cloudflare error code for an unknown Spectrum application
const APPLICATION_NOT_FOUND: u32 = 10006;

/// The Spectrum endpoints used by the application controller
#[async_trait]
pub trait ApplicationClient: Send + Sync {
    async fn spectrum_application(&self, zone_id: &str, app_id: &str) -> cf_client::Result<SpectrumApplication>;
    async fn create_spectrum_application(
        &self,
        zone_id: &str,
        app: &SpectrumApplication,
    ) -> cf_client::Result<SpectrumApplication>;
    async fn update_spectrum_application(
        &self,
        zone_id: &str,
        app_id: &str,
        app: &SpectrumApplication,
    ) -> cf_client::Result<SpectrumApplication>;
    async fn delete_spectrum_application(&self, zone_id: &str, app_id: &str) -> cf_client::Result<()>;
}

#[async_trait]
impl ApplicationClient for CloudflareClient {
    async fn spectrum_application(&self, zone_id: &str, app_id: &str) -> cf_client::Result<SpectrumApplication> {
        self.get(&format!("/zones/{zone_id}/spectrum/apps/{app_id}")).await
    }

    async fn create_spectrum_application(
        &self,
        zone_id: &str,
        app: &SpectrumApplication,
    ) -> cf_client::Result<SpectrumApplication> {
        self.post(&format!("/zones/{zone_id}/spectrum/apps"), app).await
    }

    async fn update_spectrum_application(
        &self,
        zone_id: &str,
        app_id: &str,
        app: &SpectrumApplication,
    ) -> cf_client::Result<SpectrumApplication> {
        self.put(&format!("/zones/{zone_id}/spectrum/apps/{app_id}"), app)
            .await
    }

    async fn delete_spectrum_application(&self, zone_id: &str, app_id: &str) -> cf_client::Result<()> {
        self.delete(&format!("/zones/{zone_id}/spectrum/apps/{app_id}"))
            .await
    }
}

pub fn is_application_not_found(err: &cf_client::Error) -> bool {
    err.is_not_found(&[APPLICATION_NOT_FOUND])
}

pub fn generate_observation(app: &SpectrumApplication) -> ApplicationObservation {
    ApplicationObservation {
        created_on: app.created_on.clone(),
        modified_on: app.modified_on.clone(),
    }
}

fn to_origin_port(port: &ApplicationOriginPort) -> Option<OriginPort> {
    match (port.port, port.start, port.end) {
        (Some(p), _, _) => Some(OriginPort::Port(p)),
        (None, Some(start), Some(end)) => Some(OriginPort::Range(format!("{start}-{end}"))),
        _ => None,
    }
}

fn from_origin_port(port: &OriginPort) -> ApplicationOriginPort {
    match port {
        OriginPort::Port(p) => ApplicationOriginPort {
            port: Some(*p),
            ..Default::default()
        },
        OriginPort::Range(range) => {
            let (start, end) = range.split_once('-').unwrap_or((range.as_str(), range.as_str()));
            ApplicationOriginPort {
                port: None,
                start: start.trim().parse().ok(),
                end: end.trim().parse().ok(),
            }
        }
    }
}

fn from_edge_ips(ips: &SpectrumApplicationEdgeIps) -> ApplicationEdgeIps {
    ApplicationEdgeIps {
        ips_type: Some(ips.ips_type.clone()).filter(|t| !t.is_empty()),
        connectivity: ips.connectivity.clone(),
        ips: Some(ips.ips.iter().map(IpAddr::to_string).collect()).filter(|ips: &Vec<String>| !ips.is_empty()),
    }
}

fn to_edge_ips(ips: &ApplicationEdgeIps) -> Result<SpectrumApplicationEdgeIps> {
    let parsed = ips
        .ips
        .iter()
        .flatten()
        .map(|ip| ip.parse::<IpAddr>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let default_type = if parsed.is_empty() { "dynamic" } else { "static" };
    Ok(SpectrumApplicationEdgeIps {
        ips_type: ips.ips_type.clone().unwrap_or_else(|| default_type.to_string()),
        connectivity: ips.connectivity.clone(),
        ips: parsed,
    })
}

/// Order independent comparison; an unparsable address never matches
fn same_ips(wanted: &[String], have: &[IpAddr]) -> bool {
    let Ok(wanted) = wanted
        .iter()
        .map(|ip| ip.parse::<IpAddr>())
        .collect::<std::result::Result<BTreeSet<_>, _>>()
    else {
        return false;
    };
    wanted == have.iter().copied().collect::<BTreeSet<_>>()
}

fn edge_ips_up_to_date(wanted: &ApplicationEdgeIps, have: Option<&SpectrumApplicationEdgeIps>) -> bool {
    let Some(have) = have else {
        return false;
    };
    wanted.ips_type.as_ref().is_none_or(|t| *t == have.ips_type)
        && (wanted.connectivity.is_none() || wanted.connectivity == have.connectivity)
        && wanted.ips.as_ref().is_none_or(|ips| same_ips(ips, &have.ips))
}

pub fn late_initialize(spec: Option<&mut ApplicationParameters>, app: &SpectrumApplication) -> bool {
    let Some(spec) = spec else {
        return false;
    };
    let mut changed = false;
    if spec.dns.dns_type.is_none() && !app.dns.dns_type.is_empty() {
        spec.dns.dns_type = Some(app.dns.dns_type.clone());
        changed = true;
    }
    if spec.origin_direct.is_none() && !app.origin_direct.is_empty() {
        spec.origin_direct = Some(app.origin_direct.clone());
        changed = true;
    }
    if spec.origin_port.is_none() {
        if let Some(port) = &app.origin_port {
            spec.origin_port = Some(from_origin_port(port));
            changed = true;
        }
    }
    if spec.origin_dns.is_none() {
        if let Some(dns) = &app.origin_dns {
            spec.origin_dns = Some(ApplicationOriginDns { name: dns.name.clone() });
            changed = true;
        }
    }
    if spec.ip_firewall.is_none() {
        spec.ip_firewall = Some(app.ip_firewall);
        changed = true;
    }
    if spec.proxy_protocol.is_none() && !app.proxy_protocol.is_empty() {
        spec.proxy_protocol = Some(app.proxy_protocol.clone());
        changed = true;
    }
    if spec.edge_ips.is_none() {
        if let Some(ips) = &app.edge_ips {
            spec.edge_ips = Some(from_edge_ips(ips));
            changed = true;
        }
    }
    if spec.tls.is_none() && !app.tls.is_empty() {
        spec.tls = Some(app.tls.clone());
        changed = true;
    }
    if spec.traffic_type.is_none() && !app.traffic_type.is_empty() {
        spec.traffic_type = Some(app.traffic_type.clone());
        changed = true;
    }
    if spec.argo_smart_routing.is_none() {
        spec.argo_smart_routing = Some(app.argo_smart_routing);
        changed = true;
    }
    changed
}

pub fn up_to_date(spec: Option<&ApplicationParameters>, app: &SpectrumApplication) -> bool {
    let Some(spec) = spec else {
        return true;
    };
    spec.protocol == app.protocol
        && spec.dns.name == app.dns.name
        && spec.dns.dns_type.as_ref().is_none_or(|t| *t == app.dns.dns_type)
        && spec.origin_direct.as_ref().is_none_or(|o| *o == app.origin_direct)
        && spec
            .origin_port
            .as_ref()
            .is_none_or(|p| to_origin_port(p) == app.origin_port)
        && spec
            .origin_dns
            .as_ref()
            .is_none_or(|d| app.origin_dns.as_ref().is_some_and(|have| have.name == d.name))
        && spec.ip_firewall.is_none_or(|f| f == app.ip_firewall)
        && spec.proxy_protocol.as_ref().is_none_or(|p| *p == app.proxy_protocol)
        && spec
            .edge_ips
            .as_ref()
            .is_none_or(|ips| edge_ips_up_to_date(ips, app.edge_ips.as_ref()))
        && spec.tls.as_ref().is_none_or(|t| *t == app.tls)
        && spec.traffic_type.as_ref().is_none_or(|t| *t == app.traffic_type)
        && spec.argo_smart_routing.is_none_or(|a| a == app.argo_smart_routing)
}

fn request(spec: &ApplicationParameters) -> Result<SpectrumApplication> {
    let ApplicationDns { dns_type, name } = &spec.dns;
    Ok(SpectrumApplication {
        protocol: spec.protocol.clone(),
        dns: SpectrumApplicationDns {
            dns_type: dns_type.clone().unwrap_or_else(|| "CNAME".to_string()),
            name: name.clone(),
        },
        origin_direct: spec.origin_direct.clone().unwrap_or_default(),
        origin_port: spec.origin_port.as_ref().and_then(to_origin_port),
        origin_dns: spec
            .origin_dns
            .as_ref()
            .map(|d| SpectrumApplicationOriginDns { name: d.name.clone() }),
        ip_firewall: spec.ip_firewall.unwrap_or_default(),
        proxy_protocol: spec.proxy_protocol.clone().unwrap_or_default(),
        tls: spec.tls.clone().unwrap_or_default(),
        traffic_type: spec.traffic_type.clone().unwrap_or_default(),
        edge_ips: spec.edge_ips.as_ref().map(to_edge_ips).transpose()?,
        argo_smart_routing: spec.argo_smart_routing.unwrap_or_default(),
        ..Default::default()
    })
}

pub async fn create_application<C: ApplicationClient + ?Sized>(
    client: &C,
    spec: &ApplicationParameters,
) -> Result<SpectrumApplication> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    let app = request(spec)?;
    client
        .create_spectrum_application(zone, &app)
        .await
        .map_err(|e| Error::cloudflare("cannot create spectrum application", e))
}

pub async fn update_application<C: ApplicationClient + ?Sized>(
    client: &C,
    app_id: &str,
    spec: &ApplicationParameters,
) -> Result<()> {
    let zone = spec.zone.as_deref().ok_or(Error::NoZone)?;
    let app = request(spec)?;
    client
        .update_spectrum_application(zone, app_id, &app)
        .await
        .map_err(|e| Error::cloudflare("cannot update spectrum application", e))?;
    Ok(())
}
