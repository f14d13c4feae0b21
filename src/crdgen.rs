use controller::{
    custom_hostname::CustomHostname, dns_record::DNSRecord, fallback_origin::FallbackOrigin, filter::Filter,
    firewall_rule::FirewallRule, spectrum_application::SpectrumApplication, worker_route::WorkerRoute, zone::Zone,
};
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crds = [
        Zone::crd(),
        DNSRecord::crd(),
        Filter::crd(),
        FirewallRule::crd(),
        SpectrumApplication::crd(),
        CustomHostname::crd(),
        FallbackOrigin::crd(),
        WorkerRoute::crd(),
    ];
    for (i, crd) in crds.iter().enumerate() {
        if i > 0 {
            println!("---");
        }
        print!("{}", serde_yaml::to_string(crd)?);
    }
    Ok(())
}
