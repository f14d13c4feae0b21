//! Custom hostnames, customer domains served through a SaaS zone.

mod client;
mod crd;
mod reconcile;

pub use client::{
    CustomHostnameClient, create_custom_hostname, generate_observation, is_custom_hostname_not_found,
    late_initialize, up_to_date, update_custom_hostname,
};
pub use crd::{
    CustomHostname, CustomHostnameObservation, CustomHostnameParameters, CustomHostnameSpec,
    CustomHostnameSslParameters, CustomHostnameSslSettings, CustomHostnameStatus, OwnershipVerification,
    OwnershipVerificationHttp, SslObservation,
};
pub use reconcile::External;
