//! Spectrum applications, TCP/UDP proxying on a zone's edge.

mod client;
mod crd;
mod reconcile;

pub use client::{
    ApplicationClient, create_application, generate_observation, is_application_not_found, late_initialize,
    up_to_date, update_application,
};
pub use crd::{
    ApplicationDns, ApplicationEdgeIps, ApplicationObservation, ApplicationOriginDns, ApplicationOriginPort,
    ApplicationParameters, ApplicationStatus, SpectrumApplication, SpectrumApplicationSpec,
};
pub use reconcile::External;
