//! Firewall filters, the expressions firewall rules match on.

mod client;
mod crd;
mod reconcile;

pub use client::{
    FilterClient, create_filter, generate_observation, is_filter_not_found, late_initialize, up_to_date,
    update_filter,
};
pub use crd::{Filter, FilterObservation, FilterParameters, FilterSpec, FilterStatus};
pub use reconcile::External;
