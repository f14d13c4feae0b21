//! Fallback origins for SaaS zones.

mod client;
mod crd;
mod reconcile;

pub use client::{
    FallbackOriginClient, create_fallback_origin, generate_observation, is_fallback_origin_not_found,
    late_initialize, up_to_date, update_fallback_origin,
};
pub use crd::{
    FallbackOrigin, FallbackOriginObservation, FallbackOriginParameters, FallbackOriginSpec, FallbackOriginStatus,
};
pub use reconcile::External;
