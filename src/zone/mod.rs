//! Zones and their settings.

mod client;
mod crd;
mod reconcile;
pub mod settings;

pub use client::{
    ZoneClient, create_zone, generate_observation, is_zone_not_found, late_initialize, load_settings, up_to_date,
    update_zone,
};
pub use crd::{Zone, ZoneObservation, ZoneParameters, ZoneSpec, ZoneStatus, ZoneType};
pub use reconcile::External;
