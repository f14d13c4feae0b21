//! Workers routes, mapping URL patterns in a zone to a Worker script.

mod client;
mod crd;
mod reconcile;

pub use client::{
    RouteClient, create_route, generate_observation, is_route_not_found, late_initialize, up_to_date, update_route,
};
pub use crd::{RouteObservation, RouteParameters, RouteStatus, WorkerRoute, WorkerRouteSpec};
pub use reconcile::External;
