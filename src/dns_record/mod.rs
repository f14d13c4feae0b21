//! DNS records of a zone.

mod client;
mod crd;
mod reconcile;

pub use client::{
    RecordClient, create_record, generate_observation, is_record_not_found, late_initialize, up_to_date,
    update_record,
};
pub use crd::{DNSRecord, DNSRecordSpec, RecordObservation, RecordParameters, RecordStatus, RecordType};
pub use reconcile::External;
