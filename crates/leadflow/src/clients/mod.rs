//! Client registry and lead assignment.
//!
//! Eligibility and ranking are pure functions over loaded clients; the service runs them
//! inside a single store transaction and persists the chosen lead.

pub mod domain;
pub mod eligibility;
pub mod migrations;
pub mod ranking;
pub mod router;
pub mod service;
pub mod sqlite;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{Client, ClientId, Lead, LeadId, LeadWindow, NewClient, Priority};
pub use eligibility::{is_eligible, DATE_TIME_FORMAT};
pub use migrations::{Migration, MIGRATIONS};
pub use ranking::{free_capacity_pct, select_client};
pub use router::client_router;
pub use service::{ClientService, ClientServiceError};
pub use sqlite::SqliteClientStore;
pub use store::{ClientStore, StoreError};
