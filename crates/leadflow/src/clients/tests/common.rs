use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::clients::domain::{Client, ClientId, Lead, NewClient, Priority};
use crate::clients::sqlite::SqliteClientStore;
use crate::clients::store::{ClientStore, StoreError};
use crate::clients::{client_router, ClientService, LeadId, LeadWindow};

pub(super) const YEAR_START: &str = "2024-01-01 00:00:00";
pub(super) const YEAR_END: &str = "2024-12-31 00:00:00";

pub(super) fn new_client(name: &str, priority: Priority, capacity: u32) -> NewClient {
    NewClient {
        name: name.to_string(),
        start_date: YEAR_START.to_string(),
        end_date: YEAR_END.to_string(),
        priority,
        lead_capacity: capacity,
    }
}

pub(super) fn february() -> LeadWindow {
    LeadWindow::new("2024-02-01 00:00:00", "2024-03-01 00:00:00")
}

pub(super) fn build_service() -> (ClientService<SqliteClientStore>, Arc<SqliteClientStore>) {
    let store = Arc::new(SqliteClientStore::open_in_memory().expect("in-memory store"));
    let service = ClientService::new(store.clone());
    (service, store)
}

/// Register a client and pre-fill it with `leads` existing leads.
pub(super) fn seed_client(
    store: &SqliteClientStore,
    client: NewClient,
    leads: usize,
) -> ClientId {
    let id = store.create_client(&client).expect("client inserted");
    for _ in 0..leads {
        store
            .create_lead(&Lead::new(LeadId::generate(), id, &february()))
            .expect("lead inserted");
    }
    id
}

pub(super) fn total_leads(store: &SqliteClientStore) -> usize {
    store
        .list_clients(None)
        .expect("clients listed")
        .iter()
        .map(|client| client.leads.len())
        .sum()
}

pub(super) fn router_with_service(service: ClientService<SqliteClientStore>) -> axum::Router {
    client_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct UnavailableStore;

impl ClientStore for UnavailableStore {
    fn list_clients(&self, _filter: Option<ClientId>) -> Result<Vec<Client>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn create_client(&self, _client: &NewClient) -> Result<ClientId, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn create_lead(&self, _lead: &Lead) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn assign_within<F>(&self, _select: F) -> Result<Option<Lead>, StoreError>
    where
        F: FnOnce(&[Client]) -> Option<Lead>,
    {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}
