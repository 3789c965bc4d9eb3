use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{Client, ClientId, Lead, LeadId, LeadWindow, NewClient};
use super::ranking::select_client;
use super::store::{ClientStore, StoreError};

/// Service exposing client registration, lookup, and lead assignment.
pub struct ClientService<S> {
    store: Arc<S>,
}

impl<S> ClientService<S>
where
    S: ClientStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn list_clients(&self) -> Result<Vec<Client>, ClientServiceError> {
        Ok(self.store.list_clients(None)?)
    }

    /// Fetch a single client, returned as a one-element list.
    pub fn get_client(&self, id: ClientId) -> Result<Vec<Client>, ClientServiceError> {
        let clients = self.store.list_clients(Some(id))?;
        if clients.is_empty() {
            return Err(ClientServiceError::NotFound(id));
        }
        Ok(clients)
    }

    pub fn create_client(&self, client: NewClient) -> Result<ClientId, ClientServiceError> {
        let id = self.store.create_client(&client)?;
        info!(client_id = %id, priority = %client.priority, capacity = client.lead_capacity, "client registered");
        Ok(id)
    }

    /// Route a lead to the best eligible client and persist it.
    ///
    /// Selection and insertion share one store transaction, so a client's capacity cannot
    /// be exceeded by concurrent assignments.
    pub fn assign_lead(&self, window: LeadWindow) -> Result<Lead, ClientServiceError> {
        let assigned = self.store.assign_within(|clients| {
            let chosen = select_client(clients, &window)?;
            Some(Lead::new(LeadId::generate(), chosen.id, &window))
        })?;

        match assigned {
            Some(lead) => {
                info!(lead_id = %lead.lead_id, client_id = %lead.client_id, "lead assigned");
                Ok(lead)
            }
            None => {
                warn!(
                    lead_start = %window.lead_start,
                    lead_end = %window.lead_end,
                    "no eligible client for lead"
                );
                Err(ClientServiceError::NoEligibleClient)
            }
        }
    }
}

/// Error raised by the client service.
#[derive(Debug, thiserror::Error)]
pub enum ClientServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("there are no clients available to assign")]
    NoEligibleClient,
    #[error("client with ID '{0}' was not found")]
    NotFound(ClientId),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("client request did not complete: {0}")]
    Interrupted(String),
}
