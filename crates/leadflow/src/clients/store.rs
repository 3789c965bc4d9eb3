use super::domain::{Client, ClientId, Lead, NewClient};

/// Persistence seam for clients and their leads.
pub trait ClientStore: Send + Sync {
    /// Load clients with their leads, optionally restricted to a single id.
    fn list_clients(&self, filter: Option<ClientId>) -> Result<Vec<Client>, StoreError>;

    /// Insert a client and return the identifier the store assigned to it.
    fn create_client(&self, client: &NewClient) -> Result<ClientId, StoreError>;

    fn create_lead(&self, lead: &Lead) -> Result<(), StoreError>;

    /// Load every client, let `select` decide on a lead, and persist it, all under one
    /// exclusive transaction. Returns `None` without writing when `select` declines.
    fn assign_within<F>(&self, select: F) -> Result<Option<Lead>, StoreError>
    where
        F: FnOnce(&[Client]) -> Option<Lead>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("migration {id} failed: {source}")]
    Migration {
        id: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
