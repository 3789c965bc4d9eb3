use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, TransactionBehavior};
use tracing::{debug, info};

use super::domain::{Client, ClientId, Lead, LeadId, NewClient, Priority};
use super::migrations::{LEDGER_DDL, MIGRATIONS};
use super::store::{ClientStore, StoreError};

const SELECT_CLIENTS_WITH_LEADS: &str = "\
SELECT c.id, c.name, c.start_date, c.end_date, c.priority, c.lead_capacity, \
       l.lead_id, l.lead_start, l.lead_end \
FROM clients c \
LEFT JOIN leads l ON l.client_id = c.id \
WHERE (?1 IS NULL OR c.id = ?1) \
ORDER BY c.id, l.rowid";

const INSERT_CLIENT: &str = "\
INSERT INTO clients (name, start_date, end_date, priority, lead_capacity) \
VALUES (?1, ?2, ?3, ?4, ?5)";

const INSERT_LEAD: &str = "\
INSERT INTO leads (lead_id, client_id, lead_start, lead_end) \
VALUES (?1, ?2, ?3, ?4)";

const SELECT_APPLIED_MIGRATIONS: &str = "SELECT timestamp FROM migrations";

const RECORD_MIGRATION: &str = "INSERT INTO migrations (timestamp) VALUES (?1)";

/// How long a connection waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed store. A single connection serializes every statement; several stores may
/// share one database file, in which case IMMEDIATE transactions order their writes.
pub struct SqliteClientStore {
    conn: Mutex<Connection>,
}

impl SqliteClientStore {
    /// Open (or create) a database file. Schema setup is left to the caller.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "opened database file");
        Self::from_connection(conn)
    }

    /// Open an in-memory database with the schema fully migrated.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self::from_connection(Connection::open_in_memory()?)?;
        store.init_schema()?;
        store.apply_pending_migrations()?;
        Ok(store)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    /// Create the migrations ledger. Safe to run repeatedly.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.lock()?.execute_batch(LEDGER_DDL)?;
        Ok(())
    }

    /// Apply every compiled-in migration missing from the ledger, in order.
    ///
    /// Each migration commits together with its ledger row. Returns the ids applied by
    /// this call.
    pub fn apply_pending_migrations(&self) -> Result<Vec<&'static str>, StoreError> {
        let mut conn = self.lock()?;

        let recorded: HashSet<String> = {
            let mut stmt = conn.prepare(SELECT_APPLIED_MIGRATIONS)?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<HashSet<String>, rusqlite::Error>>()?;
            ids
        };

        let mut applied = Vec::new();
        for migration in MIGRATIONS {
            if recorded.contains(migration.id) {
                debug!(migration = migration.id, "migration already applied");
                continue;
            }

            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|source| StoreError::Migration {
                    id: migration.id,
                    source,
                })?;
            tx.execute(RECORD_MIGRATION, params![migration.id])?;
            tx.commit()?;

            info!(migration = migration.id, "applied migration");
            applied.push(migration.id);
        }

        Ok(applied)
    }
}

fn load_clients(conn: &Connection, filter: Option<ClientId>) -> Result<Vec<Client>, StoreError> {
    let mut stmt = conn.prepare_cached(SELECT_CLIENTS_WITH_LEADS)?;
    let mut rows = stmt.query(params![filter.map(|id| id.0)])?;

    let mut clients: Vec<Client> = Vec::new();
    while let Some(row) = rows.next()? {
        let id = ClientId(row.get(0)?);

        if clients.last().map(|client| client.id) != Some(id) {
            let priority: Priority = row.get(4)?;
            clients.push(Client {
                id,
                name: row.get(1)?,
                start_date: row.get(2)?,
                end_date: row.get(3)?,
                priority,
                lead_capacity: row.get(5)?,
                leads: Vec::new(),
            });
        }

        let lead_id: Option<String> = row.get(6)?;
        if let (Some(lead_id), Some(client)) = (lead_id, clients.last_mut()) {
            client.leads.push(Lead {
                lead_id: LeadId(lead_id),
                client_id: id,
                lead_start: row.get(7)?,
                lead_end: row.get(8)?,
            });
        }
    }

    Ok(clients)
}

fn insert_lead(conn: &Connection, lead: &Lead) -> Result<(), StoreError> {
    conn.execute(
        INSERT_LEAD,
        params![lead.lead_id.0, lead.client_id.0, lead.lead_start, lead.lead_end],
    )?;
    Ok(())
}

impl ClientStore for SqliteClientStore {
    fn list_clients(&self, filter: Option<ClientId>) -> Result<Vec<Client>, StoreError> {
        let conn = self.lock()?;
        load_clients(&conn, filter)
    }

    fn create_client(&self, client: &NewClient) -> Result<ClientId, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            INSERT_CLIENT,
            params![
                client.name,
                client.start_date,
                client.end_date,
                client.priority,
                client.lead_capacity,
            ],
        )?;
        Ok(ClientId(conn.last_insert_rowid()))
    }

    fn create_lead(&self, lead: &Lead) -> Result<(), StoreError> {
        let conn = self.lock()?;
        insert_lead(&conn, lead)
    }

    fn assign_within<F>(&self, select: F) -> Result<Option<Lead>, StoreError>
    where
        F: FnOnce(&[Client]) -> Option<Lead>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let clients = load_clients(&tx, None)?;
        let Some(lead) = select(&clients) else {
            return Ok(None);
        };

        insert_lead(&tx, &lead)?;
        tx.commit()?;
        Ok(Some(lead))
    }
}

impl SqliteClientStore {
    /// Ids recorded in the migrations ledger, in application order.
    pub fn applied_migrations(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT timestamp FROM migrations ORDER BY rowid")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::domain::LeadWindow;

    fn new_client(name: &str, priority: Priority, capacity: u32) -> NewClient {
        NewClient {
            name: name.to_string(),
            start_date: "2024-01-01 00:00:00".to_string(),
            end_date: "2024-12-31 00:00:00".to_string(),
            priority,
            lead_capacity: capacity,
        }
    }

    fn lead_for(client_id: ClientId, tag: &str) -> Lead {
        Lead::new(
            LeadId(format!("lead-{tag}")),
            client_id,
            &LeadWindow::new("2024-02-01 00:00:00", "2024-03-01 00:00:00"),
        )
    }

    #[test]
    fn clients_without_leads_are_listed_with_empty_lead_list() {
        let store = SqliteClientStore::open_in_memory().unwrap();
        let id = store
            .create_client(&new_client("Acme", Priority::High, 3))
            .unwrap();

        let clients = store.list_clients(None).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].id, id);
        assert!(clients[0].leads.is_empty());
    }

    #[test]
    fn create_client_assigns_increasing_ids() {
        let store = SqliteClientStore::open_in_memory().unwrap();
        let first = store
            .create_client(&new_client("Acme", Priority::High, 3))
            .unwrap();
        let second = store
            .create_client(&new_client("Globex", Priority::Low, 1))
            .unwrap();
        assert!(second > first);
    }

    #[test]
    fn list_groups_leads_under_their_clients() {
        let store = SqliteClientStore::open_in_memory().unwrap();
        let acme = store
            .create_client(&new_client("Acme", Priority::High, 3))
            .unwrap();
        let globex = store
            .create_client(&new_client("Globex", Priority::Medium, 3))
            .unwrap();
        store.create_lead(&lead_for(acme, "a1")).unwrap();
        store.create_lead(&lead_for(globex, "g1")).unwrap();
        store.create_lead(&lead_for(acme, "a2")).unwrap();

        let clients = store.list_clients(None).unwrap();
        let acme_leads: Vec<&str> = clients[0]
            .leads
            .iter()
            .map(|lead| lead.lead_id.0.as_str())
            .collect();
        assert_eq!(acme_leads, vec!["lead-a1", "lead-a2"]);
        assert_eq!(clients[1].leads.len(), 1);
        assert_eq!(clients[1].leads[0].client_id, globex);
    }

    #[test]
    fn filter_restricts_to_one_client() {
        let store = SqliteClientStore::open_in_memory().unwrap();
        store
            .create_client(&new_client("Acme", Priority::High, 3))
            .unwrap();
        let globex = store
            .create_client(&new_client("Globex", Priority::Low, 2))
            .unwrap();

        let found = store.list_clients(Some(globex)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Globex");
        assert_eq!(found[0].priority, Priority::Low);

        let missing = store.list_clients(Some(ClientId(404))).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn create_lead_rejects_unknown_client() {
        let store = SqliteClientStore::open_in_memory().unwrap();
        let err = store
            .create_lead(&lead_for(ClientId(99), "orphan"))
            .expect_err("foreign key enforced");
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn migrations_are_recorded_and_not_reapplied() {
        let store = SqliteClientStore::open_in_memory().unwrap();
        let recorded = store.applied_migrations().unwrap();
        let expected: Vec<String> = MIGRATIONS.iter().map(|m| m.id.to_string()).collect();
        assert_eq!(recorded, expected);

        store.init_schema().unwrap();
        let reapplied = store.apply_pending_migrations().unwrap();
        assert!(reapplied.is_empty());
    }

    #[test]
    fn assign_within_writes_nothing_when_selection_declines() {
        let store = SqliteClientStore::open_in_memory().unwrap();
        let acme = store
            .create_client(&new_client("Acme", Priority::High, 3))
            .unwrap();

        let outcome = store.assign_within(|_| None).unwrap();
        assert!(outcome.is_none());

        let written = store
            .assign_within(|clients| Some(lead_for(clients[0].id, "picked")))
            .unwrap()
            .expect("lead written");
        assert_eq!(written.client_id, acme);
        assert_eq!(store.list_clients(Some(acme)).unwrap()[0].leads.len(), 1);
    }
}
