//! Compiled-in schema migrations, applied in order and recorded in the `migrations` ledger.

/// A single schema step identified by a stable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

pub(crate) const LEDGER_DDL: &str = "\
CREATE TABLE IF NOT EXISTS migrations (
    timestamp TEXT PRIMARY KEY NOT NULL
);";

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        id: "20240101000000_create_clients",
        sql: "\
CREATE TABLE clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    priority TEXT NOT NULL CHECK (priority IN ('HIGH', 'MEDIUM', 'LOW')),
    lead_capacity INTEGER NOT NULL CHECK (lead_capacity >= 0)
);",
    },
    Migration {
        id: "20240101000100_create_leads",
        sql: "\
CREATE TABLE leads (
    lead_id TEXT PRIMARY KEY NOT NULL,
    client_id INTEGER NOT NULL REFERENCES clients (id),
    lead_start TEXT NOT NULL,
    lead_end TEXT NOT NULL
);",
    },
    Migration {
        id: "20240101000200_index_leads_by_client",
        sql: "CREATE INDEX IF NOT EXISTS idx_leads_client_id ON leads (client_id);",
    },
];
