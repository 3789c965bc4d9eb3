use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub i64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique lead identifier, minted at assignment time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Priority tier used as the primary ranking key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Ordinal weight; higher ranks first.
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority '{0}', expected HIGH, MEDIUM or LOW")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "HIGH" => Ok(Priority::High),
            "MEDIUM" => Ok(Priority::Medium),
            "LOW" => Ok(Priority::Low),
            other => Err(UnknownPriority(other.to_string())),
        }
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// A lead routed to exactly one client. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: LeadId,
    pub client_id: ClientId,
    pub lead_start: String,
    pub lead_end: String,
}

impl Lead {
    pub fn new(lead_id: LeadId, client_id: ClientId, window: &LeadWindow) -> Self {
        Self {
            lead_id,
            client_id,
            lead_start: window.lead_start.clone(),
            lead_end: window.lead_end.clone(),
        }
    }
}

/// A client together with the leads it currently owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub priority: Priority,
    pub lead_capacity: u32,
    pub leads: Vec<Lead>,
}

impl Client {
    /// Remaining lead slots; zero when the client is at or over capacity.
    pub fn spare_capacity(&self) -> u64 {
        u64::from(self.lead_capacity).saturating_sub(self.leads.len() as u64)
    }
}

/// Payload for registering a new client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub priority: Priority,
    pub lead_capacity: u32,
}

/// Requested time window for a lead awaiting assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadWindow {
    pub lead_start: String,
    pub lead_end: String,
}

impl LeadWindow {
    pub fn new(lead_start: impl Into<String>, lead_end: impl Into<String>) -> Self {
        Self {
            lead_start: lead_start.into(),
            lead_end: lead_end.into(),
        }
    }
}
