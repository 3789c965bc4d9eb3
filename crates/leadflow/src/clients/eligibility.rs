//! Capacity and time-window checks deciding which clients may receive a lead.

use chrono::NaiveDateTime;

use super::domain::{Client, LeadWindow};

/// Layout shared by client windows and lead windows, e.g. `2024-02-01 00:00:00`.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT).ok()
}

pub fn has_capacity(client: &Client) -> bool {
    client.leads.len() < client.lead_capacity as usize
}

/// True when the client's active window fully contains the requested window.
///
/// Any value that fails to parse excludes the client.
pub fn window_fits(client: &Client, window: &LeadWindow) -> bool {
    let (Some(client_start), Some(client_end), Some(lead_start), Some(lead_end)) = (
        parse_date_time(&client.start_date),
        parse_date_time(&client.end_date),
        parse_date_time(&window.lead_start),
        parse_date_time(&window.lead_end),
    ) else {
        return false;
    };

    client_start <= lead_start && client_end >= lead_end
}

pub fn is_eligible(client: &Client, window: &LeadWindow) -> bool {
    has_capacity(client) && window_fits(client, window)
}

pub fn eligible_clients<'a>(clients: &'a [Client], window: &LeadWindow) -> Vec<&'a Client> {
    clients
        .iter()
        .filter(|client| is_eligible(client, window))
        .collect()
}
