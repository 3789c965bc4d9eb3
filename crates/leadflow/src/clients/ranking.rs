//! Ordering policy applied to eligible clients.

use std::cmp::Ordering;

use super::domain::{Client, LeadWindow};
use super::eligibility::eligible_clients;

/// Integer share of unused capacity, `(capacity - leads) * 100 / capacity`.
pub fn free_capacity_pct(client: &Client) -> u64 {
    if client.lead_capacity == 0 {
        return 0;
    }
    client.spare_capacity() * 100 / u64::from(client.lead_capacity)
}

/// Priority weight first, then free-capacity percentage, both descending.
/// Exact ties fall back to ascending client id.
pub fn compare(a: &Client, b: &Client) -> Ordering {
    b.priority
        .weight()
        .cmp(&a.priority.weight())
        .then_with(|| free_capacity_pct(b).cmp(&free_capacity_pct(a)))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn rank(mut clients: Vec<&Client>) -> Vec<&Client> {
    clients.sort_by(|a, b| compare(a, b));
    clients
}

/// Highest-ranked eligible client for the window, if any.
pub fn select_client<'a>(clients: &'a [Client], window: &LeadWindow) -> Option<&'a Client> {
    rank(eligible_clients(clients, window)).into_iter().next()
}
