//! Client capacity tracking and lead assignment.
//!
//! Clients advertise an active window and a lead capacity. Incoming leads are routed to the
//! single best-suited client and persisted alongside a generated identifier.

pub mod clients;
pub mod config;
pub mod error;
pub mod telemetry;
