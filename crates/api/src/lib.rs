//! HTTP API for the lab: sign-in, cases, invoices, accounts and inboxes.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
