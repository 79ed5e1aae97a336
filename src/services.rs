pub mod auth;
pub mod client_service;
pub mod invoice_service;
pub mod totals;
