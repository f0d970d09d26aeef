//! HTTP handlers for billing-service.

pub mod invoices;
