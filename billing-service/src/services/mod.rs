//! Services module for billing-service.

pub mod database;
pub mod metrics;

pub use database::Database;
pub use metrics::{
    get_metrics, init_metrics, record_billing_run, record_error, record_invoices_generated,
};
