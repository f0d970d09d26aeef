//! Domain models for billing-service.

mod billing_run;
mod contract;
mod invoice;
mod meter_reading;

pub use billing_run::{BillingRun, BillingRunResult, BillingRunStatus, BillingRunType, RunOutcome};
pub use contract::{BillableContract, ContractStatus, WaterPricing};
pub use invoice::{billing_period_for, Invoice, InvoiceStatus, InvoiceType, NewInvoice};
pub use meter_reading::MeterReading;
