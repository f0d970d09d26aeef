//! Test helper module for billing-service tests.
//!
//! Provides an in-memory [`BillingStore`] double so the monthly run can be
//! exercised end to end without a live PostgreSQL.

#![allow(dead_code)]

use async_trait::async_trait;
use billing_service::billing::{BillingRunReport, BillingStore};
use billing_service::models::{
    BillableContract, BillingRun, BillingRunResult, BillingRunStatus, BillingRunType, Invoice,
    MeterReading, NewInvoice, RunOutcome,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory stand-in for the Postgres store. Mirrors the real store's
/// behavior: latest reading by date, at most one monthly invoice per
/// contract and period (violations surface as `Conflict`), and a run
/// audit trail. Individual contracts can be primed to fail inserts, and
/// the contract listing itself can be primed to fail.
#[derive(Default)]
pub struct InMemoryStore {
    contracts: Vec<BillableContract>,
    inner: Mutex<Inner>,
    fail_inserts_for: Vec<Uuid>,
    fail_listing: bool,
    /// Pretend the period check sees nothing, as if a concurrent run
    /// inserted between the check and the insert.
    race_on_exists: bool,
}

#[derive(Default)]
struct Inner {
    readings: HashMap<Uuid, Vec<MeterReading>>,
    invoices: Vec<Invoice>,
    runs: Vec<BillingRun>,
    results: Vec<BillingRunResult>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contract(
        &mut self,
        rent_price: Option<i64>,
        water_pricing: &str,
        water_fixed_price: Option<i64>,
        room_number: &str,
    ) -> Uuid {
        let contract_id = Uuid::new_v4();
        self.contracts.push(BillableContract {
            contract_id,
            room_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: "active".to_string(),
            water_pricing: water_pricing.to_string(),
            water_fixed_price: water_fixed_price.map(Decimal::from),
            room_number: room_number.to_string(),
            rent_price: rent_price.map(Decimal::from),
        });
        contract_id
    }

    pub fn add_reading(
        &mut self,
        contract_id: Uuid,
        reading_date: NaiveDate,
        prev_electricity: i64,
        current_electricity: i64,
        prev_water: i64,
        current_water: i64,
    ) {
        self.inner
            .lock()
            .unwrap()
            .readings
            .entry(contract_id)
            .or_default()
            .push(MeterReading {
                reading_id: Uuid::new_v4(),
                contract_id,
                reading_date,
                prev_water: Decimal::from(prev_water),
                current_water: Decimal::from(current_water),
                prev_electricity: Decimal::from(prev_electricity),
                current_electricity: Decimal::from(current_electricity),
                created_utc: Utc::now(),
            });
    }

    pub fn fail_insert_for(&mut self, contract_id: Uuid) {
        self.fail_inserts_for.push(contract_id);
    }

    pub fn fail_listing(&mut self) {
        self.fail_listing = true;
    }

    pub fn race_on_exists(&mut self) {
        self.race_on_exists = true;
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.inner.lock().unwrap().invoices.clone()
    }

    pub fn runs(&self) -> Vec<BillingRun> {
        self.inner.lock().unwrap().runs.clone()
    }

    pub fn results(&self) -> Vec<BillingRunResult> {
        self.inner.lock().unwrap().results.clone()
    }
}

#[async_trait]
impl BillingStore for InMemoryStore {
    async fn list_billable_contracts(&self) -> Result<Vec<BillableContract>, AppError> {
        if self.fail_listing {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "contract listing unavailable"
            )));
        }
        Ok(self.contracts.clone())
    }

    async fn latest_meter_reading(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<MeterReading>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut readings = inner
            .readings
            .get(&contract_id)
            .cloned()
            .unwrap_or_default();
        readings.sort_by_key(|r| std::cmp::Reverse(r.reading_date));
        Ok(readings.into_iter().next())
    }

    async fn invoice_exists(
        &self,
        contract_id: Uuid,
        billing_period: &str,
    ) -> Result<bool, AppError> {
        if self.race_on_exists {
            return Ok(false);
        }
        let inner = self.inner.lock().unwrap();
        Ok(inner.invoices.iter().any(|i| {
            i.contract_id == contract_id
                && i.billing_period == billing_period
                && i.invoice_type == "monthly"
        }))
    }

    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, AppError> {
        if self.fail_inserts_for.contains(&invoice.contract_id) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "insert rejected by test"
            )));
        }

        let mut inner = self.inner.lock().unwrap();
        let duplicate = inner.invoices.iter().any(|i| {
            i.contract_id == invoice.contract_id
                && i.billing_period == invoice.billing_period
                && i.invoice_type == invoice.invoice_type.as_str()
        });
        if duplicate {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "invoice already exists for this contract and billing period"
            )));
        }

        let inserted = Invoice {
            invoice_id: Uuid::new_v4(),
            contract_id: invoice.contract_id,
            invoice_type: invoice.invoice_type.as_str().to_string(),
            status: invoice.status.as_str().to_string(),
            room_rent_cost: invoice.room_rent_cost,
            room_elec_cost: invoice.room_elec_cost,
            room_water_cost: invoice.room_water_cost,
            room_repair_cost: invoice.room_repair_cost,
            room_deposit_cost: invoice.room_deposit_cost,
            room_total_cost: invoice.room_total_cost,
            billing_period: invoice.billing_period.clone(),
            bill_date: invoice.bill_date,
            due_date: invoice.due_date,
            created_utc: Utc::now(),
        };
        inner.invoices.push(inserted.clone());
        Ok(inserted)
    }

    async fn create_billing_run(&self, run_type: BillingRunType) -> Result<BillingRun, AppError> {
        let run = BillingRun {
            run_id: Uuid::new_v4(),
            run_type: run_type.as_str().to_string(),
            status: BillingRunStatus::Running.as_str().to_string(),
            started_utc: Utc::now(),
            completed_utc: None,
            contracts_processed: 0,
            invoices_generated: 0,
            contracts_skipped: 0,
            contracts_failed: 0,
            error_message: None,
        };
        self.inner.lock().unwrap().runs.push(run.clone());
        Ok(run)
    }

    async fn record_run_result(
        &self,
        run_id: Uuid,
        contract_id: Uuid,
        outcome: RunOutcome,
        invoice_id: Option<Uuid>,
        error_message: Option<String>,
    ) -> Result<(), AppError> {
        self.inner.lock().unwrap().results.push(BillingRunResult {
            result_id: Uuid::new_v4(),
            run_id,
            contract_id,
            outcome: outcome.as_str().to_string(),
            invoice_id,
            error_message,
            created_utc: Utc::now(),
        });
        Ok(())
    }

    async fn finish_billing_run(
        &self,
        run_id: Uuid,
        status: BillingRunStatus,
        report: &BillingRunReport,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(run) = inner.runs.iter_mut().find(|r| r.run_id == run_id) {
            run.status = status.as_str().to_string();
            run.completed_utc = Some(Utc::now());
            run.contracts_processed = report.processed as i32;
            run.invoices_generated = report.generated as i32;
            run.contracts_skipped = report.skipped() as i32;
            run.contracts_failed = report.failures.len() as i32;
        }
        Ok(())
    }
}

/// Bill date used across tests: July 2025.
pub fn bill_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
}

/// Reading date in late June, just before the July run.
pub fn reading_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 28).unwrap()
}
