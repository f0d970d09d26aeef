//! Monthly billing run coordination.

use super::composer::compose_invoice;
use super::rates::RateTable;
use crate::models::{
    billing_period_for, BillableContract, BillingRun, BillingRunStatus, BillingRunType, Invoice,
    MeterReading, NewInvoice, RunOutcome,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use service_core::error::AppError;
use uuid::Uuid;

/// Everything the coordinator needs from the data store. `Database`
/// implements this against Postgres; tests drive the run with an
/// in-memory double.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Contracts in a billable status, with room joined for the rent.
    async fn list_billable_contracts(&self) -> Result<Vec<BillableContract>, AppError>;

    /// Most recent reading for a contract, by reading date descending.
    async fn latest_meter_reading(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<MeterReading>, AppError>;

    /// Whether a monthly invoice already exists for this contract and
    /// period.
    async fn invoice_exists(
        &self,
        contract_id: Uuid,
        billing_period: &str,
    ) -> Result<bool, AppError>;

    /// Insert a composed invoice. A uniqueness conflict on
    /// (contract, period) surfaces as [`AppError::Conflict`].
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, AppError>;

    async fn create_billing_run(&self, run_type: BillingRunType) -> Result<BillingRun, AppError>;

    async fn record_run_result(
        &self,
        run_id: Uuid,
        contract_id: Uuid,
        outcome: RunOutcome,
        invoice_id: Option<Uuid>,
        error_message: Option<String>,
    ) -> Result<(), AppError>;

    async fn finish_billing_run(
        &self,
        run_id: Uuid,
        status: BillingRunStatus,
        report: &BillingRunReport,
    ) -> Result<(), AppError>;
}

/// One contract that could not be billed this run.
#[derive(Debug, Clone, Serialize)]
pub struct RunFailure {
    pub contract_id: Uuid,
    pub room_number: String,
    pub error: String,
}

/// The observable result of one billing run.
#[derive(Debug, Clone, Serialize)]
pub struct BillingRunReport {
    pub run_id: Uuid,
    pub billing_period: String,
    pub processed: u32,
    pub generated: u32,
    pub skipped_no_reading: u32,
    pub skipped_already_billed: u32,
    pub failures: Vec<RunFailure>,
}

impl BillingRunReport {
    fn empty(run_id: Uuid, billing_period: String) -> Self {
        Self {
            run_id,
            billing_period,
            processed: 0,
            generated: 0,
            skipped_no_reading: 0,
            skipped_already_billed: 0,
            failures: Vec::new(),
        }
    }

    pub fn skipped(&self) -> u32 {
        self.skipped_no_reading + self.skipped_already_billed
    }

    /// A run only counts as failed when nothing was generated at all;
    /// partial failures still complete.
    pub fn final_status(&self) -> BillingRunStatus {
        if self.failures.is_empty() {
            BillingRunStatus::Completed
        } else if self.generated == 0 {
            BillingRunStatus::Failed
        } else {
            BillingRunStatus::Completed
        }
    }
}

/// Execute one billing cycle over every billable contract, strictly
/// sequentially: each contract's reading fetch, composition, and insert
/// complete before the next contract begins.
///
/// One bad contract never aborts the run; per-contract errors land in the
/// failure list and the loop continues. Only a failure of the initial
/// contract listing (or of creating the run row itself) is fatal.
///
/// Reruns over the same period are no-ops per contract: the period check
/// plus the store's uniqueness conflict keep invoices at-most-once.
#[tracing::instrument(skip(store, rates), fields(run_type = run_type.as_str(), bill_date = %bill_date))]
pub async fn run_monthly_billing<S>(
    store: &S,
    rates: &RateTable,
    run_type: BillingRunType,
    bill_date: NaiveDate,
) -> Result<BillingRunReport, AppError>
where
    S: BillingStore + ?Sized,
{
    let run = store.create_billing_run(run_type).await?;
    let period = billing_period_for(bill_date);
    let mut report = BillingRunReport::empty(run.run_id, period.clone());

    tracing::info!(
        run_id = %run.run_id,
        billing_period = %period,
        "Starting billing run"
    );

    let contracts = match store.list_billable_contracts().await {
        Ok(contracts) => contracts,
        Err(e) => {
            if let Err(finish_err) = store
                .finish_billing_run(run.run_id, BillingRunStatus::Failed, &report)
                .await
            {
                tracing::error!(
                    run_id = %run.run_id,
                    error = %finish_err,
                    "Failed to mark billing run as failed"
                );
            }
            return Err(e);
        }
    };

    for contract in contracts {
        report.processed += 1;

        let reading = match store.latest_meter_reading(contract.contract_id).await {
            Ok(Some(reading)) => reading,
            Ok(None) => {
                tracing::warn!(
                    contract_id = %contract.contract_id,
                    room_number = %contract.room_number,
                    "No meter reading on file; skipping contract"
                );
                report.skipped_no_reading += 1;
                record_result(
                    store,
                    run.run_id,
                    &contract,
                    RunOutcome::SkippedNoReading,
                    None,
                    None,
                )
                .await;
                continue;
            }
            Err(e) => {
                fail_contract(store, run.run_id, &contract, e, &mut report).await;
                continue;
            }
        };

        match store.invoice_exists(contract.contract_id, &period).await {
            Ok(false) => {}
            Ok(true) => {
                tracing::info!(
                    contract_id = %contract.contract_id,
                    billing_period = %period,
                    "Invoice already generated for this period; skipping contract"
                );
                report.skipped_already_billed += 1;
                record_result(
                    store,
                    run.run_id,
                    &contract,
                    RunOutcome::SkippedAlreadyBilled,
                    None,
                    None,
                )
                .await;
                continue;
            }
            Err(e) => {
                fail_contract(store, run.run_id, &contract, e, &mut report).await;
                continue;
            }
        }

        let invoice = compose_invoice(&contract, &reading, rates, bill_date);

        match store.insert_invoice(&invoice).await {
            Ok(inserted) => {
                tracing::info!(
                    contract_id = %contract.contract_id,
                    invoice_id = %inserted.invoice_id,
                    room_number = %contract.room_number,
                    total = %inserted.room_total_cost,
                    "Invoice generated"
                );
                report.generated += 1;
                record_result(
                    store,
                    run.run_id,
                    &contract,
                    RunOutcome::Generated,
                    Some(inserted.invoice_id),
                    None,
                )
                .await;
            }
            // An overlapping run won the insert; same outcome as the
            // period check above.
            Err(AppError::Conflict(e)) => {
                tracing::info!(
                    contract_id = %contract.contract_id,
                    billing_period = %period,
                    detail = %e,
                    "Invoice insert conflicted with an existing invoice; skipping contract"
                );
                report.skipped_already_billed += 1;
                record_result(
                    store,
                    run.run_id,
                    &contract,
                    RunOutcome::SkippedAlreadyBilled,
                    None,
                    None,
                )
                .await;
            }
            Err(e) => {
                fail_contract(store, run.run_id, &contract, e, &mut report).await;
            }
        }
    }

    let status = report.final_status();

    if let Err(e) = store.finish_billing_run(run.run_id, status, &report).await {
        tracing::error!(
            run_id = %run.run_id,
            error = %e,
            "Failed to record billing run completion"
        );
    }

    tracing::info!(
        run_id = %run.run_id,
        status = status.as_str(),
        processed = report.processed,
        generated = report.generated,
        skipped_no_reading = report.skipped_no_reading,
        skipped_already_billed = report.skipped_already_billed,
        failed = report.failures.len(),
        "Billing run finished"
    );

    Ok(report)
}

async fn fail_contract<S>(
    store: &S,
    run_id: Uuid,
    contract: &BillableContract,
    error: AppError,
    report: &mut BillingRunReport,
) where
    S: BillingStore + ?Sized,
{
    let message = error.to_string();
    tracing::error!(
        contract_id = %contract.contract_id,
        room_number = %contract.room_number,
        error = %message,
        "Failed to bill contract; continuing run"
    );
    report.failures.push(RunFailure {
        contract_id: contract.contract_id,
        room_number: contract.room_number.clone(),
        error: message.clone(),
    });
    record_result(
        store,
        run_id,
        contract,
        RunOutcome::Failed,
        None,
        Some(message),
    )
    .await;
}

/// Audit-trail writes never abort the run; a result row that cannot be
/// stored is logged and dropped.
async fn record_result<S>(
    store: &S,
    run_id: Uuid,
    contract: &BillableContract,
    outcome: RunOutcome,
    invoice_id: Option<Uuid>,
    error_message: Option<String>,
) where
    S: BillingStore + ?Sized,
{
    if let Err(e) = store
        .record_run_result(run_id, contract.contract_id, outcome, invoice_id, error_message)
        .await
    {
        tracing::warn!(
            run_id = %run_id,
            contract_id = %contract.contract_id,
            outcome = outcome.as_str(),
            error = %e,
            "Failed to record run result"
        );
    }
}
