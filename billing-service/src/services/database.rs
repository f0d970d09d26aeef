//! Database service for billing-service.

use crate::billing::{BillingRunReport, BillingStore};
use crate::models::{
    BillableContract, BillingRun, BillingRunStatus, BillingRunType, Invoice, MeterReading,
    NewInvoice, RunOutcome,
};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "billing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl BillingStore for Database {
    /// Contracts in a billable status, with the room joined in for rent.
    ///
    /// Status values are canonical lowercase as of the normalization
    /// migration, so the filter is two exact matches rather than a
    /// case-insensitive scan.
    #[instrument(skip(self))]
    async fn list_billable_contracts(&self) -> Result<Vec<BillableContract>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_billable_contracts"])
            .start_timer();

        let contracts = sqlx::query_as::<_, BillableContract>(
            r#"
            SELECT c.contract_id, c.room_id, c.user_id, c.status, c.water_pricing, c.water_fixed_price, r.room_number, r.rent_price
            FROM contracts c
            JOIN rooms r ON c.room_id = r.room_id
            WHERE c.status IN ('active', 'complete')
            ORDER BY c.contract_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list billable contracts: {}", e)))?;

        timer.observe_duration();

        Ok(contracts)
    }

    /// Most recent reading for a contract.
    #[instrument(skip(self), fields(contract_id = %contract_id))]
    async fn latest_meter_reading(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<MeterReading>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["latest_meter_reading"])
            .start_timer();

        let reading = sqlx::query_as::<_, MeterReading>(
            r#"
            SELECT reading_id, contract_id, reading_date, prev_water, current_water, prev_electricity, current_electricity, created_utc
            FROM meter_readings
            WHERE contract_id = $1
            ORDER BY reading_date DESC, created_utc DESC
            LIMIT 1
            "#,
        )
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get latest meter reading: {}", e)))?;

        timer.observe_duration();

        Ok(reading)
    }

    /// Whether a monthly invoice already exists for this contract and period.
    #[instrument(skip(self), fields(contract_id = %contract_id, billing_period = %billing_period))]
    async fn invoice_exists(
        &self,
        contract_id: Uuid,
        billing_period: &str,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["invoice_exists"])
            .start_timer();

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM invoices
                WHERE contract_id = $1 AND billing_period = $2 AND invoice_type = 'monthly'
            )
            "#,
        )
        .bind(contract_id)
        .bind(billing_period)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check for existing invoice: {}", e)))?;

        timer.observe_duration();

        Ok(exists)
    }

    /// Insert a composed invoice.
    #[instrument(skip(self, invoice), fields(contract_id = %invoice.contract_id, billing_period = %invoice.billing_period))]
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();

        let invoice_id = Uuid::new_v4();
        let inserted = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (invoice_id, contract_id, invoice_type, status, room_rent_cost, room_elec_cost, room_water_cost, room_repair_cost, room_deposit_cost, room_total_cost, billing_period, bill_date, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING invoice_id, contract_id, invoice_type, status, room_rent_cost, room_elec_cost, room_water_cost, room_repair_cost, room_deposit_cost, room_total_cost, billing_period, bill_date, due_date, created_utc
            "#,
        )
        .bind(invoice_id)
        .bind(invoice.contract_id)
        .bind(invoice.invoice_type.as_str())
        .bind(invoice.status.as_str())
        .bind(invoice.room_rent_cost)
        .bind(invoice.room_elec_cost)
        .bind(invoice.room_water_cost)
        .bind(invoice.room_repair_cost)
        .bind(invoice.room_deposit_cost)
        .bind(invoice.room_total_cost)
        .bind(&invoice.billing_period)
        .bind(invoice.bill_date)
        .bind(invoice.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                // Another run already generated this contract's invoice
                // for the period.
                AppError::Conflict(anyhow::anyhow!(
                    "Invoice already exists for this contract and billing period"
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice: {}", e)),
        })?;

        timer.observe_duration();
        info!(invoice_id = %inserted.invoice_id, total = %inserted.room_total_cost, "Invoice inserted");

        Ok(inserted)
    }

    /// Create a billing run row in `running` state.
    #[instrument(skip(self))]
    async fn create_billing_run(&self, run_type: BillingRunType) -> Result<BillingRun, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_billing_run"])
            .start_timer();

        let run_id = Uuid::new_v4();
        let run = sqlx::query_as::<_, BillingRun>(
            r#"
            INSERT INTO billing_runs (run_id, run_type)
            VALUES ($1, $2)
            RETURNING run_id, run_type, status, started_utc, completed_utc, contracts_processed, invoices_generated, contracts_skipped, contracts_failed, error_message
            "#,
        )
        .bind(run_id)
        .bind(run_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create billing run: {}", e)))?;

        timer.observe_duration();

        Ok(run)
    }

    /// Record a per-contract result row.
    #[instrument(skip(self), fields(run_id = %run_id, contract_id = %contract_id))]
    async fn record_run_result(
        &self,
        run_id: Uuid,
        contract_id: Uuid,
        outcome: RunOutcome,
        invoice_id: Option<Uuid>,
        error_message: Option<String>,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_run_result"])
            .start_timer();

        let result_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO billing_run_results (result_id, run_id, contract_id, outcome, invoice_id, error_message)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(result_id)
        .bind(run_id)
        .bind(contract_id)
        .bind(outcome.as_str())
        .bind(invoice_id)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to record run result: {}", e)))?;

        timer.observe_duration();

        Ok(())
    }

    /// Close out a billing run with its final status and counts.
    #[instrument(skip(self, report), fields(run_id = %run_id))]
    async fn finish_billing_run(
        &self,
        run_id: Uuid,
        status: BillingRunStatus,
        report: &BillingRunReport,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["finish_billing_run"])
            .start_timer();

        sqlx::query(
            r#"
            UPDATE billing_runs
            SET status = $2, completed_utc = $3, contracts_processed = $4, invoices_generated = $5, contracts_skipped = $6, contracts_failed = $7
            WHERE run_id = $1
            "#,
        )
        .bind(run_id)
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(report.processed as i32)
        .bind(report.generated as i32)
        .bind(report.skipped() as i32)
        .bind(report.failures.len() as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to finish billing run: {}", e)))?;

        timer.observe_duration();

        Ok(())
    }
}
