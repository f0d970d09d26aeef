//! Monthly invoice generation trigger.

use crate::billing::{run_monthly_billing, RunFailure};
use crate::models::BillingRunType;
use crate::services::{record_billing_run, record_invoices_generated};
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::Utc;
use serde::Serialize;
use service_core::error::AppError;
use service_core::utils::secret::verify_shared_secret;

#[derive(Debug, Serialize)]
pub struct GenerateInvoicesResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<RunFailure>>,
}

/// `GET /cron/invoices` - execute one monthly billing cycle.
///
/// Invoked by the deployment scheduler once a month. Reruns are safe:
/// generation is idempotent per contract and billing period, so a retried
/// trigger only bills contracts the first attempt missed.
///
/// Guarded by a bearer shared secret compared in constant time. The run
/// itself always completes; per-contract failures come back embedded in
/// the 200 response, and only a failure to list contracts at all is a 500.
#[tracing::instrument(skip(state, bearer))]
pub async fn generate_monthly_invoices(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<(StatusCode, Json<GenerateInvoicesResponse>), AppError> {
    let presented = match &bearer {
        Some(TypedHeader(Authorization(token))) => token.token(),
        None => "",
    };
    if !verify_shared_secret(&state.config.cron.secret, presented) {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Missing or invalid cron secret"
        )));
    }

    let bill_date = Utc::now().date_naive();
    let report = run_monthly_billing(
        state.db.as_ref(),
        &state.rates,
        BillingRunType::Scheduled,
        bill_date,
    )
    .await?;

    let status = report.final_status();
    record_billing_run(BillingRunType::Scheduled.as_str(), status.as_str());
    record_invoices_generated("generated", report.generated as u64);
    record_invoices_generated("skipped_no_reading", report.skipped_no_reading as u64);
    record_invoices_generated(
        "skipped_already_billed",
        report.skipped_already_billed as u64,
    );
    record_invoices_generated("failed", report.failures.len() as u64);

    let message = format!(
        "Generated {} invoices for {} ({} contracts processed, {} without readings, {} already billed, {} failed)",
        report.generated,
        report.billing_period,
        report.processed,
        report.skipped_no_reading,
        report.skipped_already_billed,
        report.failures.len(),
    );
    let failed = (!report.failures.is_empty()).then(|| report.failures.clone());

    Ok((
        StatusCode::OK,
        Json(GenerateInvoicesResponse {
            success: report.failures.is_empty(),
            message,
            failed,
        }),
    ))
}
