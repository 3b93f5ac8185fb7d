// src/services/hrms.rs

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::{
        BulkUpsertRequest, DeductionType, PayAllRequest, PayAllResponse, PayIndividualRequest,
        PayIndividualResponse, PayrollRow, Period,
    },
    services::backend::PayrollBackend,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, warn};

/// reqwest client for the HRMS REST backend.
#[derive(Clone)]
pub struct HrmsClient {
    client: Client,
    base_url: String,
}

// ─── Error Body ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HrmsClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.hrms_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.hrms_api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-2xx response into `AppError::Backend` carrying the
    /// backend's own message.
    async fn check(resp: Response) -> AppResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        warn!("HRMS backend rejected request ({}): {}", status, message);

        Err(AppError::Backend {
            status: Some(status.as_u16()),
            message,
        })
    }

    /// An empty body reads as JSON `null`.
    async fn read_json<T: DeserializeOwned>(resp: Response) -> AppResult<T> {
        let body = Self::check(resp).await?.text().await?;
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };

        serde_json::from_str(body).map_err(|e| AppError::Backend {
            status: None,
            message: format!("Malformed response from HRMS backend: {}", e),
        })
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<BackendErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .or_else(|| Some(body.trim().to_string()))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        })
}

#[async_trait]
impl PayrollBackend for HrmsClient {
    async fn fetch_period_rows(&self, period: Period) -> AppResult<Vec<PayrollRow>> {
        let resp = self
            .client
            .get(self.url("/payroll/employees"))
            .query(&[("month", period.month as i32), ("year", period.year)])
            .send()
            .await?;

        let rows: Option<Vec<PayrollRow>> = Self::read_json(resp).await?;
        let rows = rows.unwrap_or_default();
        debug!("Received {} payroll rows for {}", rows.len(), period);
        Ok(rows)
    }

    async fn fetch_deduction_types(&self) -> AppResult<Vec<DeductionType>> {
        let resp = self
            .client
            .get(self.url("/payroll/deduction-types"))
            .send()
            .await?;

        let types: Option<Vec<DeductionType>> = Self::read_json(resp).await?;
        Ok(types.unwrap_or_default())
    }

    async fn upsert_entries(&self, request: &BulkUpsertRequest) -> AppResult<()> {
        let resp = self
            .client
            .post(self.url("/payroll/entries"))
            .json(request)
            .send()
            .await?;

        Self::check(resp).await?;
        debug!(
            "Upserted {} payroll entries for {:04}-{:02}",
            request.entries.len(),
            request.year,
            request.month
        );
        Ok(())
    }

    async fn pay_individual(
        &self,
        request: &PayIndividualRequest,
    ) -> AppResult<PayIndividualResponse> {
        let resp = self
            .client
            .post(self.url("/payroll/pay-individual"))
            .json(request)
            .send()
            .await?;

        let body: Option<PayIndividualResponse> = Self::read_json(resp).await?;
        Ok(body.unwrap_or_default())
    }

    async fn pay_all(&self, period: Period) -> AppResult<PayAllResponse> {
        let request = PayAllRequest {
            month: period.month,
            year: period.year,
        };
        let resp = self
            .client
            .post(self.url("/payroll/pay-all"))
            .json(&request)
            .send()
            .await?;

        let body: Option<PayAllResponse> = Self::read_json(resp).await?;
        Ok(body.unwrap_or_default())
    }
}
