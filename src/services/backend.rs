use crate::{
    errors::AppResult,
    models::{
        BulkUpsertRequest, DeductionType, PayAllResponse, PayIndividualRequest,
        PayIndividualResponse, PayrollRow, Period,
    },
};
use async_trait::async_trait;

/// The payroll operations the HRMS backend exposes. The backend owns
/// persistence, validation and authorization.
#[async_trait]
pub trait PayrollBackend: Send + Sync {
    /// `GET /payroll/employees?month=&year=`
    async fn fetch_period_rows(&self, period: Period) -> AppResult<Vec<PayrollRow>>;

    /// `GET /payroll/deduction-types`
    async fn fetch_deduction_types(&self) -> AppResult<Vec<DeductionType>>;

    /// `POST /payroll/entries`, idempotent per (assignment, month, year)
    async fn upsert_entries(&self, request: &BulkUpsertRequest) -> AppResult<()>;

    /// `POST /payroll/pay-individual`
    async fn pay_individual(
        &self,
        request: &PayIndividualRequest,
    ) -> AppResult<PayIndividualResponse>;

    /// `POST /payroll/pay-all`
    async fn pay_all(&self, period: Period) -> AppResult<PayAllResponse>;
}
